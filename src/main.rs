// src/main.rs

use tickerd::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();

    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("tickerd: {err:#}");
    }

    let code = match run(args).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("tickerd: {err:#}");
            err.exit_code()
        }
    };

    // Exit right here: in-flight runs and reapers are not waited for.
    std::process::exit(code);
}
