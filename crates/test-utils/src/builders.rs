#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use tickerd::cli::CliArgs;
use tickerd::config::{Config, HealthAddr, HealthMode};
use tickerd::trigger::CronSchedule;

/// Builder for `Config` to simplify test setup.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new(command: &[&str]) -> Self {
        Self {
            config: Config::new(command.iter().map(|s| s.to_string()).collect()),
        }
    }

    /// Shorthand for `sh -c <script>`.
    pub fn shell(script: &str) -> Self {
        Self::new(&["sh", "-c", script])
    }

    pub fn interval(mut self, period: Duration) -> Self {
        self.config.interval = Some(period);
        self
    }

    pub fn cron(mut self, expr: &str) -> Self {
        let schedule = CronSchedule::parse(expr).expect("valid cron expression in test");
        self.config.cron = Some(schedule);
        self.config.skip_initial = true;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    pub fn watch(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.watch_path = Some(path.into());
        self
    }

    pub fn health_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.health = HealthMode::File(path.into());
        self
    }

    pub fn health_addr(mut self, addr: &str) -> Self {
        let addr = HealthAddr::parse(addr).expect("valid health address in test");
        self.config.health = HealthMode::Tcp(addr);
        self
    }

    pub fn skip_initial(mut self, val: bool) -> Self {
        self.config.skip_initial = val;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

/// Builder for raw `CliArgs`, as clap would produce them.
#[derive(Default)]
pub struct CliArgsBuilder {
    args: CliArgs,
}

impl CliArgsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command(mut self, command: &[&str]) -> Self {
        self.args.command = command.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn interval(mut self, raw: &str) -> Self {
        self.args.interval = Some(raw.to_string());
        self
    }

    pub fn cron(mut self, raw: &str) -> Self {
        self.args.cron = Some(raw.to_string());
        self
    }

    pub fn timeout(mut self, raw: &str) -> Self {
        self.args.timeout = Some(raw.to_string());
        self
    }

    pub fn watch(mut self, raw: &str) -> Self {
        self.args.watch = Some(raw.to_string());
        self
    }

    pub fn healthcheck_file(mut self, raw: &str) -> Self {
        self.args.healthcheck_file = Some(raw.to_string());
        self
    }

    pub fn healthcheck_addr(mut self, raw: &str) -> Self {
        self.args.healthcheck_addr = Some(raw.to_string());
        self
    }

    pub fn healthcheck(mut self) -> Self {
        self.args.healthcheck = true;
        self
    }

    pub fn skip_initial(mut self) -> Self {
        self.args.skip_initial = true;
        self
    }

    pub fn build(self) -> CliArgs {
        self.args
    }
}
