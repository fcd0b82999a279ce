#![allow(dead_code, unused_imports)]

pub use tickerd_test_utils::builders;
pub use tickerd_test_utils::fake_executor::{ExecutionLog, FakeExecutor};
pub use tickerd_test_utils::{init_tracing, with_timeout};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
