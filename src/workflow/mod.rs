pub mod attempt_runner;

pub use attempt_runner::{sentinel_records, AttemptRunner};
