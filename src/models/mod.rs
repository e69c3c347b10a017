pub mod loaders;
pub mod question;

pub use loaders::load_questions;
pub use question::{AttemptResult, BatchOutput, Question, Window, FAILURE_SENTINEL};
