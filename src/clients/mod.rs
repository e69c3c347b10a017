pub mod model_client;

pub use model_client::{ChatRequest, HttpModelClient, ModelClient};
