pub mod agent;
pub mod gemini;
pub mod http;
pub mod retry;

pub use agent::AgentConfig;
pub use gemini::{GeminiConfig, GeminiEndpoint};
pub use http::HttpConfig;
pub use retry::RetrySettings;
