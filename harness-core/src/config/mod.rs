//! Harness configuration
//!
//! Loads `harness.toml` files and exposes the typed sections consumed by the
//! provider adapters, the retry executor and the episode runner.

pub mod api_keys;
pub mod constants;
pub mod core;
pub mod loader;

pub use api_keys::{GeminiCredential, gemini_credential, load_dotenv};
pub use core::{AgentConfig, GeminiConfig, GeminiEndpoint, HttpConfig, RetrySettings};
pub use loader::{ConfigManager, HarnessConfig};
