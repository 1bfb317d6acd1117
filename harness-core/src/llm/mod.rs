//! # LLM abstraction layer
//!
//! Provider-neutral pieces shared by every vendor adapter:
//!
//! - [`types`]: the message model (turns, calls, results, declarations)
//! - [`provider`]: the five-stage [`ProviderAdapter`] contract and errors
//! - [`tool_schema`]: declaration pre-processing and type casting
//! - [`retry`]: the bounded exponential-backoff executor
//! - [`factory`]: provider registry keyed by name
//!
//! Vendor implementations live in [`providers`].

pub mod error_display;
pub mod factory;
pub mod provider;
pub mod providers;
pub mod retry;
pub mod tool_schema;
pub mod types;

pub use factory::{ProviderFactory, create_engine};
pub use provider::{ErrorKind, LLMError, ParsedResponse, ProviderAdapter};
pub use providers::GeminiProvider;
pub use retry::{RetryConfig, RetryExecutor, Timed};
