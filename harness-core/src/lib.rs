//! # harness-core - Runtime for fc-harness
//!
//! `harness-core` drives multi-turn function-calling conversations against
//! LLM backends and normalizes every vendor protocol into one conversation
//! model, so that scoring can stay provider-agnostic.
//!
//! ## Highlights
//!
//! - **Provider Abstraction**: every vendor implements the five-stage
//!   [`ProviderAdapter`] pipeline (pre-process, compile tools, query, parse,
//!   update history). Gemini / Vertex AI ships built in.
//! - **Replay-safe history**: model turns are stored as the vendor returned
//!   them and replayed verbatim on the next query.
//! - **Bounded retries**: rate limits, quota exhaustion and per-attempt
//!   timeouts are retried with exponential backoff; everything else fails the
//!   episode immediately.
//! - **Deferred tools**: tool environments may answer later through an opaque
//!   job handle; the driver waits for every handle before querying again.
//! - **Configuration-First**: settings come from `harness.toml`, with
//!   constants centralized in `config::constants`.
//!
//! ## Architecture Overview
//!
//! - `config/`: configuration loader, defaults and credentials.
//! - `gemini/`: Gemini wire models and the HTTP client.
//! - `llm/`: message model, adapter contract, schema translation, retry.
//! - `core/`: scenarios, the conversation driver and the episode runner.
//! - `tools/`: the tool-execution contract and the DailyContext environment.
//! - `utils/`: result records.
//!
//! ## Quickstart
//!
//! ```rust,ignore
//! use harness_core::{ConfigManager, DailyContext, EpisodeRunner, create_engine, load_entries};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigManager::load()?.into_config();
//!     let engine = create_engine(&config.agent.model, &config)?;
//!     let entries = load_entries("data/daily_context.jsonl").await?;
//!
//!     let runner = EpisodeRunner::new(config.agent.concurrency);
//!     let records = runner
//!         .run(engine.as_ref(), &entries, &|_| Box::new(DailyContext::new()))
//!         .await;
//!     println!("{} episodes", records.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod gemini;
pub mod llm;
pub mod tools;
pub mod utils;

pub use config::{ConfigManager, HarnessConfig};
pub use core::{
    ConversationDriver, DriverConfig, EpisodeEngine, EpisodeRecord, EpisodeRunner, EpisodeStatus,
    TestEntry, load_entries,
};
pub use llm::provider::{ErrorKind, LLMError, ProviderAdapter};
pub use llm::types::{FunctionCall, Role, ToolDeclaration, Turn, TurnPayload};
pub use llm::{GeminiProvider, ProviderFactory, create_engine};
pub use tools::{DailyContext, DailyContextVersion, JobHandle, ToolExecutor, ToolOutcome};
pub use utils::{RecordWriter, RunSummary};
