//! # Episode orchestration
//!
//! - [`scenario`]: dataset entries and JSON-lines loading
//! - [`driver`]: the per-episode conversation state machine
//! - [`episode`]: records produced by an episode
//! - [`runner`]: concurrent execution of many episodes

pub mod driver;
pub mod episode;
pub mod runner;
pub mod scenario;

pub use driver::{ConversationDriver, DriverConfig, EpisodeEngine};
pub use episode::{EpisodeFailure, EpisodeRecord, EpisodeStatus, StepRecord, Termination};
pub use runner::{EpisodeRunner, ToolFactory};
pub use scenario::{RawMessage, TestEntry, load_entries, parse_entries};
