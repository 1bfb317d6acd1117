//! # Tool execution
//!
//! The conversation driver never runs tools itself. It hands every extracted
//! function call to a [`ToolExecutor`], which either answers immediately or
//! hands back an opaque [`JobHandle`] that the driver later passes to
//! [`ToolExecutor::resolve`]. Results are opaque strings inserted verbatim into
//! history.
//!
//! Any registry that maps handles to pending work is private to the executor.

pub mod daily_context;

pub use daily_context::{DailyContext, DailyContextVersion};

use crate::llm::types::ArgumentMap;
use async_trait::async_trait;
use std::fmt;

/// Opaque token for a tool execution that has not completed yet
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of dispatching one function call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    Ready(String),
    Deferred(JobHandle),
}

/// Tool-execution collaborator used by the conversation driver
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Dispatch a call. Errors are reported back to the model as content.
    async fn execute(&self, name: &str, args: &ArgumentMap) -> anyhow::Result<ToolOutcome>;

    /// Wait for a deferred call to finish
    async fn resolve(&self, handle: &JobHandle) -> anyhow::Result<String>;
}
