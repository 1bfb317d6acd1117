//! What one episode leaves behind.

use crate::llm::provider::{ErrorKind, InferenceInputLog, LLMError, ModelResponses};
use crate::llm::types::{TokenUsage, Turn};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a completed episode stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The model stopped calling tools and no scripted rounds remain
    Finished,
    /// A round hit the step limit
    StepLimit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EpisodeStatus {
    Completed { terminated_by: Termination },
    Failed(EpisodeFailure),
}

/// Fatal error that ended an episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeFailure {
    pub kind: ErrorKind,
    pub message: String,
    /// Index of the scripted round in progress when the error hit
    pub round: usize,
}

impl EpisodeFailure {
    pub fn new(error: &LLMError, round: usize) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
            round,
        }
    }
}

/// One query/response exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub model_responses: ModelResponses,
    /// Function calls rendered as `name(arg=value, ...)`
    pub decoded_calls: Vec<String>,
    /// Tool results fed back after this step, in call order
    pub execution_results: Vec<String>,
    pub usage: TokenUsage,
    pub latency_ms: u64,
    pub input_log: Option<InferenceInputLog>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub id: String,
    pub provider: String,
    pub model: String,
    #[serde(flatten)]
    pub status: EpisodeStatus,
    /// Full history; on failure, everything committed before the error
    pub history: Vec<Turn>,
    /// Steps grouped by scripted round
    pub rounds: Vec<Vec<StepRecord>>,
    pub usage: TokenUsage,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl EpisodeRecord {
    pub fn is_completed(&self) -> bool {
        matches!(self.status, EpisodeStatus::Completed { .. })
    }

    pub fn failure(&self) -> Option<&EpisodeFailure> {
        match &self.status {
            EpisodeStatus::Failed(failure) => Some(failure),
            EpisodeStatus::Completed { .. } => None,
        }
    }

    pub fn step_count(&self) -> usize {
        self.rounds.iter().map(Vec::len).sum()
    }

    /// Total wall-clock time spent in successful vendor attempts
    pub fn total_latency_ms(&self) -> u64 {
        self.rounds
            .iter()
            .flatten()
            .map(|step| step.latency_ms)
            .sum()
    }
}
