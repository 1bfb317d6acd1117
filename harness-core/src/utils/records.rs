use crate::core::episode::{EpisodeRecord, EpisodeStatus, Termination};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const RESULT_FILE_PREFIX: &str = "result";
const RESULT_FILE_EXTENSION: &str = "jsonl";

/// JSON-lines sink for episode records
#[derive(Debug, Clone)]
pub struct RecordWriter {
    path: PathBuf,
}

impl RecordWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<dir>/result-<model>-<timestamp>.jsonl`
    pub fn in_directory(dir: &Path, model: &str, started_at: DateTime<Utc>) -> Self {
        let file_name = format!(
            "{}-{}-{}.{}",
            RESULT_FILE_PREFIX,
            sanitize_component(model),
            started_at.format("%Y%m%dT%H%M%SZ"),
            RESULT_FILE_EXTENSION
        );
        Self::new(dir.join(file_name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append records, one JSON object per line
    pub fn append(&self, records: &[EpisodeRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open result file: {}", self.path.display()))?;
        let mut writer = BufWriter::new(file);
        for record in records {
            serde_json::to_writer(&mut writer, record)
                .with_context(|| format!("Failed to serialize record {}", record.id))?;
            writer.write_all(b"\n")?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to write result file: {}", self.path.display()))
    }
}

/// Aggregate counts over a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub episodes: usize,
    pub completed: usize,
    pub step_limited: usize,
    pub failed: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub latency_ms: u64,
}

impl RunSummary {
    pub fn from_records(records: &[EpisodeRecord]) -> Self {
        records.iter().fold(Self::default(), |mut summary, record| {
            summary.episodes += 1;
            match &record.status {
                EpisodeStatus::Completed { terminated_by } => {
                    summary.completed += 1;
                    if *terminated_by == Termination::StepLimit {
                        summary.step_limited += 1;
                    }
                }
                EpisodeStatus::Failed(_) => summary.failed += 1,
            }
            summary.input_tokens += record.usage.input_tokens;
            summary.output_tokens += record.usage.output_tokens;
            summary.latency_ms += record.total_latency_ms();
            summary
        })
    }
}

fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect()
}
