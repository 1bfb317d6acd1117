//! Test scenarios as read from the dataset.

use crate::llm::tool_schema;
use crate::llm::types::ToolDeclaration;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A message exactly as written in the scenario file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl RawMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// One evaluation scenario: scripted user rounds plus available tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestEntry {
    pub id: String,
    /// Scripted rounds; each round is fed to the model as one user turn group
    pub question: Vec<Vec<RawMessage>>,
    #[serde(default)]
    pub function: Vec<ToolDeclaration>,
}

impl TestEntry {
    /// Category derived from the id, e.g. `multi_turn_base` for `multi_turn_base_3`
    pub fn category(&self) -> &str {
        tool_schema::test_category(&self.id)
    }
}

/// Parse JSON-lines scenarios, skipping blank lines
pub fn parse_entries(content: &str) -> Result<Vec<TestEntry>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Invalid test entry on line {}", index + 1))
        })
        .collect()
}

pub async fn load_entries(path: impl AsRef<Path>) -> Result<Vec<TestEntry>> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read dataset: {}", path.display()))?;
    parse_entries(&content).with_context(|| format!("Failed to parse dataset: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_jsonl_and_reports_bad_lines() {
        let data = r#"
{"id": "simple_0", "question": [[{"role": "user", "content": "hi"}]], "function": [{"name": "f", "description": "d", "parameters": {"type": "dict", "properties": {}}}]}

{"id": "multi_turn_base_1", "question": [[{"role": "user", "content": "a"}], [{"role": "user", "content": "b"}]]}
"#;
        let entries = parse_entries(data).expect("parse");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].function[0].name, "f");
        assert_eq!(entries[1].category(), "multi_turn_base");
        assert!(entries[1].function.is_empty());

        let err = parse_entries("{\"id\": 1}").expect_err("bad line");
        assert!(err.to_string().contains("line 1"));
    }

    #[tokio::test]
    async fn load_entries_reads_file() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("data.jsonl");
        std::fs::write(
            &path,
            r#"{"id": "simple_7", "question": [[{"role": "user", "content": "hi"}]]}"#,
        )
        .expect("write");
        let entries = load_entries(&path).await.expect("load");
        assert_eq!(entries[0].id, "simple_7");
    }
}
