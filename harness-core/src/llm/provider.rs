//! Provider adapter contract.
//!
//! Every vendor integration implements [`ProviderAdapter`], an ordered
//! five-stage pipeline:
//!
//! 1. [`pre_process`](ProviderAdapter::pre_process) normalizes scenario roles
//!    and lifts the leading system instruction out of the first round.
//! 2. [`compile_tools`](ProviderAdapter::compile_tools) translates abstract
//!    tool declarations into the vendor's tool objects.
//! 3. [`query`](ProviderAdapter::query) calls the vendor through the retry
//!    executor, after snapshotting the outgoing payload into the input log.
//! 4. [`parse_response`](ProviderAdapter::parse_response) normalizes the raw
//!    response into a [`ParsedResponse`].
//! 5. [`add_assistant_turn`](ProviderAdapter::add_assistant_turn) and
//!    [`add_execution_results`](ProviderAdapter::add_execution_results) fold
//!    the model turn and the tool results back into history.
//!
//! Stage 5 is vendor-neutral and has default implementations; a vendor that
//! needs a different history layout can override it.

use crate::core::scenario::TestEntry;
use crate::llm::retry::Timed;
use crate::llm::types::{FunctionCall, TokenUsage, ToolDeclaration, Turn};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Classification of provider failures, used to decide what is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    RateLimit,
    QuotaExhausted,
    Timeout,
    Authentication,
    InvalidRequest,
    Network,
    Provider,
    Parse,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::QuotaExhausted => "quota_exhausted",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Authentication => "authentication",
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::Network => "network",
            ErrorKind::Provider => "provider",
            ErrorKind::Parse => "parse",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LLMError {
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),
    #[error("Quota exhausted: {0}")]
    QuotaExhausted(String),
    #[error("Request timed out after {0} ms")]
    Timeout(u64),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Provider error: {0}")]
    Provider(String),
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl LLMError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LLMError::Authentication(_) => ErrorKind::Authentication,
            LLMError::RateLimit(_) => ErrorKind::RateLimit,
            LLMError::QuotaExhausted(_) => ErrorKind::QuotaExhausted,
            LLMError::Timeout(_) => ErrorKind::Timeout,
            LLMError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            LLMError::Network(_) => ErrorKind::Network,
            LLMError::Provider(_) => ErrorKind::Provider,
            LLMError::Parse(_) => ErrorKind::Parse,
        }
    }
}

/// Snapshot of what was sent for one query, kept for diagnostics only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceInputLog {
    /// Debug rendering of the outgoing contents
    pub message: String,
    pub tools: Vec<ToolDeclaration>,
    pub system_prompt: Option<String>,
}

/// Per-episode scratch state threaded through all pipeline stages
#[derive(Debug, Clone)]
pub struct InferenceContext<T> {
    /// Chat history replayed to the vendor on every query
    pub history: Vec<Turn>,
    /// Declarations as provided by the scenario, after category pre-processing
    pub declarations: Vec<ToolDeclaration>,
    /// Compiled vendor tools; `None` means "send no tools at all"
    pub tools: Option<T>,
    pub system_instruction: Option<String>,
    input_log: Option<InferenceInputLog>,
}

impl<T> Default for InferenceContext<T> {
    fn default() -> Self {
        Self {
            history: Vec::new(),
            declarations: Vec::new(),
            tools: None,
            system_instruction: None,
            input_log: None,
        }
    }
}

impl<T> InferenceContext<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the payload about to be sent. Each query replaces the previous
    /// snapshot wholesale; a captured snapshot is never edited in place.
    pub fn capture_input_log(&mut self, log: InferenceInputLog) {
        self.input_log = Some(log);
    }

    pub fn input_log(&self) -> Option<&InferenceInputLog> {
        self.input_log.as_ref()
    }

    pub fn take_input_log(&mut self) -> Option<InferenceInputLog> {
        self.input_log.take()
    }
}

/// Normalized model output of one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ModelResponses {
    FunctionCalls(Vec<FunctionCall>),
    Text(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub model_responses: ModelResponses,
    /// Names of the extracted calls, parallel to `model_responses`
    pub tool_call_names: Vec<String>,
    /// Model turn to append to history, verbatim from the vendor when possible
    pub history_turn: Turn,
    pub usage: TokenUsage,
}

impl ParsedResponse {
    pub fn function_calls(&self) -> &[FunctionCall] {
        match &self.model_responses {
            ModelResponses::FunctionCalls(calls) => calls,
            ModelResponses::Text(_) => &[],
        }
    }

    pub fn has_function_calls(&self) -> bool {
        !self.function_calls().is_empty()
    }

    /// Text fallback joined into one string
    pub fn text(&self) -> String {
        match &self.model_responses {
            ModelResponses::Text(parts) => parts.concat(),
            ModelResponses::FunctionCalls(_) => String::new(),
        }
    }
}

/// Universal provider adapter trait
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Compiled vendor tool set
    type Tools: Clone + Send + Sync + std::fmt::Debug;
    /// Raw vendor response
    type Response: Send + Sync;

    /// Provider name (e.g., "gemini")
    fn name(&self) -> &str;

    /// Model name as configured, including any mode suffix
    fn model_id(&self) -> &str;

    /// Stage 1: normalize scenario roles, extract the system instruction and
    /// reset the message buffer. Returns the normalized user rounds.
    fn pre_process(
        &self,
        ctx: &mut InferenceContext<Self::Tools>,
        entry: &TestEntry,
    ) -> Result<Vec<Vec<Turn>>, LLMError>;

    /// Stage 2: translate the scenario's declarations into vendor tools.
    fn compile_tools(
        &self,
        ctx: &mut InferenceContext<Self::Tools>,
        entry: &TestEntry,
    ) -> Result<(), LLMError>;

    /// Stage 3: issue one vendor call (with retries) for the current history.
    async fn query(
        &self,
        ctx: &mut InferenceContext<Self::Tools>,
    ) -> Result<Timed<Self::Response>, LLMError>;

    /// Stage 4: normalize a raw vendor response. Must be deterministic.
    fn parse_response(&self, response: &Self::Response) -> ParsedResponse;

    /// Append a scripted user round to history.
    fn add_user_turns(&self, ctx: &mut InferenceContext<Self::Tools>, turns: &[Turn]) {
        ctx.history.extend_from_slice(turns);
    }

    /// Stage 5a: append the model turn exactly as parsed.
    fn add_assistant_turn(&self, ctx: &mut InferenceContext<Self::Tools>, parsed: &ParsedResponse) {
        ctx.history.push(parsed.history_turn.clone());
    }

    /// Stage 5b: append one tool-result turn per extracted call, in call order.
    fn add_execution_results(
        &self,
        ctx: &mut InferenceContext<Self::Tools>,
        results: &[String],
        parsed: &ParsedResponse,
    ) -> Result<(), LLMError> {
        if results.len() != parsed.tool_call_names.len() {
            return Err(LLMError::InvalidRequest(format!(
                "{} execution results for {} function calls",
                results.len(),
                parsed.tool_call_names.len()
            )));
        }

        for (result, name) in results.iter().zip(&parsed.tool_call_names) {
            ctx.history
                .push(Turn::tool_result(name.clone(), json!({ "content": result })));
        }
        Ok(())
    }

    /// Render extracted calls as executable call strings, e.g. `f(a=1,b='x')`.
    fn decode_execute(&self, parsed: &ParsedResponse) -> Vec<String> {
        parsed
            .function_calls()
            .iter()
            .map(|call| {
                let args = call
                    .args
                    .iter()
                    .map(|(key, value)| format!("{key}={}", python_repr(value)))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("{}({args})", call.name)
            })
            .collect()
    }
}

/// Python-literal rendering of a JSON value, matching how call strings are
/// written in scenario ground truth.
pub fn python_repr(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => python_str_repr(s),
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(python_repr).collect::<Vec<_>>().join(", ")
        ),
        Value::Object(map) => format!(
            "{{{}}}",
            map.iter()
                .map(|(k, v)| format!("{}: {}", python_str_repr(k), python_repr(v)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

/// `repr()` of a Python `str`: single quotes unless the text contains `'`
/// and no `"`, with control characters escaped.
fn python_str_repr(text: &str) -> String {
    let quote = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => {
                let code = c as u32;
                if code < 0x100 {
                    out.push_str(&format!("\\x{code:02x}"));
                } else {
                    out.push_str(&format!("\\u{code:04x}"));
                }
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}
