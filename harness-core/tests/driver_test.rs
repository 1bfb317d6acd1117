use async_trait::async_trait;
use harness_core::core::episode::{EpisodeStatus, Termination};
use harness_core::core::scenario::RawMessage;
use harness_core::core::{ConversationDriver, DriverConfig, EpisodeRunner, TestEntry};
use harness_core::llm::provider::{
    ErrorKind, InferenceContext, LLMError, ModelResponses, ParsedResponse, ProviderAdapter,
};
use harness_core::llm::retry::Timed;
use harness_core::llm::types::{ArgumentMap, FunctionCall, Role, TokenUsage, Turn, TurnPayload};
use harness_core::tools::{JobHandle, ToolExecutor, ToolOutcome};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Adapter that replays scripted parse results. With an empty script it
/// answers every query with plain text, after sleeping for the number of
/// milliseconds written in the last user turn (if any).
#[derive(Default)]
struct ScriptedAdapter {
    script: Mutex<VecDeque<Result<ParsedResponse, LLMError>>>,
    history_lengths: Mutex<Vec<usize>>,
}

impl ScriptedAdapter {
    fn new(script: Vec<Result<ParsedResponse, LLMError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            history_lengths: Mutex::new(Vec::new()),
        }
    }
}

fn calls(names: &[&str]) -> ParsedResponse {
    let calls: Vec<_> = names
        .iter()
        .map(|name| FunctionCall::new(*name, ArgumentMap::new()))
        .collect();
    ParsedResponse {
        history_turn: Turn {
            role: Role::Model,
            payload: TurnPayload::FunctionCall(calls[0].clone()),
        },
        tool_call_names: names.iter().map(|n| n.to_string()).collect(),
        model_responses: ModelResponses::FunctionCalls(calls),
        usage: TokenUsage {
            input_tokens: 5,
            output_tokens: 1,
        },
    }
}

fn text(reply: &str) -> ParsedResponse {
    ParsedResponse {
        model_responses: ModelResponses::Text(vec![reply.to_string()]),
        tool_call_names: Vec::new(),
        history_turn: Turn::model_text(reply),
        usage: TokenUsage {
            input_tokens: 5,
            output_tokens: 2,
        },
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedAdapter {
    type Tools = ();
    type Response = ParsedResponse;

    fn name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        "scripted-FC"
    }

    fn pre_process(
        &self,
        ctx: &mut InferenceContext<()>,
        entry: &TestEntry,
    ) -> Result<Vec<Vec<Turn>>, LLMError> {
        ctx.history.clear();
        Ok(entry
            .question
            .iter()
            .map(|round| round.iter().map(|m| Turn::user_text(m.content.clone())).collect())
            .collect())
    }

    fn compile_tools(&self, _ctx: &mut InferenceContext<()>, _entry: &TestEntry) -> Result<(), LLMError> {
        Ok(())
    }

    async fn query(&self, ctx: &mut InferenceContext<()>) -> Result<Timed<ParsedResponse>, LLMError> {
        self.history_lengths
            .lock()
            .expect("lock")
            .push(ctx.history.len());
        let next = self.script.lock().expect("lock").pop_front();
        let value = match next {
            Some(scripted) => scripted?,
            None => {
                let delay = ctx
                    .history
                    .iter()
                    .rev()
                    .find_map(|turn| turn.as_text().and_then(|t| t.parse::<u64>().ok()))
                    .unwrap_or(0);
                tokio::time::sleep(Duration::from_millis(delay)).await;
                text("ok")
            }
        };
        Ok(Timed {
            value,
            elapsed: Duration::from_millis(3),
        })
    }

    fn parse_response(&self, response: &ParsedResponse) -> ParsedResponse {
        response.clone()
    }
}

/// Answers every call immediately with `<name>-result`, except `broken`
struct EchoTools;

#[async_trait]
impl ToolExecutor for EchoTools {
    async fn execute(&self, name: &str, _args: &ArgumentMap) -> anyhow::Result<ToolOutcome> {
        if name == "broken" {
            anyhow::bail!("disk on fire");
        }
        Ok(ToolOutcome::Ready(format!("{name}-result")))
    }

    async fn resolve(&self, handle: &JobHandle) -> anyhow::Result<String> {
        anyhow::bail!("nothing deferred: {handle}")
    }
}

fn entry(id: &str, rounds: &[&str]) -> TestEntry {
    TestEntry {
        id: id.to_string(),
        question: rounds
            .iter()
            .map(|content| vec![RawMessage::new("user", *content)])
            .collect(),
        function: Vec::new(),
    }
}

fn tool_results(history: &[Turn]) -> Vec<(String, serde_json::Value)> {
    history
        .iter()
        .filter_map(|turn| match &turn.payload {
            TurnPayload::FunctionResult(result) => Some((result.name.clone(), result.response.clone())),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn tool_results_follow_call_order_and_errors_become_content() {
    let adapter = ScriptedAdapter::new(vec![
        Ok(calls(&["alpha", "broken", "beta"])),
        Ok(text("all done")),
    ]);
    let driver = ConversationDriver::new(adapter, DriverConfig::default());

    let record = driver.run(&entry("simple_0", &["go"]), &EchoTools).await;

    assert_eq!(
        record.status,
        EpisodeStatus::Completed {
            terminated_by: Termination::Finished
        }
    );
    let results = tool_results(&record.history);
    assert_eq!(results.len(), 3);
    assert_eq!(results[0], ("alpha".to_string(), json!({"content": "alpha-result"})));
    assert_eq!(
        results[1],
        (
            "broken".to_string(),
            json!({"content": "Error during execution: disk on fire"})
        )
    );
    assert_eq!(results[2].0, "beta");
    assert_eq!(record.history.last(), Some(&Turn::model_text("all done")));
    assert_eq!(record.rounds[0][0].execution_results.len(), 3);
    assert_eq!(record.usage.total(), 13);
}

#[tokio::test]
async fn each_round_adds_user_turns_then_requeries() {
    let adapter = ScriptedAdapter::new(vec![
        Ok(text("first")),
        Ok(calls(&["alpha"])),
        Ok(text("second")),
    ]);
    let driver = ConversationDriver::new(adapter, DriverConfig::default());

    let record = driver.run(&entry("multi_turn_base_0", &["a", "b"]), &EchoTools).await;

    assert!(record.is_completed());
    assert_eq!(record.rounds.len(), 2);
    assert_eq!(record.rounds[0].len(), 1);
    assert_eq!(record.rounds[1].len(), 2);
    // user, model | user, model(call), result, model
    assert_eq!(
        *driver.adapter().history_lengths.lock().expect("lock"),
        vec![1, 3, 5]
    );
    assert_eq!(record.history.len(), 6);
}

#[tokio::test]
async fn step_limit_ends_a_runaway_loop() {
    let script = (0..10).map(|_| Ok(calls(&["alpha"]))).collect();
    let driver = ConversationDriver::new(ScriptedAdapter::new(script), DriverConfig { max_steps: 3 });

    let record = driver.run(&entry("simple_1", &["loop", "never reached"]), &EchoTools).await;

    assert_eq!(
        record.status,
        EpisodeStatus::Completed {
            terminated_by: Termination::StepLimit
        }
    );
    assert_eq!(record.step_count(), 3);
    assert_eq!(record.rounds.len(), 1);
    assert_eq!(tool_results(&record.history).len(), 3);
}

#[tokio::test]
async fn fatal_query_error_keeps_partial_history() {
    let adapter = ScriptedAdapter::new(vec![
        Ok(text("first")),
        Err(LLMError::Authentication("token expired".into())),
    ]);
    let driver = ConversationDriver::new(adapter, DriverConfig::default());

    let record = driver.run(&entry("multi_turn_base_2", &["a", "b", "c"]), &EchoTools).await;

    let failure = record.failure().expect("failed episode");
    assert_eq!(failure.kind, ErrorKind::Authentication);
    assert_eq!(failure.round, 1);
    assert_eq!(
        record.history,
        vec![Turn::user_text("a"), Turn::model_text("first"), Turn::user_text("b")]
    );
}

#[tokio::test(start_paused = true)]
async fn runner_returns_records_in_dataset_order() {
    let driver = ConversationDriver::new(ScriptedAdapter::default(), DriverConfig::default());
    let entries = vec![
        entry("simple_0", &["40"]),
        entry("simple_1", &["5"]),
        entry("simple_2", &["25"]),
        entry("simple_3", &["1"]),
    ];

    let echo_tools = |_: &TestEntry| -> Box<dyn ToolExecutor> { Box::new(EchoTools) };
    let mut finished = Vec::new();
    let records = EpisodeRunner::new(4)
        .run_with_progress(&driver, &entries, &echo_tools, |record| {
            finished.push(record.id.clone())
        })
        .await;

    let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["simple_0", "simple_1", "simple_2", "simple_3"]);
    assert_eq!(finished, ["simple_3", "simple_1", "simple_2", "simple_0"]);
    assert!(records.iter().all(|r| r.is_completed()));
}
