//! Conversation driver: the per-episode state machine.
//!
//! ```text
//! AwaitingUserTurn -> Querying -> HasFunctionCalls -> ExecutingTools -> Querying ...
//!        ^               |
//!        +---------------+  no calls: next scripted round, or Done
//! ```
//!
//! Stages of one episode run strictly in sequence. A failed query ends the
//! episode with everything committed to history so far.

use crate::config::constants::{defaults, placeholders};
use crate::config::core::AgentConfig;
use crate::core::episode::{
    EpisodeFailure, EpisodeRecord, EpisodeStatus, StepRecord, Termination,
};
use crate::core::scenario::TestEntry;
use crate::llm::provider::{InferenceContext, LLMError, ParsedResponse, ProviderAdapter};
use crate::llm::types::{FunctionCall, TokenUsage, Turn};
use crate::tools::{JobHandle, ToolExecutor, ToolOutcome};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// Queries allowed within one scripted round
    pub max_steps: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_steps: defaults::DEFAULT_MAX_STEPS,
        }
    }
}

impl From<&AgentConfig> for DriverConfig {
    fn from(agent: &AgentConfig) -> Self {
        Self {
            max_steps: agent.max_steps.max(1),
        }
    }
}

#[derive(Debug)]
enum DriverState {
    AwaitingUserTurn,
    Querying,
    HasFunctionCalls(ParsedResponse),
    ExecutingTools {
        parsed: ParsedResponse,
        dispatched: Vec<Dispatched>,
    },
    Done(Termination),
    Failed(LLMError),
}

/// A call after dispatch, before its result is known
#[derive(Debug)]
enum Dispatched {
    Ready(String),
    Pending(JobHandle),
}

/// Object-safe handle on a driver, so the runner and the factory do not need
/// to know the adapter type
#[async_trait]
pub trait EpisodeEngine: Send + Sync {
    fn provider_name(&self) -> &str;

    fn model_id(&self) -> &str;

    async fn run_episode(&self, entry: &TestEntry, tools: &dyn ToolExecutor) -> EpisodeRecord;
}

pub struct ConversationDriver<A: ProviderAdapter> {
    adapter: A,
    config: DriverConfig,
}

impl<A: ProviderAdapter> ConversationDriver<A> {
    pub fn new(adapter: A, config: DriverConfig) -> Self {
        Self { adapter, config }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Run one scenario to completion or failure
    pub async fn run(&self, entry: &TestEntry, tools: &dyn ToolExecutor) -> EpisodeRecord {
        let started_at = Utc::now();
        let mut ctx = InferenceContext::<A::Tools>::new();
        let mut rounds: Vec<Vec<StepRecord>> = Vec::new();
        let mut usage = TokenUsage::default();

        info!(
            id = %entry.id,
            provider = self.adapter.name(),
            model = self.adapter.model_id(),
            "episode started"
        );

        let scripted = match self.prepare(&mut ctx, entry) {
            Ok(scripted) => scripted,
            Err(err) => {
                warn!(id = %entry.id, error = %err, "episode setup failed");
                let status = EpisodeStatus::Failed(EpisodeFailure::new(&err, 0));
                return self.finish(entry, ctx.history, rounds, usage, status, started_at);
            }
        };

        let mut round = 0;
        let mut steps_in_round = 0;
        let mut state = DriverState::AwaitingUserTurn;

        let status = loop {
            state = match state {
                DriverState::AwaitingUserTurn => match scripted.get(round) {
                    None => DriverState::Done(Termination::Finished),
                    Some(turns) => {
                        self.adapter.add_user_turns(&mut ctx, turns);
                        rounds.push(Vec::new());
                        steps_in_round = 0;
                        debug!(id = %entry.id, round, turns = turns.len(), "user round added");
                        DriverState::Querying
                    }
                },

                DriverState::Querying if steps_in_round >= self.config.max_steps => {
                    warn!(
                        id = %entry.id,
                        round,
                        max_steps = self.config.max_steps,
                        "step limit reached, ending episode"
                    );
                    DriverState::Done(Termination::StepLimit)
                }

                DriverState::Querying => {
                    steps_in_round += 1;
                    match self.adapter.query(&mut ctx).await {
                        Err(err) => DriverState::Failed(err),
                        Ok(timed) => {
                            let parsed = self.adapter.parse_response(&timed.value);
                            usage.add(parsed.usage);
                            self.adapter.add_assistant_turn(&mut ctx, &parsed);

                            let step = StepRecord {
                                model_responses: parsed.model_responses.clone(),
                                decoded_calls: self.adapter.decode_execute(&parsed),
                                execution_results: Vec::new(),
                                usage: parsed.usage,
                                latency_ms: timed.elapsed.as_millis() as u64,
                                input_log: ctx.take_input_log(),
                            };
                            if let Some(current) = rounds.last_mut() {
                                current.push(step);
                            }

                            if parsed.has_function_calls() {
                                DriverState::HasFunctionCalls(parsed)
                            } else {
                                round += 1;
                                DriverState::AwaitingUserTurn
                            }
                        }
                    }
                }

                DriverState::HasFunctionCalls(parsed) => {
                    let dispatched = dispatch(tools, parsed.function_calls()).await;
                    DriverState::ExecutingTools { parsed, dispatched }
                }

                DriverState::ExecutingTools { parsed, dispatched } => {
                    // Every pending handle resolves before the next query.
                    let results = resolve_all(tools, dispatched).await;
                    if let Some(step) = rounds.last_mut().and_then(|steps| steps.last_mut()) {
                        step.execution_results = results.clone();
                    }
                    match self
                        .adapter
                        .add_execution_results(&mut ctx, &results, &parsed)
                    {
                        Ok(()) => DriverState::Querying,
                        Err(err) => DriverState::Failed(err),
                    }
                }

                DriverState::Done(terminated_by) => {
                    break EpisodeStatus::Completed { terminated_by };
                }

                DriverState::Failed(err) => {
                    warn!(
                        id = %entry.id,
                        round,
                        kind = %err.kind(),
                        error = %err,
                        "episode failed"
                    );
                    break EpisodeStatus::Failed(EpisodeFailure::new(&err, round));
                }
            };
        };

        self.finish(entry, ctx.history, rounds, usage, status, started_at)
    }

    fn prepare(
        &self,
        ctx: &mut InferenceContext<A::Tools>,
        entry: &TestEntry,
    ) -> Result<Vec<Vec<Turn>>, LLMError> {
        let scripted = self.adapter.pre_process(ctx, entry)?;
        self.adapter.compile_tools(ctx, entry)?;
        Ok(scripted)
    }

    fn finish(
        &self,
        entry: &TestEntry,
        history: Vec<Turn>,
        rounds: Vec<Vec<StepRecord>>,
        usage: TokenUsage,
        status: EpisodeStatus,
        started_at: DateTime<Utc>,
    ) -> EpisodeRecord {
        let record = EpisodeRecord {
            id: entry.id.clone(),
            provider: self.adapter.name().to_string(),
            model: self.adapter.model_id().to_string(),
            status,
            history,
            rounds,
            usage,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            id = %record.id,
            completed = record.is_completed(),
            steps = record.step_count(),
            input_tokens = record.usage.input_tokens,
            output_tokens = record.usage.output_tokens,
            "episode finished"
        );
        record
    }
}

#[async_trait]
impl<A: ProviderAdapter> EpisodeEngine for ConversationDriver<A> {
    fn provider_name(&self) -> &str {
        self.adapter.name()
    }

    fn model_id(&self) -> &str {
        self.adapter.model_id()
    }

    async fn run_episode(&self, entry: &TestEntry, tools: &dyn ToolExecutor) -> EpisodeRecord {
        self.run(entry, tools).await
    }
}

/// Hand each call to the collaborator in call order
async fn dispatch(tools: &dyn ToolExecutor, calls: &[FunctionCall]) -> Vec<Dispatched> {
    let mut dispatched = Vec::with_capacity(calls.len());
    for call in calls {
        let outcome = match tools.execute(&call.name, &call.args).await {
            Ok(ToolOutcome::Ready(result)) => Dispatched::Ready(result),
            Ok(ToolOutcome::Deferred(handle)) => {
                debug!(function = %call.name, handle = %handle, "tool call deferred");
                Dispatched::Pending(handle)
            }
            Err(err) => {
                debug!(function = %call.name, error = %err, "tool call failed");
                Dispatched::Ready(execution_error(&err))
            }
        };
        dispatched.push(outcome);
    }
    dispatched
}

/// Wait for every pending handle; results stay in call order whatever order
/// the jobs finish in
async fn resolve_all(tools: &dyn ToolExecutor, dispatched: Vec<Dispatched>) -> Vec<String> {
    join_all(dispatched.into_iter().map(|call| async move {
        match call {
            Dispatched::Ready(result) => result,
            Dispatched::Pending(handle) => match tools.resolve(&handle).await {
                Ok(result) => result,
                Err(err) => execution_error(&err),
            },
        }
    }))
    .await
}

fn execution_error(err: &anyhow::Error) -> String {
    format!("{}{err:#}", placeholders::EXECUTION_ERROR_PREFIX)
}
