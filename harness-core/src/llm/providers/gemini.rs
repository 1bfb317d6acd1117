use crate::config::api_keys::gemini_credential;
use crate::config::constants::{defaults, gemini_roles, message_roles, models, placeholders};
use crate::config::loader::HarnessConfig;
use crate::core::scenario::TestEntry;
use crate::gemini::{
    self, Client, ClientConfig, Content, FunctionDeclaration, FunctionResponse,
    GenerateContentRequest, GenerateContentResponse, GenerationConfig, GeminiTransport,
    HttpTransport, Part, Tool, ToolConfig,
};
use crate::llm::provider::{
    ErrorKind, InferenceContext, InferenceInputLog, LLMError, ModelResponses, ParsedResponse,
    ProviderAdapter,
};
use crate::llm::retry::{RetryConfig, RetryExecutor, Timed};
use crate::llm::tool_schema;
use crate::llm::types::{FunctionCall, Role, TokenUsage, ToolDeclaration, Turn, TurnPayload};
use async_trait::async_trait;
use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

pub const PROVIDER_NAME: &str = "gemini";

/// Model name sent on the wire: the function-calling suffix is ours, not Google's
pub fn wire_model_name(model: &str) -> &str {
    model
        .strip_suffix(models::FUNCTION_CALLING_SUFFIX)
        .unwrap_or(model)
}

/// Error kinds retried with backoff
pub fn transient_errors() -> HashSet<ErrorKind> {
    HashSet::from([
        ErrorKind::RateLimit,
        ErrorKind::QuotaExhausted,
        ErrorKind::Timeout,
    ])
}

/// Translate declarations into Gemini tools. An empty set yields `None`, never
/// an empty tool list.
pub fn compile_gemini_tools(
    declarations: &[ToolDeclaration],
) -> Result<Option<Vec<Tool>>, LLMError> {
    tool_schema::validate_declarations(declarations)?;
    if declarations.is_empty() {
        return Ok(None);
    }

    let function_declarations = declarations
        .iter()
        .map(|declaration| {
            let cast = tool_schema::cast_to_openapi(declaration);
            FunctionDeclaration {
                name: cast.name,
                description: cast.description,
                parameters: tool_schema::gemini_cleanup(&cast.parameters),
            }
        })
        .collect();

    Ok(Some(vec![Tool {
        function_declarations,
    }]))
}

/// Convert neutral history into Gemini `contents`.
///
/// Consecutive tool results are grouped into a single `function` content,
/// which is how Gemini expects the answers to one model turn.
pub fn history_to_contents(history: &[Turn]) -> Result<Vec<Content>, LLMError> {
    let mut contents: Vec<Content> = Vec::with_capacity(history.len());
    let mut previous_was_tool = false;

    for turn in history {
        if turn.is_tool_result() {
            let part = match &turn.payload {
                TurnPayload::FunctionResult(result) => Part::function_response(FunctionResponse {
                    name: result.name.clone(),
                    response: result.response.clone(),
                }),
                TurnPayload::Text(text) => Part::text(text.clone()),
                other => {
                    return Err(LLMError::InvalidRequest(format!(
                        "tool-result turn cannot carry {other:?}"
                    )));
                }
            };
            match contents.last_mut() {
                Some(last) if previous_was_tool => last.parts.push(part),
                _ => contents.push(Content::new(gemini_roles::FUNCTION, vec![part])),
            }
            previous_was_tool = true;
            continue;
        }
        previous_was_tool = false;

        let content = match (&turn.role, &turn.payload) {
            (_, TurnPayload::VendorNative { provider, content }) => {
                if provider != PROVIDER_NAME {
                    return Err(LLMError::InvalidRequest(format!(
                        "cannot replay a {provider} turn to Gemini"
                    )));
                }
                let mut native: Content = serde_json::from_value(content.clone())
                    .map_err(|e| LLMError::Parse(format!("stored Gemini turn: {e}")))?;
                if native.role.is_empty() {
                    native.role = gemini_roles::MODEL.to_string();
                }
                native
            }
            (Role::User, TurnPayload::Text(text)) => Content::user_text(text.clone()),
            (Role::Model, TurnPayload::Text(text)) => {
                Content::new(gemini_roles::MODEL, vec![Part::text(text.clone())])
            }
            (Role::Model, TurnPayload::FunctionCall(call)) => Content::new(
                gemini_roles::MODEL,
                vec![Part::function_call(gemini::FunctionCall {
                    name: call.name.clone(),
                    args: call.args.clone(),
                    id: None,
                })],
            ),
            (role, payload) => {
                return Err(LLMError::InvalidRequest(format!(
                    "{role:?} turn cannot carry {payload:?}"
                )));
            }
        };
        contents.push(content);
    }

    Ok(contents)
}

/// Compiled declarations as they go on the wire, for the input log
fn sent_declarations(tools: Option<&[Tool]>) -> Vec<ToolDeclaration> {
    tools
        .unwrap_or_default()
        .iter()
        .flat_map(|tool| &tool.function_declarations)
        .map(|declaration| {
            ToolDeclaration::new(
                declaration.name.clone(),
                declaration.description.clone(),
                declaration.parameters.clone(),
            )
        })
        .collect()
}

/// Gemini / Vertex AI adapter
pub struct GeminiProvider {
    /// Configured name, possibly with the function-calling suffix
    model: String,
    temperature: f32,
    /// Default client, built without a system instruction
    client: Client,
    retry: RetryExecutor,
    transient: HashSet<ErrorKind>,
}

impl GeminiProvider {
    pub fn new(model: impl Into<String>, transport: Arc<dyn GeminiTransport>) -> Self {
        let model = model.into();
        let client = Client::new(wire_model_name(&model), transport);
        Self {
            model,
            temperature: defaults::DEFAULT_TEMPERATURE,
            client,
            retry: RetryExecutor::default(),
            transient: transient_errors(),
        }
    }

    /// Build an HTTP-backed provider from the loaded configuration
    pub fn from_config(model: &str, config: &HarnessConfig) -> anyhow::Result<Self> {
        let credential = gemini_credential(&config.gemini)?;
        let transport = HttpTransport::new(
            config.gemini.resolved_base_url(),
            credential,
            ClientConfig::from(&config.http),
        )?;
        Ok(Self::new(model, Arc::new(transport))
            .with_temperature(config.agent.temperature)
            .with_retry_config(RetryConfig::from(&config.retry)))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry = RetryExecutor::new(config);
        self
    }

    pub fn retry_config(&self) -> &RetryConfig {
        self.retry.config()
    }

    /// Client for this episode. A system instruction gets a dedicated client;
    /// the default one is shared and never modified.
    fn episode_client(&self, system_instruction: Option<&str>) -> Cow<'_, Client> {
        match system_instruction {
            Some(instruction) if self.client.system_instruction().is_none() => {
                Cow::Owned(self.client.with_system_instruction(instruction))
            }
            _ => Cow::Borrowed(&self.client),
        }
    }
}

#[async_trait]
impl ProviderAdapter for GeminiProvider {
    type Tools = Vec<Tool>;
    type Response = GenerateContentResponse;

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn pre_process(
        &self,
        ctx: &mut InferenceContext<Self::Tools>,
        entry: &TestEntry,
    ) -> Result<Vec<Vec<Turn>>, LLMError> {
        ctx.history.clear();
        ctx.system_instruction = None;

        let mut rounds = Vec::with_capacity(entry.question.len());
        for (index, round) in entry.question.iter().enumerate() {
            let mut turns = Vec::with_capacity(round.len());
            for message in round {
                let turn = match message.role.as_str() {
                    message_roles::SYSTEM if index == 0 && ctx.system_instruction.is_none() => {
                        ctx.system_instruction = Some(message.content.clone());
                        continue;
                    }
                    message_roles::SYSTEM => {
                        return Err(LLMError::InvalidRequest(format!(
                            "{}: system message in round {index} must be the first of round 0",
                            entry.id
                        )));
                    }
                    message_roles::USER => Turn::user_text(message.content.clone()),
                    message_roles::ASSISTANT => Turn::model_text(message.content.clone()),
                    message_roles::TOOL => Turn {
                        role: Role::ToolResult,
                        payload: TurnPayload::Text(message.content.clone()),
                    },
                    other => {
                        return Err(LLMError::InvalidRequest(format!(
                            "{}: unknown role '{other}'",
                            entry.id
                        )));
                    }
                };
                turns.push(turn);
            }
            rounds.push(turns);
        }
        Ok(rounds)
    }

    fn compile_tools(
        &self,
        ctx: &mut InferenceContext<Self::Tools>,
        entry: &TestEntry,
    ) -> Result<(), LLMError> {
        let declarations = tool_schema::language_pre_process(&entry.function, entry.category());
        ctx.tools = compile_gemini_tools(&declarations)?;
        ctx.declarations = declarations;
        Ok(())
    }

    async fn query(
        &self,
        ctx: &mut InferenceContext<Self::Tools>,
    ) -> Result<Timed<Self::Response>, LLMError> {
        let contents = history_to_contents(&ctx.history)?;

        ctx.capture_input_log(InferenceInputLog {
            message: format!("{contents:?}"),
            tools: sent_declarations(ctx.tools.as_deref()),
            system_prompt: ctx.system_instruction.clone(),
        });

        let request = GenerateContentRequest {
            contents,
            tool_config: ctx.tools.as_ref().map(|_| ToolConfig::auto()),
            tools: ctx.tools.clone(),
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                temperature: Some(self.temperature),
                max_output_tokens: None,
            }),
        };

        let client = self.episode_client(ctx.system_instruction.as_deref());
        let client: &Client = &client;
        let request = &request;
        debug!(
            model = client.model(),
            contents = request.contents.len(),
            "querying Gemini"
        );

        self.retry
            .execute(&self.transient, move || client.generate(request))
            .await
    }

    fn parse_response(&self, response: &Self::Response) -> ParsedResponse {
        let usage = response
            .usage_metadata
            .map(|metadata| TokenUsage {
                input_tokens: metadata.prompt_token_count,
                output_tokens: metadata.candidates_token_count,
            })
            .unwrap_or_default();

        let Some(content) = response.first_content() else {
            return ParsedResponse {
                model_responses: ModelResponses::Text(vec![placeholders::NO_RESPONSE.to_string()]),
                tool_call_names: Vec::new(),
                history_turn: Turn::model_text(placeholders::NO_RESPONSE),
                usage,
            };
        };

        let mut calls = Vec::new();
        let mut names = Vec::new();
        let mut texts = Vec::new();
        for part in &content.parts {
            match &part.function_call {
                // an empty functionCall object is not a call
                Some(call) if call.is_present() => {
                    calls.push(FunctionCall::new(call.name.clone(), call.args.clone()));
                    names.push(call.name.clone());
                }
                _ => {
                    if let Some(text) = &part.text {
                        texts.push(text.clone());
                    }
                }
            }
        }

        let history_turn = match serde_json::to_value(content) {
            Ok(value) => Turn::vendor_native(PROVIDER_NAME, value),
            Err(_) => Turn::model_text(texts.concat()),
        };

        let model_responses = if calls.is_empty() {
            ModelResponses::Text(texts)
        } else {
            ModelResponses::FunctionCalls(calls)
        };

        ParsedResponse {
            model_responses,
            tool_call_names: names,
            history_turn,
            usage,
        }
    }
}
