pub mod config;

pub use config::ClientConfig;

use crate::config::api_keys::GeminiCredential;
use crate::gemini::models::{Content, GenerateContentRequest, GenerateContentResponse};
use crate::llm::error_display;
use crate::llm::provider::LLMError;
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Sends one `generateContent` exchange.
///
/// The HTTP implementation is used in production; tests substitute scripted
/// transports so the pipeline can run without the network.
#[async_trait]
pub trait GeminiTransport: Send + Sync {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, LLMError>;
}

/// reqwest-backed transport for AI Studio and Vertex AI
pub struct HttpTransport {
    http: ReqwestClient,
    base_url: String,
    credential: GeminiCredential,
    /// Reported as the elapsed budget when reqwest times out
    request_timeout: Duration,
}

impl HttpTransport {
    /// `base_url` is the resource prefix under which `models/{model}` lives
    pub fn new(
        base_url: impl Into<String>,
        credential: GeminiCredential,
        config: ClientConfig,
    ) -> Result<Self, LLMError> {
        let http = ReqwestClient::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .tcp_keepalive(config.tcp_keepalive)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                LLMError::Provider(error_display::format_llm_error(
                    "Gemini",
                    &format!("Failed to build HTTP client: {e}"),
                ))
            })?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential,
            request_timeout: config.request_timeout,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        let url = format!("{}/models/{model}:generateContent", self.base_url);
        match &self.credential {
            GeminiCredential::ApiKey(key) => format!("{url}?key={key}"),
            _ => url,
        }
    }
}

#[async_trait]
impl GeminiTransport for HttpTransport {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, LLMError> {
        let mut builder = self.http.post(self.endpoint(model)).json(request);
        if let GeminiCredential::AccessToken(token) = &self.credential {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                LLMError::Timeout(self.request_timeout.as_millis() as u64)
            } else {
                LLMError::Network(error_display::format_llm_error(
                    "Gemini",
                    &format!("Network error: {e}"),
                ))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "Gemini returned an error status");
            return Err(classify_status(status.as_u16(), &error_text));
        }

        response.json().await.map_err(|e| {
            LLMError::Parse(error_display::format_llm_error(
                "Gemini",
                &format!("Failed to parse response: {e}"),
            ))
        })
    }
}

/// Map an HTTP error status and body onto the error taxonomy
pub fn classify_status(status: u16, body: &str) -> LLMError {
    let message = error_display::format_llm_error("Gemini", &format!("HTTP {status}: {body}"));
    let lowered = body.to_lowercase();
    let quota = lowered.contains("quota") || lowered.contains("resource_exhausted");

    match status {
        429 if quota => LLMError::QuotaExhausted(message),
        429 => LLMError::RateLimit(message),
        401 | 403 => LLMError::Authentication(message),
        408 | 504 => LLMError::Timeout(0),
        400 | 404 | 422 => LLMError::InvalidRequest(message),
        _ if quota => LLMError::QuotaExhausted(message),
        _ => LLMError::Provider(message),
    }
}

/// Gemini model handle.
///
/// A client is bound to one model and, optionally, one system instruction.
/// Episodes that carry a system instruction get their own client through
/// [`Client::with_system_instruction`]; the shared default is never mutated.
#[derive(Clone)]
pub struct Client {
    model: String,
    system_instruction: Option<Content>,
    transport: Arc<dyn GeminiTransport>,
}

impl Client {
    pub fn new(model: impl Into<String>, transport: Arc<dyn GeminiTransport>) -> Self {
        Self {
            model: model.into(),
            system_instruction: None,
            transport,
        }
    }

    /// New client for the same model and transport with a system instruction
    pub fn with_system_instruction(&self, instruction: impl Into<String>) -> Self {
        Self {
            model: self.model.clone(),
            system_instruction: Some(Content::system_text(instruction)),
            transport: Arc::clone(&self.transport),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn system_instruction(&self) -> Option<&Content> {
        self.system_instruction.as_ref()
    }

    /// Generate content with the Gemini API
    pub async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, LLMError> {
        match (&self.system_instruction, &request.system_instruction) {
            (Some(instruction), None) => {
                let mut request = request.clone();
                request.system_instruction = Some(instruction.clone());
                self.transport.generate_content(&self.model, &request).await
            }
            _ => self.transport.generate_content(&self.model, request).await,
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("model", &self.model)
            .field("system_instruction", &self.system_instruction)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::ErrorKind;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        seen: Mutex<Vec<(String, GenerateContentRequest)>>,
    }

    #[async_trait]
    impl GeminiTransport for RecordingTransport {
        async fn generate_content(
            &self,
            model: &str,
            request: &GenerateContentRequest,
        ) -> Result<GenerateContentResponse, LLMError> {
            self.seen
                .lock()
                .expect("lock")
                .push((model.to_string(), request.clone()));
            Ok(GenerateContentResponse::default())
        }
    }

    #[test]
    fn status_classification() {
        assert_eq!(classify_status(429, "slow down").kind(), ErrorKind::RateLimit);
        assert_eq!(
            classify_status(429, r#"{"status":"RESOURCE_EXHAUSTED"}"#).kind(),
            ErrorKind::QuotaExhausted
        );
        assert_eq!(classify_status(403, "denied").kind(), ErrorKind::Authentication);
        assert_eq!(classify_status(400, "bad schema").kind(), ErrorKind::InvalidRequest);
        assert_eq!(classify_status(504, "").kind(), ErrorKind::Timeout);
        assert_eq!(classify_status(500, "oops").kind(), ErrorKind::Provider);
    }

    #[test]
    fn api_key_goes_in_query_string() {
        let transport = HttpTransport::new(
            "https://example.test/v1beta/",
            GeminiCredential::ApiKey("k".into()),
            ClientConfig::default(),
        )
        .expect("transport");
        assert_eq!(
            transport.endpoint("gemini-2.0-flash-001"),
            "https://example.test/v1beta/models/gemini-2.0-flash-001:generateContent?key=k"
        );
    }

    #[tokio::test]
    async fn system_instruction_client_leaves_default_untouched() {
        let transport = Arc::new(RecordingTransport::default());
        let default_client = Client::new("gemini-2.5-pro", transport.clone());
        let episode_client = default_client.with_system_instruction("You are terse.");

        episode_client
            .generate(&GenerateContentRequest::default())
            .await
            .expect("generate");
        default_client
            .generate(&GenerateContentRequest::default())
            .await
            .expect("generate");

        assert!(default_client.system_instruction().is_none());
        let seen = transport.seen.lock().expect("lock");
        assert_eq!(seen[0].0, "gemini-2.5-pro");
        assert_eq!(
            seen[0].1.system_instruction,
            Some(Content::system_text("You are terse."))
        );
        assert!(seen[1].1.system_instruction.is_none());
    }
}
