//! Gemini API client
//!
//! Wire models for `generateContent`, the function-calling part payloads and a
//! transport-agnostic client usable against AI Studio or Vertex AI.

pub mod client;
pub mod function_calling;
pub mod models;

pub use client::{Client, ClientConfig, GeminiTransport, HttpTransport};
pub use function_calling::{FunctionCall, FunctionCallingConfig, FunctionResponse};
pub use models::{
    Candidate, Content, FunctionDeclaration, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, Part, Tool, ToolConfig, UsageMetadata,
};
