/// Model ID constants
pub mod models {
    // Google/Gemini models
    pub mod google {
        pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-001-FC";
        pub const SUPPORTED_MODELS: &[&str] = &[
            "gemini-2.0-flash-001-FC",
            "gemini-2.0-flash-lite-001-FC",
            "gemini-2.5-flash-FC",
            "gemini-2.5-pro-FC",
        ];
    }

    /// Suffix marking function-calling variants of a model name
    pub const FUNCTION_CALLING_SUFFIX: &str = "-FC";
}

/// Default configuration values
pub mod defaults {
    pub const DEFAULT_PROVIDER: &str = "gemini";
    pub const DEFAULT_TEMPERATURE: f32 = 0.001;
    /// Queries allowed per user round before the episode is force-terminated
    pub const DEFAULT_MAX_STEPS: usize = 20;
    pub const DEFAULT_CONCURRENCY: usize = 4;
    pub const DEFAULT_VERTEX_LOCATION: &str = "us-central1";
    pub const CONFIG_FILE_NAME: &str = "harness.toml";
    pub const CONFIG_DIR_NAME: &str = ".harness";
}

/// Retry/backoff defaults
pub mod retry {
    pub const MAX_ATTEMPTS: u32 = 5;
    pub const INITIAL_DELAY_MS: u64 = 2_000;
    pub const MAX_DELAY_MS: u64 = 120_000;
    pub const BACKOFF_MULTIPLIER: f64 = 2.0;
    pub const ATTEMPT_TIMEOUT_MS: u64 = 120_000;
}

/// Message role constants as they appear in raw scenario files
pub mod message_roles {
    pub const SYSTEM: &str = "system";
    pub const USER: &str = "user";
    pub const ASSISTANT: &str = "assistant";
    pub const TOOL: &str = "tool";
}

/// Role vocabulary accepted by the Gemini `contents` array
pub mod gemini_roles {
    pub const USER: &str = "user";
    pub const MODEL: &str = "model";
    pub const FUNCTION: &str = "function";
}

/// Environment variable names consulted for credentials and endpoints
pub mod env {
    pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
    pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
    pub const VERTEX_PROJECT_ID: &str = "VERTEX_AI_PROJECT_ID";
    pub const VERTEX_LOCATION: &str = "VERTEX_AI_LOCATION";
    pub const VERTEX_ACCESS_TOKEN: &str = "VERTEX_AI_ACCESS_TOKEN";
}

/// URL constants for API endpoints
pub mod urls {
    pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
    /// `{location}` is substituted with the configured Vertex region
    pub const VERTEX_API_BASE_TEMPLATE: &str = "https://{location}-aiplatform.googleapis.com/v1";
}

/// Fixed content used when the model produced nothing
pub mod placeholders {
    pub const NO_RESPONSE: &str = "The model did not return any response.";
    pub const EXECUTION_ERROR_PREFIX: &str = "Error during execution: ";
}

/// Tool name constants for the built-in DailyContext environment
pub mod tools {
    pub const GET_TEMPERATURE: &str = "get_temperature";
    pub const EVAL_FUTURE: &str = "eval_future";
    pub const SUBTRACT: &str = "subtract";
    pub const GET_LOCATION: &str = "get_location";
    pub const GET_FUTURE: &str = "get_future";
    pub const GET_WORK_TIME: &str = "get_work_time";
    pub const GET_CURRENT_TIME: &str = "get_current_time";
}
