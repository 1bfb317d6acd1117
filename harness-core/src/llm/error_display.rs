//! Uniform formatting for provider error messages.

/// Prefix a provider error with the provider name, trimming noisy bodies.
pub fn format_llm_error(provider: &str, message: &str) -> String {
    let message = message.trim();
    let message = match message.char_indices().nth(MAX_MESSAGE_CHARS) {
        Some((cut, _)) => format!("{}...", &message[..cut]),
        None => message.to_string(),
    };
    format!("{provider}: {message}")
}

const MAX_MESSAGE_CHARS: usize = 500;
