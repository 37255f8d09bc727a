use url::Url;

use crate::types::OrchestrationError;

/// Suffix guaranteed on the note service API base.
const API_SUFFIX: &str = "/api/v1";

/// Normalizes an auth token to carry exactly one `Bearer ` prefix.
pub fn normalize_auth_token(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let lower = trimmed.to_ascii_lowercase();
    let token = if let Some(rest) = lower.strip_prefix("bearer") {
        if rest.starts_with(char::is_whitespace) {
            trimmed["bearer".len()..].trim()
        } else {
            trimmed
        }
    } else {
        trimmed
    };
    format!("Bearer {token}")
}

/// Builds the chat-completions URL from the configured model endpoint. An
/// endpoint that already names the completions path is used as-is.
pub fn completions_url(model_url: &str) -> Result<String, OrchestrationError> {
    Url::parse(model_url).map_err(|err| {
        OrchestrationError::configuration(format!("model endpoint is not a valid URL: {err}"))
    })?;
    if model_url.contains("/chat/completions") {
        return Ok(model_url.to_string());
    }
    Ok(format!(
        "{}/chat/completions",
        model_url.trim_end_matches('/')
    ))
}

/// Normalizes the note service base URL to end in exactly one `/api/v1`.
pub fn normalize_api_base(target_url: &str) -> String {
    let trimmed = target_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }
    match trimmed.find(API_SUFFIX) {
        Some(idx) => format!("{}{API_SUFFIX}", &trimmed[..idx]),
        None => format!("{trimmed}{API_SUFFIX}"),
    }
}

/// The bare service domain: the base URL with any `/api/v1` path and
/// trailing slashes removed. File uploads hang off this form.
pub fn clean_domain(target_url: &str) -> String {
    let trimmed = target_url.trim();
    let cut = trimmed.find(API_SUFFIX).map_or(trimmed, |idx| &trimmed[..idx]);
    cut.trim_end_matches('/').to_string()
}
