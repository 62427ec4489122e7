//! Request and response logging for the hook pipeline.
//!
//! Sensitive headers are always printed as `[REDACTED]`. Levels:
//! - info: method, URL, status and duration
//! - debug: headers, cache hits and misses
//! - trace: bodies, truncated to `RESOURCEFUL_LOG_MAX_BODY` characters

use crate::constants;
use crate::transport::{OutgoingRequest, Response};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info, trace};

const DEFAULT_MAX_BODY_LEN: usize = 1000;
const REDACTED: &str = "[REDACTED]";

/// Redacts sensitive values from strings
#[must_use]
pub fn redact_sensitive_value(value: &str) -> String {
    if value.is_empty() {
        value.to_string()
    } else {
        REDACTED.to_string()
    }
}

/// Checks if a header name should be redacted
#[must_use]
pub fn should_redact_header(header_name: &str) -> bool {
    let lower = header_name.to_lowercase();
    matches!(
        lower.as_str(),
        "authorization"
            | "proxy-authorization"
            | "cookie"
            | "set-cookie"
            | "x-api-key"
            | "x-access-token"
            | "x-auth-token"
            | "x-csrf-token"
            | "x-xsrf-token"
            | "api-key"
            | "api_key"
            | "token"
            | "secret"
            | "password"
    )
}

fn log_headers(label: &str, headers: &IndexMap<String, String>) {
    if headers.is_empty() {
        return;
    }
    debug!(target: constants::LOG_TARGET_PIPELINE, "{label} headers:");
    for (name, value) in headers {
        let display_value = if should_redact_header(name) {
            redact_sensitive_value(value)
        } else {
            value.clone()
        };
        debug!(target: constants::LOG_TARGET_PIPELINE, "  {name}: {display_value}");
    }
}

fn log_body(label: &str, body: &Value, max_body_len: usize) {
    if body.is_null() {
        return;
    }
    let text = match body {
        Value::String(raw) => raw.clone(),
        other => other.to_string(),
    };
    if text.chars().count() > max_body_len {
        let truncated: String = text.chars().take(max_body_len).collect();
        trace!(
            target: constants::LOG_TARGET_PIPELINE,
            "{label} body: {truncated} (truncated at {max_body_len} chars)"
        );
    } else {
        trace!(target: constants::LOG_TARGET_PIPELINE, "{label} body: {text}");
    }
}

/// Logs a request right before it is handed to the transport
pub fn log_request(request: &OutgoingRequest) {
    info!(
        target: constants::LOG_TARGET_PIPELINE,
        "→ {} {}",
        request.method,
        request.url
    );
    if let Some(query) = &request.query {
        let query = Value::Object(query.clone());
        debug!(target: constants::LOG_TARGET_PIPELINE, "Query: {query}");
    }
    log_headers("Request", &request.headers);
    if let Some(body) = &request.body {
        log_body("Request", body, get_max_body_len());
    }
}

/// Logs a successful response with the time the transport took
pub fn log_response(response: &Response, duration_ms: u128) {
    info!(
        target: constants::LOG_TARGET_PIPELINE,
        "← {} ({}ms)",
        response.status,
        duration_ms
    );
    log_headers("Response", &response.headers);
    log_body("Response", &response.body, get_max_body_len());
}

/// Gets the maximum body length from `RESOURCEFUL_LOG_MAX_BODY`
#[must_use]
pub fn get_max_body_len() -> usize {
    std::env::var(constants::ENV_RESOURCEFUL_LOG_MAX_BODY)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_MAX_BODY_LEN)
}
