use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Config(String),

    /// A URL template used an identifier that cannot be a parameter name.
    #[error("badname: {name} is not a valid parameter name")]
    ReservedParamName { name: String },
    /// A parameter factory or preprocessor failed.
    #[error("Error while casting parameters: parameter: \"{param}\" url: \"{url}\": {source}")]
    ParamResolution {
        param: String,
        url: String,
        #[source]
        source: Box<Error>,
    },
    /// Raised by user supplied hooks, factories and preprocessors.
    #[error("{0}")]
    Hook(String),

    #[error("Request failed: {reason}")]
    RequestFailed { reason: String },
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: Value },
    #[error("Failed to read response: {reason}")]
    ResponseReadError { reason: String },

    #[error("Cache lookup failed: {reason}")]
    CacheLookup { reason: String },
    #[error("Cache store failed: {reason}")]
    CacheStore { reason: String },

    #[error("Invalid action arguments: {reason}")]
    InvalidArguments { reason: String },
    #[error("Unknown action '{name}'. Available actions: {}", available.join(", "))]
    UnknownAction { name: String, available: Vec<String> },

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// JSON representation of an error for structured output
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonError {
    pub error_type: String,
    pub message: String,
    pub context: Option<String>,
}

impl Error {
    /// Error raised from inside a user hook.
    pub fn hook(message: impl Into<String>) -> Self {
        Self::Hook(message.into())
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::Config(reason.into())
    }

    pub fn invalid_arguments(reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            reason: reason.into(),
        }
    }

    pub fn request_failed(reason: impl Into<String>) -> Self {
        Self::RequestFailed {
            reason: reason.into(),
        }
    }

    pub fn cache_lookup(reason: impl Into<String>) -> Self {
        Self::CacheLookup {
            reason: reason.into(),
        }
    }

    /// Wraps a factory/preprocessor failure with the parameter and template it came from.
    #[must_use]
    pub fn param_resolution(param: &str, url: &str, source: Self) -> Self {
        Self::ParamResolution {
            param: param.to_string(),
            url: url.to_string(),
            source: Box::new(source),
        }
    }

    /// HTTP status carried by the error, if it came from a response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Convert error to JSON representation for structured output
    #[must_use]
    pub fn to_json(&self) -> JsonError {
        let (error_type, context) = match self {
            Self::Io(io_err) => (
                "FileSystem",
                match io_err.kind() {
                    std::io::ErrorKind::NotFound => {
                        Some("Check that the file path is correct and the file exists.")
                    }
                    std::io::ErrorKind::PermissionDenied => {
                        Some("Check file permissions or run with appropriate privileges.")
                    }
                    _ => None,
                },
            ),
            Self::Json(_) => (
                "JSONParsing",
                Some("Check that your request body or response contains valid JSON."),
            ),
            Self::Toml(_) => (
                "TOMLParsing",
                Some("Check that your configuration file is valid TOML syntax."),
            ),
            Self::Config(_) => ("Configuration", None),
            Self::ReservedParamName { .. } => (
                "UrlTemplate",
                Some("Rename the path token in the URL template."),
            ),
            Self::ParamResolution { .. } => ("ParameterResolution", None),
            Self::Hook(_) => ("Hook", None),
            Self::RequestFailed { .. } | Self::ResponseReadError { .. } => (
                "Network",
                Some("Check that the API server is running and accessible."),
            ),
            Self::HttpStatus { status, .. } => ("HttpError", status_hint(*status)),
            Self::CacheLookup { .. } | Self::CacheStore { .. } => ("Cache", None),
            Self::InvalidArguments { .. } | Self::UnknownAction { .. } => ("Usage", None),
            Self::Anyhow(_) => (
                "Unexpected",
                Some("This may be a bug. Please report it with the command you were running."),
            ),
        };

        JsonError {
            error_type: error_type.to_string(),
            message: self.to_string(),
            context: context.map(str::to_string),
        }
    }
}

const fn status_hint(status: u16) -> Option<&'static str> {
    match status {
        401 => Some("Check your API credentials and authentication configuration."),
        403 => Some("Your credentials may be valid but lack permission for this operation."),
        404 => Some("Check that the API endpoint and parameters are correct."),
        429 => Some("You're making requests too quickly. Wait before trying again."),
        500..=599 => Some("The API server is experiencing issues. Try again later."),
        _ => None,
    }
}
