use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("No operation matches {method} {path}")]
    RouteNotFound { method: String, path: String },

    #[error("Authentication failed for scheme(s): {}", .schemes.join(", "))]
    AuthenticationFailed { schemes: Vec<String> },

    #[error("Unsupported media type: {mime}")]
    UnsupportedMediaType { mime: String },

    #[error("None of the accepted media types can be produced: {accept}")]
    NotAcceptable { accept: String },

    #[error("Failed to decode {mime} payload: {message}")]
    DecodeFailed { mime: String, message: String },

    #[error("Failed to encode {mime} payload: {message}")]
    EncodeFailed { mime: String, message: String },

    #[error("Operation {operation} failed: {message}")]
    HandlerFailed { operation: String, message: String },

    #[error("Model not registered: {name}")]
    ModelNotFound { name: String },

    #[error("Security scheme not registered: {scheme}")]
    SchemeNotRegistered { scheme: String },

    #[error("Invalid path template {template}: {reason}")]
    InvalidPathTemplate { template: String, reason: String },

    #[error("Unknown HTTP method: {0}")]
    UnknownMethod(String),

    #[error("API assembly is inconsistent: {}", .problems.join("; "))]
    Assembly { problems: Vec<String> },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

/// 錯誤分類，讓傳輸層決定如何回應
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Routing,
    Security,
    Negotiation,
    Payload,
    Handler,
    Configuration,
    System,
}

impl ApiError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ApiError::RouteNotFound { .. } => ErrorCategory::Routing,
            ApiError::AuthenticationFailed { .. } => ErrorCategory::Security,
            ApiError::UnsupportedMediaType { .. } | ApiError::NotAcceptable { .. } => {
                ErrorCategory::Negotiation
            }
            ApiError::DecodeFailed { .. } | ApiError::EncodeFailed { .. } => ErrorCategory::Payload,
            ApiError::HandlerFailed { .. } => ErrorCategory::Handler,
            ApiError::ModelNotFound { .. }
            | ApiError::SchemeNotRegistered { .. }
            | ApiError::InvalidPathTemplate { .. }
            | ApiError::UnknownMethod(_)
            | ApiError::Assembly { .. }
            | ApiError::ConfigValidationError { .. }
            | ApiError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            ApiError::IoError(_) => ErrorCategory::System,
        }
    }

    /// 對應的 HTTP 狀態碼
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::RouteNotFound { .. } => 404,
            ApiError::AuthenticationFailed { .. } => 401,
            ApiError::UnsupportedMediaType { .. } => 415,
            ApiError::NotAcceptable { .. } => 406,
            ApiError::DecodeFailed { .. } => 400,
            ApiError::UnknownMethod(_) => 405,
            _ => 500,
        }
    }

    pub fn handler_failed(operation: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::HandlerFailed {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Failure reported by a Consumer or Producer. The dispatcher attaches the
/// MIME type when it turns this into `DecodeFailed` / `EncodeFailed`.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),

    #[error("TOML encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid UTF-8 input: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("{0}")]
    Unrepresentable(String),
}

/// Why a single security scheme refused a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("no credentials supplied")]
    MissingCredentials,

    #[error("malformed credentials: {0}")]
    Malformed(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Unauthenticated(String),
}
