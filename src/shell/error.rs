use std::error::Error;
use std::fmt::Display;

/// Error type for page assembly, configuration and overlay storage
#[derive(Debug)]
pub enum ShellError {
    /// Server-supplied data could not be turned into embeddable text
    SerializationError(String),
    /// The shell template failed to compile or render
    TemplateError(String),
    /// Two client templates share a name
    DuplicateTemplate(String),
    /// Client template name cannot be used as an element id
    InvalidTemplateName(String),
    /// Endpoint locator cannot be embedded verbatim
    InvalidEndpoint(String),
    /// Configuration could not be loaded
    ConfigError(String),
    /// Overlay store failure
    StorageError(String),
    /// Requested record does not exist
    NotFound(String),
    /// Request payload rejected
    ValidationError(String),
}

impl ShellError {
    /// Stable machine-readable code used in API error bodies
    pub fn code(&self) -> &'static str {
        match self {
            ShellError::SerializationError(_) => "SERIALIZATION_FAILED",
            ShellError::TemplateError(_) => "TEMPLATE_FAILED",
            ShellError::DuplicateTemplate(_) => "DUPLICATE_TEMPLATE",
            ShellError::InvalidTemplateName(_) => "INVALID_TEMPLATE_NAME",
            ShellError::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            ShellError::ConfigError(_) => "CONFIG_ERROR",
            ShellError::StorageError(_) => "STORAGE_ERROR",
            ShellError::NotFound(_) => "NOT_FOUND",
            ShellError::ValidationError(_) => "VALIDATION_FAILED",
        }
    }
}

impl Display for ShellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShellError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            ShellError::TemplateError(msg) => write!(f, "Template error: {}", msg),
            ShellError::DuplicateTemplate(name) => write!(f, "Duplicate client template: {}", name),
            ShellError::InvalidTemplateName(name) => write!(f, "Invalid client template name: {:?}", name),
            ShellError::InvalidEndpoint(msg) => write!(f, "Invalid endpoint: {}", msg),
            ShellError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            ShellError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            ShellError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ShellError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl Error for ShellError {}

impl From<serde_json::Error> for ShellError {
    fn from(err: serde_json::Error) -> Self {
        ShellError::SerializationError(err.to_string())
    }
}

impl From<handlebars::RenderError> for ShellError {
    fn from(err: handlebars::RenderError) -> Self {
        ShellError::TemplateError(err.to_string())
    }
}

impl From<handlebars::TemplateError> for ShellError {
    fn from(err: handlebars::TemplateError) -> Self {
        ShellError::TemplateError(err.to_string())
    }
}

impl From<rusqlite::Error> for ShellError {
    fn from(err: rusqlite::Error) -> Self {
        ShellError::StorageError(err.to_string())
    }
}

impl From<std::io::Error> for ShellError {
    fn from(err: std::io::Error) -> Self {
        ShellError::ConfigError(err.to_string())
    }
}

pub type ShellResult<T> = Result<T, ShellError>;
