use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("LLM request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("LLM service returned {status}: {message}")]
    UpstreamError { status: u16, message: String },

    #[error("Malformed LLM response: {message}")]
    MalformedResponseError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Missing required fields: {}", fields.join(", "))]
    MissingFieldsError { fields: Vec<String> },

    #[error("Invalid JSON format: {message}")]
    InvalidJsonError { message: String },

    #[error("Invalid request body: {message}")]
    InvalidRequestError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Upstream,
    Configuration,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ServiceError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ServiceError::MissingFieldsError { .. }
            | ServiceError::InvalidJsonError { .. }
            | ServiceError::InvalidRequestError { .. } => ErrorCategory::Input,
            ServiceError::ApiError(_)
            | ServiceError::UpstreamError { .. }
            | ServiceError::MalformedResponseError { .. } => ErrorCategory::Upstream,
            ServiceError::ConfigError { .. }
            | ServiceError::ConfigValidationError { .. }
            | ServiceError::InvalidConfigValueError { .. }
            | ServiceError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ServiceError::IoError(_) | ServiceError::SerializationError(_) => {
                ErrorCategory::Internal
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Low,
            ErrorCategory::Upstream => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Internal => ErrorSeverity::Critical,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.category() == ErrorCategory::Input
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ServiceError::MissingFieldsError { fields } => format!(
                "Provide a value for: {}",
                fields.join(", ")
            ),
            ServiceError::InvalidJsonError { .. } => {
                "Check that the JSON data is a single valid JSON document (quotes, commas, brackets)"
                    .to_string()
            }
            ServiceError::InvalidRequestError { .. } => {
                "Send a JSON object body with string fields".to_string()
            }
            ServiceError::ApiError(e) if e.is_timeout() => {
                "The LLM service timed out; try again or raise llm.timeout_seconds".to_string()
            }
            ServiceError::ApiError(_) => {
                "Check network connectivity and the llm.endpoint setting".to_string()
            }
            ServiceError::UpstreamError { status, .. } => match status {
                401 | 403 => "Check the API key (llm.api_key or OPENAI_API_KEY)".to_string(),
                429 => "The LLM service is rate limiting or out of quota; wait and retry".to_string(),
                s if *s >= 500 => "The LLM service is failing; retry later".to_string(),
                _ => "Check the llm.model and stage settings".to_string(),
            },
            ServiceError::MalformedResponseError { .. } => {
                "Make sure llm.endpoint points at an OpenAI-compatible chat completions API"
                    .to_string()
            }
            ServiceError::ConfigError { .. }
            | ServiceError::ConfigValidationError { .. }
            | ServiceError::InvalidConfigValueError { .. } => {
                "Fix the configuration file and restart".to_string()
            }
            ServiceError::MissingConfigError { field } => {
                format!("Set '{}' in the configuration file or environment", field)
            }
            ServiceError::IoError(_) => "Check file paths and permissions".to_string(),
            ServiceError::SerializationError(_) => {
                "Unexpected data shape; please report this".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => self.to_string(),
            ErrorCategory::Upstream => format!("The language model service failed: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Internal => format!("Internal error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
