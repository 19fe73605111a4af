use thiserror::Error;

#[derive(Error, Debug)]
pub enum FareError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

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

    #[error("Invalid date '{value}' in '{field}': expected YYYY-MM-DD")]
    DateParseError { field: String, value: String },

    #[error("Authentication failed: {message}")]
    AuthenticationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Authentication,
    Network,
    Storage,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl FareError {
    pub fn config(message: impl Into<String>) -> Self {
        FareError::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            FareError::ConfigError { .. }
            | FareError::ConfigValidationError { .. }
            | FareError::InvalidConfigValueError { .. }
            | FareError::MissingConfigError { .. }
            | FareError::DateParseError { .. } => ErrorCategory::Configuration,
            FareError::AuthenticationError { .. } => ErrorCategory::Authentication,
            FareError::ApiError(_) => ErrorCategory::Network,
            FareError::IoError(_) | FareError::CsvError(_) => ErrorCategory::Storage,
            FareError::SerializationError(_) => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Storage => ErrorSeverity::High,
            ErrorCategory::Authentication => ErrorSeverity::Critical,
        }
    }

    /// Configuration and authentication failures abort the run before any search.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Configuration | ErrorCategory::Authentication
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the TOML configuration file and any ${VAR} environment placeholders"
            }
            ErrorCategory::Authentication => {
                "Verify the provider client id and secret, then run again"
            }
            ErrorCategory::Network => "Check network connectivity and retry later",
            ErrorCategory::Storage => "Make sure the output directory exists and is writable",
            ErrorCategory::Data => "The provider returned unexpected data; run with --verbose",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            FareError::DateParseError { field, value } => {
                format!("The date '{}' in {} is not a valid calendar date", value, field)
            }
            FareError::MissingConfigError { field } => {
                format!("The setting '{}' is required but was not provided", field)
            }
            FareError::AuthenticationError { .. } => {
                "Could not obtain an access token; no searches were made".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FareError>;
