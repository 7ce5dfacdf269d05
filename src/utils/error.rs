use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscountError {
    #[error("Store API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Store API returned status {status} for {url}")]
    ApiStatusError { status: u16, url: String },

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

    #[error("Invalid module request: {message}")]
    RequestError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Request,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DiscountError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DiscountError::ApiError(_) | DiscountError::ApiStatusError { .. } => {
                ErrorCategory::Network
            }
            DiscountError::ConfigError { .. }
            | DiscountError::ConfigValidationError { .. }
            | DiscountError::InvalidConfigValueError { .. }
            | DiscountError::MissingConfigError { .. } => ErrorCategory::Configuration,
            DiscountError::SerializationError(_) | DiscountError::RequestError { .. } => {
                ErrorCategory::Request
            }
            DiscountError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 網路錯誤可重試
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Request => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            DiscountError::ApiError(_) | DiscountError::ApiStatusError { .. } => {
                "Check the Store API base URL and credentials, then retry"
            }
            DiscountError::IoError(_) => "Check that the file exists and is readable",
            DiscountError::SerializationError(_) => {
                "Make sure the request body follows the apply_discount module schema"
            }
            DiscountError::ConfigError { .. }
            | DiscountError::ConfigValidationError { .. }
            | DiscountError::InvalidConfigValueError { .. }
            | DiscountError::MissingConfigError { .. } => {
                "Review the service configuration file and environment variables"
            }
            DiscountError::RequestError { .. } => "Send both `params` and `application` objects",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach the Store API ({})", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Request => format!("Invalid discount request: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, DiscountError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_high_severity() {
        let err = DiscountError::MissingConfigError {
            field: "store_api.base_url".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("store_api.base_url"));
    }

    #[test]
    fn test_status_error_is_retryable() {
        let err = DiscountError::ApiStatusError {
            status: 503,
            url: "https://api.example.com/orders.json".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.to_string().contains("503"));
    }
}
