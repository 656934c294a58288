use crate::core::routing::RoutingError;
use crate::core::sampling::SamplingError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("HTTP client error: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("GeoJSON error: {0}")]
    GeoJsonError(#[from] geojson::Error),

    #[error("Routing failed: {0}")]
    Routing(#[from] RoutingError),

    #[error("Sampling failed: {0}")]
    Sampling(#[from] SamplingError),

    #[error("No zone polygon found for code {code}")]
    ZoneNotFound { code: u64 },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn processing(message: impl Into<String>) -> Self {
        EtlError::ProcessingError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::ApiError(_) | EtlError::Routing(_) => ErrorCategory::Network,
            EtlError::IoError(_) => ErrorCategory::System,
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::GeoJsonError(_)
            | EtlError::Sampling(_)
            | EtlError::ZoneNotFound { .. }
            | EtlError::ProcessingError { .. }
            | EtlError::ValidationError { .. } => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Exit code used by the CLI for this error.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Configuration => 1,
            ErrorCategory::Network => 2,
            ErrorCategory::Data | ErrorCategory::System => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => {
                "Check the job TOML file and command-line overrides"
            }
            EtlError::ApiError(_) | EtlError::Routing(_) => {
                "Make sure the routing server is running and reachable at routing.base_url"
            }
            EtlError::IoError(_) => "Check that input files exist and the output directory is writable",
            EtlError::CsvError(_) => "Check the CSV delimiter and column names in the [survey] section",
            EtlError::GeoJsonError(_) | EtlError::SerializationError(_) => {
                "Make sure the zone file is a GeoJSON FeatureCollection in EPSG:4326"
            }
            EtlError::Sampling(_) => {
                "Inspect the zone geometry or raise sampling.max_attempts"
            }
            EtlError::ZoneNotFound { .. } => {
                "Check zones.code_property, or set sampling.skip_missing_zones = true"
            }
            EtlError::ProcessingError { .. } | EtlError::ValidationError { .. } => {
                "Inspect the input data for the reported row"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Network => format!("Routing service problem: {}", self),
            ErrorCategory::Data => format!("Input data problem: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_follow_category() {
        let config = EtlError::MissingConfigError {
            field: "routing.base_url".to_string(),
        };
        assert_eq!(config.category(), ErrorCategory::Configuration);
        assert_eq!(config.exit_code(), 1);

        let routing = EtlError::Routing(RoutingError::Timeout);
        assert_eq!(routing.category(), ErrorCategory::Network);
        assert_eq!(routing.exit_code(), 2);

        let zone = EtlError::ZoneNotFound { code: 11060100101 };
        assert_eq!(zone.exit_code(), 3);
        assert!(zone.to_string().contains("11060100101"));
    }
}
