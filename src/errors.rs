use thiserror::Error;
use crate::kind::SensorKind;

/// Failures reported by a native sensor port when registering a listener
#[derive(Error, Debug)]
pub enum PortError {
    #[error("Sensor '{kind}' is not available on this device")]
    Unavailable { kind: SensorKind },

    #[error("Sensor '{kind}' registration failed: {reason}")]
    RegistrationFailed { kind: SensorKind, reason: String },

    #[error("No async runtime available to drive sensor '{kind}'")]
    NoRuntime { kind: SensorKind },
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from '{path}': {source}")]
    LoadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration format: {0}")]
    FormatError(#[from] toml::de::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Errors raised while decoding a method call from the host
#[derive(Error, Debug)]
pub enum MethodError {
    #[error("Malformed method call: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid arguments for '{method}': {reason}")]
    InvalidArguments { method: String, reason: String },
}

/// Result type aliases for convenience
pub type PortResult<T> = Result<T, PortError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type CallResult<T> = Result<T, MethodError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_error_names_the_stream() {
        let err = PortError::RegistrationFailed {
            kind: SensorKind::Gyroscope,
            reason: "listener rejected".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Sensor 'gyroscope' registration failed: listener rejected"
        );
    }

    #[test]
    fn test_config_error_from_toml() {
        let parse: Result<toml::Value, _> = toml::from_str("sensor = [");
        let err: ConfigError = parse.unwrap_err().into();
        assert!(err.to_string().starts_with("Invalid configuration format"));
    }
}
