//! Error types for itchyctl

use itchy::ItchyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Command rejected: {0}")]
    CommandRejected(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::DeviceNotFound(_) => 2,
            CliError::CommandRejected(_) => 3,
            CliError::ValidationError(_)
            | CliError::InvalidConfiguration(_)
            | CliError::JsonError(_) => 4,
            CliError::IoError(_) => 1,
        }
    }

    /// Classify a failed device command.
    pub fn from_command(err: ItchyError) -> Self {
        match err {
            ItchyError::DeviceNotFound(id) => CliError::DeviceNotFound(id.to_string()),
            ItchyError::NotConnected => CliError::DeviceNotFound("device disconnected".to_string()),
            ItchyError::Protocol(e) => CliError::ValidationError(e.to_string()),
            ItchyError::InvalidConfiguration(msg) => CliError::InvalidConfiguration(msg),
            ItchyError::Json(e) => CliError::JsonError(e),
            ItchyError::Io(e) => CliError::IoError(e),
            other => CliError::CommandRejected(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itchy::{DeviceIdentifier, HidError};

    #[test]
    fn exit_codes() {
        assert_eq!(CliError::DeviceNotFound("x".into()).exit_code(), 2);
        assert_eq!(CliError::CommandRejected("x".into()).exit_code(), 3);
        assert_eq!(CliError::ValidationError("x".into()).exit_code(), 4);
        assert_eq!(CliError::InvalidConfiguration("x".into()).exit_code(), 4);
    }

    #[test]
    fn command_errors_are_classified() {
        let err = CliError::from_command(ItchyError::DeviceNotFound(DeviceIdentifier::default()));
        assert!(matches!(err, CliError::DeviceNotFound(_)));

        let err = CliError::from_command(ItchyError::Hid(HidError::Disconnected));
        assert!(matches!(err, CliError::CommandRejected(_)));

        let err = CliError::from_command(ItchyError::ShortWrite(64));
        assert_eq!(err.exit_code(), 3);
    }
}
