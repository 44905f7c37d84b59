use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported HTTP method: {method}")]
    UnsupportedMethod { method: String },

    #[error("Transport error: {message}")]
    TransportError { message: String },

    #[error("Backend responded with status {status}: {body}")]
    BackendError { status: u16, body: String },

    #[error("Process command `{command}` failed: {message}")]
    ProcessSpawnError { command: String, message: String },

    #[error("Backend service did not become ready within {waited:?}")]
    ReadinessTimeout { waited: Duration },

    #[error("Backend service is already running ({label})")]
    AlreadyRunning { label: String },
}

/// 錯誤分類，對應主控台的錯誤處理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Process,
    Transport,
    Backend,
    Io,
}

impl ConsoleError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ConsoleError::ConfigError { .. }
            | ConsoleError::InvalidConfigValueError { .. }
            | ConsoleError::UnsupportedMethod { .. } => ErrorCategory::Configuration,
            ConsoleError::ProcessSpawnError { .. }
            | ConsoleError::ReadinessTimeout { .. }
            | ConsoleError::AlreadyRunning { .. } => ErrorCategory::Process,
            ConsoleError::TransportError { .. } => ErrorCategory::Transport,
            ConsoleError::BackendError { .. } => ErrorCategory::Backend,
            ConsoleError::IoError(_) | ConsoleError::SerializationError(_) => ErrorCategory::Io,
        }
    }

    /// 顯示給終端使用者的簡短訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            ConsoleError::TransportError { .. } => {
                format!("Could not reach the backend: {}", self)
            }
            ConsoleError::BackendError { status, body } if body.is_empty() => {
                format!("Backend returned status {}", status)
            }
            ConsoleError::BackendError { status, body } => {
                format!("Backend returned status {}: {}", status, body)
            }
            ConsoleError::ReadinessTimeout { .. } => {
                format!("{}. Is the service installed and the port free?", self)
            }
            _ => self.to_string(),
        }
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(e: reqwest::Error) -> Self {
        ConsoleError::TransportError {
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_follow_taxonomy() {
        let err = ConsoleError::UnsupportedMethod {
            method: "PATCH".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);

        let err = ConsoleError::BackendError {
            status: 404,
            body: "Material not found".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Backend);
        assert_eq!(
            err.user_friendly_message(),
            "Backend returned status 404: Material not found"
        );

        let err = ConsoleError::ReadinessTimeout {
            waited: Duration::from_secs(10),
        };
        assert_eq!(err.category(), ErrorCategory::Process);
    }
}
