#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Unsupported platform for continuous mode: {platform}")]
    UnsupportedPlatform { platform: String },

    #[error("File watcher error: {message}")]
    WatcherError { message: String },

    #[error("Background task failed: {message}")]
    TaskFailed { message: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Notify(#[from] notify::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl AppError {
    /// Returns a user-facing error message
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput { message } => message.clone(),
            Self::ConfigError { message } => message.clone(),
            Self::UnsupportedPlatform { platform } => {
                format!("Continuous mode is not supported on {}", platform)
            }
            Self::WatcherError { message } => format!("File watching failed: {}", message),
            Self::TaskFailed { message } => format!("Reconciliation pass failed: {}", message),
            Self::Cancelled => "Operation interrupted.".to_string(),
            Self::Io(e) => format!("File operation failed: {}", e),
            Self::Walk(e) => format!("Directory scan failed: {}", e),
            Self::Notify(e) => format!("File watching failed: {}", e),
            Self::SerdeJson(e) => format!("Failed to render plan: {}", e),
        }
    }

    /// Returns a stable error code
    pub fn error_type(&self) -> String {
        match self {
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::ConfigError { .. } => "CONFIG_ERROR",
            Self::UnsupportedPlatform { .. } => "UNSUPPORTED_PLATFORM",
            Self::WatcherError { .. } => "FILE_WATCHER_ERROR",
            Self::TaskFailed { .. } => "TASK_FAILED",
            Self::Cancelled => "CANCELLED",
            Self::Io(_) => "IO_ERROR",
            Self::Walk(_) => "SCAN_ERROR",
            Self::Notify(_) => "FILE_WATCHER_ERROR",
            Self::SerdeJson(_) => "PARSE_ERROR",
        }
        .to_string()
    }

    /// Errors caused by the invocation itself rather than the filesystem.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. } | Self::ConfigError { .. } | Self::UnsupportedPlatform { .. }
        )
    }

    /// Indicates if simply rerunning may succeed. Every pass re-derives its
    /// state from the live trees, so filesystem failures qualify.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::InvalidInput { .. }
                | Self::ConfigError { .. }
                | Self::UnsupportedPlatform { .. }
                | Self::WatcherError { .. }
                | Self::Notify(_)
        )
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Cancelled => 130,
            e if e.is_user_error() => 2,
            _ => 1,
        }
    }

    /// Returns the complete error source chain for debugging
    pub fn source_chain(&self) -> Vec<String> {
        let mut chain = vec![self.to_string()];
        let mut current: &dyn std::error::Error = self;

        while let Some(source) = current.source() {
            chain.push(source.to_string());
            current = source;
        }

        chain
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(AppError::Cancelled.exit_code(), 130);
        assert_eq!(
            AppError::InvalidInput {
                message: "bad".to_string()
            }
            .exit_code(),
            2
        );
        assert_eq!(
            AppError::ConfigError {
                message: "nested".to_string()
            }
            .exit_code(),
            2
        );
        let io = AppError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(io.exit_code(), 1);
    }

    #[test]
    fn test_recoverability() {
        let io = AppError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(io.is_recoverable());
        assert!(!AppError::WatcherError {
            message: "helper exited".to_string()
        }
        .is_recoverable());
        assert!(!AppError::UnsupportedPlatform {
            platform: "plan9".to_string()
        }
        .is_recoverable());
    }

    #[test]
    fn test_error_types_are_stable() {
        let err = AppError::ConfigError {
            message: "The active dir and offload dir may not contain each other".to_string(),
        };
        assert_eq!(err.error_type(), "CONFIG_ERROR");
        assert_eq!(AppError::Cancelled.error_type(), "CANCELLED");
        assert_eq!(
            err.user_message(),
            "The active dir and offload dir may not contain each other"
        );
    }

    #[test]
    fn test_source_chain_includes_io_cause() {
        let err = AppError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        let chain = err.source_chain();
        assert_eq!(chain[0], "denied");
    }
}
