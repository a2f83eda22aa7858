use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DrivebakError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Could not query disk usage for {path}: {source}")]
    VolumeQuery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Destination is not a directory: {path}")]
    DestinationNotDirectory { path: PathBuf },

    #[error("Could not determine the home directory")]
    NoHomeDirectory,

    #[error("Input closed before an answer was given")]
    InputClosed,

    #[error("Operation interrupted by user")]
    Interrupted,
}

impl DrivebakError {
    /// Create a configuration error with a custom message
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a validation error with a custom message
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            DrivebakError::Interrupted => 130,
            DrivebakError::Validation { .. } => 2,
            DrivebakError::Config { .. } => 2,
            _ => 1,
        }
    }

    /// Provide helpful suggestions for resolving the error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            DrivebakError::VolumeQuery { .. } => vec![
                "Check that the destination drive is mounted".to_string(),
                "Choose a different destination".to_string(),
            ],
            DrivebakError::DestinationNotDirectory { .. } => vec![
                "Enter the path of a folder, not a file".to_string(),
                "Remove the quotes if the path was pasted twice".to_string(),
            ],
            DrivebakError::NoHomeDirectory => vec![
                "Set the HOME environment variable".to_string(),
                "Pass --home <DIR> explicitly".to_string(),
            ],
            DrivebakError::Config { .. } => vec![
                "Run 'drivebak --dump-config' to see the effective settings".to_string(),
            ],
            _ => vec![],
        }
    }
}
