use thiserror::Error;

/// Custom error types for toastq
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToastError {
    #[error("use_toast must be called within a ToastProvider scope")]
    NoProvider,

    #[error("Toaster must be created inside a tokio runtime")]
    NoRuntime,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Script error on line {line}: {message}")]
    Script { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ToastError {
    fn from(err: std::io::Error) -> Self {
        ToastError::Io(err.to_string())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
