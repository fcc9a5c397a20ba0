use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    TaskError(#[from] tokio::task::JoinError),

    #[error("Source page not found: {path}")]
    InputNotFound { path: String },

    #[error("Browser operation '{operation}' failed: {message}")]
    BrowserError { operation: String, message: String },

    #[error("Page did not become ready during '{stage}' within {waited_ms}ms")]
    ReadinessTimeout { stage: String, waited_ms: u64 },

    #[error("In-page script for '{stage}' failed: {message}")]
    ScriptError { stage: String, message: String },

    #[error("Rendered PDF is invalid: {reason}")]
    InvalidPdf { reason: String },

    #[error("Icon download from {url} failed with status {status}")]
    IconFetchError { url: String, status: u16 },

    #[error("Icon SVG could not be parsed: {message}")]
    IconParseError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Browser,
    Network,
    Output,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RenderError {
    /// Wraps an error coming out of the browser driver, keeping its cause chain.
    pub fn browser(operation: &str, err: anyhow::Error) -> Self {
        RenderError::BrowserError {
            operation: operation.to_string(),
            message: format!("{:#}", err),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            RenderError::ConfigValidationError { .. }
            | RenderError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            RenderError::InputNotFound { .. } => ErrorCategory::Input,
            RenderError::BrowserError { .. }
            | RenderError::ReadinessTimeout { .. }
            | RenderError::ScriptError { .. }
            | RenderError::InvalidPdf { .. } => ErrorCategory::Browser,
            RenderError::HttpError(_)
            | RenderError::IconFetchError { .. }
            | RenderError::IconParseError { .. } => ErrorCategory::Network,
            RenderError::IoError(_) => ErrorCategory::Output,
            RenderError::SerializationError(_) | RenderError::TaskError(_) => {
                ErrorCategory::Internal
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // icon problems only ever degrade the output
            RenderError::HttpError(_)
            | RenderError::IconFetchError { .. }
            | RenderError::IconParseError { .. } => ErrorSeverity::Low,
            RenderError::ReadinessTimeout { .. } | RenderError::ScriptError { .. } => {
                ErrorSeverity::Medium
            }
            RenderError::ConfigValidationError { .. }
            | RenderError::InvalidConfigValueError { .. }
            | RenderError::InputNotFound { .. }
            | RenderError::InvalidPdf { .. } => ErrorSeverity::High,
            RenderError::BrowserError { .. }
            | RenderError::IoError(_)
            | RenderError::SerializationError(_)
            | RenderError::TaskError(_) => ErrorSeverity::Critical,
        }
    }

    /// Process exit code used by the CLI. `None` means the error is not fatal.
    pub fn exit_code(&self) -> Option<i32> {
        match self.severity() {
            ErrorSeverity::Low => None,
            ErrorSeverity::Medium => Some(2),
            ErrorSeverity::High => Some(1),
            ErrorSeverity::Critical => Some(3),
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            RenderError::InputNotFound { path } => format!(
                "Check that '{}' exists or pass another page with --source",
                path
            ),
            RenderError::BrowserError { operation, .. } if operation == "launch" => {
                "Install Chrome/Chromium or point --chrome-path at the binary".to_string()
            }
            RenderError::BrowserError { .. } => {
                "Re-run with --verbose to see the browser log".to_string()
            }
            RenderError::ReadinessTimeout { stage, .. } => format!(
                "Raise [readiness] timeout_ms or check the page assets used by '{}'",
                stage
            ),
            RenderError::ScriptError { .. } => {
                "Check the selectors in the [page], [icon] and [style] sections".to_string()
            }
            RenderError::InvalidPdf { .. } => {
                "Check that the page renders in a regular browser".to_string()
            }
            RenderError::IoError(_) => {
                "Check that the output directory exists and is writable".to_string()
            }
            RenderError::HttpError(_)
            | RenderError::IconFetchError { .. }
            | RenderError::IconParseError { .. } => {
                "Check network access to the icon CDN or disable the icon with --no-icon"
                    .to_string()
            }
            RenderError::ConfigValidationError { field, .. }
            | RenderError::InvalidConfigValueError { field, .. } => {
                format!("Fix '{}' in the configuration file", field)
            }
            RenderError::SerializationError(_) | RenderError::TaskError(_) => {
                "This is likely a bug; re-run with --verbose and report it".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Input => format!("Cannot read the resume page: {}", self),
            ErrorCategory::Browser => format!("Rendering failed: {}", self),
            ErrorCategory::Network => format!("Icon could not be loaded: {}", self),
            ErrorCategory::Output => format!("Could not write the PDF: {}", self),
            ErrorCategory::Internal => format!("Unexpected error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_is_fatal() {
        let err = RenderError::InputNotFound {
            path: "index.html".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.exit_code(), Some(1));
        assert!(err.recovery_suggestion().contains("index.html"));
    }

    #[test]
    fn test_icon_errors_are_not_fatal() {
        let err = RenderError::IconFetchError {
            url: "https://cdn.example.com/github.svg".to_string(),
            status: 503,
        };
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.exit_code(), None);
    }

    #[test]
    fn test_exit_codes_by_severity() {
        let timeout = RenderError::ReadinessTimeout {
            stage: "page-ready".to_string(),
            waited_ms: 10_000,
        };
        assert_eq!(timeout.exit_code(), Some(2));

        let launch = RenderError::browser(
            "launch",
            anyhow::anyhow!("no chrome binary").context("could not start Chrome"),
        );
        assert_eq!(launch.exit_code(), Some(3));
        assert!(launch.recovery_suggestion().contains("--chrome-path"));
        assert!(launch.to_string().contains("no chrome binary"));
    }
}
