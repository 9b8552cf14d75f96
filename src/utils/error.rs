use std::fmt;
use thiserror::Error;

/// Which request an error belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestTarget {
    Page(u32),
    Health,
    Document(String),
}

impl fmt::Display for RequestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestTarget::Page(page) => write!(f, "page {}", page),
            RequestTarget::Health => write!(f, "health check"),
            RequestTarget::Document(url) => write!(f, "document {}", url),
        }
    }
}

#[derive(Error, Debug)]
pub enum TedError {
    #[error("Transport error on {target}: {source}")]
    TransportError {
        target: RequestTarget,
        #[source]
        source: reqwest::Error,
    },

    #[error("API error on {target}: {message}")]
    ApiError {
        target: RequestTarget,
        status: Option<u16>,
        message: String,
    },

    #[error("Failed to write {path}: {source}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Spreadsheet rendering error: {0}")]
    SpreadsheetError(#[from] rust_xlsxwriter::XlsxError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Api,
    Storage,
    Configuration,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl TedError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            TedError::TransportError { .. } => ErrorCategory::Network,
            TedError::ApiError { .. } => ErrorCategory::Api,
            TedError::FileWriteError { .. } | TedError::IoError(_) => ErrorCategory::Storage,
            TedError::ConfigError { .. } | TedError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            TedError::SpreadsheetError(_)
            | TedError::SerializationError(_)
            | TedError::ProcessingError { .. } => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 網路問題通常稍後重跑即可
            TedError::TransportError { .. } => ErrorSeverity::Medium,
            TedError::ApiError { status, .. } => match status {
                Some(429) | Some(500..=599) => ErrorSeverity::Medium,
                _ => ErrorSeverity::High,
            },
            TedError::ConfigError { .. } | TedError::InvalidConfigValueError { .. } => {
                ErrorSeverity::High
            }
            TedError::SpreadsheetError(_)
            | TedError::SerializationError(_)
            | TedError::ProcessingError { .. } => ErrorSeverity::High,
            TedError::FileWriteError { .. } | TedError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            TedError::TransportError { source, .. } if source.is_timeout() => {
                "The API did not answer in time; raise --timeout or retry later"
            }
            TedError::TransportError { .. } => {
                "Check your internet connection and that the API base URL is reachable"
            }
            TedError::ApiError { status: Some(400), .. } => {
                "The API rejected the request; check the query syntax and the requested field names"
            }
            TedError::ApiError { status: Some(429), .. } => {
                "The API is rate limiting requests; wait a minute and run again"
            }
            TedError::ApiError { .. } => {
                "The API returned an unexpected response; run `ted-search health` to check its status"
            }
            TedError::FileWriteError { .. } | TedError::IoError(_) => {
                "Check that the output directory exists, is writable and has free space"
            }
            TedError::ConfigError { .. } | TedError::InvalidConfigValueError { .. } => {
                "Fix the configuration value and run again"
            }
            TedError::SpreadsheetError(_) | TedError::ProcessingError { .. } => {
                "Reduce the requested field list or export JSON only"
            }
            TedError::SerializationError(_) => "Report the offending notice to the maintainers",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            TedError::TransportError { target, .. } => {
                format!("Could not reach the TED API ({})", target)
            }
            TedError::ApiError {
                target,
                status: Some(code),
                ..
            } => format!("The TED API answered {} with HTTP {}", target, code),
            TedError::ApiError { target, .. } => {
                format!("The TED API sent an unreadable response for {}", target)
            }
            TedError::FileWriteError { path, .. } => format!("Could not write {}", path),
            other => other.to_string(),
        }
    }

    /// Exit code the CLI uses for this error.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, TedError>;
