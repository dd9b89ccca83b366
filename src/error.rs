//! Error types and handling for the CFPS briefing tool

use thiserror::Error;

/// Main error type for the briefing library
#[derive(Error, Debug)]
pub enum BriefError {
    /// Problems with the codes supplied by the user (empty code, bad upload)
    #[error("Invalid input: {message}")]
    Input { message: String },

    /// HTTP failures: transport errors or a non-success status
    #[error("Request error: {message}")]
    Request {
        message: String,
        status: Option<u16>,
    },

    /// Body was not valid JSON or did not have the expected shape
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Writing the spreadsheet export failed
    #[error("Export error: {message}")]
    Export { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl BriefError {
    /// Create a new input error
    pub fn input<S: Into<String>>(message: S) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    /// Create a request error that carries the HTTP status
    pub fn status<S: Into<String>>(message: S, status: u16) -> Self {
        Self::Request {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Create a request error for a transport failure
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Request {
            message: message.into(),
            status: None,
        }
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new export error
    pub fn export<S: Into<String>>(message: S) -> Self {
        Self::Export {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            BriefError::Input { message } => format!("Invalid input: {message}"),
            BriefError::Request {
                status: Some(status),
                ..
            } => format!("The weather service answered with HTTP {status}."),
            BriefError::Request { status: None, .. } => {
                "Unable to reach the weather service. Please check your internet connection."
                    .to_string()
            }
            BriefError::Parse { .. } => {
                "The weather service returned data in an unexpected format.".to_string()
            }
            BriefError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            BriefError::Export { message } => format!("Export failed: {message}"),
            BriefError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

impl From<csv::Error> for BriefError {
    fn from(err: csv::Error) -> Self {
        BriefError::Export {
            message: err.to_string(),
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for BriefError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        BriefError::Export {
            message: err.to_string(),
        }
    }
}
