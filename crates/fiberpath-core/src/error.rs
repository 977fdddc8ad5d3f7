//! Error handling for FiberPath Studio
//!
//! Provides the error types shared by every layer of the application:
//! - Wind file errors (fatal load failures of a wind definition)
//! - Command errors (failures crossing the external CLI boundary)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Wind definition load error
///
/// Any of these aborts a load as a whole. The previously loaded project
/// is never partially replaced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WindFileError {
    /// The document is not valid JSON or not a JSON object
    #[error("Invalid wind file JSON: {reason}")]
    InvalidJson {
        /// Parser message.
        reason: String,
    },

    /// A layer carries a `windType` outside the known set
    #[error("Unknown windType '{wind_type}' in layer {index}")]
    UnknownWindType {
        /// Zero-based position of the layer in the document.
        index: usize,
        /// The unrecognized tag.
        wind_type: String,
    },

    /// A layer has no `windType` discriminator
    #[error("Layer {index} is missing its windType")]
    MissingWindType {
        /// Zero-based position of the layer in the document.
        index: usize,
    },

    /// The document has the right shape but a field is missing or mistyped
    #[error("Malformed wind definition: {reason}")]
    Malformed {
        /// Deserializer message.
        reason: String,
    },
}

/// Command gateway error type
///
/// Represents failures of calls into the external `fiberpath` CLI. The
/// rendered message is what the retry classifier inspects, so it carries
/// the CLI's own output verbatim.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    /// The CLI executable could not be located
    #[error("FiberPath CLI not found: {reason}")]
    CliNotFound {
        /// Why resolution failed.
        reason: String,
    },

    /// The process could not be spawned or waited on
    #[error("Failed to run fiberpath: {reason}")]
    Launch {
        /// The underlying OS error and the attempted command line.
        reason: String,
    },

    /// The CLI ran and exited unsuccessfully
    #[error("fiberpath exited with status {status}\nstdout:\n{stdout}\nstderr:\n{stderr}")]
    Exit {
        /// Exit code, or `unknown` when killed by a signal.
        status: String,
        /// Trimmed standard output.
        stdout: String,
        /// Trimmed standard error.
        stderr: String,
    },

    /// The CLI produced output that could not be understood
    #[error("Unable to parse JSON: {reason}")]
    InvalidResponse {
        /// Parser message.
        reason: String,
    },

    /// Reading or writing a file on behalf of the caller failed
    #[error("File error: {reason}")]
    File {
        /// The underlying I/O message.
        reason: String,
    },

    /// The same operation is already running and duplicates are rejected
    #[error("{operation} is already in progress")]
    AlreadyInFlight {
        /// Operation name.
        operation: String,
    },
}

impl CommandError {
    /// Create a file error from any displayable cause
    pub fn file(reason: impl std::fmt::Display) -> Self {
        CommandError::File {
            reason: reason.to_string(),
        }
    }

    /// Create a response parse error from any displayable cause
    pub fn invalid_response(reason: impl std::fmt::Display) -> Self {
        CommandError::InvalidResponse {
            reason: reason.to_string(),
        }
    }
}

/// Main error type for FiberPath Studio
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Wind file error
    #[error(transparent)]
    WindFile(#[from] WindFileError),

    /// Command gateway error
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a fatal load error
    pub fn is_wind_file_error(&self) -> bool {
        matches!(self, Error::WindFile(_))
    }

    /// Check if this is a command gateway error
    pub fn is_command_error(&self) -> bool {
        matches!(self, Error::Command(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
