//! Error types for mediashrink-av.

use std::time::Duration;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed underlying cause carried by decode/encode errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by a transcode call.
///
/// A call either yields a complete [`crate::TranscodeResult`] or exactly one
/// of these; output bytes are never returned alongside an error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input could not be parsed as the declared media kind.
    #[error("failed to decode {file}: {source}")]
    Decode {
        /// Original file name of the input.
        file: String,
        #[source]
        source: BoxError,
    },

    /// The codec engine rejected the output parameters or could not write
    /// its output.
    #[error("failed to encode {file}: {source}")]
    Encode {
        /// Original file name of the input.
        file: String,
        #[source]
        source: BoxError,
    },

    /// A temp file could not be created, written, read or removed.
    #[error("temp resource error: {message}: {source}")]
    Resource {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// The options variant does not match the input's media kind.
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// A required external tool is not available.
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// An option value outside its recognized domain.
    #[error("invalid option: {0}")]
    InvalidOption(String),
}

impl Error {
    /// Create a decode error for `file`.
    pub fn decode(file: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Decode {
            file: file.into(),
            source: source.into(),
        }
    }

    /// Create an encode error for `file`.
    pub fn encode(file: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Encode {
            file: file.into(),
            source: source.into(),
        }
    }

    /// Create a temp resource error.
    pub fn resource(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Resource {
            message: message.into(),
            source,
        }
    }

    /// Create a precondition error.
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// Classify an engine failure raised while decoding `file`.
    pub(crate) fn from_decode(file: &str, err: EngineError) -> Self {
        match err {
            EngineError::ToolNotFound { tool } => Self::ToolNotFound { tool },
            other => Self::decode(file, other),
        }
    }

    /// Classify an engine failure raised while encoding `file`.
    pub(crate) fn from_encode(file: &str, err: EngineError) -> Self {
        match err {
            EngineError::ToolNotFound { tool } => Self::ToolNotFound { tool },
            other => Self::encode(file, other),
        }
    }

    /// Map this error to a `sysexits`-style process exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Precondition(_) | Error::InvalidOption(_) => 64,
            Error::Decode { .. } => 65,
            Error::ToolNotFound { .. } => 69,
            Error::Encode { .. } => 70,
            Error::Resource { .. } => 74,
        }
    }
}

/// Raw failures reported by a [`crate::CodecEngine`].
///
/// The pipelines classify these into [`Error::Decode`] or [`Error::Encode`]
/// depending on which step raised them.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A required external tool is not available.
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// An external tool exited unsuccessfully or could not be spawned.
    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    /// An external tool ran past its configured timeout and was killed.
    #[error("{tool} timed out after {timeout:?}")]
    TimedOut { tool: String, timeout: Duration },

    /// Failed to parse tool output.
    #[error("failed to parse {tool} output: {message}")]
    Parse { tool: String, message: String },

    /// The media has no stream the pipeline can work with.
    #[error("unsupported media: {0}")]
    Unsupported(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a tool execution failed error.
    pub fn tool_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse_error(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            tool: tool.into(),
            message: message.into(),
        }
    }
}
