//! Error types for wordmem and the cache model built on it

use std::fmt;

/// Result type alias for simulator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cache construction, memory access and trace replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid cache size, associativity, write policy or replacement policy
    Config(String),

    /// Address outside a backing store's configured depth
    OutOfRange {
        /// Name of the memory that rejected the access
        memory: String,
        /// Offending word address
        addr: u32,
        /// Configured depth in words
        depth: u32,
    },

    /// Trace line that is not a valid `R`/`W` operation
    MalformedTrace {
        /// 1-based line number, 0 when unknown
        line: usize,
        /// What was wrong with it
        reason: String,
    },
}

impl Error {
    /// Shorthand for a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Attach a line number to a trace error that does not have one yet
    pub fn at_line(self, line: usize) -> Self {
        match self {
            Error::MalformedTrace { line: 0, reason } => Error::MalformedTrace { line, reason },
            other => other,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::OutOfRange { memory, addr, depth } => write!(
                f,
                "Memory {}: out of range access to addr={:#x} (depth {} words)",
                memory, addr, depth
            ),
            Error::MalformedTrace { line: 0, reason } => write!(f, "Malformed trace: {}", reason),
            Error::MalformedTrace { line, reason } => {
                write!(f, "Malformed trace at line {}: {}", line, reason)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<nom::Err<nom::error::Error<&str>>> for Error {
    fn from(err: nom::Err<nom::error::Error<&str>>) -> Self {
        let reason = match err {
            nom::Err::Incomplete(_) => "unexpected end of line".to_string(),
            nom::Err::Error(e) | nom::Err::Failure(e) => {
                format!("unexpected input {:?} ({:?})", e.input, e.code)
            }
        };
        Error::MalformedTrace { line: 0, reason }
    }
}
