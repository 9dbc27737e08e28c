//! Error kinds shared by the parser, the header collection and the writer.

use std::fmt;

use thiserror::Error;

/// Why a writer phase was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderViolation {
    /// The preceding phase has not been written yet.
    BeforePredecessor,
    /// This phase (or a later one) has already been written.
    AlreadyWritten,
}

impl fmt::Display for OrderViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderViolation::BeforePredecessor => f.write_str("before its predecessor"),
            OrderViolation::AlreadyWritten => f.write_str("after it was already written"),
        }
    }
}

/// HTTP/1.1 framing and transport errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad method, target or version token in the request line.
    #[error("malformed request line: {0}")]
    MalformedRequestLine(String),

    /// Version token was `HTTP/x` with `x` other than `1.1`.
    #[error("unsupported HTTP version {0}")]
    UnsupportedVersion(String),

    /// Field line without a `:` separator.
    #[error("no field-name:field-value pair found in '{0}'")]
    MalformedHeaderLine(String),

    /// Field name with characters outside the token set.
    #[error("invalid character in field name '{0}'")]
    InvalidFieldName(String),

    /// Whitespace between the field name and the colon.
    #[error("whitespace after field name '{0}'")]
    TrailingWhitespaceInName(String),

    #[error("invalid content-length '{0}'")]
    InvalidContentLength(String),

    #[error("content length header value was {declared} but body is {actual} bytes long")]
    BodyLengthMismatch { declared: usize, actual: usize },

    #[error("{op} called {reason}")]
    OutOfOrderWrite {
        op: &'static str,
        reason: OrderViolation,
    },

    #[error("unknown status code {0}")]
    UnknownStatusCode(u16),

    #[error("field name {0} not present")]
    FieldNotPresent(String),

    #[error("cannot parse a request that is already done")]
    AlreadyParsed,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures caused by the bytes the peer sent, as opposed to
    /// transport failures or local misuse of the writer.
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            Error::MalformedRequestLine(_)
                | Error::UnsupportedVersion(_)
                | Error::MalformedHeaderLine(_)
                | Error::InvalidFieldName(_)
                | Error::TrailingWhitespaceInName(_)
                | Error::InvalidContentLength(_)
                | Error::BodyLengthMismatch { .. }
        )
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
