//! Protocol errors.

use kestrel_core::{FenError, MoveParseError};
use kestrel_engine::ParamError;

/// Errors raised while reading or acting on a protocol line.
#[derive(Debug, thiserror::Error)]
pub enum UciError {
    /// `position` without `startpos` or `fen`.
    #[error("malformed position command: expected startpos or fen")]
    MalformedPosition,

    #[error("invalid FEN: {0}")]
    Fen(#[from] FenError),

    #[error("invalid move: {0}")]
    Move(#[from] MoveParseError),

    /// A keyword that needs a value was the last token.
    #[error("missing value for {param}")]
    MissingValue { param: String },

    #[error("invalid value for {param}: {value}")]
    InvalidValue { param: String, value: String },

    /// `setoption` without `name`.
    #[error("malformed setoption command")]
    MalformedOption,

    #[error("option {name} cannot be changed while searching")]
    Busy { name: String },

    #[error(transparent)]
    Param(#[from] ParamError),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}
