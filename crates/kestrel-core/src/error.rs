//! Errors for position setup and move text.

use thiserror::Error;

/// A FEN string that could not be turned into a position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    #[error("expected 4 to 6 FEN fields, found {found}")]
    WrongFieldCount { found: usize },

    #[error("expected 8 ranks in piece placement, found {found}")]
    WrongRankCount { found: usize },

    #[error("rank {rank} describes {length} squares, expected 8")]
    BadRankLength { rank: usize, length: usize },

    #[error("invalid piece character '{character}'")]
    InvalidPieceChar { character: char },

    #[error("invalid side to move \"{found}\"")]
    InvalidColor { found: String },

    #[error("invalid castling character '{character}'")]
    InvalidCastlingChar { character: char },

    #[error("invalid en passant square \"{found}\"")]
    InvalidEnPassant { found: String },

    #[error("invalid {field} \"{found}\"")]
    InvalidMoveCounter { field: &'static str, found: String },

    #[error("{color} must have exactly one king, found {count}")]
    InvalidKingCount { color: &'static str, count: u32 },

    #[error("pawns on the first or last rank")]
    PawnsOnBackRank,

    #[error("side not to move is in check")]
    OpponentInCheck,
}

/// Move text that does not name a legal move in the current position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveParseError {
    #[error("malformed move text \"{text}\"")]
    Malformed { text: String },

    #[error("illegal move \"{text}\"")]
    Illegal { text: String },
}
