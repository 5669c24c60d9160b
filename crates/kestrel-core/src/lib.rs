//! Board representation and rules for the kestrel engine.
//!
//! A single mutable [`Position`] is updated in place with
//! [`Position::do_move`] and restored with [`Position::undo_move`]. Move
//! generation is pseudo-legal and split into noisy and quiet categories;
//! legality is checked after the move is played.

pub mod attacks;
mod bitboard;
mod castle_rights;
mod check;
mod chess_move;
mod color;
mod draw;
mod error;
mod fen;
mod make_move;
mod move_list;
pub mod movegen;
mod perft;
mod piece;
mod position;
mod square;
pub mod zobrist;

pub use bitboard::Bitboard;
pub use castle_rights::{CastleRights, CastleSide};
pub use chess_move::{Move, MoveTag};
pub use color::Color;
pub use error::{FenError, MoveParseError};
pub use fen::STARTING_FEN;
pub use make_move::UndoData;
pub use move_list::{MAX_MOVES, MoveList};
pub use movegen::{fill_checks, fill_noisy, fill_quiet, generate_legal};
pub use perft::{divide, perft};
pub use piece::{Piece, PieceKind};
pub use position::{Position, PrettyPosition};
pub use square::Square;
