//! Game phase from remaining non-pawn material.

use kestrel_core::{PieceKind, Position};

/// Phase of the starting position: 4 minors, 4 rooks (2 each), 2 queens (4 each).
pub const MAX_PHASE: i32 = 24;

const WEIGHTS: [(PieceKind, i32); 4] = [
    (PieceKind::Knight, 1),
    (PieceKind::Bishop, 1),
    (PieceKind::Rook, 2),
    (PieceKind::Queen, 4),
];

/// `MAX_PHASE` for a full set of pieces down to 0 for pawns and kings only.
pub fn game_phase(pos: &Position) -> i32 {
    let phase: i32 = WEIGHTS
        .iter()
        .map(|&(kind, weight)| pos.pieces(kind).count() as i32 * weight)
        .sum();
    phase.min(MAX_PHASE)
}
