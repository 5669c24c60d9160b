//! Material balance plus the bishop pair.

use kestrel_core::{Color, PieceKind, Position};

use crate::eval::score::{S, Score};

/// Indexed by [`PieceKind::index`].
pub const MATERIAL_VALUE: [Score; PieceKind::COUNT] = [
    S(100, 125), // Pawn
    S(325, 310), // Knight
    S(335, 330), // Bishop
    S(500, 540), // Rook
    S(975, 1000), // Queen
    S(0, 0),     // King
];

const BISHOP_PAIR: Score = S(40, 60);

/// Material from White's point of view.
pub fn material(pos: &Position) -> Score {
    let mut score = Score::ZERO;
    for kind in PieceKind::ALL {
        let diff = pos.pieces_of(Color::White, kind).count() as i32
            - pos.pieces_of(Color::Black, kind).count() as i32;
        score += MATERIAL_VALUE[kind.index()] * diff;
    }
    for color in Color::ALL {
        if pos.pieces_of(color, PieceKind::Bishop).more_than_one() {
            score += BISHOP_PAIR * color.sign();
        }
    }
    score
}
