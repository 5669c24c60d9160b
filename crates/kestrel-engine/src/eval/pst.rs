//! Piece-square tables.
//!
//! Tables are generated at compile time from a few simple shapes
//! (centralisation, pawn advancement, king shelter) rather than written out
//! square by square. They are laid out from White's side in LERF order.

use kestrel_core::{Color, PieceKind, Position, Square};

use crate::eval::score::{S, Score};

/// Distance from the board edge, 0 on the rim and 3 in the centre.
const fn centrality(coord: usize) -> i32 {
    let from_low = coord as i32;
    let from_high = 7 - coord as i32;
    if from_low < from_high { from_low } else { from_high }
}

const KING_SHELTER: [i32; 8] = [20, 30, 10, 0, 0, 10, 30, 20];

const fn entry(kind: usize, sq: usize) -> Score {
    let (file, rank) = (sq % 8, sq / 8);
    let center = centrality(file) + centrality(rank);
    match kind {
        // Pawn: push forward, hold the centre files early.
        0 => {
            if rank == 0 || rank == 7 {
                S(0, 0)
            } else {
                let middle = if (rank == 3 || rank == 4) && (file == 3 || file == 4) { 20 } else { 0 };
                S((rank as i32 - 1) * 6 + middle, (rank as i32 - 1) * 12)
            }
        }
        1 => S(center * 8 - 24, center * 6 - 18),
        2 => S(center * 4 - 10, center * 4 - 10),
        3 => {
            let seventh = if rank == 6 { 20 } else { 0 };
            let central = if file == 3 || file == 4 { 5 } else { 0 };
            S(seventh + central, seventh / 2)
        }
        4 => S(center * 2 - 5, center * 4 - 10),
        _ => {
            let shelter = if rank == 0 { KING_SHELTER[file] } else { -15 * rank as i32 };
            S(shelter, center * 10 - 30)
        }
    }
}

const fn build() -> [[Score; 64]; PieceKind::COUNT] {
    let mut table = [[Score::ZERO; 64]; PieceKind::COUNT];
    let mut kind = 0;
    while kind < PieceKind::COUNT {
        let mut sq = 0;
        while sq < 64 {
            table[kind][sq] = entry(kind, sq);
            sq += 1;
        }
        kind += 1;
    }
    table
}

static PST: [[Score; 64]; PieceKind::COUNT] = build();

/// Table value for a `color` piece of `kind` on `sq`, from that side's view.
#[inline]
pub fn pst_value(kind: PieceKind, color: Color, sq: Square) -> Score {
    let sq = match color {
        Color::White => sq,
        Color::Black => sq.flip_rank(),
    };
    PST[kind.index()][sq.index()]
}

/// Sum of table values from White's point of view.
pub fn psqt(pos: &Position) -> Score {
    let mut score = Score::ZERO;
    for color in Color::ALL {
        for kind in PieceKind::ALL {
            for sq in pos.pieces_of(color, kind) {
                score += pst_value(kind, color, sq) * color.sign();
            }
        }
    }
    score
}
