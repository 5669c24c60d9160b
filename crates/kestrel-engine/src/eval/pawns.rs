//! Pawn structure: doubled, isolated and passed pawns.
//!
//! Pawn structure changes rarely between nodes, so results are cached in a
//! small direct-mapped table keyed by the position's pawn/king hash.

use kestrel_core::{Bitboard, Color, PieceKind, Position, Square};

use crate::eval::score::{S, Score};

const FILE_A: u64 = 0x0101_0101_0101_0101;

const fn adjacent_files() -> [u64; 8] {
    let mut table = [0u64; 8];
    let mut file = 0;
    while file < 8 {
        if file > 0 {
            table[file] |= FILE_A << (file - 1);
        }
        if file < 7 {
            table[file] |= FILE_A << (file + 1);
        }
        file += 1;
    }
    table
}

static ADJACENT_FILES: [u64; 8] = adjacent_files();

/// `[color][square]`: own and adjacent files, strictly ahead of the square.
const fn passed_masks() -> [[u64; 64]; 2] {
    let mut table = [[0u64; 64]; 2];
    let mut sq = 0;
    while sq < 64 {
        let (file, rank) = (sq % 8, sq / 8);
        let span = (FILE_A << file) | ADJACENT_FILES[file];
        let ahead_white = if rank == 7 { 0 } else { !0u64 << ((rank + 1) * 8) };
        let ahead_black = if rank == 0 { 0 } else { !0u64 >> ((8 - rank) * 8) };
        table[0][sq] = span & ahead_white;
        table[1][sq] = span & ahead_black;
        sq += 1;
    }
    table
}

static PASSED_MASK: [[u64; 64]; 2] = passed_masks();

/// By relative rank.
const PASSED: [Score; 8] = [
    S(0, 0),
    S(5, 10),
    S(10, 15),
    S(15, 30),
    S(30, 55),
    S(55, 95),
    S(90, 150),
    S(0, 0),
];
const DOUBLED: Score = S(-10, -20);
const ISOLATED: Score = S(-12, -16);

fn side_structure(ours: Bitboard, theirs: Bitboard, color: Color) -> Score {
    let mut score = Score::ZERO;
    for sq in ours {
        let file = sq.file() as usize;
        if (ours.inner() & ADJACENT_FILES[file]) == 0 {
            score += ISOLATED;
        }
        if (theirs.inner() & PASSED_MASK[color.index()][sq.index()]) == 0 {
            score += PASSED[sq.relative_rank(color) as usize];
        }
    }
    for file in 0..8u8 {
        let count = (ours & Bitboard::file_of(Square::new(file, 0))).count() as i32;
        if count > 1 {
            score += DOUBLED * (count - 1);
        }
    }
    score
}

/// Pawn structure from White's point of view, without caching.
pub fn pawn_structure(pos: &Position) -> Score {
    let white = pos.pieces_of(Color::White, PieceKind::Pawn);
    let black = pos.pieces_of(Color::Black, PieceKind::Pawn);
    side_structure(white, black, Color::White) - side_structure(black, white, Color::Black)
}

#[derive(Clone, Copy, Default)]
struct PawnEntry {
    key: u64,
    score: Score,
}

/// Direct-mapped cache of [`pawn_structure`] results.
pub struct PawnCache {
    entries: Box<[PawnEntry]>,
}

impl PawnCache {
    const SIZE: usize = 1 << 12;

    pub fn new() -> PawnCache {
        PawnCache {
            entries: vec![PawnEntry::default(); Self::SIZE].into_boxed_slice(),
        }
    }

    /// Cached pawn structure score for `pos`.
    pub fn probe(&mut self, pos: &Position) -> Score {
        let key = pos.pawn_king_hash();
        let slot = &mut self.entries[key as usize & (Self::SIZE - 1)];
        if slot.key != key || key == 0 {
            *slot = PawnEntry {
                key,
                score: pawn_structure(pos),
            };
        }
        slot.score
    }

    pub fn clear(&mut self) {
        self.entries.fill(PawnEntry::default());
    }
}

impl Default for PawnCache {
    fn default() -> Self {
        PawnCache::new()
    }
}
