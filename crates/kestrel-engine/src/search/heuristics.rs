//! Quiet move ordering statistics: killer moves and the history table.

use kestrel_core::{Move, Piece, Square};

use crate::search::MAX_PLY;

/// Two quiet moves per ply that recently caused a beta cutoff.
pub struct KillerTable {
    slots: [[Move; 2]; MAX_PLY + 2],
}

impl KillerTable {
    pub fn new() -> KillerTable {
        KillerTable {
            slots: [[Move::NULL; 2]; MAX_PLY + 2],
        }
    }

    /// Remember `mv` as the newest killer at `ply`. Storing the current
    /// newest killer again changes nothing.
    pub fn store(&mut self, ply: usize, mv: Move) {
        let Some(slot) = self.slots.get_mut(ply) else {
            return;
        };
        if slot[0] != mv {
            slot[1] = slot[0];
            slot[0] = mv;
        }
    }

    /// Both killers at `ply`, newest first.
    pub fn get(&self, ply: usize) -> [Move; 2] {
        self.slots.get(ply).copied().unwrap_or([Move::NULL; 2])
    }

    pub fn clear_ply(&mut self, ply: usize) {
        if let Some(slot) = self.slots.get_mut(ply) {
            *slot = [Move::NULL; 2];
        }
    }
}

impl Default for KillerTable {
    fn default() -> Self {
        KillerTable::new()
    }
}

/// Counters are halved once an attempt count passes this.
const CEILING: u32 = 1 << 20;

/// Cutoff and attempt counts per (piece, destination).
///
/// A quiet move's ordering score is its cutoff rate: cutoffs over attempts,
/// scaled to `0..1024`.
pub struct HistoryTable {
    cutoffs: [[u32; 64]; Piece::COUNT],
    attempts: [[u32; 64]; Piece::COUNT],
}

impl HistoryTable {
    pub fn new() -> HistoryTable {
        HistoryTable {
            cutoffs: [[0; 64]; Piece::COUNT],
            attempts: [[0; 64]; Piece::COUNT],
        }
    }

    pub fn clear(&mut self) {
        *self = HistoryTable::new();
    }

    /// A quiet move by `piece` to `to` cut off at `depth`.
    pub fn record_cutoff(&mut self, piece: Piece, to: Square, depth: i32) {
        let bonus = (depth * depth) as u32;
        self.cutoffs[piece.index()][to.index()] += bonus;
        self.record_attempt(piece, to, depth);
    }

    /// A quiet move by `piece` to `to` was searched at `depth`.
    pub fn record_attempt(&mut self, piece: Piece, to: Square, depth: i32) {
        let (p, sq) = (piece.index(), to.index());
        self.attempts[p][sq] += (depth * depth) as u32;
        if self.attempts[p][sq] > CEILING {
            self.attempts[p][sq] /= 2;
            self.cutoffs[p][sq] /= 2;
        }
    }

    pub fn score(&self, piece: Piece, to: Square) -> i32 {
        let (p, sq) = (piece.index(), to.index());
        (self.cutoffs[p][sq] as u64 * 1024 / (self.attempts[p][sq] as u64 + 1)) as i32
    }
}

impl Default for HistoryTable {
    fn default() -> Self {
        HistoryTable::new()
    }
}
