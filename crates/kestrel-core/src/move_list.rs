//! Fixed-capacity move buffer with per-move ordering scores.

use crate::chess_move::Move;

/// Enough for the largest known legal move count (218).
pub const MAX_MOVES: usize = 256;

/// Moves plus a parallel score array and two cursors.
///
/// `insert` marks the end of the filled region and `consumed` the start of
/// the region not yet handed out. Popping never shrinks the buffer, so a
/// list can be walked once per fill.
#[derive(Clone)]
pub struct MoveList {
    moves: [Move; MAX_MOVES],
    scores: [i32; MAX_MOVES],
    insert: usize,
    consumed: usize,
}

impl MoveList {
    pub fn new() -> MoveList {
        MoveList {
            moves: [Move::NULL; MAX_MOVES],
            scores: [0; MAX_MOVES],
            insert: 0,
            consumed: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, mv: Move) {
        debug_assert!(self.insert < MAX_MOVES, "move list overflow");
        self.moves[self.insert] = mv;
        self.scores[self.insert] = 0;
        self.insert += 1;
    }

    #[inline]
    pub fn push_scored(&mut self, mv: Move, score: i32) {
        self.push(mv);
        self.scores[self.insert - 1] = score;
    }

    /// Forget every move.
    #[inline]
    pub fn clear(&mut self) {
        self.insert = 0;
        self.consumed = 0;
    }

    /// Number of moves ever pushed since the last clear.
    #[inline]
    pub fn len(&self) -> usize {
        self.insert
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.insert == 0
    }

    /// Moves not yet popped.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.insert - self.consumed
    }

    #[inline]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.insert]
    }

    #[inline]
    pub fn contains(&self, mv: Move) -> bool {
        self.as_slice().contains(&mv)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.as_slice().iter()
    }

    /// Assign a score to every move not yet popped.
    pub fn score_with(&mut self, mut score: impl FnMut(Move) -> i32) {
        for i in self.consumed..self.insert {
            self.scores[i] = score(self.moves[i]);
        }
    }

    /// Next move in insertion order.
    #[inline]
    pub fn pop(&mut self) -> Option<Move> {
        if self.consumed == self.insert {
            return None;
        }
        self.consumed += 1;
        Some(self.moves[self.consumed - 1])
    }

    /// Highest-scored move not yet popped.
    ///
    /// Selection step: one linear scan, then the winner is swapped to the
    /// consumed boundary.
    pub fn pop_best(&mut self) -> Option<(Move, i32)> {
        if self.consumed == self.insert {
            return None;
        }
        let mut best = self.consumed;
        for i in self.consumed + 1..self.insert {
            if self.scores[i] > self.scores[best] {
                best = i;
            }
        }
        self.moves.swap(self.consumed, best);
        self.scores.swap(self.consumed, best);
        self.consumed += 1;
        Some((self.moves[self.consumed - 1], self.scores[self.consumed - 1]))
    }
}

impl Default for MoveList {
    fn default() -> Self {
        MoveList::new()
    }
}

impl std::fmt::Debug for MoveList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter().map(|m| m.to_string())).finish()
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
