//! Rule-based draws: fifty moves, repetition, dead material.

use crate::movegen::generate_legal;
use crate::piece::PieceKind;
use crate::position::Position;

impl Position {
    /// `true` if the game is drawn by rule regardless of the moves that follow.
    ///
    /// A mate delivered on the hundredth reversible ply still counts as a
    /// mate, so the fifty-move rule probes for a legal reply when in check.
    pub fn is_draw(&mut self) -> bool {
        self.is_repetition()
            || self.is_insufficient_material()
            || (self.halfmove_clock >= 100 && !self.is_checkmate())
    }

    /// In check with no legal move.
    pub fn is_checkmate(&mut self) -> bool {
        self.in_check() && generate_legal(self).is_empty()
    }

    /// `true` if the current position already occurred with the same side to move.
    ///
    /// Only positions since the last irreversible move can match, and only
    /// every second ply back has the same side to move.
    pub fn is_repetition(&self) -> bool {
        let window = (self.halfmove_clock as usize).min(self.history.len());
        let last = self.history.len();
        (4..=window)
            .step_by(2)
            .any(|back| self.history[last - back] == self.hash)
    }

    /// Bare kings, or a single minor piece against a bare king.
    pub fn is_insufficient_material(&self) -> bool {
        let heavy = self.pieces(PieceKind::Pawn)
            | self.pieces(PieceKind::Rook)
            | self.pieces(PieceKind::Queen);
        if heavy.is_nonempty() {
            return false;
        }
        let minors = self.pieces(PieceKind::Knight) | self.pieces(PieceKind::Bishop);
        !minors.more_than_one()
    }
}
