//! Hand-crafted static evaluation.
//!
//! The search treats this as an oracle: [`Evaluator::evaluate`] maps a
//! position to a side-to-move-relative centipawn score strictly inside
//! `±EVAL_LIMIT`, which keeps static scores apart from mate scores.

pub mod material;
pub mod pawns;
pub mod phase;
pub mod pst;
pub mod score;

use kestrel_core::{Color, Position};

use self::pawns::PawnCache;
use self::score::{S, Score};

/// Largest magnitude a static evaluation may take.
pub const EVAL_LIMIT: i32 = 29_999;

/// Bonus for having the move.
const TEMPO: Score = S(15, 5);

/// Evaluation with a pawn structure cache.
#[derive(Default)]
pub struct Evaluator {
    pawns: PawnCache,
}

impl Evaluator {
    pub fn new() -> Evaluator {
        Evaluator::default()
    }

    /// Score of `pos` for the side to move.
    pub fn evaluate(&mut self, pos: &Position) -> i32 {
        let stm = pos.side_to_move();
        let mut score = material::material(pos) + pst::psqt(pos) + self.pawns.probe(pos);
        score += TEMPO * stm.sign();

        let white_view = score.taper(phase::game_phase(pos));
        let relative = match stm {
            Color::White => white_view,
            Color::Black => -white_view,
        };
        relative.clamp(-EVAL_LIMIT, EVAL_LIMIT)
    }

    /// Forget cached pawn structures.
    pub fn clear(&mut self) {
        self.pawns.clear();
    }
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator").finish_non_exhaustive()
    }
}
