//! Time allocation: turn clock readings into a [`SearchControl`].

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use kestrel_core::{Color, Position};

use crate::eval::phase::{MAX_PHASE, game_phase};
use crate::search::control::SearchControl;

/// Reserved per move for communication lag.
const MOVE_OVERHEAD_MS: f64 = 10.0;

/// Everything a `go` request can constrain. `None` and `false` mean
/// "no constraint of this kind".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchLimits {
    pub depth: Option<i32>,
    pub nodes: Option<u64>,
    pub movetime: Option<Duration>,
    pub wtime: Option<Duration>,
    pub btime: Option<Duration>,
    pub winc: Option<Duration>,
    pub binc: Option<Duration>,
    pub movestogo: Option<u32>,
    pub infinite: bool,
    pub ponder: bool,
}

impl SearchLimits {
    /// Remaining clock and increment of `side`.
    pub fn clock(&self, side: Color) -> (Option<Duration>, Duration) {
        match side {
            Color::White => (self.wtime, self.winc.unwrap_or(Duration::ZERO)),
            Color::Black => (self.btime, self.binc.unwrap_or(Duration::ZERO)),
        }
    }
}

/// Soft and hard limits for one move.
///
/// Without `moves_to_go` the number of moves left is guessed from the game
/// phase (`0` = bare kings, [`MAX_PHASE`] = opening): more moves are assumed
/// early, so less time is spent per move.
///
/// | | no increment | increment |
/// |---|---|---|
/// | assumed moves left | 18 + 22·phase/24 | 15 + 20·phase/24 |
/// | soft | usable / moves | usable / moves + 0.75·inc |
/// | hard | min(12% usable, 2.5·soft) | min(25% usable, 3·soft) |
pub fn compute_limits(
    remaining: Duration,
    increment: Duration,
    moves_to_go: Option<u32>,
    phase: i32,
) -> (Duration, Duration) {
    let remaining_ms = remaining.as_millis() as f64;
    if remaining_ms < MOVE_OVERHEAD_MS {
        let one_ms = Duration::from_millis(1);
        return (one_ms, one_ms);
    }

    let usable = (remaining_ms - MOVE_OVERHEAD_MS).max(1.0);
    let inc_ms = increment.as_millis() as f64;
    let has_increment = inc_ms > 0.0;

    let moves_left = match moves_to_go {
        Some(n) => n.max(1) as f64,
        None => {
            let (base, scale) = if has_increment { (15, 20) } else { (18, 22) };
            (base + scale * phase.clamp(0, MAX_PHASE) / MAX_PHASE) as f64
        }
    };

    let per_move = usable / moves_left;
    let (soft, hard_share, hard_ratio) = if has_increment {
        (per_move + inc_ms * 0.75, 0.25, 3.0)
    } else {
        (per_move, 0.12, 2.5)
    };
    let hard = (usable * hard_share).min(soft * hard_ratio);

    let soft = soft.min(usable).max(1.0);
    let hard = hard.min(usable).max(soft);

    (
        Duration::from_millis(soft as u64),
        Duration::from_millis(hard as u64),
    )
}

/// Build the control for a search of `pos` under `limits`.
///
/// Precedence: `infinite`, then `movetime`, then the side's clock. With none
/// of those (for example `go depth 8`) the search is bounded only by its
/// depth, node budget and the stop flag. `ponder` keeps the clock stopped
/// until `ponderhit`.
pub fn control_for(limits: &SearchLimits, pos: &Position, stopped: Arc<AtomicBool>) -> SearchControl {
    let timed = |soft, hard| {
        if limits.ponder {
            SearchControl::ponder(Arc::clone(&stopped), soft, hard)
        } else {
            SearchControl::timed(Arc::clone(&stopped), soft, hard)
        }
    };

    let (remaining, increment) = limits.clock(pos.side_to_move());
    let control = if limits.infinite {
        SearchControl::infinite(Arc::clone(&stopped))
    } else if let Some(movetime) = limits.movetime {
        timed(movetime, movetime)
    } else if let Some(remaining) = remaining {
        let (soft, hard) = compute_limits(remaining, increment, limits.movestogo, game_phase(pos));
        timed(soft, hard)
    } else {
        SearchControl::infinite(Arc::clone(&stopped))
    };

    match limits.nodes {
        Some(nodes) => control.with_node_limit(nodes),
        None => control,
    }
}
