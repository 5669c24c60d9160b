//! Search algorithms and move ordering.

mod alphabeta;
pub mod control;
pub mod heuristics;
pub mod params;
pub mod picker;
pub mod see;
pub mod tt;

use std::time::Duration;

use kestrel_core::{Move, Position, generate_legal};
use tracing::debug;

use crate::error::ParamError;
use crate::eval::Evaluator;
use alphabeta::SearchContext;
use control::SearchControl;
use heuristics::HistoryTable;
use params::{LmrTable, SearchParams};
use tt::{Bound, TranspositionTable};

/// Deepest ply the search will reach.
pub const MAX_PLY: usize = 128;

/// Score of delivering mate at the root; mate at ply `n` scores `MATE - n`.
pub const MATE: i32 = 32_000;

/// Window bound strictly outside every reachable score.
pub const INF: i32 = MATE + 1;

/// Scores beyond this magnitude are mate scores.
pub const MATE_BOUND: i32 = MATE - MAX_PLY as i32;

pub(crate) const DRAW: i32 = 0;

/// Moves to mate for a mate score, negative when the side to move is being
/// mated. `None` for ordinary scores.
pub fn mate_in(score: i32) -> Option<i32> {
    if score > MATE_BOUND {
        Some((MATE - score + 1) / 2)
    } else if score < -MATE_BOUND {
        Some(-(MATE + score) / 2)
    } else {
        None
    }
}

/// A progress report from the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchInfo {
    pub depth: i32,
    pub seldepth: usize,
    pub score: i32,
    /// `Lower` after a root cutoff, `Upper` after an aspiration fail-low.
    pub bound: Bound,
    pub nodes: u64,
    pub elapsed: Duration,
    pub nps: u64,
    pub pv: Vec<Move>,
    /// Transposition table occupancy, per mille.
    pub hashfull: u32,
}

/// Result of a completed search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Best move of the deepest completed iteration. Null when the root
    /// position has no legal move.
    pub best_move: Move,
    /// Expected reply, for pondering.
    pub ponder_move: Option<Move>,
    /// Principal variation of the deepest completed iteration.
    pub pv: Vec<Move>,
    /// Score in centipawns from the side to move's point of view.
    pub score: i32,
    pub nodes: u64,
    /// Deepest completed iteration, `0` when the root had no move.
    pub depth: i32,
}

/// Iterative deepening searcher.
///
/// Owns everything that outlives a single search: the transposition table,
/// the history table, the evaluator and its caches, and the tuning.
pub struct Searcher {
    tt: TranspositionTable,
    history: HistoryTable,
    evaluator: Evaluator,
    params: SearchParams,
    lmr: LmrTable,
}

impl Searcher {
    /// A searcher with a `hash_mb` MiB transposition table and default
    /// parameters.
    pub fn new(hash_mb: usize) -> Searcher {
        let params = SearchParams::default();
        Searcher {
            tt: TranspositionTable::new(hash_mb),
            history: HistoryTable::new(),
            evaluator: Evaluator::new(),
            lmr: LmrTable::new(&params),
            params,
        }
    }

    /// Forget everything learned from earlier positions.
    pub fn new_game(&mut self) {
        self.tt.clear();
        self.history.clear();
        self.evaluator.clear();
    }

    pub fn clear_tt(&self) {
        self.tt.clear();
    }

    /// Reallocate the transposition table. Its contents are lost.
    pub fn resize_tt(&mut self, mb: usize) {
        self.tt.resize(mb);
    }

    pub fn hashfull(&self) -> u32 {
        self.tt.hashfull()
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// Change one search parameter by name.
    pub fn set_param(&mut self, name: &str, value: i32) -> Result<(), ParamError> {
        self.params.set(name, value)?;
        self.lmr = LmrTable::new(&self.params);
        debug!(name, value, "search parameter changed");
        Ok(())
    }

    /// Iterative deepening from depth 1 to `max_depth`.
    ///
    /// `on_info` receives every root report. The first iteration always
    /// completes, so a legal position always yields a move. An iteration
    /// cut short by `control` is discarded. `pos` is left as it was found.
    pub fn search(
        &mut self,
        pos: &mut Position,
        max_depth: i32,
        control: &SearchControl,
        mut on_info: impl FnMut(&SearchInfo),
    ) -> SearchResult {
        let root_moves = generate_legal(pos);
        let Some(&fallback) = root_moves.iter().next() else {
            let score = if pos.in_check() { -MATE } else { DRAW };
            return SearchResult {
                best_move: Move::NULL,
                ponder_move: None,
                pv: Vec::new(),
                score,
                nodes: 0,
                depth: 0,
            };
        };

        self.tt.age();
        let max_depth = max_depth.clamp(1, MAX_PLY as i32 - 1);

        let mut best_move = fallback;
        let mut best_score = 0;
        let mut completed = 0;
        let mut pv = Vec::new();

        let nodes = {
            let Searcher { tt, history, evaluator, params, lmr } = self;
            let mut ctx = SearchContext::new(pos, tt, history, evaluator, params, lmr, control, &mut on_info);

            let mut previous = 0;
            for depth in 1..=max_depth {
                if depth > 1 && control.should_stop_iterating() {
                    break;
                }

                let score = ctx.widen(depth, previous);
                if ctx.aborted {
                    debug!(depth, nodes = ctx.nodes, "iteration abandoned");
                    break;
                }
                previous = score;

                let line: Vec<Move> = ctx.pv.root().iter().copied().filter(|mv| !mv.is_null()).collect();
                if let Some(&first) = line.first() {
                    best_move = first;
                    pv = line;
                } else {
                    pv = vec![best_move];
                }
                best_score = score;
                completed = depth;

                debug!(
                    depth,
                    seldepth = ctx.seldepth,
                    score,
                    nodes = ctx.nodes,
                    best = %best_move,
                    "iteration complete"
                );
            }
            ctx.nodes
        };

        let ponder_move = match pv.get(1) {
            Some(&reply) => Some(reply),
            None => self.expected_reply(pos, best_move),
        };

        SearchResult {
            best_move,
            ponder_move,
            pv,
            score: best_score,
            nodes,
            depth: completed,
        }
    }

    /// The hash move of the position after `mv`, if it is legal there.
    fn expected_reply(&self, pos: &mut Position, mv: Move) -> Option<Move> {
        let undo = pos.do_move(mv);
        let reply = self
            .tt
            .retrieve(pos.hash(), -INF, INF, 0, 1)
            .map(|hit| hit.mv)
            .filter(|&reply| !reply.is_null() && generate_legal(pos).contains(reply));
        pos.undo_move(mv, undo);
        reply
    }
}

impl Default for Searcher {
    fn default() -> Self {
        Searcher::new(16)
    }
}

impl std::fmt::Debug for Searcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Searcher")
            .field("hashfull", &self.tt.hashfull())
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn search_depth(searcher: &mut Searcher, pos: &mut Position, depth: i32) -> SearchResult {
        let control = SearchControl::infinite(Arc::new(AtomicBool::new(false)));
        searcher.search(pos, depth, &control, |_| {})
    }

    #[test]
    fn mate_distance_in_moves() {
        assert_eq!(mate_in(MATE - 1), Some(1));
        assert_eq!(mate_in(MATE - 3), Some(2));
        assert_eq!(mate_in(-MATE + 2), Some(-1));
        assert_eq!(mate_in(-MATE + 4), Some(-2));
        assert_eq!(mate_in(150), None);
        assert_eq!(mate_in(-crate::EVAL_LIMIT), None);
    }

    #[test]
    fn depth_1_returns_legal_move() {
        let mut pos = Position::startpos();
        let mut searcher = Searcher::new(1);
        let result = search_depth(&mut searcher, &mut pos, 1);
        assert!(generate_legal(&mut pos).contains(result.best_move));
        assert_eq!(result.depth, 1);
    }

    #[test]
    fn finds_mate_in_one() {
        let mut pos: Position = "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4"
            .parse()
            .unwrap();
        let mut searcher = Searcher::new(1);
        let result = search_depth(&mut searcher, &mut pos, 3);
        assert_eq!(result.best_move.to_string(), "h5f7");
        assert_eq!(result.score, MATE - 1);
    }

    #[test]
    fn stalemate_scores_zero_without_a_move() {
        let mut pos: Position = "k7/2K5/1Q6/8/8/8/8/8 b - - 0 1".parse().unwrap();
        let result = search_depth(&mut Searcher::new(1), &mut pos, 4);
        assert_eq!(result.score, 0);
        assert!(result.best_move.is_null());
        assert_eq!(result.depth, 0);
    }

    #[test]
    fn mated_root_scores_mate() {
        let mut pos: Position = "7k/6Q1/5K2/8/8/8/8/8 b - - 0 1".parse().unwrap();
        let result = search_depth(&mut Searcher::new(1), &mut pos, 4);
        assert!(result.best_move.is_null());
        assert!(result.score < -MATE_BOUND);
    }

    #[test]
    fn reports_every_depth_with_a_real_pv() {
        let mut pos = Position::startpos();
        let mut searcher = Searcher::new(1);
        let control = SearchControl::infinite(Arc::new(AtomicBool::new(false)));
        let mut depths = Vec::new();
        searcher.search(&mut pos, 4, &control, |info| {
            if info.bound == Bound::Exact {
                assert!(!info.pv.is_empty() && !info.pv[0].is_null());
            }
            if depths.last() != Some(&info.depth) {
                depths.push(info.depth);
            }
        });
        assert_eq!(depths, vec![1, 2, 3, 4]);
    }

    #[test]
    fn pv_starts_with_best_move() {
        let mut pos = Position::startpos();
        let result = search_depth(&mut Searcher::new(1), &mut pos, 4);
        assert_eq!(result.pv[0], result.best_move);
        assert_eq!(result.depth, 4);
        assert!(result.ponder_move.is_some());
    }

    #[test]
    fn warm_table_still_yields_legal_moves() {
        let mut pos = Position::startpos();
        let mut searcher = Searcher::new(1);
        let first = search_depth(&mut searcher, &mut pos, 4);
        let second = search_depth(&mut searcher, &mut pos, 4);
        let legal = generate_legal(&mut pos);
        assert!(legal.contains(first.best_move));
        assert!(legal.contains(second.best_move));
    }

    #[test]
    fn stop_after_first_report_still_answers() {
        let mut pos = Position::startpos();
        let mut searcher = Searcher::new(1);
        let stopped = Arc::new(AtomicBool::new(false));
        let control = SearchControl::infinite(Arc::clone(&stopped));
        let result = searcher.search(&mut pos, 64, &control, |info| {
            if info.depth >= 2 {
                stopped.store(true, Ordering::Relaxed);
            }
        });
        assert!(result.depth >= 1 && result.depth < 64);
        assert!(generate_legal(&mut pos).contains(result.best_move));
    }

    #[test]
    fn set_param_validates() {
        let mut searcher = Searcher::new(1);
        searcher.set_param("lmr_divisor", 250).unwrap();
        assert_eq!(searcher.params().lmr_divisor, 250);
        assert!(searcher.set_param("lmr_divisor", 1).is_err());
        assert_eq!(searcher.params().lmr_divisor, 250);
    }

    #[test]
    fn new_game_empties_the_table() {
        let mut pos = Position::startpos();
        let mut searcher = Searcher::new(1);
        search_depth(&mut searcher, &mut pos, 5);
        assert!(searcher.hashfull() > 0);
        searcher.new_game();
        assert_eq!(searcher.hashfull(), 0);
    }
}
