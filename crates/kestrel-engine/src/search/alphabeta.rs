//! Principal variation search with quiescence and aspiration windows.

use std::time::Instant;

use kestrel_core::{Move, Position, Square};

use crate::eval::Evaluator;
use crate::search::control::SearchControl;
use crate::search::heuristics::{HistoryTable, KillerTable};
use crate::search::params::{LmrTable, SearchParams};
use crate::search::picker::{MovePicker, PickerMode};
use crate::search::tt::{Bound, TranspositionTable};
use crate::search::{DRAW, INF, MATE, MATE_BOUND, MAX_PLY, SearchInfo};

/// Nodes between two looks at the clock and the stop flag.
const POLL_INTERVAL: u64 = 1024;

/// Quiet moves remembered per node for history updates.
const MAX_QUIETS: usize = 64;

/// Triangular principal variation table.
///
/// Row `ply` holds the best line found from that ply. A node clears its row
/// on entry and, on every alpha improvement, rebuilds it as its move
/// followed by the child's row.
pub(super) struct PvTable {
    lines: Box<[[Move; MAX_PLY]; MAX_PLY]>,
    len: [usize; MAX_PLY],
}

impl PvTable {
    pub fn new() -> PvTable {
        PvTable {
            lines: Box::new([[Move::NULL; MAX_PLY]; MAX_PLY]),
            len: [0; MAX_PLY],
        }
    }

    pub fn clear_ply(&mut self, ply: usize) {
        if ply < MAX_PLY {
            self.len[ply] = 0;
        }
    }

    pub fn update(&mut self, ply: usize, mv: Move) {
        if ply >= MAX_PLY {
            return;
        }
        let child_len = if ply + 1 < MAX_PLY { self.len[ply + 1].min(MAX_PLY - 1) } else { 0 };
        let (head, tail) = self.lines.split_at_mut(ply + 1);
        head[ply][0] = mv;
        if child_len > 0 {
            head[ply][1..=child_len].copy_from_slice(&tail[0][..child_len]);
        }
        self.len[ply] = 1 + child_len;
    }

    pub fn root(&self) -> &[Move] {
        &self.lines[0][..self.len[0]]
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Frame {
    /// Static eval of the node at this ply.
    eval: i32,
    /// Destination of the move being searched from this ply, if it captures.
    capture: Option<Square>,
}

/// Everything one search shares across its recursion.
pub(super) struct SearchContext<'a> {
    pub pos: &'a mut Position,
    pub tt: &'a TranspositionTable,
    pub history: &'a mut HistoryTable,
    pub evaluator: &'a mut Evaluator,
    pub params: &'a SearchParams,
    pub lmr: &'a LmrTable,
    pub control: &'a SearchControl,
    pub report: &'a mut dyn FnMut(&SearchInfo),
    pub killers: KillerTable,
    pub pv: PvTable,
    stack: [Frame; MAX_PLY + 4],
    pub nodes: u64,
    pub seldepth: usize,
    root_depth: i32,
    pub aborted: bool,
    started: Instant,
}

impl<'a> SearchContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pos: &'a mut Position,
        tt: &'a TranspositionTable,
        history: &'a mut HistoryTable,
        evaluator: &'a mut Evaluator,
        params: &'a SearchParams,
        lmr: &'a LmrTable,
        control: &'a SearchControl,
        report: &'a mut dyn FnMut(&SearchInfo),
    ) -> SearchContext<'a> {
        SearchContext {
            pos,
            tt,
            history,
            evaluator,
            params,
            lmr,
            control,
            report,
            killers: KillerTable::new(),
            pv: PvTable::new(),
            stack: [Frame::default(); MAX_PLY + 4],
            nodes: 0,
            seldepth: 0,
            root_depth: 0,
            aborted: false,
            started: Instant::now(),
        }
    }

    /// Raise `aborted` when the control says so. Never during the first
    /// iteration, so a move is always available.
    fn poll(&mut self) -> bool {
        if !self.aborted
            && self.root_depth > 1
            && self.nodes % POLL_INTERVAL == 0
            && self.control.should_stop(self.nodes)
        {
            self.aborted = true;
        }
        self.aborted
    }

    fn report(&mut self, score: i32, bound: Bound) {
        let elapsed = self.started.elapsed();
        let millis = (elapsed.as_millis() as u64).max(1);
        let info = SearchInfo {
            depth: self.root_depth,
            seldepth: self.seldepth,
            score,
            bound,
            nodes: self.nodes,
            elapsed,
            nps: self.nodes * 1000 / millis,
            pv: self.pv.root().to_vec(),
            hashfull: self.tt.hashfull(),
        };
        (self.report)(&info);
    }

    // ── Aspiration ───────────────────────────────────────────────────────────

    /// Search the root to `depth`, starting with a window around `previous`.
    ///
    /// A result outside the window widens that side by a doubling margin and
    /// searches again. Past `aspiration_max`, or once a mate score shows up,
    /// the window becomes `[-INF, INF]`.
    pub fn widen(&mut self, depth: i32, previous: i32) -> i32 {
        let params = self.params;
        self.root_depth = depth;
        self.seldepth = 0;

        let mut delta = params.aspiration_delta;
        let (mut alpha, mut beta) =
            if depth >= params.aspiration_min_depth && previous.abs() < MATE_BOUND {
                ((previous - delta).max(-INF), (previous + delta).min(INF))
            } else {
                (-INF, INF)
            };

        loop {
            let score = self.search(0, alpha, beta, depth, false, Move::NULL);
            if self.aborted || (score > alpha && score < beta) {
                return score;
            }

            delta = delta.saturating_mul(2);
            let full = delta > params.aspiration_max || score.abs() >= MATE_BOUND;
            if score <= alpha {
                self.report(score, Bound::Upper);
                alpha = (score - delta).max(-INF);
            } else {
                beta = (score + delta).min(INF);
            }
            if full {
                alpha = -INF;
                beta = INF;
            }
        }
    }

    // ── Main search ──────────────────────────────────────────────────────────

    /// Fail-soft alpha-beta over the position at `ply`.
    ///
    /// `excluded` is non-null only in the singular extension test, which
    /// searches the same node with the hash move left out and every node
    /// level shortcut disabled.
    pub fn search(
        &mut self,
        ply: usize,
        mut alpha: i32,
        mut beta: i32,
        mut depth: i32,
        was_null: bool,
        excluded: Move,
    ) -> i32 {
        let root = ply == 0;
        let pv_node = beta > alpha + 1;
        let singular_search = !excluded.is_null();
        let params = self.params;

        if !root {
            self.pv.clear_ply(ply);
        }
        if depth <= 0 {
            return self.quiesce(ply, 0, alpha, beta);
        }

        self.killers.clear_ply(ply + 1);
        self.nodes += 1;
        self.seldepth = self.seldepth.max(ply);
        if self.poll() {
            return 0;
        }

        if !root {
            if self.pos.is_draw() {
                return DRAW;
            }
            if ply >= MAX_PLY - 1 {
                return self.evaluator.evaluate(self.pos);
            }
            alpha = alpha.max(-MATE + ply as i32);
            beta = beta.min(MATE - ply as i32 - 1);
            if alpha >= beta {
                return alpha;
            }
        }

        let key = self.pos.hash();
        let hit = if singular_search {
            None
        } else {
            self.tt.retrieve(key, alpha, beta, depth, ply)
        };
        let tt_move = hit.map_or(Move::NULL, |h| h.mv);
        if let Some(h) = hit {
            let trusted = !pv_node || (h.bound == Bound::Exact && h.score > alpha && h.score < beta);
            if !root && h.cutoff && trusted {
                return h.score;
            }
        }

        let in_check = self.pos.in_check();
        let eval = if in_check {
            -INF
        } else if singular_search {
            self.stack[ply].eval
        } else {
            self.evaluator.evaluate(self.pos)
        };
        self.stack[ply].eval = eval;

        // ── Node pruning ──

        let us = self.pos.side_to_move();
        if !in_check && !pv_node && !was_null && !singular_search && self.pos.has_non_pawn_material(us) {
            if depth <= params.rfp_max_depth && eval - params.rfp_margin * depth > beta {
                return eval;
            }

            if depth <= params.razor_max_depth && eval + params.razor_margin * depth < alpha {
                let score = self.quiesce(ply, 0, alpha, beta);
                if self.aborted {
                    return 0;
                }
                if score < alpha {
                    return score;
                }
            }

            if depth >= params.null_min_depth && eval >= beta {
                let reduction = params.null_base_reduction
                    + depth / params.null_depth_divisor
                    + i32::from(eval - beta >= params.null_eval_margin);
                let null_depth = depth - reduction;

                self.stack[ply].capture = None;
                let undo = self.pos.do_null();
                let score = -self.search(ply + 1, -beta, -beta + 1, null_depth, true, Move::NULL);
                self.pos.undo_null(undo);
                if self.aborted {
                    return 0;
                }

                if score >= beta {
                    let score = if score >= MATE_BOUND { beta } else { score };
                    if depth <= params.null_verify_depth || null_depth <= 0 {
                        return score;
                    }
                    let verified = self.search(ply, beta - 1, beta, null_depth, true, Move::NULL);
                    if self.aborted {
                        return 0;
                    }
                    if verified >= beta {
                        return score;
                    }
                }
            }
        }

        if !in_check && !pv_node && !singular_search && tt_move.is_null() && depth > params.iir_min_depth {
            depth -= 1;
        }

        // ── Singular extension test ──

        let mut singular = false;
        if let Some(h) = hit {
            let candidate = !root
                && depth >= params.singular_depth
                && !h.mv.is_null()
                && matches!(h.bound, Bound::Lower | Bound::Exact)
                && h.depth >= depth - 3
                && h.score.abs() < MATE_BOUND;
            if candidate && self.pos.is_pseudo_legal(h.mv) {
                let singular_beta = h.score - params.singular_margin;
                let score = self.search(ply, singular_beta - 1, singular_beta, depth / 2, was_null, h.mv);
                if self.aborted {
                    return 0;
                }
                singular = score < singular_beta;
            }
        }

        // ── Move loop ──

        let killers = self.killers.get(ply);
        let mut picker = MovePicker::new(self.pos, tt_move, killers, PickerMode::Normal);
        let mut best_score = -INF;
        let mut best_move = Move::NULL;
        let mut legal = 0usize;
        let mut quiets = [Move::NULL; MAX_QUIETS];
        let mut quiet_count = 0;

        while let Some(mv) = picker.next(self.pos, self.history) {
            if mv == excluded {
                continue;
            }
            let quiet = !self.pos.is_noisy(mv);
            let gives_check = self.pos.gives_check(mv);

            if !root && !pv_node && quiet && legal > 0 && !in_check && !gives_check && best_score > -MATE_BOUND {
                if depth <= params.futility_max_depth && eval + params.futility_margin * depth <= alpha {
                    continue;
                }
                if depth <= params.lmp_max_depth && legal as i32 >= params.lmp_base + depth * depth {
                    continue;
                }
            }

            let recapture = ply > 0
                && self.stack[ply - 1].capture == Some(mv.to())
                && self.pos.is_capture(mv);
            let extension = if singular && mv == tt_move {
                1
            } else if gives_check && (pv_node || depth <= params.check_extension_depth) {
                1
            } else {
                i32::from(recapture)
            };

            let capture = self.pos.is_capture(mv).then_some(mv.to());
            let undo = self.pos.do_move(mv);
            if self.pos.own_king_in_check() {
                self.pos.undo_move(mv, undo);
                continue;
            }
            legal += 1;
            self.stack[ply].capture = capture;
            let new_depth = depth - 1 + extension;

            let score = if legal == 1 {
                -self.search(ply + 1, -beta, -alpha, new_depth, false, Move::NULL)
            } else {
                let mut reduction = 0;
                if quiet
                    && depth >= params.lmr_min_depth
                    && legal > params.lmr_min_moves as usize
                    && !in_check
                    && !gives_check
                {
                    reduction = self.lmr.reduction(pv_node, depth, legal);
                    if killers.contains(&mv) {
                        reduction -= 1;
                    }
                    reduction = reduction.min(new_depth - 1).max(0);
                }

                let mut score = -self.search(ply + 1, -alpha - 1, -alpha, new_depth - reduction, false, Move::NULL);
                if score > alpha && reduction > 0 {
                    score = -self.search(ply + 1, -alpha - 1, -alpha, new_depth, false, Move::NULL);
                }
                if score > alpha && score < beta {
                    score = -self.search(ply + 1, -beta, -alpha, new_depth, false, Move::NULL);
                }
                score
            };
            self.pos.undo_move(mv, undo);
            if self.aborted {
                return 0;
            }

            if score > best_score {
                best_score = score;
                if score > alpha {
                    best_move = mv;
                    self.pv.update(ply, mv);

                    if score >= beta {
                        if quiet {
                            self.reward_cutoff(ply, depth, mv, &quiets[..quiet_count]);
                        }
                        if !singular_search {
                            self.tt.store(key, mv, score, Bound::Lower, depth, ply);
                        }
                        if root {
                            self.report(score, Bound::Lower);
                        }
                        return score;
                    }

                    alpha = score;
                    if root {
                        self.report(score, Bound::Exact);
                    }
                }
            }

            if quiet && quiet_count < MAX_QUIETS {
                quiets[quiet_count] = mv;
                quiet_count += 1;
            }
        }

        if legal == 0 {
            if singular_search {
                return alpha;
            }
            return if in_check { -MATE + ply as i32 } else { DRAW };
        }

        if !singular_search {
            let bound = if best_move.is_null() { Bound::Upper } else { Bound::Exact };
            self.tt.store(key, best_move, best_score, bound, depth, ply);
        }
        best_score
    }

    /// Credit the quiet move that cut off and debit the quiet moves tried
    /// before it.
    fn reward_cutoff(&mut self, ply: usize, depth: i32, mv: Move, tried: &[Move]) {
        if let Some(piece) = self.pos.piece_on(mv.from()) {
            self.history.record_cutoff(piece, mv.to(), depth);
        }
        for &quiet in tried {
            if let Some(piece) = self.pos.piece_on(quiet.from()) {
                self.history.record_attempt(piece, quiet.to(), depth);
            }
        }
        self.killers.store(ply, mv);
    }

    // ── Quiescence ───────────────────────────────────────────────────────────

    /// Resolve captures (and, for two plies, checks) until the position is
    /// quiet enough to trust the static eval.
    fn quiesce(&mut self, ply: usize, qdepth: i32, mut alpha: i32, beta: i32) -> i32 {
        self.pv.clear_ply(ply);
        self.nodes += 1;
        self.seldepth = self.seldepth.max(ply);
        if self.poll() {
            return 0;
        }
        if ply > 0 && self.pos.is_draw() {
            return DRAW;
        }
        if ply >= MAX_PLY - 1 {
            return self.evaluator.evaluate(self.pos);
        }

        let in_check = self.pos.in_check();
        let mut best_score = -INF;
        if !in_check {
            let stand_pat = self.evaluator.evaluate(self.pos);
            if stand_pat >= beta {
                return stand_pat;
            }
            alpha = alpha.max(stand_pat);
            best_score = stand_pat;
        }

        let mode = if in_check {
            PickerMode::Normal
        } else if qdepth < 2 {
            PickerMode::Checks
        } else {
            PickerMode::Captures
        };
        let mut picker = MovePicker::new(self.pos, Move::NULL, [Move::NULL; 2], mode);
        let mut legal = 0usize;

        while let Some(mv) = picker.next(self.pos, self.history) {
            let undo = self.pos.do_move(mv);
            if self.pos.own_king_in_check() {
                self.pos.undo_move(mv, undo);
                continue;
            }
            legal += 1;
            let score = -self.quiesce(ply + 1, qdepth + 1, -beta, -alpha);
            self.pos.undo_move(mv, undo);
            if self.aborted {
                return 0;
            }

            if score > best_score {
                best_score = score;
                if score > alpha {
                    if score >= beta {
                        return score;
                    }
                    alpha = score;
                }
            }
        }

        if in_check && legal == 0 {
            return -MATE + ply as i32;
        }
        best_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(from: Square, to: Square) -> Move {
        Move::normal(from, to)
    }

    #[test]
    fn pv_table_prepends_to_child_line() {
        let mut pv = PvTable::new();
        pv.clear_ply(2);
        pv.update(2, mv(Square::G1, Square::F3));
        pv.clear_ply(1);
        pv.update(1, mv(Square::E7, Square::E5));
        pv.update(0, mv(Square::E2, Square::E4));
        assert_eq!(
            pv.root(),
            [
                mv(Square::E2, Square::E4),
                mv(Square::E7, Square::E5),
                mv(Square::G1, Square::F3),
            ]
        );

        // A new best move at ply 1 with an empty child line truncates.
        pv.clear_ply(2);
        pv.update(1, mv(Square::D7, Square::D5));
        pv.update(0, mv(Square::E2, Square::E4));
        assert_eq!(pv.root(), [mv(Square::E2, Square::E4), mv(Square::D7, Square::D5)]);
    }

    #[test]
    fn pv_table_ignores_out_of_range_plies() {
        let mut pv = PvTable::new();
        pv.update(MAX_PLY, mv(Square::A2, Square::A3));
        pv.clear_ply(MAX_PLY + 1);
        assert!(pv.root().is_empty());
    }
}
