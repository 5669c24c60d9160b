//! Staged move picker.
//!
//! Moves are generated and scored lazily, one stage at a time, so a node that
//! cuts off on the hash move never pays for capture generation, SEE or quiet
//! move scoring.

use kestrel_core::{Move, MoveList, PieceKind, Position, fill_checks, fill_noisy, fill_quiet};

use crate::search::heuristics::HistoryTable;
use crate::search::see::{SEE_VALUE, is_bad_capture};

/// Which moves a picker hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerMode {
    /// Everything, in full staged order.
    Normal,
    /// Captures and promotions that do not lose material, then stop.
    Captures,
    /// Good captures followed by quiet checking moves.
    Checks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Tt,
    GenCaptures,
    PrepareGood,
    ReturnGood,
    FirstKiller,
    SecondKiller,
    GenQuiet,
    ReturnQuiet,
    PrepareBad,
    ReturnBad,
    End,
}

/// Ordering score for en passant, between pawn and minor piece captures.
const EN_PASSANT_SCORE: i32 = SEE_VALUE[PieceKind::Pawn.index()] * 8;

/// MVV-LVA: the victim dominates, the cheaper attacker breaks ties, and a
/// promotion adds the value of the new piece.
fn noisy_score(pos: &Position, mv: Move) -> i32 {
    if mv.is_en_passant() {
        return EN_PASSANT_SCORE;
    }
    let victim = pos.kind_on(mv.to()).map_or(0, |k| SEE_VALUE[k.index()]);
    let attacker = pos.kind_on(mv.from()).map_or(0, |k| k.index() as i32);
    let promotion = mv.promotion_kind().map_or(0, |k| SEE_VALUE[k.index()]);
    victim * 8 - attacker + promotion
}

/// Emits the moves of one node in priority order:
/// hash move, good captures, killers, quiet moves, bad captures.
///
/// Moves already handed out in an earlier stage are skipped by comparing
/// values, never by removing them from the generated lists.
pub struct MovePicker {
    mode: PickerMode,
    stage: Stage,
    tt_move: Move,
    killers: [Move; 2],
    /// Good captures, later reused for quiet moves.
    list: MoveList,
    bad: MoveList,
}

impl MovePicker {
    /// Outside [`PickerMode::Normal`] the hash move and killers are ignored.
    /// A hash move that is not pseudo-legal here is dropped.
    pub fn new(pos: &Position, tt_move: Move, killers: [Move; 2], mode: PickerMode) -> MovePicker {
        let (tt_move, killers) = match mode {
            PickerMode::Normal if pos.is_pseudo_legal(tt_move) => (tt_move, killers),
            PickerMode::Normal => (Move::NULL, killers),
            PickerMode::Captures | PickerMode::Checks => (Move::NULL, [Move::NULL; 2]),
        };
        MovePicker {
            mode,
            stage: Stage::Tt,
            tt_move,
            killers,
            list: MoveList::new(),
            bad: MoveList::new(),
        }
    }

    /// The next pseudo-legal move, or `None` once the mode's stages are done.
    ///
    /// `pos` must be the position the picker was created for. It is only
    /// borrowed mutably to test for checks and is left unchanged.
    pub fn next(&mut self, pos: &mut Position, history: &HistoryTable) -> Option<Move> {
        loop {
            match self.stage {
                Stage::Tt => {
                    self.stage = Stage::GenCaptures;
                    if !self.tt_move.is_null() {
                        return Some(self.tt_move);
                    }
                }
                Stage::GenCaptures => {
                    let mut noisy = MoveList::new();
                    fill_noisy(pos, &mut noisy);
                    for &mv in noisy.iter() {
                        if is_bad_capture(pos, mv) {
                            self.bad.push(mv);
                        } else {
                            self.list.push(mv);
                        }
                    }
                    self.stage = Stage::PrepareGood;
                }
                Stage::PrepareGood => {
                    let board: &Position = pos;
                    self.list.score_with(|mv| noisy_score(board, mv));
                    self.stage = Stage::ReturnGood;
                }
                Stage::ReturnGood => {
                    while let Some((mv, _)) = self.list.pop_best() {
                        if mv != self.tt_move {
                            return Some(mv);
                        }
                    }
                    self.stage = match self.mode {
                        PickerMode::Captures => Stage::End,
                        PickerMode::Normal | PickerMode::Checks => Stage::FirstKiller,
                    };
                }
                Stage::FirstKiller => {
                    self.stage = Stage::SecondKiller;
                    if self.killer_playable(pos, 0) {
                        return Some(self.killers[0]);
                    }
                }
                Stage::SecondKiller => {
                    self.stage = Stage::GenQuiet;
                    if self.killer_playable(pos, 1) {
                        return Some(self.killers[1]);
                    }
                }
                Stage::GenQuiet => {
                    self.list.clear();
                    match self.mode {
                        PickerMode::Checks => fill_checks(pos, &mut self.list),
                        _ => fill_quiet(pos, &mut self.list),
                    }
                    let board: &Position = pos;
                    self.list.score_with(|mv| {
                        board
                            .piece_on(mv.from())
                            .map_or(0, |piece| history.score(piece, mv.to()))
                    });
                    self.stage = Stage::ReturnQuiet;
                }
                Stage::ReturnQuiet => {
                    while let Some((mv, _)) = self.list.pop_best() {
                        if mv != self.tt_move && !self.killers.contains(&mv) {
                            return Some(mv);
                        }
                    }
                    self.stage = match self.mode {
                        PickerMode::Checks => Stage::End,
                        _ => Stage::PrepareBad,
                    };
                }
                Stage::PrepareBad => {
                    let board: &Position = pos;
                    self.bad.score_with(|mv| noisy_score(board, mv));
                    self.stage = Stage::ReturnBad;
                }
                Stage::ReturnBad => {
                    while let Some((mv, _)) = self.bad.pop_best() {
                        if mv != self.tt_move {
                            return Some(mv);
                        }
                    }
                    self.stage = Stage::End;
                }
                Stage::End => return None,
            }
        }
    }

    fn killer_playable(&self, pos: &Position, slot: usize) -> bool {
        let mv = self.killers[slot];
        !mv.is_null()
            && mv != self.tt_move
            && (slot == 0 || mv != self.killers[0])
            && pos.is_pseudo_legal(mv)
            && !pos.is_noisy(mv)
    }
}
