//! Pseudo-legal move generation, split by category.
//!
//! The generators never check whether a move leaves the mover's own king
//! attacked. Callers play the move and test [`Position::own_king_in_check`].
//! Castling is the exception: its path and destination are verified here.

mod pawns;
mod pieces;

use crate::attacks::{attacks_from, pawn_attacks};
use crate::chess_move::{Move, MoveTag};
use crate::error::MoveParseError;
use crate::move_list::MoveList;
use crate::piece::PieceKind;
use crate::position::Position;
use crate::square::Square;

/// Append captures, en passant and every promotion.
pub fn fill_noisy(pos: &Position, list: &mut MoveList) {
    pawns::noisy(pos, list);
    pieces::moves_to(pos, pos.side(!pos.side_to_move()), list);
}

/// Append non-capturing, non-promoting moves, castling included.
pub fn fill_quiet(pos: &Position, list: &mut MoveList) {
    pawns::quiet(pos, list);
    pieces::moves_to(pos, !pos.occupied(), list);
    pieces::castles(pos, list);
}

/// Append the quiet moves that give check.
pub fn fill_checks(pos: &mut Position, list: &mut MoveList) {
    let mut quiet = MoveList::new();
    fill_quiet(pos, &mut quiet);
    for &mv in quiet.iter() {
        if pos.gives_check(mv) {
            list.push(mv);
        }
    }
}

/// Every fully legal move, noisy moves first.
pub fn generate_legal(pos: &mut Position) -> MoveList {
    let mut pseudo = MoveList::new();
    fill_noisy(pos, &mut pseudo);
    fill_quiet(pos, &mut pseudo);

    let mut legal = MoveList::new();
    for &mv in pseudo.iter() {
        let undo = pos.do_move(mv);
        let ok = !pos.own_king_in_check();
        pos.undo_move(mv, undo);
        if ok {
            legal.push(mv);
        }
    }
    legal
}

impl Position {
    /// `true` if `mv` could have come out of the generators for this position.
    ///
    /// Used to vet moves that come from elsewhere, such as a hash table probe
    /// or the killer slots, before they are played.
    pub fn is_pseudo_legal(&self, mv: Move) -> bool {
        if mv.is_null() {
            return false;
        }
        let us = self.side_to_move();
        let (from, to) = (mv.from(), mv.to());
        let Some(piece) = self.piece_on(from) else {
            return false;
        };
        if piece.color() != us {
            return false;
        }
        let target = self.piece_on(to);
        if target.is_some_and(|t| t.color() == us) {
            return false;
        }

        if mv.is_castle() {
            if piece.kind() != PieceKind::King {
                return false;
            }
            let mut castles = MoveList::new();
            pieces::castles(self, &mut castles);
            return castles.contains(mv);
        }

        if piece.kind() != PieceKind::Pawn {
            return mv.tag() == MoveTag::Normal
                && attacks_from(piece.kind(), us, from, self.occupied()).contains(to);
        }

        let push = from.forward(us);
        let steps = |to: Square| {
            (to == push && target.is_none())
                || (pawn_attacks(us, from).contains(to) && target.is_some())
        };
        match mv.tag() {
            MoveTag::EnPassant => {
                self.en_passant() == Some(to) && pawn_attacks(us, from).contains(to)
            }
            MoveTag::DoublePush => {
                from.relative_rank(us) == 1
                    && self.piece_on(push).is_none()
                    && to == push.forward(us)
                    && target.is_none()
            }
            MoveTag::Normal => to.relative_rank(us) != 7 && steps(to),
            MoveTag::Castle => false,
            _ => to.relative_rank(us) == 7 && steps(to),
        }
    }

    /// Convert long algebraic text (`e2e4`, `e7e8q`) into a legal move.
    ///
    /// Castling, en passant and double pushes are recognised from the board,
    /// not from the text.
    pub fn parse_move(&mut self, text: &str) -> Result<Move, MoveParseError> {
        let malformed = || MoveParseError::Malformed {
            text: text.to_string(),
        };
        let lower = text.to_ascii_lowercase();
        if !(4..=5).contains(&lower.len()) || !lower.is_ascii() {
            return Err(malformed());
        }
        let squares_ok = Square::from_algebraic(&lower[0..2]).is_some()
            && Square::from_algebraic(&lower[2..4]).is_some();
        let promo_ok = lower[4..].chars().all(|c| matches!(c, 'n' | 'b' | 'r' | 'q'));
        if !squares_ok || !promo_ok {
            return Err(malformed());
        }

        generate_legal(self)
            .iter()
            .copied()
            .find(|mv| mv.to_string() == lower)
            .ok_or(MoveParseError::Illegal { text: text.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MoveParseError;

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    #[test]
    fn startpos_has_twenty_quiet_moves() {
        let pos = Position::startpos();
        let mut noisy = MoveList::new();
        let mut quiet = MoveList::new();
        fill_noisy(&pos, &mut noisy);
        fill_quiet(&pos, &mut quiet);
        assert!(noisy.is_empty());
        assert_eq!(quiet.len(), 20);
    }

    #[test]
    fn kiwipete_categories() {
        let mut pos: Position = KIWIPETE.parse().unwrap();
        let mut noisy = MoveList::new();
        fill_noisy(&pos, &mut noisy);
        assert!(noisy.iter().all(|&mv| pos.is_noisy(mv)));
        assert_eq!(noisy.len(), 8);

        let mut quiet = MoveList::new();
        fill_quiet(&pos, &mut quiet);
        assert!(quiet.iter().all(|&mv| !pos.is_noisy(mv)));
        assert_eq!(quiet.iter().filter(|mv| mv.is_castle()).count(), 2);

        assert_eq!(generate_legal(&mut pos).len(), 48);
    }

    #[test]
    fn promotions_are_noisy() {
        let pos: Position = "1r2k3/P7/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        let mut noisy = MoveList::new();
        fill_noisy(&pos, &mut noisy);
        // four straight promotions plus four capturing b8
        assert_eq!(noisy.len(), 8);
        assert!(noisy.iter().all(|mv| mv.is_promotion()));
    }

    #[test]
    fn checks_are_quiet_and_checking() {
        let mut pos: Position = "4k3/8/8/8/8/8/8/R3K3 w - - 0 1".parse().unwrap();
        let mut checks = MoveList::new();
        fill_checks(&mut pos, &mut checks);
        let found: Vec<String> = checks.iter().map(|m| m.to_string()).collect();
        assert_eq!(found, ["a1a8"]);
    }

    #[test]
    fn pseudo_legality_matches_generation() {
        let pos: Position = KIWIPETE.parse().unwrap();
        let mut all = MoveList::new();
        fill_noisy(&pos, &mut all);
        fill_quiet(&pos, &mut all);
        for &mv in all.iter() {
            assert!(pos.is_pseudo_legal(mv), "{mv}");
        }
        for raw in 0..0x8000u16 {
            let mv = Move::from_raw(raw);
            if pos.is_pseudo_legal(mv) {
                assert!(all.contains(mv), "{mv} accepted but never generated");
            }
        }
    }

    #[test]
    fn parse_move_infers_tags() {
        let mut pos: Position = KIWIPETE.parse().unwrap();
        let castle = pos.parse_move("e1g1").unwrap();
        assert!(castle.is_castle());
        let double = pos.parse_move("a2a4").unwrap();
        assert!(double.is_double_push());

        assert!(matches!(pos.parse_move("e2e5"), Err(MoveParseError::Illegal { .. })));
        assert!(matches!(pos.parse_move("e9e4"), Err(MoveParseError::Malformed { .. })));
        assert!(matches!(pos.parse_move("e2e4k"), Err(MoveParseError::Malformed { .. })));
    }
}
