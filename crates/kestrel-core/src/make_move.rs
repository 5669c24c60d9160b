//! In-place move application and its exact inverse.

use crate::attacks::pawn_attacks;
use crate::castle_rights::{CastleRights, CastleSide};
use crate::chess_move::{Move, MoveTag};
use crate::color::Color;
use crate::piece::{Piece, PieceKind};
use crate::position::Position;
use crate::square::Square;
use crate::zobrist;

/// Everything `do_move` overwrites, handed back to `undo_move`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "the undo record is the only way back to the previous position"]
pub struct UndoData {
    pub captured: Option<Piece>,
    castling: CastleRights,
    en_passant: Option<Square>,
    halfmove_clock: u16,
    hash: u64,
    pawn_king_hash: u64,
}

/// Square of the pawn removed by an en-passant capture landing on `to`.
#[inline]
fn en_passant_victim(to: Square, us: Color) -> Square {
    to.forward(!us)
}

impl Position {
    fn snapshot(&self) -> UndoData {
        UndoData {
            captured: None,
            castling: self.castling,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            hash: self.hash,
            pawn_king_hash: self.pawn_king_hash,
        }
    }

    #[inline]
    fn hash_piece(&mut self, piece: Piece, sq: Square) {
        let key = zobrist::piece_square(piece, sq);
        self.hash ^= key;
        if piece.is_pawn_or_king() {
            self.pawn_king_hash ^= key;
        }
    }

    /// `true` if `mv` removes an enemy piece.
    #[inline]
    pub fn is_capture(&self, mv: Move) -> bool {
        mv.is_en_passant() || (!mv.is_castle() && self.piece_on(mv.to()).is_some())
    }

    /// Captures, en passant and promotions.
    #[inline]
    pub fn is_noisy(&self, mv: Move) -> bool {
        mv.is_promotion() || self.is_capture(mv)
    }

    /// Play a pseudo-legal move for the side to move.
    ///
    /// The move may leave the mover's king in check; callers test
    /// [`own_king_in_check`](Self::own_king_in_check) afterwards.
    pub fn do_move(&mut self, mv: Move) -> UndoData {
        let mut undo = self.snapshot();
        let us = self.side_to_move;
        let them = !us;
        let (from, to) = (mv.from(), mv.to());

        debug_assert!(!mv.is_null(), "null move passed to do_move");
        let Some(piece) = self.piece_on(from) else {
            debug_assert!(false, "no piece on {from} for {mv}");
            return undo;
        };
        debug_assert_eq!(piece.color(), us);

        self.history.push(self.hash);

        if let Some(ep) = self.en_passant.take() {
            self.hash ^= zobrist::en_passant(ep);
        }
        self.hash ^= zobrist::castling(self.castling);

        match mv.tag() {
            MoveTag::EnPassant => {
                let victim_sq = en_passant_victim(to, us);
                let victim = Piece::new(PieceKind::Pawn, them);
                self.remove_piece(victim_sq, victim);
                self.hash_piece(victim, victim_sq);
                undo.captured = Some(victim);
            }
            MoveTag::Castle => {}
            _ => {
                if let Some(victim) = self.piece_on(to) {
                    self.remove_piece(to, victim);
                    self.hash_piece(victim, to);
                    undo.captured = Some(victim);
                }
            }
        }

        let placed = match mv.promotion_kind() {
            Some(kind) => Piece::new(kind, us),
            None => piece,
        };
        self.remove_piece(from, piece);
        self.hash_piece(piece, from);
        self.add_piece(to, placed);
        self.hash_piece(placed, to);

        if mv.is_castle() {
            let (_, _, rook_from, rook_to) = CastleSide::from_king_target(to).squares(us);
            let rook = Piece::new(PieceKind::Rook, us);
            self.relocate_piece(rook_from, rook_to, rook);
            self.hash_piece(rook, rook_from);
            self.hash_piece(rook, rook_to);
        }

        if mv.is_double_push() {
            let ep = from.forward(us);
            if (pawn_attacks(us, ep) & self.pieces_of(them, PieceKind::Pawn)).is_nonempty() {
                self.en_passant = Some(ep);
                self.hash ^= zobrist::en_passant(ep);
            }
        }

        self.castling = self
            .castling
            .remove(CastleRights::revoked_by(from))
            .remove(CastleRights::revoked_by(to));
        self.hash ^= zobrist::castling(self.castling);

        if piece.kind() == PieceKind::Pawn || undo.captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if us == Color::Black {
            self.fullmove_number += 1;
        }

        self.side_to_move = them;
        self.hash ^= zobrist::black_to_move();
        undo
    }

    /// Take back `mv`, which must be the last move played.
    pub fn undo_move(&mut self, mv: Move, undo: UndoData) {
        let them = self.side_to_move;
        let us = !them;
        let (from, to) = (mv.from(), mv.to());
        self.side_to_move = us;
        if us == Color::Black {
            self.fullmove_number -= 1;
        }

        if mv.is_castle() {
            let (_, _, rook_from, rook_to) = CastleSide::from_king_target(to).squares(us);
            self.relocate_piece(rook_to, rook_from, Piece::new(PieceKind::Rook, us));
        }

        if let Some(placed) = self.piece_on(to) {
            self.remove_piece(to, placed);
            let original = if mv.is_promotion() {
                Piece::new(PieceKind::Pawn, us)
            } else {
                placed
            };
            self.add_piece(from, original);
        }

        if let Some(victim) = undo.captured {
            let sq = if mv.is_en_passant() { en_passant_victim(to, us) } else { to };
            self.add_piece(sq, victim);
        }

        self.castling = undo.castling;
        self.en_passant = undo.en_passant;
        self.halfmove_clock = undo.halfmove_clock;
        self.hash = undo.hash;
        self.pawn_king_hash = undo.pawn_king_hash;
        self.history.pop();
    }

    /// Pass the turn. Not legal while in check.
    pub fn do_null(&mut self) -> UndoData {
        debug_assert!(!self.in_check(), "null move while in check");
        let undo = self.snapshot();
        self.history.push(self.hash);
        if let Some(ep) = self.en_passant.take() {
            self.hash ^= zobrist::en_passant(ep);
        }
        // Repetition scans stop at the null move.
        self.halfmove_clock = 0;
        self.side_to_move = !self.side_to_move;
        self.hash ^= zobrist::black_to_move();
        undo
    }

    pub fn undo_null(&mut self, undo: UndoData) {
        self.side_to_move = !self.side_to_move;
        self.en_passant = undo.en_passant;
        self.halfmove_clock = undo.halfmove_clock;
        self.hash = undo.hash;
        self.pawn_king_hash = undo.pawn_king_hash;
        self.history.pop();
    }
}

#[cfg(test)]
mod tests {
    use crate::castle_rights::{CastleRights, CastleSide};
    use crate::chess_move::{Move, MoveTag};
    use crate::color::Color;
    use crate::piece::{Piece, PieceKind};
    use crate::position::Position;
    use crate::square::Square;
    use crate::zobrist;

    fn pos(fen: &str) -> Position {
        fen.parse().unwrap()
    }

    /// Play, check the hashes, undo, and check the position came back intact.
    fn round_trip(fen: &str, mv: Move) -> Position {
        let mut p = pos(fen);
        let before = p.clone();
        let undo = p.do_move(mv);
        let after = p.clone();
        assert_eq!(
            zobrist::hashes_from_scratch(&p),
            (p.hash(), p.pawn_king_hash()),
            "incremental hash drifted after {mv}"
        );
        p.undo_move(mv, undo);
        assert_eq!(p, before, "undo of {mv} did not restore {fen}");
        after
    }

    #[test]
    fn quiet_move_updates_clocks() {
        let after = round_trip(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            Move::normal(Square::G1, Square::F3),
        );
        assert_eq!(after.halfmove_clock(), 1);
        assert_eq!(after.fullmove_number(), 1);
        assert_eq!(after.side_to_move(), Color::Black);
    }

    #[test]
    fn capture_resets_clock_and_reports_victim() {
        let mut p = pos("4k3/8/8/3p4/8/4N3/8/4K3 w - - 7 30");
        let undo = p.do_move(Move::normal(Square::E3, Square::D5));
        assert_eq!(undo.captured, Some(Piece::new(PieceKind::Pawn, Color::Black)));
        assert_eq!(p.halfmove_clock(), 0);
        round_trip("4k3/8/8/3p4/8/4N3/8/4K3 w - - 7 30", Move::normal(Square::E3, Square::D5));
    }

    #[test]
    fn double_push_sets_en_passant_only_when_capturable() {
        let lone = round_trip(
            "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1",
            Move::new(Square::E2, Square::E4, MoveTag::DoublePush),
        );
        assert_eq!(lone.en_passant(), None);

        let contested = round_trip(
            "4k3/8/8/8/3p4/8/4P3/4K3 w - - 0 1",
            Move::new(Square::E2, Square::E4, MoveTag::DoublePush),
        );
        assert_eq!(contested.en_passant(), Some(Square::E3));
    }

    #[test]
    fn en_passant_removes_the_passed_pawn() {
        let after = round_trip(
            "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2",
            Move::new(Square::E5, Square::D6, MoveTag::EnPassant),
        );
        assert_eq!(after.piece_on(Square::D5), None);
        assert_eq!(
            after.piece_on(Square::D6),
            Some(Piece::new(PieceKind::Pawn, Color::White))
        );
    }

    #[test]
    fn castling_moves_the_rook() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        let kingside = round_trip(fen, Move::new(Square::E1, Square::G1, MoveTag::Castle));
        assert_eq!(kingside.kind_on(Square::F1), Some(PieceKind::Rook));
        assert_eq!(kingside.kind_on(Square::H1), None);
        assert!(!kingside.castling().has(Color::White, CastleSide::QueenSide));
        assert!(kingside.castling().has(Color::Black, CastleSide::KingSide));

        let black = "r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 0 1";
        let queenside = round_trip(black, Move::new(Square::E8, Square::C8, MoveTag::Castle));
        assert_eq!(queenside.kind_on(Square::D8), Some(PieceKind::Rook));
        assert_eq!(queenside.castling(), CastleRights::WHITE_KING.insert(CastleRights::WHITE_QUEEN));
    }

    #[test]
    fn capturing_a_rook_revokes_its_right() {
        let after = round_trip(
            "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1",
            Move::normal(Square::A1, Square::A8),
        );
        assert!(!after.castling().has(Color::Black, CastleSide::QueenSide));
        assert!(!after.castling().has(Color::White, CastleSide::QueenSide));
        assert!(after.castling().has(Color::Black, CastleSide::KingSide));
    }

    #[test]
    fn promotion_with_capture() {
        let after = round_trip(
            "1n2k3/P7/8/8/8/8/8/4K3 w - - 0 1",
            Move::new(Square::A7, Square::B8, MoveTag::PromoteKnight),
        );
        assert_eq!(
            after.piece_on(Square::B8),
            Some(Piece::new(PieceKind::Knight, Color::White))
        );
        assert_eq!(after.pieces(PieceKind::Pawn).count(), 0);
    }

    #[test]
    fn transposition_reaches_same_hash() {
        let mut a = Position::startpos();
        let mut b = Position::startpos();
        for mv in [
            Move::normal(Square::G1, Square::F3),
            Move::normal(Square::G8, Square::F6),
            Move::normal(Square::B1, Square::C3),
        ] {
            let _ = a.do_move(mv);
        }
        for mv in [
            Move::normal(Square::B1, Square::C3),
            Move::normal(Square::G8, Square::F6),
            Move::normal(Square::G1, Square::F3),
        ] {
            let _ = b.do_move(mv);
        }
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a.pawn_king_hash(), b.pawn_king_hash());
    }

    #[test]
    fn null_move_round_trip() {
        let mut p = pos("4k3/8/8/8/3p4/8/4P3/4K3 w - - 3 10");
        let _ = p.do_move(Move::new(Square::E2, Square::E4, MoveTag::DoublePush));
        let before = p.clone();
        let undo = p.do_null();
        assert_eq!(p.side_to_move(), Color::White);
        assert_eq!(p.en_passant(), None);
        assert_eq!(zobrist::hashes_from_scratch(&p).0, p.hash());
        p.undo_null(undo);
        assert_eq!(p, before);
    }
}
