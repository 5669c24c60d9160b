//! Deciding whether a move gives check before it is played.

use crate::attacks::{attacks_from, bishop_attacks, rook_attacks};
use crate::chess_move::Move;
use crate::position::Position;

impl Position {
    /// `true` if the pseudo-legal `mv` would leave the opponent in check.
    ///
    /// Looks at the moved piece on its new square (direct check) and at our
    /// sliders uncovered by the vacated square (discovered check). Castling
    /// is settled by playing the move and taking it back.
    pub fn gives_check(&mut self, mv: Move) -> bool {
        if mv.is_castle() {
            let undo = self.do_move(mv);
            let check = self.in_check();
            self.undo_move(mv, undo);
            return check;
        }

        let us = self.side_to_move();
        let king = self.king_square(!us);
        let (from, to) = (mv.from(), mv.to());
        let Some(piece) = self.piece_on(from) else {
            return false;
        };
        let kind = mv.promotion_kind().unwrap_or(piece.kind());

        let mut occupied = (self.occupied() ^ from.bitboard()) | to.bitboard();
        if mv.is_en_passant() {
            occupied ^= to.forward(!us).bitboard();
        }

        if attacks_from(kind, us, to, occupied).contains(king) {
            return true;
        }

        let ours = self.side(us) ^ from.bitboard();
        let uncovered = (bishop_attacks(king, occupied) & self.diagonal_sliders())
            | (rook_attacks(king, occupied) & self.orthogonal_sliders());
        (uncovered & ours).is_nonempty()
    }
}

#[cfg(test)]
mod tests {
    use crate::chess_move::{Move, MoveTag};
    use crate::position::Position;
    use crate::square::Square;

    /// Cross-check against playing the move.
    fn agrees_with_play(fen: &str, mv: Move) -> bool {
        let mut pos: Position = fen.parse().unwrap();
        let predicted = pos.gives_check(mv);
        let undo = pos.do_move(mv);
        let actual = pos.in_check();
        pos.undo_move(mv, undo);
        assert_eq!(predicted, actual, "{mv} in {fen}");
        predicted
    }

    #[test]
    fn direct_checks() {
        assert!(agrees_with_play("4k3/8/8/8/8/8/8/R3K3 w - - 0 1", Move::normal(Square::A1, Square::A8)));
        assert!(agrees_with_play("4k3/8/8/8/4N3/8/8/4K3 w - - 0 1", Move::normal(Square::E4, Square::D6)));
        assert!(!agrees_with_play("4k3/8/8/8/8/8/8/R3K3 w - - 0 1", Move::normal(Square::A1, Square::A7)));
    }

    #[test]
    fn discovered_check() {
        assert!(agrees_with_play("4k3/8/8/8/4N3/8/8/4RK2 w - - 0 1", Move::normal(Square::E4, Square::C3)));
    }

    #[test]
    fn promotion_check() {
        assert!(agrees_with_play("3k4/1P6/8/8/8/8/8/4K3 w - - 0 1", Move::new(Square::B7, Square::B8, MoveTag::PromoteQueen)));
        assert!(!agrees_with_play("3k4/1P6/8/8/8/8/8/4K3 w - - 0 1", Move::new(Square::B7, Square::B8, MoveTag::PromoteKnight)));
    }

    #[test]
    fn en_passant_discovery() {
        // Removing both pawns from the fifth rank opens the rook onto the king.
        assert!(agrees_with_play("8/8/8/R2pP2k/8/8/8/4K3 w - d6 0 1", Move::new(Square::E5, Square::D6, MoveTag::EnPassant)));
    }

    #[test]
    fn castling_check() {
        assert!(agrees_with_play("5k2/8/8/8/8/8/8/4K2R w K - 0 1", Move::new(Square::E1, Square::G1, MoveTag::Castle)));
    }
}
