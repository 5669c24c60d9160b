//! Static exchange evaluation.
//!
//! Plays out every capture on one square, each side always recapturing with
//! its least valuable piece, without touching the real position.

use kestrel_core::{Bitboard, Color, Move, PieceKind, Position, Square};

/// Exchange values indexed by [`PieceKind::index`]. The king's value is
/// irrelevant: capturing it ends the exchange.
pub const SEE_VALUE: [i32; PieceKind::COUNT] = [100, 325, 325, 500, 1000, 0];

/// Stands for "the king was captured", larger than any material swing.
const KING_CAPTURED: i32 = 20_000;

#[inline]
fn value(kind: PieceKind) -> i32 {
    SEE_VALUE[kind.index()]
}

/// Net material for the side moving from `from` after the best sequence of
/// captures and recaptures on `to`. Either side may stop capturing whenever
/// continuing would lose material.
pub fn swap(pos: &Position, from: Square, to: Square) -> i32 {
    let Some(mover) = pos.piece_on(from) else {
        return 0;
    };
    let mut occupied = pos.occupied() ^ from.bitboard();

    let victim = match pos.kind_on(to) {
        Some(kind) => value(kind),
        None if mover.kind() == PieceKind::Pawn && pos.en_passant() == Some(to) => {
            occupied ^= to.forward(!mover.color()).bitboard();
            value(PieceKind::Pawn)
        }
        None => 0,
    };

    let mut gains = [0i32; 32];
    gains[0] = victim;
    let mut depth = 0;
    let mut on_square = mover.kind();
    let mut side = !mover.color();

    loop {
        let attackers = pos.attackers_to(to, occupied) & occupied & pos.side(side);
        let Some((sq, kind)) = least_valuable(pos, attackers, side) else {
            break;
        };
        depth += 1;
        if on_square == PieceKind::King {
            gains[depth] = KING_CAPTURED;
            break;
        }
        gains[depth] = value(on_square) - gains[depth - 1];
        if depth == gains.len() - 1 {
            break;
        }
        occupied ^= sq.bitboard();
        on_square = kind;
        side = !side;
    }

    while depth > 0 {
        gains[depth - 1] = -(-gains[depth - 1]).max(gains[depth]);
        depth -= 1;
    }
    gains[0]
}

fn least_valuable(pos: &Position, attackers: Bitboard, side: Color) -> Option<(Square, PieceKind)> {
    PieceKind::ALL.into_iter().find_map(|kind| {
        (attackers & pos.pieces_of(side, kind))
            .lsb()
            .map(|sq| (sq, kind))
    })
}

/// `true` if the capture (or promotion) `mv` is expected to lose material.
///
/// Taking something at least as valuable as the capturer is assumed fine
/// without running [`swap`]. En passant trades pawn for pawn, and queen
/// promotions are never considered bad.
pub fn is_bad_capture(pos: &Position, mv: Move) -> bool {
    if mv.is_en_passant() || mv.promotion_kind() == Some(PieceKind::Queen) {
        return false;
    }
    let Some(attacker) = pos.kind_on(mv.from()) else {
        return false;
    };
    let captured = pos.kind_on(mv.to()).map_or(0, value);
    if captured >= value(attacker) {
        return false;
    }
    swap(pos, mv.from(), mv.to()) < 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_core::MoveTag;

    fn see(fen: &str, from: Square, to: Square) -> i32 {
        let pos: Position = fen.parse().unwrap();
        swap(&pos, from, to)
    }

    #[test]
    fn undefended_pieces_are_free() {
        assert_eq!(see("4k3/8/8/3n4/4P3/8/8/4K3 w - - 0 1", Square::E4, Square::D5), 325);
        assert_eq!(see("4k3/8/8/3n4/8/4N3/8/4K3 w - - 0 1", Square::E3, Square::D5), 325);
    }

    #[test]
    fn pawn_takes_knight_defended_by_bishop() {
        // PxN, BxP, and white has nothing left to recapture.
        assert_eq!(see("4k3/8/4b3/3n4/4P3/8/8/4K3 w - - 0 1", Square::E4, Square::D5), 325 - 100);
    }

    #[test]
    fn queen_into_pawn_defence_loses() {
        assert_eq!(see("4k3/8/3p4/2p5/8/4Q3/8/4K3 w - - 0 1", Square::E3, Square::C5), 100 - 1000);
    }

    #[test]
    fn xray_rook_backs_up_the_exchange() {
        // RxP, RxR, RxR: the rooks trade and white keeps the pawn.
        let fen = "3rk3/8/8/3p4/8/8/3R4/3RK3 w - - 0 1";
        assert_eq!(see(fen, Square::D2, Square::D5), 100);
    }

    #[test]
    fn first_capture_is_forced() {
        // The first capture is forced even when it loses the queen.
        let fen = "4k3/8/2p5/3n4/8/8/8/3QK3 w - - 0 1";
        assert_eq!(see(fen, Square::D1, Square::D5), 325 - 1000);
        let fen = "4k3/8/8/3n4/8/8/8/3QK3 w - - 0 1";
        assert_eq!(see(fen, Square::D1, Square::D5), 325);
    }

    #[test]
    fn king_recaptures_only_when_safe() {
        let fen = "8/8/4k3/3p4/8/8/8/3RK3 w - - 0 1";
        assert_eq!(see(fen, Square::D1, Square::D5), 100 - 500);
        // A second rook behind makes Kxd5 illegal, so black declines.
        let fen = "8/8/4k3/3p4/8/8/3R4/3RK3 w - - 0 1";
        assert_eq!(see(fen, Square::D2, Square::D5), 100);
    }

    #[test]
    fn en_passant_trades_pawns() {
        let fen = "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1";
        assert_eq!(see(fen, Square::E5, Square::D6), 100);
    }

    #[test]
    fn bad_capture_front_door() {
        let pos: Position = "4k3/8/3p4/2p5/8/4Q3/8/4K3 w - - 0 1".parse().unwrap();
        assert!(is_bad_capture(&pos, Move::normal(Square::E3, Square::C5)));

        let pos: Position = "4k3/8/4p3/3q4/4P3/8/8/4K3 w - - 0 1".parse().unwrap();
        assert!(!is_bad_capture(&pos, Move::normal(Square::E4, Square::D5)));

        // A defended push-promotion to a knight loses the pawn; to a queen it is kept.
        let pos: Position = "2r1k3/1P6/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        assert!(is_bad_capture(&pos, Move::new(Square::B7, Square::B8, MoveTag::PromoteKnight)));
        assert!(!is_bad_capture(&pos, Move::new(Square::B7, Square::B8, MoveTag::PromoteQueen)));
    }
}
