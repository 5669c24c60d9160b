//! Knight, slider and king moves, plus castling.

use crate::attacks::{attacks_from, between};
use crate::bitboard::Bitboard;
use crate::castle_rights::CastleSide;
use crate::chess_move::{Move, MoveTag};
use crate::move_list::MoveList;
use crate::piece::{Piece, PieceKind};
use crate::position::Position;

const MOVERS: [PieceKind; 5] = [
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Rook,
    PieceKind::Queen,
    PieceKind::King,
];

/// Every non-pawn move landing on `targets`.
pub(super) fn moves_to(pos: &Position, targets: Bitboard, list: &mut MoveList) {
    let us = pos.side_to_move();
    let occupied = pos.occupied();
    for kind in MOVERS {
        for from in pos.pieces_of(us, kind) {
            for to in attacks_from(kind, us, from, occupied) & targets {
                list.push(Move::normal(from, to));
            }
        }
    }
}

/// Castling moves whose path is clear and whose king squares are safe.
///
/// The destination is tested here too, so generated castles are fully legal.
pub(super) fn castles(pos: &Position, list: &mut MoveList) {
    let us = pos.side_to_move();
    let rights = pos.castling();
    if rights.is_empty() || pos.in_check() {
        return;
    }
    for side in CastleSide::ALL {
        if !rights.has(us, side) {
            continue;
        }
        let (king_from, king_to, rook_from, _) = side.squares(us);
        if pos.piece_on(king_from) != Some(Piece::new(PieceKind::King, us))
            || pos.piece_on(rook_from) != Some(Piece::new(PieceKind::Rook, us))
            || (between(king_from, rook_from) & pos.occupied()).is_nonempty()
        {
            continue;
        }
        let walk = between(king_from, king_to) | king_to.bitboard();
        if walk.into_iter().any(|sq| pos.is_square_attacked(sq, !us)) {
            continue;
        }
        list.push(Move::new(king_from, king_to, MoveTag::Castle));
    }
}
