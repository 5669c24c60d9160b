//! Pawn pushes, captures, promotions and en passant.

use crate::attacks::pawn_attacks;
use crate::bitboard::Bitboard;
use crate::chess_move::{Move, MoveTag};
use crate::color::Color;
use crate::move_list::MoveList;
use crate::piece::PieceKind;
use crate::position::Position;

/// Destination rank for promotions and the rank a single push from the
/// start rank lands on.
fn ranks(us: Color) -> (Bitboard, Bitboard) {
    match us {
        Color::White => (Bitboard::RANK_8, Bitboard::RANK_3),
        Color::Black => (Bitboard::RANK_1, Bitboard::RANK_6),
    }
}

fn push_promotions(list: &mut MoveList, from: crate::square::Square, to: crate::square::Square) {
    for tag in MoveTag::PROMOTIONS {
        list.push(Move::new(from, to, tag));
    }
}

/// Captures, promotions (pushes and captures) and en passant.
pub(super) fn noisy(pos: &Position, list: &mut MoveList) {
    let us = pos.side_to_move();
    let pawns = pos.pieces_of(us, PieceKind::Pawn);
    let enemies = pos.side(!us);
    let (promo_rank, _) = ranks(us);

    for from in pawns {
        for to in pawn_attacks(us, from) & enemies {
            if promo_rank.contains(to) {
                push_promotions(list, from, to);
            } else {
                list.push(Move::normal(from, to));
            }
        }
    }

    let pushes = pawns.forward(us) & !pos.occupied() & promo_rank;
    for to in pushes {
        push_promotions(list, to.forward(!us), to);
    }

    if let Some(ep) = pos.en_passant() {
        for from in pawn_attacks(!us, ep) & pawns {
            list.push(Move::new(from, ep, MoveTag::EnPassant));
        }
    }
}

/// Non-promoting single and double pushes.
pub(super) fn quiet(pos: &Position, list: &mut MoveList) {
    let us = pos.side_to_move();
    let empty = !pos.occupied();
    let (promo_rank, push_rank) = ranks(us);

    let singles = pos.pieces_of(us, PieceKind::Pawn).forward(us) & empty;
    for to in singles & !promo_rank {
        list.push(Move::normal(to.forward(!us), to));
    }

    let doubles = (singles & push_rank).forward(us) & empty;
    for to in doubles {
        list.push(Move::new(to.forward(!us).forward(!us), to, MoveTag::DoublePush));
    }
}
