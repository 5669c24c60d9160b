//! Zobrist keys and from-scratch hashing.

use crate::castle_rights::CastleRights;
use crate::color::Color;
use crate::piece::Piece;
use crate::position::Position;
use crate::square::Square;

struct Keys {
    piece_square: [[u64; 64]; Piece::COUNT],
    black_to_move: u64,
    castling: [u64; 16],
    en_passant_file: [u64; 8],
}

/// splitmix64 step: returns the next output and the advanced state.
const fn splitmix64(state: u64) -> (u64, u64) {
    let state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    (z ^ (z >> 31), state)
}

static KEYS: Keys = {
    let mut state = 0x4B45_5354_5245_4C21;
    let mut keys = Keys {
        piece_square: [[0; 64]; Piece::COUNT],
        black_to_move: 0,
        castling: [0; 16],
        en_passant_file: [0; 8],
    };

    let mut piece = 0;
    while piece < Piece::COUNT {
        let mut sq = 0;
        while sq < 64 {
            let (key, next) = splitmix64(state);
            keys.piece_square[piece][sq] = key;
            state = next;
            sq += 1;
        }
        piece += 1;
    }

    let (key, next) = splitmix64(state);
    keys.black_to_move = key;
    state = next;

    // No rights hashes to zero so positions without castling need no key.
    let mut i = 1;
    while i < 16 {
        let (key, next) = splitmix64(state);
        keys.castling[i] = key;
        state = next;
        i += 1;
    }

    let mut file = 0;
    while file < 8 {
        let (key, next) = splitmix64(state);
        keys.en_passant_file[file] = key;
        state = next;
        file += 1;
    }
    keys
};

#[inline]
pub(crate) fn piece_square(piece: Piece, sq: Square) -> u64 {
    KEYS.piece_square[piece.index()][sq.index()]
}

#[inline]
pub(crate) fn black_to_move() -> u64 {
    KEYS.black_to_move
}

#[inline]
pub(crate) fn castling(rights: CastleRights) -> u64 {
    KEYS.castling[rights.bits() as usize]
}

#[inline]
pub(crate) fn en_passant(sq: Square) -> u64 {
    KEYS.en_passant_file[sq.file() as usize]
}

/// Recompute `(hash, pawn_king_hash)` from board contents alone.
pub fn hashes_from_scratch(pos: &Position) -> (u64, u64) {
    let mut hash = 0;
    let mut pawn_king = 0;

    for sq in pos.occupied() {
        if let Some(piece) = pos.piece_on(sq) {
            let key = piece_square(piece, sq);
            hash ^= key;
            if piece.is_pawn_or_king() {
                pawn_king ^= key;
            }
        }
    }

    if pos.side_to_move() == Color::Black {
        hash ^= black_to_move();
    }
    hash ^= castling(pos.castling());
    if let Some(ep) = pos.en_passant() {
        hash ^= en_passant(ep);
    }
    (hash, pawn_king)
}
