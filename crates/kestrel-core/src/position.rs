//! The position: piece placement plus all state that make/unmake touches.

use std::fmt;

use crate::attacks::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks,
};
use crate::bitboard::Bitboard;
use crate::castle_rights::CastleRights;
use crate::color::Color;
use crate::error::FenError;
use crate::piece::{Piece, PieceKind};
use crate::square::Square;
use crate::zobrist;

/// A chess position, mutated in place by `do_move`/`undo_move`.
///
/// Bitboards and the square array are two views of the same placement and
/// are always updated together, as are `hash` and `pawn_king_hash`.
#[derive(Clone, PartialEq, Eq)]
pub struct Position {
    /// One bitboard per colored piece, indexed by [`Piece::index`].
    pieces: [Bitboard; Piece::COUNT],
    sides: [Bitboard; Color::COUNT],
    occupied: Bitboard,
    squares: [Option<Piece>; Square::COUNT],
    pub(crate) side_to_move: Color,
    pub(crate) castling: CastleRights,
    pub(crate) en_passant: Option<Square>,
    /// Plies since the last capture or pawn move.
    pub(crate) halfmove_clock: u16,
    pub(crate) fullmove_number: u16,
    pub(crate) hash: u64,
    pub(crate) pawn_king_hash: u64,
    /// Hashes of every earlier position on the current line, oldest first.
    pub(crate) history: Vec<u64>,
}

impl Position {
    /// A board with no pieces, White to move and no rights.
    pub(crate) fn empty() -> Position {
        Position {
            pieces: [Bitboard::EMPTY; Piece::COUNT],
            sides: [Bitboard::EMPTY; Color::COUNT],
            occupied: Bitboard::EMPTY,
            squares: [None; Square::COUNT],
            side_to_move: Color::White,
            castling: CastleRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            hash: 0,
            pawn_king_hash: 0,
            history: Vec::with_capacity(256),
        }
    }

    /// The standard initial position.
    pub fn startpos() -> Position {
        const BACK_RANK: [PieceKind; 8] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];

        let mut pos = Position::empty();
        for (file, &kind) in BACK_RANK.iter().enumerate() {
            let file = file as u8;
            pos.add_piece(Square::new(file, 0), Piece::new(kind, Color::White));
            pos.add_piece(Square::new(file, 1), Piece::new(PieceKind::Pawn, Color::White));
            pos.add_piece(Square::new(file, 6), Piece::new(PieceKind::Pawn, Color::Black));
            pos.add_piece(Square::new(file, 7), Piece::new(kind, Color::Black));
        }
        pos.castling = CastleRights::ALL;
        pos.refresh_hashes();
        pos
    }

    // --- placement primitives; callers keep the hashes in sync ---

    #[inline]
    pub(crate) fn add_piece(&mut self, sq: Square, piece: Piece) {
        debug_assert!(self.squares[sq.index()].is_none(), "{sq} already occupied");
        let bb = sq.bitboard();
        self.pieces[piece.index()] |= bb;
        self.sides[piece.color().index()] |= bb;
        self.occupied |= bb;
        self.squares[sq.index()] = Some(piece);
    }

    #[inline]
    pub(crate) fn remove_piece(&mut self, sq: Square, piece: Piece) {
        debug_assert_eq!(self.squares[sq.index()], Some(piece));
        let bb = !sq.bitboard();
        self.pieces[piece.index()] &= bb;
        self.sides[piece.color().index()] &= bb;
        self.occupied &= bb;
        self.squares[sq.index()] = None;
    }

    #[inline]
    pub(crate) fn relocate_piece(&mut self, from: Square, to: Square, piece: Piece) {
        self.remove_piece(from, piece);
        self.add_piece(to, piece);
    }

    /// Recompute both hashes from board contents.
    pub(crate) fn refresh_hashes(&mut self) {
        let (hash, pawn_king) = zobrist::hashes_from_scratch(self);
        self.hash = hash;
        self.pawn_king_hash = pawn_king;
    }

    /// Structural checks run after parsing.
    pub(crate) fn validate(&self) -> Result<(), FenError> {
        for color in Color::ALL {
            let count = self.pieces_of(color, PieceKind::King).count();
            if count != 1 {
                let color = match color {
                    Color::White => "white",
                    Color::Black => "black",
                };
                return Err(FenError::InvalidKingCount { color, count });
            }
        }
        if (self.pieces(PieceKind::Pawn) & (Bitboard::RANK_1 | Bitboard::RANK_8)).is_nonempty() {
            return Err(FenError::PawnsOnBackRank);
        }
        if self.own_king_in_check() {
            return Err(FenError::OpponentInCheck);
        }
        Ok(())
    }

    // --- queries ---

    #[inline]
    pub fn piece_on(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()]
    }

    #[inline]
    pub fn kind_on(&self, sq: Square) -> Option<PieceKind> {
        self.squares[sq.index()].map(Piece::kind)
    }

    /// Pieces of one kind, both colors.
    #[inline]
    pub fn pieces(&self, kind: PieceKind) -> Bitboard {
        self.pieces[kind.index()] | self.pieces[kind.index() + PieceKind::COUNT]
    }

    #[inline]
    pub fn pieces_of(&self, color: Color, kind: PieceKind) -> Bitboard {
        self.pieces[Piece::new(kind, color).index()]
    }

    #[inline]
    pub fn side(&self, color: Color) -> Bitboard {
        self.sides[color.index()]
    }

    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.occupied
    }

    /// Bishops and queens of both colors.
    #[inline]
    pub fn diagonal_sliders(&self) -> Bitboard {
        self.pieces(PieceKind::Bishop) | self.pieces(PieceKind::Queen)
    }

    /// Rooks and queens of both colors.
    #[inline]
    pub fn orthogonal_sliders(&self) -> Bitboard {
        self.pieces(PieceKind::Rook) | self.pieces(PieceKind::Queen)
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        let king = self.pieces_of(color, PieceKind::King);
        debug_assert!(king.is_nonempty(), "{color} has no king");
        king.lsb().unwrap_or(Square::A1)
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn castling(&self) -> CastleRights {
        self.castling
    }

    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u16 {
        self.halfmove_clock
    }

    #[inline]
    pub fn fullmove_number(&self) -> u16 {
        self.fullmove_number
    }

    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Hash over pawns and kings only.
    #[inline]
    pub fn pawn_king_hash(&self) -> u64 {
        self.pawn_king_hash
    }

    /// `true` if `color` has anything besides pawns and the king.
    #[inline]
    pub fn has_non_pawn_material(&self, color: Color) -> bool {
        (self.side(color)
            ^ self.pieces_of(color, PieceKind::Pawn)
            ^ self.pieces_of(color, PieceKind::King))
        .is_nonempty()
    }

    // --- attacks ---

    /// Every piece of either color attacking `sq` through `occupied`.
    pub fn attackers_to(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        (pawn_attacks(Color::White, sq) & self.pieces_of(Color::Black, PieceKind::Pawn))
            | (pawn_attacks(Color::Black, sq) & self.pieces_of(Color::White, PieceKind::Pawn))
            | (knight_attacks(sq) & self.pieces(PieceKind::Knight))
            | (king_attacks(sq) & self.pieces(PieceKind::King))
            | (bishop_attacks(sq, occupied) & self.diagonal_sliders())
            | (rook_attacks(sq, occupied) & self.orthogonal_sliders())
    }

    /// `true` if any piece of `by` attacks `sq`.
    pub fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        self.is_square_attacked_with(sq, by, self.occupied)
    }

    /// Like [`is_square_attacked`](Self::is_square_attacked) with a substitute occupancy.
    pub fn is_square_attacked_with(&self, sq: Square, by: Color, occupied: Bitboard) -> bool {
        let them = self.side(by);
        (pawn_attacks(!by, sq) & self.pieces_of(by, PieceKind::Pawn)).is_nonempty()
            || (knight_attacks(sq) & self.pieces_of(by, PieceKind::Knight)).is_nonempty()
            || (king_attacks(sq) & self.pieces_of(by, PieceKind::King)).is_nonempty()
            || (bishop_attacks(sq, occupied) & self.diagonal_sliders() & them).is_nonempty()
            || (rook_attacks(sq, occupied) & self.orthogonal_sliders() & them).is_nonempty()
    }

    /// `true` if the side to move is in check.
    #[inline]
    pub fn in_check(&self) -> bool {
        let us = self.side_to_move;
        self.is_square_attacked(self.king_square(us), !us)
    }

    /// `true` if the side that just moved left its own king attacked.
    ///
    /// Called right after `do_move` to reject pseudo-legal moves.
    #[inline]
    pub fn own_king_in_check(&self) -> bool {
        let mover = !self.side_to_move;
        self.is_square_attacked(self.king_square(mover), self.side_to_move)
    }

    /// Enemy pieces giving check to the side to move.
    pub fn checkers(&self) -> Bitboard {
        let us = self.side_to_move;
        self.attackers_to(self.king_square(us), self.occupied) & self.side(!us)
    }

    /// Wrap for a multi-line board diagram.
    pub fn pretty(&self) -> PrettyPosition<'_> {
        PrettyPosition(self)
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::startpos()
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position(\"{self}\")")
    }
}

/// Board diagram with FEN and hash underneath.
pub struct PrettyPosition<'a>(&'a Position);

impl fmt::Display for PrettyPosition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pos = self.0;
        for rank in (0u8..8).rev() {
            write!(f, " {} |", rank + 1)?;
            for file in 0u8..8 {
                let c = pos.piece_on(Square::new(file, rank)).map_or('.', |p| p.fen_char());
                write!(f, " {c}")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "   +----------------")?;
        writeln!(f, "     a b c d e f g h")?;
        writeln!(f)?;
        writeln!(f, "Fen: {pos}")?;
        write!(f, "Key: {:016X}", pos.hash)
    }
}

#[cfg(test)]
mod tests {
    use super::Position;
    use crate::bitboard::Bitboard;
    use crate::color::Color;
    use crate::fen::STARTING_FEN;
    use crate::piece::{Piece, PieceKind};
    use crate::square::Square;
    use crate::zobrist;

    #[test]
    fn startpos_matches_fen() {
        let parsed: Position = STARTING_FEN.parse().unwrap();
        assert_eq!(Position::startpos(), parsed);
    }

    #[test]
    fn square_array_agrees_with_bitboards() {
        let pos = Position::startpos();
        for sq in Square::all() {
            match pos.piece_on(sq) {
                Some(p) => assert!(pos.pieces_of(p.color(), p.kind()).contains(sq)),
                None => assert!(!pos.occupied().contains(sq)),
            }
        }
        assert_eq!(pos.occupied().count(), 32);
        assert_eq!(pos.pieces(PieceKind::Pawn), Bitboard::RANK_2 | Bitboard::RANK_7);
        assert_eq!(
            pos.piece_on(Square::D8),
            Some(Piece::new(PieceKind::Queen, Color::Black))
        );
    }

    #[test]
    fn startpos_hash_is_from_scratch() {
        let pos = Position::startpos();
        assert_eq!(zobrist::hashes_from_scratch(&pos), (pos.hash(), pos.pawn_king_hash()));
    }

    #[test]
    fn king_squares_and_material() {
        let pos: Position = "8/8/4k3/8/8/8/3PK3/8 w - - 0 1".parse().unwrap();
        assert_eq!(pos.king_square(Color::White), Square::E2);
        assert_eq!(pos.king_square(Color::Black), Square::E6);
        assert!(!pos.has_non_pawn_material(Color::White));
        assert!(!pos.has_non_pawn_material(Color::Black));
        assert!(Position::startpos().has_non_pawn_material(Color::Black));
    }

    #[test]
    fn attack_queries() {
        let pos: Position = "4k3/8/8/8/1b6/8/3P4/4K2R w K - 0 1".parse().unwrap();
        assert!(pos.is_square_attacked(Square::D2, Color::Black));
        assert!(pos.is_square_attacked(Square::E3, Color::White));
        assert!(!pos.in_check());
        let attackers = pos.attackers_to(Square::C3, pos.occupied());
        assert!(attackers.contains(Square::D2));
        assert!(attackers.contains(Square::B4));
    }

    #[test]
    fn checkers_lists_the_checking_piece() {
        let pos: Position = "4k3/8/8/8/8/8/8/r3K3 w - - 0 1".parse().unwrap();
        assert!(pos.in_check());
        assert_eq!(pos.checkers(), Square::A1.bitboard());
    }

    #[test]
    fn rejects_side_not_to_move_in_check() {
        assert!("4k3/8/8/8/8/8/8/4R1K1 w - - 0 1".parse::<Position>().is_err());
    }
}
