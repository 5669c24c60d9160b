//! Moves packed into 16 bits.

use std::fmt;

use crate::piece::PieceKind;
use crate::square::Square;

const FROM_MASK: u16 = 0x003F;
const TO_SHIFT: u32 = 6;
const TO_MASK: u16 = 0x0FC0;
const TAG_SHIFT: u32 = 12;

/// What kind of move a [`Move`] is, beyond its two squares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MoveTag {
    Normal = 0,
    Castle = 1,
    EnPassant = 2,
    DoublePush = 3,
    PromoteKnight = 4,
    PromoteBishop = 5,
    PromoteRook = 6,
    PromoteQueen = 7,
}

impl MoveTag {
    const fn from_bits(bits: u16) -> MoveTag {
        match bits {
            1 => MoveTag::Castle,
            2 => MoveTag::EnPassant,
            3 => MoveTag::DoublePush,
            4 => MoveTag::PromoteKnight,
            5 => MoveTag::PromoteBishop,
            6 => MoveTag::PromoteRook,
            7 => MoveTag::PromoteQueen,
            _ => MoveTag::Normal,
        }
    }

    /// Promotion tag for a target piece kind, `None` for pawns and kings.
    pub const fn promotion(kind: PieceKind) -> Option<MoveTag> {
        match kind {
            PieceKind::Knight => Some(MoveTag::PromoteKnight),
            PieceKind::Bishop => Some(MoveTag::PromoteBishop),
            PieceKind::Rook => Some(MoveTag::PromoteRook),
            PieceKind::Queen => Some(MoveTag::PromoteQueen),
            _ => None,
        }
    }

    /// Promotion tags, strongest first.
    pub const PROMOTIONS: [MoveTag; 4] = [
        MoveTag::PromoteQueen,
        MoveTag::PromoteRook,
        MoveTag::PromoteBishop,
        MoveTag::PromoteKnight,
    ];
}

/// A move: origin, destination and a [`MoveTag`].
///
/// ```text
/// bits  0-5:  from square
/// bits  6-11: to square
/// bits 12-15: tag
/// ```
///
/// Castling is encoded as the king's two-square step.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Move(u16);

impl Move {
    /// The all-zero sentinel, never a legal move.
    pub const NULL: Move = Move(0);

    #[inline]
    pub const fn new(from: Square, to: Square, tag: MoveTag) -> Move {
        Move(from.index() as u16 | (to.index() as u16) << TO_SHIFT | (tag as u16) << TAG_SHIFT)
    }

    /// A plain move or capture.
    #[inline]
    pub const fn normal(from: Square, to: Square) -> Move {
        Move::new(from, to, MoveTag::Normal)
    }

    /// Reconstruct from [`raw`](Self::raw) bits.
    #[inline]
    pub const fn from_raw(bits: u16) -> Move {
        Move(bits)
    }

    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn from(self) -> Square {
        Square::from_index_unchecked((self.0 & FROM_MASK) as u8)
    }

    #[inline]
    pub const fn to(self) -> Square {
        Square::from_index_unchecked(((self.0 & TO_MASK) >> TO_SHIFT) as u8)
    }

    #[inline]
    pub const fn tag(self) -> MoveTag {
        MoveTag::from_bits(self.0 >> TAG_SHIFT)
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_castle(self) -> bool {
        matches!(self.tag(), MoveTag::Castle)
    }

    #[inline]
    pub const fn is_en_passant(self) -> bool {
        matches!(self.tag(), MoveTag::EnPassant)
    }

    #[inline]
    pub const fn is_double_push(self) -> bool {
        matches!(self.tag(), MoveTag::DoublePush)
    }

    #[inline]
    pub const fn is_promotion(self) -> bool {
        self.promotion_kind().is_some()
    }

    /// The piece kind a promotion creates.
    #[inline]
    pub const fn promotion_kind(self) -> Option<PieceKind> {
        match self.tag() {
            MoveTag::PromoteKnight => Some(PieceKind::Knight),
            MoveTag::PromoteBishop => Some(PieceKind::Bishop),
            MoveTag::PromoteRook => Some(PieceKind::Rook),
            MoveTag::PromoteQueen => Some(PieceKind::Queen),
            _ => None,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("0000");
        }
        write!(f, "{}{}", self.from(), self.to())?;
        if let Some(kind) = self.promotion_kind() {
            write!(f, "{}", kind.fen_char())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({self}, {:?})", self.tag())
    }
}
