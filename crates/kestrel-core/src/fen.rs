//! FEN parsing and printing for [`Position`].

use std::fmt;
use std::str::FromStr;

use crate::attacks::pawn_attacks;
use crate::castle_rights::CastleRights;
use crate::color::Color;
use crate::error::FenError;
use crate::piece::{Piece, PieceKind};
use crate::position::Position;
use crate::square::Square;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

fn parse_placement(pos: &mut Position, placement: &str) -> Result<(), FenError> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::WrongRankCount { found: ranks.len() });
    }

    for (row, text) in ranks.iter().enumerate() {
        let rank = 7 - row as u8;
        let mut file = 0usize;
        for c in text.chars() {
            if let Some(skip) = c.to_digit(10).filter(|d| (1..=8).contains(d)) {
                file += skip as usize;
                continue;
            }
            let piece = Piece::from_fen_char(c).ok_or(FenError::InvalidPieceChar { character: c })?;
            if file >= 8 {
                return Err(FenError::BadRankLength { rank: row, length: file + 1 });
            }
            pos.add_piece(Square::new(file as u8, rank), piece);
            file += 1;
        }
        if file != 8 {
            return Err(FenError::BadRankLength { rank: row, length: file });
        }
    }
    Ok(())
}

/// The target must sit behind an enemy pawn that just double-pushed, with
/// both squares it crossed empty. A target no pawn can capture onto is
/// dropped, matching what `do_move` records.
fn parse_en_passant(pos: &Position, text: &str) -> Result<Option<Square>, FenError> {
    if text == "-" {
        return Ok(None);
    }
    let us = pos.side_to_move;
    let invalid = || FenError::InvalidEnPassant { found: text.to_string() };

    let sq = Square::from_algebraic(text)
        .filter(|sq| sq.relative_rank(us) == 5)
        .ok_or_else(invalid)?;
    let pushed_from = sq.forward(us);
    let victim = sq.forward(!us);
    if pos.piece_on(victim) != Some(Piece::new(PieceKind::Pawn, !us))
        || pos.piece_on(sq).is_some()
        || pos.piece_on(pushed_from).is_some()
    {
        return Err(invalid());
    }

    let capturable = (pawn_attacks(!us, sq) & pos.pieces_of(us, PieceKind::Pawn)).is_nonempty();
    Ok(capturable.then_some(sq))
}

fn parse_counter(field: &'static str, text: Option<&str>, default: u16) -> Result<u16, FenError> {
    match text {
        None => Ok(default),
        Some(s) => s.parse().map_err(|_| FenError::InvalidMoveCounter {
            field,
            found: s.to_string(),
        }),
    }
}

impl FromStr for Position {
    type Err = FenError;

    /// Accepts 4 to 6 fields; missing move counters read as `0 1`.
    fn from_str(fen: &str) -> Result<Position, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if !(4..=6).contains(&fields.len()) {
            return Err(FenError::WrongFieldCount { found: fields.len() });
        }

        let mut pos = Position::empty();
        parse_placement(&mut pos, fields[0])?;

        pos.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::InvalidColor { found: other.to_string() }),
        };
        pos.castling = CastleRights::from_fen(fields[2])?;
        pos.en_passant = parse_en_passant(&pos, fields[3])?;
        pos.halfmove_clock = parse_counter("halfmove clock", fields.get(4).copied(), 0)?;
        pos.fullmove_number = parse_counter("fullmove number", fields.get(5).copied(), 1)?.max(1);

        pos.validate()?;
        pos.refresh_hashes();
        Ok(pos)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0u8..8).rev() {
            let mut empty = 0;
            for file in 0u8..8 {
                match self.piece_on(Square::new(file, rank)) {
                    Some(piece) => {
                        if empty > 0 {
                            write!(f, "{empty}")?;
                            empty = 0;
                        }
                        write!(f, "{}", piece.fen_char())?;
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                write!(f, "{empty}")?;
            }
            if rank > 0 {
                f.write_str("/")?;
            }
        }

        write!(f, " {} {} ", self.side_to_move, self.castling)?;
        match self.en_passant {
            Some(sq) => write!(f, "{sq}")?,
            None => f.write_str("-")?,
        }
        write!(f, " {} {}", self.halfmove_clock, self.fullmove_number)
    }
}

#[cfg(test)]
mod tests {
    use super::STARTING_FEN;
    use crate::error::FenError;
    use crate::position::Position;
    use crate::square::Square;

    #[test]
    fn roundtrips() {
        for fen in [
            STARTING_FEN,
            "rnbqkbnr/pp1ppppp/8/2p5/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
        ] {
            let pos: Position = fen.parse().unwrap();
            assert_eq!(pos.to_string(), fen);
        }
    }

    #[test]
    fn short_fen_defaults_counters() {
        let pos: Position = "4k3/8/8/8/8/8/8/4K3 b - -".parse().unwrap();
        assert_eq!(pos.to_string(), "4k3/8/8/8/8/8/8/4K3 b - - 0 1");
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert_eq!(
            "8/8/8/8/8/8/8/8 w - - 0 1".parse::<Position>(),
            Err(FenError::InvalidKingCount { color: "white", count: 0 })
        );
        assert!(matches!(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1".parse::<Position>(),
            Err(FenError::WrongRankCount { found: 7 })
        ));
        assert!(matches!(
            "rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1".parse::<Position>(),
            Err(FenError::InvalidPieceChar { character: '9' })
        ));
        assert!(matches!(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1".parse::<Position>(),
            Err(FenError::InvalidColor { .. })
        ));
        assert!(matches!(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e4 0 1".parse::<Position>(),
            Err(FenError::InvalidEnPassant { .. })
        ));
        assert!(matches!(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - x 1".parse::<Position>(),
            Err(FenError::InvalidMoveCounter { .. })
        ));
        assert!(matches!(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq d6 0 1".parse::<Position>(),
            Err(FenError::InvalidEnPassant { .. })
        ));
        assert!(matches!("".parse::<Position>(), Err(FenError::WrongFieldCount { found: 0 })));
    }

    #[test]
    fn en_passant_needs_a_pushed_pawn() {
        for fen in [
            // no pawn behind the target
            "4k3/8/8/4P3/8/8/8/4K3 w - d6 0 1",
            // a knight where the pushed pawn should be
            "4k3/8/8/3nP3/8/8/8/4K3 w - d6 0 1",
            // target square occupied
            "4k3/8/3b4/3pP3/8/8/8/4K3 w - d6 0 1",
            // the pawn's starting square is occupied
            "4k3/3r4/8/3pP3/8/8/8/4K3 w - d6 0 1",
            "4k3/8/8/8/3N4/8/8/4K3 b - d3 0 1",
        ] {
            assert!(
                matches!(fen.parse::<Position>(), Err(FenError::InvalidEnPassant { .. })),
                "{fen}"
            );
        }
    }

    #[test]
    fn uncapturable_en_passant_is_dropped() {
        let pos: Position = "4k3/8/8/3p4/8/8/8/4K3 w - d6 0 1".parse().unwrap();
        assert_eq!(pos.en_passant(), None);
        assert_eq!(pos.to_string(), "4k3/8/8/3p4/8/8/8/4K3 w - - 0 1");

        let mut played: Position = "4k3/3p4/8/8/8/8/8/4K3 b - - 0 1".parse().unwrap();
        let mv = played.parse_move("d7d5").unwrap();
        let _ = played.do_move(mv);
        let parsed: Position = "4k3/8/8/3p4/8/8/8/4K3 w - d6 0 2".parse().unwrap();
        assert_eq!(played.hash(), parsed.hash());
    }

    #[test]
    fn capturable_en_passant_is_kept() {
        let pos: Position = "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1".parse().unwrap();
        assert_eq!(pos.en_passant(), Some(Square::D6));
    }
}
