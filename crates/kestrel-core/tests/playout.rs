//! Random games checking that make/unmake is exact and hashes never drift.

use kestrel_core::zobrist::hashes_from_scratch;
use kestrel_core::{Position, generate_legal};

/// Small deterministic generator so failures reproduce.
struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }
}

const OPENINGS: [&str; 3] = [
    kestrel_core::STARTING_FEN,
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
];

#[test]
fn every_move_undoes_exactly() {
    let mut rng = XorShift(0x9E37_79B9_7F4A_7C15);
    for fen in OPENINGS {
        for _ in 0..20 {
            let mut pos: Position = fen.parse().unwrap();
            for _ in 0..80 {
                let moves = generate_legal(&mut pos);
                if moves.is_empty() {
                    break;
                }
                for &mv in moves.iter() {
                    let before = pos.clone();
                    let undo = pos.do_move(mv);
                    assert_eq!(hashes_from_scratch(&pos), (pos.hash(), pos.pawn_king_hash()), "{mv} from {before}");
                    pos.undo_move(mv, undo);
                    assert_eq!(pos, before, "undo of {mv} from {before}");
                }
                let pick = moves.as_slice()[(rng.next() % moves.len() as u64) as usize];
                let _ = pos.do_move(pick);
            }
        }
    }
}

#[test]
fn null_moves_undo_exactly() {
    let mut rng = XorShift(42);
    let mut pos = Position::startpos();
    for _ in 0..60 {
        let moves = generate_legal(&mut pos);
        if moves.is_empty() {
            break;
        }
        if !pos.in_check() {
            let before = pos.clone();
            let undo = pos.do_null();
            assert_eq!(hashes_from_scratch(&pos), (pos.hash(), pos.pawn_king_hash()));
            assert_ne!(pos.hash(), before.hash());
            pos.undo_null(undo);
            assert_eq!(pos, before);
        }
        let pick = moves.as_slice()[(rng.next() % moves.len() as u64) as usize];
        let _ = pos.do_move(pick);
    }
}

#[test]
fn fen_survives_random_games() {
    let mut rng = XorShift(7);
    let mut pos = Position::startpos();
    for _ in 0..100 {
        let moves = generate_legal(&mut pos);
        if moves.is_empty() {
            break;
        }
        let pick = moves.as_slice()[(rng.next() % moves.len() as u64) as usize];
        let _ = pos.do_move(pick);
        let reparsed: Position = pos.to_string().parse().unwrap();
        assert_eq!(reparsed.hash(), pos.hash(), "{pos}");
        assert_eq!(reparsed.to_string(), pos.to_string());
    }
}
