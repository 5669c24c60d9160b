use kestrel_core::{Position, perft};

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
const POSITION_3: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
const POSITION_4: &str = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";
const POSITION_5: &str = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";

fn count(fen: &str, depth: u32) -> u64 {
    let mut pos: Position = fen.parse().unwrap();
    let before = pos.clone();
    let nodes = perft(&mut pos, depth);
    assert_eq!(pos, before, "perft left the position modified");
    nodes
}

#[test]
fn startpos() {
    let mut pos = Position::startpos();
    assert_eq!(perft(&mut pos, 1), 20);
    assert_eq!(perft(&mut pos, 2), 400);
    assert_eq!(perft(&mut pos, 3), 8_902);
    assert_eq!(perft(&mut pos, 4), 197_281);
}

#[test]
#[ignore] // slow
fn startpos_depth_5() {
    assert_eq!(perft(&mut Position::startpos(), 5), 4_865_609);
}

#[test]
fn kiwipete() {
    assert_eq!(count(KIWIPETE, 1), 48);
    assert_eq!(count(KIWIPETE, 2), 2_039);
    assert_eq!(count(KIWIPETE, 3), 97_862);
}

#[test]
#[ignore] // slow
fn kiwipete_depth_4() {
    assert_eq!(count(KIWIPETE, 4), 4_085_603);
}

#[test]
fn position_3() {
    assert_eq!(count(POSITION_3, 1), 14);
    assert_eq!(count(POSITION_3, 2), 191);
    assert_eq!(count(POSITION_3, 3), 2_812);
    assert_eq!(count(POSITION_3, 4), 43_238);
}

#[test]
#[ignore] // slow
fn position_3_depth_5() {
    assert_eq!(count(POSITION_3, 5), 674_624);
}

#[test]
fn position_4() {
    assert_eq!(count(POSITION_4, 1), 6);
    assert_eq!(count(POSITION_4, 2), 264);
    assert_eq!(count(POSITION_4, 3), 9_467);
}

#[test]
#[ignore] // slow
fn position_4_depth_4() {
    assert_eq!(count(POSITION_4, 4), 422_333);
}

#[test]
fn position_5() {
    assert_eq!(count(POSITION_5, 1), 44);
    assert_eq!(count(POSITION_5, 2), 1_486);
    assert_eq!(count(POSITION_5, 3), 62_379);
}

#[test]
#[ignore] // slow
fn position_5_depth_4() {
    assert_eq!(count(POSITION_5, 4), 2_103_487);
}
