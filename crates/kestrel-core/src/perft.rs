//! Perft: exhaustive legal move counting, the move generator's test oracle.

use tracing::debug;

use crate::move_list::MoveList;
use crate::movegen::{fill_noisy, fill_quiet, generate_legal};
use crate::position::Position;

/// Count leaf nodes `depth` plies below `pos`.
///
/// Depth 0 counts the position itself. The position is restored on return.
pub fn perft(pos: &mut Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut moves = MoveList::new();
    fill_noisy(pos, &mut moves);
    fill_quiet(pos, &mut moves);

    let mut nodes = 0;
    for &mv in moves.iter() {
        let undo = pos.do_move(mv);
        if !pos.own_king_in_check() {
            nodes += if depth == 1 { 1 } else { perft(pos, depth - 1) };
        }
        pos.undo_move(mv, undo);
    }
    nodes
}

/// Per-root-move node counts, sorted by move text.
pub fn divide(pos: &mut Position, depth: u32) -> Vec<(String, u64)> {
    let moves = generate_legal(pos);
    let mut results: Vec<(String, u64)> = moves
        .iter()
        .map(|&mv| {
            let undo = pos.do_move(mv);
            let count = perft(pos, depth.saturating_sub(1));
            pos.undo_move(mv, undo);
            debug!(%mv, count, "divide");
            (mv.to_string(), count)
        })
        .collect();
    results.sort();
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_zero_is_one() {
        assert_eq!(perft(&mut Position::startpos(), 0), 1);
    }

    #[test]
    fn shallow_startpos() {
        let mut pos = Position::startpos();
        assert_eq!(perft(&mut pos, 1), 20);
        assert_eq!(perft(&mut pos, 2), 400);
        assert_eq!(pos, Position::startpos());
    }

    #[test]
    fn divide_sums_to_perft() {
        let mut pos = Position::startpos();
        let split = divide(&mut pos, 3);
        assert_eq!(split.len(), 20);
        assert_eq!(split.iter().map(|(_, n)| n).sum::<u64>(), 8_902);
        assert_eq!(split[0].0, "a2a3");
    }

    #[test]
    fn en_passant_pin_is_respected() {
        // The b5 pawn may not take en passant: both pawns leave the rank
        // and the h5 rook hits the a5 king.
        let mut pos: Position = "8/8/8/KPp4r/8/8/8/4k3 w - c6 0 1".parse().unwrap();
        let moves = generate_legal(&mut pos);
        assert!(moves.iter().all(|mv| !mv.is_en_passant()));
    }
}
