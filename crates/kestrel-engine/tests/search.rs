//! End-to-end searches through the public `Searcher` facade.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use kestrel_core::{Position, generate_legal};
use kestrel_engine::{Bound, MATE, SearchControl, SearchInfo, SearchResult, Searcher};

const SCHOLARS_MATE_FEN: &str = "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4";

const KIWIPETE_FEN: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

const ITALIAN_FEN: &str = "r1bqk1nr/pppp1ppp/2n5/2b1p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4";

fn infinite() -> SearchControl {
    SearchControl::infinite(Arc::new(AtomicBool::new(false)))
}

fn search(searcher: &mut Searcher, fen: &str, depth: i32) -> SearchResult {
    let mut pos: Position = fen.parse().unwrap();
    searcher.search(&mut pos, depth, &infinite(), |_| {})
}

/// Search with `aspiration_min_depth` set, collecting every root report.
fn search_windowed(fen: &str, depth: i32, aspiration_min_depth: i32) -> (SearchResult, Vec<SearchInfo>) {
    let mut searcher = Searcher::new(4);
    searcher.set_param("aspiration_min_depth", aspiration_min_depth).unwrap();
    let mut pos: Position = fen.parse().unwrap();
    let mut reports = Vec::new();
    let result = searcher.search(&mut pos, depth, &infinite(), |info| reports.push(info.clone()));
    (result, reports)
}

// ── Basic correctness ─────────────────────────────────────────────────────────

#[test]
fn startpos_depth_1_is_legal_and_balanced() {
    let mut pos = Position::startpos();
    let result = Searcher::new(1).search(&mut pos, 1, &infinite(), |_| {});
    let legal = generate_legal(&mut pos);
    assert_eq!(legal.len(), 20);
    assert!(legal.contains(result.best_move));
    assert!(result.score.abs() < 100, "startpos score {} is not near 0", result.score);
}

#[test]
fn finds_scholars_mate() {
    let result = search(&mut Searcher::new(4), SCHOLARS_MATE_FEN, 4);
    assert_eq!(result.best_move.to_string(), "h5f7");
    assert_eq!(result.score, MATE - 1);
}

#[test]
fn bare_kings_are_a_draw() {
    let result = search(&mut Searcher::new(1), "8/8/4k3/8/8/3K4/8/8 w - - 0 1", 5);
    assert_eq!(result.score, 0);
    assert!(!result.best_move.is_null());
}

#[test]
fn mate_on_the_fiftieth_move_beats_the_draw() {
    let result = search(&mut Searcher::new(1), "6k1/5ppp/8/8/8/8/8/R3K3 w - - 99 80", 2);
    assert_eq!(result.best_move.to_string(), "a1a8");
    assert_eq!(result.score, MATE - 1);
}

#[test]
fn hanging_queen_is_taken() {
    let result = search(&mut Searcher::new(4), "4k3/8/8/3q4/8/8/3R4/4K3 w - - 0 1", 4);
    assert_eq!(result.best_move.to_string(), "d2d5");
}

#[test]
fn position_is_restored() {
    for fen in [KIWIPETE_FEN, ITALIAN_FEN] {
        let mut pos: Position = fen.parse().unwrap();
        let before = pos.clone();
        Searcher::new(4).search(&mut pos, 5, &infinite(), |_| {});
        assert_eq!(pos, before);
    }
}

// ── Determinism and aspiration ────────────────────────────────────────────────

#[test]
fn identical_searches_agree() {
    for fen in [ITALIAN_FEN, KIWIPETE_FEN] {
        let a = search(&mut Searcher::new(4), fen, 5);
        let b = search(&mut Searcher::new(4), fen, 5);
        assert_eq!(a.score, b.score, "{fen}");
        assert_eq!(a.pv, b.pv, "{fen}");
        assert_eq!(a.nodes, b.nodes, "{fen}");
    }
}

#[test]
fn fail_high_widens_to_the_full_window_score() {
    let (windowed, reports) = search_windowed(SCHOLARS_MATE_FEN, 1, 1);
    let (full, _) = search_windowed(SCHOLARS_MATE_FEN, 1, 128);
    assert_eq!(windowed.score, full.score);
    assert_eq!(windowed.score, MATE - 1);
    assert!(reports.iter().any(|info| info.bound == Bound::Lower));
}

#[test]
fn fail_low_widens_to_the_full_window_score() {
    let fen = "r3k3/8/8/8/8/8/8/4K3 w - - 0 1";
    let (windowed, reports) = search_windowed(fen, 1, 1);
    let (full, _) = search_windowed(fen, 1, 128);
    assert_eq!(windowed.score, full.score);
    assert!(windowed.score < -300);
    assert!(reports.iter().any(|info| info.bound == Bound::Upper));

    let last = reports.last().unwrap();
    assert_eq!(last.bound, Bound::Exact);
    assert_eq!(last.score, windowed.score);
}

/// Parameters that switch off every pruning rule whose outcome depends on
/// move order, leaving a search whose score cannot depend on the window.
const NO_PRUNING: [(&str, i32); 8] = [
    ("rfp_max_depth", 0),
    ("razor_max_depth", 0),
    ("futility_max_depth", 0),
    ("lmp_max_depth", 0),
    ("null_min_depth", 32),
    ("lmr_min_depth", 32),
    ("singular_depth", 128),
    ("iir_min_depth", 128),
];

fn unpruned_search(fen: &str, depth: i32, aspiration_min_depth: i32) -> SearchResult {
    let mut searcher = Searcher::new(4);
    for (name, value) in NO_PRUNING {
        searcher.set_param(name, value).unwrap();
    }
    searcher.set_param("aspiration_min_depth", aspiration_min_depth).unwrap();
    search(&mut searcher, fen, depth)
}

#[test]
fn seeded_windows_match_full_window_scores() {
    for fen in [ITALIAN_FEN, KIWIPETE_FEN] {
        for depth in [4, 5] {
            let windowed = unpruned_search(fen, depth, 1);
            let full = unpruned_search(fen, depth, 128);
            assert_eq!(windowed.score, full.score, "{fen} at depth {depth}");
        }
    }
}

// ── Stopping ──────────────────────────────────────────────────────────────────

#[test]
fn node_limit_is_honored() {
    let mut pos = Position::startpos();
    let control = infinite().with_node_limit(3000);
    let result = Searcher::new(1).search(&mut pos, 64, &control, |_| {});
    assert!(result.nodes <= 3072, "searched {} nodes", result.nodes);
    assert!(result.depth >= 1);
    assert!(generate_legal(&mut pos).contains(result.best_move));
}

#[test]
fn external_stop_ends_an_infinite_search() {
    let stopped = Arc::new(AtomicBool::new(false));
    let control = SearchControl::infinite(Arc::clone(&stopped));
    let stopper = {
        let stopped = Arc::clone(&stopped);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            stopped.store(true, Ordering::Relaxed);
        })
    };

    let mut pos: Position = KIWIPETE_FEN.parse().unwrap();
    let result = Searcher::new(4).search(&mut pos, 100, &control, |_| {});
    stopper.join().unwrap();

    assert!(result.depth >= 1 && result.depth < 100);
    assert!(generate_legal(&mut pos).contains(result.best_move));
}

#[test]
fn hard_limit_ends_the_search() {
    let control = SearchControl::timed(
        Arc::new(AtomicBool::new(false)),
        Duration::from_millis(20),
        Duration::from_millis(50),
    );
    let mut pos: Position = KIWIPETE_FEN.parse().unwrap();
    let start = Instant::now();
    let result = Searcher::new(4).search(&mut pos, 100, &control, |_| {});
    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(!result.best_move.is_null());
}

#[test]
fn already_stopped_still_completes_depth_1() {
    let stopped = Arc::new(AtomicBool::new(true));
    let control = SearchControl::infinite(stopped);
    let mut pos: Position = ITALIAN_FEN.parse().unwrap();
    let result = Searcher::new(1).search(&mut pos, 10, &control, |_| {});
    assert_eq!(result.depth, 1);
    assert!(generate_legal(&mut pos).contains(result.best_move));
}
