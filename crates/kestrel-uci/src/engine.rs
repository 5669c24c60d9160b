//! Event-driven engine loop with pondering support.
//!
//! The main thread owns all state and reacts to events: parsed input lines
//! from a reader thread, and finished searches from the search thread. While
//! a search runs, the [`Searcher`] lives on the search thread and comes back
//! with the result; option changes that need it are deferred until then.

use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Instant;

use kestrel_core::{Position, divide};
use kestrel_engine::{
    Bound, MAX_PLY, SearchControl, SearchInfo, SearchLimits, SearchParams, SearchResult, Searcher,
    control_for, mate_in,
};
use tracing::{debug, info, warn};

use crate::command::{Command, parse_command};
use crate::error::UciError;

pub const HASH_DEFAULT: usize = 16;
pub const HASH_MIN: usize = 1;
pub const HASH_MAX: usize = 4096;

/// The search recurses once per ply and keeps move lists on the stack.
const SEARCH_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Knobs adjustable through `setoption` that are not search parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Transposition table size in MiB.
    pub hash_mb: usize,
    pub ponder: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            hash_mb: HASH_DEFAULT,
            ponder: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Idle,
    Searching,
    Pondering,
}

enum EngineEvent {
    Command(Result<Command, UciError>),
    SearchDone(SearchDone),
    InputClosed,
}

/// Sent by the search thread when it finishes, handing the searcher back.
struct SearchDone {
    result: SearchResult,
    searcher: Searcher,
}

pub struct UciEngine {
    position: Position,
    /// `None` while the search thread has it.
    searcher: Option<Searcher>,
    state: EngineState,
    /// `go infinite`: the best move waits for `stop`.
    infinite: bool,
    /// A result that finished before `stop` or `ponderhit` allowed it out.
    held: Option<SearchResult>,
    stop_flag: Arc<AtomicBool>,
    control: Option<Arc<SearchControl>>,
    options: EngineOptions,
    pending_resize: Option<usize>,
    pending_clear: bool,
    pending_new_game: bool,
}

impl UciEngine {
    pub fn new() -> UciEngine {
        UciEngine::with_options(EngineOptions::default())
    }

    pub fn with_options(options: EngineOptions) -> UciEngine {
        UciEngine {
            position: Position::startpos(),
            searcher: Some(Searcher::new(options.hash_mb)),
            state: EngineState::Idle,
            infinite: false,
            held: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
            control: None,
            options,
            pending_resize: None,
            pending_clear: false,
            pending_new_game: false,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Read stdin until `quit` or end of input.
    pub fn run(mut self) -> Result<(), UciError> {
        let (tx, rx) = mpsc::channel::<EngineEvent>();

        let input = tx.clone();
        thread::Builder::new().name("stdin".to_string()).spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                debug!(command = line, "received");
                if input.send(EngineEvent::Command(parse_command(line))).is_err() {
                    return;
                }
            }
            let _ = input.send(EngineEvent::InputClosed);
        })?;

        for event in &rx {
            match event {
                EngineEvent::Command(Ok(Command::Quit)) | EngineEvent::InputClosed => {
                    self.shut_down(&rx);
                    break;
                }
                EngineEvent::Command(Ok(command)) => {
                    if let Err(error) = self.handle(command, &tx) {
                        warn!(%error, "command failed");
                    }
                }
                EngineEvent::Command(Err(error)) => warn!(%error, "unparsable command"),
                EngineEvent::SearchDone(done) => self.finish_search(done),
            }
        }

        info!("kestrel shutting down");
        Ok(())
    }

    fn handle(&mut self, command: Command, tx: &mpsc::Sender<EngineEvent>) -> Result<(), UciError> {
        match command {
            Command::Uci => print_id(),
            Command::IsReady => println!("readyok"),
            Command::UciNewGame => self.new_game(),
            Command::Position(pos) => self.position = *pos,
            Command::Go(limits) => self.go(limits, tx)?,
            Command::SetOption { name, value } => self.set_option(&name, value.as_deref())?,
            Command::PonderHit => self.ponder_hit(),
            Command::Stop => self.stop(),
            Command::Display => println!("{}", self.position.pretty()),
            Command::Perft(depth) => self.perft(depth),
            Command::Quit => {}
            Command::Unknown(keyword) => {
                if !keyword.is_empty() {
                    debug!(keyword = %keyword, "ignoring unknown command");
                }
            }
        }
        Ok(())
    }

    fn new_game(&mut self) {
        self.position = Position::startpos();
        match self.searcher.as_mut() {
            Some(searcher) => searcher.new_game(),
            None => self.pending_new_game = true,
        }
    }

    fn set_option(&mut self, name: &str, value: Option<&str>) -> Result<(), UciError> {
        let required = || {
            value.ok_or_else(|| UciError::MissingValue {
                param: name.to_string(),
            })
        };
        let invalid = |text: &str| UciError::InvalidValue {
            param: name.to_string(),
            value: text.to_string(),
        };

        if name.eq_ignore_ascii_case("Hash") {
            let text = required()?;
            let mb = text
                .parse::<usize>()
                .ok()
                .filter(|mb| (HASH_MIN..=HASH_MAX).contains(mb))
                .ok_or_else(|| invalid(text))?;
            self.options.hash_mb = mb;
            match self.searcher.as_mut() {
                Some(searcher) => searcher.resize_tt(mb),
                None => self.pending_resize = Some(mb),
            }
        } else if name.eq_ignore_ascii_case("Clear Hash") {
            match self.searcher.as_ref() {
                Some(searcher) => searcher.clear_tt(),
                None => self.pending_clear = true,
            }
        } else if name.eq_ignore_ascii_case("Ponder") {
            let text = required()?;
            self.options.ponder = match text.to_ascii_lowercase().as_str() {
                "true" => true,
                "false" => false,
                _ => return Err(invalid(text)),
            };
        } else {
            let text = required()?;
            let parsed: i32 = text.parse().map_err(|_| invalid(text))?;
            let searcher = self.searcher.as_mut().ok_or_else(|| UciError::Busy {
                name: name.to_string(),
            })?;
            searcher.set_param(name, parsed)?;
        }

        debug!(name, value, "option set");
        Ok(())
    }

    fn go(&mut self, limits: SearchLimits, tx: &mpsc::Sender<EngineEvent>) -> Result<(), UciError> {
        if self.state != EngineState::Idle {
            warn!("go received while searching, ignoring");
            return Ok(());
        }
        let Some(mut searcher) = self.searcher.take() else {
            warn!("searcher unavailable, ignoring go");
            return Ok(());
        };

        self.stop_flag = Arc::new(AtomicBool::new(false));
        let control = Arc::new(control_for(&limits, &self.position, Arc::clone(&self.stop_flag)));
        let max_depth = limits.depth.unwrap_or(MAX_PLY as i32);
        debug!(?limits, ?control, "starting search");

        let mut pos = self.position.clone();
        let worker_control = Arc::clone(&control);
        let tx = tx.clone();
        let spawned = thread::Builder::new()
            .name("search".to_string())
            .stack_size(SEARCH_STACK_SIZE)
            .spawn(move || {
                let result = searcher.search(&mut pos, max_depth, &worker_control, |info| {
                    println!("{}", format_info(info));
                });
                let _ = tx.send(EngineEvent::SearchDone(SearchDone { result, searcher }));
            });
        if let Err(error) = spawned {
            self.searcher = Some(Searcher::new(self.options.hash_mb));
            return Err(error.into());
        }

        self.state = if limits.ponder {
            EngineState::Pondering
        } else {
            EngineState::Searching
        };
        self.infinite = limits.infinite;
        self.control = Some(control);
        Ok(())
    }

    fn ponder_hit(&mut self) {
        if self.state != EngineState::Pondering {
            warn!("ponderhit received while not pondering, ignoring");
            return;
        }
        if let Some(control) = &self.control {
            control.activate();
        }
        self.state = EngineState::Searching;

        if !self.infinite {
            if let Some(result) = self.held.take() {
                self.emit(result);
            }
        }
    }

    fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::Release);
        if let Some(result) = self.held.take() {
            self.emit(result);
        }
    }

    fn finish_search(&mut self, done: SearchDone) {
        let mut searcher = done.searcher;
        if std::mem::take(&mut self.pending_new_game) {
            searcher.new_game();
        }
        if let Some(mb) = self.pending_resize.take() {
            searcher.resize_tt(mb);
            self.pending_clear = false;
        } else if std::mem::take(&mut self.pending_clear) {
            searcher.clear_tt();
        }
        self.searcher = Some(searcher);

        let stopped = self.stop_flag.load(Ordering::Acquire);
        let must_wait = self.state == EngineState::Pondering || self.infinite;
        if must_wait && !stopped {
            debug!("search finished early, holding the best move");
            self.held = Some(done.result);
            return;
        }
        self.emit(done.result);
    }

    fn emit(&mut self, result: SearchResult) {
        println!("{}", format_bestmove(&result));
        self.state = EngineState::Idle;
        self.infinite = false;
        self.control = None;
    }

    fn perft(&mut self, depth: u32) {
        if self.state != EngineState::Idle {
            warn!("perft received while searching, ignoring");
            return;
        }
        let start = Instant::now();
        let mut pos = self.position.clone();
        let counts = divide(&mut pos, depth);
        let total: u64 = counts.iter().map(|(_, nodes)| nodes).sum();
        for (mv, nodes) in &counts {
            println!("{mv}: {nodes}");
        }
        println!();
        println!("Nodes searched: {total}");
        debug!(depth, total, elapsed_ms = start.elapsed().as_millis() as u64, "perft");
    }

    /// Stop any running search and wait for its result.
    fn shut_down(&mut self, rx: &mpsc::Receiver<EngineEvent>) {
        if self.searcher.is_some() {
            return;
        }
        self.stop();
        for event in rx {
            if let EngineEvent::SearchDone(done) = event {
                self.finish_search(done);
                break;
            }
        }
    }
}

impl Default for UciEngine {
    fn default() -> Self {
        UciEngine::new()
    }
}

fn print_id() {
    println!("id name kestrel {}", env!("CARGO_PKG_VERSION"));
    println!("id author the kestrel developers");
    for line in option_lines() {
        println!("{line}");
    }
    println!("uciok");
}

/// `option` declarations: engine options, then every search parameter.
pub fn option_lines() -> Vec<String> {
    let mut lines = vec![
        format!("option name Hash type spin default {HASH_DEFAULT} min {HASH_MIN} max {HASH_MAX}"),
        "option name Clear Hash type button".to_string(),
        "option name Ponder type check default false".to_string(),
    ];
    lines.extend(SearchParams::SPECS.iter().map(|spec| {
        format!(
            "option name {} type spin default {} min {} max {}",
            spec.name, spec.default, spec.min, spec.max
        )
    }));
    lines
}

/// One `info` line for a root report.
pub fn format_info(info: &SearchInfo) -> String {
    let score = match mate_in(info.score) {
        Some(moves) => format!("mate {moves}"),
        None => format!("cp {}", info.score),
    };
    let bound = match info.bound {
        Bound::Exact => "",
        Bound::Lower => " lowerbound",
        Bound::Upper => " upperbound",
    };

    let mut line = format!(
        "info depth {} seldepth {} score {score}{bound} nodes {} nps {} time {} hashfull {}",
        info.depth,
        info.seldepth,
        info.nodes,
        info.nps,
        info.elapsed.as_millis(),
        info.hashfull,
    );
    if !info.pv.is_empty() {
        line.push_str(" pv");
        for mv in &info.pv {
            line.push(' ');
            line.push_str(&mv.to_string());
        }
    }
    line
}

/// The final `bestmove` line. A root without moves answers `0000`.
pub fn format_bestmove(result: &SearchResult) -> String {
    match result.ponder_move {
        Some(reply) if !result.best_move.is_null() && !reply.is_null() => {
            format!("bestmove {} ponder {reply}", result.best_move)
        }
        _ => format!("bestmove {}", result.best_move),
    }
}
