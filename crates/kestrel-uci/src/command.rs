//! Protocol command parsing.

use std::str::FromStr;
use std::time::Duration;

use kestrel_core::Position;
use kestrel_engine::SearchLimits;

use crate::error::UciError;

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `uci`: identify the engine and list its options.
    Uci,
    /// `isready`: synchronization ping.
    IsReady,
    /// `ucinewgame`: forget the previous game.
    UciNewGame,
    /// `position`: the final position after any `moves` were played. The
    /// played moves stay in its history for repetition detection.
    Position(Box<Position>),
    /// `go`: start searching.
    Go(SearchLimits),
    /// `setoption name <name> [value <value>]`.
    SetOption { name: String, value: Option<String> },
    /// `ponderhit`: the opponent played the move being pondered on.
    PonderHit,
    /// `stop`: end the current search.
    Stop,
    /// `quit`: leave the event loop.
    Quit,
    /// `d`: print the board.
    Display,
    /// `perft <depth>`: per-move leaf counts of the current position.
    Perft(u32),
    /// Unrecognized command, ignored.
    Unknown(String),
}

/// Parse one line of input into a [`Command`].
pub fn parse_command(line: &str) -> Result<Command, UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&keyword, args)) = tokens.split_first() else {
        return Ok(Command::Unknown(String::new()));
    };

    match keyword {
        "uci" => Ok(Command::Uci),
        "isready" => Ok(Command::IsReady),
        "ucinewgame" => Ok(Command::UciNewGame),
        "stop" => Ok(Command::Stop),
        "quit" => Ok(Command::Quit),
        "ponderhit" => Ok(Command::PonderHit),
        "d" => Ok(Command::Display),
        "perft" => Ok(Command::Perft(parse_value(args.first(), "perft")?)),
        "position" => parse_position(args),
        "go" => parse_go(args),
        "setoption" => parse_setoption(args),
        other => Ok(Command::Unknown(other.to_string())),
    }
}

/// `position startpos [moves ...]` or `position fen <4 to 6 fields> [moves ...]`.
fn parse_position(tokens: &[&str]) -> Result<Command, UciError> {
    let moves_at = tokens.iter().position(|&t| t == "moves").unwrap_or(tokens.len());
    let (setup, moves) = tokens.split_at(moves_at);

    let mut pos = match setup.split_first() {
        Some((&"startpos", [])) => Position::startpos(),
        Some((&"fen", fields)) => fields.join(" ").parse::<Position>()?,
        _ => return Err(UciError::MalformedPosition),
    };

    for text in moves.iter().skip(1) {
        let mv = pos.parse_move(text)?;
        let _ = pos.do_move(mv);
    }

    Ok(Command::Position(Box::new(pos)))
}

/// Every `go` keyword. Unknown tokens are skipped.
fn parse_go(tokens: &[&str]) -> Result<Command, UciError> {
    let mut limits = SearchLimits::default();

    let mut i = 0;
    while i < tokens.len() {
        let value = tokens.get(i + 1);
        let mut consumed = 2;
        match tokens[i] {
            "wtime" => limits.wtime = Some(parse_millis(value, "wtime")?),
            "btime" => limits.btime = Some(parse_millis(value, "btime")?),
            "winc" => limits.winc = Some(parse_millis(value, "winc")?),
            "binc" => limits.binc = Some(parse_millis(value, "binc")?),
            "movetime" => limits.movetime = Some(parse_millis(value, "movetime")?),
            "movestogo" => limits.movestogo = Some(parse_value(value, "movestogo")?),
            "depth" => limits.depth = Some(parse_value(value, "depth")?),
            "nodes" => limits.nodes = Some(parse_value(value, "nodes")?),
            "infinite" => {
                limits.infinite = true;
                consumed = 1;
            }
            "ponder" => {
                limits.ponder = true;
                consumed = 1;
            }
            _ => consumed = 1,
        }
        i += consumed;
    }

    Ok(Command::Go(limits))
}

/// Option names may contain spaces (`Clear Hash`), so the name runs up to
/// `value` and the value runs to the end of the line.
fn parse_setoption(tokens: &[&str]) -> Result<Command, UciError> {
    let Some((&"name", rest)) = tokens.split_first() else {
        return Err(UciError::MalformedOption);
    };
    let value_at = rest.iter().position(|&t| t == "value").unwrap_or(rest.len());
    let (name, value) = rest.split_at(value_at);
    if name.is_empty() {
        return Err(UciError::MalformedOption);
    }

    let value = match value {
        [] => None,
        [_] => return Err(UciError::MissingValue { param: name.join(" ") }),
        [_, words @ ..] => Some(words.join(" ")),
    };
    Ok(Command::SetOption { name: name.join(" "), value })
}

/// Milliseconds, as used by every clock keyword. Negative clocks happen
/// in practice and read as zero.
fn parse_millis(token: Option<&&str>, param: &str) -> Result<Duration, UciError> {
    let ms: i64 = parse_value(token, param)?;
    Ok(Duration::from_millis(ms.max(0) as u64))
}

fn parse_value<T: FromStr>(token: Option<&&str>, param: &str) -> Result<T, UciError> {
    let value = token.ok_or_else(|| UciError::MissingValue { param: param.to_string() })?;
    value.parse().map_err(|_| UciError::InvalidValue {
        param: param.to_string(),
        value: value.to_string(),
    })
}
