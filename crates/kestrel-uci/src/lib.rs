//! Text protocol front end for kestrel.

pub mod command;
pub mod engine;
pub mod error;

pub use command::{Command, parse_command};
pub use engine::{EngineOptions, UciEngine};
pub use error::UciError;
