//! Search and evaluation for kestrel.

mod error;
pub mod eval;
pub mod search;
pub mod time;

pub use error::ParamError;
pub use eval::{EVAL_LIMIT, Evaluator};
pub use search::control::SearchControl;
pub use search::params::SearchParams;
pub use search::tt::{Bound, TranspositionTable};
pub use search::{INF, MATE, MATE_BOUND, MAX_PLY, SearchInfo, SearchResult, Searcher, mate_in};
pub use time::{SearchLimits, compute_limits, control_for};
