//! Tunable search constants.
//!
//! Every pruning, reduction and extension threshold lives here so it can be
//! changed at runtime (`setoption name <field> value <n>`) without touching
//! the search itself.

use crate::error::ParamError;

/// Name, default and accepted range of one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub default: i32,
    pub min: i32,
    pub max: i32,
}

macro_rules! search_params {
    ($($(#[$doc:meta])* $name:ident = $default:expr, $min:expr, $max:expr;)*) => {
        /// Search tuning, one `i32` per knob.
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct SearchParams {
            $($(#[$doc])* pub $name: i32,)*
        }

        impl Default for SearchParams {
            fn default() -> Self {
                SearchParams { $($name: $default,)* }
            }
        }

        impl SearchParams {
            pub const SPECS: &'static [ParamSpec] = &[
                $(ParamSpec { name: stringify!($name), default: $default, min: $min, max: $max },)*
            ];

            /// Current value of the parameter called `name` (ASCII case-insensitive).
            pub fn get(&self, name: &str) -> Option<i32> {
                $(if name.eq_ignore_ascii_case(stringify!($name)) {
                    return Some(self.$name);
                })*
                None
            }

            /// Change one parameter by name. The value is rejected, and the
            /// parameter left alone, when it falls outside the accepted range.
            pub fn set(&mut self, name: &str, value: i32) -> Result<(), ParamError> {
                $(if name.eq_ignore_ascii_case(stringify!($name)) {
                    if !($min..=$max).contains(&value) {
                        return Err(ParamError::OutOfRange {
                            name: stringify!($name),
                            value,
                            min: $min,
                            max: $max,
                        });
                    }
                    self.$name = value;
                    return Ok(());
                })*
                Err(ParamError::Unknown { name: name.to_string() })
            }
        }
    };
}

search_params! {
    /// Reverse futility: prune when `eval - rfp_margin * depth > beta`.
    rfp_margin = 135, 0, 1000;
    rfp_max_depth = 6, 0, 32;

    /// Razoring: drop into quiescence when `eval + razor_margin * depth < alpha`.
    razor_margin = 300, 0, 2000;
    razor_max_depth = 3, 0, 16;

    null_min_depth = 2, 1, 32;
    /// Null move reduction is `base + depth / divisor`, one more when the
    /// static eval beats beta by at least `null_eval_margin`.
    null_base_reduction = 4, 1, 16;
    null_depth_divisor = 6, 1, 32;
    null_eval_margin = 200, 0, 2000;
    /// Null move cutoffs with a remaining depth above this are re-searched
    /// without the null move before being trusted.
    null_verify_depth = 6, 1, 128;

    /// Nodes deeper than this with no hash move lose one ply.
    iir_min_depth = 5, 1, 128;

    singular_depth = 7, 1, 128;
    /// The alternatives must reach `tt_score - singular_margin` to deny the
    /// extension.
    singular_margin = 50, 0, 1000;

    /// Checking moves are extended in PV nodes and at depths up to this.
    check_extension_depth = 4, 0, 128;

    futility_margin = 100, 0, 2000;
    futility_max_depth = 6, 0, 32;

    /// Late move pruning keeps `lmp_base + depth * depth` quiet moves.
    lmp_base = 3, 0, 256;
    lmp_max_depth = 8, 0, 32;

    lmr_min_depth = 3, 1, 32;
    lmr_min_moves = 3, 1, 64;
    /// LMR table coefficients in hundredths:
    /// `base / 100 + ln(depth) * ln(moves) * 100 / divisor`.
    lmr_base = 75, 0, 500;
    lmr_divisor = 225, 50, 1000;
    lmr_pv_base = 25, 0, 500;
    lmr_pv_divisor = 300, 50, 1000;

    aspiration_min_depth = 4, 1, 128;
    aspiration_delta = 25, 1, 1000;
    /// Past this half-width the aspiration window is dropped for a full one.
    aspiration_max = 500, 1, 32000;
}

const LMR_SIZE: usize = 64;

/// Late move reductions by node type, depth and move number.
pub struct LmrTable {
    table: Box<[[[i32; LMR_SIZE]; LMR_SIZE]; 2]>,
}

impl LmrTable {
    pub fn new(params: &SearchParams) -> LmrTable {
        let mut table = Box::new([[[0; LMR_SIZE]; LMR_SIZE]; 2]);
        let coefficients = [
            (params.lmr_base, params.lmr_divisor),
            (params.lmr_pv_base, params.lmr_pv_divisor),
        ];
        for (pv, &(base, divisor)) in coefficients.iter().enumerate() {
            for depth in 1..LMR_SIZE {
                for moves in 1..LMR_SIZE {
                    let r = base as f64 / 100.0
                        + (depth as f64).ln() * (moves as f64).ln() * 100.0 / divisor as f64;
                    table[pv][depth][moves] = r.max(0.0) as i32;
                }
            }
        }
        LmrTable { table }
    }

    /// Plies to reduce the `moves`-th move at `depth`.
    pub fn reduction(&self, pv: bool, depth: i32, moves: usize) -> i32 {
        let depth = depth.clamp(0, LMR_SIZE as i32 - 1) as usize;
        self.table[usize::from(pv)][depth][moves.min(LMR_SIZE - 1)]
    }
}

impl std::fmt::Debug for LmrTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LmrTable")
            .field("scout_max", &self.table[0][LMR_SIZE - 1][LMR_SIZE - 1])
            .field("pv_max", &self.table[1][LMR_SIZE - 1][LMR_SIZE - 1])
            .finish()
    }
}
