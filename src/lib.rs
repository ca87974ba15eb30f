//! Fill crossword grids by treating them as constraint satisfaction problems: slots are variables,
//! candidate words are their domains, and crossings are binary constraints. Solving enforces node
//! consistency, establishes arc consistency with AC-3, and then runs a backtracking search ordered
//! by the MRV, degree, and least-constraining-value heuristics.

pub mod arc_consistency;
pub mod backtracking_search;
pub mod domains;
pub mod grid_config;
pub mod image_export;
pub mod solver;
pub mod types;
pub mod util;
pub mod word_list;

pub use backtracking_search::{FillFailure, FillSuccess, Statistics};
pub use grid_config::{Crossword, Direction, GridError, Variable};
pub use image_export::{render_image, save_image, ImageExportError};
pub use solver::{find_fill, solve, SolverConfig};
pub use types::{Assignment, VariableId, WordId};
pub use word_list::{WordList, WordListError};

pub const LOG_FILL_PROCESS: bool = cfg!(feature = "log_fill_process");
pub const CHECK_INVARIANTS: bool = cfg!(feature = "check_invariants");

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 21;

/// The expected maximum number of neighbors for a single slot (one per cell).
pub const MAX_NEIGHBOR_COUNT: usize = MAX_SLOT_LENGTH;
