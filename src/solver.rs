//! The top-level entry points for filling a crossword: enforce node consistency, establish arc
//! consistency across the whole grid, and then search.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::arc_consistency::ac3;
use crate::backtracking_search::{FillFailure, FillSuccess, Search, Statistics};
use crate::domains::DomainStore;
use crate::grid_config::Crossword;
use crate::types::Assignment;

/// Options controlling a single fill attempt.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Give up with `FillFailure::Timeout` once this much time has passed.
    pub timeout: Option<Duration>,

    /// Give up with `FillFailure::Abort` once this flag is set, e.g. from another thread.
    pub abort: Option<Arc<AtomicBool>>,

    /// Try words in least-constraining-value order, rather than word list order.
    pub order_values: bool,

    /// Propagate each tentative choice with AC-3 before searching deeper.
    pub maintain_arc_consistency: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            timeout: None,
            abort: None,
            order_values: true,
            maintain_arc_consistency: true,
        }
    }
}

/// Search for a complete, valid fill of the given crossword.
pub fn find_fill(crossword: &Crossword, config: &SolverConfig) -> Result<FillSuccess, FillFailure> {
    let start = Instant::now();
    let deadline = config.timeout.map(|timeout| start + timeout);

    let mut domains = DomainStore::new(crossword);
    domains.enforce_node_consistency(crossword);

    let ac3_start = Instant::now();
    let ac3_result = ac3(crossword, &mut domains, None);
    let initial_arc_consistency_time = ac3_start.elapsed();

    match ac3_result {
        Ok(success) => log::debug!(
            "Initial arc consistency removed {} options in {initial_arc_consistency_time:?}",
            success.eliminations,
        ),
        Err(failure) => {
            log::info!(
                "Grid is unfillable: no options left for {}",
                crossword.variable(failure.wiped_out),
            );
            return Err(FillFailure::HardFailure);
        }
    }

    // Nothing before this point needs to be undone during search.
    domains.commit();

    let mut search = Search::new(crossword, domains, config, deadline);
    let result = search.backtrack(Assignment::new(crossword.variables.len()));

    let statistics = Statistics {
        total_time: start.elapsed(),
        initial_arc_consistency_time,
        ..search.into_statistics()
    };

    match result {
        Ok(Some(assignment)) => {
            log::info!(
                "Filled grid in {:?} ({} states, {} backtracks)",
                statistics.total_time,
                statistics.states,
                statistics.backtracks,
            );
            Ok(FillSuccess {
                statistics,
                assignment,
            })
        }
        Ok(None) => {
            log::info!(
                "Search exhausted after {} states ({} backtracks)",
                statistics.states,
                statistics.backtracks,
            );
            Err(FillFailure::HardFailure)
        }
        Err(failure) => {
            log::info!("Search stopped after {} states: {failure}", statistics.states);
            Err(failure)
        }
    }
}

/// Fill the given crossword with the default options, returning `None` if it can't be filled.
#[must_use]
pub fn solve(crossword: &Crossword) -> Option<Assignment> {
    find_fill(crossword, &SolverConfig::default())
        .ok()
        .map(|success| success.assignment)
}
