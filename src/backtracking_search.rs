//! This module implements grid-filling using a depth-first backtracking search. Variables are
//! chosen with the minimum-remaining-values heuristic, breaking ties by degree (the number of
//! crossing slots) and then by variable order. Words are tried in least-constraining-value order:
//! the word that rules out the fewest options for the crossing slots goes first.
//!
//! After each tentative choice we can optionally maintain arc consistency: the chosen slot's
//! domain is reduced to the chosen word, that word is removed from every other open slot, and
//! AC-3 propagates the consequences. All of these removals go onto the domain store's trail, so a
//! failed branch is undone by restoring the checkpoint taken before the choice.

use std::cmp::Reverse;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::arc_consistency::{ac3, arcs_into, ConstraintArc};
use crate::domains::DomainStore;
use crate::grid_config::Crossword;
use crate::solver::SolverConfig;
use crate::types::{Assignment, VariableId, WordId};
use crate::util::{build_letter_counts, count_compatible};
use crate::{CHECK_INVARIANTS, LOG_FILL_PROCESS};

/// How many states should we visit between checks of our deadline and abort flag?
pub const INTERRUPT_FREQUENCY: usize = 10;

/// A struct tracking stats about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    /// The number of calls to `backtrack`, i.e. partial assignments visited.
    pub states: usize,

    /// The number of tentative choices that were undone.
    pub backtracks: usize,

    /// The number of tentative choices rejected by propagation rather than by deeper search.
    pub propagation_failures: usize,

    pub total_time: Duration,
    pub initial_arc_consistency_time: Duration,
    pub search_time: Duration,
}

/// A struct representing the results of a successful fill operation.
#[derive(Debug)]
pub struct FillSuccess {
    pub statistics: Statistics,
    pub assignment: Assignment,
}

/// The ways a fill operation can end without a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FillFailure {
    /// Every possibility was exhausted: the grid has no valid fill.
    #[error("no solution")]
    HardFailure,

    #[error("timed out")]
    Timeout,

    #[error("aborted")]
    Abort,
}

/// Is the given assignment consistent? That is: no word is used twice, every word fits its slot,
/// and every pair of assigned crossing slots agrees on their shared letter.
#[must_use]
pub fn consistent(crossword: &Crossword, assignment: &Assignment) -> bool {
    // Lengths first, so the crossing checks below can't read past the end of a word.
    let lengths_match = assignment.iter().all(|(variable_id, word_id)| {
        crossword.word(word_id).len() == crossword.variable(variable_id).length
    });

    lengths_match
        && assignment.iter().all(|(variable_id, word_id)| {
            assignment.iter().all(|(other_id, other_word_id)| {
                other_id == variable_id || other_word_id != word_id
            }) && crossword.neighbors(variable_id).iter().all(|overlap| {
                assignment.get(overlap.other).map_or(true, |other_word_id| {
                    crossword.word(word_id).letters.get(overlap.index)
                        == crossword.word(other_word_id).letters.get(overlap.other_index)
                })
            })
        })
}

/// The live state of a single search: the domain store it prunes, the options it runs with, and
/// the statistics it collects.
pub struct Search<'a> {
    crossword: &'a Crossword,
    domains: DomainStore,
    order_values: bool,
    maintain_arc_consistency: bool,
    deadline: Option<Instant>,
    abort: Option<&'a AtomicBool>,
    statistics: Statistics,
}

impl<'a> Search<'a> {
    /// Prepare a search over the given domains, which should already be node- and
    /// arc-consistent.
    #[must_use]
    pub fn new(
        crossword: &'a Crossword,
        domains: DomainStore,
        config: &'a SolverConfig,
        deadline: Option<Instant>,
    ) -> Search<'a> {
        Search {
            crossword,
            domains,
            order_values: config.order_values,
            maintain_arc_consistency: config.maintain_arc_consistency,
            deadline,
            abort: config.abort.as_deref(),
            statistics: Statistics::default(),
        }
    }

    #[must_use]
    pub fn domains(&self) -> &DomainStore {
        &self.domains
    }

    #[must_use]
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    #[must_use]
    pub fn into_statistics(self) -> Statistics {
        self.statistics
    }

    /// Choose the unassigned variable with the fewest remaining words, then the most crossings,
    /// then the lowest id. Returns `None` once every variable is assigned.
    #[must_use]
    pub fn select_unassigned_variable(&self, assignment: &Assignment) -> Option<VariableId> {
        assignment.unassigned().min_by_key(|&variable_id| {
            (
                self.domains.len(variable_id),
                Reverse(self.crossword.degree(variable_id)),
                variable_id,
            )
        })
    }

    /// List the words in a variable's domain, ordered by how many options each one would rule
    /// out for unassigned crossing variables (fewest first). Ties keep word list order. If value
    /// ordering is turned off, this is just the domain in word list order.
    #[must_use]
    pub fn order_domain_values(
        &self,
        variable_id: VariableId,
        assignment: &Assignment,
    ) -> Vec<WordId> {
        let mut words: Vec<WordId> = self.domains.words(variable_id).collect();
        if !self.order_values {
            return words;
        }

        // Letter counts for the far side of each open crossing, computed once for all candidates.
        let open_crossings: Vec<_> = self
            .crossword
            .neighbors(variable_id)
            .iter()
            .filter(|overlap| !assignment.contains(overlap.other))
            .map(|overlap| {
                let counts = build_letter_counts(
                    self.crossword,
                    &self.domains,
                    overlap.other,
                    overlap.other_index,
                );
                (overlap, self.domains.len(overlap.other), counts)
            })
            .collect();

        words.sort_by_cached_key(|&word_id| {
            open_crossings
                .iter()
                .map(|(overlap, option_count, counts)| {
                    option_count
                        - count_compatible(self.crossword, &self.domains, counts, overlap, word_id)
                })
                .sum::<usize>()
        });

        words
    }

    /// Would assigning `word_id` to `variable_id` keep an already-consistent assignment
    /// consistent?
    fn consistent_extension(
        &self,
        assignment: &Assignment,
        variable_id: VariableId,
        word_id: WordId,
    ) -> bool {
        let word = self.crossword.word(word_id);

        word.len() == self.crossword.variable(variable_id).length
            && !assignment.uses_word(word_id)
            && self.crossword.neighbors(variable_id).iter().all(|overlap| {
                assignment.get(overlap.other).map_or(true, |other_word_id| {
                    word.letters.get(overlap.index)
                        == self.crossword.word(other_word_id).letters.get(overlap.other_index)
                })
            })
    }

    /// Propagate the implications of a tentative choice through the domain store. Returns false
    /// if some open variable is left without options.
    fn infer(&mut self, variable_id: VariableId, word_id: WordId, assignment: &Assignment) -> bool {
        self.domains.restrict_to(variable_id, word_id);
        let mut arcs: Vec<ConstraintArc> = arcs_into(self.crossword, variable_id);

        // The chosen word is no longer available anywhere else.
        for other_id in assignment.unassigned() {
            if self.domains.eliminate(other_id, word_id) {
                if self.domains.is_empty(other_id) {
                    return false;
                }
                arcs.extend(arcs_into(self.crossword, other_id));
            }
        }

        arcs.retain(|&(x, _)| !assignment.contains(x));
        ac3(self.crossword, &mut self.domains, Some(arcs)).is_ok()
    }

    /// Bail out if we've passed our deadline or been asked to stop.
    fn check_interrupt(&self) -> Result<(), FillFailure> {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(FillFailure::Timeout);
            }
        }
        if let Some(abort) = self.abort {
            if abort.load(Ordering::Relaxed) {
                return Err(FillFailure::Abort);
            }
        }
        Ok(())
    }

    /// Extend the given assignment into a complete one, if possible. Returns `Ok(None)` if no
    /// complete assignment extends it.
    pub fn backtrack(
        &mut self,
        mut assignment: Assignment,
    ) -> Result<Option<Assignment>, FillFailure> {
        let start = Instant::now();
        let found = self.backtrack_in_place(&mut assignment);
        self.statistics.search_time += start.elapsed();

        if found? {
            let valid = assignment.is_complete() && consistent(self.crossword, &assignment);
            if CHECK_INVARIANTS && !valid {
                panic!("Search produced an invalid assignment: {assignment:?}");
            }
            Ok(Some(assignment))
        } else {
            Ok(None)
        }
    }

    /// The recursive core of `backtrack`. On success the assignment is left complete. Otherwise,
    /// whether the branch failed or the search was interrupted, the assignment and domains are
    /// left exactly as they were on entry.
    fn backtrack_in_place(&mut self, assignment: &mut Assignment) -> Result<bool, FillFailure> {
        if self.statistics.states % INTERRUPT_FREQUENCY == 0 {
            self.check_interrupt()?;
        }
        self.statistics.states += 1;

        let Some(variable_id) = self.select_unassigned_variable(assignment) else {
            return Ok(true);
        };

        for word_id in self.order_domain_values(variable_id, assignment) {
            if !self.consistent_extension(assignment, variable_id, word_id) {
                continue;
            }

            if LOG_FILL_PROCESS {
                log::trace!(
                    "{}Trying {} = {}",
                    " ".repeat(assignment.len()),
                    self.crossword.variable(variable_id),
                    self.crossword.word(word_id).normalized_string,
                );
            }

            let checkpoint = self.domains.checkpoint();
            assignment.insert(variable_id, word_id);

            if !self.maintain_arc_consistency || self.infer(variable_id, word_id, assignment) {
                match self.backtrack_in_place(assignment) {
                    Ok(true) => return Ok(true),
                    Ok(false) => {}
                    Err(failure) => {
                        assignment.remove(variable_id);
                        self.domains.restore(checkpoint);
                        return Err(failure);
                    }
                }
            } else {
                self.statistics.propagation_failures += 1;
            }

            assignment.remove(variable_id);
            self.domains.restore(checkpoint);
            self.statistics.backtracks += 1;
        }

        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    use crate::backtracking_search::{consistent, FillFailure, Search};
    use crate::domains::DomainStore;
    use crate::grid_config::Crossword;
    use crate::solver::SolverConfig;
    use crate::types::Assignment;
    use crate::word_list::WordList;

    fn generate(template: &str, words: &[&str]) -> (Crossword, DomainStore) {
        let crossword = Crossword::from_template_string(
            template,
            WordList::from_words(words.iter().copied()).unwrap(),
        )
        .unwrap();
        let mut domains = DomainStore::new(&crossword);
        domains.enforce_node_consistency(&crossword);
        domains.commit();
        (crossword, domains)
    }

    fn strings(crossword: &Crossword, word_ids: &[usize]) -> Vec<String> {
        word_ids
            .iter()
            .map(|&word_id| crossword.word(word_id).normalized_string.clone())
            .collect()
    }

    fn configs() -> Vec<SolverConfig> {
        [(true, true), (true, false), (false, true), (false, false)]
            .into_iter()
            .map(|(order_values, maintain_arc_consistency)| SolverConfig {
                order_values,
                maintain_arc_consistency,
                ..SolverConfig::default()
            })
            .collect()
    }

    const STRUCTURE0: &str = "
        #___#
        #_##_
        #_##_
        #_##_
        #____
    ";

    const WORDS0: [&str; 10] = [
        "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    ];

    #[test]
    fn test_select_prefers_fewest_remaining_values() {
        let (crossword, domains) = generate(
            "
            ___
            _#_
            ___
            ",
            &["cat", "tic", "cot", "tot"],
        );
        let config = SolverConfig::default();
        let mut search = Search::new(&crossword, domains, &config, None);
        let assignment = Assignment::new(crossword.variables.len());

        // Same domain size and degree everywhere: lowest id wins.
        assert_eq!(search.select_unassigned_variable(&assignment), Some(0));

        search.domains.eliminate(2, crossword.word_list.word_id("cat").unwrap());
        assert_eq!(search.select_unassigned_variable(&assignment), Some(2));
    }

    #[test]
    fn test_select_breaks_ties_by_degree() {
        // The down slot crosses both across slots.
        let (crossword, domains) = generate(
            "
            ___
            _##
            ___
            ",
            &["cat", "tic", "cot"],
        );
        assert_eq!(crossword.degree(1), 2);

        let config = SolverConfig::default();
        let mut search = Search::new(&crossword, domains, &config, None);
        let mut assignment = Assignment::new(crossword.variables.len());

        assert_eq!(search.select_unassigned_variable(&assignment), Some(1));

        // Fewer values still beats more crossings.
        search.domains.eliminate(2, crossword.word_list.word_id("tic").unwrap());
        assert_eq!(search.select_unassigned_variable(&assignment), Some(2));

        for variable_id in 0..crossword.variables.len() {
            assignment.insert(variable_id, variable_id);
        }
        assert_eq!(search.select_unassigned_variable(&assignment), None);
    }

    #[test]
    fn test_order_domain_values_puts_least_constraining_first() {
        let (crossword, domains) = generate(
            "
            ___
            #_#
            #_#
            ",
            &["cat", "ace", "axe", "art", "tax"],
        );
        let config = SolverConfig::default();
        let search = Search::new(&crossword, domains, &config, None);
        let mut assignment = Assignment::new(crossword.variables.len());

        assert_eq!(
            strings(&crossword, &search.order_domain_values(0, &assignment)),
            vec!["CAT", "TAX", "ACE", "ART", "AXE"]
        );

        // Assigned neighbors don't count against any candidate.
        assignment.insert(1, crossword.word_list.word_id("art").unwrap());
        assert_eq!(
            strings(&crossword, &search.order_domain_values(0, &assignment)),
            vec!["ACE", "ART", "AXE", "CAT", "TAX"]
        );
    }

    #[test]
    fn test_order_domain_values_can_be_disabled() {
        let (crossword, domains) = generate(
            "
            ___
            #_#
            #_#
            ",
            &["cat", "ace", "axe", "art", "tax"],
        );
        let config = SolverConfig {
            order_values: false,
            ..SolverConfig::default()
        };
        let search = Search::new(&crossword, domains, &config, None);
        let assignment = Assignment::new(crossword.variables.len());

        assert_eq!(
            strings(&crossword, &search.order_domain_values(0, &assignment)),
            vec!["ACE", "ART", "AXE", "CAT", "TAX"]
        );
    }

    #[test]
    fn test_consistent() {
        let (crossword, _) = generate(STRUCTURE0, &WORDS0);
        let word = |raw: &str| crossword.word_list.word_id(raw).unwrap();
        let mut assignment = Assignment::new(crossword.variables.len());

        assert!(consistent(&crossword, &assignment));

        assignment.insert(0, word("six"));
        assignment.insert(1, word("seven"));
        assert!(consistent(&crossword, &assignment));

        // Wrong letter where the slots cross.
        assignment.insert(0, word("ten"));
        assert!(!consistent(&crossword, &assignment));

        // Wrong length.
        assignment.insert(0, word("nine"));
        assert!(!consistent(&crossword, &assignment));

        // The two four-letter slots cross on their last letter.
        assignment.remove(0);
        assignment.remove(1);
        assignment.insert(2, word("five"));
        assignment.insert(3, word("nine"));
        assert!(consistent(&crossword, &assignment));

        // Same word twice, even though the shared letter agrees.
        assignment.insert(2, word("nine"));
        assert!(!consistent(&crossword, &assignment));
    }

    #[test]
    fn test_consistent_rejects_short_words_in_crossing_slots() {
        // The down slot's last letter is the across slot's last letter.
        let (crossword, _) = generate(
            "
            ##_
            ##_
            ___
            ",
            &["cat", "at"],
        );
        assert_eq!(crossword.overlap(0, 1), Some((2, 2)));

        let mut assignment = Assignment::new(crossword.variables.len());
        assignment.insert(0, crossword.word_list.word_id("cat").unwrap());
        assignment.insert(1, crossword.word_list.word_id("at").unwrap());
        assert!(!consistent(&crossword, &assignment));

        assignment.insert(0, crossword.word_list.word_id("at").unwrap());
        assignment.insert(1, crossword.word_list.word_id("cat").unwrap());
        assert!(!consistent(&crossword, &assignment));
    }

    #[test]
    fn test_backtrack_fills_structure0_with_every_config() {
        for config in configs() {
            let (crossword, domains) = generate(STRUCTURE0, &WORDS0);
            let mut search = Search::new(&crossword, domains, &config, None);

            let assignment = search
                .backtrack(Assignment::new(crossword.variables.len()))
                .unwrap()
                .expect("structure0 should be fillable");

            assert!(assignment.is_complete());
            assert!(consistent(&crossword, &assignment));
            assert_eq!(
                crossword
                    .assigned_words(&assignment)
                    .into_iter()
                    .map(|(_, word)| word)
                    .collect::<Vec<_>>(),
                vec!["SIX", "SEVEN", "FIVE", "NINE"],
                "{config:?}"
            );
        }
    }

    #[test]
    fn test_backtrack_never_reuses_words_in_separate_slots() {
        for config in configs() {
            let (crossword, domains) = generate("___\n###\n___", &["cat"]);
            let mut search = Search::new(&crossword, domains, &config, None);
            let before = search.domains().snapshot();

            let result = search
                .backtrack(Assignment::new(crossword.variables.len()))
                .unwrap();

            assert_eq!(result, None, "{config:?}");
            assert_eq!(search.domains().snapshot(), before, "{config:?}");
            assert!(search.statistics().backtracks > 0);
        }
    }

    #[test]
    fn test_backtrack_fills_crossing_slots_with_distinct_words() {
        for config in configs() {
            let (crossword, domains) = generate(
                "
                ___
                #_#
                #_#
                ",
                &["ace", "cat", "ice"],
            );
            let mut search = Search::new(&crossword, domains, &config, None);

            let assignment = search
                .backtrack(Assignment::new(crossword.variables.len()))
                .unwrap()
                .expect("should be fillable");

            assert!(consistent(&crossword, &assignment));
            assert_ne!(assignment.get(0), assignment.get(1));
        }
    }

    #[test]
    fn test_backtrack_can_be_interrupted() {
        let (crossword, domains) = generate(STRUCTURE0, &WORDS0);
        let config = SolverConfig::default();
        let mut search = Search::new(&crossword, domains.clone(), &config, Some(Instant::now()));
        assert_eq!(
            search.backtrack(Assignment::new(crossword.variables.len())),
            Err(FillFailure::Timeout)
        );

        let abort = Arc::new(AtomicBool::new(false));
        abort.store(true, Ordering::Relaxed);
        let config = SolverConfig {
            abort: Some(abort),
            ..SolverConfig::default()
        };
        let mut search = Search::new(&crossword, domains, &config, None);
        assert_eq!(
            search.backtrack(Assignment::new(crossword.variables.len())),
            Err(FillFailure::Abort)
        );
    }

    #[test]
    fn test_interrupted_search_restores_domains() {
        // Five separate slots but only four words: the search goes several levels deep before
        // running out of options.
        let (crossword, domains) = generate(
            "
            ___
            ###
            ___
            ###
            ___
            ###
            ___
            ###
            ___
            ",
            &["cat", "dog", "ape", "owl"],
        );
        let config = SolverConfig {
            abort: Some(Arc::new(AtomicBool::new(true))),
            ..SolverConfig::default()
        };
        let mut search = Search::new(&crossword, domains, &config, None);
        let before = search.domains().snapshot();

        // Skip the check on entry, so the first one happens mid-search.
        search.statistics.states = 1;
        assert_eq!(
            search.backtrack(Assignment::new(crossword.variables.len())),
            Err(FillFailure::Abort)
        );

        assert_eq!(search.statistics().states, super::INTERRUPT_FREQUENCY);
        assert!(search.statistics().backtracks > 0);
        assert_eq!(search.domains().snapshot(), before);
    }
}
