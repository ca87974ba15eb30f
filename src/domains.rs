//! This module tracks the domain of each variable: the candidate words still under consideration.
//! Domains are stored in an arena indexed by `VariableId`. Every removal is pushed onto a trail, so
//! the search can take a checkpoint before a tentative choice and later restore the store to
//! exactly that state, without cloning any domains.

use std::fmt;
use std::fmt::{Debug, Formatter};

use crate::grid_config::Crossword;
use crate::types::{VariableId, WordId};
use crate::CHECK_INVARIANTS;

/// The live state of a single variable's domain.
#[derive(Clone)]
struct Domain {
    /// The words this domain can still iterate over, in word list order. Eliminated words stay in
    /// this list until the store is committed.
    options: Vec<WordId>,

    /// Record of which words have been eliminated, indexed by `WordId`.
    eliminated: Vec<bool>,

    /// How many options are still available?
    remaining: usize,
}

/// A position in the trail that the store can be restored to. Only valid until the next commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    epoch: usize,
    trail_len: usize,
}

/// Mutable candidate-word sets for every variable of a crossword.
#[derive(Clone)]
pub struct DomainStore {
    domains: Vec<Domain>,

    /// Every elimination made since the last commit, in order.
    trail: Vec<(VariableId, WordId)>,

    /// How many times the store has been committed.
    epoch: usize,
}

impl DomainStore {
    /// Seed every variable's domain with the crossword's entire word list. Nothing is filtered
    /// yet; see `enforce_node_consistency`.
    #[must_use]
    pub fn new(crossword: &Crossword) -> DomainStore {
        let word_count = crossword.word_list.len();

        DomainStore {
            domains: crossword
                .variables
                .iter()
                .map(|_| Domain {
                    options: (0..word_count).collect(),
                    eliminated: vec![false; word_count],
                    remaining: word_count,
                })
                .collect(),
            trail: vec![],
            epoch: 0,
        }
    }

    /// The number of words remaining in this variable's domain.
    #[must_use]
    pub fn len(&self, variable_id: VariableId) -> usize {
        self.domains[variable_id].remaining
    }

    #[must_use]
    pub fn is_empty(&self, variable_id: VariableId) -> bool {
        self.domains[variable_id].remaining == 0
    }

    #[must_use]
    pub fn contains(&self, variable_id: VariableId, word_id: WordId) -> bool {
        self.domains[variable_id]
            .eliminated
            .get(word_id)
            .map_or(false, |&eliminated| !eliminated)
    }

    /// Iterate over the words remaining in this variable's domain, in word list order.
    pub fn words(&self, variable_id: VariableId) -> impl Iterator<Item = WordId> + '_ {
        let domain = &self.domains[variable_id];
        domain
            .options
            .iter()
            .copied()
            .filter(move |&word_id| !domain.eliminated[word_id])
    }

    /// Collect the remaining words of every domain, mostly useful for tests and debugging.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Vec<WordId>> {
        (0..self.domains.len())
            .map(|variable_id| self.words(variable_id).collect())
            .collect()
    }

    /// Remove a word from a variable's domain. Returns false if it was already gone.
    pub fn eliminate(&mut self, variable_id: VariableId, word_id: WordId) -> bool {
        let domain = &mut self.domains[variable_id];
        if domain.eliminated[word_id] {
            return false;
        }

        domain.eliminated[word_id] = true;
        domain.remaining -= 1;
        self.trail.push((variable_id, word_id));
        true
    }

    /// Remove every word except `word_id` from a variable's domain, returning how many were
    /// removed.
    pub fn restrict_to(&mut self, variable_id: VariableId, word_id: WordId) -> usize {
        let others: Vec<WordId> = self
            .words(variable_id)
            .filter(|&other| other != word_id)
            .collect();

        others
            .into_iter()
            .filter(|&other| self.eliminate(variable_id, other))
            .count()
    }

    /// Mark the current state so that it can be restored later.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            epoch: self.epoch,
            trail_len: self.trail.len(),
        }
    }

    /// Undo every elimination made since the given checkpoint. A checkpoint taken before the last
    /// commit no longer describes any state of the store, so restoring it changes nothing.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        if checkpoint.epoch != self.epoch || checkpoint.trail_len > self.trail.len() {
            if CHECK_INVARIANTS {
                panic!("Restoring a checkpoint from before the last commit?");
            }
            log::warn!("Ignoring stale domain checkpoint {checkpoint:?}");
            return;
        }

        while self.trail.len() > checkpoint.trail_len {
            let Some((variable_id, word_id)) = self.trail.pop() else {
                break;
            };
            let domain = &mut self.domains[variable_id];
            domain.eliminated[word_id] = false;
            domain.remaining += 1;
        }
    }

    /// Make every elimination so far permanent: eliminated words are dropped from iteration and
    /// the trail is cleared. Checkpoints taken before this call are no longer valid.
    pub fn commit(&mut self) {
        for domain in &mut self.domains {
            let eliminated = &domain.eliminated;
            domain.options.retain(|&word_id| !eliminated[word_id]);
        }
        self.trail.clear();
        self.epoch += 1;
    }

    /// Remove from every domain the words whose length doesn't match the variable's length.
    /// Returns the number of words removed; running this a second time removes nothing.
    pub fn enforce_node_consistency(&mut self, crossword: &Crossword) -> usize {
        let mut removed = 0;

        for (variable_id, variable) in crossword.variables.iter().enumerate() {
            let mismatched: Vec<WordId> = self
                .words(variable_id)
                .filter(|&word_id| crossword.word(word_id).len() != variable.length)
                .collect();

            for word_id in mismatched {
                if self.eliminate(variable_id, word_id) {
                    removed += 1;
                }
            }
        }

        log::debug!("Node consistency removed {removed} options");

        removed
    }
}

impl Debug for DomainStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainStore")
            .field(
                "remaining",
                &self
                    .domains
                    .iter()
                    .map(|domain| domain.remaining)
                    .collect::<Vec<_>>(),
            )
            .field("trail", &format!("({} eliminations)", self.trail.len()))
            .finish()
    }
}
