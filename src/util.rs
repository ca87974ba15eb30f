use std::collections::HashMap;

use crate::domains::DomainStore;
use crate::grid_config::{Crossword, Overlap};
use crate::types::{VariableId, WordId};

/// The number of occurrences of each letter in a single cell, across a variable's remaining
/// options.
pub type LetterCounts = HashMap<char, usize>;

/// Count the letters appearing in the given cell of each word remaining in a variable's domain.
/// Words too short to reach the cell don't contribute.
#[must_use]
pub fn build_letter_counts(
    crossword: &Crossword,
    domains: &DomainStore,
    variable_id: VariableId,
    cell_idx: usize,
) -> LetterCounts {
    let mut counts = LetterCounts::new();
    for word_id in domains.words(variable_id) {
        if let Some(&letter) = crossword.word(word_id).letters.get(cell_idx) {
            *counts.entry(letter).or_insert(0) += 1;
        }
    }
    counts
}

/// Given letter counts for the other side of an overlap (built with `build_letter_counts` at
/// `overlap.other_index`), how many of the other variable's remaining words are compatible with
/// placing `word_id` on this side? A word is never compatible with itself, since words can't be
/// reused.
#[must_use]
pub fn count_compatible(
    crossword: &Crossword,
    domains: &DomainStore,
    other_counts: &LetterCounts,
    overlap: &Overlap,
    word_id: WordId,
) -> usize {
    let word = crossword.word(word_id);
    let Some(&letter) = word.letters.get(overlap.index) else {
        return 0;
    };

    let matching = other_counts.get(&letter).copied().unwrap_or(0);
    let identical = domains.contains(overlap.other, word_id)
        && word.letters.get(overlap.other_index) == Some(&letter);

    matching - usize::from(identical)
}
