//! This module contains a crossword-specific implementation of the AC-3 algorithm for establishing
//! and maintaining arc consistency. For our purposes, an arc `(x, y)` is consistent when every word
//! remaining for `x` has at least one word remaining for `y` that:
//!
//! - has the same letter in the cell where the two slots cross, and
//!
//! - isn't the same word, since no word can be used twice in a grid.
//!
//! Slots that don't cross are never constrained by each other here; the no-reuse rule between them
//! is enforced by the search instead.
//!
//! Checking an arc is done with letter counts (see `util.rs`) rather than by comparing every pair
//! of words, so revising `x` against `y` costs time proportional to the two domain sizes.

use std::collections::{HashSet, VecDeque};

use crate::domains::DomainStore;
use crate::grid_config::Crossword;
use crate::types::{VariableId, WordId};
use crate::util::{build_letter_counts, count_compatible};

/// An ordered pair of variables `(x, y)`, meaning "make `x` consistent with `y`".
pub type ConstraintArc = (VariableId, VariableId);

/// Result from a successful call to `ac3`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArcConsistencySuccess {
    /// How many times `revise` removed at least one word.
    pub revisions: usize,

    /// How many words were removed in total.
    pub eliminations: usize,
}

/// Result from a failed call to `ac3`, identifying the variable whose domain was wiped out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub wiped_out: VariableId,
}

/// Result from a call to `ac3`.
pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// Make `x` arc-consistent with `y` by removing every word from `x`'s domain that has no
/// compatible word in `y`'s domain. If the two variables don't cross, nothing is removed. Returns
/// whether any word was removed.
pub fn revise(
    crossword: &Crossword,
    domains: &mut DomainStore,
    x: VariableId,
    y: VariableId,
) -> bool {
    let Some(overlap) = crossword
        .neighbors(x)
        .iter()
        .find(|overlap| overlap.other == y)
        .copied()
    else {
        return false;
    };

    let other_counts = build_letter_counts(crossword, domains, y, overlap.other_index);

    let unsupported: Vec<WordId> = domains
        .words(x)
        .filter(|&word_id| {
            count_compatible(crossword, domains, &other_counts, &overlap, word_id) == 0
        })
        .collect();

    for &word_id in &unsupported {
        domains.eliminate(x, word_id);
    }

    !unsupported.is_empty()
}

/// Every ordered pair of distinct variables in the crossword.
#[must_use]
pub fn all_arcs(crossword: &Crossword) -> Vec<ConstraintArc> {
    let count = crossword.variables.len();
    (0..count)
        .flat_map(|x| (0..count).filter(move |&y| y != x).map(move |y| (x, y)))
        .collect()
}

/// The arcs pointing at `variable_id` from each of its neighbors, which need to be rechecked when
/// its domain shrinks.
#[must_use]
pub fn arcs_into(crossword: &Crossword, variable_id: VariableId) -> Vec<ConstraintArc> {
    crossword
        .neighbors(variable_id)
        .iter()
        .map(|overlap| (overlap.other, variable_id))
        .collect()
}

/// Run AC-3 over the given arcs (or every arc in the crossword, if none are given), removing
/// unsupported words until every queued arc is consistent. Arcs are processed first-in,
/// first-out. Fails as soon as any domain becomes empty.
pub fn ac3(
    crossword: &Crossword,
    domains: &mut DomainStore,
    initial_arcs: Option<Vec<ConstraintArc>>,
) -> ArcConsistencyResult {
    let mut queue: VecDeque<ConstraintArc> = initial_arcs
        .unwrap_or_else(|| all_arcs(crossword))
        .into();
    let mut queued: HashSet<ConstraintArc> = queue.iter().copied().collect();
    let mut success = ArcConsistencySuccess::default();

    while let Some((x, y)) = queue.pop_front() {
        queued.remove(&(x, y));

        let before = domains.len(x);
        if !revise(crossword, domains, x, y) {
            continue;
        }

        success.revisions += 1;
        success.eliminations += before - domains.len(x);

        if domains.is_empty(x) {
            log::debug!("AC-3 wiped out the domain of {}", crossword.variable(x));
            return Err(ArcConsistencyFailure { wiped_out: x });
        }

        // Shrinking `x` may leave words in its other neighbors without support.
        for overlap in crossword.neighbors(x) {
            let arc = (overlap.other, x);
            if overlap.other != y && queued.insert(arc) {
                queue.push_back(arc);
            }
        }
    }

    Ok(success)
}

/// Check whether every arc between crossing variables is currently consistent.
#[must_use]
pub fn is_arc_consistent(crossword: &Crossword, domains: &DomainStore) -> bool {
    (0..crossword.variables.len()).all(|x| {
        crossword.neighbors(x).iter().all(|overlap| {
            let other_counts =
                build_letter_counts(crossword, domains, overlap.other, overlap.other_index);
            domains.words(x).all(|word_id| {
                count_compatible(crossword, domains, &other_counts, overlap, word_id) > 0
            })
        })
    })
}

#[cfg(test)]
mod tests {
    use crate::arc_consistency::{
        ac3, all_arcs, arcs_into, is_arc_consistent, revise, ArcConsistencyFailure,
    };
    use crate::domains::DomainStore;
    use crate::grid_config::Crossword;
    use crate::word_list::tests::resource_path;
    use crate::word_list::WordList;

    fn generate(template: &str, words: &[&str]) -> (Crossword, DomainStore) {
        let crossword = Crossword::from_template_string(
            template,
            WordList::from_words(words.iter().copied()).unwrap(),
        )
        .unwrap();
        let mut domains = DomainStore::new(&crossword);
        domains.enforce_node_consistency(&crossword);
        (crossword, domains)
    }

    fn words_of(crossword: &Crossword, domains: &DomainStore, variable_id: usize) -> Vec<String> {
        domains
            .words(variable_id)
            .map(|word_id| crossword.word(word_id).normalized_string.clone())
            .collect()
    }

    #[test]
    fn test_revise_ignores_variables_that_dont_cross() {
        let (crossword, mut domains) = generate(
            "
            ___
            ###
            ___
            ",
            &["cat", "dog"],
        );
        let before = domains.snapshot();

        assert!(!revise(&crossword, &mut domains, 0, 1));
        assert_eq!(domains.snapshot(), before);
    }

    #[test]
    fn test_revise_removes_unsupported_words() {
        // Across at 0,0 crosses down at 0,1 through its second letter.
        let (crossword, mut domains) = generate(
            "
            ___
            #_#
            #_#
            ",
            &["cat", "dog", "ace"],
        );
        assert_eq!(crossword.overlap(0, 1), Some((1, 0)));

        assert!(revise(&crossword, &mut domains, 0, 1));
        assert_eq!(words_of(&crossword, &domains, 0), vec!["ACE", "CAT"]);

        // Nothing left to remove on a second pass.
        assert!(!revise(&crossword, &mut domains, 0, 1));
    }

    #[test]
    fn test_a_word_doesnt_support_itself() {
        // Both slots need an "A" where they cross, and "AHA" is the only word that could work.
        let (crossword, mut domains) = generate(
            "
            ___
            _##
            _##
            ",
            &["aha"],
        );

        assert_eq!(
            ac3(&crossword, &mut domains, None),
            Err(ArcConsistencyFailure { wiped_out: 0 })
        );
    }

    #[test]
    fn test_ac3_prunes_incompatible_words_everywhere() {
        let (crossword, mut domains) = generate(
            "
            ___
            #_#
            #_#
            ",
            &["cat", "dog", "ace"],
        );

        let success = ac3(&crossword, &mut domains, None).expect("should be consistent");

        assert_eq!(success.eliminations, 2);
        assert_eq!(words_of(&crossword, &domains, 0), vec!["ACE", "CAT"]);
        assert_eq!(words_of(&crossword, &domains, 1), vec!["ACE", "CAT"]);
        assert!(is_arc_consistent(&crossword, &domains));
    }

    #[test]
    fn test_ac3_reports_wipeout() {
        let (crossword, mut domains) = generate(
            "
            ____
            _###
            _###
            _###
            ",
            &["abcd", "xyz"],
        );

        let result = ac3(&crossword, &mut domains, None);

        assert!(result.is_err());
        assert!((0..crossword.variables.len()).any(|variable_id| domains.is_empty(variable_id)));
    }

    #[test]
    fn test_ac3_on_structure0() {
        let crossword = Crossword::from_template_string(
            &std::fs::read_to_string(resource_path("structure0.txt")).unwrap(),
            WordList::from_file(resource_path("words0.txt"), None).unwrap(),
        )
        .unwrap();
        let mut domains = DomainStore::new(&crossword);
        domains.enforce_node_consistency(&crossword);

        let mut previous = domains.snapshot();
        ac3(&crossword, &mut domains, None).expect("structure0 should be consistent");

        // Domains only ever shrink.
        for (before, after) in previous.drain(..).zip(domains.snapshot()) {
            assert!(after.iter().all(|word_id| before.contains(word_id)));
        }

        assert!(is_arc_consistent(&crossword, &domains));
        assert_eq!(words_of(&crossword, &domains, 0), vec!["SIX"]);
        assert_eq!(words_of(&crossword, &domains, 1), vec!["SEVEN"]);
        assert_eq!(words_of(&crossword, &domains, 3), vec!["NINE"]);
        assert_eq!(words_of(&crossword, &domains, 2), vec!["FIVE"]);
    }

    #[test]
    fn test_arc_lists() {
        let (crossword, _) = generate(
            "
            ___
            #_#
            #_#
            ",
            &["cat"],
        );

        assert_eq!(all_arcs(&crossword), vec![(0, 1), (1, 0)]);
        assert_eq!(arcs_into(&crossword, 1), vec![(0, 1)]);
    }
}
