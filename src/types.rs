/// An identifier for a given variable (slot), based on its index in the `Crossword`'s `variables`
/// field.
pub type VariableId = usize;

/// An identifier for a given word, based on its index in the `WordList`'s `words` field.
pub type WordId = usize;

/// A partial mapping from variables to chosen words, stored as an arena indexed by `VariableId`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment {
    words: Vec<Option<WordId>>,
    assigned_count: usize,
}

impl Assignment {
    /// Build an empty assignment for a crossword with the given number of variables.
    #[must_use]
    pub fn new(variable_count: usize) -> Assignment {
        Assignment {
            words: vec![None; variable_count],
            assigned_count: 0,
        }
    }

    /// How many variables currently have a word?
    #[must_use]
    pub fn len(&self) -> usize {
        self.assigned_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assigned_count == 0
    }

    /// Does every variable have a word?
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.assigned_count == self.words.len()
    }

    #[must_use]
    pub fn get(&self, variable_id: VariableId) -> Option<WordId> {
        self.words[variable_id]
    }

    #[must_use]
    pub fn contains(&self, variable_id: VariableId) -> bool {
        self.words[variable_id].is_some()
    }

    /// Is this word already used by any assigned variable?
    #[must_use]
    pub fn uses_word(&self, word_id: WordId) -> bool {
        self.words.contains(&Some(word_id))
    }

    /// Assign a word to a variable, returning the word it replaced (if any).
    pub fn insert(&mut self, variable_id: VariableId, word_id: WordId) -> Option<WordId> {
        let previous = self.words[variable_id].replace(word_id);
        if previous.is_none() {
            self.assigned_count += 1;
        }
        previous
    }

    /// Unassign a variable, returning the word it had (if any).
    pub fn remove(&mut self, variable_id: VariableId) -> Option<WordId> {
        let previous = self.words[variable_id].take();
        if previous.is_some() {
            self.assigned_count -= 1;
        }
        previous
    }

    /// Iterate over assigned `(variable, word)` pairs in variable order.
    pub fn iter(&self) -> impl Iterator<Item = (VariableId, WordId)> + '_ {
        self.words
            .iter()
            .enumerate()
            .filter_map(|(variable_id, word_id)| word_id.map(|word_id| (variable_id, word_id)))
    }

    /// Iterate over the ids of variables that don't have a word yet.
    pub fn unassigned(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.words
            .iter()
            .enumerate()
            .filter(|(_, word_id)| word_id.is_none())
            .map(|(variable_id, _)| variable_id)
    }
}

#[cfg(test)]
mod tests {
    use crate::types::Assignment;

    #[test]
    fn test_insert_and_remove_track_count() {
        let mut assignment = Assignment::new(3);
        assert!(assignment.is_empty());

        assert_eq!(assignment.insert(1, 7), None);
        assert_eq!(assignment.insert(1, 8), Some(7));
        assert_eq!(assignment.len(), 1);
        assert!(assignment.uses_word(8));
        assert!(!assignment.uses_word(7));

        assignment.insert(0, 2);
        assignment.insert(2, 3);
        assert!(assignment.is_complete());
        assert_eq!(
            assignment.iter().collect::<Vec<_>>(),
            vec![(0, 2), (1, 8), (2, 3)]
        );

        assert_eq!(assignment.remove(1), Some(8));
        assert_eq!(assignment.remove(1), None);
        assert_eq!(assignment.len(), 2);
        assert_eq!(assignment.unassigned().collect::<Vec<_>>(), vec![1]);
    }
}
