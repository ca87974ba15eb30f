use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::fmt::Debug;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

use crate::types::WordId;
use crate::MAX_SLOT_LENGTH;

/// A struct representing a word in the word list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    /// The word as it would appear in a grid: uppercase letters only.
    pub normalized_string: String,

    /// The letters making up `normalized_string`, so that cells can be compared by index.
    pub letters: SmallVec<[char; MAX_SLOT_LENGTH]>,
}

impl Word {
    #[must_use]
    pub fn new(normalized_string: String) -> Word {
        let letters = normalized_string.chars().collect();
        Word {
            normalized_string,
            letters,
        }
    }

    /// The number of letters (not bytes) in the word.
    #[must_use]
    pub fn len(&self) -> usize {
        self.letters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }
}

/// Given a raw word from a word list file, turn it into the normalized form we'll use in the
/// actual fill engine.
#[must_use]
pub fn normalize_word(raw: &str) -> String {
    raw.nfc() // Normalize Unicode combining forms
        .flat_map(char::to_uppercase)
        .filter(|c| !c.is_whitespace())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WordListError {
    #[error("can't read word list file “{path}”: {message}")]
    InvalidPath { path: String, message: String },

    #[error("word list contains invalid word “{word}” on line {line}")]
    InvalidWord { word: String, line: usize },
}

/// Configuration describing a source of word list entries.
#[derive(Debug, Clone)]
pub enum WordListSourceConfig {
    Memory { words: Vec<String> },
    File { path: PathBuf },
}

/// Parse the contents of a word list file: one word per line, ignoring blank lines.
fn parse_word_list_contents(contents: &str) -> Result<Vec<String>, WordListError> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(line_idx, line)| validate_word(line, line_idx + 1))
        .collect()
}

fn validate_word(raw: &str, line: usize) -> Result<String, WordListError> {
    let normalized = normalize_word(raw);
    if normalized.is_empty() || !normalized.chars().all(char::is_alphabetic) {
        return Err(WordListError::InvalidWord {
            word: raw.trim().into(),
            line,
        });
    }
    Ok(normalized)
}

fn load_words_from_source(source: &WordListSourceConfig) -> Result<Vec<String>, WordListError> {
    match source {
        WordListSourceConfig::Memory { words } => words
            .iter()
            .enumerate()
            .map(|(idx, word)| validate_word(word, idx + 1))
            .collect(),

        WordListSourceConfig::File { path } => {
            let contents = fs::read_to_string(path).map_err(|err| WordListError::InvalidPath {
                path: path.to_string_lossy().into(),
                message: err.to_string(),
            })?;
            parse_word_list_contents(&contents)
        }
    }
}

/// The set of words available for filling a grid. Words are deduplicated and kept in
/// lexicographic order, so a given set of inputs always produces the same `WordId`s.
#[derive(Clone)]
pub struct WordList {
    /// All loaded words; `WordId`s used everywhere else are indices into this list.
    pub words: Vec<Word>,

    /// A map from a normalized string to the id of the Word representing it.
    pub word_id_by_string: HashMap<String, WordId>,

    /// The maximum word length provided when configuring the WordList, if any.
    pub max_length: Option<usize>,
}

impl WordList {
    /// Construct a new `WordList` using the given sources, omitting any entries that are longer
    /// than `max_length`.
    pub fn new(
        source_configs: &[WordListSourceConfig],
        max_length: Option<usize>,
    ) -> Result<WordList, WordListError> {
        let mut strings: Vec<String> = vec![];
        for source in source_configs {
            strings.extend(load_words_from_source(source)?);
        }

        strings.retain(|word| max_length.map_or(true, |max| word.chars().count() <= max));
        strings.sort();
        strings.dedup();

        let word_id_by_string = strings
            .iter()
            .enumerate()
            .map(|(word_id, word)| (word.clone(), word_id))
            .collect();

        let word_list = WordList {
            words: strings.into_iter().map(Word::new).collect(),
            word_id_by_string,
            max_length,
        };

        log::debug!("Loaded word list: {word_list:?}");

        Ok(word_list)
    }

    /// Build a word list from in-memory strings.
    pub fn from_words<I, S>(words: I) -> Result<WordList, WordListError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        WordList::new(
            &[WordListSourceConfig::Memory {
                words: words.into_iter().map(Into::into).collect(),
            }],
            None,
        )
    }

    /// Build a word list from a file with one word per line.
    pub fn from_file(
        path: impl Into<PathBuf>,
        max_length: Option<usize>,
    ) -> Result<WordList, WordListError> {
        WordList::new(&[WordListSourceConfig::File { path: path.into() }], max_length)
    }

    #[must_use]
    pub fn get_word(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }

    /// Look up a word by any spelling that normalizes to it.
    #[must_use]
    pub fn word_id(&self, raw: &str) -> Option<WordId> {
        self.word_id_by_string.get(&normalize_word(raw)).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Debug for WordList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut counts_by_length: Vec<usize> = vec![];
        for word in &self.words {
            if counts_by_length.len() <= word.len() {
                counts_by_length.resize(word.len() + 1, 0);
            }
            counts_by_length[word.len()] += 1;
        }

        f.debug_struct("WordList")
            .field("words", &self.words.len())
            .field("counts_by_length", &counts_by_length)
            .field("max_length", &self.max_length)
            .finish_non_exhaustive()
    }
}
