//! This module implements the static model of a crossword puzzle: which cells of the grid can hold
//! letters, the slots (variables) derived from them, the overlaps between crossing slots, and the
//! words that may be placed. Everything here is built once and read-only afterward.

use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde_derive::{Deserialize, Serialize};

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{Assignment, VariableId, WordId};
use crate::word_list::{Word, WordList};
use crate::MAX_NEIGHBOR_COUNT;

/// Zero-indexed row and column for a cell in the grid, where row 0 is the top row.
pub type GridCoord = (usize, usize);

/// The direction that a slot is facing.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    Across,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Across => write!(f, "across"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// A slot in the grid: the variable of the constraint problem. Variables order by row, then
/// column, then direction (across first), which is also the order used to break heuristic ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    pub i: usize,
    pub j: usize,
    pub direction: Direction,
    pub length: usize,
}

impl Variable {
    #[must_use]
    pub fn new(i: usize, j: usize, direction: Direction, length: usize) -> Variable {
        Variable {
            i,
            j,
            direction,
            length,
        }
    }

    /// Generate the coords for each cell of this slot.
    #[must_use]
    pub fn cell_coords(&self) -> Vec<GridCoord> {
        (0..self.length)
            .map(|cell_idx| match self.direction {
                Direction::Across => (self.i, self.j + cell_idx),
                Direction::Down => (self.i + cell_idx, self.j),
            })
            .collect()
    }

    /// Parse a string like "1,2,down,5" into a `Variable`.
    pub fn from_key(key: &str) -> Result<Variable, GridError> {
        let invalid = || GridError::InvalidVariableKey(key.into());

        let key_parts: Vec<&str> = key.split(',').map(str::trim).collect();
        let [i, j, direction, length] = key_parts.as_slice() else {
            return Err(invalid());
        };

        let direction = match *direction {
            "across" => Direction::Across,
            "down" => Direction::Down,
            _ => return Err(invalid()),
        };

        Ok(Variable {
            i: i.parse().map_err(|_| invalid())?,
            j: j.parse().map_err(|_| invalid())?,
            direction,
            length: length.parse().map_err(|_| invalid())?,
        })
    }

    /// Represent this variable as a string like "1,2,down,5".
    #[must_use]
    pub fn to_key(&self) -> String {
        format!("{},{},{},{}", self.i, self.j, self.direction, self.length)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) {} : {}",
            self.i, self.j, self.direction, self.length
        )
    }
}

/// Serialize a `Variable` into a string key.
#[cfg(feature = "serde")]
impl Serialize for Variable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_key())
    }
}

/// Deserialize a `Variable` from a string key.
#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Variable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw_string = String::deserialize(deserializer)?;
        Variable::from_key(&raw_string).map_err(serde::de::Error::custom)
    }
}

/// One side of a crossing between two slots: the other slot's id, plus the index of the shared
/// cell within this slot and within the other slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlap {
    pub other: VariableId,
    pub index: usize,
    pub other_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("grid must have at least one row and one column")]
    EmptyGrid,

    #[error("row {row} has {found} cells, but row 0 has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unrecognized character {ch:?} at row {row}, column {column}")]
    InvalidCell { row: usize, column: usize, ch: char },

    #[error("slot {0} has zero length")]
    ZeroLengthVariable(Variable),

    #[error("slot {0} extends outside the grid")]
    VariableOutOfBounds(Variable),

    #[error("slot {variable} covers blocked cell {cell:?}")]
    VariableOnBlock { variable: Variable, cell: GridCoord },

    #[error("slot {0} appears more than once")]
    DuplicateVariable(Variable),

    #[error("slots {0} and {1} run in the same direction through a shared cell")]
    OverlappingVariables(Variable, Variable),

    #[error("invalid slot key: {0:?}")]
    InvalidVariableKey(String),
}

/// Parse a structure template: one line per row, with `_` or `.` for fillable cells and `#` or
/// `█` for blocks. Blank lines are ignored and surrounding whitespace is trimmed.
pub fn parse_structure(template: &str) -> Result<Vec<Vec<bool>>, GridError> {
    let structure = template
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(row, line)| {
            line.chars()
                .enumerate()
                .map(|(column, ch)| match ch {
                    '_' | '.' => Ok(true),
                    '#' | '█' => Ok(false),
                    _ => Err(GridError::InvalidCell { row, column, ch }),
                })
                .collect::<Result<Vec<bool>, GridError>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    validate_structure(&structure)?;
    Ok(structure)
}

/// Make sure the structure is a non-empty rectangle.
fn validate_structure(structure: &[Vec<bool>]) -> Result<(), GridError> {
    let Some(first_row) = structure.first() else {
        return Err(GridError::EmptyGrid);
    };
    if first_row.is_empty() {
        return Err(GridError::EmptyGrid);
    }

    for (row, cells) in structure.iter().enumerate() {
        if cells.len() != first_row.len() {
            return Err(GridError::RaggedRow {
                row,
                expected: first_row.len(),
                found: cells.len(),
            });
        }
    }

    Ok(())
}

/// Derive the slots of a structure: every maximal horizontal or vertical run of at least two
/// fillable cells.
#[must_use]
pub fn generate_variables(structure: &[Vec<bool>]) -> Vec<Variable> {
    let height = structure.len();
    let width = structure.first().map_or(0, Vec::len);
    let is_open = |i: usize, j: usize| structure[i][j];

    let mut variables = vec![];

    for i in 0..height {
        for j in 0..width {
            if !is_open(i, j) {
                continue;
            }

            if j == 0 || !is_open(i, j - 1) {
                let length = (j..width).take_while(|&k| is_open(i, k)).count();
                if length > 1 {
                    variables.push(Variable::new(i, j, Direction::Across, length));
                }
            }

            if i == 0 || !is_open(i - 1, j) {
                let length = (i..height).take_while(|&k| is_open(k, j)).count();
                if length > 1 {
                    variables.push(Variable::new(i, j, Direction::Down, length));
                }
            }
        }
    }

    variables.sort();
    variables
}

/// The immutable model of a puzzle: its geometry, its variables and their overlaps, and the words
/// that can fill them.
#[derive(Clone)]
pub struct Crossword {
    pub height: usize,
    pub width: usize,

    /// `structure[i][j]` is true when the cell at row `i`, column `j` can hold a letter.
    pub structure: Vec<Vec<bool>>,

    /// All slots in the grid, in sorted order. A `VariableId` is an index into this list.
    pub variables: Vec<Variable>,

    /// The words available for filling the grid; see `word_list.rs`.
    pub word_list: WordList,

    /// For each variable, the overlaps it has with crossing variables, ordered by the other
    /// variable's id.
    neighbors: Vec<SmallVec<[Overlap; MAX_NEIGHBOR_COUNT]>>,
}

impl Crossword {
    /// Build a crossword whose variables are derived from the structure.
    pub fn new(structure: Vec<Vec<bool>>, word_list: WordList) -> Result<Crossword, GridError> {
        validate_structure(&structure)?;
        let variables = generate_variables(&structure);
        Crossword::with_variables(structure, variables, word_list)
    }

    /// Build a crossword from a structure template string (see `parse_structure`).
    pub fn from_template_string(
        template: &str,
        word_list: WordList,
    ) -> Result<Crossword, GridError> {
        Crossword::new(parse_structure(template)?, word_list)
    }

    /// Build a crossword from a structure and an explicit list of variables, rejecting any
    /// geometry that doesn't make sense.
    pub fn with_variables(
        structure: Vec<Vec<bool>>,
        mut variables: Vec<Variable>,
        word_list: WordList,
    ) -> Result<Crossword, GridError> {
        validate_structure(&structure)?;
        let height = structure.len();
        let width = structure[0].len();

        variables.sort();
        if let Some(pair) = variables.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(GridError::DuplicateVariable(pair[0]));
        }

        for variable in &variables {
            if variable.length == 0 {
                return Err(GridError::ZeroLengthVariable(*variable));
            }
            for (i, j) in variable.cell_coords() {
                if i >= height || j >= width {
                    return Err(GridError::VariableOutOfBounds(*variable));
                }
                if !structure[i][j] {
                    return Err(GridError::VariableOnBlock {
                        variable: *variable,
                        cell: (i, j),
                    });
                }
            }
        }

        let neighbors = generate_overlaps(&variables)?;

        Ok(Crossword {
            height,
            width,
            structure,
            variables,
            word_list,
            neighbors,
        })
    }

    #[must_use]
    pub fn variable(&self, variable_id: VariableId) -> &Variable {
        &self.variables[variable_id]
    }

    /// Find the id of the given variable, if it belongs to this crossword.
    #[must_use]
    pub fn variable_id(&self, variable: &Variable) -> Option<VariableId> {
        self.variables.binary_search(variable).ok()
    }

    #[must_use]
    pub fn word(&self, word_id: WordId) -> &Word {
        self.word_list.get_word(word_id)
    }

    /// The overlaps between this variable and every variable crossing it.
    #[must_use]
    pub fn neighbors(&self, variable_id: VariableId) -> &[Overlap] {
        &self.neighbors[variable_id]
    }

    /// The number of variables crossing this one.
    #[must_use]
    pub fn degree(&self, variable_id: VariableId) -> usize {
        self.neighbors[variable_id].len()
    }

    /// Where do `x` and `y` cross? Returns `(index_in_x, index_in_y)`, or `None` if they don't.
    #[must_use]
    pub fn overlap(&self, x: VariableId, y: VariableId) -> Option<(usize, usize)> {
        self.neighbors[x]
            .iter()
            .find(|overlap| overlap.other == y)
            .map(|overlap| (overlap.index, overlap.other_index))
    }

    /// Build a row-major letter grid for the given assignment, with `None` for blocks and
    /// unassigned cells.
    #[must_use]
    pub fn letter_grid(&self, assignment: &Assignment) -> Vec<Vec<Option<char>>> {
        let mut letters = vec![vec![None; self.width]; self.height];

        for (variable_id, word_id) in assignment.iter() {
            let word = self.word(word_id);
            for ((i, j), &letter) in self.variables[variable_id]
                .cell_coords()
                .into_iter()
                .zip(&word.letters)
            {
                letters[i][j] = Some(letter);
            }
        }

        letters
    }

    /// List each assigned variable with the text of its word.
    #[must_use]
    pub fn assigned_words<'a>(&'a self, assignment: &Assignment) -> Vec<(&'a Variable, &'a str)> {
        assignment
            .iter()
            .map(|(variable_id, word_id)| {
                (
                    &self.variables[variable_id],
                    self.word(word_id).normalized_string.as_str(),
                )
            })
            .collect()
    }
}

impl fmt::Debug for Crossword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crossword")
            .field("height", &self.height)
            .field("width", &self.width)
            .field("variables", &self.variables.len())
            .field("word_list", &self.word_list)
            .finish_non_exhaustive()
    }
}

/// Build the adjacency list of overlaps for each (sorted) variable, by mapping every cell to the
/// slots that pass through it.
fn generate_overlaps(
    variables: &[Variable],
) -> Result<Vec<SmallVec<[Overlap; MAX_NEIGHBOR_COUNT]>>, GridError> {
    // (variable id, cell index within variable)
    let mut entries_by_cell: HashMap<GridCoord, SmallVec<[(VariableId, usize); 2]>> =
        HashMap::new();

    for (variable_id, variable) in variables.iter().enumerate() {
        for (cell_idx, coord) in variable.cell_coords().into_iter().enumerate() {
            entries_by_cell
                .entry(coord)
                .or_default()
                .push((variable_id, cell_idx));
        }
    }

    let mut neighbors: Vec<SmallVec<[Overlap; MAX_NEIGHBOR_COUNT]>> =
        vec![SmallVec::new(); variables.len()];

    for entries in entries_by_cell.values() {
        for &(x, index) in entries {
            for &(y, other_index) in entries {
                if x == y {
                    continue;
                }

                // Slots running the same way can't share a cell without sharing a run of them.
                if variables[x].direction == variables[y].direction {
                    let (first, second) = (variables[x.min(y)], variables[x.max(y)]);
                    return Err(GridError::OverlappingVariables(first, second));
                }

                neighbors[x].push(Overlap {
                    other: y,
                    index,
                    other_index,
                });
            }
        }
    }

    for overlaps in &mut neighbors {
        overlaps.sort_by_key(|overlap| overlap.other);
    }

    Ok(neighbors)
}

/// Turn the given crossword and assignment into a rendered string, with `█` for blocks and a
/// space for cells that haven't been filled.
#[must_use]
pub fn render_grid(crossword: &Crossword, assignment: &Assignment) -> String {
    let letters = crossword.letter_grid(assignment);

    crossword
        .structure
        .iter()
        .zip(letters)
        .map(|(row, row_letters)| {
            row.iter()
                .zip(row_letters)
                .map(|(&open, letter)| if open { letter.unwrap_or(' ') } else { '█' })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
