//! Character matrices: column descriptors, sequences, and cells.

use std::sync::Arc;

use serde::Serialize;

use crate::annotation::{Annotated, Annotation};
use crate::state::{StateAlphabet, StateId};
use crate::taxon::TaxonId;

/// Data type of a character matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// DNA nucleotide data.
    Dna,

    /// RNA nucleotide data.
    Rna,

    /// Amino-acid data.
    Protein,

    /// Restriction-site presence/absence data.
    Restriction,

    /// Document-defined discrete data.
    Standard,

    /// Real-valued data.
    Continuous,
}

impl DataType {
    /// Whether this data type uses a process-wide fixed alphabet.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Dna | Self::Rna | Self::Protein | Self::Restriction)
    }

    /// Whether this data type has discrete states at all.
    #[must_use]
    pub fn has_states(&self) -> bool {
        !matches!(self, Self::Continuous)
    }

    /// String value for display and summaries.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dna => "dna",
            Self::Rna => "rna",
            Self::Protein => "protein",
            Self::Restriction => "restriction",
            Self::Standard => "standard",
            Self::Continuous => "continuous",
        }
    }
}

/// Handle of a character type within its owning matrix (arena index, equal
/// to the column position).
pub type CharacterTypeId = usize;

/// Column descriptor: associates a column with a state alphabet.
#[derive(Debug, Clone)]
pub struct CharacterType {
    /// Column label.
    pub label: Option<String>,

    /// Alphabet governing this column; `None` for continuous data.
    pub alphabet: Option<Arc<StateAlphabet>>,

    /// Annotations attached to this column.
    pub annotations: Vec<Annotation>,
}

impl CharacterType {
    /// Create a new column descriptor.
    #[must_use]
    pub fn new(label: Option<String>, alphabet: Option<Arc<StateAlphabet>>) -> Self {
        Self {
            label,
            alphabet,
            annotations: Vec::new(),
        }
    }
}

impl Annotated for CharacterType {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    fn annotations_mut(&mut self) -> &mut Vec<Annotation> {
        &mut self.annotations
    }
}

/// Value of a single matrix cell.
#[derive(Debug, Clone)]
pub enum CellValue {
    /// A discrete state: the alphabet it lives in and its handle there.
    State {
        /// Alphabet the state belongs to. For fixed data types this is
        /// always the process-wide singleton, so two cells holding the same
        /// symbol hold the same state object.
        alphabet: Arc<StateAlphabet>,

        /// Handle of the state within `alphabet`.
        state: StateId,
    },

    /// A continuous value.
    Continuous(f64),
}

impl CellValue {
    /// Canonical symbol of a discrete value, `None` for continuous values.
    #[must_use]
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Self::State { alphabet, state } => alphabet.symbol(*state),
            Self::Continuous(_) => None,
        }
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::State { alphabet: a, state: s },
                Self::State { alphabet: b, state: t },
            ) => Arc::ptr_eq(a, b) && s == t,
            (Self::Continuous(a), Self::Continuous(b)) => a == b,
            _ => false,
        }
    }
}

/// A single matrix cell: a value plus its annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Cell value.
    pub value: CellValue,

    /// Annotations attached to this cell.
    pub annotations: Vec<Annotation>,
}

impl Cell {
    /// Create a cell with no annotations.
    #[must_use]
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            annotations: Vec::new(),
        }
    }
}

/// One taxon's row of cells, indexed by column position.
///
/// Cells are placed, not appended: an explicitly indexed encoding may leave
/// gaps, which stay `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharacterSequence {
    cells: Vec<Option<Cell>>,
}

impl CharacterSequence {
    /// Create an empty sequence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cell at the next column position.
    pub fn push(&mut self, cell: Cell) {
        self.cells.push(Some(cell));
    }

    /// Place a cell at a column position, growing the sequence if needed.
    pub fn place(&mut self, column: usize, cell: Cell) {
        if column >= self.cells.len() {
            self.cells.resize(column + 1, None);
        }
        self.cells[column] = Some(cell);
    }

    /// Cell at a column position.
    #[must_use]
    pub fn cell(&self, column: usize) -> Option<&Cell> {
        self.cells.get(column).and_then(Option::as_ref)
    }

    /// Number of column positions (including unfilled gaps).
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the sequence has no column positions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over filled `(column, cell)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Cell)> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_ref().map(|c| (i, c)))
    }

    /// Canonical symbols of all filled discrete cells, in column order.
    #[must_use]
    pub fn symbols(&self) -> String {
        self.iter()
            .filter_map(|(_, c)| c.value.symbol())
            .collect::<Vec<_>>()
            .join("")
    }
}

/// One row of a matrix: the taxon it belongs to and its sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixRow {
    /// Handle of the taxon in the matrix's taxon namespace.
    pub taxon: TaxonId,

    /// Row label.
    pub label: Option<String>,

    /// The row's cells.
    pub sequence: CharacterSequence,

    /// Annotations attached to this row.
    pub annotations: Vec<Annotation>,
}

/// A taxon-namespace-scoped character matrix.
#[derive(Debug, Clone)]
pub struct CharacterMatrix {
    /// Matrix label.
    pub label: Option<String>,

    /// Data type of every cell in the matrix.
    pub data_type: DataType,

    /// Index of the owning taxon namespace in the enclosing data set.
    pub taxon_namespace: usize,

    /// Column descriptors in declaration order.
    pub character_types: Vec<CharacterType>,

    /// State alphabets used by this matrix. For fixed data types this holds
    /// the process-wide singleton.
    pub state_alphabets: Vec<Arc<StateAlphabet>>,

    rows: Vec<MatrixRow>,

    /// Annotations attached to the matrix.
    pub annotations: Vec<Annotation>,
}

impl CharacterMatrix {
    /// Create an empty matrix.
    #[must_use]
    pub fn new(data_type: DataType, taxon_namespace: usize, label: Option<String>) -> Self {
        Self {
            label,
            data_type,
            taxon_namespace,
            character_types: Vec::new(),
            state_alphabets: Vec::new(),
            rows: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Append a row.
    pub fn push_row(&mut self, row: MatrixRow) {
        self.rows.push(row);
    }

    /// Rows in document order.
    #[must_use]
    pub fn rows(&self) -> &[MatrixRow] {
        &self.rows
    }

    /// Sequence for a taxon, if the matrix has a row for it.
    #[must_use]
    pub fn sequence_for(&self, taxon: TaxonId) -> Option<&CharacterSequence> {
        self.rows
            .iter()
            .find(|r| r.taxon == taxon)
            .map(|r| &r.sequence)
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the matrix has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Annotated for CharacterMatrix {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    fn annotations_mut(&mut self) -> &mut Vec<Annotation> {
        &mut self.annotations
    }
}
