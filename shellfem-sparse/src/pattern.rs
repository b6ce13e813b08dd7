//! Index structure of the strictly lower triangle of a symmetric sparse matrix.
use std::fmt;
use std::ops::Range;

/// Errors produced when validating raw pattern data.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PatternError {
    /// The offsets array is empty, does not start at zero, decreases, or does not end at the
    /// number of column indices.
    InvalidOffsets,
    /// A stored column index is not strictly below the diagonal.
    NotStrictlyLower { row: usize, col: usize },
    /// Column indices of a row are not strictly increasing.
    UnsortedRow { row: usize },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidOffsets => write!(f, "Row offsets are inconsistent with the column indices"),
            Self::NotStrictlyLower { row, col } => {
                write!(f, "Entry ({row}, {col}) is not in the strictly lower triangle")
            }
            Self::UnsortedRow { row } => write!(f, "Column indices of row {row} are not strictly increasing"),
        }
    }
}

impl std::error::Error for PatternError {}

/// Compressed row structure of the strictly lower triangle.
///
/// Row `i` stores the columns `columns[offsets[i]..offsets[i + 1]]`, which are sorted in
/// strictly increasing order and all smaller than `i`. The diagonal is implied and not stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowerTriangularPattern {
    offsets: Vec<usize>,
    columns: Vec<usize>,
}

impl LowerTriangularPattern {
    /// A pattern of dimension `dim` without any off-diagonal entries.
    pub fn empty(dim: usize) -> Self {
        Self {
            offsets: vec![0; dim + 1],
            columns: Vec::new(),
        }
    }

    pub fn try_from_offsets_and_columns(offsets: Vec<usize>, columns: Vec<usize>) -> Result<Self, PatternError> {
        let valid_offsets = offsets.first() == Some(&0)
            && offsets.last() == Some(&columns.len())
            && offsets.windows(2).all(|w| w[0] <= w[1]);
        if !valid_offsets {
            return Err(PatternError::InvalidOffsets);
        }

        for row in 0..offsets.len() - 1 {
            let row_columns = &columns[offsets[row]..offsets[row + 1]];
            if let Some(&col) = row_columns.iter().find(|&&col| col >= row) {
                return Err(PatternError::NotStrictlyLower { row, col });
            }
            if row_columns.windows(2).any(|w| w[0] >= w[1]) {
                return Err(PatternError::UnsortedRow { row });
            }
        }

        Ok(Self { offsets, columns })
    }

    /// Builds a pattern from per-row column sets.
    ///
    /// Each row is sorted and deduplicated. Columns that are not strictly below the diagonal
    /// are rejected.
    pub fn try_from_rows<I, R>(rows: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = usize>,
    {
        let mut offsets = vec![0];
        let mut columns = Vec::new();
        for row in rows {
            let mut row_columns: Vec<usize> = row.into_iter().collect();
            row_columns.sort_unstable();
            row_columns.dedup();
            columns.extend(row_columns);
            offsets.push(columns.len());
        }
        Self::try_from_offsets_and_columns(offsets, columns)
    }

    /// Constructs a pattern from data that is known to satisfy all invariants.
    pub(crate) fn from_offsets_and_columns_unchecked(offsets: Vec<usize>, columns: Vec<usize>) -> Self {
        debug_assert!(Self::try_from_offsets_and_columns(offsets.clone(), columns.clone()).is_ok());
        Self { offsets, columns }
    }

    /// Number of rows (and columns) of the matrix.
    pub fn dim(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Number of stored off-diagonal entries.
    pub fn nnz(&self) -> usize {
        self.columns.len()
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    /// Range of storage positions belonging to the given row.
    pub fn row_range(&self, row: usize) -> Range<usize> {
        self.offsets[row]..self.offsets[row + 1]
    }

    pub fn row(&self, row: usize) -> &[usize] {
        &self.columns[self.row_range(row)]
    }

    /// Storage position of the entry `(row, col)`, if it is part of the pattern.
    ///
    /// Rows are short for finite element matrices, so a linear scan is used.
    pub fn find(&self, row: usize, col: usize) -> Option<usize> {
        let range = self.row_range(row);
        self.columns[range.clone()]
            .iter()
            .position(|&c| c == col)
            .map(|local| range.start + local)
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.find(row, col).is_some()
    }
}
