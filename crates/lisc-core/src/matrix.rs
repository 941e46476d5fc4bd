//! Co-occurrence counts and derived scores.
//!
//! A [`CountsMatrix`] is the product of one collection sweep. Every count is
//! stored as `Option<u64>`: `None` marks an entry whose lookup failed or was
//! never issued, so a real zero count is never confused with a missing one.
//!
//! The lookup slots of a sweep are addressed by [`Position`] and enumerated
//! in a fixed order by [`CountsMatrix::plan`]: marginals first in list order,
//! then pairwise counts in row-major order.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ShapeError;
use crate::term::TermSet;
use crate::types::{Dim, RequestLog};

/// Whether a sweep used one term list against itself or two lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionMode {
    /// One list; B is the same as A and the matrix is symmetric.
    Single,
    /// Two lists; rows come from A and columns from B.
    Paired,
}

/// One lookup slot of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    /// Total count for term `i` of list A.
    MarginalA(usize),
    /// Total count for term `j` of list B.
    MarginalB(usize),
    /// Co-occurrence count of A term `i` with B term `j`.
    Cooccurrence(usize, usize),
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MarginalA(i) => write!(f, "marginal_a[{i}]"),
            Self::MarginalB(j) => write!(f, "marginal_b[{j}]"),
            Self::Cooccurrence(i, j) => write!(f, "cooccurrence[{i}][{j}]"),
        }
    }
}

/// Dense row-major grid of optional counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid")]
pub struct CountGrid {
    rows: usize,
    cols: usize,
    cells: Vec<Option<u64>>,
}

#[derive(Deserialize)]
struct RawGrid {
    rows: usize,
    cols: usize,
    cells: Vec<Option<u64>>,
}

impl TryFrom<RawGrid> for CountGrid {
    type Error = ShapeError;

    fn try_from(raw: RawGrid) -> Result<Self, Self::Error> {
        let grid = Self {
            rows: raw.rows,
            cols: raw.cols,
            cells: raw.cells,
        };
        grid.check_cells()?;
        Ok(grid)
    }
}

impl CountGrid {
    /// Creates a grid with every cell missing.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![None; rows * cols],
        }
    }

    /// Creates a fully populated grid from nested rows.
    ///
    /// Returns `None` if the rows are ragged.
    pub fn from_rows(rows: Vec<Vec<u64>>) -> Option<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != n_cols) {
            return None;
        }

        let cells = rows.into_iter().flatten().map(Some).collect();
        Some(Self {
            rows: n_rows,
            cols: n_cols,
            cells,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Value at `(i, j)`, `None` if missing or out of range.
    pub fn get(&self, i: usize, j: usize) -> Option<u64> {
        if i < self.rows && j < self.cols {
            self.cells[i * self.cols + j]
        } else {
            None
        }
    }

    /// Sets the value at `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of range.
    pub fn set(&mut self, i: usize, j: usize, value: Option<u64>) {
        assert!(i < self.rows && j < self.cols, "grid index out of range");
        self.cells[i * self.cols + j] = value;
    }

    /// One row as a slice.
    pub fn row(&self, i: usize) -> &[Option<u64>] {
        &self.cells[i * self.cols..(i + 1) * self.cols]
    }

    /// Returns true if no cell is missing.
    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    fn check_cells(&self) -> Result<(), ShapeError> {
        expect_len("cooccurrence cells", self.rows.saturating_mul(self.cols), self.cells.len())
    }

    /// Nested rows with missing cells replaced by `fill`.
    pub fn to_rows(&self, fill: u64) -> Vec<Vec<u64>> {
        (0..self.rows)
            .map(|i| self.row(i).iter().map(|c| c.unwrap_or(fill)).collect())
            .collect()
    }
}

/// Raw counts from one collection sweep.
///
/// The fields are public, so code that edits them directly should call
/// [`check_shape`](Self::check_shape) before indexing. Deserialization runs
/// the same check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCountsMatrix")]
pub struct CountsMatrix {
    pub mode: CollectionMode,
    pub terms_a: TermSet,
    pub terms_b: TermSet,
    pub cooccurrence: CountGrid,
    pub marginal_a: Vec<Option<u64>>,
    pub marginal_b: Vec<Option<u64>>,
    pub log: RequestLog,
    /// Set when the sweep was stopped by a cancellation request.
    pub cancelled: bool,
}

#[derive(Deserialize)]
struct RawCountsMatrix {
    mode: CollectionMode,
    terms_a: TermSet,
    terms_b: TermSet,
    cooccurrence: CountGrid,
    marginal_a: Vec<Option<u64>>,
    marginal_b: Vec<Option<u64>>,
    log: RequestLog,
    #[serde(default)]
    cancelled: bool,
}

impl TryFrom<RawCountsMatrix> for CountsMatrix {
    type Error = ShapeError;

    fn try_from(raw: RawCountsMatrix) -> Result<Self, Self::Error> {
        let matrix = Self {
            mode: raw.mode,
            terms_a: raw.terms_a,
            terms_b: raw.terms_b,
            cooccurrence: raw.cooccurrence,
            marginal_a: raw.marginal_a,
            marginal_b: raw.marginal_b,
            log: raw.log,
            cancelled: raw.cancelled,
        };
        matrix.check_shape()?;
        Ok(matrix)
    }
}

impl CountsMatrix {
    /// Empty matrix for one list collected against itself.
    pub fn single(terms: TermSet) -> Self {
        let n = terms.len();
        Self {
            mode: CollectionMode::Single,
            terms_b: terms.clone(),
            terms_a: terms,
            cooccurrence: CountGrid::new(n, n),
            marginal_a: vec![None; n],
            marginal_b: vec![None; n],
            log: RequestLog::new(),
            cancelled: false,
        }
    }

    /// Empty matrix for list A collected against list B.
    pub fn paired(terms_a: TermSet, terms_b: TermSet) -> Self {
        let (n_a, n_b) = (terms_a.len(), terms_b.len());
        Self {
            mode: CollectionMode::Paired,
            terms_a,
            terms_b,
            cooccurrence: CountGrid::new(n_a, n_b),
            marginal_a: vec![None; n_a],
            marginal_b: vec![None; n_b],
            log: RequestLog::new(),
            cancelled: false,
        }
    }

    /// Checks that term lists, marginals and the grid agree on the shape.
    pub fn check_shape(&self) -> Result<(), ShapeError> {
        let (rows, cols) = self.shape();
        self.cooccurrence.check_cells()?;
        expect_len("terms_a", rows, self.terms_a.len())?;
        expect_len("terms_b", cols, self.terms_b.len())?;
        expect_len("marginal_a", rows, self.marginal_a.len())?;
        expect_len("marginal_b", cols, self.marginal_b.len())?;
        if self.mode == CollectionMode::Single && self.terms_a != self.terms_b {
            return Err(ShapeError::SingleAxesDiffer);
        }
        Ok(())
    }

    /// `(rows, cols)` of the co-occurrence grid.
    pub fn shape(&self) -> (usize, usize) {
        (self.cooccurrence.rows(), self.cooccurrence.cols())
    }

    pub fn terms(&self, dim: Dim) -> &TermSet {
        match dim {
            Dim::A => &self.terms_a,
            Dim::B => &self.terms_b,
        }
    }

    pub fn marginals(&self, dim: Dim) -> &[Option<u64>] {
        match dim {
            Dim::A => &self.marginal_a,
            Dim::B => &self.marginal_b,
        }
    }

    /// Every lookup slot of this sweep, in issue order.
    ///
    /// Single mode: `n` marginals then the `n(n+1)/2` pairs with `i <= j`.
    /// Paired mode: `n_a` + `n_b` marginals then all `n_a * n_b` pairs.
    pub fn plan(&self) -> Vec<Position> {
        let (n_a, n_b) = self.shape();
        let mut plan = Vec::new();

        match self.mode {
            CollectionMode::Single => {
                plan.extend((0..n_a).map(Position::MarginalA));
                for i in 0..n_a {
                    plan.extend((i..n_a).map(|j| Position::Cooccurrence(i, j)));
                }
            }
            CollectionMode::Paired => {
                plan.extend((0..n_a).map(Position::MarginalA));
                plan.extend((0..n_b).map(Position::MarginalB));
                for i in 0..n_a {
                    plan.extend((0..n_b).map(|j| Position::Cooccurrence(i, j)));
                }
            }
        }
        plan
    }

    /// Value stored for a lookup slot.
    pub fn get(&self, position: Position) -> Option<u64> {
        match position {
            Position::MarginalA(i) => self.marginal_a.get(i).copied().flatten(),
            Position::MarginalB(j) => self.marginal_b.get(j).copied().flatten(),
            Position::Cooccurrence(i, j) => self.cooccurrence.get(i, j),
        }
    }

    /// Records the result of a lookup slot.
    ///
    /// In single mode marginals are written to both axes and pairwise counts
    /// are mirrored across the diagonal.
    pub fn set(&mut self, position: Position, value: u64) {
        let single = self.mode == CollectionMode::Single;
        match position {
            Position::MarginalA(i) => {
                self.marginal_a[i] = Some(value);
                if single {
                    self.marginal_b[i] = Some(value);
                }
            }
            Position::MarginalB(j) => self.marginal_b[j] = Some(value),
            Position::Cooccurrence(i, j) => {
                self.cooccurrence.set(i, j, Some(value));
                if single {
                    self.cooccurrence.set(j, i, Some(value));
                }
            }
        }
    }

    /// Lookup slots that hold no value.
    pub fn missing_positions(&self) -> Vec<Position> {
        self.plan()
            .into_iter()
            .filter(|p| self.get(*p).is_none())
            .collect()
    }

    /// Number of lookup slots that hold a value.
    pub fn filled_count(&self) -> usize {
        self.plan()
            .into_iter()
            .filter(|p| self.get(*p).is_some())
            .count()
    }

    /// Returns true if every lookup slot holds a value.
    pub fn is_complete(&self) -> bool {
        self.missing_positions().is_empty()
    }

    /// Filled cells where the co-occurrence exceeds one of its marginals.
    ///
    /// A co-occurrence count cannot exceed either term's total, so any
    /// entry returned here came from inconsistent remote data.
    pub fn invariant_violations(&self) -> Vec<(usize, usize)> {
        let (rows, cols) = self.shape();
        let mut violations = Vec::new();
        for i in 0..rows {
            for j in 0..cols {
                let (Some(c), Some(a), Some(b)) = (
                    self.cooccurrence.get(i, j),
                    self.get(Position::MarginalA(i)),
                    self.get(Position::MarginalB(j)),
                ) else {
                    continue;
                };
                if c > a.min(b) {
                    violations.push((i, j));
                }
            }
        }
        violations
    }
}

fn expect_len(part: &'static str, expected: usize, got: usize) -> Result<(), ShapeError> {
    if expected == got {
        Ok(())
    } else {
        Err(ShapeError::Length {
            part,
            expected,
            got,
        })
    }
}

/// Which derived score a [`Score`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoreKind {
    /// Co-occurrence divided by the A term's marginal.
    NormalizeA,
    /// Co-occurrence divided by the B term's marginal.
    NormalizeB,
    /// Jaccard-style association index.
    Association,
}

impl ScoreKind {
    /// The normalization kind for an axis.
    pub fn normalize(dim: Dim) -> Self {
        match dim {
            Dim::A => Self::NormalizeA,
            Dim::B => Self::NormalizeB,
        }
    }
}

impl fmt::Display for ScoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NormalizeA => write!(f, "normalize-a"),
            Self::NormalizeB => write!(f, "normalize-b"),
            Self::Association => write!(f, "association"),
        }
    }
}

/// A score matrix derived from a [`CountsMatrix`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub kind: ScoreKind,
    /// Same shape as the co-occurrence grid it was computed from.
    pub matrix: Vec<Vec<f64>>,
}

impl Score {
    pub fn shape(&self) -> (usize, usize) {
        (self.matrix.len(), self.matrix.first().map_or(0, Vec::len))
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.matrix.get(i).and_then(|row| row.get(j)).copied()
    }
}
