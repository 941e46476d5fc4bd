//! Normalization and association scores over a counts matrix.
//!
//! Two measures are available:
//!
//! - **Normalize**: `cooc[i][j] / marginal[k]`, where `k` is the row for
//!   axis A or the column for axis B. Read as "the fraction of papers with
//!   the dim-term that also mention the other term".
//! - **Association**: the Jaccard index
//!   `cooc[i][j] / (marginal_a[i] + marginal_b[j] - cooc[i][j])`, which
//!   needs no axis choice.
//!
//! A zero denominator yields a score of 0: a term with no papers has no
//! overlap with anything. Missing counts are never scored.

use lisc_core::{CountsMatrix, Dim, Position, Score, ScoreKind, ShapeError};

/// Error types for score computation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoreError {
    /// The counts needed for the score contain missing entries.
    #[error("cannot score incomplete data: {} missing entries", .positions.len())]
    IncompleteData { positions: Vec<Position> },

    /// Normalization was requested without choosing an axis.
    #[error("normalization requires a dimension (A or B)")]
    MissingDim,

    /// The matrix parts disagree on its shape.
    #[error("malformed counts matrix: {0}")]
    Shape(#[from] ShapeError),
}

/// The family of score to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    Normalize,
    Association,
}

/// Computes a score, choosing the normalization axis from `dim`.
///
/// `dim` is required for [`Measure::Normalize`] and ignored for
/// [`Measure::Association`].
pub fn compute_score(
    matrix: &CountsMatrix,
    measure: Measure,
    dim: Option<Dim>,
) -> Result<Score, ScoreError> {
    let kind = match (measure, dim) {
        (Measure::Normalize, Some(dim)) => ScoreKind::normalize(dim),
        (Measure::Normalize, None) => return Err(ScoreError::MissingDim),
        (Measure::Association, _) => ScoreKind::Association,
    };
    score(matrix, kind)
}

/// Computes a score of the given kind.
pub fn score(matrix: &CountsMatrix, kind: ScoreKind) -> Result<Score, ScoreError> {
    matrix.check_shape()?;
    let missing = missing_inputs(matrix, kind);
    if !missing.is_empty() {
        return Err(ScoreError::IncompleteData { positions: missing });
    }

    let (rows, cols) = matrix.shape();
    let mut out = vec![vec![0.0; cols]; rows];

    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            // Presence checked above
            let cooc = matrix.cooccurrence.get(i, j).unwrap_or(0) as f64;
            let a = matrix.marginal_a[i].unwrap_or(0) as f64;
            let b = matrix.marginal_b[j].unwrap_or(0) as f64;

            let denominator = match kind {
                ScoreKind::NormalizeA => a,
                ScoreKind::NormalizeB => b,
                ScoreKind::Association => a + b - cooc,
            };
            *cell = if denominator > 0.0 { cooc / denominator } else { 0.0 };
        }
    }

    Ok(Score { kind, matrix: out })
}

/// Every count the score depends on that is missing.
fn missing_inputs(matrix: &CountsMatrix, kind: ScoreKind) -> Vec<Position> {
    let (rows, cols) = matrix.shape();
    let mut missing = Vec::new();

    if kind != ScoreKind::NormalizeB {
        missing.extend(
            (0..rows)
                .filter(|&i| matrix.marginal_a[i].is_none())
                .map(Position::MarginalA),
        );
    }
    if kind != ScoreKind::NormalizeA {
        missing.extend(
            (0..cols)
                .filter(|&j| matrix.marginal_b[j].is_none())
                .map(Position::MarginalB),
        );
    }
    for i in 0..rows {
        for j in 0..cols {
            if matrix.cooccurrence.get(i, j).is_none() {
                missing.push(Position::Cooccurrence(i, j));
            }
        }
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use lisc_core::build_term_set;

    fn paired(marginal_a: &[u64], marginal_b: &[u64], cooc: &[&[u64]]) -> CountsMatrix {
        let a = build_term_set(
            "A",
            (0..marginal_a.len()).map(|i| vec![format!("a{i}")]).collect(),
            None,
            None,
        )
        .unwrap();
        let b = build_term_set(
            "B",
            (0..marginal_b.len()).map(|j| vec![format!("b{j}")]).collect(),
            None,
            None,
        )
        .unwrap();

        let mut matrix = CountsMatrix::paired(a, b);
        for (i, &m) in marginal_a.iter().enumerate() {
            matrix.set(Position::MarginalA(i), m);
        }
        for (j, &m) in marginal_b.iter().enumerate() {
            matrix.set(Position::MarginalB(j), m);
        }
        for (i, row) in cooc.iter().enumerate() {
            for (j, &c) in row.iter().enumerate() {
                matrix.set(Position::Cooccurrence(i, j), c);
            }
        }
        matrix
    }

    #[test]
    fn normalize_by_a_divides_rows() {
        let matrix = paired(&[10, 5], &[8, 3], &[&[2, 1], &[1, 0]]);
        let score = compute_score(&matrix, Measure::Normalize, Some(Dim::A)).unwrap();

        assert_eq!(score.kind, ScoreKind::NormalizeA);
        assert_eq!(score.matrix, vec![vec![0.2, 0.1], vec![0.2, 0.0]]);
    }

    #[test]
    fn normalize_by_b_divides_columns() {
        let matrix = paired(&[10, 5], &[8, 4], &[&[2, 1], &[1, 0]]);
        let score = compute_score(&matrix, Measure::Normalize, Some(Dim::B)).unwrap();

        assert_eq!(score.matrix, vec![vec![0.25, 0.25], vec![0.125, 0.0]]);
    }

    #[test]
    fn normalize_zero_marginal_scores_zero() {
        let matrix = paired(&[0, 5], &[8], &[&[0], &[2]]);
        let score = compute_score(&matrix, Measure::Normalize, Some(Dim::A)).unwrap();

        assert_eq!(score.matrix[0], vec![0.0]);
        assert_eq!(score.matrix[1], vec![0.4]);
    }

    #[test]
    fn association_is_jaccard() {
        let matrix = paired(&[10, 5], &[8, 3], &[&[2, 1], &[1, 0]]);
        let score = compute_score(&matrix, Measure::Association, None).unwrap();

        assert_eq!(score.get(0, 0), Some(2.0 / 16.0));
        assert_eq!(score.get(0, 1), Some(1.0 / 12.0));
        assert_eq!(score.get(1, 1), Some(0.0));
    }

    #[test]
    fn association_all_zero_is_zero() {
        let matrix = paired(&[0], &[0], &[&[0]]);
        let score = score(&matrix, ScoreKind::Association).unwrap();
        assert_eq!(score.matrix, vec![vec![0.0]]);
    }

    #[test]
    fn association_bounded_for_consistent_inputs() {
        for a in 0..6u64 {
            for b in 0..6u64 {
                for c in 0..=a.min(b) {
                    let matrix = paired(&[a], &[b], &[&[c]]);
                    let s = score(&matrix, ScoreKind::Association).unwrap().matrix[0][0];
                    assert!((0.0..=1.0).contains(&s), "a={a} b={b} c={c} -> {s}");
                }
            }
        }
    }

    #[test]
    fn association_of_a_term_with_itself_is_one() {
        let matrix = paired(&[7], &[7], &[&[7]]);
        assert_eq!(score(&matrix, ScoreKind::Association).unwrap().matrix[0][0], 1.0);
    }

    #[test]
    fn normalize_requires_dim() {
        let matrix = paired(&[1], &[1], &[&[1]]);
        assert_eq!(
            compute_score(&matrix, Measure::Normalize, None).unwrap_err(),
            ScoreError::MissingDim
        );
    }

    #[test]
    fn missing_entries_are_named() {
        let mut matrix = paired(&[10, 5], &[8, 3], &[&[2, 1], &[1, 0]]);
        matrix.cooccurrence.set(1, 0, None);
        matrix.marginal_b[1] = None;

        let err = score(&matrix, ScoreKind::Association).unwrap_err();
        assert_eq!(
            err,
            ScoreError::IncompleteData {
                positions: vec![Position::MarginalB(1), Position::Cooccurrence(1, 0)]
            }
        );

        // Normalizing by A does not need marginal_b, but still needs the pair
        let err = score(&matrix, ScoreKind::NormalizeA).unwrap_err();
        assert_eq!(
            err,
            ScoreError::IncompleteData {
                positions: vec![Position::Cooccurrence(1, 0)]
            }
        );
    }

    #[test]
    fn short_marginal_is_shape_error() {
        let mut matrix = paired(&[10, 5], &[8], &[&[2], &[1]]);
        matrix.marginal_a.pop();

        let err = compute_score(&matrix, Measure::Association, None).unwrap_err();
        assert_eq!(
            err,
            ScoreError::Shape(ShapeError::Length {
                part: "marginal_a",
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn scoring_leaves_counts_untouched() {
        let matrix = paired(&[10], &[8], &[&[2]]);
        let before = matrix.clone();
        let _ = score(&matrix, ScoreKind::Association).unwrap();
        assert_eq!(matrix, before);
    }
}
