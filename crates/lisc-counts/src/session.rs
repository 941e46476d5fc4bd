//! Stateful convenience wrapper over collection and scoring.
//!
//! [`Counts`] keeps the term lists, the last collected matrix and the last
//! computed score together, for callers who prefer a session object over
//! passing data between the free functions. Everything it does is a thin
//! call into [`TermSet`], [`CollectionEngine`] and [`score`](crate::score).

use lisc_core::{CountsMatrix, Dim, Score, ScoreKind, TermError, TermKind, TermSet};

use crate::cancel::CancelToken;
use crate::engine::{CollectError, CollectionEngine};
use crate::score::{Measure, ScoreError, compute_score};
use crate::transport::Transport;

/// Error types for session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Term(#[from] TermError),

    #[error(transparent)]
    Collect(#[from] CollectError),

    #[error(transparent)]
    Score(#[from] ScoreError),

    /// No terms are set for the requested axis.
    #[error("no terms set for dimension {0}")]
    NoTerms(Dim),

    /// No collection has been run yet.
    #[error("no counts collected yet")]
    NoCounts,

    /// No score has been computed yet.
    #[error("no score computed yet")]
    NoScore,
}

/// The strongest partner of one term under the current score.
#[derive(Debug, Clone, PartialEq)]
pub struct TopAssociation {
    pub label: String,
    pub partner: String,
    pub score: f64,
}

/// Session state for one co-occurrence analysis.
#[derive(Debug, Default)]
pub struct Counts {
    terms_a: Option<TermSet>,
    terms_b: Option<TermSet>,
    counts: Option<CountsMatrix>,
    score: Option<Score>,
}

impl Counts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the term list for one axis, replacing any previous list.
    pub fn set_terms<S: Into<String>>(
        &mut self,
        dim: Dim,
        lists: Vec<Vec<S>>,
    ) -> Result<(), SessionError> {
        let mut set = TermSet::new(dim.to_string());
        set.add_terms(lists, TermKind::Terms)?;
        *self.slot_mut(dim) = Some(set);
        Ok(())
    }

    /// Sets inclusion words for the terms of one axis.
    pub fn set_inclusions<S: Into<String>>(
        &mut self,
        dim: Dim,
        lists: Vec<Vec<S>>,
    ) -> Result<(), SessionError> {
        self.terms_mut(dim)?.add_terms(lists, TermKind::Inclusions)?;
        Ok(())
    }

    /// Sets exclusion words for the terms of one axis.
    pub fn set_exclusions<S: Into<String>>(
        &mut self,
        dim: Dim,
        lists: Vec<Vec<S>>,
    ) -> Result<(), SessionError> {
        self.terms_mut(dim)?.add_terms(lists, TermKind::Exclusions)?;
        Ok(())
    }

    /// Uses an already-built term set for one axis.
    pub fn set_term_set(&mut self, dim: Dim, set: TermSet) {
        *self.slot_mut(dim) = Some(set);
    }

    pub fn terms(&self, dim: Dim) -> Option<&TermSet> {
        match dim {
            Dim::A => self.terms_a.as_ref(),
            Dim::B => self.terms_b.as_ref(),
        }
    }

    /// The most recent collection result.
    pub fn counts(&self) -> Option<&CountsMatrix> {
        self.counts.as_ref()
    }

    /// The most recent score.
    pub fn score(&self) -> Option<&Score> {
        self.score.as_ref()
    }

    /// Restores previously collected counts, e.g. from a saved snapshot.
    pub fn load_counts(&mut self, counts: CountsMatrix) {
        self.terms_a = Some(counts.terms_a.clone());
        self.terms_b = match counts.mode {
            lisc_core::CollectionMode::Paired => Some(counts.terms_b.clone()),
            lisc_core::CollectionMode::Single => None,
        };
        self.counts = Some(counts);
        self.score = None;
    }

    /// Runs a sweep over the current term lists.
    ///
    /// Uses list A against itself unless list B is set. A previous score
    /// is discarded, since it no longer matches the counts.
    pub async fn run_collection<T: Transport>(
        &mut self,
        engine: &mut CollectionEngine<T>,
        cancel: Option<&CancelToken>,
    ) -> Result<&CountsMatrix, SessionError> {
        let terms_a = self.terms_a.as_ref().ok_or(SessionError::NoTerms(Dim::A))?;
        let counts = engine
            .collect(terms_a, self.terms_b.as_ref(), cancel)
            .await?;

        self.score = None;
        Ok(self.counts.insert(counts))
    }

    /// Computes a score over the current counts, replacing any previous one.
    pub fn compute_score(
        &mut self,
        measure: Measure,
        dim: Option<Dim>,
    ) -> Result<&Score, SessionError> {
        let counts = self.counts.as_ref().ok_or(SessionError::NoCounts)?;
        let score = compute_score(counts, measure, dim)?;
        Ok(self.score.insert(score))
    }

    /// Labels and marginal counts for one axis, largest first.
    ///
    /// Missing counts sort last.
    pub fn check_counts(&self, dim: Dim) -> Result<Vec<(String, Option<u64>)>, SessionError> {
        let counts = self.counts.as_ref().ok_or(SessionError::NoCounts)?;
        let mut rows: Vec<(String, Option<u64>)> = counts
            .terms(dim)
            .labels()
            .into_iter()
            .map(str::to_string)
            .zip(counts.marginals(dim).iter().copied())
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(rows)
    }

    /// The term with the most papers on one axis.
    pub fn check_top(&self, dim: Dim) -> Result<Option<(String, u64)>, SessionError> {
        Ok(self
            .check_counts(dim)?
            .into_iter()
            .find_map(|(label, count)| count.map(|c| (label, c))))
    }

    /// For each term on `dim`, the term on the other axis it scores highest
    /// with under the current score.
    ///
    /// In single-list sessions a term is never its own partner.
    pub fn check_cooc(&self, dim: Dim) -> Result<Vec<TopAssociation>, SessionError> {
        let counts = self.counts.as_ref().ok_or(SessionError::NoCounts)?;
        let score = self.score.as_ref().ok_or(SessionError::NoScore)?;

        let single = counts.mode == lisc_core::CollectionMode::Single;
        let (rows, cols) = score.shape();
        let (own, other, n_own, n_other) = match dim {
            Dim::A => (&counts.terms_a, &counts.terms_b, rows, cols),
            Dim::B => (&counts.terms_b, &counts.terms_a, cols, rows),
        };

        let mut out = Vec::with_capacity(n_own);
        for k in 0..n_own {
            let best = (0..n_other)
                .filter(|&m| !(single && m == k))
                .filter_map(|m| {
                    let value = match dim {
                        Dim::A => score.get(k, m),
                        Dim::B => score.get(m, k),
                    }?;
                    Some((m, value))
                })
                .max_by(|x, y| x.1.total_cmp(&y.1));

            if let Some((m, value)) = best {
                out.push(TopAssociation {
                    label: own.terms()[k].label().to_string(),
                    partner: other.terms()[m].label().to_string(),
                    score: value,
                });
            }
        }
        Ok(out)
    }

    /// Kind of the current score, if any.
    pub fn score_kind(&self) -> Option<ScoreKind> {
        self.score.as_ref().map(|s| s.kind)
    }

    fn slot_mut(&mut self, dim: Dim) -> &mut Option<TermSet> {
        match dim {
            Dim::A => &mut self.terms_a,
            Dim::B => &mut self.terms_b,
        }
    }

    fn terms_mut(&mut self, dim: Dim) -> Result<&mut TermSet, SessionError> {
        self.slot_mut(dim).as_mut().ok_or(SessionError::NoTerms(dim))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lisc_core::Position;

    fn loaded_single() -> Counts {
        let mut counts = Counts::new();
        counts
            .set_terms(Dim::A, vec![vec!["brain"], vec!["cognition"], vec!["memory"]])
            .unwrap();

        let mut matrix = CountsMatrix::single(counts.terms(Dim::A).unwrap().clone());
        for (i, m) in [100, 40, 60].into_iter().enumerate() {
            matrix.set(Position::MarginalA(i), m);
        }
        for (i, j, c) in [(0, 0, 100), (0, 1, 10), (0, 2, 30), (1, 1, 40), (1, 2, 20), (2, 2, 60)] {
            matrix.set(Position::Cooccurrence(i, j), c);
        }
        counts.load_counts(matrix);
        counts
    }

    #[test]
    fn inclusions_need_terms_first() {
        let mut counts = Counts::new();
        let err = counts.set_inclusions(Dim::A, vec![vec!["brain"]]).unwrap_err();
        assert!(matches!(err, SessionError::NoTerms(Dim::A)));
    }

    #[test]
    fn set_exclusions_applies_to_terms() {
        let mut counts = Counts::new();
        counts
            .set_terms(Dim::A, vec![vec!["gene", "genetic"], vec!["cortex", "cortical"]])
            .unwrap();
        counts
            .set_exclusions(Dim::A, vec![vec!["protein"], vec!["subcortical"]])
            .unwrap();

        let terms = counts.terms(Dim::A).unwrap();
        assert_eq!(terms.labels(), vec!["gene", "cortex"]);
        assert_eq!(
            terms.terms()[1].query(),
            r#"("cortex"OR"cortical")NOT("subcortical")"#
        );

        let err = counts.set_exclusions(Dim::A, vec![vec!["x"]]).unwrap_err();
        assert!(matches!(err, SessionError::Term(TermError::LengthMismatch { .. })));
    }

    #[test]
    fn check_counts_sorted_and_top() {
        let counts = loaded_single();

        let rows = counts.check_counts(Dim::A).unwrap();
        assert_eq!(
            rows,
            vec![
                ("brain".to_string(), Some(100)),
                ("memory".to_string(), Some(60)),
                ("cognition".to_string(), Some(40)),
            ]
        );
        assert_eq!(
            counts.check_top(Dim::A).unwrap(),
            Some(("brain".to_string(), 100))
        );
    }

    #[test]
    fn check_cooc_skips_self_in_single_mode() {
        let mut counts = loaded_single();
        assert!(matches!(counts.check_cooc(Dim::A), Err(SessionError::NoScore)));

        counts.compute_score(Measure::Association, None).unwrap();
        let top = counts.check_cooc(Dim::A).unwrap();

        // brain-memory: 30 / (100 + 60 - 30)
        assert_eq!(top[0].label, "brain");
        assert_eq!(top[0].partner, "memory");
        assert_eq!(top[0].score, 30.0 / 130.0);
        assert_eq!(top[1].partner, "memory");
        assert_eq!(top[2].partner, "cognition");
        assert_eq!(counts.score_kind(), Some(ScoreKind::Association));
    }

    #[test]
    fn score_requires_counts() {
        let mut counts = Counts::new();
        let err = counts.compute_score(Measure::Association, None).unwrap_err();
        assert!(matches!(err, SessionError::NoCounts));
    }
}
