//! Co-occurrence collection engine.
//!
//! This module drives one collection sweep: it issues the marginal and
//! pairwise lookups for one or two term lists, strictly one at a time, and
//! assembles the results into a [`CountsMatrix`].
//!
//! ## Algorithm
//!
//! 1. Validate options and term lists (no network activity on failure)
//! 2. Open the requester, record the database description if
//!    `collect_info` is set, and lay out the lookup plan:
//!    - single list of `n` terms: `n` marginals, then the `n(n+1)/2` pairs
//!      with `i <= j` in row-major order, mirrored across the diagonal
//!    - two lists: `n_a` marginals, `n_b` marginals, then all `n_a * n_b`
//!      pairs in row-major order
//! 3. For each slot, check the cancellation token, then look it up
//!    - a transport failure is logged and the slot is left missing
//! 4. Close the requester and attach its log to the matrix
//! 5. Fail with `IncompleteCollection` if the share of failed lookups is
//!    above the threshold; a cancelled sweep skips this check
//!
//! The plan order is fixed, so partial progress is reproducible by
//! position.

use lisc_core::{CountsMatrix, Dim, Position, TermSet, pair_query};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::config::{CollectOptions, ConfigError};
use crate::rate_limit::SharedLimiter;
use crate::requester::{RequestError, Requester, StateError};
use crate::transport::Transport;

/// Error types for a collection sweep.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// The options are out of range.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A term list has no terms.
    #[error("term list {0} is empty")]
    EmptyTermSet(Dim),

    /// The requester was used outside an open sweep.
    #[error(transparent)]
    State(#[from] StateError),

    /// Too many lookups failed. The partial matrix is attached.
    #[error("collection incomplete: {failed} of {total} lookups failed")]
    IncompleteCollection {
        failed: usize,
        total: usize,
        /// Slots whose lookup failed, in plan order.
        missing: Vec<Position>,
        matrix: Box<CountsMatrix>,
    },
}

/// Runs collection sweeps through one requester.
///
/// # Example
///
/// ```rust,ignore
/// use lisc_counts::{CollectOptions, CollectionEngine};
///
/// let mut engine = CollectionEngine::new(transport, CollectOptions::default())?;
/// let counts = engine.collect(&terms_a, Some(&terms_b), None).await?;
///
/// println!("Marginals A: {:?}", counts.marginal_a);
/// println!("Requests: {}", counts.log.request_count);
/// ```
pub struct CollectionEngine<T: Transport> {
    requester: Requester<T>,
    options: CollectOptions,
}

impl<T: Transport> CollectionEngine<T> {
    /// Creates an engine with its own rate limiter built from `options`.
    pub fn new(transport: T, options: CollectOptions) -> Result<Self, CollectError> {
        options.validate()?;
        let limiter = options.limiter().shared();
        Ok(Self {
            requester: Requester::new(transport, limiter),
            options,
        })
    }

    /// Creates an engine that shares an existing rate limiter.
    ///
    /// The limiter's own spacing applies; the rate fields of `options` are
    /// not used.
    pub fn with_limiter(
        transport: T,
        limiter: SharedLimiter,
        options: CollectOptions,
    ) -> Result<Self, CollectError> {
        options.validate()?;
        Ok(Self {
            requester: Requester::new(transport, limiter),
            options,
        })
    }

    pub fn options(&self) -> &CollectOptions {
        &self.options
    }

    pub fn requester(&self) -> &Requester<T> {
        &self.requester
    }

    /// Collects co-occurrence counts.
    ///
    /// With `terms_b` absent, `terms_a` is collected against itself.
    ///
    /// # Returns
    ///
    /// The filled matrix. Entries whose lookup failed are `None`. If
    /// `cancel` fires, the partial matrix is returned with
    /// `cancelled == true` and every unvisited slot missing.
    pub async fn collect(
        &mut self,
        terms_a: &TermSet,
        terms_b: Option<&TermSet>,
        cancel: Option<&CancelToken>,
    ) -> Result<CountsMatrix, CollectError> {
        if terms_a.is_empty() {
            return Err(CollectError::EmptyTermSet(Dim::A));
        }
        let mut matrix = match terms_b {
            Some(b) if b.is_empty() => return Err(CollectError::EmptyTermSet(Dim::B)),
            Some(b) => CountsMatrix::paired(terms_a.clone(), b.clone()),
            None => CountsMatrix::single(terms_a.clone()),
        };

        let plan = matrix.plan();
        let total = plan.len();
        let mut failed = Vec::new();
        let start = Instant::now();

        self.requester.open()?;
        info!(
            "Starting sweep {}: {} x {} terms, {} lookups",
            self.requester.log().sweep_id,
            matrix.terms_a.len(),
            matrix.terms_b.len(),
            total
        );

        if self.options.collect_info {
            // Metadata only; a failure does not count against the sweep
            match self.requester.db_info().await {
                Ok(_) => {}
                Err(RequestError::Transport(e)) => warn!("Database info unavailable: {}", e),
                Err(RequestError::State(e)) => return Err(e.into()),
            }
        }

        for (done, position) in plan.into_iter().enumerate() {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                info!("Sweep cancelled after {} of {} lookups", done, total);
                matrix.cancelled = true;
                break;
            }

            let query = query_for(&matrix, position);
            match self.requester.lookup(&query).await {
                Ok(count) => matrix.set(position, count),
                Err(RequestError::Transport(e)) => {
                    warn!("Lookup for {} failed: {}", position, e);
                    failed.push(position);
                }
                Err(RequestError::State(e)) => return Err(e.into()),
            }
        }

        matrix.log = self.requester.close()?;

        let violations = matrix.invariant_violations();
        if !violations.is_empty() {
            warn!(
                "{} co-occurrence counts exceed their marginals: {:?}",
                violations.len(),
                violations
            );
        }

        info!(
            "Finished sweep {} in {:?}: {} requests, {} failed",
            matrix.log.sweep_id,
            start.elapsed(),
            matrix.log.request_count,
            failed.len()
        );

        if !matrix.cancelled
            && exceeds_threshold(failed.len(), total, self.options.failure_threshold)
        {
            return Err(CollectError::IncompleteCollection {
                failed: failed.len(),
                total,
                missing: failed,
                matrix: Box::new(matrix),
            });
        }

        if !failed.is_empty() {
            debug!("Returning matrix with {} missing entries", failed.len());
        }
        Ok(matrix)
    }
}

/// Collects counts with a fresh engine.
///
/// Convenience for one-off sweeps; use [`CollectionEngine`] to reuse a
/// requester or share a rate limiter.
pub async fn collect<T: Transport>(
    transport: T,
    terms_a: &TermSet,
    terms_b: Option<&TermSet>,
    options: CollectOptions,
) -> Result<CountsMatrix, CollectError> {
    CollectionEngine::new(transport, options)?
        .collect(terms_a, terms_b, None)
        .await
}

/// Query string for one lookup slot.
fn query_for(matrix: &CountsMatrix, position: Position) -> String {
    let a = matrix.terms_a.terms();
    let b = matrix.terms_b.terms();
    match position {
        Position::MarginalA(i) => a[i].query(),
        Position::MarginalB(j) => b[j].query(),
        Position::Cooccurrence(i, j) => pair_query(&a[i], &b[j]),
    }
}

fn exceeds_threshold(failed: usize, total: usize, threshold: f64) -> bool {
    total > 0 && (failed as f64 / total as f64) > threshold
}
