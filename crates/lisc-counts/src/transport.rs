//! The remote lookup seam.
//!
//! A [`Transport`] turns a query string into a result count. The real
//! implementation talks to the E-Utilities service (see `lisc-eutils`);
//! tests substitute in-memory stubs.

use std::future::Future;

use lisc_core::DbInfo;

/// Error types for a single remote lookup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request could not be sent or no response arrived.
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a non-success status.
    #[error("server error ({status}): {message}")]
    Status { status: u16, message: String },

    /// The response body did not contain a usable count.
    #[error("unparseable response: {0}")]
    Parse(String),
}

/// Executes one query against the literature database.
///
/// Implementations must not retry internally; retry and failure policy
/// belongs to the collection engine.
pub trait Transport: Send + Sync {
    /// Returns the number of records matching `query`.
    fn execute(&self, query: &str) -> impl Future<Output = Result<u64, TransportError>> + Send;

    /// Describes the database being searched.
    ///
    /// `None` means the backend has nothing to report. Callers go through
    /// [`Requester::db_info`](crate::requester::Requester::db_info) so the
    /// call is rate limited like any lookup.
    fn db_info(&self) -> impl Future<Output = Result<Option<DbInfo>, TransportError>> + Send {
        async { Ok(None) }
    }
}
