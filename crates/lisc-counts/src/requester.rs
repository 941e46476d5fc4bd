//! One rate-limited lookup at a time, with sweep bookkeeping.
//!
//! A [`Requester`] wraps a [`Transport`] and a shared [`RateLimiter`]. It is
//! opened at the start of a sweep, used for any number of lookups, and
//! closed at the end; the resulting [`RequestLog`] records start and end
//! times and the number of requests made.
//!
//! Failures are reported, never retried here.
//!
//! [`RateLimiter`]: crate::rate_limit::RateLimiter

use chrono::Utc;
use lisc_core::{DbInfo, RequestLog};
use tracing::debug;

use crate::rate_limit::SharedLimiter;
use crate::transport::{Transport, TransportError};

/// API misuse of the requester lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// A lookup or close was issued before `open`.
    #[error("requester is not open")]
    NotOpen,

    /// A lookup was issued after `close`.
    #[error("requester is already closed")]
    Closed,

    /// `open` was called on a requester that is already open.
    #[error("requester is already open")]
    AlreadyOpen,
}

/// Error types for a single lookup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Lifecycle of a requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequesterState {
    /// Created, not yet opened.
    Idle,
    /// Between `open` and `close`.
    Open,
    /// Closed; may be opened again for a new sweep.
    Closed,
}

/// Issues lookups through a transport, respecting the rate limiter.
pub struct Requester<T: Transport> {
    transport: T,
    limiter: SharedLimiter,
    log: RequestLog,
    state: RequesterState,
}

impl<T: Transport> Requester<T> {
    /// Creates an idle requester.
    pub fn new(transport: T, limiter: SharedLimiter) -> Self {
        Self {
            transport,
            limiter,
            log: RequestLog::new(),
            state: RequesterState::Idle,
        }
    }

    pub fn state(&self) -> RequesterState {
        self.state
    }

    /// The log of the current or most recent sweep.
    pub fn log(&self) -> &RequestLog {
        &self.log
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn limiter(&self) -> &SharedLimiter {
        &self.limiter
    }

    /// Starts a sweep with a fresh log.
    pub fn open(&mut self) -> Result<(), StateError> {
        if self.state == RequesterState::Open {
            return Err(StateError::AlreadyOpen);
        }

        self.log = RequestLog::new();
        self.log.start_time = Some(Utc::now());
        self.state = RequesterState::Open;
        debug!("Opened requester for sweep {}", self.log.sweep_id);
        Ok(())
    }

    /// Runs one lookup and returns the result count.
    ///
    /// Waits on the rate limiter first. The request counter advances even
    /// when the transport fails, since the remote call was still made.
    pub async fn lookup(&mut self, query: &str) -> Result<u64, RequestError> {
        self.ensure_open()?;
        self.limiter.lock().await.wait_if_needed().await;

        let result = self.transport.execute(query).await;
        self.log.request_count += 1;

        let count = result?;
        debug!("Lookup {} returned {} for {}", self.log.request_count, count, query);
        Ok(count)
    }

    /// Fetches the database description and records it in the log.
    ///
    /// Spaced and counted like a lookup.
    pub async fn db_info(&mut self) -> Result<Option<DbInfo>, RequestError> {
        self.ensure_open()?;
        self.limiter.lock().await.wait_if_needed().await;

        let result = self.transport.db_info().await;
        self.log.request_count += 1;

        let info = result?;
        if let Some(info) = &info {
            debug!("Database {} build {}", info.dbname, info.dbbuild);
        }
        self.log.db_info = info.clone();
        Ok(info)
    }

    fn ensure_open(&self) -> Result<(), StateError> {
        match self.state {
            RequesterState::Open => Ok(()),
            RequesterState::Idle => Err(StateError::NotOpen),
            RequesterState::Closed => Err(StateError::Closed),
        }
    }

    /// Ends the sweep and returns its finalized log.
    pub fn close(&mut self) -> Result<RequestLog, StateError> {
        self.ensure_open()?;

        self.log.end_time = Some(Utc::now());
        self.state = RequesterState::Closed;
        debug!(
            "Closed requester for sweep {} after {} requests",
            self.log.sweep_id, self.log.request_count
        );
        Ok(self.log.clone())
    }
}
