//! Identifier, axis and request-log types shared across LISC crates.
//!
//! All types derive `Debug`, `Clone`, `Serialize`, and `Deserialize` so that
//! collection results can be inspected, copied, and snapshotted to disk.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Tag shared by everything one collection sweep produces.
///
/// A requester draws a fresh id each time it opens, so the `Starting sweep`
/// and `Finished sweep` log lines, the [`RequestLog`] and any saved counts
/// snapshot can be matched up after the fact. Reopening a requester never
/// reuses an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SweepId(pub Uuid);

impl SweepId {
    /// Draws an id for a sweep that is about to open.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Restores the id of a recorded sweep.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SweepId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SweepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SweepId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ============================================================================
// Axes
// ============================================================================

/// One axis of the co-occurrence matrix.
///
/// `A` indexes rows, `B` indexes columns. In single-list collections both
/// axes refer to the same term set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dim {
    A,
    B,
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

impl FromStr for Dim {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" | "a" => Ok(Self::A),
            "B" | "b" => Ok(Self::B),
            other => Err(format!("unknown dimension: {other}")),
        }
    }
}

// ============================================================================
// Request Log
// ============================================================================

/// Metadata for one collection sweep.
///
/// Created when the sweep opens, updated by every lookup and finalized when
/// the sweep closes. Read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestLog {
    /// Sweep this log belongs to.
    pub sweep_id: SweepId,

    /// When the sweep was opened.
    pub start_time: Option<DateTime<Utc>>,

    /// When the sweep was closed.
    pub end_time: Option<DateTime<Utc>>,

    /// Number of remote lookups issued.
    pub request_count: u64,

    /// Metadata of the searched database, when the sweep asked for it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_info: Option<DbInfo>,
}

impl RequestLog {
    /// Creates an empty log for a fresh sweep.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sweep_id: SweepId::new(),
            start_time: None,
            end_time: None,
            request_count: 0,
            db_info: None,
        }
    }

    /// Wall-clock time between open and close, if both are set.
    #[must_use]
    pub fn elapsed(&self) -> Option<TimeDelta> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Returns true once the sweep has been closed.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.end_time.is_some()
    }
}

impl Default for RequestLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Description of the searched database at collection time.
///
/// Counts drift as the database grows, so a snapshot records which build it
/// was collected against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbInfo {
    #[serde(default)]
    pub dbname: String,
    #[serde(default)]
    pub menuname: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub dbbuild: String,
    #[serde(default)]
    pub count: String,
    #[serde(default)]
    pub lastupdate: String,
}
