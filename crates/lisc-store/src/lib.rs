//! lisc-store: File-based storage for LISC
//!
//! This crate provides:
//! - A directory layout for term lists, collected counts and scores
//! - JSON snapshots of [`CountsMatrix`] and [`Score`] keyed by name
//! - Plain-text term list loading
//!
//! # Usage
//!
//! ```rust,ignore
//! use lisc_store::{Database, StoreConfig};
//!
//! let db = Database::open(&StoreConfig::from_env())?;
//! let terms = db.load_term_set("A", "brain_regions")?;
//!
//! // Save a collected sweep
//! db.save(&counts, "regions-vs-functions")?;
//!
//! // Load it back later
//! let counts: CountsMatrix = db.load("regions-vs-functions")?;
//! ```
//!
//! [`CountsMatrix`]: lisc_core::CountsMatrix
//! [`Score`]: lisc_core::Score

pub mod error;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::{DEFAULT_ROOT, Database, Persisted, StoreConfig, Structure};

// Re-export lisc-core for downstream crates
pub use lisc_core;
