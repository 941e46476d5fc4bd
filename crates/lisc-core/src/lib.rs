//! lisc-core: Core data types for LISC literature scanning
//!
//! This crate provides:
//! - Search terms with synonyms, inclusions and exclusions
//! - Query string construction for the remote literature database
//! - The co-occurrence counts matrix produced by a collection sweep
//! - Score matrices derived from counts
//! - Request logs describing a sweep
//!
//! Nothing here performs I/O; collection lives in `lisc-counts` and
//! persistence in `lisc-store`.
//!
//! # Usage
//!
//! ```
//! use lisc_core::term::build_term_set;
//!
//! let terms = build_term_set(
//!     "A",
//!     vec![vec!["gene", "genetic"], vec!["cortex", "cortical"]],
//!     None,
//!     Some(vec![vec!["protein"], vec!["subcortical"]]),
//! )
//! .unwrap();
//!
//! assert_eq!(terms.terms()[0].query(), r#"("gene"OR"genetic")NOT("protein")"#);
//! ```

pub mod error;
pub mod matrix;
pub mod term;
pub mod types;

pub use error::{ShapeError, TermError};
pub use matrix::{CollectionMode, CountGrid, CountsMatrix, Position, Score, ScoreKind};
pub use term::{Term, TermKind, TermReport, TermSet, build_query, build_term_set, pair_query};
pub use types::{DbInfo, Dim, RequestLog, SweepId};
