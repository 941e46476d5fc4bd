//! lisc-eutils: NCBI E-Utilities transport
//!
//! Implements [`lisc_counts::Transport`] over the E-Utilities `esearch`
//! endpoint, so a [`CollectionEngine`](lisc_counts::CollectionEngine) can
//! collect counts from PubMed or any other Entrez database. With
//! `collect_info` set, each sweep also records the `einfo` description of
//! the database in its request log.
//!
//! # Usage
//!
//! ```rust,ignore
//! use lisc_counts::CollectionEngine;
//! use lisc_eutils::{EUtils, EUtilsConfig};
//!
//! let config = EUtilsConfig::from_env()?;
//! let options = config.recommended_options();
//! let mut engine = CollectionEngine::new(EUtils::new(config)?, options)?;
//!
//! let counts = engine.collect(&terms_a, Some(&terms_b), None).await?;
//! ```

pub mod client;
pub mod config;

pub use client::{EUtils, EUtilsError, parse_count, parse_db_info};
pub use lisc_counts::lisc_core::DbInfo;
pub use config::{DEFAULT_BASE_URL, DEFAULT_DB, EUtilsConfig, EUtilsConfigError};
