//! lisc-counts: Co-occurrence collection and scoring
//!
//! This crate provides:
//! - A rate-limited requester around a pluggable search transport
//! - The collection engine that sweeps marginal and pairwise lookups
//! - Cooperative cancellation of long sweeps
//! - Normalization and association (Jaccard) scores
//! - A stateful [`Counts`] session for interactive use
//!
//! ## Modules
//!
//! - [`transport`]: The seam to the remote search service
//! - [`rate_limit`]: Minimum spacing and burst cooldowns between calls
//! - [`requester`]: Open/lookup/close lifecycle with a request log
//! - [`engine`]: The collection sweep
//! - [`cancel`]: Cancellation handle and token
//! - [`score`]: Score computation
//! - [`config`]: Collection options and environment loading
//! - [`session`]: Session object over the above
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use lisc_core::build_term_set;
//! use lisc_counts::{CollectOptions, CollectionEngine, Measure, compute_score};
//!
//! let a = build_term_set("A", vec![vec!["brain"], vec!["cognition"]], None, None)?;
//! let b = build_term_set("B", vec![vec!["body"], vec!["biology"]], None, None)?;
//!
//! let mut engine = CollectionEngine::new(transport, CollectOptions::from_env()?)?;
//! let counts = engine.collect(&a, Some(&b), None).await?;
//!
//! let score = compute_score(&counts, Measure::Association, None)?;
//! println!("brain/body: {:?}", score.get(0, 0));
//! ```

pub mod cancel;
pub mod config;
pub mod engine;
pub mod rate_limit;
pub mod requester;
pub mod score;
pub mod session;
pub mod transport;

pub use cancel::{CancelHandle, CancelToken, cancel_pair};
pub use config::{CollectOptions, ConfigError, DEFAULT_FAILURE_THRESHOLD, DEFAULT_MIN_INTERVAL};
pub use engine::{CollectError, CollectionEngine, collect};
pub use rate_limit::{Burst, RateLimiter, SharedLimiter};
pub use requester::{RequestError, Requester, RequesterState, StateError};
pub use score::{Measure, ScoreError, compute_score, score};
pub use session::{Counts, SessionError, TopAssociation};
pub use transport::{Transport, TransportError};

// Re-export lisc-core for downstream crates
pub use lisc_core;
