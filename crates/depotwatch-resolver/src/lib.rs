//! Depotwatch Resolver - Cascading manifest resolution.
//!
//! This crate resolves current depot/build data for one catalog entry by
//! trying an ordered cascade of independent upstream sources. Each source
//! either produces a non-empty depot list (short-circuiting the cascade),
//! reports that it has no data, or signals a transient failure. Rate-limit
//! signals trigger bounded exponential backoff within the affected source.
//!
//! If every real source is exhausted, a terminal synthetic generator
//! manufactures a minimal snapshot so the pipeline never stalls on a single
//! unresolved entry. No error ever propagates past [`ResolverChain::resolve`].
//!
//! # Example
//!
//! ```rust,ignore
//! use depotwatch_resolver::ResolverChain;
//!
//! let chain = ResolverChain::from_config(&config.sources)?;
//! let snapshot = chain.resolve(&entry).await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod chain;
pub mod outcome;
pub mod retry;
pub mod session;
pub mod sources;
pub mod stats;

// Re-export commonly used types
pub use chain::ResolverChain;
pub use outcome::FetchOutcome;
pub use retry::RetryPolicy;
pub use session::{ClientIdentity, SessionRotator};
pub use sources::{ManifestSource, SyntheticGenerator};
pub use stats::ResolveStats;
