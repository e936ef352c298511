//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! host application config (its own file format)
//!     → schema.rs (serde shape: DelayConfig, DelayRule)
//!     → resolve.rs (parse durations, enforce invariants)
//!     → RuleSet (validated, immutable)
//!     → shared across all in-flight requests
//! ```
//!
//! # Design Decisions
//! - Validation is fail-fast: the first malformed rule aborts construction
//! - A RuleSet is immutable once resolved; requests only ever read it
//! - A bad rule set must prevent the middleware from being installed,
//!   never degrade into a silently inactive mitigation at request time

pub mod resolve;
pub mod schema;

pub use resolve::{DelayConfigError, RuleSet};
pub use schema::{DelayConfig, DelayRule};
