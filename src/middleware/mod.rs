//! Middleware subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → AuthDelayService::call (forwarded to inner service unchanged)
//!     → inner service resolves its Response
//!     → delay.rs (rule evaluation, randomized sleeps, in rule order)
//!     → response released to the client
//! ```

pub mod delay;

pub use delay::{AuthDelayLayer, AuthDelayService};
