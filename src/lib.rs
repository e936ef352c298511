//! Status-keyed HTTP response delay middleware.
//!
//! Holds back responses whose status code falls inside a configured range
//! for a randomized duration before they reach the client. Adding timing
//! noise to authentication endpoints keeps response latency from revealing
//! which failure mode occurred (unknown user vs. wrong password).
//!
//! Rules are evaluated in configuration order; every matching rule sleeps
//! independently, so overlapping rules produce an additive total delay.
//! Headers and body bytes pass through untouched.
//!
//! ```no_run
//! use auth_delay::{AuthDelayLayer, DelayRule};
//! use axum::{routing::post, Router};
//!
//! # fn main() -> Result<(), auth_delay::DelayConfigError> {
//! let rules = vec![DelayRule {
//!     min_code: 401,
//!     max_code: 403,
//!     min_delay: "250ms".into(),
//!     max_delay: "1s".into(),
//! }];
//!
//! let app: Router = Router::new()
//!     .route("/login", post(|| async { "ok" }))
//!     .layer(AuthDelayLayer::new(&rules, "authDelay")?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod middleware;

pub use config::resolve::{DelayConfigError, RuleSet};
pub use config::schema::{DelayConfig, DelayRule};
pub use middleware::delay::{AuthDelayLayer, AuthDelayService};
