//! Delay rule schema definitions.
//!
//! All types derive Serde traits for deserialization from the host
//! application's configuration. Field names stay wire-compatible with the
//! Traefik auth-delay plugin (`min-code`, `max-code`, `min-delay`,
//! `max-delay`), so existing plugin configuration documents deserialize
//! unchanged.

use serde::{Deserialize, Serialize};

/// Root configuration for the delay middleware.
///
/// An empty rule list is valid and turns the middleware into a transparent
/// passthrough.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DelayConfig {
    /// Delay rule definitions, evaluated in order.
    #[serde(rename = "auth-delay")]
    pub auth_delays: Vec<DelayRule>,
}

/// One status-code range and its delay range, as supplied by configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DelayRule {
    /// Inclusive lower bound on the response status code.
    #[serde(rename = "min-code")]
    pub min_code: u16,

    /// Inclusive upper bound on the response status code.
    #[serde(rename = "max-code")]
    pub max_code: u16,

    /// Minimum delay as a duration string (e.g. "5ms").
    #[serde(rename = "min-delay")]
    pub min_delay: String,

    /// Maximum delay as a duration string (e.g. "10ms").
    #[serde(rename = "max-delay")]
    pub max_delay: String,
}
