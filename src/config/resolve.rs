//! Rule validation and normalization.
//!
//! # Responsibilities
//! - Parse delay duration strings into `Duration` values
//! - Enforce rule invariants (non-negative delays, min <= max)
//! - Produce the immutable `RuleSet` shared across requests
//!
//! # Design Decisions
//! - Fail-fast: the first malformed rule aborts resolution; no partial set
//! - Resolution is a pure function of the raw rules

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use thiserror::Error;

use crate::config::schema::DelayRule;

/// Error raised while resolving raw delay rules.
///
/// All variants surface at construction time; once a [`RuleSet`] exists
/// there are no runtime error paths.
#[derive(Debug, Error)]
pub enum DelayConfigError {
    /// A min-delay or max-delay string could not be parsed as a duration.
    #[error("invalid delay duration {raw:?}: {source}")]
    InvalidDurationFormat {
        raw: String,
        #[source]
        source: humantime::DurationError,
    },

    /// min-delay exceeds max-delay.
    #[error("min-delay {min:?} is greater than max-delay {max:?}")]
    InvertedDelayRange { min: String, max: String },

    /// min-delay is negative.
    #[error("min-delay {raw:?} is a negative duration")]
    NegativeDelay { raw: String },
}

/// A validated rule: inclusive status-code bounds plus parsed delay bounds.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NormalizedRule {
    min_code: u16,
    max_code: u16,
    min_delay: Duration,
    max_delay: Duration,
}

impl NormalizedRule {
    /// Whether `status` falls inside the inclusive code range.
    pub(crate) fn matches(&self, status: StatusCode) -> bool {
        (self.min_code..=self.max_code).contains(&status.as_u16())
    }

    /// Draw a delay uniformly from `[min_delay, max_delay]` in whole
    /// nanoseconds. fastrand's thread-local generator is seeded once from
    /// OS entropy, so concurrent requests never observe correlated draws.
    pub(crate) fn pick_delay(&self) -> Duration {
        let min = self.min_delay.as_nanos() as u64;
        let max = self.max_delay.as_nanos() as u64;
        Duration::from_nanos(fastrand::u64(min..=max))
    }
}

/// Validated, ordered delay rules.
///
/// Immutable after resolution and cheap to clone; every in-flight request
/// reads the same shared slice without locking.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Arc<[NormalizedRule]>,
}

impl RuleSet {
    /// Validate and normalize `rules`, preserving their order.
    ///
    /// Returns the error for the first rule that fails validation; later
    /// rules are not examined and no partial set is produced.
    pub fn resolve(rules: &[DelayRule]) -> Result<Self, DelayConfigError> {
        let mut resolved = Vec::with_capacity(rules.len());

        for rule in rules {
            let (min_nanos, min_delay) = parse_delay(&rule.min_delay)?;
            let (max_nanos, max_delay) = parse_delay(&rule.max_delay)?;

            if min_nanos > max_nanos {
                return Err(DelayConfigError::InvertedDelayRange {
                    min: rule.min_delay.clone(),
                    max: rule.max_delay.clone(),
                });
            }
            if min_nanos < 0 {
                return Err(DelayConfigError::NegativeDelay {
                    raw: rule.min_delay.clone(),
                });
            }

            resolved.push(NormalizedRule {
                min_code: rule.min_code,
                max_code: rule.max_code,
                min_delay,
                max_delay,
            });
        }

        Ok(Self {
            rules: resolved.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &NormalizedRule> {
        self.rules.iter()
    }
}

/// Parse a delay string into signed nanoseconds plus the unsigned span.
///
/// humantime has no sign syntax, so a leading `-` is handled here: it keeps
/// a negative-but-well-formed delay distinguishable from a garbage string.
fn parse_delay(raw: &str) -> Result<(i128, Duration), DelayConfigError> {
    let (sign, body) = match raw.strip_prefix('-') {
        Some(rest) => (-1i128, rest),
        None => (1i128, raw),
    };

    let parsed =
        humantime::parse_duration(body).map_err(|source| DelayConfigError::InvalidDurationFormat {
            raw: raw.to_string(),
            source,
        })?;

    Ok((sign * parsed.as_nanos() as i128, parsed))
}
