//! Redirect counters.
//!
//! Thin wrappers around the `metrics` crate macros. No exporter is bundled:
//! the embedding application installs whichever recorder it uses, and without
//! one the calls are no-ops.
//!
//! Provided metrics:
//! * `canonize_requests_total` (counter, label `outcome`)
//! * `canonize_redirects_total` (counter, label `policy`)
use metrics::{Unit, counter, describe_counter};
use once_cell::sync::OnceCell;

use crate::core::Policy;

pub const CANONIZE_REQUESTS_TOTAL: &str = "canonize_requests_total";
pub const CANONIZE_REDIRECTS_TOTAL: &str = "canonize_redirects_total";

static DESCRIBED: OnceCell<()> = OnceCell::new();

/// Result of running the redirect layer on one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Redirected,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Passed => "passed",
            Outcome::Redirected => "redirected",
            Outcome::Error => "error",
        }
    }
}

/// Register metric descriptions with the installed recorder. Safe to call
/// more than once.
pub fn describe_metrics() {
    DESCRIBED.get_or_init(|| {
        describe_counter!(
            CANONIZE_REQUESTS_TOTAL,
            Unit::Count,
            "Requests seen by the redirect layer, by outcome."
        );
        describe_counter!(
            CANONIZE_REDIRECTS_TOTAL,
            Unit::Count,
            "Redirects issued, by the policy that required them. One redirect may count for several policies."
        );
    });
}

/// Count one request handled by the redirect layer.
pub fn increment_request_outcome(outcome: Outcome) {
    counter!(CANONIZE_REQUESTS_TOTAL, "outcome" => outcome.as_str()).increment(1);
}

/// Count one fired policy of an issued redirect.
pub fn increment_redirect_policy(policy: Policy) {
    counter!(CANONIZE_REDIRECTS_TOTAL, "policy" => policy.as_str()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::Passed.as_str(), "passed");
        assert_eq!(Outcome::Redirected.as_str(), "redirected");
        assert_eq!(Outcome::Error.as_str(), "error");
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        describe_metrics();
        describe_metrics();
        increment_request_outcome(Outcome::Redirected);
        increment_redirect_policy(Policy::Tls);
    }
}
