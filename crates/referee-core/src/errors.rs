//! Error types shared across the crate.

use std::fmt::{Display, Formatter};

use thiserror::Error;

/// Fatal configuration problem, raised at construction time only.
/// Everything after construction is per-item and recoverable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(pub String);

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConfigError: {}", self.0)
    }
}
impl std::error::Error for ConfigError {}

/// Failures of the external judgment oracle. The transient/permanent split
/// drives the retry policy: transient errors are retried with backoff,
/// permanent ones surface immediately.
#[derive(Debug, Error)]
pub enum OracleError {
    /// Upstream rate limit (HTTP 429).
    #[error("oracle rate limited (status {status})")]
    RateLimited { status: u16 },

    /// Request exceeded its wall-clock limit.
    #[error("oracle request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Upstream 5xx.
    #[error("oracle server error (status {status}): {detail}")]
    Server { status: u16, detail: String },

    /// Transport-level failure before any response arrived.
    #[error("oracle network error: {detail}")]
    Network { detail: String },

    /// The oracle answered, but not with the JSON shape the contract
    /// promises. Retried: temperature-0 replies still flake occasionally.
    #[error("malformed oracle payload: {detail}")]
    MalformedPayload { detail: String },

    /// Client-side rejection (auth, bad request). Never retried.
    #[error("oracle rejected request (status {status}): {detail}")]
    Rejected { status: u16, detail: String },
}

impl OracleError {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            OracleError::RateLimited { .. }
                | OracleError::Timeout { .. }
                | OracleError::Server { .. }
                | OracleError::Network { .. }
                | OracleError::MalformedPayload { .. }
        )
    }

    /// Map an HTTP status plus body into the taxonomy.
    pub fn from_status(status: u16, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match status {
            429 => OracleError::RateLimited { status },
            500..=599 => OracleError::Server { status, detail },
            _ => OracleError::Rejected { status, detail },
        }
    }
}

/// Best fuzzy match for an unknown name, used to improve config errors.
pub struct ClosestMatch {
    pub name: String,
    pub similarity: f64,
}

pub fn closest_name<'a>(needle: &str, hay: impl Iterator<Item = &'a String>) -> Option<ClosestMatch> {
    let mut best: Option<ClosestMatch> = None;

    // Threshold for suggestion. 0.55 is a reasonable heuristic.
    const THRESHOLD: f64 = 0.55;

    for candidate in hay {
        let sim = strsim::normalized_levenshtein(needle, candidate);
        if sim >= THRESHOLD && best.as_ref().map_or(true, |b| sim > b.similarity) {
            best = Some(ClosestMatch {
                name: candidate.clone(),
                similarity: sim,
            });
        }
    }
    best
}

/// `ConfigError` for a name missing from a known set, with a "did you mean"
/// suggestion when one is close enough.
pub fn unknown_name_error<'a>(
    kind: &str,
    needle: &str,
    known: impl Iterator<Item = &'a String>,
) -> ConfigError {
    match closest_name(needle, known) {
        Some(hit) => ConfigError(format!(
            "unknown {} '{}' (did you mean '{}'?)",
            kind, needle, hit.name
        )),
        None => ConfigError(format!("unknown {} '{}'", kind, needle)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_split() {
        assert!(OracleError::RateLimited { status: 429 }.is_transient());
        assert!(OracleError::Timeout { seconds: 60 }.is_transient());
        assert!(OracleError::MalformedPayload {
            detail: "not json".into()
        }
        .is_transient());
        assert!(!OracleError::Rejected {
            status: 401,
            detail: "bad key".into()
        }
        .is_transient());
    }

    #[test]
    fn from_status_maps_buckets() {
        assert!(matches!(
            OracleError::from_status(429, ""),
            OracleError::RateLimited { status: 429 }
        ));
        assert!(matches!(
            OracleError::from_status(503, "overloaded"),
            OracleError::Server { status: 503, .. }
        ));
        assert!(matches!(
            OracleError::from_status(400, "bad schema"),
            OracleError::Rejected { status: 400, .. }
        ));
    }

    #[test]
    fn closest_name_suggests_typo() {
        let known = vec!["clear_ref".to_string(), "shared_ref".to_string()];
        let hit = closest_name("clear_reff", known.iter()).unwrap();
        assert_eq!(hit.name, "clear_ref");
        assert!(hit.similarity > 0.8);
    }

    #[test]
    fn closest_name_stays_quiet_when_far() {
        let known = vec!["clear_ref".to_string()];
        assert!(closest_name("zzzz", known.iter()).is_none());
    }

    #[test]
    fn unknown_name_error_includes_suggestion() {
        let known = vec!["gpt-4o".to_string(), "gpt-4o-mini".to_string()];
        let err = unknown_name_error("model", "gpt4o", known.iter());
        assert!(err.0.contains("did you mean 'gpt-4o'"));
    }
}
