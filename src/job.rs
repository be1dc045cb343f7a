use crate::error::Result;
use crate::metrics::snapshot::Counters;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One unit of crawl work, serialized as a single queue entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub url: String,
    #[serde(default)]
    pub target: String,
}

impl Job {
    pub fn new(url: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            target: target.into(),
        }
    }

    pub fn to_payload(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_payload(raw: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Ok,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Ok => "ok",
            JobStatus::Error => "error",
        }
    }
}

/// Liveness record the worker writes after every job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHeartbeat {
    pub status: JobStatus,
    pub ts: DateTime<Utc>,
    /// Empty on success.
    pub error: String,
}

impl JobHeartbeat {
    pub fn ok(ts: DateTime<Utc>) -> Self {
        Self {
            status: JobStatus::Ok,
            ts,
            error: String::new(),
        }
    }

    pub fn error(ts: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Error,
            ts,
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded { count: u64 },
    Failed { error: String },
    Malformed { error: String },
}

impl JobOutcome {
    pub fn count(&self) -> Option<u64> {
        match self {
            JobOutcome::Succeeded { count } => Some(*count),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded { .. })
    }
}

/// What the worker did with one queue entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub ts: DateTime<Utc>,
    pub job: Option<Job>,
    pub outcome: JobOutcome,
    pub totals: Counters,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_matches_queue_wire_format() {
        let job = Job::new("https://example/", "football");
        assert_eq!(
            job.to_payload().unwrap(),
            r#"{"url":"https://example/","target":"football"}"#
        );
    }

    #[test]
    fn missing_target_defaults_to_empty() {
        let job = Job::from_payload(r#"{"url": "https://example/"}"#).unwrap();
        assert_eq!(job.target, "");
    }

    #[test]
    fn missing_url_is_rejected() {
        assert!(Job::from_payload(r#"{"target": "football"}"#).is_err());
        assert!(Job::from_payload("[1, 2]").is_err());
        assert!(Job::from_payload("not json").is_err());
    }
}
