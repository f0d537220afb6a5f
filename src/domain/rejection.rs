use super::booking::Transition;
use crate::error::{EngineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a booking was rejected and what the customer must do about it.
///
/// Only ever carried by a booking in the `REJECTED` state. `is_resolved` starts
/// out `false` and gates reconsideration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Rejection {
    reason: String,
    resolution: String,
    is_resolved: bool,
    rejected_at: DateTime<Utc>,
}

impl Rejection {
    pub fn new(reason: &str, resolution: &str, now: DateTime<Utc>) -> Result<Self> {
        let (reason, resolution) = require_notes(reason, resolution)?;
        Ok(Self {
            reason,
            resolution,
            is_resolved: false,
            rejected_at: now,
        })
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn resolution(&self) -> &str {
        &self.resolution
    }

    pub fn is_resolved(&self) -> bool {
        self.is_resolved
    }

    pub fn rejected_at(&self) -> DateTime<Utc> {
        self.rejected_at
    }

    /// Whether a retried reject carries the same diagnosis as this one.
    pub fn matches(&self, reason: &str, resolution: &str) -> bool {
        self.reason == reason.trim() && self.resolution == resolution.trim()
    }

    pub fn mark_resolved(&mut self) -> Transition {
        if self.is_resolved {
            return Transition::Unchanged;
        }
        self.is_resolved = true;
        Transition::Applied
    }

    /// Re-diagnoses the rejection: the new notes replace the old ones and the
    /// customer has to act again.
    pub fn mark_unresolved(&mut self, reason: &str, resolution: &str) -> Result<Transition> {
        let (reason, resolution) = require_notes(reason, resolution)?;
        if !self.is_resolved && self.reason == reason && self.resolution == resolution {
            return Ok(Transition::Unchanged);
        }
        self.reason = reason;
        self.resolution = resolution;
        self.is_resolved = false;
        Ok(Transition::Applied)
    }
}

fn require_notes(reason: &str, resolution: &str) -> Result<(String, String)> {
    let reason = reason.trim();
    let resolution = resolution.trim();
    if reason.is_empty() || resolution.is_empty() {
        return Err(EngineError::ValidationError(
            "Rejection needs both a reason and a resolution".to_string(),
        ));
    }
    Ok((reason.to_string(), resolution.to_string()))
}
