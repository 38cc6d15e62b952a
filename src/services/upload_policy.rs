//! Size limits for file parts.
//!
//! `UploadPolicy` is built once from configuration and shared; every request
//! gets its own `RequestBudget`, so the cumulative counter never leaks across
//! requests.

use crate::models::decision::UploadDecision;

pub const DEFAULT_MAX_PART_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_MAX_REQUEST_BYTES: u64 = DEFAULT_MAX_PART_BYTES * 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_part_bytes: u64,
    pub max_request_bytes: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_part_bytes: DEFAULT_MAX_PART_BYTES,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
        }
    }
}

impl UploadPolicy {
    pub fn new(max_part_bytes: u64, max_request_bytes: u64) -> Self {
        Self {
            max_part_bytes,
            max_request_bytes,
        }
    }

    /// Default transport ceiling for a whole request body.
    ///
    /// Twice the cumulative file limit, so parts that break either limit
    /// still arrive and get reported as rejected instead of failing the
    /// request with 413.
    pub fn default_body_limit(&self) -> u64 {
        self.max_request_bytes.saturating_mul(2)
    }

    /// Start a fresh cumulative counter for one request.
    pub fn budget(&self) -> RequestBudget {
        RequestBudget {
            policy: *self,
            accepted_bytes: 0,
        }
    }
}

/// Request-scoped view of the policy.
#[derive(Debug, Clone)]
pub struct RequestBudget {
    policy: UploadPolicy,
    accepted_bytes: u64,
}

impl RequestBudget {
    /// Bytes of persisted file parts so far in this request.
    pub fn accepted_bytes(&self) -> u64 {
        self.accepted_bytes
    }

    /// True when a part of `size` bytes would be rejected right now.
    ///
    /// Lets the ingestor stop spooling a part as soon as it grows past the
    /// limits, before its final size is known.
    pub fn would_reject(&self, size: u64) -> bool {
        size > self.policy.max_part_bytes
            || self.accepted_bytes.saturating_add(size) > self.policy.max_request_bytes
    }

    /// Decide what happens to a fully read part of `size` bytes.
    ///
    /// Only `Persisted` advances the cumulative counter.
    pub fn decide(&mut self, size: u64) -> UploadDecision {
        if size == 0 {
            return UploadDecision::Skipped;
        }
        if self.would_reject(size) {
            return UploadDecision::Rejected;
        }
        self.accepted_bytes += size;
        UploadDecision::Persisted
    }
}
