//! Per-tenant inbound rate limiting for the enqueue endpoints.

use parking_lot::RwLock;
use std::collections::HashMap;

use bridgescout::search::{RateLimit, TokenBucket};

/// Tenants tracked before arbitrary pruning kicks in.
const MAX_TENANT_BUCKETS: usize = 10_000;
const PRUNE_BATCH: usize = 1_000;

/// Suggested client wait when a bucket is empty.
pub const RETRY_AFTER_SECS: u64 = 10;

/// Per-tenant token buckets for the inbound API.
pub struct InboundLimiter {
    default_limit: RateLimit,
    buckets: RwLock<HashMap<String, TokenBucket>>,
}

impl InboundLimiter {
    /// Limiter with one shared default quota.
    #[must_use]
    pub fn new(default_limit: RateLimit) -> Self {
        Self {
            default_limit,
            buckets: RwLock::new(HashMap::new()),
        }
    }

    /// Non-blocking check: true when the tenant may proceed.
    pub fn check(&self, tenant_id: &str) -> bool {
        {
            let buckets = self.buckets.read();
            if let Some(bucket) = buckets.get(tenant_id) {
                return bucket.try_acquire();
            }
        }

        let mut buckets = self.buckets.write();
        if !buckets.contains_key(tenant_id) && buckets.len() >= MAX_TENANT_BUCKETS {
            let stale: Vec<String> = buckets.keys().take(PRUNE_BATCH).cloned().collect();
            for key in stale {
                buckets.remove(&key);
            }
        }
        buckets
            .entry(tenant_id.to_string())
            .or_insert_with(|| TokenBucket::new(self.default_limit))
            .try_acquire()
    }
}

impl Default for InboundLimiter {
    fn default() -> Self {
        Self::new(RateLimit {
            requests_per_second: 5.0,
            burst_capacity: 20,
        })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_then_reject_per_tenant() {
        let limiter = InboundLimiter::new(RateLimit {
            requests_per_second: 1.0,
            burst_capacity: 3,
        });
        assert!(limiter.check("t1"));
        assert!(limiter.check("t1"));
        assert!(limiter.check("t1"));
        assert!(!limiter.check("t1"));
        // Another tenant has its own bucket.
        assert!(limiter.check("t2"));
    }
}
