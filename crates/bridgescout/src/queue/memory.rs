//! In-memory queue with the same semantics as the Redis backend.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::cmp::Ordering as CmpOrdering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::time::{Duration, Instant};

use super::{
    retry_delay, EnrichmentJob, JobDisposition, JobQueue, LeasedJob, DEFAULT_MAX_ATTEMPTS,
};
use crate::error::Result;

#[derive(Debug, Clone)]
struct Entry {
    job: EnrichmentJob,
    attempt: u32,
    seq: u64,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}
impl Eq for Entry {}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // Max-heap: higher priority first, then FIFO by sequence.
        self.job
            .priority
            .cmp(&other.job.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}
impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

#[derive(Default)]
struct QueueState {
    ready: BinaryHeap<Entry>,
    delayed: Vec<(Instant, Entry)>,
    in_flight: HashMap<String, Entry>,
    /// Session ids anywhere in the system (live or retained).
    known: HashSet<String>,
    seq: u64,
}

/// Test/replay [`JobQueue`].
pub struct MemoryQueue {
    state: Mutex<QueueState>,
    max_attempts: u32,
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryQueue {
    /// Empty queue with the default attempt limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    fn promote_due(state: &mut QueueState) {
        let now = Instant::now();
        let mut remaining = Vec::with_capacity(state.delayed.len());
        for (due, entry) in state.delayed.drain(..) {
            if due <= now {
                state.ready.push(entry);
            } else {
                remaining.push((due, entry));
            }
        }
        state.delayed = remaining;
    }
}

#[async_trait]
impl JobQueue for MemoryQueue {
    async fn enqueue(&self, job: EnrichmentJob) -> Result<String> {
        let id = job.session_id.clone();
        let mut state = self.state.lock();
        if state.known.contains(&id) {
            return Ok(id);
        }
        state.known.insert(id.clone());
        state.seq += 1;
        let seq = state.seq;
        state.ready.push(Entry {
            job,
            attempt: 0,
            seq,
        });
        Ok(id)
    }

    async fn pop(&self, timeout: Duration) -> Result<Option<LeasedJob>> {
        let deadline = Instant::now() + timeout;
        loop {
            {
                let mut state = self.state.lock();
                Self::promote_due(&mut state);
                if let Some(mut entry) = state.ready.pop() {
                    entry.attempt += 1;
                    let leased = LeasedJob {
                        job: entry.job.clone(),
                        attempt: entry.attempt,
                    };
                    state
                        .in_flight
                        .insert(entry.job.session_id.clone(), entry);
                    return Ok(Some(leased));
                }
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn ack(&self, job_id: &str, _disposition: JobDisposition) -> Result<()> {
        // Retention in the memory backend is just the `known` marker.
        self.state.lock().in_flight.remove(job_id);
        Ok(())
    }

    async fn nack(&self, job_id: &str) -> Result<()> {
        let mut state = self.state.lock();
        let Some(entry) = state.in_flight.remove(job_id) else {
            return Ok(());
        };
        if entry.attempt >= self.max_attempts {
            // Exhausted; stays in `known` as a failed-retained job.
            return Ok(());
        }
        let due = Instant::now() + retry_delay(entry.attempt);
        state.delayed.push((due, entry));
        Ok(())
    }

    async fn depth(&self) -> Result<u64> {
        let state = self.state.lock();
        Ok((state.ready.len() + state.delayed.len()) as u64)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::JobType;

    fn job(id: &str, priority: i32) -> EnrichmentJob {
        EnrichmentJob {
            session_id: id.into(),
            candidate_id: "c1".into(),
            tenant_id: "t1".into(),
            job_type: JobType::Enrich,
            role_type: None,
            budget: None,
            priority,
        }
    }

    #[tokio::test]
    async fn enqueue_is_idempotent_on_session_id() {
        let queue = MemoryQueue::new();
        queue.enqueue(job("s1", 0)).await.unwrap();
        queue.enqueue(job("s1", 0)).await.unwrap();
        assert_eq!(queue.depth().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn priority_order_then_fifo() {
        let queue = MemoryQueue::new();
        queue.enqueue(job("low1", 0)).await.unwrap();
        queue.enqueue(job("high", 5)).await.unwrap();
        queue.enqueue(job("low2", 0)).await.unwrap();

        let order: Vec<String> = [
            queue.pop(Duration::from_millis(50)).await.unwrap().unwrap(),
            queue.pop(Duration::from_millis(50)).await.unwrap().unwrap(),
            queue.pop(Duration::from_millis(50)).await.unwrap().unwrap(),
        ]
        .iter()
        .map(|l| l.job.session_id.clone())
        .collect();
        assert_eq!(order, vec!["high", "low1", "low2"]);
    }

    #[tokio::test]
    async fn pop_times_out_when_empty() {
        let queue = MemoryQueue::new();
        let leased = queue.pop(Duration::from_millis(30)).await.unwrap();
        assert!(leased.is_none());
    }

    #[tokio::test]
    async fn nack_exhausts_after_max_attempts() {
        let queue = MemoryQueue::new();
        queue.enqueue(job("s1", 0)).await.unwrap();

        // Attempts 1..=3; after the third nack the job is gone for good.
        for expected_attempt in 1..=3 {
            // Delayed retries come due after the backoff; shortcut by
            // rewriting the delay queue instead of sleeping.
            {
                let mut state = queue.state.lock();
                for entry in state.delayed.iter_mut() {
                    entry.0 = Instant::now();
                }
            }
            let leased = queue.pop(Duration::from_millis(100)).await.unwrap().unwrap();
            assert_eq!(leased.attempt, expected_attempt);
            queue.nack(&leased.job.session_id).await.unwrap();
        }
        assert_eq!(queue.depth().await.unwrap(), 0);
        assert!(queue
            .pop(Duration::from_millis(30))
            .await
            .unwrap()
            .is_none());
    }
}
