//! Redis-backed durable queue.
//!
//! Layout, for a queue named `q`:
//! - `q:ready`    — zset of job ids, score = `-priority * 2^32 + seq`
//! - `q:delayed`  — zset of job ids, score = promote-at unix millis
//! - `q:jobs`     — hash job id → JSON payload
//! - `q:attempts` — hash job id → attempt count
//! - `q:active`   — set of leased job ids
//! - `q:done:<id>` / `q:failed:<id>` — retention markers with TTLs
//!
//! Pop is a single Lua script: promote due delayed jobs, then atomically
//! move the best ready id into the active set. The script is the atomic-pop
//! discipline the broker enforces across worker processes.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Script;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

use super::{
    retry_delay, EnrichmentJob, JobDisposition, JobQueue, LeasedJob, COMPLETED_RETENTION,
    DEFAULT_MAX_ATTEMPTS, FAILED_RETENTION,
};
use crate::error::{Error, Result};

/// Redis [`JobQueue`].
pub struct RedisQueue {
    conn: ConnectionManager,
    name: String,
    max_attempts: u32,
}

fn now_millis() -> Result<i64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .map_err(|e| Error::queue(format!("system clock before epoch: {e}")))
}

impl RedisQueue {
    /// Connect to Redis and bind a named queue.
    pub async fn connect(redis_url: &str, name: impl Into<String>) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| Error::queue(format!("invalid redis url: {e}")))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| Error::queue(format!("redis connect failed: {e}")))?;
        Ok(Self {
            conn,
            name: name.into(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        })
    }

    fn key(&self, suffix: &str) -> String {
        format!("{}:{}", self.name, suffix)
    }

    /// Ready-zset score: higher priority pops first, FIFO within priority.
    fn ready_score(priority: i32, seq: i64) -> f64 {
        -(f64::from(priority)) * 4_294_967_296.0 + seq as f64
    }
}

#[async_trait]
impl JobQueue for RedisQueue {
    async fn enqueue(&self, job: EnrichmentJob) -> Result<String> {
        let id = job.session_id.clone();
        let payload = serde_json::to_string(&job)?;
        let seq = now_millis()?;
        let score = Self::ready_score(job.priority, seq);

        // Dedup across ready, delayed, active and retention markers.
        const ENQUEUE: &str = r#"
            local jobs = KEYS[1]
            local ready = KEYS[2]
            local id = ARGV[1]
            local payload = ARGV[2]
            local score = tonumber(ARGV[3])
            local done = KEYS[3]
            local failed = KEYS[4]
            if redis.call('HEXISTS', jobs, id) == 1 then
                return 0
            end
            if redis.call('EXISTS', done) == 1 or redis.call('EXISTS', failed) == 1 then
                return 0
            end
            redis.call('HSET', jobs, id, payload)
            redis.call('ZADD', ready, score, id)
            return 1
        "#;
        let mut conn = self.conn.clone();
        let script = Script::new(ENQUEUE);
        // Built step by step; the chained form trips over invocation
        // temporary lifetimes.
        let mut invocation = script.key(self.key("jobs"));
        invocation.key(self.key("ready"));
        invocation.key(format!("{}:done:{id}", self.name));
        invocation.key(format!("{}:failed:{id}", self.name));
        invocation.arg(&id);
        invocation.arg(payload);
        invocation.arg(score);
        let added: i32 = invocation
            .invoke_async(&mut conn)
            .await
            .map_err(|e| Error::queue(e.to_string()))?;
        debug!(job_id = %id, added, "enqueue");
        Ok(id)
    }

    async fn pop(&self, timeout: Duration) -> Result<Option<LeasedJob>> {
        const POP: &str = r#"
            local ready = KEYS[1]
            local delayed = KEYS[2]
            local jobs = KEYS[3]
            local attempts = KEYS[4]
            local active = KEYS[5]
            local now = tonumber(ARGV[1])

            -- Promote due delayed jobs back into ready.
            local due = redis.call('ZRANGEBYSCORE', delayed, '-inf', now)
            for _, id in ipairs(due) do
                redis.call('ZREM', delayed, id)
                redis.call('ZADD', ready, now, id)
            end

            local popped = redis.call('ZPOPMIN', ready, 1)
            if #popped == 0 then
                return nil
            end
            local id = popped[1]
            local payload = redis.call('HGET', jobs, id)
            local attempt = redis.call('HINCRBY', attempts, id, 1)
            redis.call('SADD', active, id)
            return {id, payload, attempt}
        "#;

        let deadline = std::time::Instant::now() + timeout;
        let script = Script::new(POP);
        loop {
            let mut conn = self.conn.clone();
            let mut invocation = script.key(self.key("ready"));
            invocation.key(self.key("delayed"));
            invocation.key(self.key("jobs"));
            invocation.key(self.key("attempts"));
            invocation.key(self.key("active"));
            invocation.arg(now_millis()?);
            let result: Option<(String, Option<String>, u32)> = invocation
                .invoke_async(&mut conn)
                .await
                .map_err(|e| Error::queue(e.to_string()))?;

            if let Some((id, payload, attempt)) = result {
                let Some(payload) = payload else {
                    debug!(job_id = %id, "popped id with missing payload, skipping");
                    continue;
                };
                let job: EnrichmentJob = serde_json::from_str(&payload)?;
                return Ok(Some(LeasedJob { job, attempt }));
            }
            if std::time::Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    }

    async fn ack(&self, job_id: &str, disposition: JobDisposition) -> Result<()> {
        let (marker, retention) = match disposition {
            JobDisposition::Completed => (
                format!("{}:done:{job_id}", self.name),
                COMPLETED_RETENTION,
            ),
            JobDisposition::Failed => {
                (format!("{}:failed:{job_id}", self.name), FAILED_RETENTION)
            }
        };
        let mut conn = self.conn.clone();
        redis::pipe()
            .srem(self.key("active"), job_id)
            .hdel(self.key("jobs"), job_id)
            .hdel(self.key("attempts"), job_id)
            .set_ex(&marker, 1, retention.as_secs())
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| Error::queue(e.to_string()))?;
        Ok(())
    }

    async fn nack(&self, job_id: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let attempt: u32 = redis::cmd("HGET")
            .arg(self.key("attempts"))
            .arg(job_id)
            .query_async::<Option<u32>>(&mut conn)
            .await
            .map_err(|e| Error::queue(e.to_string()))?
            .unwrap_or(self.max_attempts);

        if attempt >= self.max_attempts {
            return self.ack(job_id, JobDisposition::Failed).await;
        }

        let due = now_millis()? + retry_delay(attempt).as_millis() as i64;
        redis::pipe()
            .srem(self.key("active"), job_id)
            .zadd(self.key("delayed"), job_id, due)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| Error::queue(e.to_string()))?;
        Ok(())
    }

    async fn depth(&self) -> Result<u64> {
        let mut conn = self.conn.clone();
        let (ready, delayed): (u64, u64) = redis::pipe()
            .zcard(self.key("ready"))
            .zcard(self.key("delayed"))
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::queue(e.to_string()))?;
        Ok(ready + delayed)
    }
}
