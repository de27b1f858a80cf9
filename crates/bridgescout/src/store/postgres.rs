//! `PostgreSQL`-backed store.
//!
//! Two logical tables, `identity_candidate` keyed by
//! `(tenant_id, candidate_id, platform, platform_id)` and
//! `enrichment_session` keyed by `id`, plus the externally-ingested
//! `candidate` table this engine only reads and advances status on.
//! The unique constraint serialises concurrent writers; mutable fields get
//! last-writer semantics through `ON CONFLICT ... DO UPDATE`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, error, info};

use super::{Store, UpsertOutcome};
use crate::error::{Error, Result};
use crate::model::{
    Candidate, EnrichmentSession, EnrichmentStatus, IdentityCandidate, IdentityStatus, Platform,
};

/// `PostgreSQL` store.
pub struct PostgresStore {
    client: Client,
}

impl PostgresStore {
    /// Connect and initialize the schema.
    ///
    /// # Errors
    /// Returns a store error if the connection or schema creation fails.
    pub async fn connect(connection_string: &str) -> Result<Self> {
        info!("Connecting to PostgreSQL");
        let (client, connection) = tokio_postgres::connect(connection_string, NoTls)
            .await
            .map_err(|e| {
                error!("Failed to connect to PostgreSQL: {e}");
                Error::store(format!("connection failed: {e}"))
            })?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("PostgreSQL connection error: {e}");
            }
        });

        let store = Self { client };
        store.initialize_schema().await?;
        Ok(store)
    }

    async fn initialize_schema(&self) -> Result<()> {
        const SCHEMA: &str = r"
            CREATE TABLE IF NOT EXISTS candidate (
                tenant_id TEXT NOT NULL,
                id TEXT NOT NULL,
                linkedin_slug TEXT NOT NULL,
                linkedin_url TEXT NOT NULL,
                serp_title TEXT NOT NULL DEFAULT '',
                serp_snippet TEXT NOT NULL DEFAULT '',
                serp_metadata JSONB,
                role_type TEXT,
                enrichment_status TEXT NOT NULL DEFAULT 'none',
                last_enriched_at TIMESTAMPTZ,
                PRIMARY KEY (tenant_id, id)
            );
            CREATE TABLE IF NOT EXISTS identity_candidate (
                tenant_id TEXT NOT NULL,
                candidate_id TEXT NOT NULL,
                platform TEXT NOT NULL,
                platform_id TEXT NOT NULL,
                profile_url TEXT NOT NULL,
                confidence DOUBLE PRECISION NOT NULL,
                confidence_bucket TEXT NOT NULL,
                score_breakdown JSONB NOT NULL,
                evidence JSONB NOT NULL DEFAULT '[]',
                has_contradiction BOOLEAN NOT NULL DEFAULT FALSE,
                contradiction_note TEXT,
                bridge_tier SMALLINT NOT NULL,
                bridge_signals JSONB NOT NULL DEFAULT '[]',
                persist_reason TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'unconfirmed',
                origin TEXT NOT NULL DEFAULT 'platform_search',
                serp_position INTEGER,
                discovered_by TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (tenant_id, candidate_id, platform, platform_id)
            );
            CREATE INDEX IF NOT EXISTS idx_identity_candidate_candidate
                ON identity_candidate (tenant_id, candidate_id);
            CREATE TABLE IF NOT EXISTS enrichment_session (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                candidate_id TEXT NOT NULL,
                record JSONB NOT NULL,
                status TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_enrichment_session_candidate
                ON enrichment_session (candidate_id, created_at DESC);
        ";
        self.client.batch_execute(SCHEMA).await.map_err(|e| {
            error!("Failed to create schema: {e}");
            Error::store(format!("schema init failed: {e}"))
        })?;
        debug!("PostgreSQL schema initialized");
        Ok(())
    }

    fn candidate_from_row(row: &Row) -> Result<Candidate> {
        let role_type: Option<String> = row.get("role_type");
        let status: String = row.get("enrichment_status");
        Ok(Candidate {
            tenant_id: row.get("tenant_id"),
            id: row.get("id"),
            linkedin_slug: row.get("linkedin_slug"),
            linkedin_url: row.get("linkedin_url"),
            serp_title: row.get("serp_title"),
            serp_snippet: row.get("serp_snippet"),
            serp_metadata: row.get("serp_metadata"),
            role_type: role_type
                .map(|r| serde_json::from_value(serde_json::Value::String(r)))
                .transpose()?,
            enrichment_status: serde_json::from_value(serde_json::Value::String(status))?,
            last_enriched_at: row.get("last_enriched_at"),
        })
    }

    fn identity_from_row(row: &Row) -> Result<IdentityCandidate> {
        let platform: String = row.get("platform");
        let bucket: String = row.get("confidence_bucket");
        let status: String = row.get("status");
        let origin: String = row.get("origin");
        let tier: i16 = row.get("bridge_tier");
        let serp_position: Option<i32> = row.get("serp_position");
        Ok(IdentityCandidate {
            tenant_id: row.get("tenant_id"),
            candidate_id: row.get("candidate_id"),
            platform: serde_json::from_value(serde_json::Value::String(platform))?,
            platform_id: row.get("platform_id"),
            profile_url: row.get("profile_url"),
            confidence: row.get("confidence"),
            confidence_bucket: serde_json::from_value(serde_json::Value::String(bucket))?,
            score_breakdown: serde_json::from_value(row.get("score_breakdown"))?,
            evidence: serde_json::from_value(row.get("evidence"))?,
            has_contradiction: row.get("has_contradiction"),
            contradiction_note: row.get("contradiction_note"),
            bridge_tier: u8::try_from(tier)
                .ok()
                .and_then(|t| t.try_into().ok())
                .ok_or_else(|| Error::store(format!("bridge tier out of range: {tier}")))?,
            bridge_signals: serde_json::from_value(row.get("bridge_signals"))?,
            persist_reason: row.get("persist_reason"),
            discovered_by: row.get("discovered_by"),
            status: serde_json::from_value(serde_json::Value::String(status))?,
            origin: serde_json::from_value(serde_json::Value::String(origin))?,
            serp_position: serp_position.map(|p| p as u32),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    fn enum_str<T: serde::Serialize>(value: &T) -> Result<String> {
        match serde_json::to_value(value)? {
            serde_json::Value::String(s) => Ok(s),
            other => Err(Error::internal(format!("expected string enum, got {other}"))),
        }
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn get_candidate(
        &self,
        tenant_id: &str,
        candidate_id: &str,
    ) -> Result<Option<Candidate>> {
        let row = self
            .client
            .query_opt(
                "SELECT * FROM candidate WHERE tenant_id = $1 AND id = $2",
                &[&tenant_id, &candidate_id],
            )
            .await
            .map_err(|e| Error::store(e.to_string()))?;
        row.as_ref().map(Self::candidate_from_row).transpose()
    }

    async fn put_candidate(&self, candidate: &Candidate) -> Result<()> {
        let role = candidate
            .role_type
            .map(|r| Self::enum_str(&r))
            .transpose()?;
        let status = Self::enum_str(&candidate.enrichment_status)?;
        self.client
            .execute(
                "INSERT INTO candidate (tenant_id, id, linkedin_slug, linkedin_url,
                     serp_title, serp_snippet, serp_metadata, role_type,
                     enrichment_status, last_enriched_at)
                 VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
                 ON CONFLICT (tenant_id, id) DO UPDATE SET
                     linkedin_slug = EXCLUDED.linkedin_slug,
                     linkedin_url = EXCLUDED.linkedin_url,
                     serp_title = EXCLUDED.serp_title,
                     serp_snippet = EXCLUDED.serp_snippet,
                     serp_metadata = EXCLUDED.serp_metadata,
                     role_type = EXCLUDED.role_type,
                     enrichment_status = EXCLUDED.enrichment_status,
                     last_enriched_at = EXCLUDED.last_enriched_at",
                &[
                    &candidate.tenant_id,
                    &candidate.id,
                    &candidate.linkedin_slug,
                    &candidate.linkedin_url,
                    &candidate.serp_title,
                    &candidate.serp_snippet,
                    &candidate.serp_metadata,
                    &role,
                    &status,
                    &candidate.last_enriched_at,
                ],
            )
            .await
            .map_err(|e| Error::store(e.to_string()))?;
        Ok(())
    }

    async fn update_candidate_enrichment(
        &self,
        tenant_id: &str,
        candidate_id: &str,
        status: EnrichmentStatus,
        last_enriched_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let status = Self::enum_str(&status)?;
        let updated = self
            .client
            .execute(
                "UPDATE candidate SET enrichment_status = $3,
                     last_enriched_at = COALESCE($4, last_enriched_at)
                 WHERE tenant_id = $1 AND id = $2",
                &[&tenant_id, &candidate_id, &status, &last_enriched_at],
            )
            .await
            .map_err(|e| Error::store(e.to_string()))?;
        if updated == 0 {
            return Err(Error::candidate_not_found(candidate_id));
        }
        Ok(())
    }

    async fn upsert_identity(&self, identity: &IdentityCandidate) -> Result<UpsertOutcome> {
        let platform = Self::enum_str(&identity.platform)?;
        let bucket = Self::enum_str(&identity.confidence_bucket)?;
        let status = Self::enum_str(&identity.status)?;
        let origin = Self::enum_str(&identity.origin)?;
        let breakdown = serde_json::to_value(&identity.score_breakdown)?;
        let evidence = serde_json::to_value(&identity.evidence)?;
        let signals = serde_json::to_value(&identity.bridge_signals)?;
        let tier = i16::from(identity.bridge_tier.as_u8());
        let serp_position = identity.serp_position.map(|p| p as i32);

        // `xmax = 0` distinguishes a fresh insert from a conflict update.
        // Review status is sticky: an update never downgrades a confirmed
        // or rejected row back to unconfirmed.
        let row = self
            .client
            .query_one(
                "INSERT INTO identity_candidate (
                     tenant_id, candidate_id, platform, platform_id, profile_url,
                     confidence, confidence_bucket, score_breakdown, evidence,
                     has_contradiction, contradiction_note, bridge_tier,
                     bridge_signals, persist_reason, status, origin,
                     serp_position, discovered_by, created_at, updated_at)
                 VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19,$20)
                 ON CONFLICT (tenant_id, candidate_id, platform, platform_id)
                 DO UPDATE SET
                     profile_url = EXCLUDED.profile_url,
                     confidence = EXCLUDED.confidence,
                     confidence_bucket = EXCLUDED.confidence_bucket,
                     score_breakdown = EXCLUDED.score_breakdown,
                     evidence = EXCLUDED.evidence,
                     has_contradiction = EXCLUDED.has_contradiction,
                     contradiction_note = EXCLUDED.contradiction_note,
                     bridge_tier = EXCLUDED.bridge_tier,
                     bridge_signals = EXCLUDED.bridge_signals,
                     persist_reason = EXCLUDED.persist_reason,
                     status = CASE WHEN identity_candidate.status = 'unconfirmed'
                                   THEN EXCLUDED.status
                                   ELSE identity_candidate.status END,
                     origin = EXCLUDED.origin,
                     serp_position = EXCLUDED.serp_position,
                     discovered_by = EXCLUDED.discovered_by,
                     updated_at = EXCLUDED.updated_at
                 RETURNING (xmax = 0) AS inserted",
                &[
                    &identity.tenant_id,
                    &identity.candidate_id,
                    &platform,
                    &identity.platform_id,
                    &identity.profile_url,
                    &identity.confidence,
                    &bucket,
                    &breakdown,
                    &evidence,
                    &identity.has_contradiction,
                    &identity.contradiction_note,
                    &tier,
                    &signals,
                    &identity.persist_reason,
                    &status,
                    &origin,
                    &serp_position,
                    &identity.discovered_by,
                    &identity.created_at,
                    &identity.updated_at,
                ],
            )
            .await
            .map_err(|e| Error::store(e.to_string()))?;

        let inserted: bool = row.get("inserted");
        Ok(if inserted {
            UpsertOutcome::Inserted
        } else {
            UpsertOutcome::Updated
        })
    }

    async fn list_identities(
        &self,
        tenant_id: &str,
        candidate_id: &str,
    ) -> Result<Vec<IdentityCandidate>> {
        let rows = self
            .client
            .query(
                "SELECT * FROM identity_candidate
                 WHERE tenant_id = $1 AND candidate_id = $2",
                &[&tenant_id, &candidate_id],
            )
            .await
            .map_err(|e| Error::store(e.to_string()))?;
        rows.iter().map(Self::identity_from_row).collect()
    }

    async fn set_identity_status(
        &self,
        tenant_id: &str,
        candidate_id: &str,
        platform: Platform,
        platform_id: &str,
        status: IdentityStatus,
    ) -> Result<()> {
        let platform = Self::enum_str(&platform)?;
        let status = Self::enum_str(&status)?;
        let updated = self
            .client
            .execute(
                "UPDATE identity_candidate SET status = $5, updated_at = NOW()
                 WHERE tenant_id = $1 AND candidate_id = $2
                   AND platform = $3 AND platform_id = $4",
                &[&tenant_id, &candidate_id, &platform, &platform_id, &status],
            )
            .await
            .map_err(|e| Error::store(e.to_string()))?;
        if updated == 0 {
            return Err(Error::store(format!(
                "identity not found: {platform}/{platform_id}"
            )));
        }
        Ok(())
    }

    async fn put_session(&self, session: &EnrichmentSession) -> Result<()> {
        let record = serde_json::to_value(session)?;
        let status = Self::enum_str(&session.status)?;
        self.client
            .execute(
                "INSERT INTO enrichment_session (id, tenant_id, candidate_id, record, status, created_at)
                 VALUES ($1,$2,$3,$4,$5,$6)
                 ON CONFLICT (id) DO UPDATE SET
                     record = EXCLUDED.record,
                     status = EXCLUDED.status",
                &[
                    &session.id,
                    &session.tenant_id,
                    &session.candidate_id,
                    &record,
                    &status,
                    &session.created_at,
                ],
            )
            .await
            .map_err(|e| Error::store(e.to_string()))?;
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<EnrichmentSession>> {
        let row = self
            .client
            .query_opt(
                "SELECT record FROM enrichment_session WHERE id = $1",
                &[&session_id],
            )
            .await
            .map_err(|e| Error::store(e.to_string()))?;
        row.map(|r| {
            let record: serde_json::Value = r.get("record");
            serde_json::from_value(record).map_err(Error::from)
        })
        .transpose()
    }

    async fn recent_sessions(
        &self,
        candidate_id: &str,
        limit: usize,
    ) -> Result<Vec<EnrichmentSession>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = self
            .client
            .query(
                "SELECT record FROM enrichment_session
                 WHERE candidate_id = $1
                 ORDER BY created_at DESC LIMIT $2",
                &[&candidate_id, &limit],
            )
            .await
            .map_err(|e| Error::store(e.to_string()))?;
        rows.iter()
            .map(|r| {
                let record: serde_json::Value = r.get("record");
                serde_json::from_value(record).map_err(Error::from)
            })
            .collect()
    }
}
