//! Redis job store.
//!
//! Shared backend for multi-process deployments. Each job is a Redis
//! hash (`dtwin:job:{id}`) with one field per scalar and one field per
//! stage output, plus an index set (`dtwin:jobs`) for cleanup scans.
//!
//! Updates are applied as a single multi-field `HSET`, so concurrent
//! updates to the same job interleave at field granularity
//! (last-writer-wins per field) instead of clobbering the whole record.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use tracing::{debug, info, warn};

use dtwin_models::{JobId, JobInputs, JobRecord, JobStatus, JobUpdate, Stage, StageOutputs};

use crate::error::{StoreError, StoreResult};
use crate::store::JobStore;

const INDEX_KEY: &str = "dtwin:jobs";

fn job_key(id: &str) -> String {
    format!("dtwin:job:{}", id)
}

fn output_field(stage: Stage) -> String {
    format!("output:{}", stage)
}

/// Shared job store backed by Redis.
#[derive(Debug)]
pub struct RedisJobStore {
    client: redis::Client,
}

impl RedisJobStore {
    /// Connect to Redis and verify reachability with a `PING`.
    pub async fn connect(redis_url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| StoreError::unavailable(format!("invalid Redis URL: {}", e)))?;

        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::unavailable(format!("failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| StoreError::unavailable(format!("Redis ping failed: {}", e)))?;

        info!("Connected to Redis for job storage");
        Ok(Self { client })
    }

    async fn conn(&self) -> StoreResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::unavailable(format!("Redis connection failed: {}", e)))
    }
}

/// Encode the full record as hash fields for the initial write.
fn record_fields(record: &JobRecord) -> StoreResult<Vec<(String, String)>> {
    let mut fields = vec![
        ("id".to_string(), record.id.as_str().to_string()),
        ("status".to_string(), record.status.as_str().to_string()),
        ("inputs".to_string(), serde_json::to_string(&record.inputs)?),
        ("created_at".to_string(), record.created_at.to_rfc3339()),
        ("updated_at".to_string(), record.updated_at.to_rfc3339()),
    ];
    if let Some(stage) = record.stage {
        fields.push(("stage".to_string(), stage.as_str().to_string()));
    }
    if let Some(progress) = &record.progress {
        fields.push(("progress".to_string(), progress.clone()));
    }
    for (stage, output) in record.outputs.iter() {
        fields.push((output_field(stage), serde_json::to_string(output)?));
    }
    Ok(fields)
}

/// Encode a partial update as hash fields. Always refreshes `updated_at`.
fn update_fields(update: &JobUpdate) -> StoreResult<Vec<(String, String)>> {
    let mut fields = vec![("updated_at".to_string(), Utc::now().to_rfc3339())];
    if let Some(status) = update.status {
        fields.push(("status".to_string(), status.as_str().to_string()));
    }
    if let Some(stage) = update.stage {
        fields.push(("stage".to_string(), stage.as_str().to_string()));
    }
    if let Some(progress) = &update.progress {
        fields.push(("progress".to_string(), progress.clone()));
    }
    if let Some(error) = &update.error {
        fields.push(("error".to_string(), error.clone()));
    }
    if let Some((stage, output)) = &update.output {
        fields.push((output_field(*stage), serde_json::to_string(output)?));
    }
    Ok(fields)
}

fn parse_timestamp(id: &str, field: &str, value: Option<&String>) -> StoreResult<DateTime<Utc>> {
    let raw = value.ok_or_else(|| StoreError::corrupt(id, format!("missing {}", field)))?;
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::corrupt(id, format!("bad {}: {}", field, e)))
}

/// Rebuild a record from its hash fields.
///
/// Output insertion order is recovered from the variant's fixed stage
/// order, which matches write order since stages run sequentially.
fn record_from_map(id: &str, map: &HashMap<String, String>) -> StoreResult<JobRecord> {
    let inputs: JobInputs = serde_json::from_str(
        map.get("inputs")
            .ok_or_else(|| StoreError::corrupt(id, "missing inputs"))?,
    )?;

    let status = map
        .get("status")
        .and_then(|s| match s.as_str() {
            "created" => Some(JobStatus::Created),
            "processing" => Some(JobStatus::Processing),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        })
        .ok_or_else(|| StoreError::corrupt(id, "missing or bad status"))?;

    let stage = map.get("stage").and_then(|s| Stage::parse(s));

    let mut outputs = StageOutputs::new();
    for stage in inputs.variant.stages() {
        if let Some(raw) = map.get(&output_field(*stage)) {
            outputs.insert(*stage, serde_json::from_str(raw)?);
        }
    }

    Ok(JobRecord {
        id: JobId::from_string(id),
        status,
        stage,
        inputs,
        outputs,
        error: map.get("error").cloned(),
        progress: map.get("progress").cloned(),
        created_at: parse_timestamp(id, "created_at", map.get("created_at"))?,
        updated_at: parse_timestamp(id, "updated_at", map.get("updated_at"))?,
    })
}

#[async_trait]
impl JobStore for RedisJobStore {
    async fn create(&self, inputs: JobInputs) -> StoreResult<JobRecord> {
        let record = JobRecord::new(inputs);
        let mut conn = self.conn().await?;

        let mut cmd = redis::cmd("HSET");
        cmd.arg(job_key(record.id.as_str()));
        for (field, value) in record_fields(&record)? {
            cmd.arg(field).arg(value);
        }
        cmd.query_async::<()>(&mut conn).await?;

        conn.sadd::<_, _, ()>(INDEX_KEY, record.id.as_str()).await?;

        debug!(job_id = %record.id, "Created job in Redis");
        Ok(record)
    }

    async fn get(&self, id: &JobId) -> StoreResult<JobRecord> {
        let mut conn = self.conn().await?;
        let map: HashMap<String, String> = conn.hgetall(job_key(id.as_str())).await?;
        if map.is_empty() {
            return Err(StoreError::not_found(id.as_str()));
        }
        record_from_map(id.as_str(), &map)
    }

    async fn update(&self, id: &JobId, update: JobUpdate) -> StoreResult<JobRecord> {
        let mut conn = self.conn().await?;
        let key = job_key(id.as_str());

        let status: Option<String> = conn.hget(&key, "status").await?;
        let status = status.ok_or_else(|| StoreError::not_found(id.as_str()))?;

        // Terminal records are immutable except for deletion.
        if status == "completed" || status == "failed" {
            debug!(job_id = %id, status = %status, "Ignoring update to terminal job");
            return self.get(id).await;
        }

        let mut cmd = redis::cmd("HSET");
        cmd.arg(&key);
        for (field, value) in update_fields(&update)? {
            cmd.arg(field).arg(value);
        }
        cmd.query_async::<()>(&mut conn).await?;

        self.get(id).await
    }

    async fn delete(&self, id: &JobId) -> StoreResult<bool> {
        let mut conn = self.conn().await?;
        let deleted: i64 = conn.del(job_key(id.as_str())).await?;
        conn.srem::<_, _, ()>(INDEX_KEY, id.as_str()).await?;
        Ok(deleted > 0)
    }

    async fn list_terminal_older_than(&self, age: Duration) -> StoreResult<Vec<JobId>> {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(age).unwrap_or_else(|_| chrono::Duration::zero());

        let mut conn = self.conn().await?;
        let ids: Vec<String> = conn.smembers(INDEX_KEY).await?;

        let mut old = Vec::new();
        for id in ids {
            let (status, updated_at): (Option<String>, Option<String>) = redis::cmd("HMGET")
                .arg(job_key(&id))
                .arg("status")
                .arg("updated_at")
                .query_async(&mut conn)
                .await?;

            let Some(status) = status else {
                // Orphaned index entry for a deleted hash
                warn!(job_id = %id, "Removing orphaned job index entry");
                conn.srem::<_, _, ()>(INDEX_KEY, &id).await?;
                continue;
            };

            if status != "completed" && status != "failed" {
                continue;
            }

            match parse_timestamp(&id, "updated_at", updated_at.as_ref()) {
                Ok(ts) if ts < cutoff => old.push(JobId::from_string(id)),
                Ok(_) => {}
                Err(e) => warn!(job_id = %id, "Skipping job with bad timestamp: {}", e),
            }
        }

        Ok(old)
    }
}
