pub mod memory;
pub mod pg;

use crate::error::StoreResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

pub use memory::MemoryGenerationStore;
pub use pg::PgGenerationStore;

pub const DEFAULT_RECENT: i64 = 2;
pub const MAX_RECENT: i64 = 50;

/// One stored round-trip: the prompt and the response object sent back.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRecord {
    pub id: Uuid,
    pub prompt: String,
    pub output: Value,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait GenerationStore: Send + Sync {
    async fn record(&self, prompt: &str, output: &Value) -> StoreResult<GenerationRecord>;

    /// Most recent records, newest first.
    async fn recent(&self, limit: i64) -> StoreResult<Vec<GenerationRecord>>;
}

/// Records a generation; failures are logged and otherwise ignored.
pub async fn record_quietly(store: &dyn GenerationStore, prompt: &str, output: &Value) {
    if let Err(e) = store.record(prompt, output).await {
        tracing::warn!(error = %e, "failed to persist generation");
    }
}

/// Recent records, or none when the store fails.
pub async fn recent_quietly(store: &dyn GenerationStore, limit: i64) -> Vec<GenerationRecord> {
    match store.recent(limit).await {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load recent generations");
            Vec::new()
        }
    }
}

/// Clamps a requested page size to 1..=50, defaulting to 2.
pub fn recent_limit(requested: Option<i64>) -> i64 {
    requested.unwrap_or(DEFAULT_RECENT).clamp(1, MAX_RECENT)
}
