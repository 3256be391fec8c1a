use super::{GenerationRecord, GenerationStore};
use crate::error::StoreResult;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Process-local store, used when no database is configured. Records are
/// keyed by insertion order so equal timestamps still sort newest first.
#[derive(Default)]
pub struct MemoryGenerationStore {
    records: DashMap<u64, GenerationRecord>,
    next_seq: AtomicU64,
}

impl MemoryGenerationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl GenerationStore for MemoryGenerationStore {
    async fn record(&self, prompt: &str, output: &Value) -> StoreResult<GenerationRecord> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let record = GenerationRecord {
            id: Uuid::new_v4(),
            prompt: prompt.to_string(),
            output: output.clone(),
            created_at: Utc::now(),
        };
        self.records.insert(seq, record.clone());
        Ok(record)
    }

    async fn recent(&self, limit: i64) -> StoreResult<Vec<GenerationRecord>> {
        let mut entries: Vec<(u64, GenerationRecord)> = self
            .records
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        let take = usize::try_from(limit.max(0)).unwrap_or(0);
        Ok(entries.into_iter().take(take).map(|(_, r)| r).collect())
    }
}
