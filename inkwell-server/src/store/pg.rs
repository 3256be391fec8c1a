use super::{GenerationRecord, GenerationStore};
use crate::error::StoreResult;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(include_str!("../../migrations/001_create_generations.sql"))
        .execute(pool)
        .await?;
    Ok(())
}

pub struct PgGenerationStore {
    pool: PgPool,
}

impl PgGenerationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects and runs migrations.
    pub async fn open(database_url: &str) -> StoreResult<Self> {
        let pool = connect(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl GenerationStore for PgGenerationStore {
    async fn record(&self, prompt: &str, output: &Value) -> StoreResult<GenerationRecord> {
        let rec = sqlx::query_as::<_, GenerationRecord>(
            r#"
            INSERT INTO generations (id, prompt, output)
            VALUES (gen_random_uuid(), $1, $2)
            RETURNING id, prompt, output, created_at
            "#,
        )
        .bind(prompt)
        .bind(output)
        .fetch_one(&self.pool)
        .await?;
        Ok(rec)
    }

    async fn recent(&self, limit: i64) -> StoreResult<Vec<GenerationRecord>> {
        let rows = sqlx::query_as::<_, GenerationRecord>(
            r#"
            SELECT id, prompt, output, created_at
            FROM generations
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
