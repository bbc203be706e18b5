use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    MemberId, PairKey, RecordEnvelope, RecordQuery, Result, StoreError, store::Persistor,
};

/// PostgreSQL-backed persistor implementation.
#[derive(Clone)]
pub struct PostgresPersistor {
    pool: PgPool,
}

impl PostgresPersistor {
    /// Creates a new PostgreSQL persistor.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_envelope(row: PgRow) -> Result<RecordEnvelope> {
        let low: i64 = row.try_get("low_id")?;
        let high: i64 = row.try_get("high_id")?;

        Ok(RecordEnvelope {
            kind: row.try_get("kind")?,
            key: PairKey::new(MemberId::new(low), MemberId::new(high)),
            payload: row.try_get("payload")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl Persistor for PostgresPersistor {
    async fn load(&self, kind: &str, key: PairKey) -> Result<Option<RecordEnvelope>> {
        let row = sqlx::query(
            r#"
            SELECT kind, low_id, high_id, payload, updated_at
            FROM relation_records
            WHERE kind = $1 AND low_id = $2 AND high_id = $3
            "#,
        )
        .bind(kind)
        .bind(key.low().as_i64())
        .bind(key.high().as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_envelope).transpose()
    }

    async fn insert(&self, envelope: RecordEnvelope) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO relation_records (kind, low_id, high_id, payload, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&envelope.kind)
        .bind(envelope.key.low().as_i64())
        .bind(envelope.key.high().as_i64())
        .bind(&envelope.payload)
        .bind(envelope.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("relation_records_pkey")
            {
                return StoreError::AlreadyExists {
                    kind: envelope.kind.clone(),
                    key: envelope.key,
                };
            }
            StoreError::Database(e)
        })?;

        Ok(())
    }

    async fn update(&self, envelope: RecordEnvelope) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE relation_records
            SET payload = $4, updated_at = $5
            WHERE kind = $1 AND low_id = $2 AND high_id = $3
            "#,
        )
        .bind(&envelope.kind)
        .bind(envelope.key.low().as_i64())
        .bind(envelope.key.high().as_i64())
        .bind(&envelope.payload)
        .bind(envelope.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                kind: envelope.kind,
                key: envelope.key,
            });
        }

        Ok(())
    }

    async fn delete(&self, kind: &str, key: PairKey) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM relation_records WHERE kind = $1 AND low_id = $2 AND high_id = $3",
        )
        .bind(kind)
        .bind(key.low().as_i64())
        .bind(key.high().as_i64())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn query(&self, query: RecordQuery) -> Result<Vec<RecordEnvelope>> {
        // NULL parameters disable their filter; LIMIT NULL means no limit
        let rows = sqlx::query(
            r#"
            SELECT kind, low_id, high_id, payload, updated_at
            FROM relation_records
            WHERE ($1::TEXT IS NULL OR kind = $1)
              AND ($2::BIGINT IS NULL OR low_id = $2 OR high_id = $2)
            ORDER BY updated_at DESC, low_id ASC, high_id ASC
            LIMIT $3
            "#,
        )
        .bind(query.kind.as_deref())
        .bind(query.member.map(|m| m.as_i64()))
        .bind(sql_limit(query.limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_envelope).collect()
    }
}

/// Converts a row limit to its SQL parameter, saturating at `i64::MAX`.
fn sql_limit(limit: Option<usize>) -> Option<i64> {
    limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX))
}
