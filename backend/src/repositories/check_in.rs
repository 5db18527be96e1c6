//! Check-in record repositories
//!
//! Records are append-only: these repositories insert and read, never
//! update or delete.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// Fitness check-in from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FitnessRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub message: String,
}

/// Dietary check-in from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DietaryRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub healthy: bool,
}

/// Weight check-in from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WeightRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub weight: Decimal,
}

/// Body fat check-in from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BodyFatRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub body_fat: Decimal,
}

pub struct FitnessRepository;

impl FitnessRepository {
    pub async fn create(pool: &PgPool, user_id: Uuid, message: &str) -> Result<FitnessRecord> {
        let record = sqlx::query_as::<_, FitnessRecord>(
            r#"
            INSERT INTO fitness_records (user_id, message)
            VALUES ($1, $2)
            RETURNING id, user_id, recorded_at, message
            "#,
        )
        .bind(user_id)
        .bind(message)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    /// All fitness check-ins of a user, oldest first
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<FitnessRecord>> {
        let records = sqlx::query_as::<_, FitnessRecord>(
            r#"
            SELECT id, user_id, recorded_at, message
            FROM fitness_records
            WHERE user_id = $1
            ORDER BY recorded_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }
}

pub struct DietaryRepository;

impl DietaryRepository {
    pub async fn create(pool: &PgPool, user_id: Uuid, healthy: bool) -> Result<DietaryRecord> {
        let record = sqlx::query_as::<_, DietaryRecord>(
            r#"
            INSERT INTO dietary_records (user_id, healthy)
            VALUES ($1, $2)
            RETURNING id, user_id, recorded_at, healthy
            "#,
        )
        .bind(user_id)
        .bind(healthy)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    /// Check-in counts grouped by the healthy flag.
    ///
    /// Groups with no rows are absent from the result.
    pub async fn count_by_health(pool: &PgPool, user_id: Uuid) -> Result<Vec<(bool, i64)>> {
        let groups = sqlx::query_as::<_, (bool, i64)>(
            r#"
            SELECT healthy, COUNT(*)
            FROM dietary_records
            WHERE user_id = $1
            GROUP BY healthy
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(groups)
    }
}

pub struct WeightRepository;

impl WeightRepository {
    pub async fn create(pool: &PgPool, user_id: Uuid, weight: f64) -> Result<WeightRecord> {
        let record = sqlx::query_as::<_, WeightRecord>(
            r#"
            INSERT INTO weight_records (user_id, weight)
            VALUES ($1, $2)
            RETURNING id, user_id, recorded_at, weight
            "#,
        )
        .bind(user_id)
        .bind(weight)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    /// All weight check-ins of a user, oldest first
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<WeightRecord>> {
        let records = sqlx::query_as::<_, WeightRecord>(
            r#"
            SELECT id, user_id, recorded_at, weight
            FROM weight_records
            WHERE user_id = $1
            ORDER BY recorded_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }
}

pub struct BodyFatRepository;

impl BodyFatRepository {
    pub async fn create(pool: &PgPool, user_id: Uuid, body_fat: f64) -> Result<BodyFatRecord> {
        let record = sqlx::query_as::<_, BodyFatRecord>(
            r#"
            INSERT INTO body_fat_records (user_id, body_fat)
            VALUES ($1, $2)
            RETURNING id, user_id, recorded_at, body_fat
            "#,
        )
        .bind(user_id)
        .bind(body_fat)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    /// All body fat check-ins of a user, oldest first
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<BodyFatRecord>> {
        let records = sqlx::query_as::<_, BodyFatRecord>(
            r#"
            SELECT id, user_id, recorded_at, body_fat
            FROM body_fat_records
            WHERE user_id = $1
            ORDER BY recorded_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }
}
