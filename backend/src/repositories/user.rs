//! Check-in user repository for database operations

use anyhow::Result;
use chrono::{DateTime, Utc};
use fitbot_shared::Platform;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// User record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub platform: String,
    pub platform_user_id: String,
    pub target_weight: Option<Decimal>,
    pub target_body_fat: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// User repository for database operations
pub struct UserRepository;

impl UserRepository {
    /// Fetch the user for a platform identity, creating it on first contact
    pub async fn ensure(
        pool: &PgPool,
        platform: Platform,
        platform_user_id: &str,
    ) -> Result<UserRecord> {
        // The no-op update makes RETURNING yield the existing row on conflict
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO check_in_users (platform, platform_user_id)
            VALUES ($1, $2)
            ON CONFLICT (platform, platform_user_id)
                DO UPDATE SET platform = EXCLUDED.platform
            RETURNING id, platform, platform_user_id, target_weight, target_body_fat, created_at
            "#,
        )
        .bind(platform.as_str())
        .bind(platform_user_id)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Set the target weight (kg)
    pub async fn set_target_weight(pool: &PgPool, id: Uuid, weight: f64) -> Result<UserRecord> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            UPDATE check_in_users SET target_weight = $2
            WHERE id = $1
            RETURNING id, platform, platform_user_id, target_weight, target_body_fat, created_at
            "#,
        )
        .bind(id)
        .bind(weight)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Set the target body fat (%)
    pub async fn set_target_body_fat(
        pool: &PgPool,
        id: Uuid,
        body_fat: f64,
    ) -> Result<UserRecord> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            UPDATE check_in_users SET target_body_fat = $2
            WHERE id = $1
            RETURNING id, platform, platform_user_id, target_weight, target_body_fat, created_at
            "#,
        )
        .bind(id)
        .bind(body_fat)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }
}
