//! Hello subscription repository

use anyhow::Result;
use fitbot_shared::MessageTarget;
use sqlx::types::Json;
use sqlx::PgPool;

/// Subscription row: greet `target` when `bot_id` connects
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HelloRecord {
    pub id: i32,
    pub target: Json<MessageTarget>,
    pub bot_id: String,
}

pub struct HelloRepository;

impl HelloRepository {
    /// Subscribe a target. Returns `false` if it was already subscribed.
    pub async fn subscribe(pool: &PgPool, bot_id: &str, target: &MessageTarget) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO hello_hello (target, bot_id)
            SELECT $1, $2
            WHERE NOT EXISTS (
                SELECT 1 FROM hello_hello WHERE target = $1 AND bot_id = $2
            )
            "#,
        )
        .bind(Json(target))
        .bind(bot_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a subscription. Returns `false` if there was none.
    pub async fn unsubscribe(pool: &PgPool, bot_id: &str, target: &MessageTarget) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM hello_hello
            WHERE target = $1 AND bot_id = $2
            "#,
        )
        .bind(Json(target))
        .bind(bot_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn is_subscribed(pool: &PgPool, bot_id: &str, target: &MessageTarget) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM hello_hello WHERE target = $1 AND bot_id = $2)
            "#,
        )
        .bind(Json(target))
        .bind(bot_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// All subscriptions of one bot
    pub async fn list_by_bot(pool: &PgPool, bot_id: &str) -> Result<Vec<HelloRecord>> {
        let records = sqlx::query_as::<_, HelloRecord>(
            r#"
            SELECT id, target, bot_id
            FROM hello_hello
            WHERE bot_id = $1
            ORDER BY id
            "#,
        )
        .bind(bot_id)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }
}
