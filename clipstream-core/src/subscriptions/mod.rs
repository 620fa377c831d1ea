//! Channel subscriptions: a user following another user's uploads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::fmt;
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    pub subscriber_id: Uuid,
    pub channel_id: Uuid,
    pub created_at: DateTime<Utc>,
}

pub struct SubscriptionRepository {
    pool: PgPool,
}

impl fmt::Debug for SubscriptionRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionRepository").finish()
    }
}

impl SubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Subscribe if not subscribed, unsubscribe otherwise. Returns whether
    /// the subscription exists afterwards.
    pub async fn toggle(&self, subscriber_id: Uuid, channel_id: Uuid) -> Result<bool> {
        let deleted =
            sqlx::query("DELETE FROM subscriptions WHERE subscriber_id = $1 AND channel_id = $2")
                .bind(subscriber_id)
                .bind(channel_id)
                .execute(&self.pool)
                .await?;

        if deleted.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO subscriptions (id, subscriber_id, channel_id) VALUES ($1, $2, $3) \
             ON CONFLICT DO NOTHING",
        )
        .bind(Uuid::now_v7())
        .bind(subscriber_id)
        .bind(channel_id)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    pub async fn subscribers_of(&self, channel_id: Uuid) -> Result<Vec<Subscription>> {
        let subscriptions = sqlx::query_as::<_, Subscription>(
            "SELECT id, subscriber_id, channel_id, created_at \
             FROM subscriptions WHERE channel_id = $1 ORDER BY created_at DESC",
        )
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(subscriptions)
    }

    pub async fn subscribed_channels(&self, subscriber_id: Uuid) -> Result<Vec<Subscription>> {
        let subscriptions = sqlx::query_as::<_, Subscription>(
            "SELECT id, subscriber_id, channel_id, created_at \
             FROM subscriptions WHERE subscriber_id = $1 ORDER BY created_at DESC",
        )
        .bind(subscriber_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(subscriptions)
    }

    pub async fn subscriber_count(&self, channel_id: Uuid) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE channel_id = $1")
                .bind(channel_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    pub async fn subscribed_count(&self, subscriber_id: Uuid) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE subscriber_id = $1")
                .bind(subscriber_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    pub async fn is_subscribed(&self, subscriber_id: Uuid, channel_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM subscriptions WHERE subscriber_id = $1 AND channel_id = $2)",
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
