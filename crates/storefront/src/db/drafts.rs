//! Checkout draft repository.
//!
//! One encrypted JSON payload per user holding the last-entered checkout
//! form, so a failed submission does not lose the form. Cleared inside the
//! checkout transaction when the order is placed.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use gearloom_core::UserId;

use super::RepositoryError;

/// Repository for checkout drafts.
pub struct DraftRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> DraftRepository<'a> {
    /// Create a new draft repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Upsert the draft payload for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn save(
        &self,
        user_id: UserId,
        payload: &str,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO checkout_drafts (user_id, payload, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT (user_id) DO UPDATE SET payload = excluded.payload,
                                                 updated_at = excluded.updated_at",
        )
        .bind(user_id)
        .bind(payload)
        .bind(now)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Load the draft payload for a user, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn load(&self, user_id: UserId) -> Result<Option<String>, RepositoryError> {
        let payload: Option<(String,)> =
            sqlx::query_as("SELECT payload FROM checkout_drafts WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(self.pool)
                .await?;
        Ok(payload.map(|(p,)| p))
    }

    /// Delete a user's draft.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM checkout_drafts WHERE user_id = ?")
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Delete a user's draft inside an existing transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear_in_tx(
        conn: &mut SqliteConnection,
        user_id: UserId,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM checkout_drafts WHERE user_id = ?")
            .bind(user_id)
            .execute(conn)
            .await?;
        Ok(())
    }
}
