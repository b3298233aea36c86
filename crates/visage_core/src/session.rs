//! Session issuance and validation.
//!
//! A session is created only after the verification engine reports a match,
//! and it is bound to the account row resolved at lookup time, never to the
//! username string from the request. Tokens are opaque uuids; expiry is not
//! enforced here, sessions live until revoked.

use sqlx::FromRow;
use tracing::{debug, info};
use uuid::Uuid;

use crate::credentials::Account;
use crate::db::GatewayDb;
use crate::error::{CoreError, CoreResult};

/// An active authenticated session.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub token: String,
    pub account_id: String,
    pub issued_at: i64,
}

impl GatewayDb {
    /// Issue a session for a positively verified account.
    pub async fn issue_session(&self, account: &Account) -> CoreResult<Session> {
        let session = Session {
            token: Uuid::new_v4().to_string(),
            account_id: account.id.clone(),
            issued_at: chrono::Utc::now().timestamp(),
        };

        sqlx::query("INSERT INTO sessions (token, account_id, issued_at) VALUES (?, ?, ?)")
            .bind(&session.token)
            .bind(&session.account_id)
            .bind(session.issued_at)
            .execute(self.pool())
            .await?;

        info!(username = %account.username, "session issued");
        Ok(session)
    }

    /// Resolve a presented token to the account it was issued for.
    pub async fn validate_session(&self, token: &str) -> CoreResult<Account> {
        let account: Option<Account> = sqlx::query_as(
            "SELECT a.id, a.username, a.password_hash, a.created_at
             FROM sessions s JOIN accounts a ON a.id = s.account_id
             WHERE s.token = ?",
        )
        .bind(token)
        .fetch_optional(self.pool())
        .await?;

        account.ok_or(CoreError::SessionNotFound)
    }

    /// Revoke a session (logout). Revoking an unknown token is a no-op.
    pub async fn revoke_session(&self, token: &str) -> CoreResult<()> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(self.pool())
            .await?;
        debug!(revoked = result.rows_affected(), "session revoked");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn registered_account(db: &GatewayDb, tmp: &TempDir) -> Account {
        db.register_account("alice", "$argon2id$stub$hash", b"img", tmp.path())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn issue_validate_revoke() {
        let db = GatewayDb::open_in_memory().await.unwrap();
        let tmp = TempDir::new().unwrap();
        let account = registered_account(&db, &tmp).await;

        let session = db.issue_session(&account).await.unwrap();
        assert_eq!(session.account_id, account.id);

        let resolved = db.validate_session(&session.token).await.unwrap();
        assert_eq!(resolved.id, account.id);
        assert_eq!(resolved.username, "alice");

        db.revoke_session(&session.token).await.unwrap();
        let err = db.validate_session(&session.token).await.unwrap_err();
        assert!(matches!(err, CoreError::SessionNotFound));
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let db = GatewayDb::open_in_memory().await.unwrap();
        let err = db.validate_session("not-a-token").await.unwrap_err();
        assert!(matches!(err, CoreError::SessionNotFound));
    }

    #[tokio::test]
    async fn revoking_unknown_token_is_a_noop() {
        let db = GatewayDb::open_in_memory().await.unwrap();
        db.revoke_session("not-a-token").await.unwrap();
    }
}
