//! Credential storage: accounts and their enrolled face credentials.
//!
//! An account and its face credential are a single atomic unit. Registration
//! inserts both rows in one transaction, so no failure branch can leave an
//! account without an enrollment; lookup still reports a missing credential
//! distinctly rather than trusting that invariant blindly.

use std::path::{Path, PathBuf};

use sqlx::FromRow;
use tracing::debug;
use uuid::Uuid;

use crate::db::GatewayDb;
use crate::error::{CoreError, CoreResult};

/// A registered account.
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: i64,
}

/// The face credential enrolled for an account.
///
/// The reference image blob lives in the database; `reference_path` is where
/// it gets materialized for the comparison backend.
#[derive(Debug, Clone, FromRow)]
pub struct FaceCredential {
    pub account_id: String,
    pub reference_path: String,
    pub created_at: i64,
}

/// An account together with its face credential, as resolved at login.
#[derive(Debug, Clone)]
pub struct Enrollment {
    pub account: Account,
    pub credential: FaceCredential,
}

impl GatewayDb {
    /// Check whether a username is already registered.
    pub async fn username_exists(&self, username: &str) -> CoreResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE username = ?")
                .bind(username)
                .fetch_one(self.pool())
                .await?;
        Ok(count > 0)
    }

    /// Register an account with its face credential as one atomic unit.
    ///
    /// `password_hash` must already be hashed; this layer never sees plain
    /// passwords. `reference_image` must already be validated as a readable
    /// image. Fails with [`CoreError::DuplicateUsername`] when the username
    /// is taken, whether caught by the pre-check or by the UNIQUE constraint.
    pub async fn register_account(
        &self,
        username: &str,
        password_hash: &str,
        reference_image: &[u8],
        media_dir: &Path,
    ) -> CoreResult<Account> {
        let now = chrono::Utc::now().timestamp();
        let account = Account {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
        };
        let reference_path = media_dir.join(format!("ref-{}.jpg", account.id));

        let mut tx = self.pool().begin().await?;

        let taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE username = ?")
            .bind(username)
            .fetch_one(&mut *tx)
            .await?;
        if taken > 0 {
            return Err(CoreError::duplicate_username(username));
        }

        let inserted = sqlx::query(
            "INSERT INTO accounts (id, username, password_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&account.id)
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(account.created_at)
        .execute(&mut *tx)
        .await;

        if let Err(err) = inserted {
            // UNIQUE constraint backstop for a write that raced the pre-check.
            if let sqlx::Error::Database(ref db_err) = err {
                if db_err.is_unique_violation() {
                    return Err(CoreError::duplicate_username(username));
                }
            }
            return Err(err.into());
        }

        sqlx::query(
            "INSERT INTO face_credentials (account_id, reference_image, reference_path, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&account.id)
        .bind(reference_image)
        .bind(reference_path.to_string_lossy().as_ref())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(username, account_id = %account.id, "registered account with face credential");
        Ok(account)
    }

    /// Resolve a claimed identity to its account and face credential.
    ///
    /// Fails with [`CoreError::AccountNotFound`] when no account matches and
    /// [`CoreError::NotEnrolled`] when the account has no credential.
    pub async fn lookup_enrollment(&self, username: &str) -> CoreResult<Enrollment> {
        let account: Option<Account> = sqlx::query_as(
            "SELECT id, username, password_hash, created_at FROM accounts WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(self.pool())
        .await?;

        let account = account.ok_or_else(|| CoreError::account_not_found(username))?;

        let credential: Option<FaceCredential> = sqlx::query_as(
            "SELECT account_id, reference_path, created_at FROM face_credentials
             WHERE account_id = ?",
        )
        .bind(&account.id)
        .fetch_optional(self.pool())
        .await?;

        let credential = credential.ok_or_else(|| CoreError::not_enrolled(username))?;

        Ok(Enrollment {
            account,
            credential,
        })
    }

    /// Fetch the stored reference image blob for an account.
    pub async fn reference_image(&self, account_id: &str) -> CoreResult<Vec<u8>> {
        let blob: Option<Vec<u8>> =
            sqlx::query_scalar("SELECT reference_image FROM face_credentials WHERE account_id = ?")
                .bind(account_id)
                .fetch_optional(self.pool())
                .await?;
        blob.ok_or_else(|| CoreError::not_enrolled(account_id))
    }

    /// Make sure the reference image exists on disk at its recorded path.
    ///
    /// The file is a materialization of the blob; if something removed it,
    /// it is rewritten from the database before verification.
    pub async fn ensure_reference_file(
        &self,
        credential: &FaceCredential,
    ) -> CoreResult<PathBuf> {
        let path = PathBuf::from(&credential.reference_path);
        if !path.exists() {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let blob = self.reference_image(&credential.account_id).await?;
            tokio::fs::write(&path, blob).await?;
            debug!(path = %path.display(), "materialized reference image from blob");
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::GatewayDb;
    use tempfile::TempDir;

    const HASH: &str = "$argon2id$stub$hash";

    #[tokio::test]
    async fn register_then_lookup() {
        let db = GatewayDb::open_in_memory().await.unwrap();
        let tmp = TempDir::new().unwrap();

        let account = db
            .register_account("alice", HASH, b"reference bytes", tmp.path())
            .await
            .unwrap();

        let enrollment = db.lookup_enrollment("alice").await.unwrap();
        assert_eq!(enrollment.account.id, account.id);
        assert_eq!(enrollment.credential.account_id, account.id);
        assert_eq!(
            db.reference_image(&account.id).await.unwrap(),
            b"reference bytes"
        );
    }

    #[tokio::test]
    async fn duplicate_username_rejected_and_store_unchanged() {
        let db = GatewayDb::open_in_memory().await.unwrap();
        let tmp = TempDir::new().unwrap();

        db.register_account("alice", HASH, b"first", tmp.path())
            .await
            .unwrap();
        // Different image, same username: still a duplicate.
        let err = db
            .register_account("alice", HASH, b"second", tmp.path())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateUsername { .. }));

        // Exactly one account and one credential remain.
        let accounts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(db.pool())
            .await
            .unwrap();
        let credentials: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM face_credentials")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(accounts, 1);
        assert_eq!(credentials, 1);
        assert_eq!(
            db.reference_image(&db.lookup_enrollment("alice").await.unwrap().account.id)
                .await
                .unwrap(),
            b"first"
        );
    }

    #[tokio::test]
    async fn lookup_unknown_user_is_not_found() {
        let db = GatewayDb::open_in_memory().await.unwrap();
        let err = db.lookup_enrollment("nobody").await.unwrap_err();
        assert!(matches!(err, CoreError::AccountNotFound { .. }));
    }

    #[tokio::test]
    async fn lookup_account_without_credential_is_not_enrolled() {
        let db = GatewayDb::open_in_memory().await.unwrap();

        // Bypass register_account to simulate a damaged store.
        sqlx::query(
            "INSERT INTO accounts (id, username, password_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind("orphan-id")
        .bind("orphan")
        .bind(HASH)
        .bind(0_i64)
        .execute(db.pool())
        .await
        .unwrap();

        let err = db.lookup_enrollment("orphan").await.unwrap_err();
        assert!(matches!(err, CoreError::NotEnrolled { .. }));
    }

    #[tokio::test]
    async fn reference_file_materialized_and_rematerialized() {
        let db = GatewayDb::open_in_memory().await.unwrap();
        let tmp = TempDir::new().unwrap();

        db.register_account("alice", HASH, b"reference bytes", tmp.path())
            .await
            .unwrap();
        let enrollment = db.lookup_enrollment("alice").await.unwrap();

        let path = db
            .ensure_reference_file(&enrollment.credential)
            .await
            .unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"reference bytes");

        // Removed behind our back: rebuilt from the blob.
        std::fs::remove_file(&path).unwrap();
        let path = db
            .ensure_reference_file(&enrollment.credential)
            .await
            .unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"reference bytes");
    }
}
