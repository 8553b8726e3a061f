use axum::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tokio::time::timeout;
use uuid::Uuid;

use crate::auth::{utils, AdminRecord, User};
use crate::config::settings::{EmergencySettings, Settings};

const USERS_TABLE: &str = "site_users_clr";
const ADMINS_TABLE: &str = "admin_users_clr";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidCredentials(String),
    #[error("identity store unavailable: {0}")]
    StoreUnavailable(String),
}

/// The remote identity surface the gate depends on. Production uses the
/// row store; tests substitute unreachable or canned stores.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;
    async fn find_active_admin(&self, email: &str) -> Result<Option<AdminRecord>, AuthError>;
    /// Best-effort bookkeeping on sign-out.
    async fn record_sign_out(&self, email: &str) -> Result<(), AuthError>;
}

pub struct SqlIdentityStore {
    pool: PgPool,
}

impl SqlIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for SqlIdentityStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        sqlx::query_as::<_, User>(&format!("SELECT * FROM {USERS_TABLE} WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))
    }

    async fn find_active_admin(&self, email: &str) -> Result<Option<AdminRecord>, AuthError> {
        sqlx::query_as::<_, AdminRecord>(&format!(
            "SELECT * FROM {ADMINS_TABLE} WHERE email = $1 AND is_active = TRUE"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::StoreUnavailable(e.to_string()))
    }

    async fn record_sign_out(&self, email: &str) -> Result<(), AuthError> {
        sqlx::query(&format!(
            "UPDATE {USERS_TABLE} SET last_sign_out_at = NOW() WHERE email = $1"
        ))
        .bind(email)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        Ok(())
    }
}

/// Outcome of a successful sign-in.
#[derive(Debug)]
pub struct SignedIn {
    pub user_id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub is_admin: bool,
    pub emergency: bool,
}

/// Wraps the identity store with the admin allow-list lookup and the
/// degraded-mode fallback. The fallback only fires when the store cannot
/// be reached within the bounded wait, is explicitly enabled, and the
/// operator's pre-shared email and passphrase both match; it is never
/// silent.
pub struct AuthGate<S> {
    store: S,
    auth_timeout: std::time::Duration,
    emergency: EmergencySettings,
}

impl AuthGate<SqlIdentityStore> {
    pub fn from_settings(pool: PgPool, settings: &Settings) -> Self {
        AuthGate::new(
            SqlIdentityStore::new(pool),
            settings.auth_timeout,
            settings.emergency.clone(),
        )
    }
}

impl<S: IdentityStore> AuthGate<S> {
    pub fn new(store: S, auth_timeout: std::time::Duration, emergency: EmergencySettings) -> Self {
        Self {
            store,
            auth_timeout,
            emergency,
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn, AuthError> {
        let email = email.trim().to_lowercase();

        let lookup = timeout(self.auth_timeout, self.store.find_user_by_email(&email)).await;

        let user = match lookup {
            Ok(Ok(user)) => user,
            Ok(Err(err)) => {
                tracing::warn!("identity store failed during sign-in: {}", err);
                return self.emergency_sign_in(&email, password, err.to_string());
            }
            Err(_) => {
                tracing::warn!("identity store timed out during sign-in");
                return self.emergency_sign_in(&email, password, "timed out".to_string());
            }
        };

        let user = user.ok_or_else(|| {
            AuthError::InvalidCredentials("Invalid email or password".to_string())
        })?;

        utils::verify_password(&user.password_hash, password).map_err(|_| {
            AuthError::InvalidCredentials("Invalid email or password".to_string())
        })?;

        // Absence of an allow-list row means a regular session, not an
        // error. A failed lookup also degrades to non-admin.
        let is_admin = match self.store.find_active_admin(&email).await {
            Ok(record) => record.is_some(),
            Err(err) => {
                tracing::warn!("admin lookup failed for {}: {}", email, err);
                false
            }
        };

        Ok(SignedIn {
            user_id: user.id,
            email: user.email,
            full_name: user.full_name,
            is_admin,
            emergency: false,
        })
    }

    fn emergency_sign_in(
        &self,
        email: &str,
        passphrase: &str,
        reason: String,
    ) -> Result<SignedIn, AuthError> {
        if !self.emergency.enabled {
            return Err(AuthError::StoreUnavailable(reason));
        }
        if !self.emergency.admin_emails.iter().any(|e| e == email) {
            return Err(AuthError::StoreUnavailable(reason));
        }
        let matches = self
            .emergency
            .passphrase
            .as_deref()
            .map(|expected| utils::passphrase_matches(expected, passphrase))
            .unwrap_or(false);
        if !matches {
            return Err(AuthError::InvalidCredentials(
                "Invalid email or password".to_string(),
            ));
        }

        tracing::warn!(
            email,
            %reason,
            "EMERGENCY ACCESS granted without identity store verification"
        );

        Ok(SignedIn {
            // Synthetic id: there is no store row to point at.
            user_id: Uuid::nil(),
            email: email.to_string(),
            full_name: None,
            is_admin: true,
            emergency: true,
        })
    }

    /// Local state is authoritative; a failing remote call never blocks
    /// sign-out.
    pub async fn sign_out(&self, email: &str) {
        if let Err(err) = self.store.record_sign_out(email).await {
            tracing::warn!("best-effort sign-out bookkeeping failed: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct UnreachableStore;

    #[async_trait]
    impl IdentityStore for UnreachableStore {
        async fn find_user_by_email(&self, _: &str) -> Result<Option<User>, AuthError> {
            Err(AuthError::StoreUnavailable("connection refused".to_string()))
        }
        async fn find_active_admin(&self, _: &str) -> Result<Option<AdminRecord>, AuthError> {
            Err(AuthError::StoreUnavailable("connection refused".to_string()))
        }
        async fn record_sign_out(&self, _: &str) -> Result<(), AuthError> {
            Err(AuthError::StoreUnavailable("connection refused".to_string()))
        }
    }

    struct HangingStore;

    #[async_trait]
    impl IdentityStore for HangingStore {
        async fn find_user_by_email(&self, _: &str) -> Result<Option<User>, AuthError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(None)
        }
        async fn find_active_admin(&self, _: &str) -> Result<Option<AdminRecord>, AuthError> {
            Ok(None)
        }
        async fn record_sign_out(&self, _: &str) -> Result<(), AuthError> {
            Ok(())
        }
    }

    struct CannedStore {
        user: User,
        admin: bool,
    }

    #[async_trait]
    impl IdentityStore for CannedStore {
        async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
            Ok((email == self.user.email).then(|| self.user.clone()))
        }
        async fn find_active_admin(&self, email: &str) -> Result<Option<AdminRecord>, AuthError> {
            Ok((self.admin && email == self.user.email).then(|| AdminRecord {
                id: Uuid::new_v4(),
                email: email.to_string(),
                full_name: None,
                role: "super_admin".to_string(),
                is_active: true,
            }))
        }
        async fn record_sign_out(&self, _: &str) -> Result<(), AuthError> {
            Ok(())
        }
    }

    fn emergency_cfg(enabled: bool) -> EmergencySettings {
        EmergencySettings {
            enabled,
            admin_emails: vec!["host@chefcast.fm".to_string()],
            passphrase: Some("mise-en-place".to_string()),
        }
    }

    fn canned_store(password: &str, admin: bool) -> CannedStore {
        CannedStore {
            user: User {
                id: Uuid::new_v4(),
                email: "host@chefcast.fm".to_string(),
                full_name: Some("The Host".to_string()),
                password_hash: utils::hash_password(password).unwrap(),
                created_at: chrono::Utc::now(),
            },
            admin,
        }
    }

    #[tokio::test]
    async fn normal_sign_in_resolves_admin_flag() {
        let gate = AuthGate::new(
            canned_store("whisk123", true),
            Duration::from_secs(5),
            emergency_cfg(false),
        );
        let session = gate.sign_in("host@chefcast.fm", "whisk123").await.unwrap();
        assert!(session.is_admin);
        assert!(!session.emergency);
    }

    #[tokio::test]
    async fn missing_allow_list_row_means_not_admin() {
        let gate = AuthGate::new(
            canned_store("whisk123", false),
            Duration::from_secs(5),
            emergency_cfg(false),
        );
        let session = gate.sign_in("host@chefcast.fm", "whisk123").await.unwrap();
        assert!(!session.is_admin);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let gate = AuthGate::new(
            canned_store("whisk123", true),
            Duration::from_secs(5),
            emergency_cfg(true),
        );
        let err = gate.sign_in("host@chefcast.fm", "nope").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials(_)));
    }

    #[tokio::test]
    async fn unreachable_store_falls_back_to_emergency_access() {
        let gate = AuthGate::new(
            UnreachableStore,
            Duration::from_secs(5),
            emergency_cfg(true),
        );
        let session = gate
            .sign_in("host@chefcast.fm", "mise-en-place")
            .await
            .unwrap();
        assert!(session.is_admin);
        assert!(session.emergency, "fallback session must be flagged");
        assert_eq!(session.user_id, Uuid::nil());
    }

    #[tokio::test]
    async fn emergency_access_requires_the_flag() {
        let gate = AuthGate::new(
            UnreachableStore,
            Duration::from_secs(5),
            emergency_cfg(false),
        );
        let err = gate
            .sign_in("host@chefcast.fm", "mise-en-place")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn emergency_access_rejects_unknown_email_and_bad_passphrase() {
        let gate = AuthGate::new(
            UnreachableStore,
            Duration::from_secs(5),
            emergency_cfg(true),
        );
        assert!(gate
            .sign_in("intruder@example.com", "mise-en-place")
            .await
            .is_err());
        assert!(gate.sign_in("host@chefcast.fm", "wrong").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_store_hits_the_bounded_wait() {
        let gate = AuthGate::new(HangingStore, Duration::from_millis(50), emergency_cfg(true));
        let session = gate
            .sign_in("host@chefcast.fm", "mise-en-place")
            .await
            .unwrap();
        assert!(session.emergency);
    }
}
