use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use crate::credentials::CredentialStore;
use crate::error::{VectorDbError, VectorDbResult};
use crate::models::{Credentials, NewTenant, TenantContext, TenantRecord, validate_name};
use crate::timeout::bounded;

const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Argon2id hashing of tenant secrets
#[derive(Clone)]
pub struct SecretHasher {
    params: Params,
}

impl SecretHasher {
    pub fn with_params(params: Params) -> Self {
        Self { params }
    }

    /// Minimum Argon2 cost. Only for tests.
    pub fn insecure_fast() -> Self {
        let params = Params::new(
            Params::MIN_M_COST,
            Params::MIN_T_COST,
            Params::MIN_P_COST,
            None,
        )
        .unwrap_or_default();
        Self::with_params(params)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// PHC string for `secret` with a fresh random salt
    pub fn hash(&self, secret: &str) -> VectorDbResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| VectorDbError::Internal(format!("Failed to hash secret: {}", e)))
    }

    /// Cost parameters come from the PHC string, not from `self`
    pub fn verify(&self, secret: &str, hash: &str) -> VectorDbResult<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| VectorDbError::Internal(format!("Invalid stored hash: {}", e)))?;
        Ok(self
            .argon2()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok())
    }

    async fn hash_blocking(&self, secret: String) -> VectorDbResult<String> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&secret))
            .await
            .map_err(|e| VectorDbError::Internal(format!("Hashing task failed: {}", e)))?
    }

    async fn verify_blocking(&self, secret: String, hash: String) -> VectorDbResult<bool> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&secret, &hash))
            .await
            .map_err(|e| VectorDbError::Internal(format!("Verification task failed: {}", e)))?
    }
}

impl Default for SecretHasher {
    fn default() -> Self {
        Self::with_params(Params::default())
    }
}

/// Turns bearer tokens into [`TenantContext`]s and administers tenants.
///
/// The raw token never leaves [`AuthGate::authenticate`]; everything past
/// this point sees either a typed context or an `Unauthorized` error.
pub struct AuthGate<C: CredentialStore> {
    credentials: Arc<C>,
    hasher: SecretHasher,
    root_user: String,
    root_secret_hash: String,
    /// Verified against when the identity is unknown, so both paths pay the
    /// same Argon2 cost
    unknown_identity_hash: String,
    timeout: Duration,
}

impl<C: CredentialStore> AuthGate<C> {
    pub fn new(
        credentials: Arc<C>,
        hasher: SecretHasher,
        root_user: impl Into<String>,
        root_secret: &str,
        timeout: Duration,
    ) -> VectorDbResult<Self> {
        let root_secret_hash = hasher.hash(root_secret)?;
        let unknown_identity_hash = hasher.hash("")?;
        Ok(Self {
            credentials,
            hasher,
            root_user: root_user.into(),
            root_secret_hash,
            unknown_identity_hash,
            timeout,
        })
    }

    pub fn root_user(&self) -> &str {
        &self.root_user
    }

    pub async fn authenticate(&self, token: &str) -> VectorDbResult<TenantContext> {
        let Credentials { identity, secret } = Credentials::parse(token)?;

        let (context, hash) = if identity == self.root_user {
            (
                Some(TenantContext::root(identity)),
                self.root_secret_hash.clone(),
            )
        } else {
            let record = bounded(
                self.timeout,
                "credential lookup",
                self.credentials.find(&identity),
            )
            .await?;
            match record {
                Some(record) => (Some(TenantContext::tenant(identity)), record.secret_hash),
                None => {
                    tracing::debug!(identity = %identity, "Unknown identity");
                    (None, self.unknown_identity_hash.clone())
                }
            }
        };

        let verified = self.hasher.verify_blocking(secret, hash).await?;
        match context {
            Some(context) if verified => {
                tracing::debug!(tenant = %context.namespace(), root = context.is_root(), "Authenticated");
                Ok(context)
            }
            Some(context) => {
                tracing::debug!(tenant = %context.namespace(), "Secret mismatch");
                Err(VectorDbError::Unauthorized(INVALID_CREDENTIALS.to_string()))
            }
            None => Err(VectorDbError::Unauthorized(INVALID_CREDENTIALS.to_string())),
        }
    }

    pub async fn create_tenant(&self, tenant: NewTenant) -> VectorDbResult<()> {
        validate_name("user", &tenant.name)?;
        if tenant.name == self.root_user {
            return Err(VectorDbError::Conflict(format!(
                "user '{}' is reserved",
                tenant.name
            )));
        }
        if tenant.secret.is_empty() {
            return Err(VectorDbError::InvalidArgument(
                "password must not be empty".to_string(),
            ));
        }
        // Header values lose surrounding whitespace, so such a password could never authenticate
        if tenant.secret.trim() != tenant.secret {
            return Err(VectorDbError::InvalidArgument(
                "password must not start or end with whitespace".to_string(),
            ));
        }

        let secret_hash = self.hasher.hash_blocking(tenant.secret).await?;
        let record = TenantRecord {
            name: tenant.name,
            secret_hash,
            pub_key: tenant.pub_key.filter(|key| !key.is_empty()),
            created_at: Utc::now(),
        };

        bounded(self.timeout, "create user", self.credentials.create(record)).await
    }

    pub async fn list_tenants(&self) -> VectorDbResult<Vec<String>> {
        bounded(self.timeout, "list users", self.credentials.list()).await
    }

    /// `NotFound("User not found")` when the tenant does not exist
    pub async fn require_tenant(&self, name: &str) -> VectorDbResult<()> {
        match bounded(self.timeout, "credential lookup", self.credentials.find(name)).await? {
            Some(_) => Ok(()),
            None => Err(VectorDbError::NotFound("User not found".to_string())),
        }
    }

    /// `NotFound("User not found")` when the tenant does not exist
    pub async fn drop_tenant(&self, name: &str) -> VectorDbResult<()> {
        let removed = bounded(self.timeout, "drop user", self.credentials.delete(name)).await?;
        if removed {
            Ok(())
        } else {
            Err(VectorDbError::NotFound("User not found".to_string()))
        }
    }
}
