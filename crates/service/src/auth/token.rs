//! Signed access/refresh tokens backed by persisted token rows.

use std::sync::Arc;

use chrono::{Duration, Utc};
use configs::AuthConfig;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use models::enums::TokenType;
use models::{token, user};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::errors::AuthError;
use crate::query::{Predicate, Query};
use crate::repository::{Repository, Store, UnitOfWork};

/// JWT claims. `jti` is the id of the backing token row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub uid: Uuid,
    pub jti: Uuid,
    pub typ: String,
    pub iat: i64,
    pub exp: i64,
}

/// Commit on success, roll back on failure, for flows that speak [`AuthError`].
pub(crate) async fn settle<U: UnitOfWork, T>(uow: U, outcome: Result<T, AuthError>) -> Result<T, AuthError> {
    match outcome {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rb) = uow.rollback().await {
                warn!(error = %rb, "rollback failed");
            }
            Err(err)
        }
    }
}

pub struct TokenService<S: Store> {
    store: Arc<S>,
    cfg: AuthConfig,
}

impl<S: Store> Clone for TokenService<S> {
    fn clone(&self) -> Self {
        Self { store: self.store.clone(), cfg: self.cfg.clone() }
    }
}

impl<S: Store> TokenService<S> {
    pub fn new(store: Arc<S>, cfg: AuthConfig) -> Self {
        Self { store, cfg }
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.cfg.access_token_ttl_secs
    }

    fn ttl(&self, typ: TokenType) -> i64 {
        match typ {
            TokenType::Access => self.cfg.access_token_ttl_secs,
            TokenType::Refresh => self.cfg.refresh_token_ttl_secs,
        }
    }

    fn secret(&self) -> Result<&[u8], AuthError> {
        if self.cfg.jwt_secret.trim().is_empty() {
            return Err(AuthError::TokenError("jwt secret is not configured".into()));
        }
        Ok(self.cfg.jwt_secret.as_bytes())
    }

    /// Persist a token row and sign a JWT pointing at it.
    pub(crate) async fn issue_in<U: Repository>(
        &self,
        repo: &U,
        user: &user::Model,
        typ: TokenType,
    ) -> Result<String, AuthError> {
        let issued_at = Utc::now();
        let expires_at = issued_at + Duration::seconds(self.ttl(typ));
        let row = token::Model {
            id: Uuid::new_v4(),
            user_id: user.id,
            token_type: typ,
            revoked: false,
            expired: false,
            issued_at: issued_at.into(),
            expires_at: expires_at.into(),
        };
        let claims = Claims {
            sub: user.email.clone(),
            uid: user.id,
            jti: row.id,
            typ: typ.as_str().to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        let jwt = encode(&Header::default(), &claims, &EncodingKey::from_secret(self.secret()?))
            .map_err(|e| AuthError::TokenError(e.to_string()))?;
        repo.insert(row).await?;
        Ok(jwt)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id, typ = typ.as_str()))]
    pub async fn issue(&self, user: &user::Model, typ: TokenType) -> Result<String, AuthError> {
        let uow = self.store.begin().await?;
        let outcome = self.issue_in(&uow, user, typ).await;
        settle(uow, outcome).await
    }

    fn decode(&self, jwt: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<Claims>(jwt, &DecodingKey::from_secret(self.secret()?), &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "token_rejected");
                AuthError::Unauthorized
            })
    }

    /// Signature, expiry, type and the backing row's flags all have to hold.
    pub(crate) async fn validate_in<U: Repository>(
        &self,
        repo: &U,
        jwt: &str,
        expected: TokenType,
    ) -> Result<Claims, AuthError> {
        let claims = self.decode(jwt)?;
        if claims.typ != expected.as_str() {
            return Err(AuthError::Unauthorized);
        }
        let row = repo
            .find_by_id::<token::Model>(claims.jti)
            .await?
            .ok_or(AuthError::Unauthorized)?;
        let usable = row.is_live()
            && row.token_type == expected
            && row.user_id == claims.uid
            && row.expires_at.timestamp() > Utc::now().timestamp();
        if !usable {
            debug!(jti = %claims.jti, "token_not_live");
            return Err(AuthError::Unauthorized);
        }
        Ok(claims)
    }

    pub async fn validate(&self, jwt: &str, expected: TokenType) -> Result<Claims, AuthError> {
        let uow = self.store.begin().await?;
        let outcome = self.validate_in(&uow, jwt, expected).await;
        settle(uow, outcome).await
    }

    /// Flag one token revoked and expired. Returns whether it was still live.
    pub(crate) async fn revoke_in<U: Repository>(&self, repo: &U, jti: Uuid) -> Result<bool, AuthError> {
        match repo.find_by_id::<token::Model>(jti).await? {
            Some(row) if row.is_live() => {
                repo.update(token::Model { revoked: true, expired: true, ..row }).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub async fn revoke(&self, jti: Uuid) -> Result<bool, AuthError> {
        let uow = self.store.begin().await?;
        let outcome = self.revoke_in(&uow, jti).await;
        settle(uow, outcome).await
    }

    pub(crate) async fn revoke_all_for_user_in<U: Repository>(&self, repo: &U, user_id: Uuid) -> Result<usize, AuthError> {
        let live = repo
            .find(
                Query::<token::Model>::new()
                    .filter(Predicate::eq(token::Column::UserId, user_id))
                    .filter(Predicate::eq(token::Column::Revoked, false)),
            )
            .await?;
        let count = live.len();
        for row in live {
            repo.update(token::Model { revoked: true, expired: true, ..row }).await?;
        }
        Ok(count)
    }

    #[instrument(skip(self))]
    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<usize, AuthError> {
        let uow = self.store.begin().await?;
        let outcome = self.revoke_all_for_user_in(&uow, user_id).await;
        settle(uow, outcome).await
    }
}

#[cfg(test)]
mod tests {
    use models::enums::UserRole;

    use super::*;
    use crate::audit::now;
    use crate::store::MemoryStore;

    fn config(access_ttl: i64) -> AuthConfig {
        AuthConfig { jwt_secret: "test-secret".into(), access_token_ttl_secs: access_ttl, refresh_token_ttl_secs: 3600 }
    }

    fn seeded() -> Result<(Arc<MemoryStore>, user::Model), AuthError> {
        let store = Arc::new(MemoryStore::new());
        let u = user::Model {
            id: Uuid::new_v4(),
            email: "ops@example.com".into(),
            name: "Ops".into(),
            role: UserRole::Staff,
            status: user::STATUS_ACTIVE.into(),
            created_at: now(),
            updated_at: now(),
        };
        store.seed(&u)?;
        Ok((store, u))
    }

    #[tokio::test]
    async fn fresh_access_token_validates() -> Result<(), AuthError> {
        let (store, u) = seeded()?;
        let tokens = TokenService::new(store, config(900));
        let jwt = tokens.issue(&u, TokenType::Access).await?;
        let claims = tokens.validate(&jwt, TokenType::Access).await?;
        assert_eq!(claims.uid, u.id);
        assert_eq!(claims.sub, "ops@example.com");
        assert!(matches!(tokens.validate(&jwt, TokenType::Refresh).await, Err(AuthError::Unauthorized)));
        Ok(())
    }

    #[tokio::test]
    async fn revoked_token_fails() -> Result<(), AuthError> {
        let (store, u) = seeded()?;
        let tokens = TokenService::new(store, config(900));
        let jwt = tokens.issue(&u, TokenType::Access).await?;
        let claims = tokens.validate(&jwt, TokenType::Access).await?;
        assert!(tokens.revoke(claims.jti).await?);
        assert!(!tokens.revoke(claims.jti).await?);
        assert!(matches!(tokens.validate(&jwt, TokenType::Access).await, Err(AuthError::Unauthorized)));
        Ok(())
    }

    #[tokio::test]
    async fn expired_token_fails() -> Result<(), AuthError> {
        let (store, u) = seeded()?;
        let tokens = TokenService::new(store, config(-120));
        let jwt = tokens.issue(&u, TokenType::Access).await?;
        assert!(matches!(tokens.validate(&jwt, TokenType::Access).await, Err(AuthError::Unauthorized)));
        Ok(())
    }

    #[tokio::test]
    async fn expired_flag_on_row_fails() -> Result<(), AuthError> {
        let (store, u) = seeded()?;
        let tokens = TokenService::new(store.clone(), config(900));
        let jwt = tokens.issue(&u, TokenType::Access).await?;
        let claims = tokens.validate(&jwt, TokenType::Access).await?;
        let row = store.get::<token::Model>(claims.jti).ok_or(AuthError::NotFound)?;
        store.seed(&token::Model { expired: true, ..row })?;
        assert!(matches!(tokens.validate(&jwt, TokenType::Access).await, Err(AuthError::Unauthorized)));
        Ok(())
    }

    #[tokio::test]
    async fn revoke_all_touches_only_live_rows() -> Result<(), AuthError> {
        let (store, u) = seeded()?;
        let tokens = TokenService::new(store, config(900));
        tokens.issue(&u, TokenType::Access).await?;
        tokens.issue(&u, TokenType::Refresh).await?;
        assert_eq!(tokens.revoke_all_for_user(u.id).await?, 2);
        assert_eq!(tokens.revoke_all_for_user(u.id).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn missing_secret_is_a_token_error() -> Result<(), AuthError> {
        let (store, u) = seeded()?;
        let tokens = TokenService::new(store, AuthConfig::default());
        assert!(matches!(tokens.issue(&u, TokenType::Access).await, Err(AuthError::TokenError(_))));
        Ok(())
    }
}
