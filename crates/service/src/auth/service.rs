use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use configs::AuthConfig;
use models::enums::{AuditAction, TokenType, UserRole};
use models::{user, user_credentials, Record};
use rand::rngs::OsRng;
use tracing::{debug, info, instrument};
use uuid::Uuid;
use validator::Validate;

use super::domain::{AuthSession, AuthUser, LoginInput, RegisterInput};
use super::errors::AuthError;
use super::token::{settle, Claims, TokenService};
use crate::audit::{now, record_event, Actor};
use crate::mail::{dispatch, Mailer};
use crate::query::{Predicate, Query};
use crate::repository::{Repository, Store};

pub const PASSWORD_ALGORITHM: &str = "argon2";

/// Auth business service independent of web framework
pub struct AuthService<S: Store> {
    store: Arc<S>,
    tokens: TokenService<S>,
    mailer: Option<Arc<dyn Mailer>>,
}

impl<S: Store> Clone for AuthService<S> {
    fn clone(&self) -> Self {
        Self { store: self.store.clone(), tokens: self.tokens.clone(), mailer: self.mailer.clone() }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn find_user<U: Repository>(repo: &U, email: &str) -> Result<Option<user::Model>, AuthError> {
    Ok(repo
        .find_first(Query::<user::Model>::new().filter(Predicate::eq(user::Column::Email, email.to_string())))
        .await?)
}

impl<S: Store> AuthService<S> {
    pub fn new(store: Arc<S>, cfg: AuthConfig) -> Self {
        let tokens = TokenService::new(store.clone(), cfg);
        Self { store, tokens, mailer: None }
    }

    /// Send a welcome mail after registration.
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn tokens(&self) -> &TokenService<S> {
        &self.tokens
    }

    /// Register a new user with a hashed password.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthUser, AuthError> {
        input.validate()?;
        let email = normalize_email(&input.email);

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(input.password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        let uow = self.store.begin().await?;
        let outcome: Result<_, AuthError> = async {
            if let Some(existing) = find_user(&uow, &email).await? {
                debug!("user exists: {}", existing.email);
                return Err(AuthError::Conflict);
            }
            let stamp = now();
            let user = uow
                .insert(user::Model {
                    id: Uuid::new_v4(),
                    email: email.clone(),
                    name: input.name.trim().to_string(),
                    role: input.role.unwrap_or(UserRole::Staff),
                    status: user::STATUS_ACTIVE.to_string(),
                    created_at: stamp,
                    updated_at: stamp,
                })
                .await?;
            uow.insert(user_credentials::Model {
                id: Uuid::new_v4(),
                user_id: user.id,
                password_hash: hash,
                password_algorithm: PASSWORD_ALGORITHM.to_string(),
                created_at: stamp,
                updated_at: stamp,
            })
            .await?;
            let actor = Actor::user(user.id, user.email.clone());
            record_event(&uow, &actor, AuditAction::Create, user::Model::NAME, Some(user.id), None).await?;
            Ok(user)
        }
        .await;
        let user = settle(uow, outcome).await?;
        info!(user_id = %user.id, email = %user.email, "user_registered");

        if let Some(mailer) = &self.mailer {
            dispatch(
                mailer.clone(),
                user.email.clone(),
                "Welcome".into(),
                format!("Hello {}, your account is ready.", user.name),
            );
        }
        Ok(user.into())
    }

    /// Check credentials, revoke every earlier token of the user and issue a
    /// fresh access/refresh pair.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let email = normalize_email(&input.email);
        let uow = self.store.begin().await?;
        let outcome: Result<_, AuthError> = async {
            let user = find_user(&uow, &email).await?.ok_or(AuthError::Unauthorized)?;
            if user.status != user::STATUS_ACTIVE {
                return Err(AuthError::Unauthorized);
            }
            let cred = uow
                .find_first(
                    Query::<user_credentials::Model>::new()
                        .filter(Predicate::eq(user_credentials::Column::UserId, user.id)),
                )
                .await?
                .ok_or(AuthError::Unauthorized)?;

            let parsed = PasswordHash::new(&cred.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
            if Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_err() {
                return Err(AuthError::Unauthorized);
            }

            let revoked = self.tokens.revoke_all_for_user_in(&uow, user.id).await?;
            let access_token = self.tokens.issue_in(&uow, &user, TokenType::Access).await?;
            let refresh_token = self.tokens.issue_in(&uow, &user, TokenType::Refresh).await?;
            let actor = Actor::user(user.id, user.email.clone());
            record_event(&uow, &actor, AuditAction::Login, user::Model::NAME, Some(user.id), None).await?;
            debug!(revoked, "previous tokens revoked");
            Ok(AuthSession {
                user: user.into(),
                access_token,
                refresh_token,
                expires_in: self.tokens.access_ttl_secs(),
            })
        }
        .await;
        let session = settle(uow, outcome).await?;
        info!(user_id = %session.user.id, "user_logged_in");
        Ok(session)
    }

    /// New access token for a live refresh token. The refresh token stays valid.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let uow = self.store.begin().await?;
        let outcome: Result<_, AuthError> = async {
            let claims = self.tokens.validate_in(&uow, refresh_token, TokenType::Refresh).await?;
            let user = uow
                .find_by_id::<user::Model>(claims.uid)
                .await?
                .ok_or(AuthError::Unauthorized)?;
            let access_token = self.tokens.issue_in(&uow, &user, TokenType::Access).await?;
            Ok(AuthSession {
                user: user.into(),
                access_token,
                refresh_token: refresh_token.to_string(),
                expires_in: self.tokens.access_ttl_secs(),
            })
        }
        .await;
        settle(uow, outcome).await
    }

    /// Revoke the presented access token.
    #[instrument(skip_all)]
    pub async fn logout(&self, access_token: &str) -> Result<(), AuthError> {
        let uow = self.store.begin().await?;
        let outcome: Result<_, AuthError> = async {
            let claims = self.tokens.validate_in(&uow, access_token, TokenType::Access).await?;
            self.tokens.revoke_in(&uow, claims.jti).await?;
            let actor = Actor::user(claims.uid, claims.sub.clone());
            record_event(&uow, &actor, AuditAction::Logout, user::Model::NAME, Some(claims.uid), None).await?;
            Ok(claims)
        }
        .await;
        let claims = settle(uow, outcome).await?;
        info!(user_id = %claims.uid, "user_logged_out");
        Ok(())
    }

    /// Resolve a bearer access token to its user.
    pub async fn authenticate(&self, access_token: &str) -> Result<(AuthUser, Claims), AuthError> {
        let uow = self.store.begin().await?;
        let outcome: Result<_, AuthError> = async {
            let claims = self.tokens.validate_in(&uow, access_token, TokenType::Access).await?;
            let user = uow
                .find_by_id::<user::Model>(claims.uid)
                .await?
                .ok_or(AuthError::Unauthorized)?;
            Ok((AuthUser::from(user), claims))
        }
        .await;
        settle(uow, outcome).await
    }
}

#[cfg(test)]
mod tests {
    use models::event_log;

    use super::*;
    use crate::audit::AuditService;
    use crate::mail::OutboxMailer;
    use crate::store::MemoryStore;

    fn config() -> AuthConfig {
        AuthConfig { jwt_secret: "test-secret".into(), access_token_ttl_secs: 900, refresh_token_ttl_secs: 86_400 }
    }

    fn register_input(email: &str) -> RegisterInput {
        RegisterInput { email: email.into(), name: "Test".into(), password: "Secret123".into(), role: None }
    }

    fn login_input(email: &str, password: &str) -> LoginInput {
        LoginInput { email: email.into(), password: password.into() }
    }

    #[tokio::test]
    async fn register_and_login() -> Result<(), AuthError> {
        let store = Arc::new(MemoryStore::new());
        let svc = AuthService::new(store.clone(), config());
        let user = svc.register(register_input("User@Example.com")).await?;
        assert_eq!(user.email, "user@example.com");
        assert_eq!(user.role, UserRole::Staff);

        let session = svc.login(login_input("user@example.com", "Secret123")).await?;
        assert_eq!(session.user.id, user.id);
        assert_eq!(session.expires_in, 900);
        let (me, _) = svc.authenticate(&session.access_token).await?;
        assert_eq!(me, user);
        assert!(svc.authenticate(&session.refresh_token).await.is_err());

        let logins = AuditService::new(store.clone()).find_by_action(AuditAction::Login).await?;
        assert_eq!(logins.len(), 1);
        assert_eq!(store.len::<event_log::Model>(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_and_weak_registrations_fail() -> Result<(), AuthError> {
        let svc = AuthService::new(Arc::new(MemoryStore::new()), config());
        svc.register(register_input("a@example.com")).await?;
        assert!(matches!(svc.register(register_input("A@example.com")).await, Err(AuthError::Conflict)));

        let mut weak = register_input("b@example.com");
        weak.password = "short".into();
        assert!(matches!(svc.register(weak).await, Err(AuthError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() -> Result<(), AuthError> {
        let svc = AuthService::new(Arc::new(MemoryStore::new()), config());
        svc.register(register_input("a@example.com")).await?;
        let err = svc.login(login_input("a@example.com", "nope-nope")).await.unwrap_err();
        assert_eq!(err.code(), 1004);
        assert!(matches!(svc.login(login_input("ghost@example.com", "Secret123")).await, Err(AuthError::Unauthorized)));
        Ok(())
    }

    #[tokio::test]
    async fn second_login_revokes_first_session() -> Result<(), AuthError> {
        let svc = AuthService::new(Arc::new(MemoryStore::new()), config());
        svc.register(register_input("a@example.com")).await?;
        let first = svc.login(login_input("a@example.com", "Secret123")).await?;
        let second = svc.login(login_input("a@example.com", "Secret123")).await?;
        assert!(svc.authenticate(&first.access_token).await.is_err());
        assert!(svc.refresh(&first.refresh_token).await.is_err());
        svc.authenticate(&second.access_token).await?;
        Ok(())
    }

    #[tokio::test]
    async fn refresh_then_logout() -> Result<(), AuthError> {
        let svc = AuthService::new(Arc::new(MemoryStore::new()), config());
        svc.register(register_input("a@example.com")).await?;
        let session = svc.login(login_input("a@example.com", "Secret123")).await?;

        let renewed = svc.refresh(&session.refresh_token).await?;
        assert_ne!(renewed.access_token, session.access_token);
        svc.logout(&renewed.access_token).await?;
        assert!(svc.authenticate(&renewed.access_token).await.is_err());
        assert!(svc.logout(&renewed.access_token).await.is_err());
        svc.authenticate(&session.access_token).await?;
        Ok(())
    }

    #[tokio::test]
    async fn registration_sends_welcome_mail() -> Result<(), AuthError> {
        let outbox = OutboxMailer::new();
        let svc = AuthService::new(Arc::new(MemoryStore::new()), config()).with_mailer(Arc::new(outbox.clone()));
        svc.register(register_input("new@example.com")).await?;
        for _ in 0..100 {
            if !outbox.sent().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        let sent = outbox.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "new@example.com");
        Ok(())
    }
}
