use std::sync::Arc;

use configs::AuthConfig;
use service::auth::AuthService;
use service::mail::Mailer;
use service::{AuditService, CrudService, Resource, Store};

/// Shared handler state. Generic over the store so tests can run on the
/// in-memory store and production on Postgres.
pub struct AppState<S: Store> {
    pub store: Arc<S>,
    pub auth: AuthService<S>,
    pub audit: AuditService<S>,
    pub mailer: Arc<dyn Mailer>,
}

impl<S: Store> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            auth: self.auth.clone(),
            audit: self.audit.clone(),
            mailer: self.mailer.clone(),
        }
    }
}

impl<S: Store> AppState<S> {
    pub fn new(store: Arc<S>, auth: AuthConfig, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            auth: AuthService::new(store.clone(), auth).with_mailer(mailer.clone()),
            audit: AuditService::new(store.clone()),
            store,
            mailer,
        }
    }

    pub fn service<R: Resource>(&self) -> CrudService<R, S> {
        CrudService::new(self.store.clone())
    }
}
