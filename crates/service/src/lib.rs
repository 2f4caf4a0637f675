//! Service layer providing business-oriented CRUD operations on top of models.
//! - One generic CRUD service ([`crud::CrudService`]) parameterised by a
//!   [`crud::Resource`] per entity.
//! - Storage behind [`repository::Store`]: SeaORM for Postgres, an in-memory
//!   store for tests and local runs.
//! - Audit trail, auth, mail and report rendering alongside.

pub mod errors;
pub mod validation;
pub mod query;
pub mod repository;
pub mod store;
pub mod audit;
pub mod crud;
pub mod resources;
pub mod auth;
pub mod mail;
pub mod report;
#[cfg(test)]
pub mod test_support;

pub use audit::{Actor, AuditService};
pub use crud::{CrudService, Resource};
pub use errors::ServiceError;
pub use repository::{Repository, Store, UnitOfWork};
pub use store::{MemoryStore, SeaOrmStore};
