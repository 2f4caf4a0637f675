//! [`Store`](crate::repository::Store) implementations.

pub mod memory;
pub mod seaorm;

pub use memory::MemoryStore;
pub use seaorm::SeaOrmStore;
