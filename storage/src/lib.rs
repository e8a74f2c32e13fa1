//! Storage crate: session, message, and user persistence over SQLite.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`models`] – SessionRecord, MessageRecord
//! - [`sqlite_pool`] – SqlitePoolManager
//! - [`user_repo`] – UserRepository (demo-identity upsert)
//! - [`session_repo`] – SessionRepository (owner-scoped CRUD)
//! - [`message_repo`] – MessageRepository (append-only log per session)

mod error;
mod message_repo;
mod models;
mod session_repo;
mod sqlite_pool;
mod user_repo;

#[cfg(test)]
mod session_repo_test;

pub use error::StorageError;
pub use message_repo::MessageRepository;
pub use models::{MessageRecord, SessionRecord};
pub use session_repo::SessionRepository;
pub use sqlite_pool::SqlitePoolManager;
pub use user_repo::UserRepository;
