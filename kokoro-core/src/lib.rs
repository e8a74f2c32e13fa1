//! Core crate: shared domain types, error taxonomy, and logging setup.
//!
//! ## Modules
//!
//! - [`error`] – [`KokoroError`] and the crate-wide `Result` alias
//! - [`logger`] – tracing subscriber initialization (console + optional file)
//! - [`types`] – [`SessionCategory`] and [`MessageRole`] domain enums

pub mod error;
pub mod logger;
pub mod types;

pub use error::{KokoroError, Result};
pub use logger::init_tracing;
pub use types::{MessageRole, SessionCategory};
