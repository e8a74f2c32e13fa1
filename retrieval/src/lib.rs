//! Retrieval-augmented generation building blocks.
//!
//! ## Modules
//!
//! - [`retriever`] – [`KnowledgeRetriever`]: embed the query, match with
//!   graduated threshold fallback
//! - [`composer`] – format matches into a context block and splice it into
//!   the conversation
//! - [`guide`] – keyword-scoring state guide for the system instruction

pub mod composer;
pub mod guide;
pub mod retriever;

pub use composer::{compose, inject};
pub use guide::build_guide;
pub use retriever::{KnowledgeRetriever, RetrieveOptions};
