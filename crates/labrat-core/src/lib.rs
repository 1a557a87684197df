//! # labrat-core
//!
//! Core types, traits, and abstractions for the LabRat assistant.
//!
//! This crate provides the request-scoped data model, the error taxonomy,
//! and the trait seams (inference backends, document extraction) that the
//! other LabRat crates depend on.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
