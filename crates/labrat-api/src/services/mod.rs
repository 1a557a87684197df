//! Service layer between HTTP handlers and the inference pipeline.

pub mod assistant;

pub use assistant::{Assistant, BackendHealth, DrawingRequest, UploadedFile};
