//! # labrat-documents
//!
//! Text extraction for documents uploaded to the LabRat assistant.
//!
//! Plain text is read directly; PDFs go through `pdftotext` (poppler-utils)
//! and word-processing files through `pandoc`. Every failure surfaces as
//! [`Error::UnreadableDocument`](labrat_core::Error::UnreadableDocument).

pub mod adapters;
pub mod detect;
pub mod registry;

pub use adapters::{OfficeConvertAdapter, PdfTextAdapter, TextNativeAdapter};
pub use detect::detect_kind;
pub use registry::ExtractionRegistry;
