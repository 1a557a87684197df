//! HTTP handlers for the LabRat API.

pub mod health;
pub mod labrat;
pub mod notebook;
pub mod upload;

pub use health::health_check;
pub use labrat::labrat;
pub use notebook::create_notebook;
pub use upload::upload;
