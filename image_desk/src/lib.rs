//! Grayscale conversion, file relocation and previews for a small
//! image utility, independent of the shell that drives them.

pub mod error;
pub mod mover;
pub mod plugin_loader;
pub mod preview;
pub mod report;
pub mod session;
pub mod transform;
pub mod validate;

pub use error::{AppError, OperationResult};
