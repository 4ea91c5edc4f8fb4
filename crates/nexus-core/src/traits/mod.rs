//! Core traits for talking to a repository manager.

mod repository;
mod upload;

pub use repository::{Repository, paginate};
pub use upload::{UploadProperties, UploadReceipt, UploadRequest};
