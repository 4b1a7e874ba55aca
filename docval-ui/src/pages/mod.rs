//! Pages
//!
//! One top-level component per UI route.

pub mod document_detail;
pub mod documents;
pub mod not_found;
pub mod projects;
pub mod upload_detail;

pub use document_detail::DocumentDetail;
pub use documents::Documents;
pub use not_found::NotFound;
pub use projects::Projects;
pub use upload_detail::UploadDetail;
