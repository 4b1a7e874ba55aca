//! UI Components
//!
//! Reusable Leptos components shared by the pages.

pub mod file_upload;
pub mod loading;
pub mod nav;
pub mod results_table;
pub mod toast;

pub use file_upload::FileUpload;
pub use loading::{ErrorNotice, Loading};
pub use nav::Nav;
pub use results_table::ResultsTable;
pub use toast::Toast;
