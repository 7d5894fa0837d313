pub mod executor;
pub mod repository;

pub use executor::{export_service_tasks, REPORT_CONTENT_TYPE, REPORT_FILE_NAME};
