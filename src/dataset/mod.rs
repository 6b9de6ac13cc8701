pub mod loader;
pub mod types;

pub use loader::{load_dataset, parse_csv, parse_json, DatasetError};
pub use types::{Course, CourseKey};
