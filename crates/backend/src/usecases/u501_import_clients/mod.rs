pub mod classifier;
pub mod executor;
pub mod parser;
pub mod store;

pub use executor::{execute, ImportError, ImportExecutor};
pub use store::{ImportStore, SeaOrmImportStore};
