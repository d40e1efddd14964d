pub mod config;
pub mod contracts;
pub mod error;
pub mod extractors;
pub mod storage;

pub use error::{ValidationErrorResponse, ValidationRejection};
pub use extractors::{Contract, Validated};
pub use storage::{push_criteria, PostgresDialect, StorageError};
