#![forbid(unsafe_code)]

pub mod documents;
pub mod error;
pub mod json_file;
pub mod lock;

pub use documents::{
    CoordinatorDocument, Document, KnowledgeBaseDocument, RecordsDocument, SCHEMA_VERSION,
};
pub use error::StorageError;
pub use json_file::JsonFile;
pub use lock::FileLock;
