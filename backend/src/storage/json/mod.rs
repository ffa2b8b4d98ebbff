//! JSON-file storage backend.

pub mod connection;
pub mod key_value_repository;
pub mod remote_repository;

pub use connection::{write_atomic, JsonConnection};
pub use key_value_repository::JsonKeyValueRepository;
pub use remote_repository::DirectoryRemoteStore;
