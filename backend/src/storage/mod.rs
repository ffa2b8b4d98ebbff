//! # Storage Module
//!
//! Persistence for RutaKids state.
//!
//! - **traits**: `KeyValueStorage` for the local top-level keys and
//!   `RemoteStore` for the mirrored whole-state snapshot
//! - **json**: JSON-file implementations of both, written atomically
//!
//! The domain layer only sees the traits, so tests can swap in failing or
//! temporary backends.

pub mod json;
pub mod traits;

#[cfg(test)]
pub mod test_utils;

pub use json::{DirectoryRemoteStore, JsonConnection, JsonKeyValueRepository};
pub use traits::{KeyValueStorage, RemoteStore, StorageKey};
