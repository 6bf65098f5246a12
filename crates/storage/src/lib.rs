#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    FlagKey, FlagRecord, FlagRepository, FlagScope, InMemoryFlags, Storage, StorageError,
};
