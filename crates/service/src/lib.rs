//! Service layer owning the squirrel collection.
//! - `storage` holds the generic whole-file JSON persistence.
//! - `squirrels` holds the record types, the store trait and its file-backed implementation.

pub mod errors;
pub mod storage;
pub mod squirrels;
