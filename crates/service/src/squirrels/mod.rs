//! Squirrel records and the store that owns them.

pub mod domain;
pub mod repository;
pub mod file_store;

pub use domain::{Squirrel, SquirrelInput, SquirrelPayload};
pub use file_store::FileSquirrelStore;
pub use repository::SquirrelStore;
