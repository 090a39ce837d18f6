use async_trait::async_trait;

use crate::errors::ServiceError;
use crate::squirrels::domain::{Squirrel, SquirrelInput};

/// Trait abstraction over squirrel storage.
///
/// Lookups that find nothing return `None`; only I/O and codec failures are errors.
#[async_trait]
pub trait SquirrelStore: Send + Sync {
    async fn list(&self) -> Vec<Squirrel>;
    async fn get(&self, id: u64) -> Option<Squirrel>;
    async fn create(&self, input: SquirrelInput) -> Result<Squirrel, ServiceError>;
    async fn update(&self, id: u64, input: SquirrelInput) -> Result<Option<Squirrel>, ServiceError>;
    async fn delete(&self, id: u64) -> Result<Option<Squirrel>, ServiceError>;
}
