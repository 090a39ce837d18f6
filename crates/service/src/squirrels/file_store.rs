use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::ServiceError;
use crate::squirrels::domain::{Squirrel, SquirrelInput};
use crate::squirrels::repository::SquirrelStore;
use crate::storage::json_list_store::JsonListStore;

/// File storage: the whole squirrel list persisted as one JSON array.
pub struct FileSquirrelStore {
    store: JsonListStore<Squirrel>,
}

/// First id that appears more than once, if any.
fn repeated_id(records: &[Squirrel]) -> Option<u64> {
    let mut seen = HashSet::with_capacity(records.len());
    records.iter().map(|s| s.id).find(|id| !seen.insert(*id))
}

/// `max(id) + 1`, or 1 for an empty collection.
fn next_id(records: &[Squirrel]) -> Result<u64, ServiceError> {
    let max = records.iter().map(|s| s.id).max().unwrap_or(0);
    max.checked_add(1)
        .ok_or_else(|| ServiceError::Storage(format!("no id left after {max}")))
}

impl FileSquirrelStore {
    /// Open the backing file, creating an empty one if it does not exist.
    /// A corrupt file, or one with repeated ids, is returned as an error so the
    /// caller can refuse to start.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let store = JsonListStore::<Squirrel>::open(path).await?;
        if let Some(id) = store.with(repeated_id).await {
            return Err(ServiceError::Storage(format!(
                "{} holds id {id} more than once",
                store.path().display()
            )));
        }
        info!(path = %store.path().display(), "squirrel store ready");
        Ok(Arc::new(Self { store }))
    }

    /// Read every record straight from the backing file.
    pub async fn load(&self) -> Result<Vec<Squirrel>, ServiceError> {
        let records = self.store.load().await?;
        if let Some(id) = repeated_id(&records) {
            return Err(ServiceError::Storage(format!("backing file holds id {id} more than once")));
        }
        Ok(records)
    }

    /// Replace the whole collection and persist it. Ids must be unique.
    pub async fn save(&self, records: Vec<Squirrel>) -> Result<(), ServiceError> {
        if let Some(id) = repeated_id(&records) {
            return Err(ServiceError::Validation(format!("id {id} appears more than once")));
        }
        self.store.save(records).await
    }

    pub async fn list(&self) -> Vec<Squirrel> {
        self.store.snapshot().await
    }

    pub async fn get(&self, id: u64) -> Option<Squirrel> {
        self.store.with(|all| all.iter().find(|s| s.id == id).cloned()).await
    }

    pub async fn create(&self, input: SquirrelInput) -> Result<Squirrel, ServiceError> {
        let created = self
            .store
            .append_with(move |all| {
                Ok(Squirrel { id: next_id(all)?, name: input.name, size: input.size })
            })
            .await?;
        info!(id = created.id, "squirrel created");
        Ok(created)
    }

    pub async fn update(&self, id: u64, input: SquirrelInput) -> Result<Option<Squirrel>, ServiceError> {
        let updated = self
            .store
            .mutate(move |all| {
                let existing = all.iter_mut().find(|s| s.id == id)?;
                existing.name = input.name;
                existing.size = input.size;
                Some(existing.clone())
            })
            .await?;
        match &updated {
            Some(_) => info!(id, "squirrel updated"),
            None => debug!(id, "update skipped; no such squirrel"),
        }
        Ok(updated)
    }

    pub async fn delete(&self, id: u64) -> Result<Option<Squirrel>, ServiceError> {
        let removed = self
            .store
            .mutate(move |all| {
                let pos = all.iter().position(|s| s.id == id)?;
                Some(all.remove(pos))
            })
            .await?;
        match &removed {
            Some(_) => info!(id, "squirrel deleted"),
            None => debug!(id, "delete skipped; no such squirrel"),
        }
        Ok(removed)
    }
}

#[async_trait::async_trait]
impl SquirrelStore for FileSquirrelStore {
    async fn list(&self) -> Vec<Squirrel> { self.list().await }
    async fn get(&self, id: u64) -> Option<Squirrel> { self.get(id).await }
    async fn create(&self, input: SquirrelInput) -> Result<Squirrel, ServiceError> { self.create(input).await }
    async fn update(&self, id: u64, input: SquirrelInput) -> Result<Option<Squirrel>, ServiceError> { self.update(id, input).await }
    async fn delete(&self, id: u64) -> Result<Option<Squirrel>, ServiceError> { self.delete(id).await }
}
