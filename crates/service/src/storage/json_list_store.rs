use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{de::DeserializeOwned, Serialize};
use tokio::{fs, sync::Mutex};
use tracing::{debug, error};

use crate::errors::ServiceError;

/// Generic JSON file-backed list store.
///
/// Holds an ordered `Vec<T>` in memory and rewrites the whole backing file
/// after every change. All mutations run under one lock that also covers the
/// write to disk, so a change and its persistence are a single unit.
pub struct JsonListStore<T> {
    inner: Arc<Mutex<Vec<T>>>,
    file_path: PathBuf,
}

/// What a commit closure did to the collection.
enum Outcome<R> {
    Changed(R),
    Unchanged(R),
}

impl<T> JsonListStore<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Open the store at `path`. A missing file is created holding an empty
    /// list; an unreadable or corrupt file is an error.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Self, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let records = match read_file::<T>(&file_path).await? {
            Some(records) => records,
            None => {
                write_file::<T>(&file_path, &[]).await?;
                Vec::new()
            }
        };
        debug!(path = %file_path.display(), count = records.len(), "json list store opened");

        Ok(Self { inner: Arc::new(Mutex::new(records)), file_path })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Read the backing file. Returns an empty list if it does not exist yet.
    pub async fn load(&self) -> Result<Vec<T>, ServiceError> {
        Ok(read_file(&self.file_path).await?.unwrap_or_default())
    }

    /// Replace the whole collection with `records` and persist it.
    pub async fn save(&self, records: Vec<T>) -> Result<(), ServiceError> {
        self.commit(move |all| {
            *all = records;
            Ok(Outcome::Changed(()))
        })
        .await
    }

    /// Clone of the current collection, in stored order.
    pub async fn snapshot(&self) -> Vec<T> {
        self.inner.lock().await.clone()
    }

    /// Run a read-only closure against the collection.
    pub async fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&[T]) -> R,
    {
        let guard = self.inner.lock().await;
        f(guard.as_slice())
    }

    /// Apply a mutation and persist the result.
    ///
    /// `f` returns `None` when it changed nothing; no write happens then.
    pub async fn mutate<R, F>(&self, f: F) -> Result<Option<R>, ServiceError>
    where
        F: FnOnce(&mut Vec<T>) -> Option<R> + Send + 'static,
        R: Send + 'static,
    {
        self.commit(move |all| {
            Ok(match f(all) {
                Some(out) => Outcome::Changed(Some(out)),
                None => Outcome::Unchanged(None),
            })
        })
        .await
    }

    /// Build one new item from the current collection, append it and persist.
    /// An error from `make` leaves the collection untouched.
    pub async fn append_with<F>(&self, make: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&[T]) -> Result<T, ServiceError> + Send + 'static,
    {
        self.commit(move |all| {
            let item = make(all.as_slice())?;
            all.push(item.clone());
            Ok(Outcome::Changed(item))
        })
        .await
    }

    /// Run `f` on a copy of the collection; a changed copy is written to disk
    /// and only then swapped in. The work runs as its own task, so dropping
    /// the caller's future never leaves memory and disk apart.
    async fn commit<R, F>(&self, f: F) -> Result<R, ServiceError>
    where
        F: FnOnce(&mut Vec<T>) -> Result<Outcome<R>, ServiceError> + Send + 'static,
        R: Send + 'static,
    {
        let task = tokio::spawn(apply(Arc::clone(&self.inner), self.file_path.clone(), f));
        task.await
            .map_err(|e| ServiceError::Storage(format!("store task failed: {e}")))?
    }
}

async fn apply<T, R, F>(inner: Arc<Mutex<Vec<T>>>, file_path: PathBuf, f: F) -> Result<R, ServiceError>
where
    T: Serialize + Clone,
    F: FnOnce(&mut Vec<T>) -> Result<Outcome<R>, ServiceError>,
{
    let mut guard = inner.lock().await;
    let mut next = guard.clone();
    match f(&mut next)? {
        Outcome::Unchanged(out) => Ok(out),
        Outcome::Changed(out) => {
            if let Err(e) = write_file(&file_path, next.as_slice()).await {
                error!(path = %file_path.display(), error = %e, "persisting collection failed; collection unchanged");
                return Err(e);
            }
            *guard = next;
            Ok(out)
        }
    }
}

async fn read_file<T: DeserializeOwned>(path: &Path) -> Result<Option<Vec<T>>, ServiceError> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Write to a sibling temp file, then rename it over `path`.
async fn write_file<T: Serialize>(path: &Path, records: &[T]) -> Result<(), ServiceError> {
    let data = serde_json::to_vec_pretty(records)?;
    let tmp = temp_path(path);
    fs::write(&tmp, data).await?;
    fs::rename(&tmp, path).await?;
    debug!(path = %path.display(), count = records.len(), "collection saved");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_file(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("json_list_store_{}_{}.json", tag, uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn open_creates_empty_file_when_missing() -> Result<(), anyhow::Error> {
        let tmp = tmp_file("missing");
        let store = JsonListStore::<String>::open(&tmp).await?;

        assert!(store.snapshot().await.is_empty());
        let on_disk = tokio::fs::read_to_string(&tmp).await?;
        assert_eq!(serde_json::from_str::<Vec<String>>(&on_disk)?, Vec::<String>::new());

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn save_then_load_preserves_order() -> Result<(), anyhow::Error> {
        let tmp = tmp_file("roundtrip");
        let store = JsonListStore::<String>::open(&tmp).await?;

        let records = vec!["c".to_string(), "a".to_string(), "b".to_string()];
        store.save(records.clone()).await?;
        assert_eq!(store.load().await?, records);
        assert_eq!(store.snapshot().await, records);

        let reopened = JsonListStore::<String>::open(&tmp).await?;
        assert_eq!(reopened.snapshot().await, records);
        assert!(!temp_path(&tmp).exists());

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn load_of_missing_file_is_empty() -> Result<(), anyhow::Error> {
        let tmp = tmp_file("vanished");
        let store = JsonListStore::<String>::open(&tmp).await?;
        tokio::fs::remove_file(&tmp).await?;

        assert!(store.load().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_file_fails_to_open() -> Result<(), anyhow::Error> {
        let tmp = tmp_file("corrupt");
        tokio::fs::write(&tmp, b"{not json").await?;

        let res = JsonListStore::<String>::open(&tmp).await;
        assert!(matches!(res, Err(ServiceError::Storage(_))));

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn unchanged_mutation_does_not_write() -> Result<(), anyhow::Error> {
        let tmp = tmp_file("nowrite");
        let store = JsonListStore::<String>::open(&tmp).await?;
        tokio::fs::remove_file(&tmp).await?;

        let out: Option<()> = store.mutate(|_| None).await?;
        assert!(out.is_none());
        assert!(!tmp.exists());

        store.mutate(|v| { v.push("x".into()); Some(()) }).await?;
        assert!(tmp.exists());

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn failed_append_leaves_collection_alone() -> Result<(), anyhow::Error> {
        let tmp = tmp_file("append");
        let store = JsonListStore::<String>::open(&tmp).await?;

        let added = store.append_with(|all| Ok(format!("item{}", all.len()))).await?;
        assert_eq!(added, "item0");

        let res = store
            .append_with(|_| Err(ServiceError::Storage("refused".into())))
            .await;
        assert!(matches!(res, Err(ServiceError::Storage(_))));
        assert_eq!(store.snapshot().await, vec!["item0".to_string()]);
        assert_eq!(store.load().await?, vec!["item0".to_string()]);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn failed_write_leaves_collection_unchanged() -> Result<(), anyhow::Error> {
        let dir = std::env::temp_dir().join(format!("json_list_store_dir_{}", uuid::Uuid::new_v4()));
        let tmp = dir.join("items.json");
        let store = JsonListStore::<String>::open(&tmp).await?;
        store.mutate(|v| { v.push("kept".into()); Some(()) }).await?;

        // Replace the directory with a plain file so the next write cannot land.
        tokio::fs::remove_dir_all(&dir).await?;
        tokio::fs::write(&dir, b"").await?;

        let res = store.mutate(|v| { v.push("lost".into()); Some(()) }).await;
        assert!(matches!(res, Err(ServiceError::Storage(_))));
        assert_eq!(store.snapshot().await, vec!["kept".to_string()]);

        let res = store.save(vec!["lost".into()]).await;
        assert!(matches!(res, Err(ServiceError::Storage(_))));
        assert_eq!(store.snapshot().await, vec!["kept".to_string()]);

        let _ = tokio::fs::remove_file(&dir).await;
        Ok(())
    }
}
