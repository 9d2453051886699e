use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::Result;

/// How records are laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    /// `[ {...}, ... ]`
    Bare,
    /// `{ "<key>": [ {...}, ... ] }`
    Keyed,
}

/// A JSON file holding one list of records.
///
/// Both shapes are accepted on read; writes use the document's own shape.
/// Items this build cannot read are carried through every write.
/// Writes replace the whole file with no locking, so two writers racing on
/// the same document end with the last one's content.
#[derive(Debug, Clone)]
pub(crate) struct JsonDocument {
    path: PathBuf,
    key: &'static str,
    shape: Shape,
}

impl JsonDocument {
    pub fn bare(path: PathBuf, key: &'static str) -> Self {
        Self {
            path,
            key,
            shape: Shape::Bare,
        }
    }

    pub fn keyed(path: PathBuf, key: &'static str) -> Self {
        Self {
            path,
            key,
            shape: Shape::Keyed,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw items of the document, in either shape. A missing, unreadable or
    /// malformed file yields nothing.
    async fn read_items(&self) -> Vec<Value> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Document does not exist yet");
                return Vec::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), "Error loading {}: {}", self.key, e);
                return Vec::new();
            }
        };

        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %self.path.display(), "Malformed {} document: {}", self.key, e);
                return Vec::new();
            }
        };

        match value {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove(self.key) {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    /// Items on disk that do not read as `T`.
    async fn unreadable<T: DeserializeOwned>(&self) -> Vec<Value> {
        self.read_items()
            .await
            .into_iter()
            .filter(|item| <T as serde::Deserialize>::deserialize(item).is_err())
            .collect()
    }

    /// Read every record. Items that do not read as `T` are left out here but
    /// stay on disk: [`JsonDocument::save`] writes them back untouched.
    pub async fn load<T: DeserializeOwned>(&self) -> Vec<T> {
        let items = self.read_items().await;
        let total = items.len();
        let records: Vec<T> = items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(path = %self.path.display(), "Unreadable {} record kept as is: {}", self.key, e);
                    None
                }
            })
            .collect();

        debug!(
            path = %self.path.display(),
            "Loaded {}/{} {} records",
            records.len(),
            total,
            self.key
        );
        records
    }

    /// Highest numeric `id` among unreadable items, so new ids never reuse one.
    pub async fn unreadable_max_id<T: DeserializeOwned>(&self) -> u64 {
        self.unreadable::<T>()
            .await
            .iter()
            .filter_map(|item| item.get("id").and_then(Value::as_u64))
            .max()
            .unwrap_or(0)
    }

    /// Rewrite the whole document with `records`, followed by any items
    /// currently on disk that do not read as `T`.
    pub async fn save<T: Serialize + DeserializeOwned>(&self, records: &[T]) -> Result<()> {
        let kept = self.unreadable::<T>().await;
        if !kept.is_empty() {
            warn!(path = %self.path.display(), "Keeping {} unreadable {} records", kept.len(), self.key);
        }

        let mut items = Vec::with_capacity(records.len() + kept.len());
        for record in records {
            items.push(serde_json::to_value(record)?);
        }
        items.extend(kept);

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let body = match self.shape {
            Shape::Bare => serde_json::to_vec_pretty(&items)?,
            Shape::Keyed => {
                let mut map = serde_json::Map::new();
                map.insert(self.key.to_string(), Value::Array(items));
                serde_json::to_vec_pretty(&Value::Object(map))?
            }
        };

        tokio::fs::write(&self.path, body).await?;
        debug!(path = %self.path.display(), "Saved {} {} records", records.len(), self.key);
        Ok(())
    }

    /// Write an empty document unless one already exists.
    pub async fn provision(&self) -> Result<()> {
        if tokio::fs::try_exists(&self.path).await? {
            return Ok(());
        }
        self.save::<Value>(&[]).await
    }

    pub async fn remove(&self) -> Result<bool> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
