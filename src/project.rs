//! Project (cart) of plants kept by the user
//!
//! The project is a JSON list of [`Plant`] snapshots stored under a single key
//! of an injected [`KeyValueStore`]. Entries are unique by catalog code.
//!
//! Stores:
//! - [`MemoryStore`]: no persistence, for tests
//! - [`FileStore`]: one JSON file per key inside a data directory

use rustc_hash::FxHashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::aggregation::{project_summary, ProjectSummary};
use crate::error::{StoreError, StoreResult};
use crate::plant::Plant;

/// Key the project list is stored under
pub const PROJECT_KEY: &str = "project";

// ============================================================================
// Key-Value Stores
// ============================================================================

/// Minimal string key-value persistence
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> StoreResult<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set(key, value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: FxHashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Stores each key as `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Written to a temporary file first, then renamed over the target
    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

// ============================================================================
// Project
// ============================================================================

pub struct Project<S> {
    store: S,
}

impl<S: KeyValueStore> Project<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current entries, in insertion order.
    ///
    /// A stored value that is not a valid plant list is logged and read as empty.
    pub fn plants(&self) -> StoreResult<Vec<Plant>> {
        let Some(raw) = self.store.get(PROJECT_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<Plant>>(&raw) {
            Ok(plants) => Ok(plants),
            Err(e) => {
                tracing::warn!("Ignoring unreadable project list: {}", e);
                Ok(Vec::new())
            }
        }
    }

    fn save(&mut self, plants: &[Plant]) -> StoreResult<()> {
        let json = serde_json::to_string(plants)?;
        self.store.set(PROJECT_KEY, &json)
    }

    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.plants()?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    pub fn contains(&self, code: &str) -> StoreResult<bool> {
        Ok(self.plants()?.iter().any(|p| p.code == code))
    }

    /// Append a plant; returns `false` when its code is already present.
    pub fn add(&mut self, plant: Plant) -> StoreResult<bool> {
        let mut plants = self.plants()?;
        if plants.iter().any(|p| p.code == plant.code) {
            return Ok(false);
        }
        tracing::debug!("Adding {} to project", plant.code);
        plants.push(plant);
        self.save(&plants)?;
        Ok(true)
    }

    /// Remove a plant by code; returns `false` when it was not present.
    pub fn remove(&mut self, code: &str) -> StoreResult<bool> {
        let mut plants = self.plants()?;
        let before = plants.len();
        plants.retain(|p| p.code != code);
        if plants.len() == before {
            return Ok(false);
        }
        tracing::debug!("Removed {} from project", code);
        self.save(&plants)?;
        Ok(true)
    }

    pub fn clear(&mut self) -> StoreResult<()> {
        tracing::debug!("Clearing project");
        self.save(&[])
    }

    pub fn summary(&self) -> StoreResult<ProjectSummary> {
        Ok(project_summary(&self.plants()?))
    }
}
