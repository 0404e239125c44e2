use std::{collections::HashMap, fs, path::Path};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{error::TideError, model::LocationEntry};

/// Read-only id → name table loaded once at startup.
///
/// Entries keep the order they had in the source file, which is the order the
/// location picker shows them in.
#[derive(Debug, Clone, Default)]
pub struct LocationDirectory {
    entries: Vec<LocationEntry>,
    by_id: HashMap<String, usize>,
}

impl LocationDirectory {
    /// Load a JSON object of `{ "<id>": "<name>", ... }`.
    ///
    /// A missing file yields an empty directory. A file that exists but can't be
    /// read or isn't a JSON object is [`TideError::DataUnavailable`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TideError> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "location dataset not found, starting with no locations");
            return Ok(Self::default());
        }

        let unavailable = |reason: String| TideError::DataUnavailable {
            path: path.to_path_buf(),
            reason,
        };

        let contents = fs::read_to_string(path).map_err(|e| unavailable(e.to_string()))?;
        let map: Map<String, Value> =
            serde_json::from_str(&contents).map_err(|e| unavailable(e.to_string()))?;

        let pairs = map.into_iter().filter_map(|(id, value)| match value {
            Value::String(name) if !name.trim().is_empty() => Some((id, name)),
            other => {
                warn!(%id, value = %other, "skipping location without a usable name");
                None
            }
        });

        let directory = Self::from_entries(pairs);
        debug!(path = %path.display(), count = directory.len(), "loaded location dataset");
        Ok(directory)
    }

    /// Build from `(id, name)` pairs. The first occurrence of an id wins.
    pub fn from_entries<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut directory = Self::default();
        for (id, name) in pairs {
            let id = id.into();
            if directory.by_id.contains_key(&id) {
                continue;
            }
            directory.by_id.insert(id.clone(), directory.entries.len());
            directory.entries.push(LocationEntry { id, name: name.into() });
        }
        directory
    }

    /// Entries whose name contains `query`, ignoring case. An empty query matches everything.
    pub fn search(&self, query: &str) -> Vec<&LocationEntry> {
        if query.is_empty() {
            return self.entries.iter().collect();
        }

        let needle = query.to_lowercase();
        self.entries
            .iter()
            .filter(|entry| entry.name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn name_by_id(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).map(|&idx| self.entries[idx].name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &LocationEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
