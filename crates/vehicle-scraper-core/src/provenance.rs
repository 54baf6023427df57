//! Side-car index recording where each saved image came from.
//!
//! The index is a flat JSON object. Each saved image gets its own entry keyed
//! by its path relative to the output root (`Make/Model/Year/<hash>.jpg`).
//! The value is the source URL, or a list of URLs when several sources served
//! byte-identical content. Older indexes keyed by directory have the same
//! shape and load unchanged; their URLs still count as already downloaded.

use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Source URLs of one saved image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
enum Sources {
    One(String),
    Many(Vec<String>),
}

impl Sources {
    fn urls(&self) -> &[String] {
        match self {
            Sources::One(url) => std::slice::from_ref(url),
            Sources::Many(urls) => urls,
        }
    }

    fn add(&mut self, url: String) {
        if self.urls().contains(&url) {
            return;
        }
        match self {
            Sources::One(first) => *self = Sources::Many(vec![std::mem::take(first), url]),
            Sources::Many(urls) => urls.push(url),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvenanceIndex {
    entries: BTreeMap<String, Sources>,
}

impl ProvenanceIndex {
    /// Load the index from disk. A missing file is an empty index.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let data = fs::read(path)?;
        if data.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Self::default());
        }

        Ok(serde_json::from_slice(&data)?)
    }

    /// Write the whole index, replacing the previous file atomically
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, serde_json::to_vec_pretty(self)?)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }

    /// Record a source URL of a saved image. URLs already recorded for the
    /// same image are kept.
    pub fn record(&mut self, key: impl Into<String>, url: impl Into<String>) {
        let url = url.into();
        match self.entries.entry(key.into()) {
            Entry::Vacant(entry) => {
                entry.insert(Sources::One(url));
            }
            Entry::Occupied(mut entry) => entry.get_mut().add(url),
        }
    }

    /// Every URL already downloaded
    pub fn known_urls(&self) -> HashSet<String> {
        self.entries
            .values()
            .flat_map(|sources| sources.urls().iter().cloned())
            .collect()
    }

    /// First URL recorded for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.sources(key).first().map(String::as_str)
    }

    /// All URLs recorded for `key`, oldest first
    pub fn sources(&self, key: &str) -> &[String] {
        self.entries.get(key).map(Sources::urls).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
