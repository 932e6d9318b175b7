//! Local index of which files were uploaded into which vector store.
//!
//! The whole index lives in one JSON document shaped like
//! `{"<vector store id>": [{"file_path": "...", "file_id": "..."}]}` and is
//! rewritten in full after every change.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::target;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to write metadata file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode metadata: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub file_path: String,
    pub file_id: String,
}

#[derive(Debug, Clone)]
pub struct FileMetadataStore {
    path: PathBuf,
    entries: BTreeMap<String, Vec<FileRecord>>,
}

impl FileMetadataStore {
    /// Loads the index at `path`.
    ///
    /// Never fails: a missing or empty file gives an empty index, and so does
    /// a file that cannot be read or parsed (after logging the problem).
    pub fn load(path: impl Into<PathBuf>) -> FileMetadataStore {
        let path = path.into();
        let entries = Self::read_entries(&path);
        FileMetadataStore { path, entries }
    }

    fn read_entries(path: &Path) -> BTreeMap<String, Vec<FileRecord>> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(error) => {
                log::error!(target: target::FILE, "Could not read metadata file {}: {error}. Returning empty metadata.", path.display());
                return BTreeMap::new();
            }
        };

        if contents.trim().is_empty() {
            return BTreeMap::new();
        }

        match serde_json::from_str(&contents) {
            Ok(entries) => entries,
            Err(error) => {
                log::error!(target: target::FILE, "Invalid JSON in metadata file ({error}). Returning empty metadata.");
                BTreeMap::new()
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records for one vector store, in upload order.
    pub fn records(&self, vector_store_id: &str) -> &[FileRecord] {
        self.entries
            .get(vector_store_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn store_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends records under a vector store and saves the index.
    pub fn append<I>(&mut self, vector_store_id: &str, records: I) -> Result<(), MetadataError>
    where
        I: IntoIterator<Item = FileRecord>,
    {
        self.entries
            .entry(vector_store_id.to_string())
            .or_default()
            .extend(records);
        self.save()
    }

    /// Forgets every record of every vector store and saves the index.
    pub fn clear(&mut self) -> Result<(), MetadataError> {
        self.entries.clear();
        self.save()
    }

    /// Overwrites the metadata file with the current index.
    pub fn save(&self) -> Result<(), MetadataError> {
        let document = serde_json::to_string(&self.entries)?;
        let io_error = |source| MetadataError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(&self.path, document).map_err(io_error)
    }
}
