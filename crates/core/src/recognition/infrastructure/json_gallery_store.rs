//! JSON-file persistence for the identity gallery.
//!
//! The store owns the file path; the engine only ever sees immutable
//! [`Gallery`] snapshots loaded from it. Enrollment and removal go
//! through here so the on-disk file and the case-normalized uniqueness
//! rule stay consistent.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::recognition::gallery::{Gallery, GalleryEntry};

#[derive(Debug, thiserror::Error)]
pub enum GalleryStoreError {
    #[error("Cannot read gallery file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Cannot write gallery file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Gallery file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Name '{0}' is already enrolled")]
    DuplicateName(String),
    #[error("Name '{0}' is not enrolled")]
    UnknownName(String),
}

/// On-disk record. Names are stored uppercase.
#[derive(Debug, Serialize, Deserialize)]
struct GalleryRecord {
    name: String,
    embedding: Vec<f32>,
}

pub struct JsonGalleryStore {
    path: PathBuf,
}

impl JsonGalleryStore {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Load the gallery. A missing file is an empty gallery, not an
    /// error, so first runs need no setup step.
    pub fn load(&self) -> Result<Gallery, GalleryStoreError> {
        if !self.path.exists() {
            return Ok(Gallery::default());
        }

        let raw = std::fs::read_to_string(&self.path).map_err(|source| GalleryStoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        let records: Vec<GalleryRecord> =
            serde_json::from_str(&raw).map_err(|source| GalleryStoreError::Parse {
                path: self.path.clone(),
                source,
            })?;

        Ok(Gallery::new(
            records
                .into_iter()
                .map(|r| GalleryEntry::new(&r.name, r.embedding))
                .collect(),
        ))
    }

    /// Enroll a new identity. The name is case-normalized and must not
    /// collide with an existing entry.
    pub fn add(&self, name: &str, embedding: Vec<f32>) -> Result<(), GalleryStoreError> {
        let gallery = self.load()?;
        let normalized = name.to_uppercase();
        if gallery.entries().iter().any(|e| e.name == normalized) {
            return Err(GalleryStoreError::DuplicateName(normalized));
        }

        let mut entries = gallery.entries().to_vec();
        entries.push(GalleryEntry::new(name, embedding));
        self.save_entries(&entries)
    }

    /// Remove an enrolled identity by name (case-insensitive).
    pub fn remove(&self, name: &str) -> Result<(), GalleryStoreError> {
        let gallery = self.load()?;
        let normalized = name.to_uppercase();
        if !gallery.entries().iter().any(|e| e.name == normalized) {
            return Err(GalleryStoreError::UnknownName(normalized));
        }

        let entries: Vec<GalleryEntry> = gallery
            .entries()
            .iter()
            .filter(|e| e.name != normalized)
            .cloned()
            .collect();
        self.save_entries(&entries)
    }

    /// Enrolled names, in file order.
    pub fn names(&self) -> Result<Vec<String>, GalleryStoreError> {
        Ok(self
            .load()?
            .entries()
            .iter()
            .map(|e| e.name.clone())
            .collect())
    }

    fn save_entries(&self, entries: &[GalleryEntry]) -> Result<(), GalleryStoreError> {
        let records: Vec<GalleryRecord> = entries
            .iter()
            .map(|e| GalleryRecord {
                name: e.name.clone(),
                embedding: e.embedding.clone(),
            })
            .collect();

        let json = serde_json::to_string_pretty(&records).map_err(|source| {
            GalleryStoreError::Parse {
                path: self.path.clone(),
                source,
            }
        })?;
        std::fs::write(&self.path, json).map_err(|source| GalleryStoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> JsonGalleryStore {
        JsonGalleryStore::new(&dir.path().join("gallery.json"))
    }

    #[test]
    fn test_missing_file_loads_empty_gallery() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_add_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.add("alice", vec![0.1, 0.2, 0.3]).unwrap();
        let gallery = store.load().unwrap();

        assert_eq!(gallery.len(), 1);
        assert_eq!(gallery.entries()[0].name, "ALICE");
        assert_eq!(gallery.entries()[0].embedding, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_duplicate_name_is_rejected_case_insensitively() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.add("Alice", vec![0.0]).unwrap();
        let err = store.add("ALICE", vec![1.0]).unwrap_err();
        assert!(matches!(err, GalleryStoreError::DuplicateName(name) if name == "ALICE"));

        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_remove_existing_entry() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.add("alice", vec![0.0]).unwrap();
        store.add("bob", vec![1.0]).unwrap();
        store.remove("alice").unwrap();

        assert_eq!(store.names().unwrap(), vec!["BOB".to_string()]);
    }

    #[test]
    fn test_remove_unknown_name_fails() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let err = store.remove("nobody").unwrap_err();
        assert!(matches!(err, GalleryStoreError::UnknownName(name) if name == "NOBODY"));
    }

    #[test]
    fn test_corrupt_file_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gallery.json");
        std::fs::write(&path, "not json").unwrap();

        let store = JsonGalleryStore::new(&path);
        assert!(matches!(
            store.load().unwrap_err(),
            GalleryStoreError::Parse { .. }
        ));
    }

    #[test]
    fn test_names_in_file_order() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.add("carol", vec![0.0]).unwrap();
        store.add("alice", vec![1.0]).unwrap();

        assert_eq!(
            store.names().unwrap(),
            vec!["CAROL".to_string(), "ALICE".to_string()]
        );
    }
}
