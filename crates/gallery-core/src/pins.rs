use std::collections::{BTreeSet, HashSet};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MediaError, Result};

/// Current pin file format version
const PIN_FILE_VERSION: u32 = 1;

/// Read access to the set of pinned album ids.
pub trait PinRegistry {
    fn contains(&self, album_id: i64) -> bool;
    fn list_all(&self) -> BTreeSet<i64>;
}

impl PinRegistry for BTreeSet<i64> {
    fn contains(&self, album_id: i64) -> bool {
        BTreeSet::contains(self, &album_id)
    }

    fn list_all(&self) -> BTreeSet<i64> {
        self.clone()
    }
}

impl PinRegistry for HashSet<i64> {
    fn contains(&self, album_id: i64) -> bool {
        HashSet::contains(self, &album_id)
    }

    fn list_all(&self) -> BTreeSet<i64> {
        self.iter().copied().collect()
    }
}

/// A single persisted pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PinnedAlbum {
    pub id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PinFile {
    version: u32,
    pinned: Vec<PinnedAlbum>,
}

/// Pinned albums persisted as a JSON file, one row per album id.
#[derive(Debug, Clone)]
pub struct PinStore {
    path: PathBuf,
    pinned: BTreeSet<i64>,
}

impl PinStore {
    /// Load the store at `path`; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self {
                path,
                pinned: BTreeSet::new(),
            });
        }

        let file = File::open(&path)?;
        let pin_file: PinFile = serde_json::from_reader(BufReader::new(file))?;
        if pin_file.version != PIN_FILE_VERSION {
            return Err(MediaError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "{}: unsupported pin file version {}",
                    path.display(),
                    pin_file.version
                ),
            )));
        }

        Ok(Self {
            path,
            pinned: pin_file.pinned.into_iter().map(|p| p.id).collect(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns false if the album was already pinned.
    pub fn pin(&mut self, album_id: i64) -> bool {
        self.pinned.insert(album_id)
    }

    /// Returns false if the album was not pinned.
    pub fn unpin(&mut self, album_id: i64) -> bool {
        self.pinned.remove(&album_id)
    }

    pub fn pinned(&self) -> impl Iterator<Item = PinnedAlbum> + '_ {
        self.pinned.iter().map(|&id| PinnedAlbum { id })
    }

    /// Write the store back to its file.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let temp_path = self.path.with_extension("tmp");

        // Write to temp file first, then rename for atomicity
        if let Err(err) = self.write_pin_file(&temp_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(err);
        }

        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn write_pin_file(&self, path: &Path) -> Result<()> {
        let pin_file = PinFile {
            version: PIN_FILE_VERSION,
            pinned: self.pinned().collect(),
        };
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, &pin_file)?;
        writer.flush()?;
        Ok(())
    }
}

impl PinRegistry for PinStore {
    fn contains(&self, album_id: i64) -> bool {
        self.pinned.contains(&album_id)
    }

    fn list_all(&self) -> BTreeSet<i64> {
        self.pinned.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = PinStore::open(dir.path().join("pins.json")).unwrap();
        assert!(store.list_all().is_empty());
    }

    #[test]
    fn test_pin_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut store = PinStore::open(dir.path().join("pins.json")).unwrap();
        assert!(store.pin(4));
        assert!(!store.pin(4));
        assert!(store.contains(4));
        assert_eq!(store.pinned().count(), 1);

        assert!(store.unpin(4));
        assert!(!store.unpin(4));
        assert!(!store.contains(4));
    }

    #[test]
    fn test_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("pins.json");

        let mut store = PinStore::open(&path).unwrap();
        store.pin(12);
        store.pin(-3);
        store.save().unwrap();

        let loaded = PinStore::open(&path).unwrap();
        assert_eq!(loaded.list_all(), BTreeSet::from([-3, 12]));
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_failed_save_keeps_previous_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pins.json");

        let mut store = PinStore::open(&path).unwrap();
        store.pin(1);
        store.save().unwrap();

        // A directory squatting on the temp path makes the write fail
        fs::create_dir(path.with_extension("tmp")).unwrap();
        store.pin(2);
        assert!(store.save().is_err());

        let loaded = PinStore::open(&path).unwrap();
        assert_eq!(loaded.list_all(), BTreeSet::from([1]));
    }

    #[test]
    fn test_saved_file_is_complete_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pins.json");

        let mut store = PinStore::open(&path).unwrap();
        for id in 0..500 {
            store.pin(id);
        }
        store.save().unwrap();

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["pinned"].as_array().unwrap().len(), 500);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_rejects_unknown_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pins.json");
        fs::write(&path, r#"{"version": 99, "pinned": []}"#).unwrap();
        assert!(PinStore::open(&path).is_err());
    }

    #[test]
    fn test_set_registries() {
        let hashed: HashSet<i64> = HashSet::from([3, 1]);
        assert!(PinRegistry::contains(&hashed, 3));
        assert_eq!(hashed.list_all(), BTreeSet::from([1, 3]));

        let ordered = BTreeSet::from([2]);
        assert!(!PinRegistry::contains(&ordered, 1));
    }
}
