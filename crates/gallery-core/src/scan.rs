//! Catalog sources. [`DirectoryCatalog`] indexes a folder tree the way a
//! device media store would: every image or video is an entry and its
//! parent folder is its album.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use exif::{In, Reader, Tag};
use rayon::prelude::*;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::media::{CatalogEntry, Media};
use crate::resolve::Resolvers;

const MAX_EXIF_SIZE: u64 = 32 * 1024 * 1024; // 32 MiB

/// Folders containing this file are left out of the catalog.
pub const NO_MEDIA_MARKER: &str = ".nomedia";

/// A source of catalog rows.
pub trait Catalog {
    fn entries(&self) -> Result<Vec<CatalogEntry>>;
}

impl Catalog for Vec<CatalogEntry> {
    fn entries(&self) -> Result<Vec<CatalogEntry>> {
        Ok(self.clone())
    }
}

/// Turn catalog rows into records, skipping rows that fail validation.
pub fn load_media<C: Catalog + ?Sized>(catalog: &C) -> Result<Vec<Media>> {
    let entries = catalog.entries()?;
    let total = entries.len();
    let media: Vec<Media> = entries
        .into_iter()
        .filter_map(|entry| match Media::from_catalog(entry) {
            Ok(media) => Some(media),
            Err(err) => {
                log::warn!("Skipping catalog entry: {}", err);
                None
            }
        })
        .collect();
    log::info!("Loaded {} of {} catalog entries", media.len(), total);
    Ok(media)
}

pub struct DirectoryCatalog<'a> {
    root: PathBuf,
    resolvers: &'a Resolvers,
}

impl<'a> DirectoryCatalog<'a> {
    pub fn new(root: impl Into<PathBuf>, resolvers: &'a Resolvers) -> Self {
        Self {
            root: root.into(),
            resolvers,
        }
    }
}

impl Catalog for DirectoryCatalog<'_> {
    fn entries(&self) -> Result<Vec<CatalogEntry>> {
        let root = fs::canonicalize(&self.root)?;
        let mut files = Vec::new();
        collect_media_files(&root, &mut files)?;
        files.sort();

        let resolvers = self.resolvers;
        let entries: Vec<CatalogEntry> = files
            .par_iter()
            .filter_map(|path| describe(path, resolvers))
            .collect();
        Ok(entries)
    }
}

/// Recursively collect image and video files below `dir`. Hidden entries,
/// folders marked with [`NO_MEDIA_MARKER`] and symlinked folders are
/// skipped; unreadable subfolders are logged and skipped.
fn collect_media_files(dir: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    if dir.join(NO_MEDIA_MARKER).exists() {
        log::debug!("Skipping {} (marked {})", dir.display(), NO_MEDIA_MARKER);
        return Ok(());
    }

    for entry in fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if hidden {
            continue;
        }
        // file_type() does not follow links, so a link back to an ancestor is never walked
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            if let Err(err) = collect_media_files(&path, files) {
                log::warn!("Cannot read {}: {}", path.display(), err);
            }
        } else if file_type.is_symlink() && path.is_dir() {
            log::debug!("Skipping linked folder {}", path.display());
        } else if is_media_file(&path) {
            files.push(path);
        }
    }
    Ok(())
}

fn is_media_file(path: &Path) -> bool {
    match mime_guess::from_path(path).first() {
        Some(mime) => mime.type_() == mime_guess::mime::IMAGE || mime.type_() == mime_guess::mime::VIDEO,
        None => false,
    }
}

fn describe(path: &Path, resolvers: &Resolvers) -> Option<CatalogEntry> {
    let dir = path.parent()?;
    let label = path.file_name()?.to_string_lossy().into_owned();
    let mime = mime_guess::from_path(path).first()?;
    let path_str = path.to_string_lossy().into_owned();
    let dir_str = dir.to_string_lossy();

    let timestamp = resolvers.modified_or_zero(path);
    let orientation = if mime.type_() == mime_guess::mime::IMAGE {
        read_orientation(path)
    } else {
        0
    };
    let locator = url::Url::from_file_path(path)
        .map(|url| url.to_string())
        .unwrap_or_else(|_| path_str.clone());

    Some(CatalogEntry {
        id: stable_id(&path_str),
        label,
        locator,
        album_id: stable_id(&dir_str.to_lowercase()),
        album_label: dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path: path_str,
        timestamp,
        full_date: resolvers.full_date(timestamp),
        mime_type: mime.to_string(),
        orientation,
        favorite: false,
        trashed: false,
        duration: None,
    })
}

/// Non-negative id derived from a path, stable across scans.
pub fn stable_id(text: &str) -> i64 {
    let digest = Sha256::digest(text.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    i64::from_be_bytes(bytes) & i64::MAX
}

/// Clockwise rotation for an EXIF orientation value.
pub fn orientation_degrees(value: u32) -> i32 {
    match value {
        3 | 4 => 180,
        6 | 7 => 90,
        5 | 8 => 270,
        _ => 0,
    }
}

fn read_orientation(path: &Path) -> i32 {
    let Ok(metadata) = fs::metadata(path) else {
        return 0;
    };
    if metadata.len() > MAX_EXIF_SIZE {
        return 0;
    }
    let Ok(file) = File::open(path) else {
        return 0;
    };
    match Reader::new().read_from_container(&mut BufReader::new(file)) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(orientation_degrees)
            .unwrap_or(0),
        Err(err) => {
            log::debug!("No EXIF orientation for {}: {}", path.display(), err);
            0
        }
    }
}
