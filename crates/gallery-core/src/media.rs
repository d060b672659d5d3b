use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MediaError, Result};
use crate::locator::Locator;
use crate::resolve::Resolvers;

/// Album id reported by records that do not belong to any catalog album.
pub const EXTERNAL_ALBUM_ID: i64 = -99;

/// Where a record came from, and therefore which catalog features it has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Source {
    /// Indexed by the media catalog. Favorites, trash and albums apply.
    Cataloged {
        album_id: i64,
        album_label: String,
        favorite: bool,
        trashed: bool,
    },
    /// Reachable only through its locator, e.g. a file private to another app.
    ExternalOnly,
}

/// One row as supplied by a catalog query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: i64,
    pub label: String,
    pub locator: String,
    pub path: String,
    pub album_id: i64,
    pub album_label: String,
    pub timestamp: i64,
    pub full_date: String,
    pub mime_type: String,
    #[serde(default)]
    pub orientation: i32,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub trashed: bool,
    #[serde(default)]
    pub duration: Option<String>,
}

/// A single photo or video.
///
/// Records are immutable; edits such as [`Media::with_favorite`] return a
/// new record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Media {
    id: i64,
    label: String,
    locator: String,
    path: String,
    /// Epoch seconds, 0 when unknown
    timestamp: i64,
    full_date: String,
    mime_type: String,
    orientation: i32,
    duration: Option<String>,
    source: Source,
}

impl Media {
    /// Build a record from a catalog row. The row is trusted, except that it
    /// may not claim the reserved external album id.
    pub fn from_catalog(entry: CatalogEntry) -> Result<Self> {
        if entry.album_id == EXTERNAL_ALBUM_ID {
            return Err(MediaError::InvalidMedia(format!(
                "{}: album id {} is reserved for external media",
                entry.path, EXTERNAL_ALBUM_ID
            )));
        }
        Ok(Self {
            id: entry.id,
            label: entry.label,
            locator: entry.locator,
            path: entry.path,
            timestamp: entry.timestamp,
            full_date: entry.full_date,
            mime_type: entry.mime_type,
            orientation: entry.orientation,
            duration: entry.duration,
            source: Source::Cataloged {
                album_id: entry.album_id,
                album_label: entry.album_label,
                favorite: entry.favorite,
                trashed: entry.trashed,
            },
        })
    }

    /// Build a bare record for a locator the catalog could not resolve.
    ///
    /// Fails only when the locator names no path. The modification time and
    /// MIME type are best-effort and fall back to 0 and
    /// [`UNKNOWN_MIME_TYPE`](crate::resolve::UNKNOWN_MIME_TYPE).
    pub fn from_locator(locator: &str, resolvers: &Resolvers) -> Result<Self> {
        let Some(parsed) = Locator::parse(locator) else {
            return Err(MediaError::InvalidMedia(format!("{} has no path", locator)));
        };
        let timestamp = resolvers.modified_or_zero(Path::new(parsed.path()));

        Ok(Self {
            id: 0,
            label: parsed.file_name().to_string(),
            locator: locator.to_string(),
            path: parsed.path().to_string(),
            timestamp,
            full_date: resolvers.full_date(timestamp),
            mime_type: resolvers.mime_type(parsed.extension()),
            orientation: 0,
            duration: None,
            source: Source::ExternalOnly,
        })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn full_date(&self) -> &str {
        &self.full_date
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn orientation(&self) -> i32 {
        self.orientation
    }

    pub fn duration(&self) -> Option<&str> {
        self.duration.as_deref()
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn album_id(&self) -> i64 {
        match &self.source {
            Source::Cataloged { album_id, .. } => *album_id,
            Source::ExternalOnly => EXTERNAL_ALBUM_ID,
        }
    }

    pub fn album_label(&self) -> &str {
        match &self.source {
            Source::Cataloged { album_label, .. } => album_label,
            Source::ExternalOnly => "",
        }
    }

    pub fn is_favorite(&self) -> bool {
        matches!(self.source, Source::Cataloged { favorite: true, .. })
    }

    pub fn is_trashed(&self) -> bool {
        matches!(self.source, Source::Cataloged { trashed: true, .. })
    }

    /// True for locator-only records, which have no favorite, trash or
    /// album semantics.
    pub fn is_degraded(&self) -> bool {
        matches!(self.source, Source::ExternalOnly)
    }

    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// Key identifying this record in a timeline. External records may all
    /// have id 0, so their key is built from the path.
    pub fn leaf_key(&self) -> String {
        match self.source {
            Source::Cataloged { .. } => format!("media_{}", self.id),
            Source::ExternalOnly => format!("external_{}", self.path),
        }
    }

    pub fn with_favorite(&self, favorite: bool) -> Result<Self> {
        let mut media = self.catalog_copy("change favorite state of")?;
        if let Source::Cataloged { favorite: f, .. } = &mut media.source {
            *f = favorite;
        }
        Ok(media)
    }

    pub fn with_trashed(&self, trashed: bool) -> Result<Self> {
        let mut media = self.catalog_copy("move to or from trash")?;
        if let Source::Cataloged { trashed: t, .. } = &mut media.source {
            *t = trashed;
        }
        Ok(media)
    }

    /// Rotate by `degrees` (negative turns counter-clockwise); the result
    /// is normalized to 0..360.
    pub fn rotated(&self, degrees: i32) -> Result<Self> {
        let mut media = self.catalog_copy("rotate")?;
        media.orientation = (media.orientation + degrees).rem_euclid(360);
        Ok(media)
    }

    fn catalog_copy(&self, action: &str) -> Result<Self> {
        if self.is_degraded() {
            return Err(MediaError::ExternalOnly(format!("cannot {} {}", action, self.path)));
        }
        Ok(self.clone())
    }
}

impl fmt::Display for Media {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, favorite={}",
            self.id,
            self.path,
            self.full_date,
            self.mime_type,
            u8::from(self.is_favorite())
        )
    }
}
