use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::media::Media;
use crate::pins::PinRegistry;

/// Snapshot of one album as shown in an album list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Album {
    pub id: i64,
    pub label: String,
    /// Path of the newest member
    pub thumbnail_path: String,
    /// Timestamp of the newest member
    pub timestamp: i64,
    pub count: u64,
    /// Transient UI selection, never persisted
    pub selected: bool,
    pub pinned: bool,
}

impl Album {
    pub fn with_selected(&self, selected: bool) -> Self {
        Self {
            selected,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone)]
struct Member {
    key: String,
    path: String,
    timestamp: i64,
}

#[derive(Debug, Clone)]
struct AlbumState {
    label: String,
    members: Vec<Member>,
    /// Index into `members` of the thumbnail source
    thumbnail: usize,
}

impl AlbumState {
    fn recompute_thumbnail(&mut self) {
        // Strictly newer wins, so the first of equal timestamps is kept
        let mut best = 0;
        for (i, member) in self.members.iter().enumerate() {
            if member.timestamp > self.members[best].timestamp {
                best = i;
            }
        }
        self.thumbnail = best;
    }

    fn snapshot<P: PinRegistry + ?Sized>(&self, id: i64, pins: &P) -> Album {
        let thumb = &self.members[self.thumbnail];
        Album {
            id,
            label: self.label.clone(),
            thumbnail_path: thumb.path.clone(),
            timestamp: thumb.timestamp,
            count: self.members.len() as u64,
            selected: false,
            pinned: pins.contains(id),
        }
    }
}

/// Incrementally maintained albums over a changing set of records.
///
/// Locator-only records belong to no album and are ignored. An album whose
/// last member is removed disappears.
#[derive(Debug, Clone, Default)]
pub struct AlbumIndex {
    /// Album ids in first-seen order
    order: Vec<i64>,
    albums: HashMap<i64, AlbumState>,
}

impl AlbumIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_media(media: &[Media]) -> Self {
        let mut index = Self::new();
        for m in media {
            index.insert(m);
        }
        index
    }

    /// Add a record to its album. Returns false for locator-only records.
    pub fn insert(&mut self, media: &Media) -> bool {
        if media.is_degraded() {
            return false;
        }
        let album_id = media.album_id();
        let member = Member {
            key: media.leaf_key(),
            path: media.path().to_string(),
            timestamp: media.timestamp(),
        };

        match self.albums.get_mut(&album_id) {
            Some(state) => {
                if member.timestamp > state.members[state.thumbnail].timestamp {
                    state.thumbnail = state.members.len();
                }
                state.members.push(member);
            }
            None => {
                self.order.push(album_id);
                self.albums.insert(
                    album_id,
                    AlbumState {
                        label: media.album_label().to_string(),
                        members: vec![member],
                        thumbnail: 0,
                    },
                );
            }
        }
        true
    }

    /// Remove a record from its album. Returns false if it was not present.
    pub fn remove(&mut self, media: &Media) -> bool {
        if media.is_degraded() {
            return false;
        }
        let album_id = media.album_id();
        let Some(state) = self.albums.get_mut(&album_id) else {
            return false;
        };

        let key = media.leaf_key();
        // Latest match first, so insert followed by remove leaves the rest untouched
        let Some(pos) = state
            .members
            .iter()
            .rposition(|m| m.key == key && m.path == media.path())
        else {
            return false;
        };
        state.members.remove(pos);

        if state.members.is_empty() {
            self.albums.remove(&album_id);
            self.order.retain(|&id| id != album_id);
            return true;
        }

        match pos.cmp(&state.thumbnail) {
            Ordering::Equal => state.recompute_thumbnail(),
            Ordering::Less => state.thumbnail -= 1,
            Ordering::Greater => {}
        }
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of records in `album_id`, 0 if the album is absent.
    pub fn count(&self, album_id: i64) -> u64 {
        self.albums
            .get(&album_id)
            .map_or(0, |state| state.members.len() as u64)
    }

    pub fn get<P: PinRegistry + ?Sized>(&self, album_id: i64, pins: &P) -> Option<Album> {
        self.albums
            .get(&album_id)
            .map(|state| state.snapshot(album_id, pins))
    }

    /// All albums in the order they were first seen.
    pub fn albums<P: PinRegistry + ?Sized>(&self, pins: &P) -> Vec<Album> {
        self.order
            .iter()
            .filter_map(|id| self.get(*id, pins))
            .collect()
    }
}

/// One album per catalog album id present in `media`.
pub fn aggregate_albums<P: PinRegistry + ?Sized>(media: &[Media], pins: &P) -> Vec<Album> {
    AlbumIndex::from_media(media).albums(pins)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlbumOrder {
    /// Newest album first
    #[default]
    DateDesc,
    DateAsc,
    LabelAsc,
    LabelDesc,
}

impl AlbumOrder {
    fn compare(self, a: &Album, b: &Album) -> Ordering {
        match self {
            AlbumOrder::DateDesc => b.timestamp.cmp(&a.timestamp),
            AlbumOrder::DateAsc => a.timestamp.cmp(&b.timestamp),
            AlbumOrder::LabelAsc => a.label.to_lowercase().cmp(&b.label.to_lowercase()),
            AlbumOrder::LabelDesc => b.label.to_lowercase().cmp(&a.label.to_lowercase()),
        }
    }
}

impl FromStr for AlbumOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date-desc" => Ok(AlbumOrder::DateDesc),
            "date-asc" => Ok(AlbumOrder::DateAsc),
            "label-asc" => Ok(AlbumOrder::LabelAsc),
            "label-desc" => Ok(AlbumOrder::LabelDesc),
            other => Err(format!(
                "unknown album order '{}' (expected date-desc, date-asc, label-asc or label-desc)",
                other
            )),
        }
    }
}

/// Pinned albums first, each partition ordered by `order`. Stable.
pub fn sort_albums(albums: &mut [Album], order: AlbumOrder) {
    albums.sort_by(|a, b| b.pinned.cmp(&a.pinned).then_with(|| order.compare(a, b)));
}
