//! Groups a newest-first media sequence into dated sections for a
//! chronological list: each section is a header followed by its items.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::media::Media;

/// Every header key starts with this, and no item key does.
pub const HEADER_KEY_PREFIX: &str = "header";

/// Header text for records without a known date.
pub const UNDATED_LABEL: &str = "Unknown date";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaItem {
    Header {
        key: String,
        text: String,
        media: Vec<Media>,
    },
    Leaf {
        key: String,
        media: Media,
    },
}

impl MediaItem {
    pub fn key(&self) -> &str {
        match self {
            MediaItem::Header { key, .. } | MediaItem::Leaf { key, .. } => key,
        }
    }

    pub fn is_header(&self) -> bool {
        matches!(self, MediaItem::Header { .. })
    }

    /// Records under a header, or the single record of an item.
    pub fn media(&self) -> &[Media] {
        match self {
            MediaItem::Header { media, .. } => media,
            MediaItem::Leaf { media, .. } => std::slice::from_ref(media),
        }
    }
}

/// Tells header keys from item keys when only the key text is available.
pub fn is_header_key(key: &str) -> bool {
    key.starts_with(HEADER_KEY_PREFIX)
}

/// Group by formatted day (`full_date`).
pub fn group_by_date(media: &[Media]) -> Vec<MediaItem> {
    group_by_label(media, |m| m.full_date().to_string())
}

/// Group consecutive records that share a label.
///
/// Input must already be sorted newest-first; it is never reordered. Only
/// adjacent records are merged, so a label that reappears after a different
/// one starts a new section.
pub fn group_by_label<F>(media: &[Media], mut label_of: F) -> Vec<MediaItem>
where
    F: FnMut(&Media) -> String,
{
    let mut runs: Vec<(String, Vec<Media>)> = Vec::new();
    for m in media {
        let label = label_of(m);
        match runs.last_mut() {
            Some((current, members)) if *current == label => members.push(m.clone()),
            _ => runs.push((label, vec![m.clone()])),
        }
    }

    let mut items = Vec::with_capacity(media.len() + runs.len());
    let mut used_keys: HashSet<String> = HashSet::with_capacity(media.len());
    let mut key_counters: HashMap<String, u32> = HashMap::new();

    for (ordinal, (label, members)) in runs.into_iter().enumerate() {
        let key = format!("{}_{}_{}", HEADER_KEY_PREFIX, label, ordinal);
        let text = if label.is_empty() {
            UNDATED_LABEL.to_string()
        } else {
            label
        };
        let leaves: Vec<MediaItem> = members
            .iter()
            .map(|m| MediaItem::Leaf {
                key: unique_leaf_key(m, &mut used_keys, &mut key_counters),
                media: m.clone(),
            })
            .collect();

        items.push(MediaItem::Header { key, text, media: members });
        items.extend(leaves);
    }

    items
}

fn unique_leaf_key(
    media: &Media,
    used: &mut HashSet<String>,
    counters: &mut HashMap<String, u32>,
) -> String {
    let base = media.leaf_key();
    if used.insert(base.clone()) {
        return base;
    }
    let counter = counters.entry(base.clone()).or_insert(0);
    loop {
        *counter += 1;
        let candidate = format!("{}({})", base, counter);
        if used.insert(candidate.clone()) {
            break candidate;
        }
    }
}
