pub mod album;
pub mod error;
pub mod locator;
pub mod media;
pub mod pins;
pub mod resolve;
pub mod scan;
pub mod timeline;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use album::{aggregate_albums, sort_albums, Album, AlbumIndex, AlbumOrder};
pub use error::{MediaError, Result};
pub use media::{CatalogEntry, Media, Source, EXTERNAL_ALBUM_ID};
pub use pins::{PinRegistry, PinStore, PinnedAlbum};
pub use resolve::{DateFormatter, Resolvers, Zone, FULL_DATE_FORMAT, MONTH_FORMAT};
pub use scan::{load_media, Catalog, DirectoryCatalog};
pub use timeline::{group_by_date, group_by_label, is_header_key, MediaItem};

fn default_date_format() -> String {
    FULL_DATE_FORMAT.to_string()
}

/// Size of the timeline sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Day,
    Month,
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "day" => Ok(GroupBy::Day),
            "month" => Ok(GroupBy::Month),
            other => Err(format!("unknown grouping '{}' (expected day or month)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryOptions {
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default)]
    pub group_by: GroupBy,
    #[serde(default)]
    pub album_order: AlbumOrder,
    #[serde(default)]
    pub zone: Zone,
}

impl Default for LibraryOptions {
    fn default() -> Self {
        Self {
            date_format: default_date_format(),
            group_by: GroupBy::default(),
            album_order: AlbumOrder::default(),
            zone: Zone::default(),
        }
    }
}

impl LibraryOptions {
    /// Resolvers formatting dates the way these options ask for.
    pub fn resolvers(&self) -> Resolvers {
        Resolvers::new()
            .with_formatter(DateFormatter::new(self.zone))
            .with_date_format(self.date_format.clone())
    }
}

/// Everything a gallery view needs from one snapshot of records.
#[derive(Debug, Clone, Serialize)]
pub struct Library {
    pub timeline: Vec<MediaItem>,
    pub albums: Vec<Album>,
    /// Trashed records, newest first. Not part of the timeline or albums.
    pub trash: Vec<Media>,
}

impl Library {
    pub fn header_count(&self) -> usize {
        self.timeline.iter().filter(|item| item.is_header()).count()
    }

    pub fn media_count(&self) -> usize {
        self.timeline.len() - self.header_count()
    }
}

/// Stable sort by timestamp, newest first.
pub fn sort_newest_first(media: &mut [Media]) {
    media.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
}

/// Sort a snapshot of records, then build its timeline and album list.
pub fn build_library<P: PinRegistry + ?Sized>(
    mut media: Vec<Media>,
    pins: &P,
    options: &LibraryOptions,
    resolvers: &Resolvers,
) -> Library {
    sort_newest_first(&mut media);
    let (trash, media): (Vec<Media>, Vec<Media>) = media.into_iter().partition(Media::is_trashed);

    let timeline = match options.group_by {
        GroupBy::Day => group_by_date(&media),
        GroupBy::Month => group_by_label(&media, |m| resolvers.label(m.timestamp(), MONTH_FORMAT)),
    };

    let mut albums = aggregate_albums(&media, pins);
    sort_albums(&mut albums, options.album_order);

    log::info!(
        "Built library: {} media in {} sections, {} albums, {} trashed",
        media.len(),
        timeline.len() - media.len(),
        albums.len(),
        trash.len()
    );

    Library {
        timeline,
        albums,
        trash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::tests::{cataloged, FixedStat};
    use std::collections::BTreeSet;

    fn utc_options(group_by: GroupBy) -> LibraryOptions {
        LibraryOptions {
            date_format: "%Y-%m-%d".to_string(),
            group_by,
            album_order: AlbumOrder::DateDesc,
            zone: Zone::Utc,
        }
    }

    #[test]
    fn test_build_library_sorts_and_groups() {
        let options = utc_options(GroupBy::Day);
        let resolvers = options.resolvers();
        let media = vec![
            cataloged(1, "/a/1.jpg", 1, 1_704_067_200, "2024-01-01"),
            cataloged(3, "/b/3.jpg", 2, 1_704_240_000, "2024-01-03"),
            cataloged(2, "/a/2.jpg", 1, 1_704_070_000, "2024-01-01"),
        ];
        let library = build_library(media, &BTreeSet::from([1]), &options, &resolvers);

        assert_eq!(library.header_count(), 2);
        assert_eq!(library.media_count(), 3);
        let order: Vec<i64> = library
            .timeline
            .iter()
            .filter(|item| !item.is_header())
            .map(|item| item.media()[0].id())
            .collect();
        assert_eq!(order, vec![3, 2, 1]);

        assert_eq!(library.albums[0].id, 1);
        assert!(library.albums[0].pinned);
        assert_eq!(library.albums[0].thumbnail_path, "/a/2.jpg");
    }

    #[test]
    fn test_build_library_by_month() {
        let options = utc_options(GroupBy::Month);
        let resolvers = options.resolvers();
        let media = vec![
            cataloged(1, "/a/1.jpg", 1, 1_704_067_200, "2024-01-01"),
            cataloged(2, "/a/2.jpg", 1, 1_706_659_200, "2024-01-31"),
            cataloged(3, "/a/3.jpg", 1, 1_701_388_800, "2023-12-01"),
        ];
        let library = build_library(media, &BTreeSet::new(), &options, &resolvers);

        let headers: Vec<&str> = library
            .timeline
            .iter()
            .filter_map(|item| match item {
                MediaItem::Header { text, .. } => Some(text.as_str()),
                MediaItem::Leaf { .. } => None,
            })
            .collect();
        assert_eq!(headers, vec!["January 2024", "December 2023"]);
    }

    #[test]
    fn test_trash_kept_apart() {
        let options = utc_options(GroupBy::Day);
        let resolvers = options.resolvers().with_stat(FixedStat(0));
        let trashed = cataloged(2, "/a/2.jpg", 1, 200, "d").with_trashed(true).unwrap();
        let external = Media::from_locator("/sdcard/x.jpg", &resolvers).unwrap();
        let media = vec![cataloged(1, "/a/1.jpg", 1, 100, "d"), trashed, external];

        let library = build_library(media, &BTreeSet::new(), &options, &resolvers);
        assert_eq!(library.trash.len(), 1);
        assert_eq!(library.trash[0].id(), 2);
        assert_eq!(library.media_count(), 2);
        assert_eq!(library.albums.len(), 1);
        assert_eq!(library.albums[0].count, 1);
    }

    #[test]
    fn test_options_defaults_from_json() {
        let options: LibraryOptions = serde_json::from_str(r#"{"group_by": "month"}"#).unwrap();
        assert_eq!(options.group_by, GroupBy::Month);
        assert_eq!(options.date_format, FULL_DATE_FORMAT);
        assert_eq!(options.album_order, AlbumOrder::DateDesc);
        assert_eq!("day".parse::<GroupBy>().unwrap(), GroupBy::Day);
    }
}
