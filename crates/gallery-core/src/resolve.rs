//! Capabilities the model consumes to fill in best-effort fields: date
//! formatting, MIME lookup and file modification times.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Local};
use filetime::FileTime;
use serde::{Deserialize, Serialize};

/// Day label used for timeline headers, e.g. "Mon, January 1, 2024".
pub const FULL_DATE_FORMAT: &str = "%a, %B %-d, %Y";

/// Month label used when grouping by month, e.g. "January 2024".
pub const MONTH_FORMAT: &str = "%B %Y";

/// MIME type reported when an extension is unknown or missing.
pub const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

/// Maps an epoch timestamp (seconds) to a display string.
/// Implementations must return the same string for the same inputs.
pub trait TimeFormatter: Send + Sync {
    fn format(&self, timestamp: i64, pattern: &str) -> String;
}

/// Maps a file extension (without the dot) to a MIME type.
pub trait MimeLookup: Send + Sync {
    fn lookup(&self, extension: &str) -> Option<String>;
}

/// Reports the last modification time of a path in epoch seconds.
pub trait FileStat: Send + Sync {
    fn last_modified(&self, path: &Path) -> io::Result<i64>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    #[default]
    Local,
    Utc,
}

/// `chrono`-backed formatter using strftime-style patterns.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateFormatter {
    zone: Zone,
}

impl DateFormatter {
    pub fn new(zone: Zone) -> Self {
        Self { zone }
    }

    pub fn utc() -> Self {
        Self::new(Zone::Utc)
    }
}

impl TimeFormatter for DateFormatter {
    fn format(&self, timestamp: i64, pattern: &str) -> String {
        let Some(utc) = DateTime::from_timestamp(timestamp, 0) else {
            return String::new();
        };
        let mut out = String::new();
        let written = match self.zone {
            Zone::Utc => write!(out, "{}", utc.format(pattern)),
            Zone::Local => write!(out, "{}", utc.with_timezone(&Local).format(pattern)),
        };
        // Malformed patterns surface as a fmt error rather than a panic
        if written.is_err() {
            out.clear();
        }
        out
    }
}

/// MIME lookup through `mime_guess`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionMime;

impl MimeLookup for ExtensionMime {
    fn lookup(&self, extension: &str) -> Option<String> {
        if extension.is_empty() {
            return None;
        }
        mime_guess::from_ext(extension).first().map(|mime| mime.to_string())
    }
}

/// Reads modification times from the local filesystem. Anything that is not
/// a regular file is reported as an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStat;

impl FileStat for FsStat {
    fn last_modified(&self, path: &Path) -> io::Result<i64> {
        let metadata = fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }
        Ok(FileTime::from_last_modification_time(&metadata).unix_seconds())
    }
}

/// Bundle of capabilities used while deriving record fields.
pub struct Resolvers {
    formatter: Box<dyn TimeFormatter>,
    mime: Box<dyn MimeLookup>,
    stat: Box<dyn FileStat>,
    date_format: String,
}

impl Default for Resolvers {
    fn default() -> Self {
        Self {
            formatter: Box::new(DateFormatter::default()),
            mime: Box::new(ExtensionMime),
            stat: Box::new(FsStat),
            date_format: FULL_DATE_FORMAT.to_string(),
        }
    }
}

impl Resolvers {
    /// Local-time formatter, `mime_guess` and the real filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_formatter(mut self, formatter: impl TimeFormatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    pub fn with_mime(mut self, mime: impl MimeLookup + 'static) -> Self {
        self.mime = Box::new(mime);
        self
    }

    pub fn with_stat(mut self, stat: impl FileStat + 'static) -> Self {
        self.stat = Box::new(stat);
        self
    }

    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Self {
        self.date_format = date_format.into();
        self
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    /// Modification time of `path`, or 0 when it cannot be read.
    pub fn modified_or_zero(&self, path: &Path) -> i64 {
        match self.stat.last_modified(path) {
            Ok(timestamp) => timestamp,
            Err(err) => {
                log::debug!("No modification time for {}: {}", path.display(), err);
                0
            }
        }
    }

    /// Formatted day for `timestamp`; empty when the timestamp is unknown.
    pub fn full_date(&self, timestamp: i64) -> String {
        self.label(timestamp, &self.date_format)
    }

    /// Formats `timestamp` with an arbitrary pattern; empty for 0.
    pub fn label(&self, timestamp: i64, pattern: &str) -> String {
        if timestamp == 0 {
            return String::new();
        }
        self.formatter.format(timestamp, pattern)
    }

    pub fn mime_type(&self, extension: &str) -> String {
        self.mime
            .lookup(extension)
            .unwrap_or_else(|| UNKNOWN_MIME_TYPE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    // 2024-01-01T00:00:00Z
    const NEW_YEAR: i64 = 1_704_067_200;

    #[test]
    fn test_utc_formatting() {
        let formatter = DateFormatter::utc();
        assert_eq!(formatter.format(NEW_YEAR, "%Y-%m-%d"), "2024-01-01");
        assert_eq!(formatter.format(NEW_YEAR, FULL_DATE_FORMAT), "Mon, January 1, 2024");
        assert_eq!(formatter.format(NEW_YEAR, MONTH_FORMAT), "January 2024");
    }

    #[test]
    fn test_extension_mime() {
        let mime = ExtensionMime;
        assert_eq!(mime.lookup("mp4").as_deref(), Some("video/mp4"));
        assert_eq!(mime.lookup("jpg").as_deref(), Some("image/jpeg"));
        assert_eq!(mime.lookup(""), None);
        assert_eq!(mime.lookup("notarealext"), None);
    }

    #[test]
    fn test_unknown_mime_falls_back() {
        let resolvers = Resolvers::new();
        assert_eq!(resolvers.mime_type(""), UNKNOWN_MIME_TYPE);
        assert_eq!(resolvers.mime_type("notarealext"), UNKNOWN_MIME_TYPE);
        assert_eq!(resolvers.mime_type("png"), "image/png");
    }

    #[test]
    fn test_fs_stat() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("a.jpg");
        File::create(&file_path).unwrap();
        filetime::set_file_mtime(&file_path, FileTime::from_unix_time(NEW_YEAR, 0)).unwrap();

        assert_eq!(FsStat.last_modified(&file_path).unwrap(), NEW_YEAR);
        assert!(FsStat.last_modified(dir.path()).is_err());
        assert!(FsStat.last_modified(&dir.path().join("missing.jpg")).is_err());
    }

    #[test]
    fn test_unknown_timestamp_has_no_label() {
        let resolvers = Resolvers::new().with_formatter(DateFormatter::utc());
        assert_eq!(resolvers.full_date(0), "");
        assert_eq!(resolvers.full_date(NEW_YEAR), "Mon, January 1, 2024");
        assert_eq!(resolvers.modified_or_zero(Path::new("/definitely/not/here")), 0);
    }
}
