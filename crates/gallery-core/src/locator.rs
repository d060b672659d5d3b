use url::Url;

/// A content locator that resolved to a filesystem path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator<'a> {
    raw: &'a str,
    path: String,
}

impl<'a> Locator<'a> {
    /// Resolve the filesystem path behind `raw`.
    ///
    /// `file://` URIs and bare paths resolve; provider URIs such as
    /// `content://media/9999` name no file and yield `None`, as does any
    /// locator whose path has no non-empty segment.
    pub fn parse(raw: &'a str) -> Option<Self> {
        let path = resolve_path(raw)?;
        if !path.split('/').any(|segment| !segment.is_empty()) {
            return None;
        }
        Some(Self { raw, path })
    }

    pub fn as_str(&self) -> &'a str {
        self.raw
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last segment of the path. Empty for a trailing slash.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or("")
    }

    /// Text after the last `.` of the file name, or empty if there is none.
    pub fn extension(&self) -> &str {
        self.file_name()
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or("")
    }
}

fn resolve_path(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    match Url::parse(raw) {
        Ok(url) if url.scheme() == "file" => Some(
            url.to_file_path()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_else(|_| url.path().to_string()),
        ),
        Ok(_) => None,
        Err(url::ParseError::RelativeUrlWithoutBase) => Some(raw.to_string()),
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_uri() {
        let loc = Locator::parse("file:///sdcard/app/x.mp4").unwrap();
        assert_eq!(loc.path(), "/sdcard/app/x.mp4");
        assert_eq!(loc.file_name(), "x.mp4");
        assert_eq!(loc.extension(), "mp4");
        assert_eq!(loc.as_str(), "file:///sdcard/app/x.mp4");
    }

    #[test]
    fn test_percent_encoded_file_uri() {
        let loc = Locator::parse("file:///sdcard/DCIM/my%20pic.jpeg").unwrap();
        assert_eq!(loc.path(), "/sdcard/DCIM/my pic.jpeg");
        assert_eq!(loc.file_name(), "my pic.jpeg");
    }

    #[test]
    fn test_bare_path() {
        let loc = Locator::parse("/storage/emulated/0/Pictures/a.png").unwrap();
        assert_eq!(loc.path(), "/storage/emulated/0/Pictures/a.png");
        assert_eq!(loc.extension(), "png");
    }

    #[test]
    fn test_no_path() {
        assert!(Locator::parse("content://media/9999").is_none());
        assert!(Locator::parse("https://example.com/a.jpg").is_none());
        assert!(Locator::parse("").is_none());
        assert!(Locator::parse("/").is_none());
        assert!(Locator::parse("file:///").is_none());
    }

    #[test]
    fn test_missing_extension() {
        assert_eq!(Locator::parse("/a/README").unwrap().extension(), "");
        assert_eq!(Locator::parse("/a/photo.").unwrap().extension(), "");
        assert_eq!(Locator::parse("/a.d/photo").unwrap().extension(), "");
    }
}
