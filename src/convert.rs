//! Conversion of common file formats to indexable text.
//!
//! [`MimeConverter::convert`] reads a file, decides its MIME type (from an
//! explicit hint, an extension hint such as `".html"`, or the file's own
//! extension) and extracts a title and body. Supported types:
//!
//! - `text/plain` (body is the file content)
//! - `text/markdown` (title is the first `# ` heading)
//! - `text/html` (title, author and keywords from the head, body with markup stripped)
//! - `text/csv` (body is the cells joined by spaces)

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ConversionStatus, FolioError, Result};

/// Default number of characters kept in [`Converted::sample`].
pub const DEFAULT_SAMPLE_SIZE: usize = 512;

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title\s*>").unwrap());
static META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<meta\s+[^>]*name\s*=\s*["']?([a-z-]+)["']?[^>]*content\s*=\s*["']([^"']*)["'][^>]*>"#)
        .unwrap()
});
static SKIP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|head)\b[^>]*>.*?</(script|style|head)\s*>|<!--.*?-->").unwrap()
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Text extracted from a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Converted {
    pub title: String,
    pub body: String,
    pub author: String,
    pub keywords: String,
    /// The start of the body, cut at a word boundary.
    pub sample: String,
    pub mime_type: String,
    /// CRC-32 of the raw file bytes, as lower-case hex.
    pub checksum: String,
}

/// Converts files to [`Converted`] text.
#[derive(Debug, Clone)]
pub struct MimeConverter {
    sample_size: usize,
    mime_map: BTreeMap<String, String>,
    ignored: BTreeSet<String>,
}

impl MimeConverter {
    pub fn new() -> Self {
        let mime_map = [
            ("txt", "text/plain"),
            ("text", "text/plain"),
            ("md", "text/markdown"),
            ("markdown", "text/markdown"),
            ("html", "text/html"),
            ("htm", "text/html"),
            ("shtml", "text/html"),
            ("xhtml", "text/html"),
            ("csv", "text/csv"),
        ]
        .into_iter()
        .map(|(ext, mime)| (ext.to_string(), mime.to_string()))
        .collect();

        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            mime_map,
            ignored: BTreeSet::new(),
        }
    }

    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Map a file extension (without the dot) to a MIME type.
    pub fn set_mime_type(&mut self, extension: &str, mime_type: &str) {
        self.mime_map
            .insert(extension.trim_start_matches('.').to_lowercase(), mime_type.to_lowercase());
    }

    /// Refuse files with this extension.
    pub fn ignore_extension(&mut self, extension: &str) {
        self.ignored
            .insert(extension.trim_start_matches('.').to_lowercase());
    }

    /// Resolve the MIME type for `path` given an optional hint.
    ///
    /// A hint starting with `.` is looked up as an extension; any other
    /// hint is taken as the MIME type itself.
    pub fn mime_type_for(&self, path: &Path, hint: Option<&str>) -> Result<String> {
        let extension = match hint {
            Some(hint) if !hint.starts_with('.') => return Ok(hint.to_lowercase()),
            Some(hint) => hint.trim_start_matches('.').to_lowercase(),
            None => path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_lowercase)
                .unwrap_or_default(),
        };

        if self.ignored.contains(&extension) {
            return Err(FolioError::conversion(
                ConversionStatus::Ignore,
                format!("extension .{extension} is ignored"),
            ));
        }

        self.mime_map.get(&extension).cloned().ok_or_else(|| {
            FolioError::conversion(
                ConversionStatus::Type,
                format!("no MIME type known for {}", path.display()),
            )
        })
    }

    /// Read and convert `path` on the blocking thread pool.
    pub async fn convert(&self, path: impl AsRef<Path>, hint: Option<&str>) -> Result<Converted> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let mime_type = self.mime_type_for(&path, hint)?;
        let converter = self.clone();
        tokio::task::spawn_blocking(move || converter.convert_blocking(&path, mime_type)).await?
    }

    fn convert_blocking(&self, path: &Path, mime_type: String) -> Result<Converted> {
        let bytes = std::fs::read(path).map_err(|e| {
            FolioError::conversion(
                ConversionStatus::Filename,
                format!("cannot read {}: {e}", path.display()),
            )
        })?;
        let checksum = format!("{:08x}", crc32fast::hash(&bytes));

        let text = String::from_utf8(bytes).map_err(|_| {
            FolioError::conversion(
                ConversionStatus::Filter,
                format!("{} is not valid UTF-8", path.display()),
            )
        })?;

        let mut converted = match mime_type.as_str() {
            "text/plain" => Converted {
                body: text,
                ..Converted::default()
            },
            "text/markdown" => convert_markdown(&text),
            "text/html" => convert_html(&text),
            "text/csv" => convert_csv(&text).map_err(|e| {
                FolioError::conversion(
                    ConversionStatus::Filter,
                    format!("cannot parse {} as CSV: {e}", path.display()),
                )
            })?,
            other => {
                return Err(FolioError::conversion(
                    ConversionStatus::Type,
                    format!("unsupported MIME type {other}"),
                ));
            }
        };

        converted.sample = make_sample(&converted.body, self.sample_size);
        converted.mime_type = mime_type;
        converted.checksum = checksum;
        Ok(converted)
    }
}

impl Default for MimeConverter {
    fn default() -> Self {
        Self::new()
    }
}

fn collapse_whitespace(text: &str) -> String {
    SPACE_RE.replace_all(text.trim(), " ").into_owned()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn convert_html(html: &str) -> Converted {
    let title = TITLE_RE
        .captures(html)
        .map(|c| collapse_whitespace(&decode_entities(&c[1])))
        .unwrap_or_default();

    let mut author = String::new();
    let mut keywords = String::new();
    for cap in META_RE.captures_iter(html) {
        match cap[1].to_lowercase().as_str() {
            "author" => author = decode_entities(&cap[2]),
            "keywords" => keywords = decode_entities(&cap[2]),
            _ => {}
        }
    }

    let without_skipped = SKIP_RE.replace_all(html, " ");
    let without_tags = TAG_RE.replace_all(&without_skipped, " ");
    let body = collapse_whitespace(&decode_entities(&without_tags));

    Converted {
        title,
        body,
        author,
        keywords,
        ..Converted::default()
    }
}

fn convert_markdown(text: &str) -> Converted {
    let title = text
        .lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|t| t.trim().to_string())
        .unwrap_or_default();
    Converted {
        title,
        body: text.to_string(),
        ..Converted::default()
    }
}

fn convert_csv(text: &str) -> std::result::Result<Converted, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut cells = Vec::new();
    for record in reader.records() {
        let record = record?;
        cells.extend(
            record
                .iter()
                .map(str::trim)
                .filter(|cell| !cell.is_empty())
                .map(str::to_string),
        );
    }

    Ok(Converted {
        body: cells.join(" "),
        ..Converted::default()
    })
}

/// First `size` characters of `body`, cut back to the last whole word.
fn make_sample(body: &str, size: usize) -> String {
    let body = collapse_whitespace(body);
    if body.chars().count() <= size {
        return body;
    }
    let cut: String = body.chars().take(size).collect();
    match cut.rfind(' ') {
        Some(pos) if pos > 0 => format!("{}...", &cut[..pos]),
        _ => format!("{cut}..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HTML: &str = r#"<html><head><title>Mime &amp; Test</title>
        <meta name="author" content="Liam">
        <meta name="keywords" content="search, node">
        <style>p { color: red }</style></head>
        <body><h1>Heading</h1><p>Some <b>body</b> text.</p>
        <script>var hidden = 1;</script></body></html>"#;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_convert_html() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "mime-test.html", HTML);

        let converted = MimeConverter::new().convert(&path, None).await.unwrap();
        assert_eq!(converted.title, "Mime & Test");
        assert_eq!(converted.body, "Heading Some body text.");
        assert_eq!(converted.author, "Liam");
        assert_eq!(converted.keywords, "search, node");
        assert_eq!(converted.mime_type, "text/html");
        assert_eq!(converted.checksum.len(), 8);
    }

    #[tokio::test]
    async fn test_convert_csv_with_extension_hint() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "data.dat", "name,colour\nalpha,red\nbeta,\n");

        let converted = MimeConverter::new()
            .convert(&path, Some(".csv"))
            .await
            .unwrap();
        assert_eq!(converted.body, "name colour alpha red beta");
        assert_eq!(converted.mime_type, "text/csv");
    }

    #[tokio::test]
    async fn test_convert_markdown_title() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "notes.md", "intro\n# Gulf Stream\nwaters");

        let converted = MimeConverter::new().convert(&path, None).await.unwrap();
        assert_eq!(converted.title, "Gulf Stream");
    }

    #[tokio::test]
    async fn test_unknown_type() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "image.xyz", "binary");

        let err = MimeConverter::new().convert(&path, None).await.unwrap_err();
        assert!(matches!(
            err,
            FolioError::Conversion {
                status: ConversionStatus::Type,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = MimeConverter::new()
            .convert("/definitely/not/here.txt", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FolioError::Conversion {
                status: ConversionStatus::Filename,
                ..
            }
        ));
    }

    #[test]
    fn test_ignored_extension() {
        let mut converter = MimeConverter::new();
        converter.ignore_extension(".txt");
        let err = converter
            .mime_type_for(Path::new("a.txt"), None)
            .unwrap_err();
        assert!(matches!(
            err,
            FolioError::Conversion {
                status: ConversionStatus::Ignore,
                ..
            }
        ));
    }

    #[test]
    fn test_explicit_mime_hint_wins() {
        let converter = MimeConverter::new();
        assert_eq!(
            converter
                .mime_type_for(Path::new("a.bin"), Some("Text/Plain"))
                .unwrap(),
            "text/plain"
        );
    }

    #[test]
    fn test_sample_cuts_at_word() {
        assert_eq!(make_sample("alpha beta gamma", 12), "alpha beta...");
        assert_eq!(make_sample("short", 12), "short");
    }
}
