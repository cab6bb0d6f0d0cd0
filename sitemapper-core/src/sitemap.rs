// Sitemap protocol output (https://www.sitemaps.org/protocol.html)

use crate::error::SitemapError;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// A sitemap ready to be written: one `<url>` entry per URL, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SitemapDocument {
    entries: Vec<String>,
}

/// Builds the document for a set of URLs.
///
/// Entries are sorted by their byte order and duplicates collapse, so the
/// output depends only on the set, never on discovery order.
pub fn serialize<I, S>(urls: I) -> SitemapDocument
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut entries: Vec<String> = urls.into_iter().map(Into::into).collect();
    entries.sort_unstable();
    entries.dedup();
    SitemapDocument { entries }
}

impl SitemapDocument {
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_xml(&self) -> String {
        self.to_string()
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        write!(writer, "{}", self)?;
        writer.flush()
    }
}

impl fmt::Display for SitemapDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", XML_HEADER)?;
        writeln!(f, r#"<urlset xmlns="{}">"#, SITEMAP_NAMESPACE)?;
        for url in &self.entries {
            writeln!(f, "  <url>")?;
            writeln!(f, "    <loc>{}</loc>", escape_xml(url))?;
            writeln!(f, "  </url>")?;
        }
        write!(f, "</urlset>")
    }
}

/// Writes the sitemap to `path`, replacing any existing file.
pub fn write_sitemap(document: &SitemapDocument, path: &Path) -> Result<(), SitemapError> {
    let to_error = |source| SitemapError::Write {
        destination: path.display().to_string(),
        source,
    };

    let file = File::create(path).map_err(to_error)?;
    document.write_to(BufWriter::new(file)).map_err(to_error)?;

    debug!("Wrote {} sitemap entries to {}", document.len(), path.display());
    Ok(())
}

pub fn escape_xml(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
