//! Synthetic HTML index for directories requested with a trailing "/".
//!
//! Links are percent-encoded so that names with spaces, `#` or `?` resolve
//! back to the same entry.

use std::fmt::{self, Write as _};
use std::fs::Metadata;
use std::io;
use std::path::Path;
use std::time::SystemTime;

use crate::http::date::ShortDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
        }
    }
}

/// One row of a listing.
#[derive(Debug, Clone)]
pub struct ListingEntry {
    pub link: String,
    pub name: String,
    pub modified: SystemTime,
    pub size: u64,
    pub kind: EntryKind,
}

impl ListingEntry {
    fn new(link: String, name: String, meta: &Metadata) -> Self {
        let kind = if meta.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };

        Self {
            link,
            name,
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            size: if meta.is_dir() { 0 } else { meta.len() },
            kind,
        }
    }
}

/// Renders the listing of `dir`, requested as `uri`.
pub async fn list_directory(dir: &Path, uri: &str) -> io::Result<Vec<u8>> {
    let entries = read_entries(dir, uri).await?;
    Ok(render(uri, &entries).into_bytes())
}

/// Collects the rows for `dir` in enumeration order.
///
/// The parent entry comes first and is left out at the root URI. Entries
/// whose metadata cannot be read are skipped.
pub async fn read_entries(dir: &Path, uri: &str) -> io::Result<Vec<ListingEntry>> {
    let mut rows = Vec::new();

    if uri != "/" {
        let parent = tokio::fs::metadata(dir.join("..")).await?;
        rows.push(ListingEntry::new(
            "../".to_string(),
            "Parent Directory".to_string(),
            &parent,
        ));
    }

    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        // follow symlinks; a dangling link still gets a row from lstat
        let meta = match tokio::fs::metadata(entry.path()).await {
            Ok(meta) => meta,
            Err(_) => match entry.metadata().await {
                Ok(meta) => meta,
                Err(e) => {
                    tracing::debug!(entry = ?entry.path(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            },
        };

        let name = entry.file_name().to_string_lossy().into_owned();
        let link = if meta.is_dir() {
            format!("{}/", name)
        } else {
            name.clone()
        };

        rows.push(ListingEntry::new(link, name, &meta));
    }

    Ok(rows)
}

/// Renders rows into a complete HTML document.
pub fn render(uri: &str, entries: &[ListingEntry]) -> String {
    let uri = HtmlEscaped(uri);
    let mut html = String::new();

    let _ = write!(
        html,
        "<html>\n\
         <head><title>index of {uri}</title></head>\n\
         <body>\n\
         <h1>Index of {uri}</h1>\n\
         <table>\n\
         <tr>\n\
         <th valign=\"top\"></th>\n\
         <th>Name</th>\n\
         <th>Last modified</th>\n\
         <th>Size</th>\n\
         <th>Description (file type)</th>\n\
         </tr>\n\
         <tr>\n\
         <td colspan=\"5\"><hr></td>\n\
         </tr>\n"
    );

    for entry in entries {
        let _ = write!(
            html,
            "<tr>\n\
             <td></td>\n\
             <td><a href=\"{}\">{}</a></td>\n\
             <td align=\"right\">{}</td>\n\
             <td align=\"right\">{}</td>\n\
             <td align=\"right\">{}</td>\n\
             <td></td>\n\
             </tr>\n",
            UrlEncoded(&entry.link),
            HtmlEscaped(&entry.name),
            ShortDate(entry.modified),
            entry.size,
            entry.kind.label(),
        );
    }

    html.push_str(
        "<tr><td colspan=\"5\"><hr></td></tr>\n\
         </table>\n\
         </body>\n\
         </html>\n",
    );

    html
}

/// Percent-encodes everything but unreserved characters and `/`.
struct UrlEncoded<'a>(&'a str);

impl fmt::Display for UrlEncoded<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0.bytes() {
            if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~' | b'/') {
                f.write_char(b as char)?;
            } else {
                write!(f, "%{:02X}", b)?;
            }
        }
        Ok(())
    }
}

struct HtmlEscaped<'a>(&'a str);

impl fmt::Display for HtmlEscaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '<' => f.write_str("&lt;")?,
                '>' => f.write_str("&gt;")?,
                '&' => f.write_str("&amp;")?,
                '"' => f.write_str("&quot;")?,
                '\'' => f.write_str("&#39;")?,
                c => f.write_char(c)?,
            }
        }
        Ok(())
    }
}
