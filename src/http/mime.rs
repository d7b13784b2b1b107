//! Media-type resolution from file names.
//!
//! The table is loaded from a `mime.types` style file where each line maps one
//! media type to any number of extensions:
//!
//! ```text
//! text/html	html htm
//! image/png	png
//! ```

use std::path::Path;

use anyhow::Context;

use crate::properties::PropertyStore;

/// Type returned for names ending in `/`.
pub const DIRECTORY_MEDIA_TYPE: &str = "text/directory";

/// Type returned when the extension is unknown or missing.
pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// Maps a file name to its media type.
pub trait MediaTypeResolver: Send + Sync {
    fn resolve<'a>(&'a self, filename: &str) -> &'a str;
}

/// Extension table backed by a [`PropertyStore`] of `extension -> type`.
#[derive(Debug, Clone, Default)]
pub struct MediaTypes {
    table: PropertyStore,
}

impl MediaTypes {
    /// Parses a media-type table. Each extension on a line becomes its own
    /// entry, lower-cased.
    pub fn parse(text: &str) -> Self {
        let mut table = PropertyStore::new();

        for line in text.lines() {
            let mut fields = line.split_whitespace();
            let Some(media_type) = fields.next() else {
                continue;
            };
            if media_type.starts_with('#') {
                continue;
            }
            for extension in fields {
                table.put(extension.to_ascii_lowercase(), media_type);
            }
        }

        Self { table }
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read media types from '{}'", path.display()))?;
        let types = Self::parse(&text);
        tracing::debug!(path = %path.display(), extensions = types.len(), "Loaded media types");
        Ok(types)
    }

    /// Number of extension mappings.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl MediaTypeResolver for MediaTypes {
    fn resolve<'a>(&'a self, filename: &str) -> &'a str {
        if filename.ends_with('/') {
            return DIRECTORY_MEDIA_TYPE;
        }

        let Some(extension) = Path::new(filename).extension().and_then(|e| e.to_str()) else {
            return DEFAULT_MEDIA_TYPE;
        };

        self.table
            .get(&extension.to_ascii_lowercase())
            .unwrap_or(DEFAULT_MEDIA_TYPE)
    }
}

/// Value for a `Content-type` header; `text/directory` is sent as `text/html`.
pub fn content_type_header(media_type: &str) -> &str {
    if media_type == DIRECTORY_MEDIA_TYPE {
        "text/html"
    } else {
        media_type
    }
}
