//! Lexical mapping of request URIs onto the content root.

use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The URI climbs above the content root or contains a forbidden byte.
    Forbidden,
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Forbidden => write!(f, "path escapes the content root"),
        }
    }
}

impl std::error::Error for ResolveError {}

/// A filesystem path inside the content root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    path: PathBuf,
    uri: String,
    trailing_slash: bool,
}

impl ResolvedPath {
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// The normalized URI, without query, with the trailing "/" kept.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// True when the path is the content root itself.
    pub fn is_root(&self) -> bool {
        self.uri == "/"
    }

    /// True when the URI ended in "/", meaning the client asked for a
    /// directory.
    pub fn trailing_slash(&self) -> bool {
        self.trailing_slash
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path.display().to_string();
        if self.trailing_slash && !path.ends_with('/') {
            write!(f, "{}/", path)
        } else {
            write!(f, "{}", path)
        }
    }
}

#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps `uri` to a path under the root without touching the filesystem.
    ///
    /// Each segment is percent-decoded first. `.` and empty segments are
    /// dropped and `..` removes the previous segment. A `..` with nothing
    /// left to remove fails instead of clamping to the root, as does a
    /// segment that decodes to a `/`, a NUL byte or invalid UTF-8.
    ///
    /// # Example
    ///
    /// ```
    /// # use docroot::content::resolver::PathResolver;
    /// let resolver = PathResolver::new("/srv/content");
    /// let path = resolver.resolve("/docs/./a/../index.html").unwrap();
    /// assert_eq!(path.as_path(), std::path::Path::new("/srv/content/docs/index.html"));
    /// assert!(resolver.resolve("/../etc/passwd").is_err());
    /// ```
    pub fn resolve(&self, uri: &str) -> Result<ResolvedPath, ResolveError> {
        let path = uri
            .split(['?', '#'])
            .next()
            .unwrap_or_default();

        let mut segments: Vec<String> = Vec::new();
        for raw in path.split('/') {
            let segment = percent_decode(raw).ok_or(ResolveError::Forbidden)?;
            match segment.as_str() {
                "" | "." => continue,
                ".." => {
                    segments.pop().ok_or(ResolveError::Forbidden)?;
                    continue;
                }
                s if s.contains(['/', '\0']) => return Err(ResolveError::Forbidden),
                _ => {}
            }
            segments.push(segment);
        }

        let trailing_slash = path.ends_with('/');

        let mut normalized = format!("/{}", segments.join("/"));
        if trailing_slash && !normalized.ends_with('/') {
            normalized.push('/');
        }

        let mut resolved = self.root.clone();
        resolved.extend(segments);

        Ok(ResolvedPath {
            path: resolved,
            uri: normalized,
            trailing_slash,
        })
    }
}

/// Decodes `%XX` escapes. A `%` not followed by two hex digits is kept as
/// is. `None` when the result is not UTF-8.
fn percent_decode(segment: &str) -> Option<String> {
    let bytes = segment.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());

    let mut i = 0;
    while i < bytes.len() {
        let escaped = match bytes.get(i + 1..i + 3) {
            Some(&[hi, lo]) if bytes[i] == b'%' => hex_value(hi).zip(hex_value(lo)),
            _ => None,
        };
        match escaped {
            Some((hi, lo)) => {
                decoded.push(hi * 16 + lo);
                i += 3;
            }
            None => {
                decoded.push(bytes[i]);
                i += 1;
            }
        }
    }

    String::from_utf8(decoded).ok()
}

fn hex_value(digit: u8) -> Option<u8> {
    (digit as char).to_digit(16).map(|v| v as u8)
}
