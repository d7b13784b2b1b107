use std::fmt;

use crate::http::request::{Method, Request};
use crate::properties::PropertyStore;

/// Upper bound on the request line plus headers.
pub const MAX_HEADER_BYTES: usize = 16 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The blank line ending the header block has not arrived yet.
    Incomplete,
    /// Request line is not `METHOD SP URI SP VERSION`.
    InvalidRequest,
    /// Well-formed method token that is not served.
    UnsupportedMethod(String),
    /// URI does not start with "/".
    InvalidUri,
    InvalidHeader,
    InvalidContentLength,
    /// Header block exceeds [`MAX_HEADER_BYTES`].
    HeadersTooLarge,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Incomplete => write!(f, "incomplete request"),
            ParseError::InvalidRequest => write!(f, "malformed request line"),
            ParseError::UnsupportedMethod(m) => write!(f, "unsupported method '{}'", m),
            ParseError::InvalidUri => write!(f, "request URI must start with '/'"),
            ParseError::InvalidHeader => write!(f, "malformed header line"),
            ParseError::InvalidContentLength => write!(f, "invalid Content-Length"),
            ParseError::HeadersTooLarge => write!(f, "header block too large"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parses the request line and headers at the start of `buf`.
///
/// Returns the request and the number of bytes it occupied. Anything after
/// that (the body) is left to the caller.
pub fn parse_http_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    let Some(headers_end) = find_headers_end(buf) else {
        if buf.len() > MAX_HEADER_BYTES {
            return Err(ParseError::HeadersTooLarge);
        }
        return Err(ParseError::Incomplete);
    };
    if headers_end > MAX_HEADER_BYTES {
        return Err(ParseError::HeadersTooLarge);
    }

    let headers_str = std::str::from_utf8(&buf[..headers_end])
        .map_err(|_| ParseError::InvalidRequest)?;

    let mut lines = headers_str.split("\r\n");

    // Request line
    let request_line = lines.next().ok_or(ParseError::InvalidRequest)?;
    let mut parts = request_line.split_whitespace();

    let method_str = parts.next().ok_or(ParseError::InvalidRequest)?;
    let uri = parts.next().ok_or(ParseError::InvalidRequest)?;
    let version = parts.next().ok_or(ParseError::InvalidRequest)?;

    if parts.next().is_some() || !version.starts_with("HTTP/") {
        return Err(ParseError::InvalidRequest);
    }

    let method = Method::from_str(method_str)
        .ok_or_else(|| ParseError::UnsupportedMethod(method_str.to_string()))?;

    if !uri.starts_with('/') {
        return Err(ParseError::InvalidUri);
    }

    // Headers
    let mut headers = PropertyStore::new();

    for line in lines {
        if line.is_empty() {
            continue;
        }

        let (key, value) = line
            .split_once(':')
            .ok_or(ParseError::InvalidHeader)?;

        let key = key.trim();
        if key.is_empty() {
            return Err(ParseError::InvalidHeader);
        }

        headers.put(key, value.trim());
    }

    if let Some(len) = headers.get("Content-Length") {
        len.parse::<u64>()
            .map_err(|_| ParseError::InvalidContentLength)?;
    }

    let request = Request {
        method,
        uri: uri.to_string(),
        version: version.to_string(),
        headers,
    };

    Ok((request, headers_end + 4))
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|w| w == b"\r\n\r\n")
}
