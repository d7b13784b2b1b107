use crate::properties::PropertyStore;

/// HTTP request methods served by the daemon.
///
/// Any other method token is rejected by the parser before a handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a file or a directory listing
    GET,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// PUT - Create or replace a file
    PUT,
    /// POST - Add a new member to a collection directory
    POST,
    /// DELETE - Remove a file or an empty directory
    DELETE,
}

/// Represents a parsed HTTP request from a client.
///
/// Holds the request line and headers only. The body, if any, is still on
/// the connection and is read by the handler that needs it.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method
    pub method: Method,
    /// The request URI, always starting with "/"
    pub uri: String,
    /// HTTP version (e.g. "HTTP/1.0")
    pub version: String,
    /// Request headers in arrival order, duplicates kept
    pub headers: PropertyStore,
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// # Arguments
    ///
    /// * `s` - String representation of the method (case-sensitive, uppercase)
    ///
    /// # Returns
    ///
    /// `Some(Method)` if the string matches a served method, `None` otherwise.
    ///
    /// # Example
    ///
    /// ```
    /// # use docroot::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// assert_eq!(Method::from_str("OPTIONS"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "HEAD" => Some(Method::HEAD),
            "PUT" => Some(Method::PUT),
            "POST" => Some(Method::POST),
            "DELETE" => Some(Method::DELETE),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::PUT => "PUT",
            Method::POST => "POST",
            Method::DELETE => "DELETE",
        }
    }
}

impl Request {
    /// Retrieves the first value of a header, case-insensitively.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    /// The declared body length, or `None` when the header is absent.
    ///
    /// The parser rejects requests whose `Content-Length` is not a number, so
    /// a present header always parses here.
    pub fn content_length(&self) -> Option<u64> {
        self.header("Content-Length")
            .and_then(|v| v.trim().parse().ok())
    }
}
