use tokio::fs::File;

use crate::properties::PropertyStore;

/// HTTP status codes produced by the server.
///
/// - `Ok` (200): Request successful
/// - `Created` (201): File or collection member created
/// - `BadRequest` (400): Malformed request or truncated body
/// - `Forbidden` (403): URI escapes the content root
/// - `NotFound` (404): Resource missing or not servable
/// - `MethodNotAllowed` (405): Operation refused for this resource
/// - `LengthRequired` (411): PUT/POST without Content-Length
/// - `InternalServerError` (500): Server error
/// - `NotImplemented` (501): Method not served
/// - `ServiceUnavailable` (503): Pending queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 201 Created
    Created,
    /// 400 Bad Request
    BadRequest,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
    /// 411 Length Required
    LengthRequired,
    /// 500 Internal Server Error
    InternalServerError,
    /// 501 Not Implemented
    NotImplemented,
    /// 503 Service Unavailable
    ServiceUnavailable,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use docroot::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::LengthRequired.as_u16(), 411);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::Created => 201,
            StatusCode::BadRequest => 400,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::LengthRequired => 411,
            StatusCode::InternalServerError => 500,
            StatusCode::NotImplemented => 501,
            StatusCode::ServiceUnavailable => 503,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use docroot::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::LengthRequired => "Length Required",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
            StatusCode::ServiceUnavailable => "Service Unavailable",
        }
    }
}

/// Response payload.
#[derive(Debug, Default)]
pub enum Body {
    /// No bytes follow the headers.
    #[default]
    Empty,
    /// Bytes rendered in memory, such as a directory listing.
    Bytes(Vec<u8>),
    /// Exactly `len` bytes streamed from an open file.
    File { file: File, len: u64 },
}

impl Body {
    /// Number of bytes the body will write.
    pub fn len(&self) -> u64 {
        match self {
            Body::Empty => 0,
            Body::Bytes(bytes) => bytes.len() as u64,
            Body::File { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Represents a complete HTTP response ready to be sent to a client.
#[derive(Debug)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// HTTP headers in the order they will be written
    pub headers: PropertyStore,
    /// Response body
    pub body: Body,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-type", "text/html")
///     .bytes(b"<html></html>".to_vec())
///     .build();
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    headers: PropertyStore,
    body: Body,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: PropertyStore::new(),
            body: Body::Empty,
        }
    }

    /// Appends a header. Repeated names are written once per call.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.put(key, value);
        self
    }

    /// Sets an in-memory body.
    pub fn bytes(mut self, body: Vec<u8>) -> Self {
        self.body = Body::Bytes(body);
        self
    }

    /// Streams `len` bytes of `file` as the body.
    pub fn file(mut self, file: File, len: u64) -> Self {
        self.body = Body::File { file, len };
        self
    }

    /// Builds the final Response.
    ///
    /// Adds `Content-Length` from the body unless one was set explicitly, as
    /// HEAD responses do to announce a body they never send.
    pub fn build(mut self) -> Response {
        if !self.headers.contains_key("Content-Length") {
            self.headers.put("Content-Length", self.body.len().to_string());
        }

        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Response {
    /// A response with the given status, no body and `Content-Length: 0`.
    pub fn status(status: StatusCode) -> Self {
        ResponseBuilder::new(status).build()
    }

    pub fn ok() -> Self {
        Self::status(StatusCode::Ok)
    }

    /// 201 with `Location` pointing at the created resource.
    pub fn created(location: impl Into<String>) -> Self {
        ResponseBuilder::new(StatusCode::Created)
            .header("Location", location)
            .build()
    }

    pub fn bad_request() -> Self {
        Self::status(StatusCode::BadRequest)
    }

    pub fn forbidden() -> Self {
        Self::status(StatusCode::Forbidden)
    }

    pub fn not_found() -> Self {
        Self::status(StatusCode::NotFound)
    }

    pub fn method_not_allowed() -> Self {
        Self::status(StatusCode::MethodNotAllowed)
    }

    pub fn length_required() -> Self {
        Self::status(StatusCode::LengthRequired)
    }

    pub fn not_implemented() -> Self {
        Self::status(StatusCode::NotImplemented)
    }

    pub fn service_unavailable() -> Self {
        Self::status(StatusCode::ServiceUnavailable)
    }

    /// Looks up a response header, case-insensitively.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }
}
