//! docroot - concurrent HTTP/1.x file server
//!
//! Serves GET/HEAD/PUT/POST/DELETE against a single content directory, one
//! request per connection, on a fixed pool of workers.

pub mod config;
pub mod content;
pub mod http;
pub mod properties;
pub mod server;
