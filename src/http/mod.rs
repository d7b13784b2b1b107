//! HTTP protocol implementation.
//!
//! This module implements the HTTP/1.x side of the server: one request per
//! connection, no keep-alive, no chunked encoding.
//!
//! # Architecture
//!
//! The HTTP layer is organized into several submodules:
//!
//! - **`connection`**: The per-connection state machine driving a request to its response
//! - **`parser`**: Parses the request line and headers from a byte buffer
//! - **`request`**: HTTP request representation
//! - **`response`**: HTTP response representation with builder pattern
//! - **`writer`**: Serializes and writes HTTP responses to the client
//! - **`mime`**: Media type detection based on file extensions
//! - **`date`**: Date formats used in headers and listings
//!
//! # Connection State Machine
//!
//! Each client connection goes through a state machine exactly once:
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for request line and headers
//!        └──────┬──────┘
//!               │ Request parsed        (malformed → error response)
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Run the method handler, reading the body if any
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send status, headers, body
//!        └──────┬───────────┘
//!               │ Response sent
//!               ▼
//!        ┌──────────────────┐
//!        │     Closed       │ ← Shut the stream down
//!        └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use docroot::config::ServerConfig;
//! use docroot::content::Context;
//! use docroot::http::connection::Connection;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ctx = Arc::new(Context::from_config(&ServerConfig::new("/srv/content")));
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!
//!     loop {
//!         let (socket, _addr) = listener.accept().await?;
//!         let ctx = ctx.clone();
//!         tokio::spawn(async move {
//!             let mut conn = Connection::new(socket, ctx);
//!             if let Err(e) = conn.run().await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod request;
pub mod response;
pub mod parser;
pub mod connection;
pub mod writer;
pub mod mime;
pub mod date;
