//! Filesystem side of the server.
//!
//! - **`resolver`**: maps request URIs onto the content root, failing closed
//!   on traversal
//! - **`handlers`**: one state machine per method over filesystem outcomes
//! - **`listing`**: HTML index of a directory for GET/HEAD

pub mod handlers;
pub mod listing;
pub mod resolver;

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::http::mime::MediaTypeResolver;

pub use resolver::{PathResolver, ResolveError, ResolvedPath};

/// Everything a handler needs to serve a request, shared by all workers.
#[derive(Clone)]
pub struct Context {
    pub resolver: PathResolver,
    pub media: Arc<dyn MediaTypeResolver>,
    /// Value of the `Server` response header.
    pub server_name: String,
    /// Protocol written in the status line.
    pub protocol: String,
}

impl Context {
    pub fn from_config(cfg: &ServerConfig) -> Self {
        Self {
            resolver: PathResolver::new(cfg.content_root.clone()),
            media: Arc::new(cfg.media_types.clone()),
            server_name: cfg.server_name.clone(),
            protocol: cfg.server_protocol.clone(),
        }
    }
}
