//! Server configuration.
//!
//! Loaded once at startup from a property file and never changed afterwards:
//!
//! ```text
//! # httpd.conf
//! Debug: true
//! ServerRoot: .
//! Port: 8080
//! ContentBase: content
//! ServerHost: localhost
//! ContentTypes: mime.types
//! Workers: 4
//! ```
//!
//! `ServerRoot` is relative to the directory holding the file; `ContentBase`
//! and `ContentTypes` are relative to `ServerRoot`.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};

use crate::http::mime::MediaTypes;
use crate::properties::PropertyStore;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_CONTENT_BASE: &str = "content";
pub const DEFAULT_CONTENT_TYPES: &str = "mime.types";
pub const DEFAULT_SERVER_HOST: &str = "localhost";
pub const DEFAULT_SERVER_PROTOCOL: &str = "HTTP/1.1";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub debug: bool,
    pub server_root: PathBuf,
    /// Absolute directory served as "/".
    pub content_root: PathBuf,
    pub server_host: String,
    pub port: u16,
    pub server_name: String,
    pub server_protocol: String,
    pub media_types: MediaTypes,
    /// Number of connections served at the same time.
    pub workers: usize,
    /// Bound on accepted connections waiting for a worker; `None` is unbounded.
    pub max_pending: Option<usize>,
}

impl ServerConfig {
    /// Defaults serving `content_root`, with an empty media-type table.
    pub fn new(content_root: impl Into<PathBuf>) -> Self {
        let content_root = content_root.into();
        Self {
            debug: false,
            server_root: content_root.clone(),
            content_root,
            server_host: DEFAULT_SERVER_HOST.to_string(),
            port: DEFAULT_PORT,
            server_name: format!("{}:{}", DEFAULT_SERVER_HOST, DEFAULT_PORT),
            server_protocol: DEFAULT_SERVER_PROTOCOL.to_string(),
            media_types: MediaTypes::default(),
            workers: DEFAULT_WORKERS,
            max_pending: None,
        }
    }

    /// Reads the configuration file at `path`.
    ///
    /// Fails on a missing file, an invalid port or worker setting, an
    /// unreadable media-type table or a missing content directory.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let props = PropertyStore::load(path)?;
        let base = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        Self::from_properties(&props, base)
    }

    /// Builds a configuration from already parsed properties, resolving
    /// relative paths against `base`.
    pub fn from_properties(props: &PropertyStore, base: &Path) -> anyhow::Result<Self> {
        let debug = props
            .get("Debug")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));

        let server_root = base.join(props.get("ServerRoot").unwrap_or("."));
        if !server_root.is_dir() {
            bail!("ServerRoot '{}' is not a directory", server_root.display());
        }

        let port = match props.get("Port") {
            Some(value) => parse_port(value)?,
            None => DEFAULT_PORT,
        };

        let content_base = server_root.join(props.get("ContentBase").unwrap_or(DEFAULT_CONTENT_BASE));
        let content_root = content_base
            .canonicalize()
            .with_context(|| format!("ContentBase '{}' not found", content_base.display()))?;
        if !content_root.is_dir() {
            bail!("ContentBase '{}' is not a directory", content_root.display());
        }

        let server_host = props.get("ServerHost").unwrap_or(DEFAULT_SERVER_HOST).to_string();
        let server_name = props
            .get("ServerName")
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}:{}", server_host, port));
        let server_protocol = props
            .get("ServerProtocol")
            .unwrap_or(DEFAULT_SERVER_PROTOCOL)
            .to_string();

        let media_types =
            MediaTypes::load(server_root.join(props.get("ContentTypes").unwrap_or(DEFAULT_CONTENT_TYPES)))?;

        let workers = match props.get("Workers") {
            Some(value) => parse_positive("Workers", value)?,
            None => DEFAULT_WORKERS,
        };
        let max_pending = props
            .get("MaxPending")
            .map(|value| parse_positive("MaxPending", value))
            .transpose()?;

        Ok(Self {
            debug,
            server_root,
            content_root,
            server_host,
            port,
            server_name,
            server_protocol,
            media_types,
            workers,
            max_pending,
        })
    }

    /// Address the listener binds: every interface on the configured port.
    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

/// Accepts registered (non-system, non-ephemeral) ports only.
fn parse_port(value: &str) -> anyhow::Result<u16> {
    match value.trim().parse::<u16>() {
        Ok(port) if (1024..=49151).contains(&port) => Ok(port),
        _ => bail!("Invalid port {}", value),
    }
}

fn parse_positive(key: &str, value: &str) -> anyhow::Result<usize> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => bail!("Invalid {} {}: must be a positive integer", key, value),
    }
}
