#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use docroot::config::ServerConfig;
use docroot::content::Context;
use docroot::http::connection::Connection;
use docroot::http::mime::MediaTypes;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub const MIME_TYPES: &str = "\
# test table
text/html\thtml htm
text/plain\ttxt
image/png\tpng
application/json\tjson
";

/// A temporary content root with a server context pointing at it.
pub struct Site {
    _dir: TempDir,
    pub cfg: ServerConfig,
    pub ctx: Arc<Context>,
}

impl Site {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();

        let mut cfg = ServerConfig::new(root);
        cfg.media_types = MediaTypes::parse(MIME_TYPES);
        let ctx = Arc::new(Context::from_config(&cfg));

        Self { _dir: dir, cfg, ctx }
    }

    pub fn root(&self) -> &Path {
        &self.cfg.content_root
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn write(&self, rel: &str, contents: &[u8]) {
        let path = self.path(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    pub fn mkdir(&self, rel: &str) {
        std::fs::create_dir_all(self.path(rel)).unwrap();
    }

    pub async fn send(&self, raw: &[u8]) -> RawResponse {
        exchange(self.ctx.clone(), raw).await
    }
}

/// Runs one connection over an in-memory pipe: writes `raw`, closes the
/// write side and collects everything the server sends back.
pub async fn exchange(ctx: Arc<Context>, raw: &[u8]) -> RawResponse {
    let bytes = exchange_raw(ctx, raw).await;
    RawResponse::parse(&bytes)
}

pub async fn exchange_raw(ctx: Arc<Context>, raw: &[u8]) -> Vec<u8> {
    let (mut client, server) = tokio::io::duplex(1 << 16);

    let task = tokio::spawn(async move {
        let mut conn = Connection::new(server, ctx);
        conn.run().await
    });

    // the server may answer and hang up before reading everything
    let _ = client.write_all(raw).await;
    let _ = client.shutdown().await;

    let mut out = Vec::new();
    client.read_to_end(&mut out).await.unwrap();
    task.await.unwrap().unwrap();
    out
}

#[derive(Debug)]
pub struct RawResponse {
    pub status_line: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn parse(bytes: &[u8]) -> Self {
        let end = bytes
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .expect("response has a header block");
        let head = std::str::from_utf8(&bytes[..end]).unwrap();
        let mut lines = head.split("\r\n");

        let status_line = lines.next().unwrap().to_string();
        let status = status_line
            .split_whitespace()
            .nth(1)
            .unwrap()
            .parse()
            .unwrap();

        let headers = lines
            .map(|line| {
                let (k, v) = line.split_once(": ").unwrap();
                (k.to_string(), v.to_string())
            })
            .collect();

        Self {
            status_line,
            status,
            headers,
            body: bytes[end + 4..].to_vec(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub fn request(method: &str, uri: &str) -> Vec<u8> {
    format!("{} {} HTTP/1.0\r\nHost: localhost\r\n\r\n", method, uri).into_bytes()
}

pub fn request_with_body(method: &str, uri: &str, content_type: &str, body: &[u8]) -> Vec<u8> {
    let mut raw = format!(
        "{} {} HTTP/1.0\r\nHost: localhost\r\nContent-type: {}\r\nContent-Length: {}\r\n\r\n",
        method,
        uri,
        content_type,
        body.len()
    )
    .into_bytes();
    raw.extend_from_slice(body);
    raw
}
