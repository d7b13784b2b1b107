//! Method handlers.
//!
//! Each handler resolves the request URI, inspects the filesystem and walks
//! a small decision tree to a terminal [`Response`]. Failures never escape as
//! errors; they become 4xx responses where they are detected.
//!
//! ```text
//! GET/HEAD  missing ─────────────────────────────► 404
//!           directory + "/" ─► listing ──────────► 200
//!           directory, no "/" ───────────────────► 405
//!           regular file ────────────────────────► 200 (+ body for GET)
//!
//! PUT       no Content-Length ───────────────────► 411
//!           directory / special file ────────────► 405
//!           regular file ─► overwrite ───────────► 200
//!           missing ─► mkdir -p, create ─────────► 201 + Location
//!
//! POST      no Content-Length ───────────────────► 411
//!           "/" suffix or not a directory ───────► 405
//!           collection ─► new unique member ─────► 201 + Location
//!
//! DELETE    missing ─────────────────────────────► 404
//!           non-empty directory ─────────────────► 405
//!           file / empty directory ─► remove ────► 200
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};

use crate::content::listing;
use crate::content::resolver::ResolvedPath;
use crate::content::Context;
use crate::http::date::HttpDate;
use crate::http::mime::content_type_header;
use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};

/// Random characters in a generated collection member name.
pub const MEMBER_NAME_LEN: usize = 10;

/// Runs the handler for `request.method`.
///
/// `body` yields the request body; PUT and POST read exactly
/// `Content-Length` bytes from it.
pub async fn handle<B>(request: &Request, body: &mut B, ctx: &Context) -> Response
where
    B: AsyncRead + Unpin,
{
    let target = match ctx.resolver.resolve(&request.uri) {
        Ok(target) => target,
        Err(e) => {
            warn!(uri = %request.uri, error = %e, "Rejected request URI");
            return Response::forbidden();
        }
    };

    match request.method {
        Method::GET => get_or_head(&target, ctx, true).await,
        Method::HEAD => get_or_head(&target, ctx, false).await,
        Method::PUT => put(request, &target, body).await,
        Method::POST => post(request, &target, body).await,
        Method::DELETE => delete(&target).await,
    }
}

async fn get_or_head(target: &ResolvedPath, ctx: &Context, send_content: bool) -> Response {
    let path = target.as_path();

    let Ok(meta) = fs::metadata(path).await else {
        return Response::not_found();
    };

    if meta.is_dir() {
        if !target.trailing_slash() {
            return Response::method_not_allowed();
        }

        let document = match listing::list_directory(path, target.uri()).await {
            Ok(document) => document,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Directory listing failed");
                return Response::method_not_allowed();
            }
        };

        let media_type = ctx.media.resolve(target.uri());
        let response = ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Length", document.len().to_string())
            .header("Last-Modified", HttpDate(SystemTime::now()).to_string())
            .header("Content-type", content_type_header(media_type));

        return if send_content {
            response.bytes(document).build()
        } else {
            response.build()
        };
    }

    // a file named with a trailing "/" does not exist as such
    if !meta.is_file() || target.trailing_slash() {
        return Response::not_found();
    }

    // HEAD opens the file too, so both report the same status
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            warn!(path = %path.display(), "File not readable");
            return Response::forbidden();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to open file");
            return Response::not_found();
        }
    };

    let len = meta.len();
    let modified = meta.modified().unwrap_or_else(|_| SystemTime::now());
    let media_type = ctx.media.resolve(target.uri());

    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Length", len.to_string())
        .header("Last-Modified", HttpDate(modified).to_string())
        .header("Content-type", content_type_header(media_type));

    if send_content {
        response.file(file, len).build()
    } else {
        response.build()
    }
}

async fn put<B>(request: &Request, target: &ResolvedPath, body: &mut B) -> Response
where
    B: AsyncRead + Unpin,
{
    let Some(len) = request.content_length() else {
        return Response::length_required();
    };

    // a trailing "/" names a directory, which PUT never writes
    if target.trailing_slash() {
        return Response::method_not_allowed();
    }

    let path = target.as_path();

    match fs::metadata(path).await {
        Ok(meta) if !meta.is_file() => Response::method_not_allowed(),

        Ok(_) => {
            let mut file = match File::create(path).await {
                Ok(file) => file,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to open file for writing");
                    return Response::method_not_allowed();
                }
            };

            match receive_body(body, &mut file, len).await {
                Ok(()) => {
                    debug!(path = %path.display(), bytes = len, "Replaced file");
                    Response::ok()
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Request body incomplete");
                    Response::bad_request()
                }
            }
        }

        Err(_) => {
            if let Some(parent) = path.parent() {
                if let Err(e) = fs::create_dir_all(parent).await {
                    warn!(path = %parent.display(), error = %e, "Failed to create directories");
                    return Response::method_not_allowed();
                }
            }

            let mut file = match OpenOptions::new().write(true).create_new(true).open(path).await {
                Ok(file) => file,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to create file");
                    return Response::method_not_allowed();
                }
            };

            match receive_body(body, &mut file, len).await {
                Ok(()) => {
                    debug!(path = %path.display(), bytes = len, "Created file");
                    Response::created(target.to_string())
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Request body incomplete");
                    drop(file);
                    let _ = fs::remove_file(path).await;
                    Response::bad_request()
                }
            }
        }
    }
}

async fn post<B>(request: &Request, target: &ResolvedPath, body: &mut B) -> Response
where
    B: AsyncRead + Unpin,
{
    let Some(len) = request.content_length() else {
        return Response::length_required();
    };

    let suffix = member_suffix(request.header("Content-type"));

    // the URI names the collection; a trailing "/" leaves no room for a member
    if target.trailing_slash() {
        return Response::method_not_allowed();
    }

    let collection = target.as_path();

    match fs::metadata(collection).await {
        Ok(meta) if !meta.is_dir() => return Response::method_not_allowed(),
        Ok(_) => {}
        Err(_) => {
            if let Err(e) = fs::create_dir_all(collection).await {
                warn!(path = %collection.display(), error = %e, "Failed to create collection");
                return Response::method_not_allowed();
            }
        }
    }

    let (mut file, member) = match create_member(collection, suffix).await {
        Ok(created) => created,
        Err(e) => {
            warn!(path = %collection.display(), error = %e, "Failed to create collection member");
            return Response::method_not_allowed();
        }
    };

    match receive_body(body, &mut file, len).await {
        Ok(()) => {
            debug!(path = %member.display(), bytes = len, "Created collection member");
            Response::created(member.display().to_string())
        }
        Err(e) => {
            warn!(path = %member.display(), error = %e, "Request body incomplete");
            drop(file);
            let _ = fs::remove_file(&member).await;
            Response::bad_request()
        }
    }
}

async fn delete(target: &ResolvedPath) -> Response {
    let path = target.as_path();

    let Ok(meta) = fs::metadata(path).await else {
        return Response::not_found();
    };

    let removed = if meta.is_dir() {
        if target.is_root() {
            return Response::method_not_allowed();
        }
        match is_empty_dir(path).await {
            Ok(true) => fs::remove_dir(path).await,
            Ok(false) => return Response::method_not_allowed(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read directory");
                return Response::not_found();
            }
        }
    } else if meta.is_file() && !target.trailing_slash() {
        fs::remove_file(path).await
    } else {
        return Response::not_found();
    };

    match removed {
        Ok(()) => {
            debug!(path = %path.display(), "Deleted");
            Response::ok()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to delete");
            Response::not_found()
        }
    }
}

/// File suffix for a POSTed member, chosen from the request `Content-type`.
///
/// # Example
///
/// ```
/// # use docroot::content::handlers::member_suffix;
/// assert_eq!(member_suffix(Some("text/plain")), ".txt");
/// assert_eq!(member_suffix(Some("multipart/form-data; boundary=x")), ".mime");
/// assert_eq!(member_suffix(None), ".bin");
/// ```
pub fn member_suffix(content_type: Option<&str>) -> &'static str {
    let Some(content_type) = content_type.map(str::trim) else {
        return ".bin";
    };

    let is_multipart = content_type
        .get(..19)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("multipart/form-data"));
    let essence = content_type.split(';').next().unwrap_or_default().trim();

    if essence.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
        ".urlencoded"
    } else if is_multipart {
        ".mime"
    } else if essence.eq_ignore_ascii_case("text/plain") {
        ".txt"
    } else {
        ".bin"
    }
}

/// Copies exactly `len` bytes of body into `file`.
async fn receive_body<B>(body: &mut B, file: &mut File, len: u64) -> io::Result<()>
where
    B: AsyncRead + Unpin,
{
    let copied = tokio::io::copy(&mut body.take(len), file).await?;
    file.flush().await?;

    if copied < len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("received {} of {} body bytes", copied, len),
        ));
    }
    Ok(())
}

/// Creates a new, uniquely named file inside `dir`.
async fn create_member(dir: &Path, suffix: &'static str) -> io::Result<(File, PathBuf)> {
    let dir = dir.to_path_buf();

    let (file, path) = tokio::task::spawn_blocking(move || {
        tempfile::Builder::new()
            .prefix("")
            .suffix(suffix)
            .rand_bytes(MEMBER_NAME_LEN)
            .tempfile_in(&dir)?
            .keep()
            .map_err(|e| e.error)
    })
    .await
    .map_err(io::Error::other)??;

    Ok((File::from_std(file), path))
}

async fn is_empty_dir(path: &Path) -> io::Result<bool> {
    let mut entries = fs::read_dir(path).await?;
    Ok(entries.next_entry().await?.is_none())
}
