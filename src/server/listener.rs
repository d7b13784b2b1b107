use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::content::Context;
use crate::http::connection::{Connection, add_connection_headers};
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;
use crate::server::pool::{SubmitError, WorkerPool};

/// Pause after a failed accept, typically out of file descriptors.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Binds the configured port and serves until the task is dropped.
pub async fn run(cfg: Arc<ServerConfig>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(cfg.listen_addr()).await?;
    info!(
        "Listening on {} as {} ({} workers)",
        listener.local_addr()?,
        cfg.server_name,
        cfg.workers
    );

    serve(listener, cfg).await
}

/// Accepts connections on `listener` and hands them to the worker pool.
pub async fn serve(listener: TcpListener, cfg: Arc<ServerConfig>) -> anyhow::Result<()> {
    let ctx = Arc::new(Context::from_config(&cfg));
    let pool = dispatcher(cfg.workers, cfg.max_pending, ctx.clone());

    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("Accept failed: {}", e);
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };
        debug!("Accepted connection from {}", peer);

        match pool.submit((socket, peer)) {
            Ok(()) => {}
            Err(SubmitError::Full((socket, peer))) => {
                warn!("Pending queue full, rejecting {}", peer);
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    reject(socket, &ctx).await;
                });
            }
            Err(SubmitError::Closed((_, peer))) => {
                anyhow::bail!("worker pool has shut down, dropping {}", peer);
            }
        }
    }
}

/// Builds the pool of workers that run each accepted connection to completion.
pub fn dispatcher(
    workers: usize,
    max_pending: Option<usize>,
    ctx: Arc<Context>,
) -> WorkerPool<(TcpStream, SocketAddr)> {
    WorkerPool::new(workers, max_pending, move |(socket, peer): (TcpStream, SocketAddr)| {
        let ctx = ctx.clone();
        async move {
            let mut conn = Connection::new(socket, ctx);
            if let Err(e) = conn.run().await {
                error!("Connection error from {}: {}", peer, e);
            }
        }
    })
}

async fn reject(mut socket: TcpStream, ctx: &Context) {
    let mut response = Response::service_unavailable();
    add_connection_headers(&mut response, ctx);

    let mut writer = ResponseWriter::new(response, &ctx.protocol);
    if let Err(e) = writer.write_to_stream(&mut socket).await {
        debug!("Failed to send 503: {}", e);
    }
}
