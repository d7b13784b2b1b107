use std::sync::Arc;
use std::time::SystemTime;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::content::{Context, handlers};
use crate::http::date::HttpDate;
use crate::http::parser::{ParseError, parse_http_request};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;

const READ_CHUNK: usize = 4096;

/// Serves exactly one request on a stream.
///
/// Generic over the stream so the pipeline runs the same over a TCP socket
/// or an in-memory pipe.
pub struct Connection<S> {
    stream: S,
    buffer: BytesMut,
    state: ConnectionState,
    ctx: Arc<Context>,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, ctx: Arc<Context>) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            state: ConnectionState::Reading,
            ctx,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    self.state = match self.read_request().await? {
                        Ok(Some(req)) => ConnectionState::Processing(req),
                        Ok(None) => ConnectionState::Closed,
                        Err(e) => {
                            tracing::warn!(error = %e, "Rejected malformed request");
                            let response = match e {
                                ParseError::UnsupportedMethod(_) => Response::not_implemented(),
                                _ => Response::bad_request(),
                            };
                            self.writing(response)
                        }
                    };
                }

                ConnectionState::Processing(req) => {
                    let response = self.process(&req).await;

                    tracing::info!(
                        method = req.method.as_str(),
                        uri = %req.uri,
                        status = response.status.as_u16(),
                        "Request served"
                    );

                    self.state = self.writing(response);
                }

                ConnectionState::Writing(mut writer) => {
                    writer.write_to_stream(&mut self.stream).await?;
                    // one request per connection
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => {
                    let _ = self.stream.shutdown().await;
                    break;
                }
            }
        }

        Ok(())
    }

    /// Reads until a complete header block is buffered.
    ///
    /// The outer error is an I/O failure. `Ok(None)` means the peer closed
    /// without sending anything.
    pub async fn read_request(&mut self) -> anyhow::Result<Result<Option<Request>, ParseError>> {
        loop {
            // Try parsing whatever we already have
            match parse_http_request(&self.buffer) {
                Ok((request, consumed)) => {
                    // Whatever follows the headers is the start of the body
                    let _ = self.buffer.split_to(consumed);
                    return Ok(Ok(Some(request)));
                }

                Err(ParseError::Incomplete) => {
                    // Need more data → fall through to read
                }

                Err(e) => return Ok(Err(e)),
            }

            self.buffer.reserve(READ_CHUNK);
            let n = self.stream.read_buf(&mut self.buffer).await?;

            if n == 0 {
                if self.buffer.is_empty() {
                    return Ok(Ok(None));
                }
                // Closed halfway through the header block
                return Ok(Err(ParseError::InvalidRequest));
            }
        }
    }

    async fn process(&mut self, req: &Request) -> Response {
        let buffered = self.buffer.split().freeze();
        let mut body = (&buffered[..]).chain(&mut self.stream);

        handlers::handle(req, &mut body, &self.ctx).await
    }

    fn writing(&self, mut response: Response) -> ConnectionState {
        add_connection_headers(&mut response, &self.ctx);
        ConnectionState::Writing(ResponseWriter::new(response, &self.ctx.protocol))
    }
}

/// Adds the headers every response carries: `Date`, `Server` and
/// `Connection: close`.
pub fn add_connection_headers(response: &mut Response, ctx: &Context) {
    response.headers.put("Date", HttpDate(SystemTime::now()).to_string());
    response.headers.put("Server", ctx.server_name.as_str());
    response.headers.put("Connection", "close");
}
