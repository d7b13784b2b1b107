use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::response::{Body, Response};

/// Serializes the status line and headers, including the blank line.
pub fn serialize_head(resp: &Response, protocol: &str) -> Vec<u8> {
    let mut buf = Vec::new();

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        protocol,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    for (k, v) in resp.headers.iter() {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf
}

pub struct ResponseWriter {
    head: Vec<u8>,
    written: usize,
    body: Body,
}

impl ResponseWriter {
    pub fn new(response: Response, protocol: &str) -> Self {
        Self {
            head: serialize_head(&response, protocol),
            written: 0,
            body: response.body,
        }
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while self.written < self.head.len() {
            let n = stream
                .write(&self.head[self.written..])
                .await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        match std::mem::take(&mut self.body) {
            Body::Empty => {}
            Body::Bytes(bytes) => stream.write_all(&bytes).await?,
            Body::File { file, len } => {
                let copied = tokio::io::copy(&mut file.take(len), stream).await?;
                if copied != len {
                    anyhow::bail!("file shrank while sending: {} of {} bytes", copied, len);
                }
            }
        }

        stream.flush().await?;
        Ok(())
    }
}
