//! TCP front end: accepts connections and answers one response line per request line.

use crate::config::GatewayConfig;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::protocol::{ErrorCode, Response, WireError};
use serde_json::Value;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::TcpListenerStream;

pub struct GatewayService;

impl GatewayService {
    /// Binds `config.listen` and starts accepting connections on the current runtime.
    pub async fn start(config: GatewayConfig) -> Result<GatewayHandle> {
        Self::start_with(config.clone(), Dispatcher::new(&config)).await
    }

    pub async fn start_with(
        config: GatewayConfig,
        dispatcher: Dispatcher,
    ) -> Result<GatewayHandle> {
        let listener = TcpListener::bind(config.listen).await?;
        let local_addr = listener.local_addr()?;
        let (shutdown, shutdown_rx) = watch::channel(false);
        tracing::info!(
            %local_addr,
            algorithms = ?config.algorithms,
            "gateway listening"
        );
        let task = tokio::spawn(accept_loop(
            listener,
            dispatcher.clone(),
            config.max_request_bytes,
            shutdown_rx,
        ));
        Ok(GatewayHandle {
            local_addr,
            shutdown,
            task,
            dispatcher,
        })
    }
}

/// A running service. Dropping the handle also shuts it down, but without waiting for the
/// accept loop; use [`GatewayHandle::stop`] to wait.
pub struct GatewayHandle {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
    dispatcher: Dispatcher,
}

impl GatewayHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Stops accepting, closes open connections and waits for the accept loop to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            tracing::warn!(error = %err, "accept loop ended abnormally");
        }
        tracing::info!(local_addr = %self.local_addr, "gateway stopped");
    }
}

async fn accept_loop(
    listener: TcpListener,
    dispatcher: Dispatcher,
    max_request_bytes: usize,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut incoming = TcpListenerStream::new(listener);
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            // `Err` means the handle was dropped.
            _ = shutdown.changed() => break,
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            next = incoming.next() => match next {
                Some(Ok(stream)) => {
                    let peer = stream.peer_addr().ok();
                    tracing::debug!(?peer, "connection accepted");
                    connections.spawn(serve_connection(
                        stream,
                        dispatcher.clone(),
                        max_request_bytes,
                    ));
                }
                Some(Err(err)) => tracing::warn!(error = %err, "accept failed"),
                None => break,
            },
        }
    }
    connections.shutdown().await;
}

async fn serve_connection(stream: TcpStream, dispatcher: Dispatcher, max_request_bytes: usize) {
    let peer = stream.peer_addr().ok();
    let (reader, writer) = stream.into_split();
    if let Err(err) = serve(reader, writer, &dispatcher, max_request_bytes).await {
        tracing::debug!(?peer, error = %err, "connection closed with error");
    } else {
        tracing::debug!(?peer, "connection closed");
    }
}

/// Answers request lines from `reader` on `writer` until end of input. A line longer than
/// `max_request_bytes` is answered with `invalidRequest` and ends the connection.
pub async fn serve<R, W>(
    reader: R,
    mut writer: W,
    dispatcher: &Dispatcher,
    max_request_bytes: usize,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let limit = u64::try_from(max_request_bytes).unwrap_or(u64::MAX).saturating_add(1);
        let read = (&mut reader).take(limit).read_until(b'\n', &mut buf).await?;
        if read == 0 {
            return Ok(());
        }
        let terminated = buf.last() == Some(&b'\n');
        if !terminated && buf.len() > max_request_bytes {
            let error = WireError::new(
                ErrorCode::InvalidRequest,
                format!("request exceeds {max_request_bytes} bytes"),
            );
            write_response(&mut writer, &Response::err(Value::Null, error)).await?;
            return Ok(());
        }

        let line = trim_line_end(&buf);
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let response = match std::str::from_utf8(line) {
            Ok(text) => dispatcher.handle_line(text).await,
            Err(err) => Response::err(
                Value::Null,
                WireError::new(ErrorCode::InvalidRequest, format!("request is not UTF-8: {err}")),
            ),
        };
        write_response(&mut writer, &response).await?;
    }
}

fn trim_line_end(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}

async fn write_response<W>(writer: &mut W, response: &Response) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut bytes = serde_json::to_vec(response)?;
    bytes.push(b'\n');
    writer.write_all(&bytes).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_endings_are_trimmed() {
        assert_eq!(trim_line_end(b"{}\r\n"), b"{}");
        assert_eq!(trim_line_end(b"{}\n"), b"{}");
        assert_eq!(trim_line_end(b"{}"), b"{}");
    }

    #[tokio::test]
    async fn oversized_lines_end_the_connection() {
        let dispatcher = Dispatcher::new(&GatewayConfig::default());
        let input = format!("{}\n{{}}\n", "x".repeat(64));
        let mut output = Vec::new();
        serve(input.as_bytes(), &mut output, &dispatcher, 16).await.unwrap();
        let text = String::from_utf8(output).unwrap();
        assert_eq!(text.lines().count(), 1);
        let response: Response = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(response.error.unwrap().code, ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn blank_lines_are_skipped() {
        let dispatcher = Dispatcher::new(&GatewayConfig::default());
        let input = "\n  \n{\"id\": 7, \"method\": \"algorithms\"}\n";
        let mut output = Vec::new();
        serve(input.as_bytes(), &mut output, &dispatcher, 1024).await.unwrap();
        let response: Response = serde_json::from_slice(output.trim_ascii_end()).unwrap();
        assert_eq!(response.id, Value::from(7));
        assert_eq!(
            response.result.unwrap(),
            serde_json::json!(["org.eclipse.elk.layered", "org.eclipse.elk.fixed"])
        );
    }
}
