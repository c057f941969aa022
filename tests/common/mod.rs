//! Shared utilities for integration testing.

use std::io;
use std::time::Duration;

use groundwork::lifecycle::ShutdownListener;
use groundwork::net::{Listener, SocketAddress};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::oneshot;

/// A run loop that reports its bound address, then echoes every connection
/// until shutdown is requested.
#[allow(dead_code)]
pub async fn echo_until_shutdown(
    listener: Listener,
    shutdown: ShutdownListener,
    ready: oneshot::Sender<SocketAddress>,
) -> io::Result<()> {
    let _ = ready.send(listener.local_addr()?);
    let stop = shutdown.wait();
    tokio::pin!(stop);

    loop {
        tokio::select! {
            _ = &mut stop => return Ok(()),
            accepted = listener.accept_stream() => {
                let (mut stream, _) = accepted.map_err(io::Error::other)?;
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    loop {
                        match stream.read(&mut buf).await {
                            Ok(0) | Err(_) => break,
                            Ok(n) => {
                                if stream.write_all(&buf[..n]).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                });
            }
        }
    }
}

/// HTTP client that never reuses connections.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

/// Wait for the address reported by a run loop.
#[allow(dead_code)]
pub async fn ready_addr(rx: oneshot::Receiver<SocketAddress>) -> SocketAddress {
    tokio::time::timeout(Duration::from_secs(5), rx)
        .await
        .expect("run loop never became ready")
        .expect("run loop dropped the ready channel")
}
