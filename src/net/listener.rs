//! Listener over TCP or unix domain sockets.
//!
//! # Responsibilities
//! - Bind to the endpoint named by a [`ListenSpec`]
//! - Accept incoming connections as a transport-agnostic [`Stream`]
//! - Plug into `axum::serve` via [`axum::serve::Listener`]
//! - Remove unix socket files once the server is done with them
//!
//! # Design Decisions
//! - [`Listener::close`] releases the socket even while other handles exist
//! - Transient accept errors are logged and retried, never surfaced to axum

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::net::TcpListener;
#[cfg(unix)]
use tokio::net::UnixListener;
use tokio::sync::watch;

use super::spec::{ListenSpec, Transport};
use super::stream::Stream;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("failed to bind {spec}: {source}")]
    Bind {
        spec: String,
        #[source]
        source: io::Error,
    },
    /// Failed to accept connection.
    #[error("failed to accept: {0}")]
    Accept(#[source] io::Error),
    /// The transport cannot be used on this platform.
    #[error("transport {0} is not supported on this platform")]
    Unsupported(Transport),
    /// The listener was closed.
    #[error("listener is closed")]
    Closed,
}

/// Local or peer address of a socket.
#[derive(Debug, Clone)]
pub enum SocketAddress {
    Tcp(SocketAddr),
    #[cfg(unix)]
    Unix(tokio::net::unix::SocketAddr),
}

impl SocketAddress {
    /// The TCP address, if this is one.
    pub fn as_tcp(&self) -> Option<SocketAddr> {
        match self {
            SocketAddress::Tcp(addr) => Some(*addr),
            #[cfg(unix)]
            SocketAddress::Unix(_) => None,
        }
    }
}

impl fmt::Display for SocketAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocketAddress::Tcp(addr) => write!(f, "{}", addr),
            #[cfg(unix)]
            SocketAddress::Unix(addr) => match addr.as_pathname() {
                Some(path) => write!(f, "{}", path.display()),
                None => f.write_str("(unnamed)"),
            },
        }
    }
}

#[derive(Debug)]
enum Socket {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixListener),
}

#[derive(Debug)]
struct Shared {
    socket: Mutex<Option<Socket>>,
    closed: watch::Sender<bool>,
}

/// A bound listening socket.
///
/// Handles made by the supervisor share one socket. [`close`](Self::close)
/// releases it for all of them at once: the port or socket path stops
/// accepting, and pending and later accepts fail with [`ListenerError::Closed`].
/// Dropping the last handle also closes the socket.
#[derive(Debug)]
pub struct Listener {
    shared: Arc<Shared>,
}

impl Listener {
    /// Bind to the endpoint named by `spec`.
    pub async fn bind(spec: &ListenSpec) -> Result<Self, ListenerError> {
        let bind_err = |source| ListenerError::Bind {
            spec: spec.to_string(),
            source,
        };

        let socket = match spec.transport() {
            Transport::Tcp => Socket::Tcp(TcpListener::bind(spec.address()).await.map_err(bind_err)?),
            Transport::Tcp4 => Socket::Tcp(bind_family(spec.address(), SocketAddr::is_ipv4).await.map_err(bind_err)?),
            Transport::Tcp6 => Socket::Tcp(bind_family(spec.address(), SocketAddr::is_ipv6).await.map_err(bind_err)?),
            #[cfg(unix)]
            Transport::Unix => Socket::Unix(UnixListener::bind(spec.address()).map_err(bind_err)?),
            #[cfg(not(unix))]
            Transport::Unix => return Err(ListenerError::Unsupported(Transport::Unix)),
        };
        let listener = Self::from_socket(socket);

        tracing::info!(
            endpoint = %spec,
            local_addr = %listener.local_addr().map(|a| a.to_string()).unwrap_or_default(),
            "Listener bound"
        );

        Ok(listener)
    }

    fn from_socket(socket: Socket) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                socket: Mutex::new(Some(socket)),
                closed,
            }),
        }
    }

    /// Another handle to the same socket.
    pub(crate) fn handle(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Close the socket for every handle. Idempotent.
    pub fn close(&self) {
        self.shared.closed.send_replace(true);
        if self.socket().take().is_some() {
            tracing::debug!("Listener closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.shared.closed.borrow()
    }

    /// Accept a new connection.
    pub async fn accept_stream(&self) -> Result<(Stream, SocketAddress), ListenerError> {
        tokio::select! {
            _ = self.closed() => Err(ListenerError::Closed),
            accepted = std::future::poll_fn(|cx| self.poll_accept(cx)) => accepted,
        }
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddress> {
        match self.socket().as_ref() {
            Some(Socket::Tcp(inner)) => inner.local_addr().map(SocketAddress::Tcp),
            #[cfg(unix)]
            Some(Socket::Unix(inner)) => inner.local_addr().map(SocketAddress::Unix),
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "listener is closed")),
        }
    }

    fn socket(&self) -> MutexGuard<'_, Option<Socket>> {
        self.shared.socket.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn closed(&self) {
        let mut closed = self.shared.closed.subscribe();
        while !*closed.borrow_and_update() {
            if closed.changed().await.is_err() {
                return;
            }
        }
    }

    fn poll_accept(&self, cx: &mut Context<'_>) -> Poll<Result<(Stream, SocketAddress), ListenerError>> {
        let guard = self.socket();
        match guard.as_ref() {
            None => Poll::Ready(Err(ListenerError::Closed)),
            Some(Socket::Tcp(inner)) => inner.poll_accept(cx).map(|res| {
                let (stream, addr) = res.map_err(ListenerError::Accept)?;
                tracing::debug!(peer_addr = %addr, "Connection accepted");
                Ok((Stream::Tcp(stream), SocketAddress::Tcp(addr)))
            }),
            #[cfg(unix)]
            Some(Socket::Unix(inner)) => inner.poll_accept(cx).map(|res| {
                let (stream, addr) = res.map_err(ListenerError::Accept)?;
                tracing::debug!("Unix connection accepted");
                Ok((Stream::Unix(stream), SocketAddress::Unix(addr)))
            }),
        }
    }
}

impl axum::serve::Listener for Listener {
    type Io = Stream;
    type Addr = SocketAddress;

    async fn accept(&mut self) -> (Self::Io, Self::Addr) {
        loop {
            match self.accept_stream().await {
                Ok(accepted) => return accepted,
                Err(ListenerError::Accept(e)) if is_connection_error(&e) => continue,
                Err(ListenerError::Closed) => {
                    // Nothing left to accept; axum stops through graceful shutdown.
                    tracing::debug!("Accept on closed listener");
                    std::future::pending::<()>().await;
                }
                Err(e) => {
                    // Usually fd exhaustion; back off instead of spinning.
                    tracing::error!(error = %e, "Accept failed");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    fn local_addr(&self) -> io::Result<Self::Addr> {
        Listener::local_addr(self)
    }
}

fn is_connection_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused | io::ErrorKind::ConnectionAborted | io::ErrorKind::ConnectionReset
    )
}

async fn bind_family(address: &str, keep: fn(&SocketAddr) -> bool) -> io::Result<TcpListener> {
    let mut last_err = None;
    for addr in tokio::net::lookup_host(address).await?.filter(keep) {
        match TcpListener::bind(addr).await {
            Ok(listener) => return Ok(listener),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("{} does not resolve to an address of the requested family", address),
        )
    }))
}

/// Guard for a unix socket file.
///
/// Removes the file when dropped. Removal errors are ignored: the path may
/// already be gone.
#[derive(Debug)]
pub struct SocketFile {
    path: Option<PathBuf>,
}

impl SocketFile {
    /// Guard the socket file of `spec`, if it has one.
    pub fn for_spec(spec: &ListenSpec) -> Self {
        Self {
            path: spec.transport().is_unix().then(|| PathBuf::from(spec.address())),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl Drop for SocketFile {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::debug!(path = %path.display(), "Socket file removed"),
                Err(e) => tracing::trace!(path = %path.display(), error = %e, "Socket file not removed"),
            }
        }
    }
}
