//! Endpoint descriptors parsed from URI strings.
//!
//! # Grammar
//! ```text
//! tcp://host:port        tcp4://host:port        tcp6://[::1]:port
//! tcp://:port            (every local interface)
//! unix:///absolute/path/to/socket
//! ```
//!
//! The scheme selects the transport. For stream sockets the authority
//! (`host:port`) becomes the address; for unix sockets the percent-decoded
//! path does, and the host must be blank.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use percent_encoding::percent_decode_str;
use url::Url;

/// Error returned when an endpoint URI cannot be parsed.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The string is not a URI at all.
    #[error("invalid endpoint URI {input:?}: {source}")]
    Invalid {
        input: String,
        #[source]
        source: url::ParseError,
    },
    /// The scheme does not name a known transport.
    #[error("unsupported transport {0:?} (expected tcp, tcp4, tcp6 or unix)")]
    UnsupportedTransport(String),
    /// A stream-socket URI without a host.
    #[error("{kind} URI {input:?} has no host")]
    MissingHost { kind: &'static str, input: String },
    /// A stream-socket URI without a port.
    #[error("{kind} URI {input:?} has no port")]
    MissingPort { kind: &'static str, input: String },
    /// A unix URI that names a host.
    #[error("{kind} unix URI must have blank host, e.g. unix:///path/to/socket")]
    UnixHost { kind: &'static str },
    /// A unix URI without a path.
    #[error("{kind} unix URI {input:?} has no socket path")]
    MissingPath { kind: &'static str, input: String },
    /// A unix URI whose decoded path is not UTF-8.
    #[error("{kind} unix URI {input:?} does not decode to a UTF-8 path")]
    InvalidPath { kind: &'static str, input: String },
}

/// Socket family an endpoint is reached over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    /// TCP over IPv4 or IPv6.
    Tcp,
    /// TCP restricted to IPv4.
    Tcp4,
    /// TCP restricted to IPv6.
    Tcp6,
    /// Filesystem-addressed unix domain socket.
    Unix,
}

impl Transport {
    /// The scheme name used in endpoint URIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Tcp => "tcp",
            Transport::Tcp4 => "tcp4",
            Transport::Tcp6 => "tcp6",
            Transport::Unix => "unix",
        }
    }

    pub fn is_unix(&self) -> bool {
        matches!(self, Transport::Unix)
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transport {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Transport::Tcp),
            "tcp4" => Ok(Transport::Tcp4),
            "tcp6" => Ok(Transport::Tcp6),
            "unix" => Ok(Transport::Unix),
            other => Err(ParseError::UnsupportedTransport(other.to_string())),
        }
    }
}

/// Where a server should listen.
///
/// Immutable once parsed. The supervisor uses it both to open the listener and,
/// at teardown, to decide whether a socket file has to be removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenSpec {
    transport: Transport,
    address: String,
}

impl ListenSpec {
    pub fn new(transport: Transport, address: impl Into<String>) -> Self {
        Self {
            transport,
            address: address.into(),
        }
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// `host:port` for stream sockets, the socket path for unix sockets.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The matching client-side descriptor.
    pub fn dial_spec(&self) -> DialSpec {
        DialSpec::new(self.transport, self.address.clone())
    }
}

impl FromStr for ListenSpec {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (transport, address) = parse_endpoint(s, "listen")?;
        Ok(Self { transport, address })
    }
}

impl fmt::Display for ListenSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_uri(f, self.transport, &self.address)
    }
}

/// Where a client should connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialSpec {
    transport: Transport,
    address: String,
}

impl DialSpec {
    pub fn new(transport: Transport, address: impl Into<String>) -> Self {
        Self {
            transport,
            address: address.into(),
        }
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl FromStr for DialSpec {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (transport, address) = parse_endpoint(s, "dial")?;
        Ok(Self { transport, address })
    }
}

impl fmt::Display for DialSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_uri(f, self.transport, &self.address)
    }
}

fn write_uri(f: &mut fmt::Formatter<'_>, transport: Transport, address: &str) -> fmt::Result {
    if transport.is_unix() {
        write!(f, "unix://{}", address)
    } else {
        write!(f, "{}://{}", transport, address)
    }
}

fn parse_endpoint(input: &str, kind: &'static str) -> Result<(Transport, String), ParseError> {
    let url = Url::parse(&with_wildcard_host(input)).map_err(|source| ParseError::Invalid {
        input: input.to_string(),
        source,
    })?;

    let transport: Transport = url.scheme().parse()?;
    let host = url.host_str().filter(|h| !h.is_empty());

    if transport.is_unix() {
        if host.is_some() {
            return Err(ParseError::UnixHost { kind });
        }
        let path = percent_decode_str(url.path())
            .decode_utf8()
            .map_err(|_| ParseError::InvalidPath {
                kind,
                input: input.to_string(),
            })?;
        if path.is_empty() {
            return Err(ParseError::MissingPath {
                kind,
                input: input.to_string(),
            });
        }
        return Ok((transport, path.into_owned()));
    }

    let host = host.ok_or_else(|| ParseError::MissingHost {
        kind,
        input: input.to_string(),
    })?;
    let port = url.port().ok_or_else(|| ParseError::MissingPort {
        kind,
        input: input.to_string(),
    })?;

    Ok((transport, format!("{}:{}", host, port)))
}

/// Fill in the unspecified address for `scheme://:port`, which `Url` rejects.
fn with_wildcard_host(input: &str) -> Cow<'_, str> {
    let Some((scheme, rest)) = input.split_once("://") else {
        return Cow::Borrowed(input);
    };
    if !rest.starts_with(':') {
        return Cow::Borrowed(input);
    }
    match scheme {
        "tcp" | "tcp4" => Cow::Owned(format!("{scheme}://0.0.0.0{rest}")),
        "tcp6" => Cow::Owned(format!("{scheme}://[::]{rest}")),
        _ => Cow::Borrowed(input),
    }
}
