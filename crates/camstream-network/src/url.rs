//! Camera stream addresses.

use camstream_core::constants::DEFAULT_HTTP_PORT;
use camstream_core::{Error, Result};
use http::Uri;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Location of an MJPEG stream on a camera, `http://host[:port]/path`.
///
/// A validated [`Uri`]: the scheme is `http` and a host is present.
///
/// # Example
///
/// ```
/// use camstream_network::CameraUrl;
///
/// let url = CameraUrl::parse("http://192.168.0.20:8080/video.mjpg").unwrap();
/// assert_eq!(url.host(), "192.168.0.20");
/// assert_eq!(url.port(), 8080);
/// assert_eq!(url.path(), "/video.mjpg");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CameraUrl {
    uri: Uri,
    port: u16,

    /// Origin-form request target (`/path?query`)
    target: String,
}

impl CameraUrl {
    /// Parse an `http://` URL. Port defaults to 80 and path to `/`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] for anything `Uri` rejects, any scheme
    /// other than `http`, a missing host, credentials, or a port that is not
    /// a non-zero `u16`.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidUrl(format!("{input}: {reason}"));

        let uri: Uri = input
            .trim()
            .parse()
            .map_err(|e: http::uri::InvalidUri| invalid(&e.to_string()))?;

        if uri.scheme_str() != Some("http") {
            return Err(invalid("only http:// is supported"));
        }

        let authority = uri.authority().ok_or_else(|| invalid("missing host"))?;
        if authority.as_str().contains('@') {
            return Err(invalid("credentials in URL are not supported"));
        }

        let host = authority.host();
        if host.is_empty() {
            return Err(invalid("missing host"));
        }

        // Anything after the host is an explicit port and must be valid
        let port = match authority.as_str().strip_prefix(host) {
            Some("") => DEFAULT_HTTP_PORT,
            Some(rest) => rest
                .strip_prefix(':')
                .and_then(|p| p.parse::<u16>().ok())
                .filter(|&p| p != 0)
                .ok_or_else(|| invalid("bad port"))?,
            None => return Err(invalid("bad authority")),
        };

        let target = match uri.path_and_query().map(|pq| pq.as_str()) {
            Some(pq) if pq.starts_with('/') => pq.to_string(),
            Some(pq) if !pq.is_empty() => format!("/{pq}"),
            _ => "/".to_string(),
        };

        Ok(Self { uri, port, target })
    }

    pub fn host(&self) -> &str {
        self.uri.host().unwrap_or_default()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Request target, always starting with `/`.
    pub fn path(&self) -> &str {
        &self.target
    }

    /// The underlying URI.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// `host:port` form accepted by `TcpStream::connect`.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host(), self.port)
    }

    /// Value of the `Host` request header (port omitted when it is 80).
    pub fn host_header(&self) -> String {
        if self.port == DEFAULT_HTTP_PORT {
            self.host().to_string()
        } else {
            self.socket_addr()
        }
    }
}

impl fmt::Display for CameraUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "http://{}{}", self.host_header(), self.path())
    }
}

impl FromStr for CameraUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CameraUrl {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<CameraUrl> for String {
    fn from(url: CameraUrl) -> Self {
        url.to_string()
    }
}
