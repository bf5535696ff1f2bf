//! HTTP response head returned by a camera before the stream body.

use camstream_core::{Error, Result};

/// Most headers accepted in a camera's response head.
const MAX_HEADERS_COUNT: usize = 64;

/// Status line and headers of the camera's HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    /// Numeric status code, e.g. `200`.
    pub status: u16,

    /// Reason phrase, possibly empty.
    pub reason: String,

    /// Header name/value pairs in arrival order.
    pub headers: Vec<(String, String)>,
}

impl ResponseHead {
    /// Parse the start of `buf` as a response head.
    ///
    /// Returns the head and its length in bytes (terminator included) once the
    /// blank line ending it is in `buf`, or `None` while it is still partial.
    /// Bytes past that length belong to the body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedResponse`] when the bytes seen so far cannot
    /// be an HTTP/1.x response head.
    pub fn try_parse(buf: &[u8]) -> Result<Option<(Self, usize)>> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS_COUNT];
        let mut response = httparse::Response::new(&mut headers);

        let head_len = match response.parse(buf) {
            Ok(httparse::Status::Complete(len)) => len,
            Ok(httparse::Status::Partial) => return Ok(None),
            Err(e) => {
                return Err(Error::MalformedResponse(format!(
                    "failed to parse response head: {e}"
                )));
            }
        };

        let status = response
            .code
            .ok_or_else(|| Error::MalformedResponse("missing status code".to_string()))?;

        let headers = response
            .headers
            .iter()
            .filter(|h| !h.name.is_empty())
            .map(|h| {
                (
                    h.name.to_string(),
                    String::from_utf8_lossy(h.value).trim().to_string(),
                )
            })
            .collect();

        let head = Self {
            status,
            reason: response.reason.unwrap_or_default().to_string(),
            headers,
        };
        Ok(Some((head, head_len)))
    }

    /// Parse a complete head.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedResponse`] when `raw` is not a complete
    /// HTTP/1.x response head.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        Self::try_parse(raw)?
            .map(|(head, _)| head)
            .ok_or_else(|| Error::MalformedResponse("incomplete response head".to_string()))
    }

    /// First value of header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Multipart boundary announced in `Content-Type`, without quotes.
    pub fn boundary(&self) -> Option<&str> {
        self.header("Content-Type")?
            .split(';')
            .filter_map(|param| param.trim().split_once('='))
            .find(|(key, _)| key.trim().eq_ignore_ascii_case("boundary"))
            .map(|(_, value)| value.trim().trim_matches('"'))
    }

    /// Check that the body can be fed to the demuxer as-is.
    ///
    /// # Errors
    ///
    /// - [`Error::HttpStatus`] for any non-2xx status
    /// - [`Error::UnsupportedTransferEncoding`] when the body is chunked
    pub fn ensure_streamable(&self) -> Result<()> {
        if !self.is_success() {
            return Err(Error::HttpStatus {
                code: self.status,
                reason: self.reason.clone(),
            });
        }

        if let Some(encoding) = self.header("Transfer-Encoding")
            && encoding.to_ascii_lowercase().contains("chunked")
        {
            return Err(Error::UnsupportedTransferEncoding(encoding.to_string()));
        }

        Ok(())
    }
}
