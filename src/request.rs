use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use ascii::AsciiStr;

use crate::common::Method;
use crate::error::{ParseError, Result};
use crate::log;
use crate::stream_traits::Receive;
use crate::util::read_until;

/// Terminator of the header block: an empty line
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Request read from a client connection.
///
/// Built once from the raw header block and not changed afterwards. Header
/// fields are collected but carry no meaning for the file server; a repeated
/// name keeps the last value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    method: Method,
    path: String,
    version: String,
    headers: HashMap<String, String>,
}

impl Request {
    /// Reads the header block from `source` and parses it.
    ///
    /// Reading stops right after the blank line, so a request body stays
    /// unread in `source`.
    ///
    /// # Errors
    ///
    /// - [`Error::Parse`](crate::Error::Parse) for a malformed or
    ///   unterminated header block
    /// - receive errors of `source`
    pub fn read_from<R: Receive + ?Sized>(source: &mut R, header_max_size: usize) -> Result<Self> {
        let block = read_until(source, HEADER_TERMINATOR, header_max_size)?;
        Self::parse(&block)
    }

    /// Parses a complete header block, blank line included.
    ///
    /// # Errors
    ///
    /// [`Error::Parse`](crate::Error::Parse) naming what is malformed.
    pub fn parse(block: &[u8]) -> Result<Self> {
        if block.is_empty() {
            return Err(ParseError::Empty.into());
        }
        let line_end = block
            .windows(2)
            .position(|w| w == b"\r\n")
            .ok_or(ParseError::MissingCrlf)?;
        if !block.ends_with(HEADER_TERMINATOR) {
            return Err(ParseError::Unterminated(block.len()).into());
        }

        let line = AsciiStr::from_ascii(&block[..line_end]).map_err(|_| ParseError::NonAscii)?;
        let tokens: Vec<&str> = line.as_str().split_whitespace().collect();
        let [method, path, version, ..] = tokens[..] else {
            return Err(ParseError::MissingTokens(tokens.len()).into());
        };
        let method = Method::from_str(method).map_err(|_| ParseError::NonAscii)?;

        // the request line's CRLF may be the first half of the terminator
        let fields = block.get(line_end + 2..block.len() - 2).unwrap_or_default();
        let headers = parse_headers(fields);

        log::debug!("{method} {path} {version}");

        Ok(Self {
            method,
            path: path.to_owned(),
            version: version.to_owned(),
            headers,
        })
    }

    /// Request method
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Requested path as sent, not validated
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Declared protocol version, e.g. `HTTP/1.0`
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// All header fields
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Value of header `name`, compared case-insensitively
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.method, self.path, self.version)
    }
}

/// `Name: value` lines; lines without a colon are skipped.
fn parse_headers(fields: &[u8]) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    for line in String::from_utf8_lossy(fields).split("\r\n") {
        if let Some((name, value)) = line.split_once(':') {
            let _ = headers.insert(name.trim().to_owned(), value.trim().to_owned());
        }
    }
    headers
}
