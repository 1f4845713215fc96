use std::{fmt, str::FromStr};

use ascii::{AsciiStr, AsciiString};

/// Request methods the file server tells apart
///
/// Anything else is kept verbatim as [`Method::Invalid`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `HEAD`
    Head,
    /// `POST`
    Post,
    /// Unrecognized method token
    Invalid(AsciiString),
}

impl Method {
    /// enum [Method] names as `&str`
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Invalid(s) => s.as_str(),
        }
    }

    /// `true` for methods answered with file contents (`GET`, `HEAD`)
    #[must_use]
    pub fn is_retrieval(&self) -> bool {
        matches!(self, Method::Get | Method::Head)
    }
}

impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Method, ()> {
        AsciiStr::from_ascii(s).map(Method::from).map_err(|_| ())
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.write_str(self.as_str())
    }
}

impl From<&AsciiStr> for Method {
    fn from(s: &AsciiStr) -> Self {
        match s.as_bytes() {
            b"GET" => Method::Get,
            b"HEAD" => Method::Head,
            b"POST" => Method::Post,
            _ => Method::Invalid(s.to_owned()),
        }
    }
}
