use std::fs::File;
use std::io::{self, Cursor, Read, Result as IoResult, Write};
use std::path::Path;

use crate::common::{ContentType, StatusCode};

/// Protocol version written on every status line
pub const HTTP_VERSION: &str = "HTTP/1.0";

/// A `Response` without a template parameter.
pub type ResponseBox = Response<Box<dyn Read + Send>>;

/// Response written back to the client.
///
/// Always carries exactly two headers, `Content-Length` and `Content-Type`.
/// Error responses have an empty body and the `text/html` content type.
#[derive(Debug)]
pub struct Response<R> {
    status_code: StatusCode,
    content_type: ContentType,
    data: R,
    data_length: usize,
}

impl<R> Response<R>
where
    R: Read,
{
    /// Creates a new Response object
    pub fn new(
        status_code: StatusCode,
        content_type: ContentType,
        data: R,
        data_length: usize,
    ) -> Self {
        Self {
            status_code,
            content_type,
            data,
            data_length,
        }
    }

    /// Status code of the response
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    /// Value of the `Content-Type` header
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Value of the `Content-Length` header
    #[must_use]
    pub fn data_length(&self) -> usize {
        self.data_length
    }

    /// Writes status line, headers and, if `send_body`, the body.
    ///
    /// For `HEAD` requests `send_body` is `false`; the headers stay the same.
    ///
    /// # Errors
    ///
    /// Write errors of `writer`, or [`io::ErrorKind::UnexpectedEof`] if the
    /// data ends before `data_length` bytes.
    pub fn raw_print<W: Write>(mut self, mut writer: W, send_body: bool) -> IoResult<()> {
        let header = format!(
            "{HTTP_VERSION} {} {}\r\nContent-Length: {}\r\nContent-Type: {}\r\n\r\n",
            self.status_code.0,
            self.status_code.default_reason_phrase(),
            self.data_length,
            self.content_type,
        );
        writer.write_all(header.as_bytes())?;

        if send_body && self.data_length > 0 {
            let expected = u64::try_from(self.data_length).unwrap_or(u64::MAX);
            let sent = io::copy(&mut self.data.by_ref().take(expected), &mut writer)?;
            if sent != expected {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("body ended after {sent} of {expected} bytes"),
                ));
            }
        }

        writer.flush()
    }

    /// Boxes the data for uniform handling of all responses.
    pub fn boxed(self) -> ResponseBox
    where
        R: Send + 'static,
    {
        Response {
            status_code: self.status_code,
            content_type: self.content_type,
            data: Box::new(self.data),
            data_length: self.data_length,
        }
    }
}

impl Response<File> {
    /// Builds a `200 OK` response for the file at `path`.
    ///
    /// The content type is chosen by extension, the length is taken from the
    /// file's metadata.
    ///
    /// # Errors
    ///
    /// If the file cannot be opened or is not a regular file.
    pub fn from_file(path: &Path) -> IoResult<Response<File>> {
        let file = File::open(path)?;
        let metadata = file.metadata()?;
        if !metadata.is_file() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"));
        }
        let data_length = usize::try_from(metadata.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "file too large"))?;

        Ok(Response::new(
            StatusCode::OK,
            ContentType::from_path(path),
            file,
            data_length,
        ))
    }
}

impl Response<Cursor<Vec<u8>>> {
    /// `200 OK` response holding `data`.
    #[must_use]
    pub fn from_data<D>(content_type: ContentType, data: D) -> Response<Cursor<Vec<u8>>>
    where
        D: Into<Vec<u8>>,
    {
        let data = data.into();
        let data_length = data.len();
        Response::new(StatusCode::OK, content_type, Cursor::new(data), data_length)
    }
}

impl Response<io::Empty> {
    /// Response with `status_code` and an empty `text/html` body.
    #[must_use]
    pub fn empty(status_code: StatusCode) -> Response<io::Empty> {
        Response::new(status_code, ContentType::TextHtml, io::empty(), 0)
    }
}
