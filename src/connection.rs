//! One client connection: read the request, decide, respond

use std::fs::File;
use std::path::PathBuf;

use crate::common::{limits, Method, StatusCode};
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::log;
use crate::request::Request;
use crate::response::{Response, ResponseBox};
use crate::serve_root::ServeRoot;
use crate::transport::Transport;

/// Decides the response to `request`.
///
/// The path is checked against the file name grammar first, so a bad path
/// is `404` whatever the method. `GET` and `HEAD` then get the file,
/// everything else is a bad request.
///
/// # Errors
///
/// - [`Error::NotFound`] for a path outside the grammar or a missing file
/// - [`Error::BadRequest`] for methods other than `GET` and `HEAD`
pub fn respond_to(request: &Request, root: &ServeRoot) -> Result<Response<File>> {
    if !ServeRoot::is_servable(request.path()) {
        return Err(Error::NotFound(PathBuf::from(request.path())));
    }
    match request.method() {
        method if method.is_retrieval() => root.open(request.path()),
        Method::Post => Err(Error::BadRequest("uploads are not supported".to_owned())),
        method => Err(Error::BadRequest(format!("unknown method `{method}`"))),
    }
}

/// Serves a single request on the connected `client`.
///
/// Any failure to read or answer the request is turned into a `400` or
/// `404` response. Only failing to write the response is returned as an
/// error. The caller closes `client` afterwards in every case.
///
/// # Errors
///
/// [`Error::Io`] if the response could not be sent.
pub fn process_connection(
    client: &mut Transport,
    peer: &Endpoint,
    root: &ServeRoot,
    limits: &limits::Config,
) -> Result<StatusCode> {
    let (response, send_body): (ResponseBox, bool) =
        match Request::read_from(client, limits.header_max_size) {
            Ok(request) => match respond_to(&request, root) {
                Ok(response) => {
                    log::info!("{peer} \"{request}\" 200 {}", response.data_length());
                    (response.boxed(), *request.method() == Method::Get)
                }
                Err(err) => {
                    log::info!("{peer} \"{request}\" {}: {err}", err.status_code());
                    (Response::empty(err.status_code()).boxed(), false)
                }
            },
            Err(err) => {
                log::warn!("{peer}: {err}");
                (Response::empty(err.status_code()).boxed(), false)
            }
        };

    let status_code = response.status_code();
    response
        .raw_print(&mut *client, send_body)
        .map_err(|err| Error::io("send response", err))?;
    Ok(status_code)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn request(raw: &str) -> Request {
        Request::parse(raw.as_bytes()).unwrap()
    }

    #[test]
    fn dispatch_on_path_then_method() {
        let dir = std::env::temp_dir().join(format!(
            "tiny-fileserver-connection-{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("image4.jpg"), [0xff, 0xd8, 0xff]).unwrap();
        let root = ServeRoot::new(&dir);

        let get = respond_to(&request("GET /image4.jpg HTTP/1.0\r\n\r\n"), &root).unwrap();
        assert_eq!(get.status_code(), 200);
        assert_eq!(get.content_type().as_str(), "image/jpeg");
        assert_eq!(get.data_length(), 3);

        let head = respond_to(&request("HEAD /image4.jpg HTTP/1.0\r\n\r\n"), &root).unwrap();
        assert_eq!(head.data_length(), 3);

        for (raw, status) in [
            ("POST /image4.jpg HTTP/1.0\r\n\r\n", 400),
            ("DELETE /image4.jpg HTTP/1.0\r\n\r\n", 400),
            ("POST /upload HTTP/1.0\r\n\r\n", 404),
            ("GET /image5.jpg HTTP/1.0\r\n\r\n", 404),
            ("GET /file12.html HTTP/1.0\r\n\r\n", 404),
            ("GET /../etc/passwd HTTP/1.0\r\n\r\n", 404),
        ] {
            let err = respond_to(&request(raw), &root).unwrap_err();
            assert_eq!(err.status_code(), status, "{raw:?}");
        }

        fs::remove_dir_all(&dir).unwrap();
    }
}
