//! File name grammar and file lookup below the serving root

use std::fs::File;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};
use crate::log;
use crate::response::Response;

lazy_static! {
    static ref SERVABLE_PATH: Regex =
        Regex::new(r"^/(file[0-9]\.html|image[0-9]\.jpg)$").unwrap();
}

/// Directory the served files live in.
///
/// Only request paths of the shape `/fileN.html` or `/imageN.jpg` (one digit)
/// are ever resolved, so nothing outside the root can be reached.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServeRoot {
    root: PathBuf,
}

impl ServeRoot {
    /// Serve files from `root`.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// The serving directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `true` if `path` matches the file name grammar.
    #[must_use]
    pub fn is_servable(path: &str) -> bool {
        SERVABLE_PATH.is_match(path)
    }

    /// File system location of request `path`.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if `path` does not match the grammar; the file
    /// system is not touched in that case.
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        if !Self::is_servable(path) {
            return Err(Error::NotFound(PathBuf::from(path)));
        }
        Ok(self.root.join(path.strip_prefix('/').unwrap_or(path)))
    }

    /// Opens the file for request `path` as a `200 OK` response.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the path is not servable or no readable
    /// regular file exists for it.
    pub fn open(&self, path: &str) -> Result<Response<File>> {
        let location = self.resolve(path)?;
        Response::from_file(&location).map_err(|err| {
            log::debug!("{}: {err}", location.display());
            Error::NotFound(location)
        })
    }
}

impl Default for ServeRoot {
    fn default() -> Self {
        Self::new(crate::server_config::ROOT_DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn temp_root(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "tiny-fileserver-root-{name}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn grammar() {
        for ok in ["/file0.html", "/file9.html", "/image1.jpg"] {
            assert!(ServeRoot::is_servable(ok), "{ok}");
        }
        for bad in [
            "/file12.html",
            "/../etc/passwd",
            "/file1.htm",
            "/image1.jpeg",
            "file1.html",
            "//file1.html",
            "/dir/file1.html",
            "/file1.html?x=1",
            "/File1.html",
            "/",
            "",
        ] {
            assert!(!ServeRoot::is_servable(bad), "{bad}");
        }
    }

    #[test]
    fn resolve_strips_leading_slash() {
        let root = ServeRoot::new("/srv/data");
        assert_eq!(
            root.resolve("/file3.html").unwrap(),
            Path::new("/srv/data/file3.html")
        );
        assert!(matches!(
            root.resolve("/../etc/passwd"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn open_existing_and_missing() {
        let dir = temp_root("open");
        fs::write(dir.join("file1.html"), b"0123456789").unwrap();
        fs::create_dir(dir.join("image2.jpg")).unwrap();
        let root = ServeRoot::new(&dir);

        let response = root.open("/file1.html").unwrap();
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.data_length(), 10);

        let err = root.open("/nofile9.html").unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert!(matches!(root.open("/file2.html"), Err(Error::NotFound(_))));
        // a directory is not a servable file
        assert!(matches!(root.open("/image2.jpg"), Err(Error::NotFound(_))));

        fs::remove_dir_all(&dir).unwrap();
    }
}
