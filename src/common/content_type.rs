use std::path::Path;

macro_rules! create_content_types {
    ($(($ct:ident, $text:expr, [$($ext:expr),*])),+) => {
        #[doc = "Content-Type header values the file server sends"]
        #[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
        #[allow(missing_docs)]
        pub enum ContentType {
            $($ct),+
        }

        impl ContentType {
            /// Header value, e.g. `text/html`
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$ct => $text),+
                }
            }

            fn from_extension(ext: &str) -> Option<Self> {
                $(
                    if [$($ext),*].iter().any(|e: &&str| e.eq_ignore_ascii_case(ext)) {
                        return Some(Self::$ct);
                    }
                )+
                None
            }
        }
    };
}

// fallback entry last, without extensions
create_content_types!(
    (TextHtml, "text/html", ["html", "htm"]),
    (ImageJpeg, "image/jpeg", ["jpg", "jpeg"]),
    (ApplicationOctetStream, "application/octet-stream", [])
);

impl ContentType {
    /// Content type by the extension of `path`, `application/octet-stream`
    /// when unknown.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .unwrap_or(Self::ApplicationOctetStream)
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::ContentType;

    #[test]
    fn sniff_by_extension() {
        for (path, ct) in [
            ("data/file1.html", ContentType::TextHtml),
            ("index.HTM", ContentType::TextHtml),
            ("image3.jpg", ContentType::ImageJpeg),
            ("photo.jpeg", ContentType::ImageJpeg),
            ("archive.tar.gz", ContentType::ApplicationOctetStream),
            ("README", ContentType::ApplicationOctetStream),
            ("dir.html/", ContentType::TextHtml),
        ] {
            assert_eq!(ContentType::from_path(Path::new(path)), ct, "{path}");
        }
    }

    #[test]
    fn header_values() {
        assert_eq!(ContentType::TextHtml.to_string(), "text/html");
        assert_eq!(ContentType::ImageJpeg.as_str(), "image/jpeg");
        assert_eq!(
            ContentType::ApplicationOctetStream.as_str(),
            "application/octet-stream"
        );
    }
}
