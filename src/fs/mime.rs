//! MIME type lookup by file extension.

use std::path::Path;

/// MIME type for `filename`'s extension, compared case-insensitively.
///
/// Returns `None` when the file has no extension or it is not recognised.
pub fn mime_type(filename: impl AsRef<Path>) -> Option<&'static str> {
    let ext = filename.as_ref().extension()?.to_str()?.to_ascii_lowercase();
    mime_guess::from_ext(&ext).first_raw()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions() {
        assert_eq!(mime_type("index.html"), Some("text/html"));
        assert_eq!(mime_type("photo.JPG"), Some("image/jpeg"));
        assert_eq!(mime_type("/srv/data/report.json"), Some("application/json"));
    }

    #[test]
    fn unknown_or_missing_extension() {
        assert_eq!(mime_type("Makefile"), None);
        assert_eq!(mime_type("blob.notarealextension"), None);
    }
}
