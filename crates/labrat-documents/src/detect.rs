//! Media kind detection for uploaded buffers.

use tracing::debug;

use labrat_core::MediaKind;

/// Classify an upload.
///
/// Magic bytes win when they identify a known kind. Otherwise the declared
/// mime type is used, then the filename extension.
pub fn detect_kind(data: &[u8], filename: &str, declared_mime: &str) -> MediaKind {
    if let Some(sniffed) = infer::get(data) {
        let kind = MediaKind::from_mime(sniffed.mime_type());
        if kind != MediaKind::Unknown {
            debug!(filename, sniffed = sniffed.mime_type(), "Media kind from magic bytes");
            return kind;
        }
    }

    let declared = MediaKind::from_mime(declared_mime);
    if declared != MediaKind::Unknown {
        return declared;
    }

    MediaKind::from_filename(filename)
}
