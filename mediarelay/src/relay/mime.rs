//! Accepted media types and the file extensions they are stored under.

/// Content types the relay accepts, with the extension used for the stored object.
pub const MIME_EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpg", "jpg"),
    ("image/jpeg", "jpeg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("video/mp4", "mp4"),
    ("video/mpeg", "mpeg"),
    ("video/webm", "webm"),
];

/// Strip parameters (`; charset=...`) and normalize case.
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Look up the stored extension for a `content-type` header value.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = essence(content_type);
    MIME_EXTENSIONS
        .iter()
        .find(|(mime, _)| *mime == essence)
        .map(|(_, ext)| *ext)
}
