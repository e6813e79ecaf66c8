//! Output file naming.

/// Suffix appended to the stem of every transcoded file.
pub const COMPRESSED_SUFFIX: &str = "_compressed";

/// Derive an output file name from `original`.
///
/// Strips the original extension (the text after the last `.` of the final
/// path component), appends `suffix`, then `.new_extension`.
///
/// ```
/// use mediashrink_av::derive_name;
///
/// assert_eq!(derive_name("song.wav", "_compressed", "mp3"), "song_compressed.mp3");
/// assert_eq!(derive_name("clip.mov", "_compressed", "mp4"), "clip_compressed.mp4");
/// ```
pub fn derive_name(original: &str, suffix: &str, new_extension: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original);
    let stem = match base.rfind('.') {
        // A leading dot marks a hidden file, not an extension.
        Some(0) | None => base,
        Some(idx) => &base[..idx],
    };
    let extension = new_extension.trim_start_matches('.');
    format!("{stem}{suffix}.{extension}")
}

/// [`derive_name`] with the standard `_compressed` suffix.
pub fn compressed_name(original: &str, new_extension: &str) -> String {
    derive_name(original, COMPRESSED_SUFFIX, new_extension)
}
