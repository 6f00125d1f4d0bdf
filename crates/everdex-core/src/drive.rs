//! Volume labels for result rows.
//!
//! A best-effort reading of the path text, not a mount-table lookup. Paths
//! that merely contain a single-letter directory get that letter as their
//! label; the label is only ever displayed.

use std::borrow::Cow;

/// Label used when no drive can be inferred.
pub const UNKNOWN_DRIVE: &str = "Unknown";

/// Infer a short drive label (usually a single uppercase letter) from a path.
pub fn drive_label(path: &str) -> Cow<'static, str> {
    let path = path.trim();
    if path.is_empty() {
        return Cow::Borrowed(UNKNOWN_DRIVE);
    }

    // C:\Users, d:/data
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        return Cow::Owned(char::from(bytes[0].to_ascii_uppercase()).to_string());
    }

    // /media/<user>/<label>/...
    if path.starts_with("/media/") {
        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() >= 4 {
            if let Some(letter) = parts[3..].iter().find_map(|part| single_letter(part)) {
                return Cow::Owned(letter);
            }
            return Cow::Owned(parts[3].to_uppercase());
        }
    }

    // /mnt/<letter>/...
    if path.starts_with("/mnt/") {
        let parts: Vec<&str> = path.split('/').collect();
        if let Some(letter) = parts.get(2).and_then(|part| single_letter(part)) {
            return Cow::Owned(letter);
        }
    }

    // any /<letter>/ segment
    if let Some(window) = bytes
        .windows(3)
        .find(|w| w[0] == b'/' && w[1].is_ascii_alphabetic() && w[2] == b'/')
    {
        return Cow::Owned(char::from(window[1].to_ascii_uppercase()).to_string());
    }

    Cow::Borrowed(UNKNOWN_DRIVE)
}

/// The uppercased segment if it is exactly one alphabetic character.
fn single_letter(segment: &str) -> Option<String> {
    let mut chars = segment.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_alphabetic() => Some(c.to_uppercase().collect()),
        _ => None,
    }
}
