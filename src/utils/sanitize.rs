//! Filename sanitization utilities

/// Characters that are not allowed in file names on at least one major platform
const FORBIDDEN: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Sanitize a name for use as a file or folder name
///
/// Strips filesystem-unsafe characters, collapses runs of whitespace into a
/// single space and trims both ends.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !FORBIDDEN.contains(c))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
