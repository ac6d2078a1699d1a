//! Syntactic path handling for the logical namespace.
//!
//! Logical paths use a single fixed separator and never touch the host
//! filesystem; normalization is purely textual and total over strings.

pub const PATH_SEPARATOR: char = '/';

/// Resolve `path` against `current_directory` into a canonical absolute
/// path: one separator convention, `.`/`..`/empty segments collapsed, the
/// root spelled as a single separator.
///
/// `..` saturates at the root rather than escaping it. No existence check
/// of any kind is performed.
pub fn normalize_path(path: &str, current_directory: &str) -> String {
    let whole = if path.starts_with(PATH_SEPARATOR) {
        path.to_string()
    } else {
        format!("{current_directory}{PATH_SEPARATOR}{path}")
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in whole.split(PATH_SEPARATOR) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return PATH_SEPARATOR.to_string();
    }

    let mut normalized = String::with_capacity(whole.len());
    for segment in segments {
        normalized.push(PATH_SEPARATOR);
        normalized.push_str(segment);
    }
    normalized
}

/// The final component of a logical path.
pub fn path_filename(path: &str) -> &str {
    path.rsplit(PATH_SEPARATOR).next().unwrap_or(path)
}
