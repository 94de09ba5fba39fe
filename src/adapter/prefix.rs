//! Mapping logical adapter paths onto drive paths under a fixed root

use crate::error::{Result, SharepointError};

/// Normalize a configured prefix to `/` + the prefix without surrounding slashes
pub fn normalize_prefix(prefix: &str) -> String {
    format!("/{}", prefix.trim_matches('/'))
}

/// Root a logical path under `prefix`
///
/// Empty and `/` map to the prefix itself. Otherwise leading whitespace is
/// dropped and the path is joined under the prefix with one separator.
pub fn apply_prefix(prefix: &str, path: &str) -> String {
    let path = path.trim_start();
    if path.is_empty() || path == "/" {
        return prefix.to_string();
    }

    let base = prefix.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Split a destination into its parent folder (logical, `/`-rooted) and file name
pub fn split_destination(destination: &str) -> Result<(String, String)> {
    let (parent, name) = destination.rsplit_once('/').unwrap_or(("", destination));

    if name.trim().is_empty() {
        return Err(SharepointError::InvalidPath(format!(
            "destination has no file name: {}",
            destination
        )));
    }

    Ok((format!("/{}", parent.trim_start_matches('/')), name.to_string()))
}
