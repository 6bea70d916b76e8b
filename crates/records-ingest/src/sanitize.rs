//! Keeps upload locations out of span fields and log lines.

use std::path::Path;

/// File name of an uploaded file without its directory.
///
/// Upload paths usually point into a per-request temp directory, which is
/// noise in traces.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "<unnamed>".to_string())
}
