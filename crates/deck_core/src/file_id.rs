use std::sync::LazyLock;

use regex::Regex;

use crate::FileId;

static FILE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/files/(\d+)").expect("valid file id pattern"));

/// Extracts the first run of digits immediately following a `/files/` segment.
///
/// Returns `None` when no such segment exists or the digits overflow a file id.
pub fn resolve_file_id(link: &str) -> Option<FileId> {
    FILE_ID
        .captures(link)
        .and_then(|caps| caps.get(1))
        .and_then(|digits| digits.as_str().parse().ok())
}
