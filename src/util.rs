// src/util.rs

use chrono::{DateTime, TimeZone};
use std::path::{Path, PathBuf};

/// Banner timestamp, `yyyy-MM-dd HH:mm:ss`.
pub fn format_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Project name = final component of the (canonicalized when possible) root.
/// Not slugified: it has to match sketch file names byte for byte.
pub fn project_name_from_path(p: &Path) -> String {
    let canon: PathBuf = p.canonicalize().unwrap_or_else(|_| p.to_path_buf());
    canon
        .file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| "project".into())
}

/// Forward slashes everywhere so generated includes read the same on every host.
pub fn to_include_path(p: &Path) -> String {
    p.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn timestamp_layout() {
        let at = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(format_timestamp(&at), "2024-03-07 09:05:01");
    }

    #[test]
    fn project_name_keeps_case() {
        assert_eq!(project_name_from_path(Path::new("/nonexistent/Blink")), "Blink");
    }

    #[test]
    fn include_paths_use_forward_slashes() {
        assert_eq!(to_include_path(Path::new("a\\b\\c.ino")), "a/b/c.ino");
    }
}
