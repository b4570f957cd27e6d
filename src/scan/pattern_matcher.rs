//! Pattern matching for allow-listed applications
//!
//! Allow-list entries are plain application names (`frontend_dev`) or glob
//! patterns (`*_dev`), auto-detected from the pattern characters.

use glob::Pattern;

/// Check if an allow-list entry contains glob pattern characters
pub fn is_glob_pattern(entry: &str) -> bool {
    entry.contains('*') || entry.contains('?') || entry.contains('[')
}

/// Match a script name against an allow-list glob.
///
/// The pattern is tried against the full script name (`frontend_dev.php`)
/// and against the application name without its extension (`frontend_dev`).
/// An invalid pattern matches nothing.
pub fn matches_app_pattern(script: &str, pattern: &str) -> bool {
    let Ok(pattern) = Pattern::new(pattern) else {
        return false;
    };

    let app = script
        .strip_suffix(crate::constants::SCRIPT_EXTENSION)
        .unwrap_or(script);

    pattern.matches(script) || pattern.matches(app)
}
