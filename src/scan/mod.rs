//! Web root scanning module
//!
//! Responsible for:
//! - Listing the top-level entries of a project's web directory
//! - Classifying them into directories, static files and executable scripts
//! - Applying the restrict/allow policy for script execution
//! - Deterministic ordering of results

pub mod pattern_matcher;

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::constants::{HIDDEN_PREFIX, SCRIPT_EXTENSION};
use crate::models::{script_name, LightspawnError, ScanOptions, ScanResult};

/// Scan `web_root` and classify its entries according to `options`.
///
/// Only file names are returned, never paths. Hidden entries are skipped.
/// Allow-listed applications are added even when absent from the tree.
pub fn scan_web_root(web_root: &Path, options: &ScanOptions) -> Result<ScanResult, LightspawnError> {
    if !web_root.is_dir() {
        return Err(LightspawnError::NotFound {
            what: "Web directory",
            path: web_root.to_path_buf(),
        });
    }

    let mut result = ScanResult::default();

    // Configured entries are only kept when they exist
    result.dirs.extend(existing(web_root, &options.seed_dirs));
    result.files.extend(existing(web_root, &options.seed_files));
    result.scripts.extend(existing(web_root, &options.seed_scripts));

    if !options.default_entry.is_empty() {
        result.scripts.insert(options.default_script());
    }

    let mut present_scripts = BTreeSet::new();

    for entry in fs::read_dir(web_root)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();

        if is_hidden(&name) {
            continue;
        }

        // Follows symlinks, plugin asset directories are usually linked
        if entry.path().is_dir() {
            result.dirs.insert(name);
        } else if !is_script(&name) {
            result.files.insert(name);
        } else {
            if !options.restrict {
                result.scripts.insert(name.clone());
            }
            present_scripts.insert(name);
        }
    }

    for app in options.allow_list.iter().map(|a| a.trim()).filter(|a| !a.is_empty()) {
        if pattern_matcher::is_glob_pattern(app) {
            result.scripts.extend(
                present_scripts
                    .iter()
                    .filter(|script| pattern_matcher::matches_app_pattern(script, app))
                    .cloned(),
            );
        } else {
            result.scripts.insert(script_name(app));
        }
    }

    Ok(result)
}

/// Hidden entries never reach the server configuration
pub fn is_hidden(name: &str) -> bool {
    name.starts_with(HIDDEN_PREFIX)
}

pub fn is_script(name: &str) -> bool {
    name.ends_with(SCRIPT_EXTENSION)
}

fn existing<'a>(web_root: &'a Path, names: &'a [String]) -> impl Iterator<Item = String> + 'a {
    names
        .iter()
        .filter(move |name| !name.is_empty() && web_root.join(name).exists())
        .cloned()
}
