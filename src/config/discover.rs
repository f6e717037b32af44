//! Candidate file discovery.
//!
//! Config files are searched in a fixed priority order inside the resolver's
//! base directory; the first name that exists wins.

use std::path::{Path, PathBuf};

/// Config files to search for, in priority order.
pub const CANDIDATE_FILES: &[&str] = &[
    "config.ini",
    "config.ini.ini",
    "config.ini.txt",
    "config.json",
    "config.json5",
    "config.json.json",
    "config.json.txt",
    "config.js",
];

/// File format implied by a candidate file's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// INI-family syntax (`.ini`, `.ini.txt`).
    Ini,
    /// JSON with comments (`.json`, `.json5`, `.json.txt`). Plain JSON is a
    /// subset of JSON5, so both go through the same decoder.
    Json5,
    /// Legacy executable config module (`.js`). Discovered for compatibility
    /// but rejected by the parser.
    Executable,
}

impl ConfigFormat {
    fn from_name(name: &str) -> Self {
        if name.ends_with(".js") {
            ConfigFormat::Executable
        } else if name.ends_with(".ini") || name.ends_with(".ini.txt") {
            ConfigFormat::Ini
        } else {
            ConfigFormat::Json5
        }
    }
}

/// A discovered config file with its resolved path and implied format.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// The candidate name that matched.
    pub name: &'static str,
    /// Full path of the file inside the base directory.
    pub path: PathBuf,
    /// Format implied by the name.
    pub format: ConfigFormat,
}

/// Find the first candidate config file that exists in `base_dir`.
///
/// Deterministic: the same directory contents always yield the same result.
pub fn discover_config_file(base_dir: &Path) -> Option<DiscoveredFile> {
    CANDIDATE_FILES.iter().copied().find_map(|name| {
        let path = base_dir.join(name);
        if path.exists() {
            Some(DiscoveredFile {
                name,
                path,
                format: ConfigFormat::from_name(name),
            })
        } else {
            None
        }
    })
}
