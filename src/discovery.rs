//! Discovery of feature folders and the diagrams they contain.
//!
//! The input root holds one directory per product feature.  Each directory name embeds an
//! ordering number at a fixed token position, for example:
//!
//! ```text
//! diagrams/
//! ├── System Feature 1: Registration/
//! │   ├── Activity Diagram.png
//! │   └── Class Diagram.png
//! ├── System Feature 2: Data Upload/
//! │   └── Sequence Diagram.png
//! └── System Feature 10: Auditing/
//! ```
//!
//! Folders are ordered by that number, diagrams by file name.

use std::cmp::Ordering;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::AppendixError;

const DIAGRAM_EXTENSION: &str = "png";

/// Where the ordering number lives inside a feature folder name.
///
/// The default reads the third whitespace-separated token and keeps the part before a colon, so
/// `"System Feature 3: Upload"` yields `3`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamingConvention {
    token_index: usize,
    delimiter: char,
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self {
            token_index: 2,
            delimiter: ':',
        }
    }
}

impl NamingConvention {
    /// Creates a convention reading the zero-based `token_index` and cutting at `delimiter`.
    pub fn new(token_index: usize, delimiter: char) -> Self {
        Self {
            token_index,
            delimiter,
        }
    }

    pub fn token_index(&self) -> usize {
        self.token_index
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }
}

/// Extracts the ordering number from a feature folder name.
pub fn parse_feature_key(name: &str, naming: &NamingConvention) -> Result<i64, AppendixError> {
    let token = name
        .split_whitespace()
        .nth(naming.token_index)
        .ok_or_else(|| AppendixError::NamingConvention {
            folder: name.to_owned(),
            reason: format!(
                "expected at least {} whitespace-separated tokens",
                naming.token_index + 1
            ),
        })?;

    let digits = token.split(naming.delimiter).next().unwrap_or(token);
    digits
        .parse::<i64>()
        .map_err(|err| AppendixError::NamingConvention {
            folder: name.to_owned(),
            reason: format!("token '{}' is not an integer ({})", digits, err),
        })
}

/// A directory grouping the diagrams of one feature.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureFolder {
    name: String,
    key: i64,
    path: PathBuf,
    diagrams: Vec<PathBuf>,
}

impl FeatureFolder {
    /// Folder name as found on disk.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordering number parsed from the name.
    pub fn key(&self) -> i64 {
        self.key
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Heading shown for the feature: the folder name with underscores turned into spaces.
    pub fn title(&self) -> String {
        self.name.replace('_', " ")
    }

    /// Diagrams in lexical file name order.
    pub fn diagrams(&self) -> &[PathBuf] {
        &self.diagrams
    }
}

/// Lists the feature folders below `root`, ordered by their numeric key.
///
/// Regular files in the root are ignored.  Folders sharing a key are ordered by name.
pub fn discover_features(
    root: impl AsRef<Path>,
    naming: &NamingConvention,
) -> Result<Vec<FeatureFolder>, AppendixError> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(AppendixError::InputNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut features = Vec::new();
    for path in list_directory(root)? {
        if !path.is_dir() {
            continue;
        }
        let name = file_name_lossy(&path);
        let key = parse_feature_key(&name, naming)?;
        let diagrams = discover_diagrams(&path)?;
        debug!("Feature '{}' (key {}) has {} diagram(s)", name, key, diagrams.len());
        features.push(FeatureFolder {
            name,
            key,
            path,
            diagrams,
        });
    }

    features.sort_by(|a, b| match a.key.cmp(&b.key) {
        Ordering::Equal => a.name.cmp(&b.name),
        other => other,
    });

    info!(
        "Discovered {} feature folder(s) in {}",
        features.len(),
        root.display()
    );
    Ok(features)
}

/// Lists the `*.png` files directly inside `folder`, sorted by file name.
///
/// Hidden files and directories are skipped and the extension match is case-sensitive, mirroring
/// a shell `*.png` glob.  Each call re-reads the directory.
pub fn discover_diagrams(folder: impl AsRef<Path>) -> Result<Vec<PathBuf>, AppendixError> {
    let mut diagrams: Vec<PathBuf> = list_directory(folder.as_ref())?
        .into_iter()
        .filter(|path| is_diagram(path))
        .collect();
    diagrams.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(diagrams)
}

fn is_diagram(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(true);
    !hidden && path.is_file() && path.extension() == Some(OsStr::new(DIAGRAM_EXTENSION))
}

fn list_directory(path: &Path) -> Result<Vec<PathBuf>, AppendixError> {
    let io_error = |source| AppendixError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut entries = Vec::new();
    for entry in fs::read_dir(path).map_err(io_error)? {
        entries.push(entry.map_err(io_error)?.path());
    }
    Ok(entries)
}

fn file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
