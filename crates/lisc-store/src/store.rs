//! File-backed database of term lists, counts and scores.
//!
//! The on-disk layout is:
//!
//! ```text
//! <root>/
//!   terms/          term lists, one term per line, synonyms comma-separated
//!   data/counts/    collected CountsMatrix snapshots, <key>.json
//!   data/scores/    computed Score matrices, <key>.json
//! ```

use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use lisc_core::{CountsMatrix, Score, Term, TermSet};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};

const TERMS_DIR: &str = "terms";
const COUNTS_DIR: &str = "data/counts";
const SCORES_DIR: &str = "data/scores";

/// Default database root when `LISC_DATA_DIR` is unset.
pub const DEFAULT_ROOT: &str = "lisc_db";

/// A type that can be saved in the database.
pub trait Persisted: Serialize + DeserializeOwned {
    /// Directory under the root, relative, `/`-separated.
    const DIR: &'static str;
}

impl Persisted for CountsMatrix {
    const DIR: &'static str = COUNTS_DIR;
}

impl Persisted for Score {
    const DIR: &'static str = SCORES_DIR;
}

impl Persisted for TermSet {
    const DIR: &'static str = TERMS_DIR;
}

/// Configuration for locating the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Database root directory.
    pub root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
        }
    }
}

impl StoreConfig {
    /// Create configuration from environment variables.
    ///
    /// Reads:
    /// - `LISC_DATA_DIR` - Optional, defaults to `lisc_db`
    pub fn from_env() -> Self {
        std::env::var("LISC_DATA_DIR")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(|root| Self { root: root.into() })
            .unwrap_or_default()
    }
}

/// Which parts of the directory layout exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Structure {
    pub root: bool,
    pub terms: bool,
    pub counts: bool,
    pub scores: bool,
}

impl Structure {
    pub fn is_complete(&self) -> bool {
        self.root && self.terms && self.counts && self.scores
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = |present: bool| if present { "ok" } else { "missing" };
        writeln!(f, "root         {}", mark(self.root))?;
        writeln!(f, "terms/       {}", mark(self.terms))?;
        writeln!(f, "data/counts/ {}", mark(self.counts))?;
        write!(f, "data/scores/ {}", mark(self.scores))
    }
}

/// A database rooted at one directory.
#[derive(Debug, Clone)]
pub struct Database {
    root: PathBuf,
}

impl Database {
    /// Points at `root` without touching the filesystem.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates the directory layout under `root` if it is not there yet.
    pub fn create(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let db = Self::new(root);
        for dir in [TERMS_DIR, COUNTS_DIR, SCORES_DIR] {
            let path = db.root.join(dir);
            fs::create_dir_all(&path).map_err(|e| StoreError::io(&path, e))?;
        }
        info!("Database ready at {}", db.root.display());
        Ok(db)
    }

    /// Opens the database described by `config`, creating it if needed.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        Self::create(config.root.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn terms_dir(&self) -> PathBuf {
        self.root.join(TERMS_DIR)
    }

    pub fn counts_dir(&self) -> PathBuf {
        self.root.join(COUNTS_DIR)
    }

    pub fn scores_dir(&self) -> PathBuf {
        self.root.join(SCORES_DIR)
    }

    /// Reports which directories of the layout exist.
    pub fn check_structure(&self) -> Structure {
        Structure {
            root: self.root.is_dir(),
            terms: self.terms_dir().is_dir(),
            counts: self.counts_dir().is_dir(),
            scores: self.scores_dir().is_dir(),
        }
    }

    /// Saves `obj` under `key`, overwriting any previous object.
    ///
    /// The snapshot is written to `<key>.json.tmp` and renamed over the
    /// target, so a failed save leaves the previous snapshot intact.
    ///
    /// Returns the path written.
    pub fn save<T: Persisted>(&self, obj: &T, key: &str) -> StoreResult<PathBuf> {
        let path = self.object_path::<T>(key)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
        }

        let tmp = path.with_extension("json.tmp");
        let written = write_json(&tmp, obj)
            .and_then(|()| fs::rename(&tmp, &path).map_err(|e| StoreError::io(&path, e)));
        if let Err(e) = written {
            // Best effort; the original error is what matters
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        info!("Saved {} to {}", key, path.display());
        Ok(path)
    }

    /// Loads the object saved under `key`.
    pub fn load<T: Persisted>(&self, key: &str) -> StoreResult<T> {
        let path = self.object_path::<T>(key)?;
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(path));
            }
            Err(e) => return Err(StoreError::io(&path, e)),
        };

        let obj = serde_json::from_reader(BufReader::new(file))?;
        debug!("Loaded {} from {}", key, path.display());
        Ok(obj)
    }

    /// Keys saved for `T`, sorted.
    pub fn keys<T: Persisted>(&self) -> StoreResult<Vec<String>> {
        let dir = self.root.join(T::DIR);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&dir, e)),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StoreError::io(&dir, e))?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Reads a plain-text term file from `terms/`.
    ///
    /// One term per line; synonyms are separated by commas. Blank lines
    /// are skipped. `file` may omit its `.txt` extension.
    pub fn load_terms(&self, file: &str) -> StoreResult<Vec<Vec<String>>> {
        let name = if file.ends_with(".txt") {
            file.to_string()
        } else {
            format!("{file}.txt")
        };
        validate_key(&name)?;
        let path = self.terms_dir().join(name);

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(path));
            }
            Err(e) => return Err(StoreError::io(&path, e)),
        };

        let mut lists = Vec::new();
        for (n, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let words: Vec<String> = line
                .split(',')
                .map(str::trim)
                .filter(|w| !w.is_empty())
                .map(str::to_string)
                .collect();

            // Validate here so the error names the line
            Term::new(words.iter().cloned()).map_err(|e| StoreError::InvalidTerms {
                path: path.clone(),
                reason: format!("line {}: {}", n + 1, e),
            })?;
            lists.push(words);
        }

        debug!("Read {} terms from {}", lists.len(), path.display());
        Ok(lists)
    }

    /// Reads a term file into a named [`TermSet`].
    pub fn load_term_set(&self, name: &str, file: &str) -> StoreResult<TermSet> {
        let lists = self.load_terms(file)?;
        let mut set = TermSet::new(name);
        set.add_terms(lists, lisc_core::TermKind::Terms)
            .map_err(|e| StoreError::InvalidTerms {
                path: self.terms_dir().join(file),
                reason: e.to_string(),
            })?;
        Ok(set)
    }

    fn object_path<T: Persisted>(&self, key: &str) -> StoreResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(T::DIR).join(format!("{key}.json")))
    }
}

/// Writes `obj` as pretty JSON and syncs it to disk.
fn write_json<T: Serialize>(path: &Path, obj: &T) -> StoreResult<()> {
    let file = File::create(path).map_err(|e| StoreError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, obj)?;
    writer.flush().map_err(|e| StoreError::io(path, e))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| StoreError::io(path, e))
}

/// Keys become file names, so they must be a single path component.
fn validate_key(key: &str) -> StoreResult<()> {
    let bad = key.trim().is_empty()
        || key == "."
        || key == ".."
        || key.contains(['/', '\\', '\0']);
    if bad {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_path_like_keys() {
        for key in ["", "  ", ".", "..", "a/b", "..\\x", "nul\0"] {
            assert!(
                matches!(validate_key(key), Err(StoreError::InvalidKey(_))),
                "{key:?}"
            );
        }
        assert!(validate_key("sweep-2024.v1").is_ok());
    }

    #[test]
    fn new_does_not_touch_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let db = Database::new(tmp.path().join("db"));

        assert!(!db.root().exists());
        assert_eq!(
            db.check_structure(),
            Structure {
                root: false,
                terms: false,
                counts: false,
                scores: false,
            }
        );
    }

    #[test]
    fn create_builds_full_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let db = Database::create(tmp.path().join("db")).unwrap();

        let structure = db.check_structure();
        assert!(structure.is_complete());
        assert!(structure.to_string().contains("data/counts/ ok"));

        // Idempotent
        assert!(Database::create(db.root()).is_ok());
    }

    #[test]
    fn structure_reports_missing_parts() {
        let tmp = tempfile::tempdir().unwrap();
        let db = Database::create(tmp.path()).unwrap();
        fs::remove_dir(db.scores_dir()).unwrap();

        let structure = db.check_structure();
        assert!(!structure.is_complete());
        assert!(structure.counts);
        assert!(structure.to_string().contains("data/scores/ missing"));
    }

    #[test]
    fn config_defaults_to_local_dir() {
        assert_eq!(StoreConfig::default().root, PathBuf::from("lisc_db"));
    }
}
