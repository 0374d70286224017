use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const TIME_ZONE_KEY: &str = "selectedTimezone";

pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("unable to read preference file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid preference JSON in {path} at line {line}, column {column}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("unable to write preference file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unable to back up preference file {path}: {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unable to encode preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

/// On-disk shape of the preference file: one flat object of string values.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreferenceFile {
    pub values: BTreeMap<String, String>,
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: BTreeMap<String, String>,
}

#[cfg(test)]
impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

/// String preferences kept as one flat JSON object on disk.
#[derive(Debug)]
pub struct JsonFilePreferences {
    path: PathBuf,
    file: PreferenceFile,
    backup_before_write: bool,
}

impl JsonFilePreferences {
    /// Opens the store, starting empty when the file is missing or unusable.
    /// A malformed file is moved aside to `<name>.bak` before the first write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (file, backup_before_write) = match load_preferences(&path) {
            Ok(file) => (file, false),
            Err(err) => {
                warn!(%err, "ignoring unusable preference file");
                (PreferenceFile::default(), matches!(err, PrefsError::Parse { .. }))
            }
        };
        Self {
            path,
            file,
            backup_before_write,
        }
    }

    fn save(&mut self) -> Result<(), PrefsError> {
        if self.backup_before_write {
            let backup = backup_path(&self.path);
            fs::rename(&self.path, &backup).map_err(|source| PrefsError::Backup {
                path: self.path.clone(),
                source,
            })?;
            warn!(backup = %backup.display(), "replacing unusable preference file");
            self.backup_before_write = false;
        }
        let text = serde_json::to_string_pretty(&self.file)?;
        fs::write(&self.path, format!("{text}\n")).map_err(|source| PrefsError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl PreferenceStore for JsonFilePreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.file.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        if self.file.values.get(key).map(String::as_str) == Some(value) {
            return;
        }
        self.file.values.insert(key.to_string(), value.to_string());
        match self.save() {
            Ok(()) => debug!(key, path = %self.path.display(), "preference saved"),
            Err(err) => warn!(%err, "preference not persisted"),
        }
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".bak");
    PathBuf::from(name)
}

pub fn load_preferences(path: &Path) -> Result<PreferenceFile, PrefsError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(PreferenceFile::default()),
        Err(source) => {
            return Err(PrefsError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_str(&content).map_err(|source| PrefsError::Parse {
        path: path.to_path_buf(),
        line: source.line(),
        column: source.column(),
        source,
    })
}
