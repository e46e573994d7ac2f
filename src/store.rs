use crate::model::GameSnapshot;
use crate::session::Settings;
use crate::stats::Statistics;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that survives between sessions
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub(crate) struct SavedState {
    /// A saved game that cannot be read is dropped on its own, leaving the
    /// statistics and settings intact
    #[serde(default, deserialize_with = "deserialize_game")]
    pub(crate) game: Option<GameSnapshot>,
    #[serde(default)]
    pub(crate) stats: Statistics,
    #[serde(default)]
    pub(crate) settings: Settings,
}

fn deserialize_game<'de, D>(deserializer: D) -> Result<Option<GameSnapshot>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<serde_json::Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match serde_json::from_value::<GameSnapshot>(value) {
        Ok(snapshot) => Ok(Some(snapshot)),
        Err(e) => {
            log::warn!("Discarding unreadable saved game: {e}");
            Ok(None)
        }
    }
}

/// A place to keep a [`SavedState`] between sessions
pub(crate) trait Store: fmt::Debug {
    /// Returns `Ok(None)` if nothing has been saved yet
    fn load(&mut self) -> Result<Option<SavedState>, StoreError>;

    fn save(&mut self, state: &SavedState) -> Result<(), StoreError>;
}

/// Stores state as JSON in a file
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub(crate) fn new(path: PathBuf) -> FileStore {
        FileStore { path }
    }
}

impl Store for FileStore {
    fn load(&mut self) -> Result<Option<SavedState>, StoreError> {
        let src = match fs::read_to_string(&self.path) {
            Ok(src) => src,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&src)
            .map(Some)
            .map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    fn save(&mut self, state: &SavedState) -> Result<(), StoreError> {
        let mut src = serde_json::to_string_pretty(state).map_err(StoreError::Serialize)?;
        src.push('\n');
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        fs::write(&self.path, src).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// Keeps the most recently saved state in memory only
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct MemoryStore {
    state: Option<SavedState>,
}

impl Store for MemoryStore {
    fn load(&mut self) -> Result<Option<SavedState>, StoreError> {
        Ok(self.state.clone())
    }

    fn save(&mut self, state: &SavedState) -> Result<(), StoreError> {
        self.state = Some(state.clone());
        Ok(())
    }
}

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("failed to read state file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse state file {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize state")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write state file {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Open a store at `path`, or at the default location in the user's data
/// directory if `path` is `None`.  If neither is available, state is only kept
/// in memory.
pub(crate) fn open_store(path: Option<PathBuf>) -> Box<dyn Store> {
    match path.or_else(default_state_path) {
        Some(path) => {
            log::debug!("Using state file {}", path.display());
            Box::new(FileStore::new(path))
        }
        None => {
            log::warn!("Could not determine data directory; progress will not be saved");
            Box::new(MemoryStore::default())
        }
    }
}

fn default_state_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("wordle").join("state.json"))
}
