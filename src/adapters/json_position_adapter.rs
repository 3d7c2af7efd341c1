//! JSON file position store.
//!
//! The file holds one object keyed by symbol. A missing or blank file is an
//! empty store. A corrupt file is a persistence error and is left on disk
//! untouched. Saves go through a sibling temp file and a rename.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::domain::error::SignalError;
use crate::domain::position::PositionState;
use crate::ports::position_port::PositionPort;

pub struct JsonPositionAdapter {
    path: PathBuf,
}

impl JsonPositionAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "position.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl PositionPort for JsonPositionAdapter {
    fn load(&self) -> Result<HashMap<String, PositionState>, SignalError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }

        serde_json::from_str(&content).map_err(|e| SignalError::Persistence {
            reason: format!("corrupt position file {}: {e}", self.path.display()),
        })
    }

    fn save(&self, positions: &HashMap<String, PositionState>) -> Result<(), SignalError> {
        // Sorted keys keep the file diff-friendly.
        let ordered: BTreeMap<&String, &PositionState> = positions.iter().collect();
        let json = serde_json::to_string_pretty(&ordered).map_err(|e| SignalError::Persistence {
            reason: format!("failed to encode positions: {e}"),
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.temp_path();
        fs::write(&tmp, json).map_err(|e| SignalError::Persistence {
            reason: format!("failed to write {}: {e}", tmp.display()),
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| SignalError::Persistence {
            reason: format!("failed to replace {}: {e}", self.path.display()),
        })?;
        Ok(())
    }
}
