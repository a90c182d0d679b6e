use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::{invalid_format, LoadError};

/// Name table for one resource kind: line `n` (zero-based) of the file names the
/// resource with id `n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdList {
    path: PathBuf,
    names: Vec<String>,
    ids_by_name: HashMap<String, u32>,
}

impl IdList {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &text)
    }

    pub fn parse(path: &Path, text: &str) -> Result<Self, LoadError> {
        let mut names = Vec::<String>::new();
        let mut ids_by_name = HashMap::<String, u32>::new();

        for (idx, raw) in text.lines().enumerate() {
            let name = raw.trim_end_matches('\r').trim();
            if name.is_empty() {
                return Err(invalid_format(
                    path,
                    format!("empty entry on line {}", idx + 1),
                ));
            }
            let id = idx as u32;
            if let Some(first) = ids_by_name.get(name) {
                return Err(LoadError::DuplicateId {
                    path: path.to_path_buf(),
                    name: name.to_string(),
                    first_line: *first as usize + 1,
                    line: idx + 1,
                });
            }
            ids_by_name.insert(name.to_string(), id);
            names.push(name.to_string());
        }

        Ok(Self {
            path: path.to_path_buf(),
            names,
            ids_by_name,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, id: u32) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    pub fn id_of(&self, name: &str) -> Option<u32> {
        self.ids_by_name.get(name).copied()
    }
}
