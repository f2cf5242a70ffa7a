//! Lazily loaded label cache
//!
//! The mapping file is read on first use and kept until [`LabelCache::reload`]
//! is called. A missing file is not an error: predictions simply carry no
//! labels.

use apiclass_rfc_compiler::labels::LabelMaps;
use apiclass_rfc_compiler::{CompileError, Target};
use parking_lot::RwLock;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

use crate::errors::{InvokeError, Result};

/// Shared, read-mostly view of `label_mappings.txt`
#[derive(Debug)]
pub struct LabelCache {
    path: PathBuf,
    maps: RwLock<Option<Arc<LabelMaps>>>,
}

impl LabelCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            maps: RwLock::new(None),
        }
    }

    /// Cache pre-populated with `maps`; never touches the filesystem.
    pub fn from_maps(maps: LabelMaps) -> Self {
        Self {
            path: PathBuf::new(),
            maps: RwLock::new(Some(Arc::new(maps))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current maps, loading them on first use.
    pub fn get(&self) -> Result<Arc<LabelMaps>> {
        if let Some(maps) = self.maps.read().as_ref() {
            return Ok(Arc::clone(maps));
        }

        let mut slot = self.maps.write();
        // Another thread may have loaded while we waited for the lock
        if let Some(maps) = slot.as_ref() {
            return Ok(Arc::clone(maps));
        }
        let maps = Arc::new(read_maps(&self.path)?);
        *slot = Some(Arc::clone(&maps));
        Ok(maps)
    }

    /// Re-read the mapping file.
    pub fn reload(&self) -> Result<Arc<LabelMaps>> {
        let maps = Arc::new(read_maps(&self.path)?);
        *self.maps.write() = Some(Arc::clone(&maps));
        Ok(maps)
    }

    /// Label for one class id, if known.
    pub fn label(&self, target: Target, class_id: usize) -> Result<Option<String>> {
        Ok(self.get()?.label(target, class_id).map(str::to_string))
    }
}

fn read_maps(path: &Path) -> Result<LabelMaps> {
    match LabelMaps::load(path) {
        Ok(maps) => Ok(maps),
        Err(CompileError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            warn!(
                "Label mapping file {} not found; predictions will carry no labels",
                path.display()
            );
            Ok(LabelMaps::default())
        }
        Err(source) => Err(InvokeError::Labels {
            path: path.to_path_buf(),
            source,
        }),
    }
}
