//! Persisted learning state.
//!
//! The knowledge graph lives in one JSON document mapping `concept_id` to
//! [`KnowledgeNode`]. Every mutating operation loads the whole document, changes it
//! and rewrites it atomically (temp file + rename). Study events go to a separate
//! append-only JSON Lines log, see [`analytics`].

pub mod analytics;

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::learning::types::KnowledgeNode;

/// In-memory node collection, ordered by concept id.
pub type NodeMap = BTreeMap<String, KnowledgeNode>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt record in {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn corrupt(path: &Path, source: serde_json::Error) -> Self {
        Self::Corrupt {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// File-backed keyed record store for [`KnowledgeNode`]s.
#[derive(Debug, Clone)]
pub struct KnowledgeStore {
    path: PathBuf,
}

impl KnowledgeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load every node. A missing file is an empty graph.
    ///
    /// Records are sanitized on the way in so the numeric core only ever sees
    /// in-range values. The map key wins over a disagreeing `concept_id` field.
    pub fn load(&self) -> Result<NodeMap, StoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no knowledge graph yet");
                return Ok(NodeMap::new());
            }
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        if contents.trim().is_empty() {
            return Ok(NodeMap::new());
        }

        let mut nodes: NodeMap =
            serde_json::from_str(&contents).map_err(|e| StoreError::corrupt(&self.path, e))?;

        for (id, node) in nodes.iter_mut() {
            if node.concept_id != *id {
                node.concept_id = id.clone();
            }
            if node.sanitize() {
                warn!(concept_id = %id, "clamped out-of-range fields in stored node");
            }
        }

        debug!(path = %self.path.display(), nodes = nodes.len(), "knowledge graph loaded");
        Ok(nodes)
    }

    /// Rewrite the whole document atomically.
    pub fn persist(&self, nodes: &NodeMap) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            }
        }

        let json =
            serde_json::to_vec_pretty(nodes).map_err(|e| StoreError::corrupt(&self.path, e))?;
        write_atomic(&self.path, &json)?;

        debug!(path = %self.path.display(), nodes = nodes.len(), "knowledge graph persisted");
        Ok(())
    }

    /// Delete the store file. Missing files are fine.
    pub fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }
}

/// Write to a sibling temp file, fsync, then rename over `dest`.
fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let tmp_path = dest.with_extension("json.tmp");
    {
        let mut file =
            std::fs::File::create(&tmp_path).map_err(|e| StoreError::io(&tmp_path, e))?;
        file.write_all(bytes)
            .and_then(|()| file.sync_all())
            .map_err(|e| StoreError::io(&tmp_path, e))?;
    }
    std::fs::rename(&tmp_path, dest).map_err(|e| StoreError::io(dest, e))
}
