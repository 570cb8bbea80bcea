//! Process-wide engine registry: one shared engine per memory root, with
//! explicit open and close. Never ambient state — tests bypass it with
//! [`Engram::open_in_memory`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex};

use engram_core::config::EngramConfig;
use engram_core::errors::EngramResult;

use crate::engine::Engram;

static REGISTRY: LazyLock<Mutex<HashMap<PathBuf, Arc<Engram>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Open (or reuse) the shared engine for a memory root.
pub fn open_shared(root: &Path, config: EngramConfig) -> EngramResult<Arc<Engram>> {
    let key = root.to_path_buf();
    let mut registry = REGISTRY
        .lock()
        .map_err(|_| engram_core::EngramError::Storage("registry lock poisoned".into()))?;

    if let Some(engine) = registry.get(&key) {
        return Ok(Arc::clone(engine));
    }

    let engine = Arc::new(Engram::open(root, config)?);
    registry.insert(key, Arc::clone(&engine));
    Ok(engine)
}

/// Drop the shared engine for a root. Returns whether one was open.
/// Existing `Arc` handles stay valid; the connections close when the last
/// handle drops.
pub fn close(root: &Path) -> bool {
    REGISTRY
        .lock()
        .map(|mut registry| registry.remove(root).is_some())
        .unwrap_or(false)
}
