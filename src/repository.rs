use crate::error::{Result, ScriptError};
use crate::logw;
use crate::model::VideoScript;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;

/// Name of the single slot holding the whole collection.
pub const STORAGE_KEY: &str = "my-video-scripts";

/// Durable list of generated scripts, kept as one JSON array on disk.
///
/// Reads fail soft: a missing or corrupt slot is an empty collection. Writes
/// replace the whole slot through a sibling temp file and a rename, so a
/// reader never sees a half-written array. `append` and `replace` hold a
/// write lock from load to save; clones share it.
#[derive(Debug, Clone)]
pub struct ScriptRepository {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl ScriptRepository {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            path: data_dir.as_ref().join(format!("{STORAGE_KEY}.json")),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load_all(&self) -> Vec<VideoScript> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                logw(format!("Failed to read {}: {}", self.path.display(), e));
                return Vec::new();
            }
        };
        if text.trim().is_empty() {
            return Vec::new();
        }

        match serde_json::from_str(&text) {
            Ok(scripts) => scripts,
            Err(e) => {
                logw(format!(
                    "Stored scripts at {} are corrupt, starting empty: {}",
                    self.path.display(),
                    e
                ));
                Vec::new()
            }
        }
    }

    pub async fn save_all(&self, scripts: &[VideoScript]) -> Result<()> {
        let data = serde_json::to_vec(scripts)
            .map_err(|e| ScriptError::Persistence(format!("serialize scripts: {e}")))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                ScriptError::Persistence(format!("create {}: {e}", parent.display()))
            })?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &data)
            .await
            .map_err(|e| ScriptError::Persistence(format!("write {}: {e}", tmp.display())))?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            if let Err(rm) = fs::remove_file(&tmp).await {
                logw(format!("Failed to remove {}: {}", tmp.display(), rm));
            }
            return Err(ScriptError::Persistence(format!(
                "replace {}: {e}",
                self.path.display()
            )));
        }
        Ok(())
    }

    /// Puts `script` in front of the stored collection.
    pub async fn append(&self, script: VideoScript) -> Result<Vec<VideoScript>> {
        let _guard = self.write_lock.lock().await;
        let mut scripts = self.load_all().await;
        scripts.insert(0, script);
        self.save_all(&scripts).await?;
        Ok(scripts)
    }

    /// Substitutes the entry with the same id in place. An unknown id leaves
    /// the slot untouched and returns the collection as loaded.
    pub async fn replace(&self, id: &str, script: VideoScript) -> Result<Vec<VideoScript>> {
        let _guard = self.write_lock.lock().await;
        let mut scripts = self.load_all().await;
        let Some(pos) = scripts.iter().position(|s| s.id == id) else {
            logw(format!("No stored script with id {id}; nothing replaced"));
            return Ok(scripts);
        };
        scripts[pos] = script;
        self.save_all(&scripts).await?;
        Ok(scripts)
    }

    pub async fn find(&self, id: &str) -> Option<VideoScript> {
        self.load_all().await.into_iter().find(|s| s.id == id)
    }

    /// Display order: newest first. Stored order is not changed.
    pub async fn list_recent(&self) -> Vec<VideoScript> {
        let mut scripts = self.load_all().await;
        sort_recent_first(&mut scripts);
        scripts
    }
}

pub fn sort_recent_first(scripts: &mut [VideoScript]) {
    scripts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
