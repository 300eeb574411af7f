//! Durable storage for the game snapshot
//!
//! The whole game state is small (one group, one round per day), so every
//! committed action writes the full snapshot. Several processes may share
//! one data file (the server and `bingo-users`); writers serialize on an
//! exclusive lock and re-read the snapshot while holding it.

use crate::error::{GameError, GameResult};
use crate::state::export::GameStateExport;
use async_trait::async_trait;
use fs4::fs_std::FileExt;
use std::fs::File;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

#[async_trait]
pub trait Store: Send + Sync {
    /// Load the last saved snapshot, `None` if nothing was saved yet
    async fn load(&self) -> GameResult<Option<GameStateExport>>;

    async fn save(&self, snapshot: &GameStateExport) -> GameResult<()>;

    /// Exclusive write access across processes until the guard is dropped
    async fn lock(&self) -> GameResult<StoreGuard>;
}

/// Held for the duration of one load-modify-save cycle
#[derive(Debug)]
pub struct StoreGuard {
    file: Option<File>,
}

impl StoreGuard {
    /// Guard for stores that are never shared between processes
    pub fn unshared() -> Self {
        Self { file: None }
    }

    pub fn is_file_lock(&self) -> bool {
        self.file.is_some()
    }
}

impl Drop for StoreGuard {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            if let Err(e) = FileExt::unlock(file) {
                tracing::warn!("Failed to release data file lock: {}", e);
            }
        }
    }
}

/// Snapshot kept as a JSON file, replaced atomically on save
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "bingo-data.json".into());
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn temp_path(&self) -> PathBuf {
        self.sibling(".tmp")
    }

    /// The data file itself is replaced on every save, so the lock lives
    /// in a separate file next to it
    pub fn lock_path(&self) -> PathBuf {
        self.sibling(".lock")
    }
}

#[async_trait]
impl Store for JsonFileStore {
    async fn load(&self) -> GameResult<Option<GameStateExport>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No data file at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(GameError::Storage(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let snapshot: GameStateExport = serde_json::from_str(&raw).map_err(|e| {
            GameError::Storage(format!("Failed to parse {}: {}", self.path.display(), e))
        })?;
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &GameStateExport) -> GameResult<()> {
        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| GameError::Storage(format!("Failed to serialize state: {}", e)))?;

        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| GameError::Storage(format!("Failed to write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            GameError::Storage(format!(
                "Failed to replace {}: {}",
                self.path.display(),
                e
            ))
        })?;

        tracing::debug!("Saved state to {} ({} bytes)", self.path.display(), json.len());
        Ok(())
    }

    async fn lock(&self) -> GameResult<StoreGuard> {
        let path = self.lock_path();
        let file = tokio::task::spawn_blocking(move || {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&path)
                .and_then(|file| FileExt::lock_exclusive(&file).map(|_| file));
            file.map_err(|e| {
                GameError::Storage(format!("Failed to lock {}: {}", path.display(), e))
            })
        })
        .await
        .map_err(|e| GameError::Storage(format!("Lock task failed: {}", e)))??;

        Ok(StoreGuard { file: Some(file) })
    }
}

/// Keeps the snapshot in memory only
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: RwLock<Option<GameStateExport>>,
    fail_saves: std::sync::atomic::AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent saves fail, to exercise rollback
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    pub async fn saved(&self) -> Option<GameStateExport> {
        self.snapshot.read().await.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load(&self) -> GameResult<Option<GameStateExport>> {
        Ok(self.snapshot.read().await.clone())
    }

    async fn save(&self, snapshot: &GameStateExport) -> GameResult<()> {
        if self.fail_saves.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(GameError::Storage("save rejected".to_string()));
        }
        *self.snapshot.write().await = Some(snapshot.clone());
        Ok(())
    }

    async fn lock(&self) -> GameResult<StoreGuard> {
        Ok(StoreGuard::unshared())
    }
}
