pub mod cooldown;
pub mod export;
pub mod participant;
pub mod round;
pub mod score;
pub mod settings;

use crate::clock::{Clock, SystemClock};
use crate::error::{GameError, GameResult};
use crate::store::{MemoryStore, Store};
use crate::types::*;
use cooldown::CooldownLedger;
use export::GameStateExport;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Everything that is persisted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameData {
    pub participants: HashMap<ParticipantId, Participant>,
    pub words: HashMap<WordEntryId, WordEntry>,
    pub cooldowns: CooldownLedger,
    pub settings: Option<RoundConfiguration>,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub data: Arc<RwLock<GameData>>,
    pub store: Arc<dyn Store>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// In-memory state on the system clock
    pub fn new() -> Self {
        Self::with_parts(Arc::new(MemoryStore::new()), Arc::new(SystemClock))
    }

    pub fn with_parts(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self {
            data: Arc::new(RwLock::new(GameData::default())),
            store,
            clock,
        }
    }

    /// Restore state from the store, or start empty
    pub async fn load(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> GameResult<Self> {
        let state = Self::with_parts(store, clock);
        {
            let mut guard = state.data.write().await;
            if state.refresh(&mut guard).await? {
                tracing::info!(
                    "Restored {} participants, {} word entries, {} cooldowns",
                    guard.participants.len(),
                    guard.words.len(),
                    guard.cooldowns.len()
                );
            } else {
                tracing::info!("No saved state, starting fresh");
            }
        }
        Ok(state)
    }

    /// Replace `data` with the last committed snapshot, which another
    /// process sharing the store may have written. Returns false if the
    /// store is empty.
    async fn refresh(&self, data: &mut GameData) -> GameResult<bool> {
        let Some(snapshot) = self.store.load().await? else {
            return Ok(false);
        };
        snapshot
            .validate()
            .map_err(|e| GameError::Storage(format!("Stored snapshot is inconsistent: {}", e)))?;
        *data = snapshot.into_data();
        Ok(true)
    }

    /// Run one action as an atomic unit.
    ///
    /// Under the write lock and the store lock, the data is re-read from the
    /// store and the action works on a copy of it. The copy is persisted and
    /// published only if the action and the save both succeed; otherwise it
    /// is dropped and nothing changes.
    pub async fn transact<T, F>(&self, action: F) -> GameResult<T>
    where
        F: FnOnce(&mut GameData) -> GameResult<T>,
    {
        let mut guard = self.data.write().await;
        let _store_lock = self.store.lock().await?;
        self.refresh(&mut guard).await?;

        let mut working = guard.clone();
        let result = action(&mut working)?;
        self.store
            .save(&GameStateExport::from_data(&working))
            .await?;
        *guard = working;
        Ok(result)
    }

    /// Run a read-only query against a consistent, freshly loaded view
    pub async fn query<T, F>(&self, query: F) -> T
    where
        F: FnOnce(&GameData) -> T,
    {
        let mut guard = self.data.write().await;
        if let Err(e) = self.refresh(&mut guard).await {
            tracing::warn!("Reload failed, answering from memory: {}", e);
        }
        let guard = guard.downgrade();
        query(&guard)
    }

    pub fn now(&self) -> chrono::NaiveDateTime {
        self.clock.now()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::NaiveDateTime;

    pub fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    /// State with default settings and a controllable clock
    pub async fn state_at(now: &str) -> (AppState, Arc<FixedClock>, Arc<MemoryStore>) {
        let clock = Arc::new(FixedClock::new(at(now)));
        let store = Arc::new(MemoryStore::new());
        let state = AppState::with_parts(store.clone(), clock.clone());
        state
            .transact(|data| {
                data.seed_default_settings();
                Ok(())
            })
            .await
            .unwrap();
        (state, clock, store)
    }

    pub async fn add_player(state: &AppState, name: &str) -> Participant {
        state
            .create_participant(name, "secret", Role::Player)
            .await
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::JsonFileStore;

    #[tokio::test]
    async fn test_transact_commits_and_persists() {
        let (state, _clock, store) = state_at("2024-01-19 13:00").await;
        let alice = add_player(&state, "alice").await;

        assert!(state
            .query(|data| data.participants.contains_key(&alice.id))
            .await);
        let saved = store.saved().await.expect("saved snapshot");
        assert!(saved.participants.contains_key(&alice.id));
    }

    #[tokio::test]
    async fn test_transact_discards_changes_on_error() {
        let (state, _clock, _store) = state_at("2024-01-19 13:00").await;

        let result: GameResult<()> = state
            .transact(|data| {
                data.settings = None;
                Err(GameError::Validation("nope".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert!(state.query(|data| data.settings.is_some()).await);
    }

    #[tokio::test]
    async fn test_transact_rolls_back_when_save_fails() {
        let (state, _clock, store) = state_at("2024-01-19 13:00").await;
        store.set_fail_saves(true);

        let result = state.create_participant("bob", "pw", Role::Player).await;
        assert_eq!(result.unwrap_err().code(), "STORAGE_ERROR");
        assert!(state.query(|data| data.participants.is_empty()).await);
    }

    #[tokio::test]
    async fn test_load_restores_saved_snapshot() {
        let (state, clock, store) = state_at("2024-01-19 13:00").await;
        let alice = add_player(&state, "alice").await;

        let restored = AppState::load(store, clock).await.unwrap();
        let participant = restored
            .query(|data| data.participants.get(&alice.id).cloned())
            .await;
        assert_eq!(participant.unwrap().username, "alice");
    }

    #[tokio::test]
    async fn test_transact_sees_writes_from_another_process() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bingo.json");
        let clock = Arc::new(FixedClock::new(at("2024-01-19 13:00")));

        let server = AppState::load(Arc::new(JsonFileStore::new(&path)), clock.clone())
            .await
            .unwrap();
        server
            .transact(|data| Ok(data.seed_default_settings()))
            .await
            .unwrap();
        let alice = add_player(&server, "alice").await;

        // A second handle on the same file, as used by `bingo-users`
        let tool = AppState::load(Arc::new(JsonFileStore::new(&path)), clock)
            .await
            .unwrap();
        add_player(&tool, "carol").await;

        // The server has not reloaded yet; its next write must keep carol
        server.submit_word(&alice.id, "banana").await.unwrap();

        let on_disk = JsonFileStore::new(&path).load().await.unwrap().unwrap();
        let mut names: Vec<_> = on_disk
            .participants
            .values()
            .map(|p| p.username.clone())
            .collect();
        names.sort();
        assert_eq!(names, vec!["alice", "carol"]);
        assert_eq!(on_disk.words.len(), 1);

        assert!(server.authenticate("carol", "secret").await.is_some());
    }

    #[tokio::test]
    async fn test_query_reloads_committed_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bingo.json");
        let clock = Arc::new(FixedClock::new(at("2024-01-19 13:00")));

        let server = AppState::load(Arc::new(JsonFileStore::new(&path)), clock.clone())
            .await
            .unwrap();
        assert!(server.list_participants().await.is_empty());

        let tool = AppState::load(Arc::new(JsonFileStore::new(&path)), clock)
            .await
            .unwrap();
        tool.transact(|data| Ok(data.seed_default_settings()))
            .await
            .unwrap();
        add_player(&tool, "carol").await;

        assert_eq!(server.list_participants().await.len(), 1);
    }
}
