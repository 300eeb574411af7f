//! Serializable snapshot of the full game state.
//!
//! Used as the on-disk format and for the admin export/import endpoints.

use super::cooldown::CooldownLedger;
use super::{AppState, GameData};
use crate::error::{GameError, GameResult};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Schema version for export format compatibility
pub const EXPORT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStateExport {
    /// Schema version for forward compatibility
    pub schema_version: u32,
    /// Export timestamp (ISO8601)
    pub exported_at: String,
    pub participants: HashMap<ParticipantId, Participant>,
    pub words: HashMap<WordEntryId, WordEntry>,
    #[serde(default)]
    pub cooldowns: CooldownLedger,
    pub settings: Option<RoundConfiguration>,
}

impl GameStateExport {
    pub fn from_data(data: &GameData) -> Self {
        Self {
            schema_version: EXPORT_SCHEMA_VERSION,
            exported_at: chrono::Utc::now().to_rfc3339(),
            participants: data.participants.clone(),
            words: data.words.clone(),
            cooldowns: data.cooldowns.clone(),
            settings: data.settings.clone(),
        }
    }

    pub fn into_data(self) -> GameData {
        GameData {
            participants: self.participants,
            words: self.words,
            cooldowns: self.cooldowns,
            settings: self.settings,
        }
    }

    /// Validate the export before import
    pub fn validate(&self) -> GameResult<()> {
        if self.schema_version > EXPORT_SCHEMA_VERSION {
            return Err(GameError::Validation(format!(
                "Export schema version {} is newer than supported version {}. \
                 Please update the server.",
                self.schema_version, EXPORT_SCHEMA_VERSION
            )));
        }

        for (id, participant) in &self.participants {
            if *id != participant.id {
                return Err(GameError::Validation(format!(
                    "Participant keyed '{}' has id '{}'",
                    id, participant.id
                )));
            }
        }

        let mut seen_owner_day = std::collections::HashSet::new();
        let mut seen_word_day = std::collections::HashSet::new();
        for (id, entry) in &self.words {
            if !self.participants.contains_key(&entry.participant_id) {
                return Err(GameError::Validation(format!(
                    "Word entry '{}' references participant '{}' which doesn't exist",
                    id, entry.participant_id
                )));
            }
            if !seen_owner_day.insert((entry.participant_id.as_str(), entry.date)) {
                return Err(GameError::Validation(format!(
                    "Participant '{}' has more than one word on {}",
                    entry.participant_id, entry.date
                )));
            }
            if !seen_word_day.insert((entry.word.as_str(), entry.date)) {
                return Err(GameError::Validation(format!(
                    "Word '{}' is held twice on {}",
                    entry.word, entry.date
                )));
            }
        }

        for (word, entry) in self.cooldowns.iter() {
            if *word != entry.word {
                return Err(GameError::Validation(format!(
                    "Cooldown keyed '{}' is for word '{}'",
                    word, entry.word
                )));
            }
        }

        Ok(())
    }
}

impl AppState {
    pub async fn export_state(&self) -> GameStateExport {
        self.query(GameStateExport::from_data).await
    }

    /// Replace all state with the snapshot
    pub async fn import_state(&self, export: GameStateExport) -> GameResult<()> {
        export.validate()?;
        let participants = export.participants.len();
        self.transact(move |data| {
            *data = export.into_data();
            Ok(())
        })
        .await?;
        tracing::info!("Imported state with {} participants", participants);
        Ok(())
    }
}
