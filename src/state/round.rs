//! The daily round: one secret word per participant, bounded edits, no
//! duplicate words on the same day, and reveal after the close time.

use super::{AppState, GameData};
use crate::error::{GameError, GameResult};
use crate::protocol::{DashboardView, WordView};
use crate::types::*;
use chrono::{NaiveDate, NaiveDateTime};

/// Longest accepted word, in characters
pub const MAX_WORD_CHARS: usize = 100;

/// Normalize a word for storage and comparison (trim whitespace, lowercase)
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Normalize and validate raw input
pub fn validate_word(raw: &str) -> GameResult<String> {
    let word = normalize(raw);
    if word.is_empty() {
        return Err(GameError::Validation("Word must not be empty".to_string()));
    }
    if word.chars().count() > MAX_WORD_CHARS {
        return Err(GameError::Validation(format!(
            "Word must be at most {} characters",
            MAX_WORD_CHARS
        )));
    }
    if let Some(bad) = word
        .chars()
        .find(|c| !c.is_alphabetic() && !c.is_whitespace())
    {
        return Err(GameError::Validation(format!(
            "Word may only contain letters and spaces (found '{}')",
            bad
        )));
    }
    Ok(word)
}

/// What a successful submission did
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Created(WordEntry),
    Unchanged(WordEntry),
    Changed(WordEntry),
}

impl SubmitOutcome {
    pub fn entry(&self) -> &WordEntry {
        match self {
            SubmitOutcome::Created(e) | SubmitOutcome::Unchanged(e) | SubmitOutcome::Changed(e) => {
                e
            }
        }
    }

    pub fn message(&self) -> String {
        match self {
            SubmitOutcome::Created(e) => format!("Word '{}' logged in", e.word),
            SubmitOutcome::Unchanged(e) => format!("Word '{}' is already your word", e.word),
            SubmitOutcome::Changed(e) => format!(
                "Word changed to '{}' ({} change(s) used)",
                e.word, e.edit_count
            ),
        }
    }
}

impl GameData {
    pub fn entry_for(&self, participant_id: &str, date: NaiveDate) -> Option<&WordEntry> {
        self.words
            .values()
            .find(|e| e.participant_id == participant_id && e.date == date)
    }

    /// All entries of one day, oldest first
    pub fn entries_on(&self, date: NaiveDate) -> Vec<WordEntry> {
        let mut entries: Vec<_> = self
            .words
            .values()
            .filter(|e| e.date == date)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        entries
    }

    pub fn submit_word(
        &mut self,
        participant_id: &str,
        raw_word: &str,
        now: NaiveDateTime,
    ) -> GameResult<SubmitOutcome> {
        let word = validate_word(raw_word)?;
        let config = self.round_config()?;
        let today = now.date();

        match config.phase_at(now.time()) {
            Phase::Open => {}
            Phase::ClosedBefore => {
                return Err(GameError::Phase(format!(
                    "Submissions open at {}",
                    config.open_time
                )))
            }
            Phase::ClosedAfter => {
                return Err(GameError::Phase(
                    "Dinner has started, no more changes".to_string(),
                ))
            }
        }

        if !self.participants.contains_key(participant_id) {
            return Err(GameError::NotFound(format!(
                "Participant '{}' not found",
                participant_id
            )));
        }

        if let Some(cooldown) = self.cooldowns.active_entry(&word, today) {
            return Err(GameError::Cooldown {
                word: cooldown.word.clone(),
                expiry: cooldown.expiry,
            });
        }

        let taken_by_other = self
            .words
            .values()
            .any(|e| e.date == today && e.word == word && e.participant_id != participant_id);
        if taken_by_other {
            return Err(GameError::Conflict(
                "Someone else already chose this word today".to_string(),
            ));
        }

        let existing_id = self.entry_for(participant_id, today).map(|e| e.id.clone());
        let Some(existing_id) = existing_id else {
            let entry = WordEntry {
                id: ulid::Ulid::new().to_string(),
                participant_id: participant_id.to_string(),
                date: today,
                word,
                edit_count: 0,
                created_at: now,
            };
            self.words.insert(entry.id.clone(), entry.clone());
            return Ok(SubmitOutcome::Created(entry));
        };

        let entry = self
            .words
            .get_mut(&existing_id)
            .ok_or_else(|| GameError::NotFound("Word entry vanished".to_string()))?;

        if entry.word == word {
            return Ok(SubmitOutcome::Unchanged(entry.clone()));
        }
        if entry.edit_count >= config.max_edits {
            return Err(GameError::EditLimit {
                max_edits: config.max_edits,
            });
        }

        entry.word = word;
        entry.edit_count += 1;
        Ok(SubmitOutcome::Changed(entry.clone()))
    }

    /// Remove today's entry. Allowed any time before the close time
    /// (also before the window opens). Returns the removed entry.
    pub fn withdraw_word(
        &mut self,
        participant_id: &str,
        now: NaiveDateTime,
    ) -> GameResult<Option<WordEntry>> {
        let config = self.round_config()?;
        if config.phase_at(now.time()) == Phase::ClosedAfter {
            return Err(GameError::Phase(
                "Dinner has started, withdrawing is no longer possible".to_string(),
            ));
        }

        let today = now.date();
        let existing_id = self.entry_for(participant_id, today).map(|e| e.id.clone());
        Ok(existing_id.and_then(|id| self.words.remove(&id)))
    }

    /// Today's entries as seen by `participant_id`: everything once dinner
    /// has started or once they committed a word themselves, else nothing
    pub fn visible_words(
        &self,
        participant_id: &str,
        now: NaiveDateTime,
    ) -> GameResult<Vec<WordEntry>> {
        let config = self.round_config()?;
        let today = now.date();
        let revealed = config.phase_at(now.time()) == Phase::ClosedAfter;

        if revealed || self.entry_for(participant_id, today).is_some() {
            Ok(self.entries_on(today))
        } else {
            Ok(Vec::new())
        }
    }
}

impl AppState {
    pub async fn submit_word(&self, participant_id: &str, raw_word: &str) -> GameResult<SubmitOutcome> {
        let outcome = self
            .transact(|data| data.submit_word(participant_id, raw_word, self.now()))
            .await?;
        tracing::info!(
            "Participant {} submitted '{}' for {} (edits: {})",
            participant_id,
            outcome.entry().word,
            outcome.entry().date,
            outcome.entry().edit_count
        );
        Ok(outcome)
    }

    pub async fn withdraw_word(&self, participant_id: &str) -> GameResult<Option<WordEntry>> {
        let removed = self
            .transact(|data| data.withdraw_word(participant_id, self.now()))
            .await?;
        match &removed {
            Some(entry) => tracing::info!(
                "Participant {} withdrew '{}' for {}",
                participant_id,
                entry.word,
                entry.date
            ),
            None => tracing::debug!("Participant {} had no word to withdraw", participant_id),
        }
        Ok(removed)
    }

    pub async fn visible_words(&self, participant_id: &str) -> GameResult<Vec<WordEntry>> {
        self.query(|data| data.visible_words(participant_id, self.now()))
            .await
    }

    /// The participant's own entry for today
    pub async fn own_entry(&self, participant_id: &str) -> Option<WordEntry> {
        self.query(|data| data.entry_for(participant_id, self.now().date()).cloned())
            .await
    }

    /// Phase, own entry, visible words and leaderboard in one consistent read
    pub async fn dashboard(&self, participant_id: &str) -> GameResult<DashboardView> {
        self.query(|data| {
            let now = self.now();
            let me = data.participant(participant_id)?;
            let config = data.round_config()?;
            let today = now.date();
            let own_entry = data.entry_for(participant_id, today).cloned();
            let edits_remaining = config
                .max_edits
                .saturating_sub(own_entry.as_ref().map_or(0, |e| e.edit_count));

            let visible_words = data
                .visible_words(participant_id, now)?
                .into_iter()
                .map(|e| WordView {
                    username: data
                        .participants
                        .get(&e.participant_id)
                        .map(|p| p.username.clone())
                        .unwrap_or_default(),
                    participant_id: e.participant_id,
                    word: e.word,
                })
                .collect();

            Ok(DashboardView {
                me: me.into(),
                today,
                phase: config.phase_at(now.time()),
                open_time: config.open_time,
                close_time: config.close_time,
                own_entry,
                edits_remaining,
                visible_words,
                leaderboard: data.leaderboard(),
            })
        })
        .await
    }
}
