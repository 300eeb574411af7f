use super::{AppState, GameData};
use crate::error::{GameError, GameResult};
use crate::types::{RoundConfiguration, TimeOfDay};
use serde::{Deserialize, Serialize};

/// Raw settings as entered by an admin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub open_time: String,
    pub close_time: String,
    pub cooldown_days: i64,
    pub max_edits: i64,
}

impl SettingsUpdate {
    pub fn parse(&self) -> GameResult<RoundConfiguration> {
        let open_time: TimeOfDay = self.open_time.parse().map_err(GameError::Validation)?;
        let close_time: TimeOfDay = self.close_time.parse().map_err(GameError::Validation)?;
        if open_time >= close_time {
            return Err(GameError::Validation(format!(
                "Open time {} must be before close time {}",
                open_time, close_time
            )));
        }

        let cooldown_days = u32::try_from(self.cooldown_days).map_err(|_| {
            GameError::Validation("Cooldown days must be a non-negative number".to_string())
        })?;
        let max_edits = u32::try_from(self.max_edits).map_err(|_| {
            GameError::Validation("Max edits must be a non-negative number".to_string())
        })?;

        Ok(RoundConfiguration {
            open_time,
            close_time,
            cooldown_days,
            max_edits,
        })
    }
}

impl GameData {
    /// Current configuration, read fresh for every decision
    pub fn round_config(&self) -> GameResult<RoundConfiguration> {
        self.settings
            .clone()
            .ok_or_else(|| GameError::Configuration("Round settings are missing".to_string()))
    }

    /// Install defaults unless settings already exist. Returns true if seeded.
    pub fn seed_default_settings(&mut self) -> bool {
        if self.settings.is_some() {
            return false;
        }
        self.settings = Some(RoundConfiguration::default());
        true
    }
}

impl AppState {
    pub async fn round_config(&self) -> GameResult<RoundConfiguration> {
        self.query(|data| data.round_config()).await
    }

    /// Replace the settings. Takes effect for the next request.
    pub async fn update_settings(&self, update: SettingsUpdate) -> GameResult<RoundConfiguration> {
        let config = update.parse()?;
        let stored = config.clone();
        self.transact(move |data| {
            data.settings = Some(stored);
            Ok(())
        })
        .await?;

        tracing::info!(
            "Settings updated: open {}, close {}, cooldown {} days, max edits {}",
            config.open_time,
            config.close_time,
            config.cooldown_days,
            config.max_edits
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::*;

    fn update(open: &str, close: &str, cooldown: i64, edits: i64) -> SettingsUpdate {
        SettingsUpdate {
            open_time: open.to_string(),
            close_time: close.to_string(),
            cooldown_days: cooldown,
            max_edits: edits,
        }
    }

    #[test]
    fn test_seed_does_not_overwrite() {
        let mut data = GameData::default();
        assert!(data.round_config().is_err());
        assert!(data.seed_default_settings());

        data.settings.as_mut().unwrap().max_edits = 9;
        assert!(!data.seed_default_settings());
        assert_eq!(data.round_config().unwrap().max_edits, 9);
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        assert!(update("9:00", "18:00", 14, 3).parse().is_err());
        assert!(update("18:00", "12:00", 14, 3).parse().is_err());
        assert!(update("12:00", "12:00", 14, 3).parse().is_err());
        assert!(update("12:00", "18:00", -1, 3).parse().is_err());
        assert!(update("12:00", "18:00", 14, -2).parse().is_err());
        assert!(update("12:00", "18:00", 0, 0).parse().is_ok());
    }

    #[tokio::test]
    async fn test_update_takes_effect_immediately() {
        let (state, _clock, _store) = state_at("2024-01-19 13:00").await;
        let a = add_player(&state, "a").await;
        state.submit_word(&a.id, "banana").await.unwrap();

        state
            .update_settings(update("12:00", "18:00", 14, 0))
            .await
            .unwrap();
        let err = state.submit_word(&a.id, "cherry").await.unwrap_err();
        assert_eq!(err, GameError::EditLimit { max_edits: 0 });

        state
            .update_settings(update("14:00", "18:00", 14, 3))
            .await
            .unwrap();
        assert!(matches!(
            state.submit_word(&a.id, "cherry").await.unwrap_err(),
            GameError::Phase(_)
        ));
    }

    #[tokio::test]
    async fn test_invalid_update_leaves_settings_untouched() {
        let (state, _clock, _store) = state_at("2024-01-19 13:00").await;
        assert!(state
            .update_settings(update("25:00", "18:00", 14, 3))
            .await
            .is_err());
        assert_eq!(
            state.round_config().await.unwrap(),
            RoundConfiguration::default()
        );
    }
}
