use super::{AppState, GameData};
use crate::error::{GameError, GameResult};
use crate::types::*;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Result of a vote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardOutcome {
    pub participant: Participant,
    /// Cooldown placed on the target's word of the day, if they had one
    pub cooldown: Option<CooldownEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub participant_id: ParticipantId,
    pub username: String,
    pub points: i64,
}

impl GameData {
    /// +1 point for `target_id`, and put their word of the day on cooldown.
    /// Voters may vote for themselves and more than once.
    pub fn award_point(&mut self, target_id: &str, today: NaiveDate) -> GameResult<AwardOutcome> {
        let config = self.round_config()?;
        let participant = self
            .participants
            .get_mut(target_id)
            .ok_or_else(|| GameError::NotFound(format!("Participant '{}' not found", target_id)))?;
        participant.points += 1;
        let participant = participant.clone();

        let word = self.entry_for(target_id, today).map(|e| e.word.clone());
        let cooldown = word.map(|word| self.cooldowns.extend(&word, today, config.cooldown_days));

        Ok(AwardOutcome {
            participant,
            cooldown,
        })
    }

    /// Admin override: set an exact point total
    pub fn set_points(&mut self, participant_id: &str, points: i64) -> GameResult<Participant> {
        let participant = self.participants.get_mut(participant_id).ok_or_else(|| {
            GameError::NotFound(format!("Participant '{}' not found", participant_id))
        })?;
        participant.points = points;
        Ok(participant.clone())
    }

    /// Admin reward: +1 point without touching cooldowns
    pub fn reward_point(&mut self, participant_id: &str) -> GameResult<Participant> {
        let participant = self.participants.get_mut(participant_id).ok_or_else(|| {
            GameError::NotFound(format!("Participant '{}' not found", participant_id))
        })?;
        participant.points += 1;
        Ok(participant.clone())
    }

    /// Points descending; ties broken by name for stable output
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<_> = self
            .participants
            .values()
            .map(|p| LeaderboardEntry {
                participant_id: p.id.clone(),
                username: p.username.clone(),
                points: p.points,
            })
            .collect();
        entries.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then_with(|| a.username.cmp(&b.username))
        });
        entries
    }
}

impl AppState {
    pub async fn award_point(&self, voter_id: &str, target_id: &str) -> GameResult<AwardOutcome> {
        let outcome = self
            .transact(|data| data.award_point(target_id, self.now().date()))
            .await?;

        match &outcome.cooldown {
            Some(cooldown) => tracing::info!(
                "{} voted for {} ({} points), '{}' cooled down until {}",
                voter_id,
                outcome.participant.username,
                outcome.participant.points,
                cooldown.word,
                cooldown.expiry
            ),
            None => tracing::info!(
                "{} voted for {} ({} points), no word today",
                voter_id,
                outcome.participant.username,
                outcome.participant.points
            ),
        }
        Ok(outcome)
    }

    pub async fn set_points(&self, participant_id: &str, points: i64) -> GameResult<Participant> {
        let participant = self
            .transact(|data| data.set_points(participant_id, points))
            .await?;
        tracing::info!("Points of {} set to {}", participant.username, points);
        Ok(participant)
    }

    pub async fn reward_point(&self, participant_id: &str) -> GameResult<Participant> {
        let participant = self
            .transact(|data| data.reward_point(participant_id))
            .await?;
        tracing::info!(
            "Admin rewarded {} ({} points)",
            participant.username,
            participant.points
        );
        Ok(participant)
    }

    pub async fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.query(|data| data.leaderboard()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::*;

    #[tokio::test]
    async fn test_award_point_increments_and_cools_down_word() {
        let (state, _clock, _store) = state_at("2024-01-19 13:00").await;
        let a = add_player(&state, "a").await;
        let b = add_player(&state, "b").await;
        state.submit_word(&b.id, "banana").await.unwrap();

        let outcome = state.award_point(&a.id, &b.id).await.unwrap();
        assert_eq!(outcome.participant.points, 1);
        let cooldown = outcome.cooldown.unwrap();
        assert_eq!(cooldown.word, "banana");
        assert_eq!(cooldown.expiry.to_string(), "2024-02-02");

        assert_eq!(state.get_participant(&b.id).await.unwrap().points, 1);
        assert_eq!(state.get_participant(&a.id).await.unwrap().points, 0);
    }

    #[tokio::test]
    async fn test_award_point_without_word_leaves_ledger_alone() {
        let (state, _clock, _store) = state_at("2024-01-19 13:00").await;
        let a = add_player(&state, "a").await;
        let b = add_player(&state, "b").await;

        let outcome = state.award_point(&a.id, &b.id).await.unwrap();
        assert!(outcome.cooldown.is_none());
        assert!(state.active_cooldowns().await.is_empty());
    }

    #[tokio::test]
    async fn test_repeated_votes_overwrite_cooldown() {
        let (state, clock, _store) = state_at("2024-01-19 13:00").await;
        let a = add_player(&state, "a").await;
        state.submit_word(&a.id, "banana").await.unwrap();
        state.award_point(&a.id, &a.id).await.unwrap();

        clock.set(at("2024-01-19 19:00"));
        state
            .update_settings(crate::state::settings::SettingsUpdate {
                open_time: "12:00".to_string(),
                close_time: "18:00".to_string(),
                cooldown_days: 2,
                max_edits: 3,
            })
            .await
            .unwrap();
        let outcome = state.award_point(&a.id, &a.id).await.unwrap();

        // Self votes and repeat votes are accepted
        assert_eq!(outcome.participant.points, 2);
        assert_eq!(outcome.cooldown.unwrap().expiry.to_string(), "2024-01-21");
        assert_eq!(state.active_cooldowns().await.len(), 1);
    }

    #[tokio::test]
    async fn test_award_point_unknown_target() {
        let (state, _clock, _store) = state_at("2024-01-19 13:00").await;
        let a = add_player(&state, "a").await;
        let err = state.award_point(&a.id, "ghost").await.unwrap_err();
        assert!(matches!(err, GameError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_set_points_and_reward() {
        let (state, _clock, _store) = state_at("2024-01-19 13:00").await;
        let a = add_player(&state, "a").await;
        state.submit_word(&a.id, "banana").await.unwrap();

        assert_eq!(state.set_points(&a.id, 10).await.unwrap().points, 10);
        assert_eq!(state.set_points(&a.id, 4).await.unwrap().points, 4);
        assert_eq!(state.reward_point(&a.id).await.unwrap().points, 5);
        // Reward does not place a cooldown
        assert!(state.active_cooldowns().await.is_empty());

        assert!(state.set_points("ghost", 1).await.is_err());
        assert!(state.reward_point("ghost").await.is_err());
    }

    #[tokio::test]
    async fn test_leaderboard_sorted_by_points_desc() {
        let (state, _clock, _store) = state_at("2024-01-19 13:00").await;
        let a = add_player(&state, "a").await;
        let b = add_player(&state, "b").await;
        let c = add_player(&state, "c").await;
        state.set_points(&a.id, 1).await.unwrap();
        state.set_points(&b.id, 5).await.unwrap();
        state.set_points(&c.id, 3).await.unwrap();

        let board = state.leaderboard().await;
        let names: Vec<_> = board.iter().map(|e| e.username.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
    }
}
