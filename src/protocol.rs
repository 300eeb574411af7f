//! Request and response bodies of the JSON API

use crate::state::score::LeaderboardEntry;
use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitWordRequest {
    pub word: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    pub participant_id: ParticipantId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateParticipantRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetPointsRequest {
    pub points: i64,
}

/// Envelope for every successful action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse<T> {
    pub ok: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ActionResponse<T> {
    pub fn with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            ok: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ActionResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            data: None,
        }
    }
}

/// A word of the day with its author, so clients can vote for them
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WordView {
    pub participant_id: ParticipantId,
    pub username: String,
    pub word: String,
}

/// Participant without credential material
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParticipantInfo {
    pub id: ParticipantId,
    pub username: String,
    pub role: Role,
    pub points: i64,
}

impl From<&Participant> for ParticipantInfo {
    fn from(p: &Participant) -> Self {
        Self {
            id: p.id.clone(),
            username: p.username.clone(),
            role: p.role,
            points: p.points,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteResult {
    pub participant: ParticipantInfo,
    pub cooldown: Option<CooldownEntry>,
}

/// Everything the dashboard needs for one request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardView {
    pub me: ParticipantInfo,
    pub today: chrono::NaiveDate,
    pub phase: Phase,
    pub open_time: TimeOfDay,
    pub close_time: TimeOfDay,
    pub own_entry: Option<WordEntry>,
    pub edits_remaining: u32,
    pub visible_words: Vec<WordView>,
    pub leaderboard: Vec<LeaderboardEntry>,
}
