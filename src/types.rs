use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Opaque ID types
pub type ParticipantId = String;
pub type WordEntryId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    ClosedBefore,
    Open,
    ClosedAfter,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Player,
    Admin,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "player" => Ok(Role::Player),
            "admin" => Ok(Role::Admin),
            other => Err(format!(
                "Invalid role '{}'. Allowed: player, admin",
                other
            )),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Player => f.pad("player"),
            Role::Admin => f.pad("admin"),
        }
    }
}

/// Time of day with minute precision, written as zero-padded "HH:MM"
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn as_naive(&self) -> NaiveTime {
        self.0
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // Fixed width only, so lexical and chronological order agree
        if s.len() != 5 {
            return Err(format!("Invalid time '{}', expected HH:MM", s));
        }
        NaiveTime::parse_from_str(s, "%H:%M")
            .map(Self)
            .map_err(|_| format!("Invalid time '{}', expected HH:MM", s))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The four tunable round parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundConfiguration {
    pub open_time: TimeOfDay,
    pub close_time: TimeOfDay,
    pub cooldown_days: u32,
    pub max_edits: u32,
}

impl Default for RoundConfiguration {
    fn default() -> Self {
        Self {
            open_time: TimeOfDay(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default()),
            close_time: TimeOfDay(NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default()),
            cooldown_days: 14,
            max_edits: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub username: String,
    /// Argon2id PHC string
    pub password_hash: String,
    pub role: Role,
    pub points: i64,
    pub created_at: NaiveDateTime,
}

impl Participant {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// One participant's word for one calendar day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WordEntry {
    pub id: WordEntryId,
    pub participant_id: ParticipantId,
    pub date: NaiveDate,
    /// Normalized (trimmed, lowercase)
    pub word: String,
    pub edit_count: u32,
    pub created_at: NaiveDateTime,
}

/// A word that cannot be submitted until after `expiry`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CooldownEntry {
    pub word: String,
    pub expiry: NaiveDate,
}
