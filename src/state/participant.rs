use super::{AppState, GameData};
use crate::error::{GameError, GameResult};
use crate::types::*;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::NaiveDateTime;
use rand::Rng;

const SALT_BYTES: usize = 16;

/// Hash a secret with Argon2id, stored as a PHC string
/// (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`)
pub fn hash_secret(secret: &str) -> GameResult<String> {
    let mut salt = [0u8; SALT_BYTES];
    rand::rng().fill(&mut salt[..]);
    let salt = SaltString::encode_b64(&salt)
        .map_err(|e| GameError::Configuration(format!("Invalid password salt: {}", e)))?;
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| GameError::Configuration(format!("Password hashing failed: {}", e)))
}

/// Check a secret against a stored PHC string. Malformed hashes never match.
pub fn verify_secret(secret: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok()
}

/// One line of the declarative participant list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionEntry {
    pub username: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
}

impl GameData {
    pub fn participant_by_name(&self, username: &str) -> Option<&Participant> {
        self.participants.values().find(|p| p.username == username)
    }

    pub fn participant(&self, id: &str) -> GameResult<&Participant> {
        self.participants
            .get(id)
            .ok_or_else(|| GameError::NotFound(format!("Participant '{}' not found", id)))
    }

    pub fn create_participant(
        &mut self,
        username: &str,
        password: &str,
        role: Role,
        now: NaiveDateTime,
    ) -> GameResult<Participant> {
        let username = username.trim();
        if username.is_empty() {
            return Err(GameError::Validation("Username must not be empty".to_string()));
        }
        if password.is_empty() {
            return Err(GameError::Validation("Password must not be empty".to_string()));
        }
        if self.participant_by_name(username).is_some() {
            return Err(GameError::Conflict(format!(
                "User '{}' already exists",
                username
            )));
        }

        let participant = Participant {
            id: ulid::Ulid::new().to_string(),
            username: username.to_string(),
            password_hash: hash_secret(password)?,
            role,
            points: 0,
            created_at: now,
        };
        self.participants
            .insert(participant.id.clone(), participant.clone());
        Ok(participant)
    }

    /// Create missing participants and update secret and role of existing ones
    pub fn provision(
        &mut self,
        entries: &[ProvisionEntry],
        now: NaiveDateTime,
    ) -> GameResult<ProvisionReport> {
        let mut report = ProvisionReport::default();
        for entry in entries {
            let existing = self
                .participant_by_name(entry.username.trim())
                .map(|p| p.id.clone());
            match existing {
                Some(id) => {
                    if let Some(p) = self.participants.get_mut(&id) {
                        if !verify_secret(&entry.password, &p.password_hash) {
                            p.password_hash = hash_secret(&entry.password)?;
                        }
                        p.role = entry.role;
                        report.updated.push(p.username.clone());
                    }
                }
                None => {
                    let p = self.create_participant(&entry.username, &entry.password, entry.role, now)?;
                    report.created.push(p.username);
                }
            }
        }
        Ok(report)
    }

    /// Participants in creation order
    pub fn participants_sorted(&self) -> Vec<Participant> {
        let mut list: Vec<_> = self.participants.values().cloned().collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        list
    }
}

impl AppState {
    pub async fn create_participant(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> GameResult<Participant> {
        let participant = self
            .transact(|data| data.create_participant(username, password, role, self.now()))
            .await?;
        tracing::info!(
            "Created participant {} ({}) as {}",
            participant.username,
            participant.id,
            participant.role
        );
        Ok(participant)
    }

    pub async fn list_participants(&self) -> Vec<Participant> {
        self.query(|data| data.participants_sorted()).await
    }

    pub async fn get_participant(&self, id: &str) -> GameResult<Participant> {
        self.query(|data| data.participant(id).cloned()).await
    }

    pub async fn provision_participants(
        &self,
        entries: &[ProvisionEntry],
    ) -> GameResult<ProvisionReport> {
        if entries.is_empty() {
            return Ok(ProvisionReport::default());
        }
        let report = self
            .transact(|data| data.provision(entries, self.now()))
            .await?;
        tracing::info!(
            "Provisioned participants: {} created, {} updated",
            report.created.len(),
            report.updated.len()
        );
        Ok(report)
    }

    /// Create the `admin` account if no participant has that name
    pub async fn ensure_admin(&self, password: &str) -> GameResult<Option<Participant>> {
        if self
            .query(|data| data.participant_by_name("admin").is_some())
            .await
        {
            return Ok(None);
        }
        let admin = self.create_participant("admin", password, Role::Admin).await?;
        tracing::warn!("Created default admin account 'admin', change its password");
        Ok(Some(admin))
    }

    /// Resolve credentials to a participant
    pub async fn authenticate(&self, username: &str, password: &str) -> Option<Participant> {
        let participant = self
            .query(|data| data.participant_by_name(username).cloned())
            .await?;
        // Argon2 verification runs outside the state lock
        verify_secret(password, &participant.password_hash).then_some(participant)
    }

    pub async fn change_password(
        &self,
        participant_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> GameResult<()> {
        if new_password.is_empty() {
            return Err(GameError::Validation(
                "New password must not be empty".to_string(),
            ));
        }
        self.transact(|data| {
            let participant = data.participants.get_mut(participant_id).ok_or_else(|| {
                GameError::NotFound(format!("Participant '{}' not found", participant_id))
            })?;
            if !verify_secret(current_password, &participant.password_hash) {
                return Err(GameError::Validation(
                    "Current password is incorrect".to_string(),
                ));
            }
            participant.password_hash = hash_secret(new_password)?;
            Ok(())
        })
        .await?;
        tracing::info!("Participant {} changed their password", participant_id);
        Ok(())
    }
}
