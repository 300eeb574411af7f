//! Cooldown ledger: words that recently earned a point cannot be reused
//! until their expiry day has passed.

use super::AppState;
use crate::types::CooldownEntry;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// At most one entry per normalized word
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CooldownLedger {
    entries: HashMap<String, CooldownEntry>,
}

impl CooldownLedger {
    /// The entry blocking `word` today, if any
    pub fn active_entry(&self, word: &str, today: NaiveDate) -> Option<&CooldownEntry> {
        self.entries
            .get(word)
            .filter(|entry| entry.expiry > today)
    }

    pub fn is_blocked(&self, word: &str, today: NaiveDate) -> bool {
        self.active_entry(word, today).is_some()
    }

    /// Set the expiry of `word` to `today + cooldown_days`, replacing any
    /// earlier expiry (later or not)
    pub fn extend(&mut self, word: &str, today: NaiveDate, cooldown_days: u32) -> CooldownEntry {
        let expiry = today
            .checked_add_days(chrono::Days::new(u64::from(cooldown_days)))
            .unwrap_or(NaiveDate::MAX);
        let entry = CooldownEntry {
            word: word.to_string(),
            expiry,
        };
        self.entries.insert(word.to_string(), entry.clone());
        entry
    }

    pub fn get(&self, word: &str) -> Option<&CooldownEntry> {
        self.entries.get(word)
    }

    /// Entries still blocking on `today`, soonest expiry first
    pub fn active(&self, today: NaiveDate) -> Vec<CooldownEntry> {
        let mut active: Vec<_> = self
            .entries
            .values()
            .filter(|entry| entry.expiry > today)
            .cloned()
            .collect();
        active.sort_by(|a, b| a.expiry.cmp(&b.expiry).then_with(|| a.word.cmp(&b.word)));
        active
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CooldownEntry)> {
        self.entries.iter()
    }
}

impl AppState {
    /// Cooldowns in force today (admin view)
    pub async fn active_cooldowns(&self) -> Vec<CooldownEntry> {
        self.query(|data| data.cooldowns.active(self.now().date()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_unknown_word_is_not_blocked() {
        let ledger = CooldownLedger::default();
        assert!(!ledger.is_blocked("banana", day("2024-01-19")));
    }

    #[test]
    fn test_blocked_until_expiry_day_inclusive() {
        let mut ledger = CooldownLedger::default();
        let entry = ledger.extend("banana", day("2024-01-06"), 14);
        assert_eq!(entry.expiry, day("2024-01-20"));

        assert!(ledger.is_blocked("banana", day("2024-01-19")));
        // expiry > today is required, so the expiry day itself is free again
        assert!(!ledger.is_blocked("banana", day("2024-01-20")));
        assert!(!ledger.is_blocked("banana", day("2024-01-21")));
    }

    #[test]
    fn test_extend_overwrites_instead_of_stacking() {
        let mut ledger = CooldownLedger::default();
        ledger.extend("banana", day("2024-01-10"), 14);
        ledger.extend("banana", day("2024-01-12"), 14);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get("banana").unwrap().expiry, day("2024-01-26"));

        // A shorter cooldown overwrites a later expiry too
        ledger.extend("banana", day("2024-01-12"), 1);
        assert_eq!(ledger.get("banana").unwrap().expiry, day("2024-01-13"));
    }

    #[test]
    fn test_zero_day_cooldown_never_blocks() {
        let mut ledger = CooldownLedger::default();
        ledger.extend("kiwi", day("2024-01-12"), 0);
        assert!(!ledger.is_blocked("kiwi", day("2024-01-12")));
    }

    #[test]
    fn test_active_lists_only_unexpired() {
        let mut ledger = CooldownLedger::default();
        ledger.extend("apple", day("2024-01-01"), 3);
        ledger.extend("pear", day("2024-01-10"), 5);
        ledger.extend("plum", day("2024-01-10"), 2);

        let active = ledger.active(day("2024-01-11"));
        let words: Vec<_> = active.iter().map(|e| e.word.as_str()).collect();
        assert_eq!(words, vec!["plum", "pear"]);
    }
}
