//! Per-user progress tracking
//!
//! One `UserProgress` record per authenticated username, created lazily on
//! first write and kept for the life of the process. The outer map is
//! read-mostly; each record carries its own lock so users never contend with
//! each other and readers never see a half-built record.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// Accumulated completion/pin/score state for one user
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserProgress {
    pub completed: HashSet<String>,
    pub pinned: HashSet<String>,
    pub scores: HashMap<String, u32>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Concurrent progress store keyed by username
#[derive(Debug, Default)]
pub struct ProgressStore {
    users: RwLock<HashMap<String, Arc<RwLock<UserProgress>>>>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotently mark a section completed.
    pub fn mark_completed(&self, username: &str, section_id: &str) {
        let record = self.record(username);
        let mut progress = record.write().unwrap();
        progress.completed.insert(section_id.to_string());
        progress.last_updated = Some(Utc::now());
    }

    /// Flip a section's pinned state: remove when present, add otherwise.
    pub fn toggle_pinned(&self, username: &str, section_id: &str) {
        let record = self.record(username);
        let mut progress = record.write().unwrap();
        if !progress.pinned.remove(section_id) {
            progress.pinned.insert(section_id.to_string());
        }
        progress.last_updated = Some(Utc::now());
    }

    /// Upsert a quiz/assessment score. Last write wins.
    pub fn record_score(&self, username: &str, assessment_id: &str, score: u32) {
        let record = self.record(username);
        let mut progress = record.write().unwrap();
        progress.scores.insert(assessment_id.to_string(), score);
        progress.last_updated = Some(Utc::now());
    }

    pub fn is_completed(&self, username: &str, section_id: &str) -> bool {
        self.peek(username)
            .map(|r| r.read().unwrap().completed.contains(section_id))
            .unwrap_or(false)
    }

    pub fn is_pinned(&self, username: &str, section_id: &str) -> bool {
        self.peek(username)
            .map(|r| r.read().unwrap().pinned.contains(section_id))
            .unwrap_or(false)
    }

    /// Snapshot of completed section ids; empty for unknown users.
    pub fn completed(&self, username: &str) -> HashSet<String> {
        self.peek(username)
            .map(|r| r.read().unwrap().completed.clone())
            .unwrap_or_default()
    }

    /// Snapshot of pinned section ids; empty for unknown users.
    pub fn pinned(&self, username: &str) -> HashSet<String> {
        self.peek(username)
            .map(|r| r.read().unwrap().pinned.clone())
            .unwrap_or_default()
    }

    /// Snapshot of recorded scores; empty for unknown users.
    pub fn scores(&self, username: &str) -> HashMap<String, u32> {
        self.peek(username)
            .map(|r| r.read().unwrap().scores.clone())
            .unwrap_or_default()
    }

    /// When this user's progress last changed, if ever.
    pub fn last_updated(&self, username: &str) -> Option<DateTime<Utc>> {
        self.peek(username).and_then(|r| r.read().unwrap().last_updated)
    }

    /// Whether any record exists for this user.
    pub fn has_record(&self, username: &str) -> bool {
        self.users.read().unwrap().contains_key(username)
    }

    /// Full snapshot for one user, for view assembly.
    pub fn snapshot(&self, username: &str) -> UserProgress {
        self.peek(username)
            .map(|r| r.read().unwrap().clone())
            .unwrap_or_default()
    }

    fn peek(&self, username: &str) -> Option<Arc<RwLock<UserProgress>>> {
        self.users.read().unwrap().get(username).cloned()
    }

    /// Get or lazily create the user's record. The outer write lock is held
    /// only for the map insert, never across a record update.
    fn record(&self, username: &str) -> Arc<RwLock<UserProgress>> {
        if let Some(record) = self.users.read().unwrap().get(username) {
            return record.clone();
        }
        let mut users = self.users.write().unwrap();
        users.entry(username.to_string()).or_default().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_user_yields_empty_snapshots() {
        let store = ProgressStore::new();
        assert!(store.completed("nobody").is_empty());
        assert!(store.pinned("nobody").is_empty());
        assert!(store.scores("nobody").is_empty());
        assert!(store.last_updated("nobody").is_none());
        assert!(!store.has_record("nobody"));
    }

    #[test]
    fn test_mark_completed_idempotent() {
        let store = ProgressStore::new();
        store.mark_completed("alex", "s1");
        store.mark_completed("alex", "s1");
        assert_eq!(store.completed("alex").len(), 1);
        assert!(store.is_completed("alex", "s1"));
        assert!(store.last_updated("alex").is_some());
    }

    #[test]
    fn test_toggle_pinned_is_an_involution() {
        let store = ProgressStore::new();
        store.toggle_pinned("alex", "s1");
        assert!(store.is_pinned("alex", "s1"));
        store.toggle_pinned("alex", "s1");
        assert!(!store.is_pinned("alex", "s1"));
        // Record persists even when the pin set is empty again.
        assert!(store.has_record("alex"));
    }

    #[test]
    fn test_record_score_last_write_wins() {
        let store = ProgressStore::new();
        store.record_score("alex", "quiz-1", 2);
        let first_update = store.last_updated("alex").unwrap();
        store.record_score("alex", "quiz-1", 2);
        store.record_score("alex", "quiz-1", 3);
        assert_eq!(store.scores("alex")["quiz-1"], 3);
        assert_eq!(store.scores("alex").len(), 1);
        assert!(store.last_updated("alex").unwrap() >= first_update);
    }

    #[test]
    fn test_users_are_independent() {
        let store = ProgressStore::new();
        store.mark_completed("alex", "s1");
        store.toggle_pinned("bo", "s2");
        assert!(store.is_completed("alex", "s1"));
        assert!(!store.is_completed("bo", "s1"));
        assert!(store.is_pinned("bo", "s2"));
        assert!(!store.is_pinned("alex", "s2"));
    }

    #[test]
    fn test_concurrent_writes_land() {
        let store = Arc::new(ProgressStore::new());
        let mut handles = Vec::new();
        for worker in 0..8 {
            let store = store.clone();
            handles.push(std::thread::spawn(move || {
                let user = format!("user-{}", worker % 2);
                for i in 0..50 {
                    store.mark_completed(&user, &format!("s-{worker}-{i}"));
                    store.record_score(&user, &format!("q-{worker}"), i);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        // 4 workers per user, 50 unique sections each.
        assert_eq!(store.completed("user-0").len(), 200);
        assert_eq!(store.completed("user-1").len(), 200);
        assert_eq!(store.scores("user-0").len(), 4);
    }
}
