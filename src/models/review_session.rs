//! Flashback review session over the entries that are due.
//! Handles multi-round review with SM-2 updates persisted after every grade.

use super::{FlashbackEntry, Quality, rank_by_urgency};
use crate::database::db;
use crate::error::Result;
use chrono::{DateTime, TimeZone, Utc};
use log::info;
use rusqlite::Connection;

/// Manages a review session with multiple rounds.
/// Entries that aren't recalled (grade < 3) are repeated in subsequent rounds.
pub struct ReviewSession {
    pub user_handle: String,
    pub entries: Vec<SessionEntry>,
    pub current_round: Vec<usize>,
    pub current_index: usize,
    pub round_number: usize,
}

#[derive(Clone, Debug)]
pub struct SessionEntry {
    pub entry: FlashbackEntry,
    /// Whether the latest grade in this session was a pass
    pub passed: bool,
}

impl ReviewSession {
    /// Creates a session from due entries, most urgent first.
    pub fn new(user_handle: &str, mut due: Vec<FlashbackEntry>, now: DateTime<Utc>) -> Self {
        rank_by_urgency(&mut due, now);

        let entries: Vec<SessionEntry> = due
            .into_iter()
            .map(|entry| SessionEntry {
                entry,
                passed: false,
            })
            .collect();
        let current_round = (0..entries.len()).collect();

        Self {
            user_handle: user_handle.to_string(),
            entries,
            current_round,
            current_index: 0,
            round_number: 1,
        }
    }

    /// Loads the user's due entries from the store and opens a session on them.
    pub fn start(user_handle: &str, now: DateTime<Utc>, conn: &Connection) -> Result<Self> {
        let due = db::get_entries_due_for_review(user_handle, now, conn)?;
        info!("Starting flashback session for {} with {} due problems", user_handle, due.len());
        Ok(Self::new(user_handle, due, now))
    }

    pub fn current_entry(&self) -> Option<&FlashbackEntry> {
        self.current_round
            .get(self.current_index)
            .and_then(|&idx| self.entries.get(idx))
            .map(|session_entry| &session_entry.entry)
    }

    /// Grades the current entry and stores the new SM-2 state.
    /// Returns the updated entry, or `None` when the session has nothing left.
    pub fn grade_current<Tz: TimeZone>(
        &mut self,
        quality: Quality,
        now: &DateTime<Tz>,
        conn: &Connection,
    ) -> Result<Option<FlashbackEntry>> {
        let Some(&idx) = self.current_round.get(self.current_index) else {
            return Ok(None);
        };
        let Some(session_entry) = self.entries.get_mut(idx) else {
            return Ok(None);
        };

        let updated = db::record_review(
            &self.user_handle,
            &session_entry.entry.problem.key(),
            quality,
            now,
            conn,
        )?;

        session_entry.passed = quality.is_passing();
        session_entry.entry = updated.clone();
        Ok(Some(updated))
    }

    pub fn next_entry(&mut self) {
        if self.current_index + 1 < self.current_round.len() {
            self.current_index += 1;
        } else {
            self.start_next_round();
        }
    }

    /// Starts a new round with entries that weren't recalled.
    /// If none remain, the session is complete.
    fn start_next_round(&mut self) {
        let failed: Vec<usize> = self
            .current_round
            .iter()
            .copied()
            .filter(|&idx| self.entries.get(idx).is_some_and(|e| !e.passed))
            .collect();

        if failed.is_empty() {
            self.current_index = self.current_round.len();
            return;
        }

        self.current_round = failed;
        self.current_index = 0;
        self.round_number += 1;
    }

    pub fn passed_count(&self) -> usize {
        self.current_round
            .iter()
            .filter(|&&idx| self.entries.get(idx).is_some_and(|e| e.passed))
            .count()
    }

    pub fn total_count(&self) -> usize {
        self.current_round.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count() - self.passed_count()
    }

    /// True when every entry in the current round has been recalled.
    pub fn is_completed(&self) -> bool {
        self.passed_count() == self.total_count()
    }

    pub fn phase_message(&self) -> String {
        if self.round_number == 1 {
            format!("Round {}: {} problems", self.round_number, self.total_count())
        } else {
            format!(
                "Round {} (Retry): {} problems to revisit",
                self.round_number,
                self.total_count()
            )
        }
    }
}
