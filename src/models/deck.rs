//! A user's full set of flashback entries
use super::{FlashbackEntry, VisualState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDeck {
    pub user_handle: String,
    pub entries: Vec<FlashbackEntry>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckSummary {
    pub total: usize,
    pub due: usize,
    pub fresh: usize,
    pub fading: usize,
    pub rusted: usize,
    pub never_reviewed: usize,
}

impl ReviewDeck {
    pub fn new(user_handle: &str, entries: Vec<FlashbackEntry>) -> Self {
        Self {
            user_handle: user_handle.to_string(),
            entries,
        }
    }

    pub fn summary(&self, now: DateTime<Utc>) -> DeckSummary {
        let mut summary = DeckSummary {
            total: self.entries.len(),
            ..DeckSummary::default()
        };
        for entry in &self.entries {
            if entry.is_due(now) {
                summary.due += 1;
            }
            if entry.last_reviewed_at.is_none() {
                summary.never_reviewed += 1;
            }
            match entry.health(now).visual_state {
                VisualState::Fresh => summary.fresh += 1,
                VisualState::Fading => summary.fading += 1,
                VisualState::Rusted => summary.rusted += 1,
            }
        }
        summary
    }
}
