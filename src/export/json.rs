//! JSON import/export of a user's flashback deck.
//! Saves and loads ReviewDeck structures to/from JSON files.

use crate::database::db;
use crate::error::Result;
use crate::models::{FlashbackEntry, ReviewDeck};
use log::info;
use rusqlite::Connection;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Exports a deck to a pretty-printed JSON file at the specified path.
pub fn export_json_to_path(deck: &ReviewDeck, path: &Path) -> Result<()> {
    let json_string = serde_json::to_string_pretty(deck)?;
    let mut file = File::create(path)?;
    file.write_all(json_string.as_bytes())?;
    info!(
        "Exported {} entries for {} to {}",
        deck.entries.len(),
        deck.user_handle,
        path.display()
    );
    Ok(())
}

/// Imports a deck from a JSON file.
/// Returns an error if the file doesn't exist or contains invalid JSON.
pub fn import_json(path: &Path) -> Result<ReviewDeck> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let deck: ReviewDeck = serde_json::from_str(&contents)?;
    info!("Deck of '{}' imported from {}", deck.user_handle, path.display());
    Ok(deck)
}

/// Writes every entry of the deck into the store, replacing existing state.
/// Entries are filed under the deck's user handle. A single invalid entry
/// rejects the whole import.
pub fn import_into_database(deck: &ReviewDeck, conn: &Connection) -> Result<usize> {
    let entries: Vec<_> = deck
        .entries
        .iter()
        .map(|entry| FlashbackEntry {
            user_handle: deck.user_handle.clone(),
            ..entry.clone()
        })
        .collect();
    db::restore_entries(&entries, conn)?;
    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlashbackError;
    use crate::models::Problem;
    use chrono::{TimeZone, Utc};
    use std::fs;

    fn create_test_deck() -> ReviewDeck {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap();
        let mut reviewed = FlashbackEntry::new("jiangly", Problem::new(1873, "C", "Target Practice"), now);
        reviewed.last_reviewed_at = Some(now);
        reviewed.item.repetitions = 2;
        reviewed.item.interval = 6;
        ReviewDeck::new(
            "jiangly",
            vec![
                FlashbackEntry::new("jiangly", Problem::new(4, "A", "Watermelon"), now),
                reviewed,
            ],
        )
    }

    #[test]
    fn test_export_json_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.json");

        export_json_to_path(&create_test_deck(), &path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"userHandle\": \"jiangly\""));
        assert!(written.contains("\"easeFactor\": 2.5"));
    }

    #[test]
    fn test_import_json() {
        let json_content = r#"{
  "userHandle": "jiangly",
  "entries": [
    {
      "userHandle": "jiangly",
      "problem": { "contestId": 4, "index": "A", "name": "Watermelon" },
      "item": { "interval": 6, "repetitions": 2, "easeFactor": 2.36 },
      "lastReviewedAt": "2026-10-13T08:00:00Z",
      "nextReviewAt": "2026-10-19T08:00:00Z",
      "addedAt": "2026-10-01T08:00:00Z"
    }
  ]
}"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.json");
        fs::write(&path, json_content).unwrap();

        let deck = import_json(&path).unwrap();
        assert_eq!(deck.user_handle, "jiangly");
        assert_eq!(deck.entries.len(), 1);
        assert_eq!(deck.entries[0].problem.key(), "4A");
        assert_eq!(deck.entries[0].item.interval, 6);
        assert!(deck.entries[0].last_reviewed_at.is_some());
    }

    #[test]
    fn test_export_then_import_into_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roundtrip.json");
        let original = create_test_deck();
        export_json_to_path(&original, &path).unwrap();

        let conn = db::open_in_memory().unwrap();
        let imported = import_json(&path).unwrap();
        assert_eq!(import_into_database(&imported, &conn).unwrap(), 2);

        let stored = db::get_entry("jiangly", "1873C", &conn).unwrap();
        assert_eq!(stored, original.entries[1]);
    }

    #[test]
    fn test_import_normalizes_index_and_rejects_bad_ease_factor() {
        let entry_json = |index: &str, ease_factor: f64| {
            format!(
                r#"{{
      "userHandle": "u",
      "problem": {{ "contestId": 4, "index": "{index}", "name": "Watermelon" }},
      "item": {{ "interval": 6, "repetitions": 2, "easeFactor": {ease_factor} }},
      "lastReviewedAt": "2026-10-13T08:00:00Z",
      "nextReviewAt": "2026-10-19T08:00:00Z",
      "addedAt": "2026-10-01T08:00:00Z"
    }}"#
            )
        };
        let dir = tempfile::tempdir().unwrap();
        let conn = db::open_in_memory().unwrap();

        let path = dir.path().join("lowercase.json");
        fs::write(
            &path,
            format!(r#"{{ "userHandle": "u", "entries": [{}] }}"#, entry_json("a", 2.5)),
        )
        .unwrap();
        assert_eq!(import_into_database(&import_json(&path).unwrap(), &conn).unwrap(), 1);
        let stored = db::get_entry("u", "4A", &conn).unwrap();
        assert_eq!(stored.problem.index, "A");
        assert!(db::remove_entry("u", "4A", &conn).unwrap());

        let path = dir.path().join("low_ease.json");
        fs::write(
            &path,
            format!(r#"{{ "userHandle": "u", "entries": [{}] }}"#, entry_json("a", 0.4)),
        )
        .unwrap();
        assert!(matches!(
            import_into_database(&import_json(&path).unwrap(), &conn),
            Err(FlashbackError::InvalidEntry { .. })
        ));
        assert!(db::get_entries_for_user("u", &conn).unwrap().is_empty());
    }

    #[test]
    fn test_import_nonexistent_file() {
        let result = import_json(Path::new("nonexistent_file_xyz123.json"));
        assert!(matches!(result, Err(FlashbackError::Io(_))));
    }

    #[test]
    fn test_import_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invalid.json");
        fs::write(&path, "{ this is not valid json }").unwrap();

        assert!(matches!(import_json(&path), Err(FlashbackError::Json(_))));
    }
}
