//! Database operations for the flashback review store
//!
//! Handles SQLite initialization, the solved-problem catalogue, per-user SM-2
//! state and the review log. Timestamps are stored as unix seconds.

use crate::error::{FlashbackError, Result};
use crate::models::{FlashbackEntry, Problem, Quality, ReviewItem, ReviewLogEntry, parse_key, sm2};
use chrono::{DateTime, TimeZone, Timelike, Utc};
use log::{debug, info};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};
use std::path::Path;

const ENTRY_COLUMNS: &str = "f.user_handle, p.contest_id, p.problem_index, p.name, p.rating, p.tags,
     f.interval_days, f.repetitions, f.ease_factor, f.last_reviewed_at, f.next_review_at, f.added_at";

/// Opens (creating if needed) the database file and its tables
pub fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    init_database(&conn)?;
    info!("Opened flashback database at {}", path.display());
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_database(&conn)?;
    Ok(conn)
}

/// Creates tables for problems, per-user SM-2 state and the review log
pub fn init_database(conn: &Connection) -> Result<()> {
    // Solved problems, shared between users
    conn.execute(
        "CREATE TABLE IF NOT EXISTS problems (
            problem_key TEXT PRIMARY KEY,
            contest_id INTEGER NOT NULL,
            problem_index TEXT NOT NULL,
            name TEXT NOT NULL,
            rating INTEGER,
            tags TEXT NOT NULL DEFAULT '[]'
        )",
        (),
    )?;

    // SM-2 state, one row per (user, problem)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS flashback_items (
            user_handle TEXT NOT NULL,
            problem_key TEXT NOT NULL,
            interval_days INTEGER NOT NULL DEFAULT 0,
            repetitions INTEGER NOT NULL DEFAULT 0,
            ease_factor REAL NOT NULL DEFAULT 2.5,
            last_reviewed_at INTEGER,
            next_review_at INTEGER NOT NULL,
            added_at INTEGER NOT NULL,
            PRIMARY KEY (user_handle, problem_key),
            FOREIGN KEY (problem_key) REFERENCES problems(problem_key)
        )",
        (),
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_flashback_items_due
         ON flashback_items (user_handle, next_review_at)",
        (),
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS review_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_handle TEXT NOT NULL,
            problem_key TEXT NOT NULL,
            quality INTEGER NOT NULL,
            interval_days INTEGER NOT NULL,
            repetitions INTEGER NOT NULL,
            ease_factor REAL NOT NULL,
            reviewed_at INTEGER NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Inserts a problem or refreshes its metadata. Missing rating/tags on the
/// incoming problem keep what is already stored.
pub fn upsert_problem(problem: &Problem, conn: &Connection) -> Result<()> {
    let tags = serde_json::to_string(&problem.tags)?;
    conn.execute(
        "INSERT INTO problems (problem_key, contest_id, problem_index, name, rating, tags)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(problem_key) DO UPDATE SET
            name = excluded.name,
            rating = COALESCE(excluded.rating, problems.rating),
            tags = CASE WHEN excluded.tags = '[]' THEN problems.tags ELSE excluded.tags END",
        params![
            problem.key(),
            problem.contest_id,
            problem.index,
            problem.name,
            problem.rating,
            tags
        ],
    )?;
    Ok(())
}

/// Adds a solved problem to the user's flashback queue with default SM-2
/// values, due right away.
///
/// Returns false if the user already tracks this problem; its state is left alone.
pub fn add_solved_problem(
    user_handle: &str,
    problem: &Problem,
    now: DateTime<Utc>,
    conn: &Connection,
) -> Result<bool> {
    upsert_problem(problem, conn)?;

    let seed = ReviewItem::new();
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO flashback_items
            (user_handle, problem_key, interval_days, repetitions, ease_factor,
             last_reviewed_at, next_review_at, added_at)
         VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, ?6)",
        params![
            user_handle,
            problem.key(),
            seed.interval,
            seed.repetitions,
            seed.ease_factor,
            now.timestamp()
        ],
    )?;

    if inserted == 1 {
        info!("Added {} to flashback queue of {}", problem.key(), user_handle);
    } else {
        debug!("{} already tracked for {}", problem.key(), user_handle);
    }
    Ok(inserted == 1)
}

/// Retrieves one entry. `problem_key` is normalized, so `1873a` finds `1873A`.
pub fn get_entry(user_handle: &str, problem_key: &str, conn: &Connection) -> Result<FlashbackEntry> {
    let key = normalize_key(problem_key)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS}
         FROM flashback_items f
         JOIN problems p ON p.problem_key = f.problem_key
         WHERE f.user_handle = ?1 AND f.problem_key = ?2"
    ))?;

    let mut rows = stmt.query_map(params![user_handle, key], entry_from_row)?;
    match rows.next() {
        Some(entry) => Ok(entry?),
        None => Err(FlashbackError::NotFound {
            user: user_handle.to_string(),
            key,
        }),
    }
}

/// Retrieves all entries of a user, soonest review first
pub fn get_entries_for_user(user_handle: &str, conn: &Connection) -> Result<Vec<FlashbackEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS}
         FROM flashback_items f
         JOIN problems p ON p.problem_key = f.problem_key
         WHERE f.user_handle = ?1
         ORDER BY f.next_review_at ASC, p.contest_id ASC, p.problem_index ASC"
    ))?;

    let entries = stmt
        .query_map(params![user_handle], entry_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

/// Retrieves entries due for review
///
/// Returns entries where next_review_at <= now, ordered by next_review_at
/// (oldest first).
pub fn get_entries_due_for_review(
    user_handle: &str,
    now: DateTime<Utc>,
    conn: &Connection,
) -> Result<Vec<FlashbackEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS}
         FROM flashback_items f
         JOIN problems p ON p.problem_key = f.problem_key
         WHERE f.user_handle = ?1 AND f.next_review_at <= ?2
         ORDER BY f.next_review_at ASC, p.contest_id ASC, p.problem_index ASC"
    ))?;

    let entries = stmt
        .query_map(params![user_handle, now.timestamp()], entry_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

/// Writes an entry's SM-2 state and review dates back
pub fn update_entry(entry: &FlashbackEntry, conn: &Connection) -> Result<()> {
    let key = entry.problem.key();
    let updated = conn.execute(
        "UPDATE flashback_items
         SET interval_days = ?1, repetitions = ?2, ease_factor = ?3,
             last_reviewed_at = ?4, next_review_at = ?5
         WHERE user_handle = ?6 AND problem_key = ?7",
        params![
            entry.item.interval,
            entry.item.repetitions,
            entry.item.ease_factor,
            entry.last_reviewed_at.map(|t| t.timestamp()),
            entry.next_review_at.timestamp(),
            entry.user_handle,
            key
        ],
    )?;

    if updated == 0 {
        return Err(FlashbackError::NotFound {
            user: entry.user_handle.clone(),
            key,
        });
    }
    Ok(())
}

/// Applies one graded review: runs SM-2 on the stored state, schedules the
/// next review relative to `now` in its own time zone, and logs the grade.
pub fn record_review<Tz: TimeZone>(
    user_handle: &str,
    problem_key: &str,
    quality: Quality,
    now: &DateTime<Tz>,
    conn: &Connection,
) -> Result<FlashbackEntry> {
    let tx = conn.unchecked_transaction()?;

    let mut entry = get_entry(user_handle, problem_key, &tx)?;
    let previous = entry.item;
    let item = sm2::calculate_next_review(quality, &previous);
    let next_review_at = sm2::next_review_date(item.interval, now)?.with_timezone(&Utc);
    let reviewed_at = whole_seconds(now.with_timezone(&Utc));

    entry.item = item;
    entry.last_reviewed_at = Some(reviewed_at);
    entry.next_review_at = whole_seconds(next_review_at);
    update_entry(&entry, &tx)?;

    tx.execute(
        "INSERT INTO review_log
            (user_handle, problem_key, quality, interval_days, repetitions, ease_factor, reviewed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user_handle,
            entry.problem.key(),
            quality.value(),
            item.interval,
            item.repetitions,
            item.ease_factor,
            reviewed_at.timestamp()
        ],
    )?;
    tx.commit()?;

    info!(
        "[Flashback] {} graded {} by {}: interval {}d -> {}d, EF {:.2} -> {:.2}, next {}",
        entry.problem.key(),
        quality,
        user_handle,
        previous.interval,
        item.interval,
        previous.ease_factor,
        item.ease_factor,
        entry.next_review_at.format("%Y-%m-%d %H:%M")
    );
    Ok(entry)
}

/// Inserts or overwrites an entry wholesale, e.g. from an import.
/// The entry is validated first; invalid state is never written.
pub fn restore_entry(entry: &FlashbackEntry, conn: &Connection) -> Result<()> {
    restore_entries(std::slice::from_ref(entry), conn)
}

/// Restores several entries in one transaction: either all are written or none.
pub fn restore_entries(entries: &[FlashbackEntry], conn: &Connection) -> Result<()> {
    let entries = entries
        .iter()
        .cloned()
        .map(FlashbackEntry::validated)
        .collect::<Result<Vec<_>>>()?;

    let tx = conn.unchecked_transaction()?;
    for entry in &entries {
        upsert_problem(&entry.problem, &tx)?;
        tx.execute(
            "INSERT OR REPLACE INTO flashback_items
                (user_handle, problem_key, interval_days, repetitions, ease_factor,
                 last_reviewed_at, next_review_at, added_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                entry.user_handle,
                entry.problem.key(),
                entry.item.interval,
                entry.item.repetitions,
                entry.item.ease_factor,
                entry.last_reviewed_at.map(|t| t.timestamp()),
                entry.next_review_at.timestamp(),
                entry.added_at.timestamp()
            ],
        )?;
    }
    tx.commit()?;
    Ok(())
}

/// Stops tracking a problem for a user, dropping its review history too.
/// Returns false if it wasn't tracked.
pub fn remove_entry(user_handle: &str, problem_key: &str, conn: &Connection) -> Result<bool> {
    let key = normalize_key(problem_key)?;
    let tx = conn.unchecked_transaction()?;
    let removed = tx.execute(
        "DELETE FROM flashback_items WHERE user_handle = ?1 AND problem_key = ?2",
        params![user_handle, key],
    )?;
    tx.execute(
        "DELETE FROM review_log WHERE user_handle = ?1 AND problem_key = ?2",
        params![user_handle, key],
    )?;
    tx.commit()?;
    Ok(removed > 0)
}

/// Review log for one problem, oldest first
pub fn get_review_history(
    user_handle: &str,
    problem_key: &str,
    conn: &Connection,
) -> Result<Vec<ReviewLogEntry>> {
    let key = normalize_key(problem_key)?;
    let mut stmt = conn.prepare(
        "SELECT problem_key, quality, interval_days, repetitions, ease_factor, reviewed_at
         FROM review_log
         WHERE user_handle = ?1 AND problem_key = ?2
         ORDER BY reviewed_at ASC, id ASC",
    )?;

    let history = stmt
        .query_map(params![user_handle, key], |row| {
            Ok(ReviewLogEntry {
                problem_key: row.get(0)?,
                quality: row.get(1)?,
                interval: row.get(2)?,
                repetitions: row.get(3)?,
                ease_factor: row.get(4)?,
                reviewed_at: timestamp_column(row, 5)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(history)
}

fn normalize_key(problem_key: &str) -> Result<String> {
    let (contest_id, index) = parse_key(problem_key)?;
    Ok(format!("{contest_id}{index}"))
}

/// Drops sub-second precision so the returned entry matches what is stored
fn whole_seconds(time: DateTime<Utc>) -> DateTime<Utc> {
    time.with_nanosecond(0).unwrap_or(time)
}

fn timestamp_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let secs: i64 = row.get(idx)?;
    DateTime::from_timestamp(secs, 0).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, secs))
}

fn entry_from_row(row: &Row) -> rusqlite::Result<FlashbackEntry> {
    let tags_json: String = row.get(5)?;
    let tags = serde_json::from_str(&tags_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

    let last_reviewed_at = match row.get::<_, Option<i64>>(9)? {
        Some(_) => Some(timestamp_column(row, 9)?),
        None => None,
    };

    Ok(FlashbackEntry {
        user_handle: row.get(0)?,
        problem: Problem {
            contest_id: row.get(1)?,
            index: row.get(2)?,
            name: row.get(3)?,
            rating: row.get(4)?,
            tags,
        },
        item: ReviewItem {
            interval: row.get(6)?,
            repetitions: row.get(7)?,
            ease_factor: row.get(8)?,
        },
        last_reviewed_at,
        next_review_at: timestamp_column(row, 10)?,
        added_at: timestamp_column(row, 11)?,
    })
}
