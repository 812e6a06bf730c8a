//! Flashback CLI
//!
//! Spaced-repetition review of solved Codeforces problems.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, anyhow};
use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand};
use flashback::config::{Config, USER_ENV_VAR};
use flashback::database::db;
use flashback::export::json::{export_json_to_path, import_into_database, import_json};
use flashback::models::{parse_key, rank_by_urgency};
use flashback::{FlashbackEntry, Problem, Quality, ReviewDeck, ReviewSession};
use log::info;
use rusqlite::Connection;

/// Flashback - spaced repetition for solved problems
#[derive(Parser)]
#[command(name = "flashback")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Schedule and review solved Codeforces problems with SM-2")]
struct Cli {
    /// Database file (defaults to FLASHBACK_DB, then the platform data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Codeforces handle (defaults to FLASHBACK_USER)
    #[arg(long, short, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Track a solved problem for review
    Add {
        /// Problem key, e.g. 1873A
        key: String,
        /// Problem name
        #[arg(long)]
        name: String,
        /// Problem rating
        #[arg(long)]
        rating: Option<u32>,
        /// Tags (comma-separated)
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },

    /// Grade a review of one problem (quality 0-5)
    Review {
        /// Problem key, e.g. 1873A
        key: String,
        /// 0 = total failure, 3 = minimum passing, 5 = perfect
        quality: String,
    },

    /// List problems due for review, most urgent first
    Due,

    /// List every tracked problem with its health
    List,

    /// Review all due problems interactively
    Session,

    /// Show the review log of a problem
    History {
        /// Problem key, e.g. 1873A
        key: String,
    },

    /// Stop tracking a problem
    Remove {
        /// Problem key, e.g. 1873A
        key: String,
    },

    /// Show deck statistics
    Stats,

    /// Export the user's deck as JSON
    Export {
        /// Output file path
        output: PathBuf,
    },

    /// Import a deck exported as JSON
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = Config::resolve(cli.db, cli.user);
    info!("Using database {}", config.db_path.display());
    let conn = db::open_database(&config.db_path)
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;

    match cli.command {
        Commands::Add {
            key,
            name,
            rating,
            tags,
        } => run_add(&config, &conn, &key, name, rating, tags),
        Commands::Review { key, quality } => run_review(&config, &conn, &key, &quality),
        Commands::Due => run_due(&config, &conn),
        Commands::List => run_list(&config, &conn),
        Commands::Session => run_session(&config, &conn),
        Commands::History { key } => run_history(&config, &conn, &key),
        Commands::Remove { key } => run_remove(&config, &conn, &key),
        Commands::Stats => run_stats(&config, &conn),
        Commands::Export { output } => run_export(&config, &conn, output),
        Commands::Import { file } => run_import(&conn, file),
    }
}

fn require_user(config: &Config) -> anyhow::Result<&str> {
    config
        .user_handle
        .as_deref()
        .ok_or_else(|| anyhow!("No user handle given: pass --user or set {USER_ENV_VAR}"))
}

fn run_add(
    config: &Config,
    conn: &Connection,
    key: &str,
    name: String,
    rating: Option<u32>,
    tags: Vec<String>,
) -> anyhow::Result<()> {
    let user = require_user(config)?;
    let (contest_id, index) = parse_key(key)?;
    let problem = Problem {
        contest_id,
        index,
        name,
        rating,
        tags: tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
    };

    if db::add_solved_problem(user, &problem, Utc::now(), conn)? {
        println!("Tracking {} ({}) - due now", problem.key(), problem.name);
    } else {
        println!("{} is already tracked", problem.key());
    }
    Ok(())
}

fn run_review(config: &Config, conn: &Connection, key: &str, quality: &str) -> anyhow::Result<()> {
    let user = require_user(config)?;
    let quality: Quality = quality.parse()?;
    let entry = db::record_review(user, key, quality, &Local::now(), conn)?;
    print_scheduled(&entry);
    Ok(())
}

fn run_due(config: &Config, conn: &Connection) -> anyhow::Result<()> {
    let user = require_user(config)?;
    let now = Utc::now();
    let mut due = db::get_entries_due_for_review(user, now, conn)?;
    if due.is_empty() {
        println!("Nothing due. Come back later!");
        return Ok(());
    }
    rank_by_urgency(&mut due, now);
    for entry in &due {
        print_entry(entry, now);
    }
    Ok(())
}

fn run_list(config: &Config, conn: &Connection) -> anyhow::Result<()> {
    let user = require_user(config)?;
    let now = Utc::now();
    let entries = db::get_entries_for_user(user, conn)?;
    if entries.is_empty() {
        println!("No problems tracked for {user}");
    }
    for entry in &entries {
        print_entry(entry, now);
    }
    Ok(())
}

fn run_session(config: &Config, conn: &Connection) -> anyhow::Result<()> {
    let user = require_user(config)?;
    let mut session = ReviewSession::start(user, Utc::now(), conn)?;
    if session.is_completed() {
        println!("Nothing due. Come back later!");
        return Ok(());
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut round = 0;

    while let Some(entry) = session.current_entry().cloned() {
        if session.round_number != round {
            round = session.round_number;
            println!("\n== {} ==", session.phase_message());
        }

        let health = entry.health(Utc::now());
        println!(
            "\n{} {} [{} {}]\n  {}",
            entry.problem.key(),
            entry.problem.name,
            health.health,
            health.visual_state,
            entry.problem.url()
        );

        let quality = loop {
            print!("Quality 0-5 (q to quit): ");
            io::stdout().flush()?;
            let Some(line) = lines.next() else {
                return Ok(());
            };
            let line = line?;
            if line.trim().eq_ignore_ascii_case("q") {
                println!("Session stopped, progress so far is saved.");
                return Ok(());
            }
            match line.parse::<Quality>() {
                Ok(quality) => break quality,
                Err(e) => println!("{e}"),
            }
        };

        if let Some(updated) = session.grade_current(quality, &Local::now(), conn)? {
            print_scheduled(&updated);
        }
        session.next_entry();
    }

    println!("\nAll due problems recalled. Nice work!");
    Ok(())
}

fn run_history(config: &Config, conn: &Connection, key: &str) -> anyhow::Result<()> {
    let user = require_user(config)?;
    let history = db::get_review_history(user, key, conn)?;
    if history.is_empty() {
        println!("No reviews recorded for {key}");
    }
    for review in &history {
        println!(
            "{}  q={}  interval {}d  reps {}  EF {:.2}",
            review.reviewed_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            review.quality,
            review.interval,
            review.repetitions,
            review.ease_factor
        );
    }
    Ok(())
}

fn run_remove(config: &Config, conn: &Connection, key: &str) -> anyhow::Result<()> {
    let user = require_user(config)?;
    if db::remove_entry(user, key, conn)? {
        println!("Stopped tracking {key}");
    } else {
        println!("{key} was not tracked");
    }
    Ok(())
}

fn run_stats(config: &Config, conn: &Connection) -> anyhow::Result<()> {
    let user = require_user(config)?;
    let deck = ReviewDeck::new(user, db::get_entries_for_user(user, conn)?);
    let summary = deck.summary(Utc::now());

    println!("Flashback stats for {user}");
    println!("  Tracked:        {}", summary.total);
    println!("  Due now:        {}", summary.due);
    println!("  Fresh:          {}", summary.fresh);
    println!("  Fading:         {}", summary.fading);
    println!("  Rusted:         {}", summary.rusted);
    println!("  Never reviewed: {}", summary.never_reviewed);
    Ok(())
}

fn run_export(config: &Config, conn: &Connection, output: PathBuf) -> anyhow::Result<()> {
    let user = require_user(config)?;
    let deck = ReviewDeck::new(user, db::get_entries_for_user(user, conn)?);
    export_json_to_path(&deck, &output)?;
    println!("Exported {} problems to {}", deck.entries.len(), output.display());
    Ok(())
}

fn run_import(conn: &Connection, file: PathBuf) -> anyhow::Result<()> {
    let deck = import_json(&file)?;
    let count = import_into_database(&deck, conn)?;
    println!("Imported {count} problems for {}", deck.user_handle);
    Ok(())
}

fn print_entry(entry: &FlashbackEntry, now: DateTime<Utc>) {
    let health = entry.health(now);
    println!(
        "{:<8} {:>3} {:<6}  next {}  {}",
        entry.problem.key(),
        health.health,
        health.visual_state.as_str(),
        entry.next_review_at.with_timezone(&Local).format("%Y-%m-%d"),
        entry.problem.name
    );
}

fn print_scheduled(entry: &FlashbackEntry) {
    println!(
        "{}: next review in {} day(s) on {} (EF {:.2}, streak {})",
        entry.problem.key(),
        entry.item.interval,
        entry.next_review_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
        entry.item.ease_factor,
        entry.item.repetitions
    );
}
