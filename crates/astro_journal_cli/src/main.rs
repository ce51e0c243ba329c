//! Command-line front end for the journal core.
//!
//! # Responsibility
//! - Map subcommands onto `AstroJournal` use cases.
//! - Drain pending writes before the process exits.

use anyhow::Context;
use astro_journal_core::{
    default_log_level, init_logging, AstroJournal, CoreConfig, EntryKey, FetchStatus,
    HoroscopeLookup, ZodiacSign,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "astro-journal")]
#[command(about = "Daily journal with horoscope readings", version)]
struct Cli {
    /// Database file (overrides ASTRO_JOURNAL_DB_PATH)
    #[arg(long, value_name = "FILE", global = true)]
    db: Option<PathBuf>,

    /// Write rolling logs to this absolute directory
    #[arg(long, value_name = "DIR", global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print today's entry
    Today,
    /// Create or replace an entry
    Write {
        /// Entry text
        text: String,
        /// Entry key; defaults to today
        #[arg(long, conflicts_with = "new")]
        key: Option<EntryKey>,
        /// Add another entry for today instead of replacing today's
        #[arg(long)]
        new: bool,
        #[arg(long)]
        title: Option<String>,
    },
    /// Print one entry
    Show { key: EntryKey },
    /// Delete one entry
    Delete { key: EntryKey },
    /// List non-empty entries, newest first
    List,
    /// Show or set the selected sign
    Sign { sign: Option<ZodiacSign> },
    /// Show today's reading for a sign (selected sign by default)
    Horoscope {
        sign: Option<ZodiacSign>,
        /// Report remote failures instead of using offline readings
        #[arg(long)]
        strict: bool,
    },
    /// Delete all stored journal data
    Clear {
        /// Required to confirm
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let log_dir = log_dir
            .to_str()
            .context("log directory must be valid UTF-8")?;
        init_logging(default_log_level(), log_dir)?;
    }

    let mut config = CoreConfig::from_env()?;
    if let Some(db) = cli.db {
        config = config.with_db_path(db);
    }
    if let Command::Horoscope { strict: true, .. } = cli.command {
        config.fallback_enabled = false;
    }

    let app = AstroJournal::start(config)
        .await
        .context("failed to start journal")?;
    let result = run(&app, cli.command).await;
    app.shutdown().await;
    result
}

async fn run(app: &AstroJournal, command: Command) -> anyhow::Result<()> {
    let store = app.store();
    match command {
        Command::Today => {
            let text = store.today_journal_entry();
            if text.is_empty() {
                println!("No entry for today yet.");
            } else {
                println!("{text}");
            }
        }
        Command::Write {
            text,
            key,
            new,
            title,
        } => {
            let key = match key {
                Some(key) => key,
                None if new => store.next_entry_key(),
                None => EntryKey::for_date(store.clock().today()),
            };
            app.save_entry(key.clone(), text, title);
            println!("Saved {key}.");
        }
        Command::Show { key } => match app.entry(&key) {
            Some(entry) => {
                println!("{} ({key})", entry.title);
                println!("updated {}", entry.updated_at.to_rfc3339());
                println!();
                println!("{}", entry.text);
            }
            None => println!("No entry for {key}."),
        },
        Command::Delete { key } => {
            app.delete_entry(key.clone());
            println!("Deleted {key}.");
        }
        Command::List => {
            let entries = store.listed_entries();
            if entries.is_empty() {
                println!("No entries.");
            }
            for (key, entry) in entries {
                println!("{key}  {}  {}", entry.title, preview(&entry.text, 48));
            }
        }
        Command::Sign { sign: Some(sign) } => {
            app.set_selected_sign(sign);
            println!("Selected {} {}.", sign.symbol(), sign.label());
        }
        Command::Sign { sign: None } => {
            let sign = store.selected_sign();
            println!("{} {} ({})", sign.symbol(), sign.label(), sign.date_range());
        }
        Command::Horoscope { sign, .. } => {
            let sign = sign.unwrap_or_else(|| store.selected_sign());
            print_horoscope(&app.horoscope(sign).await)?;
        }
        Command::Clear { yes } => {
            anyhow::ensure!(yes, "refusing to clear data without --yes");
            anyhow::ensure!(app.clear_all_data().await, "storage rejected the clear");
            println!("All journal data cleared.");
        }
    }
    Ok(())
}

fn print_horoscope(lookup: &HoroscopeLookup) -> anyhow::Result<()> {
    let Some(record) = &lookup.record else {
        let reason = lookup.request.error.as_deref().unwrap_or("no reading");
        anyhow::bail!("horoscope for {} unavailable: {reason}", lookup.sign);
    };
    if lookup.request.status == FetchStatus::Failed {
        eprintln!("warning: latest fetch failed, showing cached reading");
    }
    let data = &record.data;
    println!(
        "{} {} - {}",
        lookup.sign.symbol(),
        lookup.sign.label(),
        data.current_date
    );
    println!();
    println!("{}", data.description);
    println!();
    println!("Mood:          {}", data.mood);
    println!("Color:         {}", data.color);
    println!("Compatibility: {}", data.compatibility);
    println!("Lucky number:  {}", data.lucky_number);
    println!("Lucky time:    {}", data.lucky_time);
    Ok(())
}

/// First line of `text`, capped at `max_chars`.
fn preview(text: &str, max_chars: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    let mut preview: String = line.chars().take(max_chars).collect();
    if line.chars().count() > max_chars || text.lines().nth(1).is_some() {
        preview.push_str("...");
    }
    preview
}
