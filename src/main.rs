use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc;

use smartclip::app::App;
use smartclip::clipboard;
use smartclip::hotkey::Hotkey;
use smartclip::logging;
use smartclip::models::{ClipboardEntry, HistoryStore};
use smartclip::service::Service;
use smartclip::storage::{
    HistoryStorage, JsonHistoryStorage, JsonSettingsStorage, PersistWorker, Settings,
    SettingsStorage, ensure_data_dir,
};
use smartclip::ui::{TerminalKeys, TerminalSession, terminal};

#[derive(Parser)]
#[command(name = "smartclip")]
#[command(about = "Clipboard history with alt-tab style cycling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the clipboard and show the overlay (default)
    Run {
        /// Open the overlay immediately and exit after pasting or cancelling
        #[arg(long)]
        once: bool,
    },

    /// Store text from stdin (for use as a `wl-paste --watch` target)
    StoreText,

    /// Show clipboard history entries
    History {
        /// Number of entries to show (default: 10)
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// List entries containing the query, ignoring case
    Search { query: String },

    /// Move an entry to the head of the history
    Promote {
        /// Position as shown by `history` (1 is the most recent)
        index: usize,
    },

    /// Show clipboard history statistics
    Stats,

    /// Show settings, or change individual fields
    Config {
        #[arg(long)]
        stack_size: Option<usize>,

        /// e.g. "ctrl+shift+v", or "none" to disable
        #[arg(long)]
        open_hotkey: Option<String>,

        #[arg(long)]
        cycle_hotkey: Option<String>,

        #[arg(long)]
        notifications: Option<bool>,

        #[arg(long)]
        dark_mode: Option<bool>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Headless commands log to stderr; `run` owns the terminal and logs to a file
    if !matches!(cli.command, None | Some(Commands::Run { .. })) {
        env_logger::init();
    }

    match cli.command {
        None => cmd_run(false),
        Some(Commands::Run { once }) => cmd_run(once),
        Some(Commands::StoreText) => cmd_store_text(),
        Some(Commands::History { limit }) => cmd_history(limit),
        Some(Commands::Search { query }) => cmd_search(&query),
        Some(Commands::Promote { index }) => cmd_promote(index),
        Some(Commands::Stats) => cmd_stats(),
        Some(Commands::Config {
            stack_size,
            open_hotkey,
            cycle_hotkey,
            notifications,
            dark_mode,
        }) => cmd_config(stack_size, open_hotkey, cycle_hotkey, notifications, dark_mode),
    }
}

/// Load effective settings, reporting rejected fields. Never fails.
fn load_settings(storage: &dyn SettingsStorage) -> Settings {
    match storage.load() {
        Ok(loaded) => {
            for error in &loaded.errors {
                log::warn!("Settings: {}", error);
            }
            loaded.settings
        }
        Err(e) => {
            log::error!("{}, using default settings", e);
            Settings::default()
        }
    }
}

/// Load persisted entries; a failed load starts an empty history
fn load_entries(storage: &dyn HistoryStorage) -> Vec<ClipboardEntry> {
    storage.load().unwrap_or_else(|e| {
        log::error!("{}, starting with empty history", e);
        Vec::new()
    })
}

/// Load the persisted history into a store sized by the settings
fn load_history(data_dir: &Path) -> (JsonHistoryStorage, HistoryStore) {
    let settings = load_settings(&JsonSettingsStorage::in_dir(data_dir));
    let storage = JsonHistoryStorage::in_dir(data_dir);
    let entries = load_entries(&storage);
    (storage, HistoryStore::from_entries(entries, settings.stack_size))
}

/// Run the interactive service until quit
fn cmd_run(once: bool) -> Result<()> {
    let data_dir = ensure_data_dir()?;
    let settings_storage = JsonSettingsStorage::in_dir(&data_dir);

    // Peek at the log level before the logger exists; errors are re-reported after init
    let settings = settings_storage
        .load()
        .map(|loaded| loaded.settings)
        .unwrap_or_default();

    let (notify_tx, notify_rx) = mpsc::channel();
    logging::init_logger(
        &data_dir.join("logs"),
        Some(notify_tx),
        &settings.log_level,
        "warn",
    )?;
    log::info!("Starting smartclip in {:?}", data_dir);

    let settings = load_settings(&settings_storage);
    let history_storage = Arc::new(JsonHistoryStorage::in_dir(&data_dir));
    let entries = load_entries(history_storage.as_ref());
    let history = HistoryStore::from_entries(entries, settings.stack_size);

    let persist = PersistWorker::spawn(
        history_storage,
        Box::new(|e: &smartclip::error::PersistenceError| {
            log::error!("Failed to save history: {}", e);
        }),
    );

    let (events_tx, events_rx) = mpsc::channel();
    let source = clipboard::create_source(settings.poll_interval());
    let paste = clipboard::create_paste_injector(settings.paste_delay());

    let (session, mut term) = TerminalSession::enter()?;
    terminal::install_panic_hook();
    if !session.reports_releases() {
        log::info!("Terminal does not report key releases; use Enter to paste");
    }

    let keys = TerminalKeys::new(events_tx.clone(), session.reports_releases());
    let service = Service::new(source, Box::new(keys), events_tx);

    let mut app = App::new(
        history,
        settings,
        persist,
        Box::new(settings_storage),
        paste,
        Some(notify_rx),
    )
    .with_service(service)
    .exit_on_close(once);

    app.start(Some(&data_dir))?;
    if once {
        app.open_overlay();
    }

    let result = app.run(&mut term, &events_rx);

    // Restore the terminal before pasting so the keystroke reaches the previous window
    drop(term);
    drop(session);
    app.deliver_pending_paste();

    result
}

/// Store text content from stdin
fn cmd_store_text() -> Result<()> {
    let data_dir = ensure_data_dir()?;
    let (storage, mut history) = load_history(&data_dir);

    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read clipboard text from stdin")?;

    if !ClipboardEntry::is_recordable(&text) {
        log::debug!("Blank clipboard content, skipping");
        return Ok(());
    }

    if history.append(text) {
        storage.save(history.entries())?;
        log::info!("Stored clip, {} in history", history.len());
    }

    Ok(())
}

fn print_entries<'a>(entries: impl Iterator<Item = (usize, &'a ClipboardEntry)>) -> usize {
    let mut shown = 0;
    for (i, entry) in entries {
        println!("{:3}. {}  {}", i + 1, entry.display_time(), entry.preview(50));
        shown += 1;
    }
    shown
}

/// Show clipboard history entries
fn cmd_history(limit: usize) -> Result<()> {
    let data_dir = ensure_data_dir()?;
    let (_, history) = load_history(&data_dir);

    println!("Recent Clipboard Entries (showing up to {}):", limit);
    println!("{}", "=".repeat(60));

    if print_entries(history.entries().iter().enumerate().take(limit)) == 0 {
        println!("(empty - no clipboard history yet)");
    }

    Ok(())
}

/// Show entries matching `query`
fn cmd_search(query: &str) -> Result<()> {
    let data_dir = ensure_data_dir()?;
    let (_, history) = load_history(&data_dir);

    let indices = smartclip::models::matching_indices(history.entries(), query);
    let matches = indices.iter().map(|&i| (i, &history.entries()[i]));

    if print_entries(matches) == 0 {
        println!("(no matches for {:?})", query);
    }

    Ok(())
}

/// Promote the entry shown at `index` by `history`
fn cmd_promote(index: usize) -> Result<()> {
    let data_dir = ensure_data_dir()?;
    let (storage, mut history) = load_history(&data_dir);

    if index == 0 || index > history.len() {
        bail!("No entry {} (history has {})", index, history.len());
    }

    if history.promote(index - 1) {
        storage.save(history.entries())?;
    }
    if let Some(head) = history.get(0) {
        println!("Promoted: {}", head.preview(60));
    }

    Ok(())
}

/// Show clipboard statistics
fn cmd_stats() -> Result<()> {
    let data_dir = ensure_data_dir()?;
    let settings_storage = JsonSettingsStorage::in_dir(&data_dir);
    let (storage, history) = load_history(&data_dir);

    println!("Clipboard History Statistics");
    println!("============================");
    println!("Total entries: {}", history.len());
    println!("Capacity: {}", history.capacity());
    if let Some(head) = history.get(0) {
        println!("Most recent: {}", head.display_time());
    }
    println!("History file: {}", storage.path().display());
    println!("Settings file: {}", settings_storage.path().display());

    Ok(())
}

fn parse_hotkey_arg(value: &str, field: &str) -> Result<String> {
    match Hotkey::parse(value) {
        Ok(Some(hotkey)) => Ok(hotkey.to_string()),
        Ok(None) => Ok("none".to_string()),
        Err(reason) => bail!("Invalid {}: {}", field, reason),
    }
}

/// Print the effective settings, applying any given changes first
fn cmd_config(
    stack_size: Option<usize>,
    open_hotkey: Option<String>,
    cycle_hotkey: Option<String>,
    notifications: Option<bool>,
    dark_mode: Option<bool>,
) -> Result<()> {
    let data_dir = ensure_data_dir()?;
    let storage = JsonSettingsStorage::in_dir(&data_dir);
    let loaded = storage.load().context("Failed to load settings")?;
    let mut settings = loaded.settings.clone();

    if let Some(size) = stack_size {
        if size == 0 {
            bail!("stack-size must be at least 1");
        }
        settings.stack_size = size;
    }
    if let Some(value) = open_hotkey {
        settings.open_hotkey = parse_hotkey_arg(&value, "open-hotkey")?;
    }
    if let Some(value) = cycle_hotkey {
        settings.cycle_hotkey = parse_hotkey_arg(&value, "cycle-hotkey")?;
    }
    if let Some(enabled) = notifications {
        settings.show_notifications = enabled;
    }
    if let Some(enabled) = dark_mode {
        settings.dark_mode = enabled;
    }

    if settings != loaded.settings {
        storage.save(&settings)?;
        println!("Saved {}", storage.path().display());
    } else {
        for error in &loaded.errors {
            println!("warning: {}", error);
        }
    }

    println!("{}", serde_json::to_string_pretty(&settings)?);

    Ok(())
}
