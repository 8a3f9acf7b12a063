use anyhow::Result;
use chrono::DateTime;
use jotter::cli::{self, CliArgs, Command};
use jotter::clock::{Clock, SystemClock};
use jotter::config::Config;
use jotter::context::{AppContext, StandardContext};
use jotter::export::export_to_path;
use jotter::model::EventParser;
use jotter::reminder::{ReminderSettings, spawn_reminder_loop};
use jotter::store::EventStore;
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use std::env;
use std::sync::Arc;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let CliArgs { root, command } = cli::parse_args(&args)?;

    if command == Command::Help {
        cli::print_help("jotter");
        return Ok(());
    }

    let ctx = StandardContext::new(root);
    let config = Config::load_or_default(&ctx)?;

    // A second init (tests, embedding) is harmless.
    let _ = TermLogger::init(
        config.log_level_filter()?,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );

    let tz = config.timezone()?;
    let clock = SystemClock::new(tz);
    let parser = EventParser::new();
    let store = EventStore::open(&ctx)?;

    match command {
        Command::Help => {}
        Command::Parse { text, at } => {
            let now = match at {
                Some(raw) => DateTime::parse_from_rfc3339(&raw)
                    .map_err(|e| anyhow::anyhow!("Invalid --at '{}': {}", raw, e))?
                    .with_timezone(&tz),
                None => clock.now(),
            };
            let event = parser.parse(&text, &now);
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        Command::Add { text } => {
            let event = parser.parse(&text, &clock.now());
            let id = store.create(event)?;
            if let Some(entry) = store.get(id)? {
                println!("{}", cli::format_entry(&entry, &tz));
            }
        }
        Command::Update { id, text } => {
            let event = parser.parse(&text, &clock.now());
            if !store.update(id, event)? {
                return Err(anyhow::anyhow!("No event with id {}", id));
            }
            if let Some(entry) = store.get(id)? {
                println!("{}", cli::format_entry(&entry, &tz));
            }
        }
        Command::Delete { id } => {
            if !store.delete(id)? {
                return Err(anyhow::anyhow!("No event with id {}", id));
            }
            println!("Deleted {}", id);
        }
        Command::List => {
            for entry in store.list()? {
                println!("{}", cli::format_entry(&entry, &tz));
            }
        }
        Command::Search(search) => {
            for entry in store.search(&search.into())? {
                println!("{}", cli::format_entry(&entry, &tz));
            }
        }
        Command::Export { format, path } => {
            let entries = store.list()?;
            match path {
                Some(path) => export_to_path(format, &entries, &path)?,
                None => println!("{}", format.render(&entries)?),
            }
        }
        Command::Watch => run_watch(&ctx, &config, store, clock).await?,
    }

    Ok(())
}

async fn run_watch(
    ctx: &dyn AppContext,
    config: &Config,
    store: EventStore,
    clock: SystemClock,
) -> Result<()> {
    let settings = ReminderSettings {
        interval: config.check_interval(),
        channel_capacity: config.reminder_channel_capacity,
        desktop_notifications: config.desktop_notifications,
    };
    let (stop_tx, stop_rx) = watch::channel(false);
    let (mut notices, handle) = spawn_reminder_loop(store, Arc::new(clock), settings, stop_rx);

    log::info!(
        "watching {} every {}s",
        ctx.get_events_path()?.display(),
        settings.interval.as_secs()
    );

    loop {
        tokio::select! {
            notice = notices.recv() => match notice {
                Some(n) => println!("[reminder] {} - {}", n.title, n.body()),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                let _ = stop_tx.send(true);
                break;
            }
        }
    }
    // Unblocks a loop stuck on a full channel.
    drop(notices);

    handle
        .await
        .map_err(|e| anyhow::anyhow!("Reminder loop panicked: {}", e))?;
    Ok(())
}
