#![deny(unsafe_code)]

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use page_hotkeys::actions::ActionExecutor;
use page_hotkeys::bridge::{BackgroundService, ChannelBridge, MemoryTabs, TabInfo};
use page_hotkeys::config::{ConfigLoader, EngineSettings, FileConfigLoader};
use page_hotkeys::dispatch::{DispatchOutcome, Dispatcher};
use page_hotkeys::input::{KeyEvent, matches_key};
use page_hotkeys::notify::TracingNotifier;
use page_hotkeys::page::{MemoryClipboard, MemoryDocument, RecordingNavigator, RecordingRunner};
use page_hotkeys::state::{FileStorage, MemoryStorage, RunState, StateStorage};

/// Tab id the simulated page runs in
const SIMULATED_TAB: i64 = 1;

#[derive(Parser)]
#[command(name = "page-hotkeys")]
#[command(version)]
#[command(about = "Declarative per-site keyboard shortcuts", long_about = None)]
struct Cli {
    /// Log per-event decisions
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay key events against a page description
    Simulate {
        /// HTML snapshot of the page
        #[arg(long)]
        page: PathBuf,

        /// URL the page is loaded at
        #[arg(long)]
        url: String,

        /// Whitespace-separated keys, e.g. "Shift+F Escape Shift+~"
        #[arg(long)]
        keys: String,

        /// Mappings file (defaults to the one in the config directory)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Keep the run flag in memory instead of the state file
        #[arg(long)]
        ephemeral: bool,
    },
    /// Show which bindings a key would trigger on a URL, without running them
    Resolve {
        #[arg(long)]
        url: String,

        #[arg(long)]
        key: KeyEvent,

        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Show or change the persisted run flag
    State {
        #[arg(long, conflicts_with_all = ["resume", "toggle"])]
        pause: bool,

        #[arg(long, conflicts_with = "toggle")]
        resume: bool,

        #[arg(long)]
        toggle: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    // Every port is single-threaded; one current-thread runtime drives it all
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    rt.block_on(async {
        match cli.command {
            Command::Simulate {
                page,
                url,
                keys,
                config,
                ephemeral,
            } => simulate(page, &url, &keys, config, ephemeral).await,
            Command::Resolve { url, key, config } => resolve(&url, &key, config).await,
            Command::State {
                pause,
                resume,
                toggle,
            } => state(pause, resume, toggle).await,
        }
    })
}

fn loader_for(config: Option<PathBuf>) -> FileConfigLoader {
    match config {
        Some(path) => FileConfigLoader::new(path),
        None => FileConfigLoader::default_location(),
    }
}

fn parse_keys(keys: &str) -> Result<Vec<KeyEvent>> {
    keys.split_whitespace()
        .map(|k| k.parse::<KeyEvent>().map_err(anyhow::Error::msg))
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("Invalid key list {:?}", keys))
}

async fn simulate(
    page: PathBuf,
    url: &str,
    keys: &str,
    config: Option<PathBuf>,
    ephemeral: bool,
) -> Result<()> {
    let events = parse_keys(keys)?;
    if events.is_empty() {
        bail!("No keys to replay");
    }

    let settings = EngineSettings::load()?;
    let html = fs::read_to_string(&page)
        .with_context(|| format!("Failed to read page from {:?}", page))?;

    let clipboard = Rc::new(MemoryClipboard::new());
    let document = Rc::new(MemoryDocument::new(url, &html).with_clipboard(clipboard.clone()));
    let navigator = Rc::new(RecordingNavigator::new());
    let runner = Rc::new(RecordingRunner::new());

    let (bridge, rx) = ChannelBridge::channel(Some(SIMULATED_TAB));
    let tabs = MemoryTabs::new().open(TabInfo::new(SIMULATED_TAB, url));
    let background = tokio::spawn(BackgroundService::new(tabs).run(rx));

    let storage: Rc<dyn StateStorage> = if ephemeral {
        Rc::new(MemoryStorage::new())
    } else {
        Rc::new(FileStorage::default_location())
    };

    let dispatcher = Dispatcher::new(
        Rc::new(loader_for(config)),
        RunState::new(storage, settings.restore_ordering),
        ActionExecutor::new(
            document.clone(),
            clipboard.clone(),
            navigator.clone(),
            runner.clone(),
            Rc::new(bridge),
        ),
        Rc::new(TracingNotifier),
        settings,
    );

    // Replays are sequential, so the restore is allowed to finish first
    dispatcher.restore_run_state().await;

    for event in &events {
        match dispatcher.handle_key(event).await {
            Ok(DispatchOutcome::Toggled { running }) => {
                println!("{}: {}", event, if running { "resumed" } else { "paused" })
            }
            Ok(DispatchOutcome::Paused) => println!("{}: ignored (paused)", event),
            Ok(DispatchOutcome::Matched(outcomes)) if outcomes.is_empty() => {
                println!("{}: no binding", event)
            }
            Ok(DispatchOutcome::Matched(outcomes)) => {
                for o in outcomes {
                    match o.outcome.result {
                        Ok(()) => println!("{}: binding {} {} ok", event, o.index, o.outcome.kind),
                        Err(e) => println!(
                            "{}: binding {} {} failed: {}",
                            event, o.index, o.outcome.kind, e
                        ),
                    }
                }
            }
            Err(e) => println!("{}: aborted: {:#}", event, anyhow::Error::new(e)),
        }
    }

    // Dropping the dispatcher closes the bridge and lets the service finish
    drop(dispatcher);
    let tabs = background.await.context("Background service failed")?;

    if let Some(text) = clipboard.contents() {
        println!("clipboard: {:?}", text);
    }
    for call in navigator.calls() {
        println!("navigation: {:?}", call);
    }
    for script in runner.scripts() {
        println!("script: {}", script);
    }
    for id in tabs.removed() {
        println!("closed tab: {}", id);
    }

    Ok(())
}

async fn resolve(url: &str, key: &KeyEvent, config: Option<PathBuf>) -> Result<()> {
    let table = loader_for(config).load().await?;

    let mut found = false;
    for (index, compiled) in table.bindings().iter().enumerate() {
        let binding = &compiled.binding;
        let url_matches = compiled
            .matches_url(url)
            .with_context(|| format!("Invalid URL pattern {:?} in binding {}", binding.url, index))?;
        if url_matches && matches_key(key, &binding.key) {
            found = true;
            match &binding.action.selector {
                Some(selector) => {
                    println!("{}: {} {} ({})", index, binding.action.kind, selector, binding.url)
                }
                None => println!("{}: {} ({})", index, binding.action.kind, binding.url),
            }
        }
    }

    if !found {
        println!("No binding for {} on {}", key, url);
    }
    Ok(())
}

async fn state(pause: bool, resume: bool, toggle: bool) -> Result<()> {
    let settings = EngineSettings::load()?;
    let run_state = RunState::new(
        Rc::new(FileStorage::default_location()),
        settings.restore_ordering,
    );
    run_state.restore().await;

    if pause {
        run_state.set(false).await;
    } else if resume {
        run_state.set(true).await;
    } else if toggle {
        run_state.toggle().await;
    }

    println!("{}", if run_state.get() { "running" } else { "paused" });
    Ok(())
}
