#![deny(dead_code)]
use anyhow::{anyhow, Result};
use clap::Parser;
use log::{debug, error, info, LevelFilter};
use std::path::PathBuf;
use std::sync::Arc;
use std::{env, io};

mod ui;
mod utils;

use crate::ui::{ChatUI, Intent};
use murmur::chat::{ChatStore, SimulatedTransport};
use murmur::config::{self, Settings, USER_ENV};

/// Command line arguments for murmur
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "murmur: a terminal chat client with a simulated backend.",
    long_about = "murmur shows a contact list, the active conversation and a composer.\n\n\
    Messages are delivered by an in-process simulation after a short delay;\n\
    nothing leaves the machine and nothing is persisted."
)]
struct Args {
    /// Settings file (defaults to <config dir>/murmur/settings.json)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Display name used as the sender of outgoing messages
    #[arg(long, value_name = "NAME")]
    user: Option<String>,

    /// Simulated send latency in milliseconds
    #[arg(long, value_name = "MS")]
    latency_ms: Option<u64>,

    /// Where log lines are appended while the UI owns the terminal
    #[arg(long, value_name = "PATH", default_value = "murmur.log")]
    log_file: PathBuf,

    /// off, error, warn, info, debug or trace
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

/// Applies command line and environment overrides on top of the settings file.
fn resolve_settings(args: &Args) -> Result<Settings> {
    let mut settings = config::load_settings(args.config.as_deref())?;

    if let Some(user) = args.user.clone().or_else(|| env::var(USER_ENV).ok()) {
        settings.current_user = user;
    }
    if let Some(latency) = args.latency_ms {
        settings.send_latency_ms = latency;
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level: LevelFilter = args
        .log_level
        .parse()
        .map_err(|e| anyhow!("Invalid --log-level '{}': {}", args.log_level, e))?;
    utils::setup_logging(args.log_file.to_str(), level)?;
    info!("murmur starting up");
    info!("Logging to file: {}", args.log_file.display());

    let settings = resolve_settings(&args)?;
    info!(
        "Signed in as {} with {} contacts, send latency {}ms",
        settings.current_user,
        settings.users.len(),
        settings.send_latency_ms
    );

    let transport = Arc::new(SimulatedTransport::new(settings.send_latency()));
    let store = Arc::new(ChatStore::new(settings.users.clone(), &settings.current_user, transport));

    let mut chat_ui = ChatUI::new(&settings);
    let mut terminal = ui::setup_terminal()?;

    let result = run_main_loop(&mut chat_ui, &mut terminal, &store).await;

    ui::restore_terminal(terminal)?;
    if let Err(e) = &result {
        error!("Main loop exited with error: {}", e);
    }
    info!("murmur shut down");
    result
}

async fn run_main_loop(
    chat_ui: &mut ChatUI,
    terminal: &mut ui::Terminal<ui::CrosstermBackend<io::Stdout>>,
    store: &Arc<ChatStore>,
) -> Result<()> {
    let mut snapshots = store.subscribe();
    let mut state = snapshots.borrow_and_update().clone();

    loop {
        if snapshots.has_changed().unwrap_or(false) {
            state = snapshots.borrow_and_update().clone();
        }

        chat_ui.set_viewport_width(terminal.size()?.width);
        if let Some(intent) = chat_ui.tick(&state, chrono::Utc::now()) {
            apply_intent(store, intent);
        }

        terminal.draw(|f| chat_ui.draw(f, &state))?;

        match chat_ui.poll_input(&state)? {
            Some(Intent::Quit) => break,
            Some(intent) => apply_intent(store, intent),
            None => {}
        }

        // Let spawned sends make progress between frames
        tokio::task::yield_now().await;
    }

    Ok(())
}

fn apply_intent(store: &Arc<ChatStore>, intent: Intent) {
    debug!("Applying intent: {:?}", intent);
    match intent {
        Intent::Select(id) => store.set_active_conversation(id),
        Intent::Send { recipient, text } => {
            // The outcome lands in the store; the UI picks it up from the next snapshot
            if store.dispatch_send(recipient, &text).is_none() {
                debug!("Send to {} dropped by admission guard", recipient);
            }
        }
        Intent::DismissError => store.clear_error(),
        Intent::UpdateStatus { id, status } => {
            info!("Marking contact {} {}", id, status.as_str());
            store.update_user_status(id, status);
        }
        Intent::Quit => {}
    }
}
