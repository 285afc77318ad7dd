//! Command handlers.

use std::path::{Path, PathBuf};

use prep_client::{ClientConfig, HttpTransport, SessionState, Workspace};
use tracing::debug;

use crate::cli::{Commands, DraftCommands, HistoryCommands};
use crate::render::{self, ProgressPrinter};

/// Result type for command handlers.
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Execute a command.
pub fn execute(command: Commands, config: &ClientConfig, state_dir: &Path) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let workspace = Workspace::open(config, state_dir);
    debug!(backend = config.base_url(), state_dir = %state_dir.display(), "Opened workspace");

    match command {
        Commands::Analyze { text, file } => rt.block_on(handle_analyze(workspace, text, file)),
        Commands::History { command } => rt.block_on(handle_history(workspace, command)),
        Commands::Draft { command } => {
            handle_draft(workspace, command);
            Ok(())
        }
        Commands::Health => rt.block_on(handle_health(config)),
    }
}

async fn handle_analyze(
    mut workspace: Workspace,
    text: Option<String>,
    file: Option<PathBuf>,
) -> Result<()> {
    let job_description = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?,
        (None, None) => workspace.draft().to_string(),
    };
    if job_description.trim().is_empty() {
        return Err("No job description given and the saved draft is empty".into());
    }

    let controller = workspace.controller().clone();

    let mut updates = controller.subscribe();
    let progress = tokio::spawn(async move {
        let mut printer = ProgressPrinter::default();
        while updates.changed().await.is_ok() {
            let line = printer.update(&updates.borrow_and_update());
            if let Some(line) = line {
                println!("{}", line);
            }
        }
    });

    let interrupt = {
        let controller = controller.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                controller.reset();
            }
        })
    };

    let saved = workspace.analyze(&job_description).await;
    interrupt.abort();
    progress.abort();

    let session = controller.snapshot();
    match session.state {
        SessionState::Complete => {
            if let Some(result) = &session.result {
                println!();
                print!("{}", render::report(result));
            }
            if let Some(saved) = saved {
                println!("\nSaved as {} ({})", saved.role_title, saved.id);
            }
            Ok(())
        }
        SessionState::Error => Err(session
            .error
            .unwrap_or_else(|| "Analysis failed".to_string())
            .into()),
        SessionState::Idle | SessionState::Streaming => {
            println!("Analysis cancelled.");
            Ok(())
        }
    }
}

async fn handle_history(mut workspace: Workspace, command: HistoryCommands) -> Result<()> {
    let gateway = workspace.gateway().clone();

    match command {
        HistoryCommands::List { json } => {
            let items = gateway.list().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else if items.is_empty() {
                println!("No saved analyses ({} history).", gateway.mode().await);
            } else {
                println!("Saved analyses ({} history):\n", gateway.mode().await);
                for item in &items {
                    println!("  {}", render::history_line(item));
                }
            }
        }

        HistoryCommands::Show { id } => {
            if !workspace.open_saved(&id).await {
                return Err(format!("No saved analysis with id '{}'", id).into());
            }
            let session = workspace.controller().snapshot();
            if let Some(result) = &session.result {
                println!("Job description:\n{}\n", workspace.draft());
                print!("{}", render::report(result));
            }
        }

        HistoryCommands::Delete { id } => {
            gateway.remove(&id).await;
            println!("Deleted {}", id);
        }

        HistoryCommands::Refresh => {
            let items = gateway.refresh().await;
            println!("{} saved analyses ({} history)", items.len(), gateway.mode().await);
        }
    }

    Ok(())
}

fn handle_draft(mut workspace: Workspace, command: DraftCommands) {
    match command {
        DraftCommands::Show => {
            if workspace.draft().is_empty() {
                println!("(draft is empty)");
            } else {
                println!("{}", workspace.draft());
            }
        }
        DraftCommands::Set { text } => {
            workspace.set_draft(text);
            println!("Draft saved.");
        }
        DraftCommands::Clear => {
            workspace.clear_draft();
            println!("Draft cleared.");
        }
    }
}

async fn handle_health(config: &ClientConfig) -> Result<()> {
    let status = HttpTransport::new(config.clone()).health().await?;
    println!("{}: {}", config.base_url(), status);
    Ok(())
}
