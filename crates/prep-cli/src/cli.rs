//! Command-line interface definition using clap.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use prep_client::config::{BACKEND_URL_ENV, STATE_DIR_ENV};
use prep_client::ClientConfig;

/// Interview prep - research a job description before the interview
#[derive(Parser, Debug)]
#[command(name = "prep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Base URL of the analysis backend
    #[arg(long, env = BACKEND_URL_ENV, global = true)]
    pub backend_url: Option<String>,

    /// Directory for the draft and offline history
    #[arg(short, long, env = STATE_DIR_ENV, global = true)]
    pub state_dir: Option<PathBuf>,

    /// Timeout for history requests, in seconds
    #[arg(long, default_value_t = 10, global = true)]
    pub timeout: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a job description and save the report
    Analyze {
        /// Job description text (defaults to the saved draft)
        text: Option<String>,

        /// Read the job description from a file
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },

    /// Manage saved analyses
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },

    /// Manage the saved draft
    Draft {
        #[command(subcommand)]
        command: DraftCommands,
    },

    /// Check that the backend is up
    Health,
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommands {
    /// List saved analyses, newest first
    List {
        /// Print the entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a saved report
    Show {
        /// Entry ID
        id: String,
    },

    /// Delete a saved analysis
    Delete {
        /// Entry ID
        id: String,
    },

    /// Reload history from the backend
    Refresh,
}

#[derive(Subcommand, Debug)]
pub enum DraftCommands {
    /// Print the draft
    Show,

    /// Replace the draft
    Set {
        /// New draft text
        text: String,
    },

    /// Empty the draft
    Clear,
}

impl Cli {
    /// Returns the state directory, falling back to the default.
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(prep_client::config::state_dir)
    }

    /// Builds the client configuration from the flags.
    pub fn client_config(&self) -> prep_client::Result<ClientConfig> {
        let config = ClientConfig::new(self.backend_url.as_deref().unwrap_or_default())?;
        Ok(config.with_request_timeout(Duration::from_secs(self.timeout)))
    }

    /// Returns the log level based on verbosity.
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
