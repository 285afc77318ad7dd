//! Client for the interview prep analysis backend.
//!
//! The backend turns a job description into a research report, streaming
//! pipeline progress while it works. This crate consumes that stream and
//! keeps the results:
//!
//! - [`sse`]: incremental decoder for the `data: <json>` frame stream
//! - [`session`]: session state and the pure event reducer
//! - [`controller`]: runs one session at a time with cancellation
//! - [`history`]: saved analyses, remote first with a local fallback
//! - [`workspace`]: draft, session and history wired together
//!
//! # Example
//!
//! ```no_run
//! use prep_client::{ClientConfig, Workspace};
//!
//! # async fn run() -> prep_client::Result<()> {
//! let config = ClientConfig::from_env()?;
//! let mut workspace = Workspace::open(&config, prep_client::config::state_dir());
//!
//! if let Some(saved) = workspace.analyze("Senior Rust engineer at Acme").await {
//!     println!("Saved {} as {}", saved.role_title, saved.id);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod history;
pub mod session;
pub mod sse;
pub mod transport;
pub mod workspace;

pub use config::ClientConfig;
pub use controller::SessionController;
pub use error::{ClientError, Result};
pub use event::StreamEvent;
pub use history::{GatewayMode, HistoryGateway, HistoryStore, LocalHistory, RemoteHistory};
pub use session::{AnalysisSession, ResultSource, SessionState};
pub use sse::{decode_events, FrameDecoder};
pub use transport::{AnalysisTransport, HttpTransport};
pub use workspace::Workspace;
