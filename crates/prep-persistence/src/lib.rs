//! Device-local storage for the interview prep client.
//!
//! This crate is the native counterpart of browser local storage. It keeps a
//! small set of string values on disk, one file per key, and writes every
//! value atomically (write to temp file, then rename) so a crash never leaves
//! a half-written history file behind.
//!
//! # Example
//!
//! ```no_run
//! use prep_persistence::{DeviceStore, DraftStore};
//!
//! let store = DeviceStore::new("/home/user/.interview-prep");
//!
//! // The draft is loaded once and persisted on every change
//! let mut draft = DraftStore::load(store.clone());
//! draft.set("Senior Rust engineer at Acme...");
//! assert_eq!(draft.get(), "Senior Rust engineer at Acme...");
//! ```

pub mod atomic;
pub mod draft;
pub mod error;
pub mod kv;

pub use draft::{DraftStore, DRAFT_KEY};
pub use error::{PersistenceError, Result};
pub use kv::DeviceStore;
