//! thankful-core - Core library for Thankful
//!
//! This crate contains the shared models, offline vault, remote store client,
//! auth client, and repository logic used by the Thankful interfaces.

pub mod auth;
pub mod connectivity;
pub mod error;
pub mod i18n;
pub mod models;
pub mod offline;
pub mod remote;
pub mod repository;
pub mod util;

pub use connectivity::ConnectivityMonitor;
pub use error::{Error, Result};
pub use models::{Note, NoteDraft, NoteId, NoteKind, NotePatch};
pub use offline::OfflineVault;
pub use remote::{NoteStore, SupabaseClient};
pub use repository::NoteRepository;
