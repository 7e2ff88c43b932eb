//! goodnight-core - Core library for Goodnight
//!
//! This crate contains the record model, the remote log store abstraction and
//! its adapters, the local identity selector, anonymous auth, and the
//! view-model that mirrors the shared log into grouped, sorted view state.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod identity;
pub mod models;
pub mod store;
pub mod util;
pub mod view_model;

pub use error::{Error, Result};
pub use models::{RecordDraft, RecordId, SleepRecord, SpouseLabel};
pub use view_model::{GroupedView, LogViewModel, SyncError, ViewState};
