//! Data models for Goodnight

mod record;
mod spouse;

pub use record::{RecordDraft, RecordId, SleepRecord};
pub use spouse::SpouseLabel;
