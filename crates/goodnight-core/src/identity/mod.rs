//! Local display-label selection.
//!
//! The label is a device-local choice between the two household members. It is
//! independent of the remote auth identity and only gates whether a record can
//! be appended.

mod file_store;

use std::sync::{Arc, Mutex, PoisonError, RwLock};

pub use file_store::FileLabelStore;

use crate::error::{Error, Result};
use crate::models::SpouseLabel;

/// Backing storage for the chosen label.
pub trait LabelPersistence: Send + Sync + 'static {
    fn load_label(&self) -> Result<Option<SpouseLabel>>;
    fn save_label(&self, label: SpouseLabel) -> Result<()>;
    fn clear_label(&self) -> Result<()>;
}

/// Outcome of the confirmation prompt shown before a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetDecision {
    Confirm,
    Cancel,
}

/// Persisted label selection with an in-memory cache.
pub struct IdentitySelector<P: LabelPersistence> {
    store: P,
    current: RwLock<Option<SpouseLabel>>,
}

impl<P: LabelPersistence> IdentitySelector<P> {
    /// Load the persisted label (if any) from `store`.
    pub fn load(store: P) -> Result<Self> {
        let current = store.load_label()?;
        tracing::debug!(label = ?current, "Loaded local identity");
        Ok(Self {
            store,
            current: RwLock::new(current),
        })
    }

    /// The chosen label, or `None` while unset.
    pub fn current(&self) -> Option<SpouseLabel> {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Persist `label` as this device's identity.
    pub fn choose(&self, label: SpouseLabel) -> Result<()> {
        self.store.save_label(label)?;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(label);
        tracing::info!(%label, "Local identity chosen");
        Ok(())
    }

    /// Clear the label once the user confirmed. Returns whether it was cleared.
    pub fn reset(&self, decision: ResetDecision) -> Result<bool> {
        if decision == ResetDecision::Cancel {
            return Ok(false);
        }
        self.store.clear_label()?;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
        tracing::info!("Local identity reset");
        Ok(true)
    }
}

/// Process-local label storage, shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryLabelStore {
    label: Arc<Mutex<Option<SpouseLabel>>>,
}

impl MemoryLabelStore {
    #[must_use]
    pub fn with_label(label: SpouseLabel) -> Self {
        Self {
            label: Arc::new(Mutex::new(Some(label))),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<SpouseLabel>>> {
        self.label
            .lock()
            .map_err(|error| Error::IdentityStorage(error.to_string()))
    }
}

impl LabelPersistence for MemoryLabelStore {
    fn load_label(&self) -> Result<Option<SpouseLabel>> {
        Ok(*self.lock()?)
    }

    fn save_label(&self, label: SpouseLabel) -> Result<()> {
        *self.lock()? = Some(label);
        Ok(())
    }

    fn clear_label(&self) -> Result<()> {
        *self.lock()? = None;
        Ok(())
    }
}
