//! Reactive view-model over the shared sleep log.
//!
//! The view-model subscribes to a [`RemoteLogStore`], mirrors each snapshot
//! into a sorted record list plus its date grouping, and mediates appends and
//! deletes. The mirror is never patched locally: writes become visible only
//! once the store pushes the next snapshot.
//!
//! All view state lives in one `watch` channel and is replaced as a whole, so
//! readers always observe a complete, internally consistent state.

mod grouping;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub use grouping::{sort_newest_first, DateGroup, GroupedView};

use crate::format::RecordLocale;
use crate::identity::{IdentitySelector, LabelPersistence};
use crate::models::{RecordDraft, RecordId, SleepRecord, SpouseLabel};
use crate::store::{FeedEvent, RemoteLogStore, Subscription};

const DEFAULT_FLASH_DURATION: Duration = Duration::from_secs(2);

/// Failures surfaced by view-model operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No anonymous identity has been issued yet; nothing was sent.
    #[error("Still signing in; try again in a moment")]
    AuthNotReady,
    /// No local display label is chosen; nothing was sent.
    #[error("Choose who you are before logging a bedtime")]
    IdentityNotChosen,
    /// The live feed could not be opened or reported a failure.
    #[error("Live updates failed: {0}")]
    Subscription(String),
    /// The store rejected an append or delete.
    #[error("Could not save the change: {0}")]
    Write(#[source] crate::Error),
}

impl SyncError {
    /// Whether the operation was refused locally because a precondition is unmet.
    pub const fn is_not_ready(&self) -> bool {
        matches!(self, Self::AuthNotReady | Self::IdentityNotChosen)
    }
}

/// Everything a front end renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    /// Mirror of the collection, newest first
    pub records: Vec<SleepRecord>,
    /// `records` grouped by stored date
    pub grouped: GroupedView,
    /// True until the first snapshot or feed failure arrives
    pub loading: bool,
    /// Most recent feed failure, cleared by the next snapshot
    pub last_error: Option<String>,
    /// Briefly true after a successful append
    pub just_added: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            grouped: GroupedView::default(),
            loading: true,
            last_error: None,
            just_added: false,
        }
    }
}

impl ViewState {
    fn apply(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::Snapshot(mut records) => {
                sort_newest_first(&mut records);
                self.grouped = GroupedView::from_sorted(&records);
                self.records = records;
                self.loading = false;
                self.last_error = None;
            }
            FeedEvent::Error(message) => {
                self.loading = false;
                self.last_error = Some(message);
            }
        }
    }
}

/// Sync core mirroring one store for one device.
pub struct LogViewModel<S: RemoteLogStore, P: LabelPersistence> {
    store: Arc<S>,
    identity: Arc<IdentitySelector<P>>,
    session_user: RwLock<Option<String>>,
    state: Arc<watch::Sender<ViewState>>,
    generation: Arc<AtomicU64>,
    feed_task: Mutex<Option<JoinHandle<()>>>,
    locale: RecordLocale,
    flash_duration: Duration,
    flash_epoch: Arc<AtomicU64>,
}

impl<S: RemoteLogStore, P: LabelPersistence> LogViewModel<S, P> {
    pub fn new(store: Arc<S>, identity: Arc<IdentitySelector<P>>) -> Self {
        let (state, _) = watch::channel(ViewState::default());
        Self {
            store,
            identity,
            session_user: RwLock::new(None),
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
            feed_task: Mutex::new(None),
            locale: RecordLocale::default(),
            flash_duration: DEFAULT_FLASH_DURATION,
            flash_epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Locale used to render the date/time strings of new records.
    #[must_use]
    pub const fn with_locale(mut self, locale: RecordLocale) -> Self {
        self.locale = locale;
        self
    }

    /// How long `just_added` stays set after a successful append.
    #[must_use]
    pub const fn with_flash_duration(mut self, duration: Duration) -> Self {
        self.flash_duration = duration;
        self
    }

    /// Open the live feed, replacing any feed that is already running.
    ///
    /// A failure to subscribe is recorded in the view state (loading cleared,
    /// mirror kept) and also returned.
    pub async fn start(&self) -> Result<(), SyncError> {
        self.stop();
        let generation = self.generation.load(Ordering::SeqCst);
        self.state.send_modify(|view| {
            view.loading = true;
            view.last_error = None;
        });

        let subscription = match self.store.subscribe().await {
            Ok(subscription) => subscription,
            Err(error) => {
                let message = error.to_string();
                tracing::warn!("Failed to subscribe to sleep log: {}", message);
                apply_if_current(
                    &self.state,
                    &self.generation,
                    generation,
                    FeedEvent::Error(message.clone()),
                );
                return Err(SyncError::Subscription(message));
            }
        };

        let task = tokio::spawn(run_feed(
            subscription,
            Arc::clone(&self.state),
            Arc::clone(&self.generation),
            generation,
        ));
        let previous = self
            .feed_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
        tracing::info!("Sleep log feed started");
        Ok(())
    }

    /// Release the live feed. No mirror update happens after this returns.
    pub fn stop(&self) {
        // Bumped under the state lock so an update mid-apply finishes first.
        self.state.send_if_modified(|_| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            false
        });

        let task = self
            .feed_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
            tracing::debug!("Sleep log feed stopped");
        }
    }

    /// Record the anonymous identity issued by the auth backend (or its loss).
    pub fn set_session_user(&self, user_id: Option<String>) {
        let user_id = user_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        *self
            .session_user
            .write()
            .unwrap_or_else(PoisonError::into_inner) = user_id;
    }

    pub fn session_user(&self) -> Option<String> {
        self.session_user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn identity(&self) -> &IdentitySelector<P> {
        &self.identity
    }

    /// Append a record stamped `now` for `creator_id` labelled `creator_name`.
    ///
    /// Missing preconditions are refused before any store call. On success the
    /// record shows up with the next snapshot, not immediately.
    pub async fn append<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
        creator_id: Option<&str>,
        creator_name: Option<SpouseLabel>,
    ) -> Result<RecordId, SyncError> {
        let creator_id = creator_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(SyncError::AuthNotReady)?;
        let creator_name = creator_name.ok_or(SyncError::IdentityNotChosen)?;

        let draft = RecordDraft::at(now, creator_id, creator_name, self.locale)
            .map_err(SyncError::Write)?;
        let id = self.store.append(&draft).await.map_err(|error| {
            tracing::warn!("Append rejected: {}", error);
            SyncError::Write(error)
        })?;

        tracing::info!(%id, label = %creator_name, "Bedtime logged");
        self.flash_success();
        Ok(id)
    }

    /// Append as the current session user and chosen label, stamped now.
    pub async fn append_now(&self) -> Result<RecordId, SyncError> {
        let user = self.session_user();
        self.append(&Local::now(), user.as_deref(), self.identity.current())
            .await
    }

    /// Ask the store to delete `id`; the mirror follows with the next snapshot.
    pub async fn remove(&self, id: &RecordId) -> Result<(), SyncError> {
        self.store.delete(id).await.map_err(|error| {
            tracing::warn!(%id, "Delete rejected: {}", error);
            SyncError::Write(error)
        })?;
        tracing::info!(%id, "Record deleted");
        Ok(())
    }

    /// Current date grouping of the mirror.
    pub fn grouped_view(&self) -> GroupedView {
        self.state.borrow().grouped.clone()
    }

    /// Consistent copy of the whole view state.
    pub fn state(&self) -> ViewState {
        self.state.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Receiver notified on every view-state change.
    pub fn changes(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    fn flash_success(&self) {
        let epoch = self.flash_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|view| view.just_added = true);
        let state = Arc::clone(&self.state);
        let flash_epoch = Arc::clone(&self.flash_epoch);
        let duration = self.flash_duration;
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            // Only the most recent append may clear the flash.
            if flash_epoch.load(Ordering::SeqCst) == epoch {
                state.send_if_modified(|view| std::mem::replace(&mut view.just_added, false));
            }
        });
    }
}

impl<S: RemoteLogStore, P: LabelPersistence> Drop for LogViewModel<S, P> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Apply feed events in delivery order until the feed ends, fails, or is stopped.
async fn run_feed(
    mut subscription: Subscription,
    state: Arc<watch::Sender<ViewState>>,
    generation: Arc<AtomicU64>,
    current: u64,
) {
    while let Some(event) = subscription.next().await {
        let terminal = matches!(event, FeedEvent::Error(_));
        match &event {
            FeedEvent::Snapshot(records) => {
                tracing::debug!(records = records.len(), "Received snapshot");
            }
            FeedEvent::Error(message) => {
                tracing::warn!("Sleep log feed failed: {}", message);
            }
        }

        if !apply_if_current(&state, &generation, current, event) || terminal {
            return;
        }
    }
    tracing::debug!("Sleep log feed closed by store");
}

/// Returns false when the feed generation `current` has been stopped.
fn apply_if_current(
    state: &watch::Sender<ViewState>,
    generation: &AtomicU64,
    current: u64,
    event: FeedEvent,
) -> bool {
    let mut applied = false;
    state.send_if_modified(|view| {
        if generation.load(Ordering::SeqCst) != current {
            return false;
        }
        view.apply(event);
        applied = true;
        true
    });
    applied
}
