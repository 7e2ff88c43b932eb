use std::env;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use goodnight_core::config::ClientConfig;
use goodnight_core::identity::{FileLabelStore, IdentitySelector};
use goodnight_core::store::{LibSqlLogStore, MemoryLogStore, RemoteLogStore, Subscription};
use goodnight_core::{
    GroupedView, LogViewModel, RecordDraft, RecordId, SleepRecord, SyncError, ViewState,
};

use crate::auth::SupabaseAuthService;
use crate::config_profiles::{default_identity_path, CliProfile, CliProfilesConfig};
use crate::error::CliError;

const ENV_DB_PATH: &str = "GOODNIGHT_DB_PATH";
const FIRST_SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(15);

pub type CliViewModel = LogViewModel<LogStore, FileLabelStore>;

/// Store backing one CLI invocation.
pub enum LogStore {
    /// Throwaway log for `--offline`
    Memory(MemoryLogStore),
    /// Local file or Turso embedded replica
    LibSql(LibSqlLogStore),
}

impl LogStore {
    /// Re-read the database (pulling from the primary for replicas) and republish.
    pub async fn refresh(&self) -> Result<(), CliError> {
        match self {
            Self::Memory(_) => Ok(()),
            Self::LibSql(store) => Ok(store.refresh().await?),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::Memory(_) => "offline",
            Self::LibSql(store) if store.is_sync_enabled() => "turso replica",
            Self::LibSql(_) => "local",
        }
    }
}

impl RemoteLogStore for LogStore {
    async fn subscribe(&self) -> goodnight_core::Result<Subscription> {
        match self {
            Self::Memory(store) => store.subscribe().await,
            Self::LibSql(store) => store.subscribe().await,
        }
    }

    async fn append(&self, draft: &RecordDraft) -> goodnight_core::Result<RecordId> {
        match self {
            Self::Memory(store) => store.append(draft).await,
            Self::LibSql(store) => store.append(draft).await,
        }
    }

    async fn delete(&self, id: &RecordId) -> goodnight_core::Result<()> {
        match self {
            Self::Memory(store) => store.delete(id).await,
            Self::LibSql(store) => store.delete(id).await,
        }
    }
}

/// Settings resolved once per invocation from flags, profile, and environment.
pub struct CliContext {
    pub profile_name: String,
    pub profile: CliProfile,
    pub client: ClientConfig,
    pub db_path: PathBuf,
    pub offline: bool,
}

impl CliContext {
    pub fn resolve(
        cli_db_path: Option<PathBuf>,
        explicit_profile: Option<&str>,
        offline: bool,
    ) -> Result<Self, CliError> {
        let config = CliProfilesConfig::load().map_err(CliError::Config)?;
        let profile_name = config.resolve_profile_name(explicit_profile);
        let profile = config.profile(&profile_name).cloned().unwrap_or_default();

        let mut client = profile.client.clone().overlay(ClientConfig::from_env()?);
        client.normalize();
        client.validate()?;

        Ok(Self {
            profile_name,
            profile,
            client,
            db_path: resolve_db_path(cli_db_path)?,
            offline,
        })
    }

    pub async fn open_store(&self) -> Result<LogStore, CliError> {
        if self.offline {
            return Ok(LogStore::Memory(MemoryLogStore::new()));
        }

        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let collection = self.client.collection_name();
        let store = if let Some(sync_config) = self.client.sync_config() {
            LibSqlLogStore::open_with_sync(&self.db_path, collection, sync_config).await?
        } else {
            LibSqlLogStore::open(&self.db_path, collection).await?
        };
        Ok(LogStore::LibSql(store))
    }

    pub fn open_identity(&self) -> Result<IdentitySelector<FileLabelStore>, CliError> {
        let path = default_identity_path().map_err(CliError::Config)?;
        Ok(IdentitySelector::load(FileLabelStore::new(path))?)
    }

    /// View-model over `store` with the saved identity loaded.
    pub fn view_model(&self, store: Arc<LogStore>) -> Result<CliViewModel, CliError> {
        let identity = self.open_identity()?;
        Ok(LogViewModel::new(store, Arc::new(identity)).with_locale(self.client.record_locale()))
    }

    /// Anonymous user id records are attributed to.
    ///
    /// Uses a Supabase anonymous session when a project is configured, otherwise
    /// a device-local id kept in the profile.
    pub async fn resolve_session_user(&self) -> Result<String, CliError> {
        if !self.offline {
            let supabase = self
                .client
                .supabase()
                .map_err(|error| CliError::Auth(error.to_string()))?;
            if let Some((url, anon_key)) = supabase {
                let service = SupabaseAuthService::new(&self.profile_name, &url, &anon_key)
                    .map_err(|error| CliError::Auth(error.to_string()))?;
                let session = service
                    .ensure_session()
                    .await
                    .map_err(|error| CliError::Auth(error.to_string()))?;
                return Ok(session.user.id);
            }
        }

        if let Some(user_id) = &self.profile.local_user_id {
            return Ok(user_id.clone());
        }
        self.create_local_user_id()
    }

    fn create_local_user_id(&self) -> Result<String, CliError> {
        let user_id = uuid::Uuid::now_v7().to_string();
        let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
        config.profile_mut_or_default(&self.profile_name).local_user_id = Some(user_id.clone());
        config.save().map_err(CliError::Config)?;
        tracing::info!(
            "Created local anonymous id for profile '{}'",
            self.profile_name
        );
        Ok(user_id)
    }
}

/// Start the feed and wait for the first snapshot or feed failure.
pub async fn load_view(view_model: &CliViewModel) -> Result<ViewState, CliError> {
    view_model.start().await?;
    let mut changes = view_model.changes();
    let view = tokio::time::timeout(FIRST_SNAPSHOT_TIMEOUT, changes.wait_for(|view| !view.loading))
        .await
        .map_err(|_| CliError::LoadTimeout)?
        .map_err(|_| CliError::LoadTimeout)?
        .clone();

    match view.last_error {
        Some(message) => Err(SyncError::Subscription(message).into()),
        None => Ok(view),
    }
}

/// Date headers followed by one indented line per record.
pub fn format_group_lines(grouped: &GroupedView) -> Vec<String> {
    let mut lines = Vec::with_capacity(grouped.record_count() + grouped.len());
    for group in grouped {
        lines.push(group.date_string.clone());
        for record in &group.records {
            let label = record.user_name.map_or("-", |label| label.as_str());
            lines.push(format!(
                "  {:<10}  {label:<8}  {}",
                record.time_string,
                record.id.short()
            ));
        }
    }
    lines
}

pub fn normalize_record_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyRecordId)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Find the one record whose id equals or starts with `query`.
pub fn resolve_record<'a>(
    records: &'a [SleepRecord],
    query: &str,
) -> Result<&'a SleepRecord, CliError> {
    if let Some(record) = records.iter().find(|record| record.id.as_str() == query) {
        return Ok(record);
    }

    let matches = records
        .iter()
        .filter(|record| record.id.as_str().starts_with(query))
        .collect::<Vec<_>>();

    match matches.as_slice() {
        [] => Err(CliError::RecordNotFound(query.to_string())),
        [record] => Ok(*record),
        _ => {
            let options = matches
                .iter()
                .take(3)
                .map(|record| record.id.short())
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousRecordId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

/// Ask a yes/no question on the terminal. `assume_yes` skips the prompt.
pub fn confirm(prompt: &str, assume_yes: bool, action: &'static str) -> Result<bool, CliError> {
    if assume_yes {
        return Ok(true);
    }
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        return Err(CliError::ConfirmationRequired(action));
    }

    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    stdin.lock().read_line(&mut answer)?;
    Ok(is_affirmative(&answer))
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_db_path.or_else(|| env::var_os(ENV_DB_PATH).map(PathBuf::from)) {
        return Ok(path);
    }
    default_db_path()
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("goodnight").join("goodnight.db"))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".to_string()))
}
