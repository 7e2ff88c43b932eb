//! Client configuration.
//!
//! `ClientConfig` names the hosted services a client talks to: Supabase for
//! anonymous auth and Turso (libSQL) for the shared log. Values come from
//! profile files and can be overridden by environment variables.

use serde::{Deserialize, Serialize};

use crate::auth::{resolve_optional_supabase_config, AuthResult};
use crate::db::SyncConfig;
use crate::error::{Error, Result};
use crate::format::RecordLocale;
use crate::store::DEFAULT_COLLECTION;
use crate::util::{is_http_url, is_valid_collection_name, normalize_text_option};

pub const ENV_SUPABASE_URL: &str = "GOODNIGHT_SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "GOODNIGHT_SUPABASE_ANON_KEY";
pub const ENV_TURSO_DATABASE_URL: &str = "TURSO_DATABASE_URL";
pub const ENV_TURSO_AUTH_TOKEN: &str = "TURSO_AUTH_TOKEN";
pub const ENV_COLLECTION: &str = "GOODNIGHT_COLLECTION";
pub const ENV_LOCALE: &str = "GOODNIGHT_LOCALE";

/// Public endpoints and keys needed to reach the shared log.
///
/// Only safe-to-ship values belong here; the Turso token is the exception and
/// is expected to come from the environment or a user-owned profile file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_anon_key: Option<String>,
    #[serde(default)]
    pub turso_database_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turso_auth_token: Option<String>,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub locale: Option<RecordLocale>,
}

impl ClientConfig {
    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let locale = normalize_text_option(lookup(ENV_LOCALE))
            .map(|raw| raw.parse::<RecordLocale>())
            .transpose()?;

        Ok(Self {
            supabase_url: normalize_text_option(lookup(ENV_SUPABASE_URL)),
            supabase_anon_key: normalize_text_option(lookup(ENV_SUPABASE_ANON_KEY)),
            turso_database_url: normalize_text_option(lookup(ENV_TURSO_DATABASE_URL)),
            turso_auth_token: normalize_text_option(lookup(ENV_TURSO_AUTH_TOKEN)),
            collection: normalize_text_option(lookup(ENV_COLLECTION)),
            locale,
        })
    }

    /// Values set in `overrides` replace the ones in `self`.
    #[must_use]
    pub fn overlay(mut self, overrides: Self) -> Self {
        if overrides.supabase_url.is_some() {
            self.supabase_url = overrides.supabase_url;
        }
        if overrides.supabase_anon_key.is_some() {
            self.supabase_anon_key = overrides.supabase_anon_key;
        }
        if overrides.turso_database_url.is_some() {
            self.turso_database_url = overrides.turso_database_url;
        }
        if overrides.turso_auth_token.is_some() {
            self.turso_auth_token = overrides.turso_auth_token;
        }
        if overrides.collection.is_some() {
            self.collection = overrides.collection;
        }
        if overrides.locale.is_some() {
            self.locale = overrides.locale;
        }
        self
    }

    /// Trim every text field and drop empty ones.
    pub fn normalize(&mut self) {
        self.supabase_url = normalize_text_option(self.supabase_url.take())
            .map(|url| url.trim_end_matches('/').to_string());
        self.supabase_anon_key = normalize_text_option(self.supabase_anon_key.take());
        self.turso_database_url = normalize_text_option(self.turso_database_url.take());
        self.turso_auth_token = normalize_text_option(self.turso_auth_token.take());
        self.collection = normalize_text_option(self.collection.take());
    }

    /// Reject malformed values before anything connects.
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.supabase_url {
            if !is_http_url(url) {
                return Err(Error::InvalidInput(
                    "supabase_url must include http:// or https://".to_string(),
                ));
            }
        }
        if let Some(collection) = &self.collection {
            if !is_valid_collection_name(collection) {
                return Err(Error::InvalidInput(format!(
                    "collection '{collection}' must be lowercase letters, digits, or underscores"
                )));
            }
        }
        if self.turso_database_url.is_some() != self.turso_auth_token.is_some() {
            return Err(Error::InvalidInput(
                "turso_database_url and turso_auth_token must be set together".to_string(),
            ));
        }
        Ok(())
    }

    pub fn collection_name(&self) -> &str {
        self.collection.as_deref().unwrap_or(DEFAULT_COLLECTION)
    }

    pub fn record_locale(&self) -> RecordLocale {
        self.locale.unwrap_or_default()
    }

    /// Supabase URL and anon key, when both are configured.
    pub fn supabase(&self) -> AuthResult<Option<(String, String)>> {
        resolve_optional_supabase_config(self.supabase_url.clone(), self.supabase_anon_key.clone())
    }

    /// Embedded-replica settings, when a Turso database is configured.
    pub fn sync_config(&self) -> Option<SyncConfig> {
        match (&self.turso_database_url, &self.turso_auth_token) {
            (Some(url), Some(token)) => Some(SyncConfig::new(url.clone(), token.clone())),
            _ => None,
        }
    }
}
