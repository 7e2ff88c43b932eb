//! Persistent CLI profile configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use goodnight_core::config::ClientConfig;
use goodnight_core::util::normalize_text_option;
use serde::{Deserialize, Serialize};

const APP_DIR_NAME: &str = "goodnight";
const CONFIG_FILE_NAME: &str = "cli-config.json";
const IDENTITY_FILE_NAME: &str = "identity.json";
const DEFAULT_PROFILE: &str = "default";
pub const ENV_PROFILE: &str = "GOODNIGHT_PROFILE";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfilesConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub active_profile: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, CliProfile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfile {
    #[serde(flatten)]
    pub client: ClientConfig,
    /// Anonymous id used when no Supabase project is configured
    #[serde(default)]
    pub local_user_id: Option<String>,
}

const fn default_config_version() -> u32 {
    1
}

fn app_config_dir() -> Result<PathBuf, String> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| "Failed to resolve CLI config directory".to_string())
}

pub fn default_config_path() -> Result<PathBuf, String> {
    Ok(app_config_dir()?.join(CONFIG_FILE_NAME))
}

/// Where the chosen display label is kept.
pub fn default_identity_path() -> Result<PathBuf, String> {
    Ok(app_config_dir()?.join(IDENTITY_FILE_NAME))
}

pub fn normalize_profile_name(value: Option<&str>) -> Option<String> {
    let value = value?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl CliProfilesConfig {
    pub fn load() -> Result<Self, String> {
        Self::load_from_path(&default_config_path()?)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        let mut config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
        config.normalize();
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf, String> {
        let path = default_config_path()?;
        self.save_to_path(&path)?;
        Ok(path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    error
                )
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)
            .map_err(|error| format!("Failed to serialize config: {error}"))?;
        std::fs::write(path, serialized)
            .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
    }

    /// Explicit name, then `GOODNIGHT_PROFILE`, then the active profile.
    pub fn resolve_profile_name(&self, explicit: Option<&str>) -> String {
        let from_env = std::env::var(ENV_PROFILE).ok();
        self.resolve_profile_name_with(explicit, from_env.as_deref())
    }

    pub fn resolve_profile_name_with(
        &self,
        explicit: Option<&str>,
        from_env: Option<&str>,
    ) -> String {
        normalize_profile_name(explicit)
            .or_else(|| normalize_profile_name(from_env))
            .or_else(|| normalize_profile_name(self.active_profile.as_deref()))
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string())
    }

    pub fn profile(&self, name: &str) -> Option<&CliProfile> {
        self.profiles.get(name)
    }

    pub fn profile_mut_or_default(&mut self, name: &str) -> &mut CliProfile {
        self.profiles.entry(name.to_string()).or_default()
    }

    /// Drop the device-local anonymous id of `name`; true when one was set.
    pub fn clear_local_user_id(&mut self, name: &str) -> bool {
        self.profiles
            .get_mut(name)
            .and_then(|profile| profile.local_user_id.take())
            .is_some()
    }

    fn normalize(&mut self) {
        self.active_profile = normalize_profile_name(self.active_profile.as_deref());
        for profile in self.profiles.values_mut() {
            profile.normalize();
        }
    }
}

impl CliProfile {
    fn normalize(&mut self) {
        self.client.normalize();
        self.local_user_id = normalize_text_option(self.local_user_id.take());
    }
}

#[cfg(test)]
mod tests {
    use goodnight_core::format::RecordLocale;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn normalize_profile_name_rejects_empty() {
        assert_eq!(normalize_profile_name(None), None);
        assert_eq!(normalize_profile_name(Some(" ")), None);
        assert_eq!(normalize_profile_name(Some(" home ")), Some("home".to_string()));
    }

    #[test]
    fn config_roundtrip_preserves_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let mut config = CliProfilesConfig {
            version: 1,
            active_profile: Some("default".to_string()),
            profiles: BTreeMap::new(),
        };
        config.profiles.insert(
            "default".to_string(),
            CliProfile {
                client: ClientConfig {
                    supabase_url: Some(" https://project.supabase.co/ ".to_string()),
                    supabase_anon_key: Some(" anon-key ".to_string()),
                    collection: Some("sleep_logs".to_string()),
                    locale: Some(RecordLocale::EnUs),
                    ..Default::default()
                },
                local_user_id: Some("  ".to_string()),
            },
        );

        config.save_to_path(&path).unwrap();
        let loaded = CliProfilesConfig::load_from_path(&path).unwrap();
        let profile = loaded.profile("default").unwrap();
        assert_eq!(
            profile.client.supabase_url.as_deref(),
            Some("https://project.supabase.co")
        );
        assert_eq!(profile.client.supabase_anon_key.as_deref(), Some("anon-key"));
        assert_eq!(profile.client.locale, Some(RecordLocale::EnUs));
        assert_eq!(profile.local_user_id, None);
    }

    #[test]
    fn profile_fields_are_stored_flat() {
        let profile = CliProfile {
            client: ClientConfig {
                collection: Some("nap_logs".to_string()),
                ..Default::default()
            },
            local_user_id: Some("0192-local".to_string()),
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["collection"], "nap_logs");
        assert_eq!(json["local_user_id"], "0192-local");
    }

    #[test]
    fn missing_config_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = CliProfilesConfig::load_from_path(&dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded, CliProfilesConfig::default());
    }

    #[test]
    fn resolve_profile_name_prefers_explicit_then_env_then_active() {
        let config = CliProfilesConfig {
            version: 1,
            active_profile: Some("home".to_string()),
            profiles: BTreeMap::new(),
        };
        assert_eq!(config.resolve_profile_name_with(Some("travel"), Some("env")), "travel");
        assert_eq!(config.resolve_profile_name_with(None, Some("env")), "env");
        assert_eq!(config.resolve_profile_name_with(None, Some(" ")), "home");
        assert_eq!(
            CliProfilesConfig::default().resolve_profile_name_with(None, None),
            "default"
        );
    }

    #[test]
    fn clear_local_user_id_forgets_only_that_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut config = CliProfilesConfig::default();
        config.profile_mut_or_default("home").local_user_id = Some("0192-home".to_string());
        config.profile_mut_or_default("travel").local_user_id = Some("0192-travel".to_string());

        assert!(config.clear_local_user_id("home"));
        assert!(!config.clear_local_user_id("home"));
        assert!(!config.clear_local_user_id("absent"));
        config.save_to_path(&path).unwrap();

        let loaded = CliProfilesConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded.profile("home").unwrap().local_user_id, None);
        assert_eq!(
            loaded.profile("travel").unwrap().local_user_id.as_deref(),
            Some("0192-travel")
        );
    }
}
