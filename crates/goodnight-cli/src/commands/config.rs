use std::path::PathBuf;

use goodnight_core::config::ClientConfig;
use goodnight_core::format::RecordLocale;
use goodnight_core::util::normalize_text_option;

use crate::cli::ConfigCommands;
use crate::commands::common::CliContext;
use crate::config_profiles::{default_config_path, CliProfilesConfig};
use crate::error::CliError;

const REDACTED: &str = "[REDACTED]";

pub fn run_config(
    command: ConfigCommands,
    global_profile: Option<&str>,
    cli_db_path: Option<PathBuf>,
    offline: bool,
) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            supabase_url,
            supabase_anon_key,
            turso_url,
            turso_token,
            collection,
            locale,
            no_activate,
        } => {
            let locale = normalize_text_option(locale)
                .map(|raw| raw.parse::<RecordLocale>())
                .transpose()?;
            let explicit = ClientConfig {
                supabase_url,
                supabase_anon_key,
                turso_database_url: turso_url,
                turso_auth_token: turso_token,
                collection,
                locale,
            };
            run_config_init(global_profile, explicit, no_activate)
        }
        ConfigCommands::Show => {
            run_config_show(&CliContext::resolve(cli_db_path, global_profile, offline)?)
        }
    }
}

pub fn run_config_init(
    profile_name: Option<&str>,
    explicit: ClientConfig,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let profile = config.profile_mut_or_default(&profile_name);

    let mut merged = profile.client.clone().overlay(explicit);
    merged.normalize();
    merged.validate()?;
    profile.client = merged;

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let missing_fields = config
        .profile(&profile_name)
        .map(|profile| missing_remote_fields(&profile.client))
        .unwrap_or_default();
    if missing_fields.is_empty() {
        println!("Profile '{profile_name}' syncs with Turso and signs in anonymously.");
    } else {
        println!(
            "Profile '{}' is local-only until set: {}",
            profile_name,
            missing_fields.join(", ")
        );
    }

    Ok(())
}

pub fn run_config_show(ctx: &CliContext) -> Result<(), CliError> {
    let path = default_config_path().map_err(CliError::Config)?;
    println!("Profile: {}", ctx.profile_name);
    println!("Config file: {}", path.display());
    println!("Database: {}", ctx.db_path.display());
    println!("{}", serde_json::to_string_pretty(&redact(&ctx.client))?);
    Ok(())
}

/// Settings still unset for shared logging.
pub fn missing_remote_fields(client: &ClientConfig) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if client.supabase_url.is_none() {
        missing.push("supabase_url");
    }
    if client.supabase_anon_key.is_none() {
        missing.push("supabase_anon_key");
    }
    if client.turso_database_url.is_none() {
        missing.push("turso_url");
    }
    if client.turso_auth_token.is_none() {
        missing.push("turso_token");
    }
    missing
}

pub fn redact(client: &ClientConfig) -> ClientConfig {
    let mut redacted = client.clone();
    if redacted.turso_auth_token.is_some() {
        redacted.turso_auth_token = Some(REDACTED.to_string());
    }
    redacted
}
