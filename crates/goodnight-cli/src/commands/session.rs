use crate::auth::{clear_stored_session, load_stored_session, SupabaseAuthService};
use crate::cli::SessionCommands;
use crate::commands::common::CliContext;
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

pub async fn run_session(ctx: &CliContext, command: SessionCommands) -> Result<(), CliError> {
    let profile_name = &ctx.profile_name;
    let stored =
        load_stored_session(profile_name).map_err(|error| CliError::Auth(error.to_string()))?;
    let signed_in = stored.is_some();

    match command {
        SessionCommands::Show => match (stored, &ctx.profile.local_user_id) {
            (Some(session), _) => println!(
                "Profile '{}' logs as anonymous user {} (expires_at={})",
                profile_name, session.user.id, session.expires_at
            ),
            (None, Some(local_id)) => {
                println!("Profile '{profile_name}' logs as local user {local_id}");
            }
            (None, None) => println!("Profile '{profile_name}' has no user yet."),
        },
        SessionCommands::SignOut => {
            if let Some(session) = stored {
                sign_out_remote(ctx, &session.access_token).await?;
            }
            let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
            if config.clear_local_user_id(profile_name) {
                config.save().map_err(CliError::Config)?;
            } else if !signed_in {
                println!("Profile '{profile_name}' is not signed in.");
                return Ok(());
            }
            println!(
                "Signed out profile '{profile_name}'. The next bedtime gets a new anonymous user."
            );
        }
    }

    Ok(())
}

/// End the Supabase session, or just forget it when no project is configured.
async fn sign_out_remote(ctx: &CliContext, access_token: &str) -> Result<(), CliError> {
    let supabase = ctx
        .client
        .supabase()
        .map_err(|error| CliError::Auth(error.to_string()))?;
    if let Some((url, anon_key)) = supabase {
        let service = SupabaseAuthService::new(&ctx.profile_name, &url, &anon_key)
            .map_err(|error| CliError::Auth(error.to_string()))?;
        service
            .sign_out(access_token)
            .await
            .map_err(|error| CliError::Auth(error.to_string()))
    } else {
        clear_stored_session(&ctx.profile_name).map_err(|error| CliError::Auth(error.to_string()))
    }
}
