use std::sync::Arc;

use chrono::Local;
use goodnight_core::SyncError;

use crate::commands::common::CliContext;
use crate::error::CliError;

pub async fn run_sleep(ctx: &CliContext) -> Result<(), CliError> {
    let store = Arc::new(ctx.open_store().await?);
    let view_model = ctx.view_model(store)?;
    let Some(label) = view_model.identity().current() else {
        return Err(CliError::IdentityNotChosen);
    };

    view_model.set_session_user(Some(ctx.resolve_session_user().await?));
    let now = Local::now();
    let id = view_model
        .append(&now, view_model.session_user().as_deref(), Some(label))
        .await
        .map_err(|error| match error {
            SyncError::IdentityNotChosen => CliError::IdentityNotChosen,
            other => CliError::Sync(other),
        })?;

    let time = ctx.client.record_locale().time_string(&now);
    println!("{label} went to bed at {time}. Good night!");
    println!("{}", id.short());
    Ok(())
}
