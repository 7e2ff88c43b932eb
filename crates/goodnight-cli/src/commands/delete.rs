use std::sync::Arc;

use crate::commands::common::{
    confirm, load_view, normalize_record_identifier, resolve_record, CliContext,
};
use crate::error::CliError;

pub async fn run_delete(ctx: &CliContext, id: &str, assume_yes: bool) -> Result<(), CliError> {
    let query = normalize_record_identifier(id)?;
    let store = Arc::new(ctx.open_store().await?);
    let view_model = ctx.view_model(store)?;
    let view = load_view(&view_model).await?;
    let record = resolve_record(&view.records, &query)?;

    let label = record.user_name.map_or("someone", |label| label.as_str());
    let prompt = format!(
        "Delete {label}'s bedtime on {} at {}?",
        record.date_string, record.time_string
    );
    if !confirm(&prompt, assume_yes, "delete")? {
        println!("Cancelled.");
        return Ok(());
    }

    view_model.remove(&record.id).await?;
    view_model.stop();
    println!("{}", record.id);
    Ok(())
}
