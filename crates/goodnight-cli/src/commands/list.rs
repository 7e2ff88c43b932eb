use std::sync::Arc;

use crate::commands::common::{format_group_lines, load_view, CliContext};
use crate::error::CliError;

pub async fn run_list(ctx: &CliContext, as_json: bool) -> Result<(), CliError> {
    let store = Arc::new(ctx.open_store().await?);
    let view_model = ctx.view_model(store)?;
    let view = load_view(&view_model).await?;
    view_model.stop();

    if as_json {
        println!("{}", serde_json::to_string_pretty(&view.grouped)?);
    } else if view.grouped.is_empty() {
        println!("No bedtimes logged yet.");
    } else {
        for line in format_group_lines(&view.grouped) {
            println!("{line}");
        }
    }

    Ok(())
}
