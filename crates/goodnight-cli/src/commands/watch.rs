use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use goodnight_core::ViewState;
use tokio::time::MissedTickBehavior;

use crate::commands::common::{format_group_lines, CliContext};
use crate::error::CliError;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub async fn run_watch(ctx: &CliContext, interval_secs: u64) -> Result<(), CliError> {
    let store = Arc::new(ctx.open_store().await?);
    let view_model = ctx.view_model(Arc::clone(&store))?;
    let source = store.describe();
    let clear = io::stdout().is_terminal();

    view_model.start().await?;
    let mut changes = view_model.changes();
    let mut refresh = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result?;
                break;
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = changes.borrow_and_update().clone();
                print_watch_frame(&render_watch_frame(&view, source), clear);
            }
            _ = refresh.tick() => {
                if view_model.state().last_error.is_some() {
                    tracing::info!("Reopening live feed after failure");
                    if let Err(error) = view_model.start().await {
                        tracing::warn!("Failed to reopen live feed: {}", error);
                    }
                } else if let Err(error) = store.refresh().await {
                    tracing::warn!("Refresh failed: {}", error);
                }
            }
        }
    }

    view_model.stop();
    println!("Stopped watching.");
    Ok(())
}

fn print_watch_frame(lines: &[String], clear: bool) {
    if clear {
        print!("{CLEAR_SCREEN}");
    }
    for line in lines {
        println!("{line}");
    }
}

/// Full screen contents for one view state.
pub fn render_watch_frame(view: &ViewState, source: &str) -> Vec<String> {
    let mut lines = vec![format!(
        "Goodnight ({source}), updated {}",
        Local::now().format("%H:%M:%S")
    )];
    lines.push(String::new());

    if view.loading {
        lines.push("Loading...".to_string());
    } else if view.grouped.is_empty() {
        lines.push("No bedtimes logged yet.".to_string());
    } else {
        lines.extend(format_group_lines(&view.grouped));
    }

    if let Some(error) = &view.last_error {
        lines.push(String::new());
        lines.push(format!("! Live updates failed: {error}"));
    }
    lines.push(String::new());
    lines.push("Press Ctrl-C to stop.".to_string());
    lines
}
