use goodnight_core::identity::ResetDecision;
use goodnight_core::SpouseLabel;

use crate::cli::IdentityCommands;
use crate::commands::common::{confirm, CliContext};
use crate::error::CliError;

pub fn run_identity(ctx: &CliContext, command: IdentityCommands) -> Result<(), CliError> {
    let identity = ctx.open_identity()?;

    match command {
        IdentityCommands::Show => match identity.current() {
            Some(label) => println!("{label}"),
            None => println!("No identity chosen. Pick one of: {}", label_choices()),
        },
        IdentityCommands::Choose { label } => {
            let label = label.parse::<SpouseLabel>()?;
            identity.choose(label)?;
            println!("This device now logs as {label}.");
        }
        IdentityCommands::Reset { yes } => {
            let Some(current) = identity.current() else {
                println!("No identity chosen.");
                return Ok(());
            };
            let decision = if confirm(&format!("Stop logging as {current}?"), yes, "reset")? {
                ResetDecision::Confirm
            } else {
                ResetDecision::Cancel
            };

            if identity.reset(decision)? {
                println!("Identity cleared. Choose again before logging.");
            } else {
                println!("Kept {current}.");
            }
        }
    }

    Ok(())
}

fn label_choices() -> String {
    SpouseLabel::ALL
        .into_iter()
        .map(SpouseLabel::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
