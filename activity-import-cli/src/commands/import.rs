//! Import command - validate a file, then import the selected activities

use anyhow::{bail, Result};
use colored::Colorize;
use dialoguer::Confirm;

use super::check::{prepare, show_validated, PipelineArgs};
use super::get_context;
use crate::output;

pub async fn run(args: PipelineArgs, yes: bool) -> Result<()> {
    let mut ctx = get_context(args.offline)?;
    let mut wizard = prepare(&mut ctx, &args).await?;

    let selected = wizard.session().selection.len();
    if selected == 0 {
        bail!("Nothing to import: every activity was flagged by the import API");
    }

    if !args.json {
        show_validated(&wizard);
        if args.offline {
            println!("{}", "OFFLINE - nothing will be sent to the import API".yellow());
        }
    }

    // Confirm unless --yes
    if !yes {
        if atty::isnt(atty::Stream::Stdin) {
            bail!("Refusing to prompt without a terminal; pass --yes to import");
        }
        println!();
        if !Confirm::new()
            .with_prompt(format!("Import {} activities?", selected))
            .default(false)
            .interact()?
        {
            println!("{}\n", "Cancelled".dimmed());
            return Ok(());
        }
    }

    let imported = wizard.commit(ctx.importer()).await?;

    if args.json {
        println!("{}", serde_json::json!({ "imported": imported }));
    } else {
        output::success(&format!("Imported {} activities", imported));
    }
    Ok(())
}
