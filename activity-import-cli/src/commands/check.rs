//! Check command - run a file through mapping and dry-run validation

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;

use activity_import_core::services::ImportWizard;
use activity_import_core::{CanonicalField, ImportContext, WizardState};

use super::{get_context, load, parse_mapping, print_failure};
use crate::output;

/// Options shared by `check` and `import`
#[derive(Args, Debug)]
pub struct PipelineArgs {
    /// Path to a .csv or .json file
    pub file: PathBuf,
    /// Map a field to a column, e.g. --map unitPrice="Trade Price" (repeatable; empty column unmaps)
    #[arg(long = "map", value_name = "FIELD=COLUMN", value_parser = parse_mapping)]
    pub mappings: Vec<(CanonicalField, String)>,
    /// Start from a saved import profile
    #[arg(long)]
    pub profile: Option<String>,
    /// Save the final column mapping as a profile
    #[arg(long)]
    pub save_profile: Option<String>,
    /// Validate locally without contacting the import API
    #[arg(long)]
    pub offline: bool,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: PipelineArgs) -> Result<()> {
    let mut ctx = get_context(args.offline)?;
    let wizard = prepare(&mut ctx, &args).await?;
    let session = wizard.session();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&*session)?);
        return Ok(());
    }

    show_validated(&wizard);
    if args.offline {
        println!("{}", "OFFLINE - activities were not checked by the import API".yellow());
    }
    Ok(())
}

/// Take the file as far as the activity selection step
///
/// On failure the summary and diagnostics are printed (unless `--json`, which
/// prints the session instead) and an error is returned.
pub async fn prepare(ctx: &mut ImportContext, args: &PipelineArgs) -> Result<ImportWizard> {
    let (file_name, content) = load(&args.file).await?;
    let mut wizard = ctx.wizard();

    let mut outcome = wizard.open_file(&file_name, &content).await;

    if matches!(outcome, Ok(WizardState::MapColumns)) {
        configure_mapping(ctx, &mut wizard, args)?;
        outcome = wizard.apply_mapping().await;
    } else if (!args.mappings.is_empty() || args.profile.is_some()) && !args.json {
        output::warning("Column mapping options only apply to .csv files; ignored");
    }

    match outcome {
        Ok(WizardState::SelectActivities) => Ok(wizard),
        _ => {
            let session = wizard.session();
            if args.json {
                println!("{}", serde_json::to_string_pretty(&*session)?);
            } else {
                print_failure(&session);
            }
            bail!("{} was not accepted", file_name)
        }
    }
}

fn configure_mapping(ctx: &mut ImportContext, wizard: &mut ImportWizard, args: &PipelineArgs) -> Result<()> {
    if let Some(name) = &args.profile {
        let Some(profile) = ctx.config.profile(name) else {
            bail!("Profile not found: {}", name);
        };
        let dropped = wizard.use_mapping(&profile.column_mapping)?;
        if !args.json {
            output::info(&format!("Using profile '{}'", name));
            if !dropped.is_empty() {
                let names: Vec<&str> = dropped.iter().map(|f| f.key()).collect();
                output::warning(&format!(
                    "Profile columns missing from this file, left unmapped: {}",
                    names.join(", ")
                ));
            }
        }
    }

    for (field, column) in &args.mappings {
        if let Some(displaced) = wizard.assign_column(*field, column)? {
            if !args.json {
                output::warning(&format!("'{}' moved from {} to {}", column, displaced, field));
            }
        }
    }

    if let Some(name) = &args.save_profile {
        ctx.config.save_profile(name, wizard.session().mapping.clone());
        ctx.save_config()?;
        if !args.json {
            println!("Profile '{}' saved", name);
        }
    }

    if !args.json {
        println!("{}", "Column mapping (* required):".cyan());
        println!("{}", output::mapping_table(&wizard.session().mapping));
        println!();
    }
    Ok(())
}

/// Print the validated activities and what would be imported
pub fn show_validated(wizard: &ImportWizard) {
    let session = wizard.session();
    println!("{}", output::activities_table(&session));
    output::truncation_note(output::MAX_TABLE_ROWS, session.activities.len());
    println!();

    let flagged = session.activities.iter().filter(|a| a.has_error()).count();
    output::success(&format!("{} activities ready to import", session.selection.len()));
    if flagged > 0 {
        output::warning(&format!("{} activities flagged by the import API will be skipped", flagged));
    }
}
