//! Profiles command - list saved column mappings

use anyhow::Result;
use colored::Colorize;

use activity_import_core::config::Config;

use super::get_app_dir;

pub fn run(json: bool) -> Result<()> {
    let config = Config::load(&get_app_dir()?)?;
    let profiles = &config.import_profiles;

    if json {
        println!("{}", serde_json::to_string_pretty(profiles)?);
        return Ok(());
    }

    if profiles.is_empty() {
        println!("No saved profiles.");
        println!("{}", "Save one with: aimp check FILE --save-profile NAME".dimmed());
        return Ok(());
    }

    println!("Saved import profiles:");
    for (name, profile) in profiles {
        println!();
        match profile.saved_at {
            Some(saved_at) => println!("  {} {}", name.green(), format!("(saved {})", saved_at.format("%Y-%m-%d")).dimmed()),
            None => println!("  {}", name.green()),
        }
        for (field, column) in profile.column_mapping.iter() {
            println!("    {}: {}", field.label(), column);
        }
    }

    Ok(())
}
