use colored::Colorize;

use crate::error::{CardError, Result};
use crate::settings::{load_settings, save_settings, settings_file_exists, settings_path, Settings};

/// Print the settings the card would run with.
pub fn show() -> Result<()> {
    let settings = load_settings();
    let path = settings_path();
    let source = if settings_file_exists() {
        path.display().to_string()
    } else {
        format!("{} (not found, using defaults)", path.display())
    };

    println!("{}     {source}", "File:".bold());
    println!("{}  {}", "Confetti:".bold(), on_off(settings.confetti));
    println!("{}      {} ms", "Tick:".bold(), settings.tick_ms);
    println!("{}     {}", "Motes:".bold(), settings.ambient_particles);
    println!("{} {}", "Log level:".bold(), settings.log_level);
    println!("{}  {}", "Log file:".bold(), settings.log_path().display());
    Ok(())
}

fn on_off(flag: bool) -> colored::ColoredString {
    if flag {
        "on".green()
    } else {
        "off".red()
    }
}

/// Write a default settings file. Refuses to clobber an existing one unless forced.
pub fn init(force: bool) -> Result<()> {
    let path = settings_path();
    if path.exists() && !force {
        return Err(CardError::Settings(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    save_settings(&Settings::default())?;
    println!("Wrote default settings to {}", path.display());
    Ok(())
}
