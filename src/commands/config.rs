use crate::core::config::SETTABLE_KEYS;
use crate::core::AppConfig;
use anyhow::{Context, Result};
use colored::Colorize;

pub fn execute(matches: &clap::ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("show", _)) => show(),
        Some(("set", sub_matches)) => set(sub_matches),
        Some(("reset", _)) => reset(),
        Some(("add-reminder", sub_matches)) => add_reminder(sub_matches),
        Some(("remove-reminder", sub_matches)) => remove_reminder(sub_matches),
        _ => {
            println!("Use 'gamer-reminder config --help' for more information.");
            Ok(())
        }
    }
}

fn show() -> Result<()> {
    let config = AppConfig::load()?;
    let monitor = &config.monitor;

    println!("{}", "Monitor".white().bold());
    print_setting("active_threshold", format!("{}%", monitor.active_threshold));
    print_setting("inactive_threshold", format!("{}%", monitor.inactive_threshold));
    print_setting("inactive_hold_seconds", format!("{}s", monitor.inactive_hold_seconds));
    print_setting("sample_interval_ms", format!("{}ms", monitor.sample_interval_ms));
    print_setting("paused_threshold", format!("{}%", monitor.paused_threshold));
    print_setting("paused_stable_seconds", format!("{}s", monitor.paused_stable_seconds));
    print_setting("sound_enabled", config.sound_enabled.to_string());

    println!();
    println!("{}", "Reminders".white().bold());
    if config.reminders.is_empty() {
        println!("  {}", "No reminders configured.".dimmed());
    }
    for reminder in &config.reminders {
        println!("  {} {}", format!("[{}]", reminder.id).dimmed(), reminder.text);
    }

    if let Ok(path) = AppConfig::get_config_path() {
        println!();
        println!("{} {}", "Config file:".dimmed(), path.display());
    }

    Ok(())
}

fn print_setting(key: &str, value: String) {
    println!("  {:<24}{}", key, value.cyan());
}

fn set(matches: &clap::ArgMatches) -> Result<()> {
    let key = matches
        .get_one::<String>("key")
        .context("Key argument is required")?;
    let value = matches
        .get_one::<String>("value")
        .context("Value argument is required")?;

    let mut config = AppConfig::load()?;
    if let Err(e) = config.set_value(key, value) {
        println!("{} {}", "✗".red(), e);
        println!("{} {}", "Settable keys:".dimmed(), SETTABLE_KEYS.join(", "));
        return Err(e);
    }
    config.save()?;

    println!("{} {} = {}", "✓ Updated".green(), key, value.cyan().bold());
    Ok(())
}

fn reset() -> Result<()> {
    let mut config = AppConfig::load()?;
    config.reset_to_defaults();
    config.save()?;

    println!("{}", "✓ Configuration reset to defaults".green());
    Ok(())
}

fn add_reminder(matches: &clap::ArgMatches) -> Result<()> {
    let text = matches
        .get_one::<String>("text")
        .context("Reminder text is required")?;

    if text.trim().is_empty() {
        anyhow::bail!("Reminder text cannot be empty");
    }

    let mut config = AppConfig::load()?;
    let id = config.add_reminder(text.trim()).id.clone();
    config.save()?;

    println!("{} {}", "✓ Added reminder".green(), format!("[{}]", id).dimmed());
    Ok(())
}

fn remove_reminder(matches: &clap::ArgMatches) -> Result<()> {
    let id = matches
        .get_one::<String>("id")
        .context("Reminder id is required")?;

    let mut config = AppConfig::load()?;
    if !config.remove_reminder(id) {
        println!("{}", format!("No reminder with id '{}'", id).yellow());
        return Ok(());
    }
    config.save()?;

    println!("{} {}", "✓ Removed reminder".green(), id);
    Ok(())
}
