//! `watch` command: run the activity monitor in the foreground.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;

use crate::core::activity_monitor::{
    ActivityEvent, EventKind, MonitorController, MonitorMessage, DEFAULT_SESSION_LABEL,
};
use crate::core::{build_reminder_payload, AppConfig, MonitorConfig, NotificationPayload, Notifier};
use crate::platform::default_detector;

const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

/// Prints reminders to the terminal, ringing the bell when sound is on.
pub struct ConsoleNotifier {
    pub sound_enabled: bool,
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, payload: &NotificationPayload) -> crate::Result<()> {
        println!();
        println!("{}", payload.title.magenta().bold());
        for line in payload.body.lines() {
            println!("  {}", line);
        }
        println!();
        if self.sound_enabled {
            print!("\x07");
        }
        Ok(())
    }
}

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let app_config = AppConfig::load().context("Failed to load configuration")?;
    let monitor_config = apply_overrides(app_config.to_monitor_config(), matches);

    let controller = MonitorController::new(monitor_config.clone(), Box::new(default_detector()))
        .context("Invalid monitor configuration")?;

    let notifier = ConsoleNotifier {
        sound_enabled: app_config.sound_enabled,
    };
    let reminders = app_config.reminders.clone();

    controller.add_listener(Arc::new(move |message: &MonitorMessage| match message {
        MonitorMessage::Event(event) => {
            print_event(event);
            if event.kind == EventKind::GameEnded {
                let payload = build_reminder_payload(&reminders, &event.session_label);
                if let Err(e) = notifier.notify(&payload) {
                    log::warn!("Failed to deliver reminder: {}", e);
                }
            }
        }
        MonitorMessage::Error(error) => {
            eprintln!("{} {}", "Monitor error:".red().bold(), error);
        }
    }));

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();

    // Setup Ctrl+C handler
    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::Relaxed);
    })
    .map_err(|e| anyhow::anyhow!("Failed to set Ctrl+C handler: {}", e))?;

    print_banner(&monitor_config);
    controller.start().context("Failed to start activity monitor")?;

    let source = controller.get_hardware_state().telemetry_source;
    println!("{} {}", "Telemetry:".dimmed(), source);
    println!("{}", "Press Ctrl+C to stop".dimmed());
    println!();

    while running.load(Ordering::Relaxed) {
        std::thread::sleep(SHUTDOWN_POLL);
    }

    println!();
    println!("{}", "Stopping monitor...".yellow());
    controller.shutdown();

    Ok(())
}

fn apply_overrides(mut config: MonitorConfig, matches: &ArgMatches) -> MonitorConfig {
    if let Some(&interval) = matches.get_one::<u64>("interval") {
        config.sample_interval_ms = interval;
    }
    if let Some(&active) = matches.get_one::<f32>("active") {
        config.active_threshold = active;
    }
    if let Some(&inactive) = matches.get_one::<f32>("inactive") {
        config.inactive_threshold = inactive;
    }
    if let Some(&hold) = matches.get_one::<u64>("hold") {
        config.inactive_hold_seconds = hold;
    }
    config
}

fn print_banner(config: &MonitorConfig) {
    println!("{}", format!("Watching for {}", DEFAULT_SESSION_LABEL).cyan().bold());
    println!(
        "  {} {}%   {} {}% for {}s   {} {}ms",
        "start >=".dimmed(),
        config.active_threshold,
        "end <=".dimmed(),
        config.inactive_threshold,
        config.inactive_hold_seconds,
        "interval".dimmed(),
        config.sample_interval_ms
    );
}

fn print_event(event: &ActivityEvent) {
    let time = event
        .at
        .with_timezone(&chrono::Local)
        .format("%H:%M:%S")
        .to_string();

    let kind = match event.kind {
        EventKind::GameStarted => event.kind.to_string().green().bold(),
        EventKind::GameEnded => event.kind.to_string().yellow().bold(),
    };

    println!("[{}] {} {} ({})", time.dimmed(), kind, event.session_label, event.reason);
}
