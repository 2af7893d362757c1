use anyhow::Result;
use clap::{Arg, Command};

use gamer_reminder::commands;

fn main() -> Result<()> {
    let matches = Command::new("gamer-reminder")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Watches GPU/CPU load and reminds you to take care of yourself after gaming")
        .disable_version_flag(true)
        .arg(
            Arg::new("version")
                .short('v')
                .short_alias('V')
                .long("version")
                .help("Print version information")
                .action(clap::ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("watch")
                .about("Monitor hardware activity and show reminders when a session ends")
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval")
                        .value_name("MS")
                        .help("Sampling interval in milliseconds")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("active")
                        .long("active")
                        .value_name("PERCENT")
                        .help("Utilization at or above which a session starts")
                        .value_parser(clap::value_parser!(f32)),
                )
                .arg(
                    Arg::new("inactive")
                        .long("inactive")
                        .value_name("PERCENT")
                        .help("Utilization at or below which a session may end")
                        .value_parser(clap::value_parser!(f32)),
                )
                .arg(
                    Arg::new("hold")
                        .long("hold")
                        .value_name("SECONDS")
                        .help("Seconds utilization must stay low before a session ends")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("verbose")
                        .long("verbose")
                        .help("Show debug logging")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Manage configuration (use 'gamer-reminder config --help' for subcommands)")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(Command::new("show").about("Show current configuration"))
                .subcommand(
                    Command::new("set")
                        .about("Set a configuration value")
                        .arg(
                            Arg::new("key")
                                .help("Setting name (e.g. active_threshold)")
                                .required(true)
                                .index(1),
                        )
                        .arg(
                            Arg::new("value")
                                .help("New value")
                                .required(true)
                                .index(2),
                        ),
                )
                .subcommand(Command::new("reset").about("Restore default configuration"))
                .subcommand(
                    Command::new("add-reminder")
                        .about("Add a reminder shown when a session ends")
                        .arg(
                            Arg::new("text")
                                .help("Reminder text")
                                .required(true)
                                .index(1),
                        ),
                )
                .subcommand(
                    Command::new("remove-reminder")
                        .about("Remove a reminder by id")
                        .arg(
                            Arg::new("id")
                                .help("Reminder id (see 'config show')")
                                .required(true)
                                .index(1),
                        ),
                ),
        )
        .subcommand(Command::new("version").about("Shows version information"))
        .get_matches();

    if matches.get_flag("version") {
        return commands::version();
    }

    match matches.subcommand() {
        Some(("watch", sub_matches)) => {
            let level = if sub_matches.get_flag("verbose") {
                log::LevelFilter::Debug
            } else {
                log::LevelFilter::Info
            };
            gamer_reminder::init_logging_with(level);
            commands::watch(sub_matches)?;
        }
        Some(("config", sub_matches)) => {
            gamer_reminder::init_logging();
            commands::config::execute(sub_matches)?;
        }
        Some(("version", _)) => {
            commands::version()?;
        }
        _ => {
            println!("Welcome to gamer-reminder!");
            println!("Use 'gamer-reminder --help' for more information.");
        }
    }

    Ok(())
}
