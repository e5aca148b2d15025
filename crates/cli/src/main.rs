// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use pagemark_config::{Config, ConfigManager};
use std::path::PathBuf;

mod commands;

fn remote_auth_args(command: Command, uri_arg: &'static str, uri_help: &'static str) -> Command {
    command
        .arg(
            Arg::new(uri_arg)
                .long(uri_arg)
                .value_name("URL")
                .required(true)
                .help(uri_help),
        )
        .arg(
            Arg::new("token")
                .long("token")
                .value_name("TOKEN")
                .required(true)
                .env("PAGEMARK_TOKEN")
                .hide_env_values(true)
                .help("Bearer token for the patron"),
        )
}

fn settings_command(name: &'static str, about: &'static str) -> Command {
    remote_auth_args(
        Command::new(name).about(about),
        "settings",
        "Patron settings document URL",
    )
}

fn bookmark_file_arg() -> Arg {
    Arg::new("file")
        .required(true)
        .value_name("FILE")
        .help("Bookmark JSON file")
}

fn fallback_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("kind")
                .long("kind")
                .value_name("KIND")
                .value_parser(["explicit", "last-read"])
                .default_value("explicit")
                .help("Kind assumed when the file does not say"),
        )
        .arg(
            Arg::new("book-title")
                .long("book-title")
                .value_name("TITLE")
                .help("Book title assumed when the file does not say"),
        )
        .arg(
            Arg::new("book-id")
                .long("book-id")
                .value_name("OPDS_ID")
                .help("OPDS book id assumed when the file does not say"),
        )
}

fn build_cli() -> Command {
    Command::new("pagemark")
        .version(env!("CARGO_PKG_VERSION"))
        .author("DrTomLLC")
        .about("Inspect, upgrade and synchronize reader bookmarks")
        .arg(
            Arg::new("config-dir")
                .long("config")
                .value_name("DIR")
                .help("Directory holding config.toml")
                .global(true),
        )
        .subcommand(fallback_args(
            Command::new("inspect")
                .about("Decode a bookmark file and describe it")
                .arg(bookmark_file_arg()),
        ))
        .subcommand(fallback_args(
            Command::new("upgrade")
                .about("Rewrite a bookmark file in the current format")
                .arg(bookmark_file_arg())
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Write here instead of standard output"),
                ),
        ))
        .subcommand(fallback_args(
            Command::new("id")
                .about("Print the identity of a bookmark file")
                .arg(bookmark_file_arg()),
        ))
        .subcommand(
            Command::new("remote")
                .about("Talk to an annotation server")
                .subcommand_required(true)
                .subcommand(remote_auth_args(
                    Command::new("list").about("List the bookmarks stored on the server"),
                    "annotations",
                    "Annotations collection URL",
                ))
                .subcommand(settings_command(
                    "status",
                    "Show whether the patron permits bookmark sync",
                ))
                .subcommand(settings_command("enable", "Permit bookmark sync for the patron"))
                .subcommand(settings_command("disable", "Forbid bookmark sync for the patron")),
        )
        .subcommand(
            Command::new("config")
                .about("Manage the configuration file")
                .subcommand_required(true)
                .subcommand(Command::new("show").about("Print the effective configuration"))
                .subcommand(Command::new("init").about("Create the config file if missing"))
                .subcommand(
                    Command::new("reset")
                        .about("Restore defaults, keeping the device id")
                        .arg(
                            Arg::new("force")
                                .short('f')
                                .long("force")
                                .help("Required to confirm the reset")
                                .action(ArgAction::SetTrue),
                        ),
                )
                .subcommand(Command::new("validate").about("Check the config file")),
        )
}

fn config_manager(dir: Option<&String>) -> Result<ConfigManager> {
    let manager = match dir {
        Some(dir) => ConfigManager::with_directory(PathBuf::from(dir)),
        None => ConfigManager::new(),
    };
    manager.context("Failed to locate configuration directory")
}

fn effective_config(manager: &ConfigManager) -> Config {
    match manager.load_with_env_overrides() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("warning: {e}; using defaults");
            manager.load_or_default()
        }
    }
}

fn main() -> Result<()> {
    let matches = build_cli().get_matches();
    let manager = config_manager(matches.get_one::<String>("config-dir"))?;
    let config = effective_config(&manager);

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.app.log_level.to_string()),
    )
    .init();
    log::debug!("Using config at {}", manager.config_path().display());

    match matches.subcommand() {
        Some(("inspect", sub_matches)) => commands::inspect(sub_matches),
        Some(("upgrade", sub_matches)) => commands::upgrade(sub_matches),
        Some(("id", sub_matches)) => commands::print_id(sub_matches),
        Some(("remote", sub_matches)) => commands::remote(&config, sub_matches),
        Some(("config", sub_matches)) => commands::config(&manager, &config, sub_matches),
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}
