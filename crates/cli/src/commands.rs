// FILE: crates/cli/src/commands.rs

use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use console::style;
use pagemark_config::{Config, ConfigManager, NetworkConfig};
use pagemark_core::{AccountCredentials, Bookmark, BookmarkKind};
use pagemark_network::{BookmarkHttpCalls, Client, ClientConfig, HttpBookmarkCalls};
use pagemark_wire::{BookmarkCodec, FallbackValues, LocatorCodec};
use std::path::{Path, PathBuf};
use url::Url;

/// Describe a bookmark file
pub fn inspect(matches: &ArgMatches) -> Result<()> {
    let bookmark = read_bookmark(&file_arg(matches)?, &fallback_values(matches)?)?;
    println!("{}", describe(&bookmark));
    Ok(())
}

/// Re-encode a bookmark file in the current format
pub fn upgrade(matches: &ArgMatches) -> Result<()> {
    let bookmark = read_bookmark(&file_arg(matches)?, &fallback_values(matches)?)?;
    let upgraded = bookmark.upgraded();
    let text = BookmarkCodec::encode_pretty(&upgraded).context("Failed to encode bookmark")?;

    match matches.get_one::<String>("output") {
        Some(output) => {
            std::fs::write(output, text + "\n")
                .with_context(|| format!("Failed to write {}", output))?;
            println!(
                "{} Upgraded {} -> {}",
                style("✓").green().bold(),
                bookmark.format,
                upgraded.format
            );
            println!("  ID: {}", upgraded.bookmark_id());
            println!("  File: {}", output);
        }
        None => println!("{}", text),
    }
    Ok(())
}

/// Print only the bookmark ID
pub fn print_id(matches: &ArgMatches) -> Result<()> {
    let bookmark = read_bookmark(&file_arg(matches)?, &fallback_values(matches)?)?;
    println!("{}", bookmark.bookmark_id());
    Ok(())
}

pub fn remote(config: &Config, matches: &ArgMatches) -> Result<()> {
    let calls = HttpBookmarkCalls::new(build_client(&config.network)?);

    match matches.subcommand() {
        Some(("list", sub_matches)) => {
            let annotations = url_arg(sub_matches, "annotations")?;
            let credentials = credentials(sub_matches)?.with_annotations_uri(annotations.clone());
            let bookmarks = calls
                .bookmarks_get(&annotations, &credentials)
                .context("Failed to fetch bookmarks")?;

            if bookmarks.is_empty() {
                println!("No bookmarks stored on the server.");
                return Ok(());
            }

            println!("\n{} Bookmarks on Server", style(bookmarks.len()).bold().cyan());
            println!("{}", "=".repeat(80));
            for bookmark in &bookmarks {
                println!("{}", describe(bookmark));
                println!();
            }
            Ok(())
        }
        Some(("status", sub_matches)) => {
            let settings = url_arg(sub_matches, "settings")?;
            let permitted = calls
                .syncing_is_enabled(&settings, &credentials(sub_matches)?)
                .context("Failed to read patron settings")?;
            println!(
                "Bookmark sync is {}",
                if permitted {
                    style("permitted").green()
                } else {
                    style("not permitted").yellow()
                }
            );
            Ok(())
        }
        Some((name @ ("enable" | "disable"), sub_matches)) => {
            let settings = url_arg(sub_matches, "settings")?;
            let enabled = name == "enable";
            calls
                .syncing_enable(&settings, &credentials(sub_matches)?, enabled)
                .context("Failed to update patron settings")?;
            println!(
                "{} Bookmark sync {}",
                style("✓").green().bold(),
                if enabled { "enabled" } else { "disabled" }
            );
            Ok(())
        }
        _ => bail!("Unknown remote command"),
    }
}

pub fn config(manager: &ConfigManager, effective: &Config, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("show", _)) => {
            println!("# {}", manager.config_path().display());
            print!("{}", toml::to_string_pretty(effective).context("Failed to render config")?);
            Ok(())
        }
        Some(("init", _)) => {
            if manager.initialize().context("Failed to initialize config")? {
                println!(
                    "{} Created {}",
                    style("✓").green().bold(),
                    manager.config_path().display()
                );
            } else {
                println!("Config already exists at {}", manager.config_path().display());
            }
            Ok(())
        }
        Some(("reset", sub_matches)) => {
            if !sub_matches.get_flag("force") {
                bail!("Refusing to reset without --force");
            }
            manager.reset().context("Failed to reset config")?;
            println!("{} Config reset to defaults", style("✓").green().bold());
            Ok(())
        }
        Some(("validate", _)) => {
            let problems = manager.validate().context("Failed to load config")?;
            if problems.is_empty() {
                println!("{} Config is valid", style("✓").green().bold());
                return Ok(());
            }
            for problem in &problems {
                println!("{} {}", style("✗").red().bold(), problem);
            }
            bail!("{} problem(s) in {}", problems.len(), manager.config_path().display())
        }
        _ => bail!("Unknown config command"),
    }
}

fn file_arg(matches: &ArgMatches) -> Result<PathBuf> {
    matches
        .get_one::<String>("file")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("Bookmark file is required"))
}

fn url_arg(matches: &ArgMatches, name: &str) -> Result<Url> {
    let value = matches
        .get_one::<String>(name)
        .ok_or_else(|| anyhow::anyhow!("--{} is required", name))?;
    Url::parse(value).with_context(|| format!("Invalid URL for --{}: {}", name, value))
}

fn credentials(matches: &ArgMatches) -> Result<AccountCredentials> {
    let token = matches
        .get_one::<String>("token")
        .ok_or_else(|| anyhow::anyhow!("--token is required"))?;
    Ok(AccountCredentials::bearer(token.as_str()))
}

pub(crate) fn parse_kind(text: &str) -> Result<BookmarkKind> {
    match text {
        "explicit" => Ok(BookmarkKind::Explicit),
        "last-read" => Ok(BookmarkKind::LastReadLocation),
        other => BookmarkKind::parse(other).with_context(|| format!("Unknown bookmark kind: {}", other)),
    }
}

fn fallback_values(matches: &ArgMatches) -> Result<FallbackValues> {
    let text = |name: &str| matches.get_one::<String>(name).cloned().unwrap_or_default();
    let kind = parse_kind(
        matches
            .get_one::<String>("kind")
            .map(String::as_str)
            .unwrap_or("explicit"),
    )?;
    Ok(FallbackValues::new(kind, text("book-title"), text("book-id")))
}

pub(crate) fn read_bookmark(path: &Path, fallback: &FallbackValues) -> Result<Bookmark> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    BookmarkCodec::decode_str(&text, fallback)
        .with_context(|| format!("Failed to decode bookmark in {}", path.display()))
}

pub(crate) fn client_config(network: &NetworkConfig) -> ClientConfig {
    ClientConfig {
        timeout: network.timeout(),
        user_agent: network.user_agent.clone(),
        ..ClientConfig::default()
    }
}

fn build_client(network: &NetworkConfig) -> Result<Client> {
    Client::with_config(client_config(network)).context("Failed to create HTTP client")
}

/// Multi-line human description of a bookmark
pub(crate) fn describe(bookmark: &Bookmark) -> String {
    let mut lines = vec![
        format!("{} {}", style("Bookmark").bold(), bookmark.bookmark_id()),
        format!("  Format: {}", bookmark.format),
        format!("  Kind: {}", bookmark.kind),
        format!("  Book: {} ({})", display_or_dash(&bookmark.book_title), bookmark.opds_id),
        format!("  Book ID: {}", bookmark.book_id()),
        format!("  Location: {}", LocatorCodec::encode(&bookmark.location)),
    ];
    if !bookmark.chapter_title.is_empty() {
        lines.push(format!("  Chapter: {}", bookmark.chapter_title));
    }
    lines.push(format!(
        "  Progress: book {:.0}%, chapter {:.0}%",
        bookmark.book_progress * 100.0,
        bookmark.chapter_progress * 100.0
    ));
    lines.push(format!("  Time: {}", pagemark_core::format_time(&bookmark.time)));
    lines.push(format!("  Device: {}", bookmark.device_id));
    if let Some(uri) = &bookmark.uri {
        lines.push(format!("  URI: {}", uri));
    }
    lines.join("\n")
}

fn display_or_dash(text: &str) -> &str {
    if text.is_empty() {
        "-"
    } else {
        text
    }
}

#[cfg(test)]
mod tests;
