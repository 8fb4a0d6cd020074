//! Notekeep CLI
//!
//! Command-line interface for notekeep - local notes with live queries.

use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use notekeep_core::AppContainer;

mod commands;
mod editor;
mod output;

use commands::watch::WatchTarget;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "notekeep")]
#[command(about = "Notekeep - local notes with live queries")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new note
    #[command(alias = "create")]
    Add {
        /// Note title
        title: String,
        /// Note content (opens editor if not provided)
        #[arg(short, long)]
        content: Option<String>,
        /// Bookmark the new note
        #[arg(short, long)]
        bookmark: bool,
    },
    /// List all notes, oldest first
    #[command(alias = "ls")]
    List,
    /// List bookmarked notes, newest first
    Bookmarks,
    /// Show a note
    Show {
        /// Note ID
        id: i64,
    },
    /// Edit a note (opens editor if neither --title nor --content is given)
    Edit {
        /// Note ID
        id: i64,
        /// New title
        #[arg(short = 'T', long)]
        title: Option<String>,
        /// New content
        #[arg(short, long)]
        content: Option<String>,
    },
    /// Toggle a note's bookmark
    Bookmark {
        /// Note ID
        id: i64,
    },
    /// Delete a note
    #[command(alias = "rm")]
    Delete {
        /// Note ID
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Print changes to notes as they happen
    Watch {
        /// What to watch: all, bookmarks, or a note ID
        #[arg(default_value = "all")]
        target: WatchTarget,
        /// Seconds between checks for changes made by other processes
        #[arg(short, long, default_value_t = 1)]
        interval: u64,
    },
    /// Fetch notes from the configured remote endpoint
    Remote,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, remote_url, remote_timeout_secs)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands don't need the store
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), &output);
    }

    let app = AppContainer::open()?;

    match cli.command {
        Commands::Add {
            title,
            content,
            bookmark,
        } => commands::note::add(&app, title, content, bookmark, &output).await,
        Commands::List => commands::note::list(&app, &output).await,
        Commands::Bookmarks => commands::note::bookmarks(&app, &output).await,
        Commands::Show { id } => commands::note::show(&app, id, &output).await,
        Commands::Edit { id, title, content } => {
            commands::note::edit(&app, id, title, content, &output).await
        }
        Commands::Bookmark { id } => commands::note::toggle_bookmark(&app, id, &output).await,
        Commands::Delete { id, yes } => commands::note::delete(&app, id, yes, &output).await,
        Commands::Watch { target, interval } => {
            let interval = Duration::from_secs(interval.max(1));
            commands::watch::watch(&app, target, interval, &output).await
        }
        Commands::Remote => commands::remote::fetch(&app, &output).await,
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

fn handle_config_command(command: Option<ConfigCommands>, output: &Output) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(output),
        Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, output),
    }
}

/// Initialize logging
///
/// Only initializes if NOTEKEEP_LOG is set; logs go to stderr so they
/// never mix with command output.
fn init_logging() {
    let Ok(log_level) = std::env::var("NOTEKEEP_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!(
        "notekeep_core={},notekeep_cli={}",
        log_level, log_level
    ));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_watch_defaults() {
        let cli = Cli::try_parse_from(["notekeep", "watch"]).unwrap();
        match cli.command {
            Commands::Watch { target, interval } => {
                assert_eq!(target, WatchTarget::All);
                assert_eq!(interval, 1);
            }
            _ => panic!("expected watch"),
        }
    }

    #[test]
    fn test_parse_global_flags_after_command() {
        let cli = Cli::try_parse_from(["notekeep", "list", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::List));
    }
}
