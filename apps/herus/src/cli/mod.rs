//! # Herus CLI Module
//!
//! This module implements the CLI interface for Herus.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `init` - Initialize a new database and media directory
//! - `status` - Show topic and media counts
//! - `upload` - Upload a file under a topic or other media
//! - `connect` - Link one topic to another
//! - `topic` - Show a topic's relations and media
//! - `media` - Show a media record's title and elaborations

mod commands;

use crate::config::HerusConfig;
use clap::{Parser, Subcommand};
use herus_core::HerusError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Herus - knowledge-sharing server
///
/// Topics, uploaded media and the links between them, stored in one
/// embedded database.
#[derive(Parser, Debug)]
#[command(name = "herus")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the graph database (overrides the config file)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Directory for uploaded media (overrides the config file)
    #[arg(short = 'M', long, global = true)]
    pub media_dir: Option<PathBuf>,

    /// Config file (default: ./herus.toml if present)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Initialize a new empty database
    Init {
        /// Replace an existing database file
        #[arg(short, long)]
        force: bool,
    },

    /// Show topic and media counts
    Status,

    /// Upload a file
    Upload {
        /// File to upload
        #[arg(short, long)]
        file: PathBuf,

        /// Title shown for the media
        #[arg(short, long)]
        title: String,

        /// Attach under this topic
        #[arg(long)]
        topic: Option<String>,

        /// Attach as an elaboration of this media hash
        #[arg(long)]
        parent: Option<String>,

        /// Who submitted it
        #[arg(short, long)]
        submitter: Option<String>,
    },

    /// Link topic SOURCE to topic DESTINATION
    Connect {
        source: String,
        destination: String,

        /// Who submitted it
        #[arg(short, long)]
        submitter: Option<String>,
    },

    /// Show a topic
    Topic { name: String },

    /// Show a media record
    Media { hash: String },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Resolve configuration from file, environment and global flags.
pub fn resolve_config(cli: &Cli) -> Result<HerusConfig, HerusError> {
    let mut config = HerusConfig::load(cli.config.as_deref())?;
    if let Some(database) = &cli.database {
        config.database.clone_from(database);
    }
    if let Some(media_dir) = &cli.media_dir {
        config.media_dir.clone_from(media_dir);
    }
    Ok(config)
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), HerusError> {
    let mut config = resolve_config(&cli)?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            cmd_server(&config).await
        }
        Some(Commands::Init { force }) => cmd_init(&config, force),
        Some(Commands::Status) => cmd_status(&config, json_mode),
        Some(Commands::Upload {
            file,
            title,
            topic,
            parent,
            submitter,
        }) => cmd_upload(
            &config,
            json_mode,
            &file,
            &title,
            parent.as_deref(),
            topic.as_deref(),
            submitter.as_deref(),
        ),
        Some(Commands::Connect {
            source,
            destination,
            submitter,
        }) => cmd_connect(&config, json_mode, &source, &destination, submitter.as_deref()),
        Some(Commands::Topic { name }) => cmd_topic(&config, json_mode, &name),
        Some(Commands::Media { hash }) => cmd_media(&config, json_mode, &hash),
        None => cmd_status(&config, json_mode),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_upload_with_globals() {
        let cli = Cli::try_parse_from([
            "herus",
            "--json-mode",
            "-D",
            "/tmp/x.db",
            "upload",
            "-f",
            "notes.txt",
            "-t",
            "Notes",
            "--topic",
            "algebra",
        ])
        .expect("parse");

        assert!(cli.json_mode);
        assert_eq!(cli.database, Some(PathBuf::from("/tmp/x.db")));
        match cli.command {
            Some(Commands::Upload { title, topic, parent, .. }) => {
                assert_eq!(title, "Notes");
                assert_eq!(topic.as_deref(), Some("algebra"));
                assert!(parent.is_none());
            }
            other => unreachable!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parses_connect_positionals() {
        let cli = Cli::try_parse_from(["herus", "connect", "science", "math", "-s", "ada"])
            .expect("parse");
        assert!(matches!(
            cli.command,
            Some(Commands::Connect { ref source, ref destination, ref submitter })
                if source == "science" && destination == "math" && submitter.as_deref() == Some("ada")
        ));
    }

    #[test]
    fn flags_override_config_paths() {
        let cli = Cli::try_parse_from(["herus", "-D", "a.db", "-M", "blobs", "status"])
            .expect("parse");
        let config = resolve_config(&cli).expect("config");
        assert_eq!(config.database, PathBuf::from("a.db"));
        assert_eq!(config.media_dir, PathBuf::from("blobs"));
    }
}
