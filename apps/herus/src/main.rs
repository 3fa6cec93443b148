//! # Herus - Knowledge-Sharing Server
//!
//! The main binary for the Herus knowledge graph.
//!
//! This application provides:
//! - HTTP JSON API server (axum-based)
//! - CLI interface for uploads, connections and lookups
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    apps/herus (THE BINARY)                  │
//! │                                                             │
//! │      ┌─────────────┐              ┌─────────────┐           │
//! │      │    CLI      │              │  HTTP API   │           │
//! │      │   (clap)    │              │   (axum)    │           │
//! │      └──────┬──────┘              └──────┬──────┘           │
//! │             └──────────────┬─────────────┘                  │
//! │                            ▼                                │
//! │                    ┌───────────────┐                        │
//! │                    │  herus-core   │                        │
//! │                    │  (THE STORE)  │                        │
//! │                    └───────────────┘                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! herus server --host 0.0.0.0 --port 3841
//!
//! # CLI operations
//! herus upload -f notes.pdf -t "Lecture Notes" --topic "linear algebra"
//! herus connect "linear algebra" "calculus"
//! herus topic "linear algebra"
//! ```

use clap::Parser;
use herus::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // HERUS_LOG_FORMAT=json switches to machine-parseable output.
    let log_format = std::env::var("HERUS_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "herus=info,herus_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!(kind = e.kind(), "Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Herus startup banner.
fn print_banner() {
    println!(
        r#"
  ██╗  ██╗███████╗██████╗ ██╗   ██╗███████╗
  ██║  ██║██╔════╝██╔══██╗██║   ██║██╔════╝
  ███████║█████╗  ██████╔╝██║   ██║███████╗
  ██╔══██║██╔══╝  ██╔══██╗██║   ██║╚════██║
  ██║  ██║███████╗██║  ██║╚██████╔╝███████║
  ╚═╝  ╚═╝╚══════╝╚═╝  ╚═╝ ╚═════╝ ╚══════╝

  Knowledge Graph Server v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
