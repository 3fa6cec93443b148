//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api::{self, ApiSettings, AppState};
use crate::config::HerusConfig;
use herus_core::{
    HerusError, KnowledgeStore, MediaHash, MediaView, TopicView, UploadParent, UploadRequest,
};
use serde::Serialize;
use std::path::Path;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Open the store described by `config`.
pub fn open_store(config: &HerusConfig) -> Result<KnowledgeStore, HerusError> {
    KnowledgeStore::open(
        &config.database,
        &config.media_dir,
        config.graph,
        config.open_timeout(),
    )
}

/// Read a file for upload, refusing anything over `max_size` before
/// loading it into memory.
fn read_upload_file(path: &Path, max_size: usize) -> Result<Vec<u8>, HerusError> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        HerusError::Io(format!("Cannot read file metadata '{}': {}", path.display(), e))
    })?;

    if !metadata.is_file() {
        return Err(HerusError::InvalidInput(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }
    if metadata.len() > max_size as u64 {
        return Err(HerusError::InvalidInput(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }

    std::fs::read(path)
        .map_err(|e| HerusError::Io(format!("Cannot read '{}': {}", path.display(), e)))
}

fn print_json(value: &impl Serialize) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(config: &HerusConfig) -> Result<(), HerusError> {
    let store = open_store(config)?;

    println!("Herus Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:      {}", config.host);
    println!("  Port:      {}", config.port);
    println!("  Database:  {}", config.database.display());
    println!("  Media dir: {}", config.media_dir.display());
    println!();
    println!("Endpoints:");
    println!("  POST /upload     - Upload media");
    println!("  POST /connect    - Connect two topics");
    println!("  GET  /t/{{topic}}  - Topic view");
    println!("  GET  /e/{{hash}}   - Media view");
    println!("  GET  /m/{{hash}}   - Raw media");
    println!("  GET  /status     - Counts");
    println!("  GET  /health     - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let state = AppState::new(store, ApiSettings::from_config(config));
    api::run_server(&config.bind_addr(), state).await
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new database and media directory.
pub fn cmd_init(config: &HerusConfig, force: bool) -> Result<(), HerusError> {
    if config.database.exists() {
        if !force {
            return Err(HerusError::InvalidInput(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(&config.database).map_err(|e| {
            HerusError::Io(format!(
                "Cannot remove '{}': {}",
                config.database.display(),
                e
            ))
        })?;
    }

    let _store = open_store(config)?;
    println!(
        "Initialized new database at {} (media in {})",
        config.database.display(),
        config.media_dir.display()
    );
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show record counts.
pub fn cmd_status(config: &HerusConfig, json_mode: bool) -> Result<(), HerusError> {
    let store = open_store(config)?;
    let stats = store.stats()?;

    if json_mode {
        print_json(&serde_json::json!({
            "database": config.database.to_string_lossy(),
            "media_dir": config.media_dir.to_string_lossy(),
            "topics": stats.topics,
            "media": stats.media,
        }));
        return Ok(());
    }

    println!("Herus Graph Status");
    println!("==================");
    println!("Database:  {}", config.database.display());
    println!("Media dir: {}", config.media_dir.display());
    println!();
    println!("Topics: {}", stats.topics);
    println!("Media:  {}", stats.media);

    Ok(())
}

// =============================================================================
// UPLOAD COMMAND
// =============================================================================

/// Upload a file under a topic or as an elaboration.
pub fn cmd_upload(
    config: &HerusConfig,
    json_mode: bool,
    file: &Path,
    title: &str,
    parent_media: Option<&str>,
    parent_topic: Option<&str>,
    submitter: Option<&str>,
) -> Result<(), HerusError> {
    // Resolve the destination before touching the file or the database.
    let parent = UploadParent::from_options(parent_media, parent_topic)?;
    let content = read_upload_file(file, config.graph.max_upload_bytes)?;

    let mut request = UploadRequest::new(content, title, parent);
    if let Some(submitter) = submitter {
        request = request.with_submitter(submitter);
    }

    let store = open_store(config)?;
    let receipt = store.upload_media(&request)?;

    if json_mode {
        print_json(&receipt);
        return Ok(());
    }

    if receipt.created {
        println!("Uploaded {} as \"{}\"", receipt.hash, receipt.title);
    } else {
        println!(
            "Content already known as \"{}\" ({}); linked it again",
            receipt.title, receipt.hash
        );
    }
    Ok(())
}

// =============================================================================
// CONNECT COMMAND
// =============================================================================

/// Link one topic to another.
pub fn cmd_connect(
    config: &HerusConfig,
    json_mode: bool,
    source: &str,
    destination: &str,
    submitter: Option<&str>,
) -> Result<(), HerusError> {
    let store = open_store(config)?;
    let relation = store.connect_topics(source, destination, submitter)?;

    if json_mode {
        print_json(&relation);
        return Ok(());
    }

    println!(
        "Connected {} -> {} ({} upvotes)",
        herus_core::normalize_topic_name(source),
        relation.destination,
        relation.votes.upvotes
    );
    Ok(())
}

// =============================================================================
// VIEW COMMANDS
// =============================================================================

/// Show a topic.
pub fn cmd_topic(config: &HerusConfig, json_mode: bool, name: &str) -> Result<(), HerusError> {
    let store = open_store(config)?;
    let view = store.topic_view(name)?;

    if json_mode {
        print_json(&view);
        return Ok(());
    }

    match view {
        Some(view) => print_topic(&view),
        None => println!("No topic named \"{}\"", name),
    }
    Ok(())
}

fn print_topic(view: &TopicView) {
    println!("{}", view.title);
    println!("{}", "=".repeat(view.title.chars().count()));
    println!();
    println!("Related topics:");
    if view.relations.is_empty() {
        println!("  (none)");
    }
    for relation in &view.relations {
        println!(
            "  {}  (+{} / -{})",
            relation.destination, relation.votes.upvotes, relation.votes.downvotes
        );
    }
    println!();
    println!("Media:");
    if view.media.is_empty() {
        println!("  (none)");
    }
    for link in &view.media {
        println!("  {}  {}", link.media, link.title);
    }
}

/// Show a media record.
pub fn cmd_media(config: &HerusConfig, json_mode: bool, hash: &str) -> Result<(), HerusError> {
    let hash = MediaHash::parse(hash)?;
    let store = open_store(config)?;
    let view = store.media_view(&hash)?;

    if json_mode {
        print_json(&view);
        return Ok(());
    }

    match view {
        Some(view) => print_media(&view),
        None => println!("No media with hash {}", hash),
    }
    Ok(())
}

fn print_media(view: &MediaView) {
    println!("{}", view.title);
    println!("Hash: {}", view.hash);
    println!();
    println!("Elaborations:");
    if view.elaborations.is_empty() {
        println!("  (none)");
    }
    for link in &view.elaborations {
        println!("  {}  {}", link.media, link.title);
    }
}

// =============================================================================
// TESTS
// =============================================================================
