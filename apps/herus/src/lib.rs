//! # herus
//!
//! Server and command-line front end for the Herus knowledge graph.
//! The binary in `main.rs` only installs logging and hands off to `cli`.

pub mod api;
pub mod cli;
pub mod config;
