//! Subcommand implementations.

#[cfg(feature = "google")]
pub mod auth;
pub mod chat;
pub mod config;
