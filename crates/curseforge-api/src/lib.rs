//! Rust client for the CurseForge addon metadata API
//!
//! This crate provides typed bindings to the two read-only endpoints the widget
//! service depends on: the addon record keyed by numeric project id, and the
//! monthly download history published per game.
//!
//! # Example
//!
//! ```no_run
//! use curseforge_api::CurseForgeClient;
//!
//! # async fn example() -> Result<(), curseforge_api::CurseForgeError> {
//! let client = CurseForgeClient::new();
//!
//! let addon = client.get_addon(238222).await?;
//! println!("{} has {} downloads", addon.name, addon.download_count);
//!
//! let history = client.get_monthly_downloads(addon.game_id).await?;
//! println!("{:?}", history.get(&addon.id.to_string()));
//! # Ok(())
//! # }
//! ```
//!
//! # API Coverage
//!
//! - `GET /addon/{id}` - Addon metadata, attachments and latest files per game version
//! - `GET /history/downloads/{gameId}/monthly` - Monthly downloads for every project of a game

mod client;
mod error;
mod types;

pub use client::CurseForgeClient;
pub use error::{CurseForgeError, Result};
pub use types::{Addon, Attachment, Author, DownloadHistory, FileType, GameVersionFile};
