//! Data types for CurseForge API responses
//!
//! These structs mirror the addon API responses. Only the fields the widget
//! service reads are modelled; everything else is ignored during deserialization.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Release type of a project file, as encoded by the upstream `fileType` code
///
/// Codes are `1 = Release`, `2 = Beta`, `3 = Alpha`. The raw code does not
/// order by stability, so comparisons go through [`FileType::promotion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum FileType {
    Release,
    Beta,
    Alpha,
    /// A code this client does not know about
    Unknown(u8),
}

impl FileType {
    /// Promotion level: higher means more stable
    pub fn promotion(self) -> u8 {
        match self {
            Self::Release => 3,
            Self::Beta => 2,
            Self::Alpha => 1,
            Self::Unknown(_) => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Release => "release",
            Self::Beta => "beta",
            Self::Alpha => "alpha",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl From<u8> for FileType {
    fn from(code: u8) -> Self {
        match code {
            1 => Self::Release,
            2 => Self::Beta,
            3 => Self::Alpha,
            other => Self::Unknown(other),
        }
    }
}

impl From<FileType> for u8 {
    fn from(file_type: FileType) -> Self {
        match file_type {
            FileType::Release => 1,
            FileType::Beta => 2,
            FileType::Alpha => 3,
            FileType::Unknown(code) => code,
        }
    }
}

/// Latest file published for one game version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameVersionFile {
    pub game_version: String,
    pub project_file_id: u64,
    #[serde(default)]
    pub project_file_name: Option<String>,
    pub file_type: FileType,
}

/// Image attached to an addon page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Addon record from `/addon/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Addon {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub game_id: u32,
    #[serde(default)]
    pub download_count: f64,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub game_version_latest_files: Vec<GameVersionFile>,
}

impl Addon {
    /// URL of the first attachment flagged as default
    pub fn default_attachment_url(&self) -> Option<&str> {
        self.attachments
            .iter()
            .find(|a| a.is_default)
            .map(|a| a.url.as_str())
    }
}

/// Monthly downloads keyed by project id (as a string)
pub type DownloadHistory = HashMap<String, f64>;
