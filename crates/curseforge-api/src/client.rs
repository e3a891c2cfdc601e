//! CurseForge API HTTP client

use crate::error::{CurseForgeError, Result};
use crate::types::*;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Client for the CurseForge addon API and the community download history mirror
///
/// All calls are plain read-only GETs. Non-success statuses are reported as
/// [`CurseForgeError::Status`]; nothing is retried.
pub struct CurseForgeClient {
    http: reqwest::Client,
    api_url: String,
    history_url: String,
}

impl CurseForgeClient {
    /// Base URL for the addon metadata API
    pub const DEFAULT_API_URL: &'static str = "https://addons-ecs.forgesvc.net/api/v2";
    /// Base URL for the monthly download history API
    pub const DEFAULT_HISTORY_URL: &'static str =
        "https://cursemeta.dries007.net/api/v2/history/downloads";

    /// Create a new client with default endpoints (30 second timeout)
    pub fn new() -> Self {
        Self::with_endpoints(
            Self::DEFAULT_API_URL,
            Self::DEFAULT_HISTORY_URL,
            Duration::from_secs(30),
        )
    }

    /// Create a new client against custom endpoints with a custom timeout
    pub fn with_endpoints(api_url: &str, history_url: &str, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            history_url: history_url.trim_end_matches('/').to_string(),
        }
    }

    /// Get the addon record for a project
    ///
    /// # Arguments
    /// * `project_id` - Numeric CurseForge project id
    pub async fn get_addon(&self, project_id: u64) -> Result<Addon> {
        let url = format!("{}/addon/{}", self.api_url, project_id);
        self.get_json(&url).await
    }

    /// Get last month's download counts for every project of a game
    ///
    /// # Arguments
    /// * `game_id` - Numeric CurseForge game id (432 is Minecraft)
    pub async fn get_monthly_downloads(&self, game_id: u32) -> Result<DownloadHistory> {
        let url = format!("{}/{}/monthly", self.history_url, game_id);
        self.get_json(&url).await
    }

    /// Download raw bytes from an arbitrary URL, used for thumbnails
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CurseForgeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let data = response.bytes().await?.to_vec();
        debug!(url, size = data.len(), "Fetched bytes");
        Ok(data)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url, "Requesting CurseForge");
        let body = self.get_bytes(url).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl Default for CurseForgeClient {
    fn default() -> Self {
        Self::new()
    }
}
