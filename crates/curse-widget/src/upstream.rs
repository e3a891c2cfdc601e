//! Upstream data source seam

use async_trait::async_trait;
use curseforge_api::{Addon, CurseForgeClient, CurseForgeError, DownloadHistory};

/// Read-only source of project metadata, download history and images
#[async_trait]
pub trait ProjectUpstream: Send + Sync {
    async fn addon(&self, project_id: u64) -> Result<Addon, CurseForgeError>;

    async fn monthly_downloads(&self, game_id: u32) -> Result<DownloadHistory, CurseForgeError>;

    async fn image(&self, url: &str) -> Result<Vec<u8>, CurseForgeError>;
}

#[async_trait]
impl ProjectUpstream for CurseForgeClient {
    async fn addon(&self, project_id: u64) -> Result<Addon, CurseForgeError> {
        self.get_addon(project_id).await
    }

    async fn monthly_downloads(&self, game_id: u32) -> Result<DownloadHistory, CurseForgeError> {
        self.get_monthly_downloads(game_id).await
    }

    async fn image(&self, url: &str) -> Result<Vec<u8>, CurseForgeError> {
        self.get_bytes(url).await
    }
}
