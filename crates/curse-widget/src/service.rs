//! Project data derivation behind the two TTL caches

use crate::cache::TtlCache;
use crate::color::Rgb;
use crate::config::Config;
use crate::error::WidgetError;
use crate::palette::extract_accent;
use crate::release::select_latest;
use crate::types::{CacheStats, ProjectData};
use crate::upstream::ProjectUpstream;
use curseforge_api::{Addon, CurseForgeError, DownloadHistory};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// History figures cover 30 days
const SECONDS_PER_MONTH: f64 = 30.0 * 24.0 * 60.0 * 60.0;

/// Loads, derives and caches [`ProjectData`]
pub struct WidgetService {
    upstream: Arc<dyn ProjectUpstream>,
    project_base_url: String,
    projects: TtlCache<u64, Arc<ProjectData>>,
    history: TtlCache<u32, Arc<DownloadHistory>>,
}

impl WidgetService {
    pub fn new(upstream: Arc<dyn ProjectUpstream>, config: &Config) -> Self {
        Self {
            upstream,
            project_base_url: config.project_base_url.clone(),
            projects: TtlCache::new("projects", config.project_cache),
            history: TtlCache::new("download_history", config.history_cache),
        }
    }

    /// Cached project data, computed on first request and after expiry
    pub async fn project(&self, project_id: u64) -> Result<Arc<ProjectData>, Arc<WidgetError>> {
        self.projects
            .get_or_compute(project_id, self.load_project(project_id))
            .await
    }

    pub fn project_cache_stats(&self) -> CacheStats {
        self.projects.stats()
    }

    pub fn history_cache_stats(&self) -> CacheStats {
        self.history.stats()
    }

    async fn load_project(&self, project_id: u64) -> Result<Arc<ProjectData>, WidgetError> {
        let addon = self.upstream.addon(project_id).await?;

        let project_url = format!("{}/{}", self.project_base_url, project_id);
        let thumbnail = addon.default_attachment_url().map(str::to_string);
        let release = select_latest(&addon.game_version_latest_files);
        if release.is_none() {
            debug!(project_id, "No release with a semantic game version");
        }

        let downloads_per_second = self.downloads_per_second(&addon).await;
        let image_accent = match thumbnail.as_deref() {
            Some(url) => self.thumbnail_accent(project_id, url).await,
            None => None,
        };

        info!(
            project_id,
            name = %addon.name,
            version = release.as_ref().map(|r| r.game_version.as_str()),
            accent = image_accent.map(Rgb::to_hex).as_deref(),
            "Loaded project"
        );

        Ok(Arc::new(ProjectData {
            download_count_pretty: pretty_count(addon.download_count),
            addon,
            project_id,
            project_url,
            thumbnail,
            downloads_per_second,
            release,
            image_accent,
        }))
    }

    async fn monthly_downloads(
        &self,
        game_id: u32,
    ) -> Result<Arc<DownloadHistory>, Arc<CurseForgeError>> {
        let upstream = self.upstream.clone();
        self.history
            .get_or_compute(game_id, async move {
                upstream.monthly_downloads(game_id).await.map(Arc::new)
            })
            .await
    }

    /// Average rate over last month, 0 when unknown
    async fn downloads_per_second(&self, addon: &Addon) -> f64 {
        if addon.game_id == 0 {
            return 0.0;
        }
        match self.monthly_downloads(addon.game_id).await {
            Ok(history) => history
                .get(&addon.id.to_string())
                .map(|monthly| monthly / SECONDS_PER_MONTH)
                .filter(|rate| *rate > 0.0)
                .unwrap_or(0.0),
            Err(e) => {
                warn!(game_id = addon.game_id, error = %e, "Failed to load download history");
                0.0
            }
        }
    }

    async fn thumbnail_accent(&self, project_id: u64, url: &str) -> Option<Rgb> {
        let bytes = match self.upstream.image(url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(project_id, url, error = %e, "Failed to fetch thumbnail");
                return None;
            }
        };

        match tokio::task::spawn_blocking(move || extract_accent(&bytes)).await {
            Ok(accent) => accent,
            Err(e) => {
                warn!(project_id, error = %e, "Palette extraction task failed");
                None
            }
        }
    }
}

/// Whole number with `,` thousands separators
pub fn pretty_count(count: f64) -> String {
    let n = count.trunc() as i64;
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
