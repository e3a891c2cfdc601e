//! Data types for the widget service

use crate::color::Rgb;
use crate::release::ResolvedRelease;
use curseforge_api::Addon;
use serde::{Deserialize, Serialize};

/// Everything derived for one project on a cache miss
///
/// Shared as `Arc<ProjectData>` between requests and never mutated after
/// construction; per-request choices (theme, download mode) live in the
/// render view instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectData {
    pub addon: Addon,
    pub project_id: u64,
    pub project_url: String,
    /// First attachment flagged as default
    pub thumbnail: Option<String>,
    pub download_count_pretty: String,
    pub downloads_per_second: f64,
    pub release: Option<ResolvedRelease>,
    /// Vibrant color of the thumbnail, when it could be extracted
    pub image_accent: Option<Rgb>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub requests_per_hour: u64,
    pub project_cache: CacheStats,
    pub history_cache: CacheStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_default() {
        let stats = CacheStats::default();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok".to_string(),
            uptime_secs: 3600,
            requests_per_hour: 42,
            project_cache: CacheStats {
                entries: 3,
                hits: 500,
                misses: 50,
            },
            history_cache: CacheStats::default(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"requests_per_hour\":42"));
        assert!(json.contains("\"hits\":500"));
    }
}
