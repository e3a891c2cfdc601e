//! Latest release selection across per-game-version files

use curseforge_api::{FileType, GameVersionFile};
use semver::Version;
use serde::Serialize;

/// The file chosen as a project's latest release
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRelease {
    pub game_version: String,
    pub file_type: FileType,
    pub file_id: u64,
}

impl ResolvedRelease {
    /// Link to the file page (`direct`) or to the tracked `/download` endpoint
    pub fn download_url(&self, project_url: &str, direct: bool) -> String {
        if direct {
            format!("{}/files/{}", project_url, self.file_id)
        } else {
            format!("{}/files/{}/download", project_url, self.file_id)
        }
    }
}

impl From<&GameVersionFile> for ResolvedRelease {
    fn from(file: &GameVersionFile) -> Self {
        Self {
            game_version: file.game_version.clone(),
            file_type: file.file_type,
            file_id: file.project_file_id,
        }
    }
}

/// Pick the newest, most promoted file
///
/// Files whose game version is not a strict `MAJOR.MINOR.PATCH` version are
/// ignored, so snapshots and two-component versions never win. A file only
/// competes if no other file for the same game version string is more
/// promoted. Among competitors the first file with the greatest version wins.
pub fn select_latest(files: &[GameVersionFile]) -> Option<ResolvedRelease> {
    let mut best: Option<(Version, &GameVersionFile)> = None;

    for file in files {
        let Ok(version) = Version::parse(&file.game_version) else {
            continue;
        };
        if !is_most_promoted(files, file) {
            continue;
        }
        match &best {
            Some((best_version, _)) if version <= *best_version => {}
            _ => best = Some((version, file)),
        }
    }

    best.map(|(_, file)| ResolvedRelease::from(file))
}

/// True when no file for the same game version has a higher promotion level
fn is_most_promoted(files: &[GameVersionFile], candidate: &GameVersionFile) -> bool {
    let level = candidate.file_type.promotion();
    files
        .iter()
        .filter(|f| f.game_version == candidate.game_version)
        .all(|f| f.file_type.promotion() <= level)
}
