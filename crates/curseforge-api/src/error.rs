//! Error types for CurseForge API client

use std::fmt;

/// Errors that can occur when interacting with the CurseForge API
#[derive(Debug)]
pub enum CurseForgeError {
    /// HTTP request failed
    Http(reqwest::Error),
    /// Upstream answered with a non-success status
    Status { url: String, status: u16 },
    /// Failed to parse JSON response
    Json(serde_json::Error),
}

impl fmt::Display for CurseForgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "CurseForge HTTP error: {}", e),
            Self::Status { url, status } => {
                write!(f, "CurseForge returned status {} for {}", status, url)
            }
            Self::Json(e) => write!(f, "CurseForge JSON parse error: {}", e),
        }
    }
}

impl std::error::Error for CurseForgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::Status { .. } => None,
            Self::Json(e) => Some(e),
        }
    }
}

impl From<reqwest::Error> for CurseForgeError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

impl From<serde_json::Error> for CurseForgeError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Result type for CurseForge API operations
pub type Result<T> = std::result::Result<T, CurseForgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = CurseForgeError::Status {
            url: "https://example.com/addon/1".to_string(),
            status: 404,
        };
        assert_eq!(
            err.to_string(),
            "CurseForge returned status 404 for https://example.com/addon/1"
        );
    }

    #[test]
    fn test_json_error_has_source() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = CurseForgeError::from(json_err);
        assert!(err.to_string().starts_with("CurseForge JSON parse error"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
