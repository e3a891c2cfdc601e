//! Error types for the widget service

use std::fmt;

#[derive(Debug)]
pub enum WidgetError {
    /// CurseForge API error
    Upstream(curseforge_api::CurseForgeError),
    /// Template compilation or rendering error
    Template(upon::Error),
    /// Configuration error
    Config(String),
    Io(Box<std::io::Error>),
}

impl fmt::Display for WidgetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upstream(e) => write!(f, "{}", e),
            Self::Template(e) => write!(f, "Template error: {}", e),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for WidgetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Upstream(e) => Some(e),
            Self::Template(e) => Some(e),
            Self::Config(_) => None,
            Self::Io(e) => Some(e.as_ref()),
        }
    }
}

impl From<curseforge_api::CurseForgeError> for WidgetError {
    fn from(e: curseforge_api::CurseForgeError) -> Self {
        Self::Upstream(e)
    }
}

impl From<upon::Error> for WidgetError {
    fn from(e: upon::Error) -> Self {
        Self::Template(e)
    }
}

impl From<std::io::Error> for WidgetError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(Box::new(e))
    }
}

impl From<tracing_subscriber::filter::ParseError> for WidgetError {
    fn from(e: tracing_subscriber::filter::ParseError) -> Self {
        Self::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WidgetError>;
