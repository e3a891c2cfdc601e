//! Curse Widget Library
//!
//! Embeddable release/download widgets for CurseForge projects. Project data
//! is fetched through [`upstream::ProjectUpstream`], enriched with the latest
//! release and a thumbnail accent color, cached for a fixed time and rendered
//! per request with query-selected layout and colors.

pub mod cache;
pub mod color;
pub mod config;
pub mod error;
pub mod palette;
pub mod rate;
pub mod release;
pub mod render;
pub mod server;
pub mod service;
pub mod theme;
pub mod types;
pub mod upstream;

pub use config::Config;
pub use error::{Result, WidgetError};
pub use server::{create_router, start_server, ServerState, SharedState};
pub use service::WidgetService;
pub use types::*;
