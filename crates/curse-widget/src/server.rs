//! HTTP server for widget, status and health endpoints

use crate::rate::RateCounter;
use crate::render::{Renderer, StatusView, WidgetTemplate, WidgetView};
use crate::service::WidgetService;
use crate::theme::{resolve_theme, ColorOverrides};
use crate::types::HealthResponse;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

const INVALID_PROJECT_ID: &str = "No or invalid project id provided";
const UPSTREAM_FAILED: &str = "An error occurred when loading curse data";
const TEMPLATE_FAILED: &str = "An error occurred when reading template";

/// Shared state for the HTTP server
pub struct ServerState {
    pub service: WidgetService,
    pub renderer: Renderer,
    /// Widget requests over the last hour
    pub requests: RateCounter,
    /// Duration of the most recent successful widget response, 0 before the first
    last_response_nanos: AtomicU64,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(service: WidgetService, renderer: Renderer) -> Self {
        Self {
            service,
            renderer,
            requests: RateCounter::per_hour(),
            last_response_nanos: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    fn record_response(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.last_response_nanos.store(nanos, Ordering::Relaxed);
    }

    pub fn last_response(&self) -> Option<Duration> {
        match self.last_response_nanos.load(Ordering::Relaxed) {
            0 => None,
            nanos => Some(Duration::from_nanos(nanos)),
        }
    }

    fn uptime_secs(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }
}

pub type SharedState = Arc<ServerState>;

/// Widget query parameters
#[derive(Debug, Default)]
pub struct WidgetQuery {
    widget_template: Option<String>,
    direct_download: Option<String>,
    dark_theme: Option<String>,
    colors: ColorOverrides,
}

impl WidgetQuery {
    /// Build from raw query pairs; the first occurrence of a key wins and
    /// unknown keys are ignored
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "widgetTemplate" => &mut query.widget_template,
                "directDownload" => &mut query.direct_download,
                "darkTheme" => &mut query.dark_theme,
                "accentColor" => &mut query.colors.accent_color,
                "overrideButtonTextColor" => &mut query.colors.override_button_text_color,
                "normalTextColor" => &mut query.colors.normal_text_color,
                "buttonShadowColor" => &mut query.colors.button_shadow_color,
                "backgroundColor" => &mut query.colors.background_color,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

/// Boolean query flag; anything unrecognised is false
fn parse_flag(value: Option<&str>) -> bool {
    matches!(value, Some("1" | "t" | "T" | "TRUE" | "true" | "True"))
}

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(status_page))
        .route("/health", get(health))
        .route("/widget", get(missing_project_id))
        .route("/widget/", get(missing_project_id))
        .route("/widget/{project_id}", get(widget))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: SharedState, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.uptime_secs(),
        requests_per_hour: state.requests.rate(),
        project_cache: state.service.project_cache_stats(),
        history_cache: state.service.history_cache_stats(),
    })
}

/// Request rate and latest response time
async fn status_page(State(state): State<SharedState>) -> Response {
    let view = StatusView {
        requests_per_hour: state.requests.rate(),
        last_response: state
            .last_response()
            .map(|d| format!("{:?}", d))
            .unwrap_or_else(|| "0".to_string()),
        uptime: format_uptime(state.uptime_secs()),
    };

    match state.renderer.status(&view) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %e, "Status page render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, TEMPLATE_FAILED).into_response()
        }
    }
}

async fn missing_project_id(State(state): State<SharedState>) -> Response {
    state.requests.incr();
    (StatusCode::BAD_REQUEST, INVALID_PROJECT_ID).into_response()
}

/// Render a project widget
async fn widget(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let started = Instant::now();
    state.requests.incr();
    let params = WidgetQuery::from_pairs(pairs);

    let Ok(project_id) = project_id.parse::<u64>() else {
        return (StatusCode::BAD_REQUEST, INVALID_PROJECT_ID).into_response();
    };

    let project = match state.service.project(project_id).await {
        Ok(project) => project,
        Err(e) => {
            error!(project_id, error = %e, "Failed to load project");
            return (StatusCode::BAD_GATEWAY, UPSTREAM_FAILED).into_response();
        }
    };

    let template = WidgetTemplate::from_param(params.widget_template.as_deref());
    let theme = resolve_theme(
        &project,
        &params.colors,
        parse_flag(params.dark_theme.as_deref()),
    );
    let view = WidgetView::new(
        &project,
        theme,
        parse_flag(params.direct_download.as_deref()),
    );

    match state.renderer.widget(template, &view) {
        Ok(html) => {
            let elapsed = started.elapsed();
            state.record_response(elapsed);
            info!(
                project_id,
                template = template.name(),
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                "Rendered widget"
            );
            Html(html).into_response()
        }
        Err(e) => {
            error!(project_id, error = %e, "Widget render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, TEMPLATE_FAILED).into_response()
        }
    }
}

fn format_uptime(secs: u64) -> String {
    let (hours, rest) = (secs / 3600, secs % 3600);
    format!("{}h {}m {}s", hours, rest / 60, rest % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::service::tests::{fake_with_project, FakeUpstream};
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    fn create_test_state(fake: FakeUpstream) -> (SharedState, Arc<FakeUpstream>) {
        let fake = Arc::new(fake);
        let service = WidgetService::new(fake.clone(), &Config::default());
        let renderer = Renderer::new().unwrap();
        (Arc::new(ServerState::new(service, renderer)), fake)
    }

    async fn get(state: &SharedState, uri: &str) -> (StatusCode, String) {
        let response = create_router(state.clone())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn test_parse_flag() {
        for truthy in ["1", "t", "T", "TRUE", "true", "True"] {
            assert!(parse_flag(Some(truthy)), "{}", truthy);
        }
        for falsy in ["0", "f", "false", "yes", "on", "tRuE", ""] {
            assert!(!parse_flag(Some(falsy)), "{}", falsy);
        }
        assert!(!parse_flag(None));
    }

    #[test]
    fn test_query_first_value_wins() {
        let pairs = [
            ("accentColor", "FF0000"),
            ("darkTheme", "true"),
            ("accentColor", "00FF00"),
            ("darkTheme", "false"),
            ("unrelated", "x"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let query = WidgetQuery::from_pairs(pairs);

        assert_eq!(query.colors.accent_color.as_deref(), Some("FF0000"));
        assert_eq!(query.dark_theme.as_deref(), Some("true"));
        assert_eq!(query.widget_template, None);
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(0), "0h 0m 0s");
        assert_eq!(format_uptime(3725), "1h 2m 5s");
    }

    #[tokio::test]
    async fn test_widget_renders_html() {
        let (state, _) = create_test_state(fake_with_project(7));

        let response = create_router(state.clone())
            .oneshot(
                Request::builder()
                    .uri("/widget/7")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/html"));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("Example Mod"));
        assert!(html.contains("/projects/7/files/200/download"));
        // Accent from the thumbnail
        assert!(html.contains("#185ae7"));
        assert!(state.last_response().is_some());
    }

    #[tokio::test]
    async fn test_widget_query_parameters() {
        let (state, _) = create_test_state(fake_with_project(7));

        let (status, html) = get(
            &state,
            "/widget/7?widgetTemplate=compact&directDownload=true&darkTheme=1&accentColor=FF0000&backgroundColor=transparent",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("#ff0000"));
        assert!(html.contains("/projects/7/files/200\""));
        assert!(html.contains("background: transparent"));
        // Dark theme text color
        assert!(html.contains("color: white"));
    }

    #[tokio::test]
    async fn test_repeated_parameters_use_first_value() {
        let (state, _) = create_test_state(fake_with_project(7));

        let (status, html) = get(
            &state,
            "/widget/7?accentColor=FF0000&accentColor=00FF00&darkTheme=true&darkTheme=false",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("#ff0000"));
        assert!(!html.contains("#00ff00"));
        assert!(html.contains("#1B1B1B"));
    }

    #[tokio::test]
    async fn test_unparseable_flags_are_false() {
        let (state, _) = create_test_state(fake_with_project(7));

        let (status, html) = get(&state, "/widget/7?directDownload=yes&darkTheme=on").await;

        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("/files/200/download"));
        assert!(html.contains("color: black"));
    }

    #[tokio::test]
    async fn test_second_request_is_served_from_cache() {
        let (state, fake) = create_test_state(fake_with_project(7));

        let (_, first) = get(&state, "/widget/7").await;
        let (_, second) = get(&state, "/widget/7?darkTheme=true").await;

        assert_ne!(first, second);
        assert_eq!(fake.addon_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fake.image_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_or_invalid_project_id() {
        let (state, fake) = create_test_state(FakeUpstream::default());

        for uri in ["/widget/", "/widget", "/widget/abc", "/widget/-5"] {
            let (status, body) = get(&state, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body, INVALID_PROJECT_ID);
        }
        assert_eq!(fake.addon_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_bad_gateway() {
        let (state, _) = create_test_state(FakeUpstream::default());

        let (status, body) = get(&state, "/widget/404").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, UPSTREAM_FAILED);
        assert!(state.last_response().is_none());
    }

    #[tokio::test]
    async fn test_status_page_counts_requests() {
        let (state, _) = create_test_state(fake_with_project(7));

        get(&state, "/widget/7").await;
        get(&state, "/widget/").await;
        let (status, html) = get(&state, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("<td>2</td>"));
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (state, _) = create_test_state(fake_with_project(7));
        get(&state, "/widget/7").await;
        get(&state, "/widget/7").await;

        let (status, body) = get(&state, "/health").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert!(json["uptime_secs"].as_u64().is_some());
        assert_eq!(json["requests_per_hour"], 2);
        assert_eq!(json["project_cache"]["hits"], 1);
        assert_eq!(json["project_cache"]["misses"], 1);
        assert_eq!(json["history_cache"]["misses"], 1);
    }
}
