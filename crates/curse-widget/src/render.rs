//! HTML rendering for widgets and the status page

use crate::error::{Result, WidgetError};
use crate::theme::ThemeColors;
use crate::types::ProjectData;
use serde::Serialize;
use std::fmt::Write;
use upon::{fmt as upon_fmt, Engine, Value};

const TEMPLATES: [(&str, &str); 5] = [
    ("horizontal", include_str!("../templates/horizontal.html")),
    ("vertical", include_str!("../templates/vertical.html")),
    ("compact", include_str!("../templates/compact.html")),
    ("counter", include_str!("../templates/counter.html")),
    ("status", include_str!("../templates/status.html")),
];

/// Widget layout selected by the `widgetTemplate` query parameter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WidgetTemplate {
    #[default]
    Horizontal,
    Vertical,
    Compact,
}

impl WidgetTemplate {
    /// Unknown or absent values select the horizontal layout
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("vertical") => Self::Vertical,
            Some("compact") => Self::Compact,
            _ => Self::Horizontal,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
            Self::Compact => "compact",
        }
    }
}

/// Per-request rendering input
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetView<'a> {
    pub project: &'a ProjectData,
    pub theme: ThemeColors,
    pub download_url: Option<String>,
    pub download_version: Option<&'a str>,
    pub file_type: Option<&'static str>,
}

impl<'a> WidgetView<'a> {
    pub fn new(project: &'a ProjectData, theme: ThemeColors, direct_download: bool) -> Self {
        let release = project.release.as_ref();
        Self {
            download_url: release.map(|r| r.download_url(&project.project_url, direct_download)),
            download_version: release.map(|r| r.game_version.as_str()),
            file_type: release.map(|r| r.file_type.as_str()),
            project,
            theme,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub requests_per_hour: u64,
    /// Formatted duration of the most recent widget response
    pub last_response: String,
    pub uptime: String,
}

/// Compiled templates, built once at startup
pub struct Renderer {
    engine: Engine<'static>,
}

impl Renderer {
    pub fn new() -> Result<Self> {
        let mut engine = Engine::new();
        engine.set_default_formatter(&escape_html);
        for (name, source) in TEMPLATES {
            engine.add_template(name, source)?;
        }
        Ok(Self { engine })
    }

    pub fn widget(&self, template: WidgetTemplate, view: &WidgetView<'_>) -> Result<String> {
        self.render(template.name(), view)
    }

    pub fn status(&self, view: &StatusView) -> Result<String> {
        self.render("status", view)
    }

    fn render(&self, name: &str, ctx: impl Serialize) -> Result<String> {
        let template = self
            .engine
            .get_template(name)
            .ok_or_else(|| WidgetError::Config(format!("Template {} is not registered", name)))?;
        Ok(template.render(ctx).to_string()?)
    }
}

/// Default formatter: strings are HTML-escaped, everything else as upon prints it
fn escape_html(f: &mut upon_fmt::Formatter<'_>, value: &Value) -> upon_fmt::Result {
    match value {
        Value::String(s) => {
            for ch in s.chars() {
                match ch {
                    '&' => f.write_str("&amp;")?,
                    '<' => f.write_str("&lt;")?,
                    '>' => f.write_str("&gt;")?,
                    '"' => f.write_str("&quot;")?,
                    '\'' => f.write_str("&#x27;")?,
                    c => f.write_char(c)?,
                }
            }
        }
        v => upon_fmt::default(f, v)?,
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::ResolvedRelease;
    use crate::theme::ColorOverrides;
    use curseforge_api::{Addon, FileType};

    fn project(release: Option<ResolvedRelease>, downloads_per_second: f64) -> ProjectData {
        ProjectData {
            addon: Addon {
                id: 238222,
                name: "Just <Enough> Items".to_string(),
                summary: Some("View Items & Recipes".to_string()),
                game_id: 432,
                download_count: 1000.0,
                website_url: None,
                authors: vec![],
                attachments: vec![],
                game_version_latest_files: vec![],
            },
            project_id: 238222,
            project_url: "https://minecraft.curseforge.com/projects/238222".to_string(),
            thumbnail: Some("https://media.example/jei.png".to_string()),
            download_count_pretty: "1,000".to_string(),
            downloads_per_second,
            release,
            image_accent: None,
        }
    }

    fn release() -> ResolvedRelease {
        ResolvedRelease {
            game_version: "1.16.5".to_string(),
            file_type: FileType::Beta,
            file_id: 3043174,
        }
    }

    fn theme(dark: bool) -> ThemeColors {
        ColorOverrides::default().resolve(None, dark)
    }

    #[test]
    fn test_from_param() {
        assert_eq!(WidgetTemplate::from_param(None), WidgetTemplate::Horizontal);
        assert_eq!(WidgetTemplate::from_param(Some("vertical")), WidgetTemplate::Vertical);
        assert_eq!(WidgetTemplate::from_param(Some("compact")), WidgetTemplate::Compact);
        assert_eq!(WidgetTemplate::from_param(Some("Compact")), WidgetTemplate::Horizontal);
        assert_eq!(WidgetTemplate::from_param(Some("../index")), WidgetTemplate::Horizontal);
    }

    #[test]
    fn test_view_download_link() {
        let data = project(Some(release()), 0.0);
        let view = WidgetView::new(&data, theme(false), true);
        assert_eq!(
            view.download_url.as_deref(),
            Some("https://minecraft.curseforge.com/projects/238222/files/3043174")
        );
        assert_eq!(view.download_version, Some("1.16.5"));
        assert_eq!(view.file_type, Some("beta"));

        let view = WidgetView::new(&data, theme(false), false);
        assert_eq!(
            view.download_url.as_deref(),
            Some("https://minecraft.curseforge.com/projects/238222/files/3043174/download")
        );
    }

    #[test]
    fn test_every_layout_renders() {
        let renderer = Renderer::new().unwrap();
        let data = project(Some(release()), 0.0);
        let view = WidgetView::new(&data, theme(false), false);

        for template in [
            WidgetTemplate::Horizontal,
            WidgetTemplate::Vertical,
            WidgetTemplate::Compact,
        ] {
            let html = renderer.widget(template, &view).unwrap();
            assert!(html.contains("#2c3e50"), "{} missing accent", template.name());
            assert!(html.contains("/files/3043174"));
            assert!(html.contains("1.16.5"));
        }
    }

    #[test]
    fn test_text_is_escaped() {
        let renderer = Renderer::new().unwrap();
        let data = project(None, 0.0);
        let html = renderer
            .widget(WidgetTemplate::Vertical, &WidgetView::new(&data, theme(false), false))
            .unwrap();

        assert!(html.contains("Just &lt;Enough&gt; Items"));
        assert!(!html.contains("Just <Enough> Items"));
        assert!(html.contains("View Items &amp; Recipes"));
    }

    #[test]
    fn test_upstream_markup_cannot_break_out() {
        let renderer = Renderer::new().unwrap();
        let mut data = project(None, 0.0);
        data.addon.name = "<script>alert('x')</script>".to_string();
        data.thumbnail = Some("https://media.example/a.png\" onerror=\"alert(1)".to_string());
        let html = renderer
            .widget(WidgetTemplate::Horizontal, &WidgetView::new(&data, theme(false), false))
            .unwrap();

        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt;"));
        assert!(html.contains("a.png&quot; onerror=&quot;alert(1)"));
    }

    #[test]
    fn test_missing_release_still_renders() {
        let renderer = Renderer::new().unwrap();
        let data = project(None, 0.0);
        let html = renderer
            .widget(WidgetTemplate::Horizontal, &WidgetView::new(&data, theme(true), false))
            .unwrap();

        assert!(html.contains("no release found"));
        assert!(!html.contains("/files/"));
        assert!(html.contains("#1B1B1B"));
    }

    #[test]
    fn test_live_counter_only_with_rate() {
        let renderer = Renderer::new().unwrap();

        let idle = project(None, 0.0);
        let html = renderer
            .widget(WidgetTemplate::Compact, &WidgetView::new(&idle, theme(false), false))
            .unwrap();
        assert!(!html.contains("<script>"));

        let busy = project(None, 2.5);
        let html = renderer
            .widget(WidgetTemplate::Compact, &WidgetView::new(&busy, theme(false), false))
            .unwrap();
        assert!(html.contains("<script>"));
    }

    #[test]
    fn test_status_page() {
        let renderer = Renderer::new().unwrap();
        let html = renderer
            .status(&StatusView {
                requests_per_hour: 17,
                last_response: "1.250ms".to_string(),
                uptime: "2h 3m".to_string(),
            })
            .unwrap();

        assert!(html.contains("17"));
        assert!(html.contains("1.250ms"));
    }
}
