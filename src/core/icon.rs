use crate::domain::ports::IconSource;
use crate::utils::error::{RenderError, Result};
use reqwest::Client;
use std::time::Duration;

const DEFAULT_VIEW_BOX: &str = "0 0 24 24";

/// The theme independent part of an icon: its coordinate space and outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconGlyph {
    pub view_box: String,
    pub path_data: String,
}

impl IconGlyph {
    /// Extracts the `viewBox` of the root `<svg>` and the `d` of its first `<path>`.
    pub fn parse_svg(svg: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(svg).map_err(|e| RenderError::IconParseError {
            message: e.to_string(),
        })?;

        let root = doc.root_element();
        if root.tag_name().name() != "svg" {
            return Err(RenderError::IconParseError {
                message: format!("Root element is <{}>, expected <svg>", root.tag_name().name()),
            });
        }

        let view_box = root
            .attribute("viewBox")
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_VIEW_BOX)
            .to_string();

        let path = root
            .descendants()
            .find(|node| node.is_element() && node.tag_name().name() == "path")
            .ok_or_else(|| RenderError::IconParseError {
                message: "SVG has no <path> element".to_string(),
            })?;

        let path_data = path
            .attribute("d")
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| RenderError::IconParseError {
                message: "<path> has no outline data".to_string(),
            })?
            .to_string();

        Ok(Self {
            view_box,
            path_data,
        })
    }

    /// Standalone inline SVG markup filled with `fill`.
    pub fn render(&self, fill: &IconFill, size: u32) -> String {
        format!(
            r#"<svg width="{size}" height="{size}" viewBox="{view_box}" fill="{fill}" xmlns="http://www.w3.org/2000/svg"><path d="{d}"/></svg>"#,
            size = size,
            view_box = html_escape::encode_double_quoted_attribute(&self.view_box),
            fill = fill.css_value(),
            d = html_escape::encode_double_quoted_attribute(&self.path_data),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconFill {
    /// Normalized hex digits, without the leading `#`.
    Hex(String),
    /// Inherit the surrounding text color.
    CurrentColor,
}

impl IconFill {
    /// Accepts 3, 4, 6 or 8 hex digits with or without `#`. Anything else,
    /// including a missing attribute, falls back to `currentColor`.
    pub fn from_attribute(value: Option<&str>) -> Self {
        let Some(raw) = value else {
            return IconFill::CurrentColor;
        };
        let digits = raw.trim().trim_start_matches('#');
        let valid = matches!(digits.len(), 3 | 4 | 6 | 8)
            && digits.chars().all(|c| c.is_ascii_hexdigit());
        if valid {
            IconFill::Hex(digits.to_ascii_lowercase())
        } else {
            tracing::warn!("Ignoring invalid icon color '{}'", raw);
            IconFill::CurrentColor
        }
    }

    pub fn css_value(&self) -> String {
        match self {
            IconFill::Hex(digits) => format!("#{}", digits),
            IconFill::CurrentColor => "currentColor".to_string(),
        }
    }
}

/// Downloads the icon from a CDN over HTTP(S).
#[derive(Debug, Clone)]
pub struct CdnIconSource {
    client: Client,
    url: String,
}

impl CdnIconSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl IconSource for CdnIconSource {
    async fn fetch_svg(&self) -> Result<String> {
        tracing::debug!("Fetching icon from: {}", self.url);
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        tracing::debug!("Icon response status: {}", status);
        if !status.is_success() {
            return Err(RenderError::IconFetchError {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const GITHUB_SVG: &str = r#"<svg role="img" viewBox="0 0 24 24" xmlns="http://www.w3.org/2000/svg"><title>GitHub</title><path d="M12 .297c-6.63 0-12 5.373-12 12"/></svg>"#;

    #[test]
    fn test_parse_svg_extracts_view_box_and_path() {
        let glyph = IconGlyph::parse_svg(GITHUB_SVG).unwrap();
        assert_eq!(glyph.view_box, "0 0 24 24");
        assert_eq!(glyph.path_data, "M12 .297c-6.63 0-12 5.373-12 12");
    }

    #[test]
    fn test_parse_svg_defaults_view_box() {
        let glyph = IconGlyph::parse_svg(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><g><path d="M0 0h1"/></g><path d="M9 9"/></svg>"#,
        )
        .unwrap();
        assert_eq!(glyph.view_box, "0 0 24 24");
        assert_eq!(glyph.path_data, "M0 0h1");
    }

    #[test]
    fn test_parse_svg_rejects_bad_documents() {
        assert!(IconGlyph::parse_svg("not xml at all").is_err());
        assert!(IconGlyph::parse_svg("<html><path d=\"M0 0\"/></html>").is_err());
        assert!(IconGlyph::parse_svg(r#"<svg viewBox="0 0 1 1"><circle r="1"/></svg>"#).is_err());
    }

    #[test]
    fn test_render_recolors_and_escapes() {
        let glyph = IconGlyph {
            view_box: "0 0 24 24".to_string(),
            path_data: r#"M0 0"/><script/>"#.to_string(),
        };
        let svg = glyph.render(&IconFill::from_attribute(Some("FFFFFF")), 20);
        assert!(svg.starts_with(r##"<svg width="20" height="20" viewBox="0 0 24 24" fill="#ffffff""##));
        assert!(svg.contains("&quot;"));
        assert_eq!(svg.matches("<path").count(), 1);
        assert!(svg.ends_with("/></svg>"));
    }

    #[test]
    fn test_icon_fill_from_attribute() {
        assert_eq!(
            IconFill::from_attribute(Some("#181717")),
            IconFill::Hex("181717".to_string())
        );
        assert_eq!(IconFill::from_attribute(Some("fff")).css_value(), "#fff");
        assert_eq!(IconFill::from_attribute(None), IconFill::CurrentColor);
        assert_eq!(
            IconFill::from_attribute(Some("red")).css_value(),
            "currentColor"
        );
    }

    #[tokio::test]
    async fn test_fetch_svg_success() {
        let server = MockServer::start();
        let icon_mock = server.mock(|when, then| {
            when.method(GET).path("/icons/github.svg");
            then.status(200)
                .header("Content-Type", "image/svg+xml")
                .body(GITHUB_SVG);
        });

        let source =
            CdnIconSource::new(server.url("/icons/github.svg"), Duration::from_secs(5)).unwrap();
        let svg = source.fetch_svg().await.unwrap();

        icon_mock.assert();
        assert_eq!(svg, GITHUB_SVG);
    }

    #[tokio::test]
    async fn test_fetch_svg_reports_status() {
        let server = MockServer::start();
        let icon_mock = server.mock(|when, then| {
            when.method(GET).path("/icons/github.svg");
            then.status(404);
        });

        let source =
            CdnIconSource::new(server.url("/icons/github.svg"), Duration::from_secs(5)).unwrap();
        let err = source.fetch_svg().await.unwrap_err();

        icon_mock.assert();
        assert!(matches!(err, RenderError::IconFetchError { status: 404, .. }));
    }
}
