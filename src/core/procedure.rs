use crate::core::icon::{IconFill, IconGlyph};
use crate::core::readiness::wait_until;
use crate::core::scripts;
use crate::domain::model::{IconOutcome, RenderJob, RenderSettings};
use crate::domain::ports::PageSession;
use crate::utils::error::{RenderError, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeApplied {
    avatar_found: bool,
}

#[derive(Debug, Deserialize)]
struct IconColor {
    found: bool,
    color: Option<String>,
}

/// The PDF bytes of one job plus what happened to the icon.
#[derive(Debug)]
pub struct RenderedPage {
    pub pdf: Vec<u8>,
    pub icon: IconOutcome,
}

/// Runs an action script and decodes its `JSON.stringify`-ed result.
async fn evaluate_json<P, T>(session: &mut P, stage: &str, script: &str) -> Result<T>
where
    P: PageSession + ?Sized,
    T: DeserializeOwned,
{
    match session.evaluate(script).await? {
        serde_json::Value::String(json) => Ok(serde_json::from_str(&json)?),
        other => Err(RenderError::ScriptError {
            stage: stage.to_string(),
            message: format!("expected a JSON string result, got {}", other),
        }),
    }
}

/// Drives an already launched page through every step of one render job:
/// load, theme, icon, print overrides and PDF capture.
///
/// `glyph` is `None` when the icon step is disabled or its download failed;
/// the page then keeps its default icon.
pub async fn generate_pdf<P>(
    session: &mut P,
    settings: &RenderSettings,
    source_url: &Url,
    job: &RenderJob,
    glyph: Option<&IconGlyph>,
) -> Result<RenderedPage>
where
    P: PageSession + ?Sized,
{
    let page = &settings.page;
    let readiness = &settings.readiness;
    let assets = page.assets(job.theme);
    let theme = job.theme.as_str();

    tracing::debug!("Navigating to {}", source_url);
    session.navigate(source_url, page.navigation_timeout).await?;
    wait_until(session, scripts::PAGE_READY, &scripts::page_ready(), readiness).await?;

    let applied: ThemeApplied = evaluate_json(
        session,
        scripts::APPLY_THEME,
        &scripts::apply_theme(&page.theme_attribute, theme, &page.avatar_selector, &assets.avatar),
    )
    .await?;
    if applied.avatar_found {
        tracing::debug!("Avatar switched to {}", assets.avatar);
    } else {
        tracing::warn!("No avatar element matches '{}'", page.avatar_selector);
    }
    wait_until(
        session,
        scripts::THEME_READY,
        &scripts::theme_ready(&page.theme_attribute, theme, &page.avatar_selector, &assets.avatar),
        readiness,
    )
    .await?;

    let icon = match glyph {
        Some(glyph) if settings.icon.enabled => {
            recolor_icon(session, settings, &assets.icon_color_attribute, glyph).await?
        }
        _ if !settings.icon.enabled => IconOutcome::Disabled,
        _ => IconOutcome::Skipped("icon could not be downloaded".to_string()),
    };

    let style = &settings.style;
    let injected: bool = evaluate_json(
        session,
        scripts::INJECT_STYLES,
        &scripts::inject_styles(&style.css),
    )
    .await?;
    if !injected {
        return Err(RenderError::ScriptError {
            stage: scripts::INJECT_STYLES.to_string(),
            message: "style element was not added".to_string(),
        });
    }
    wait_until(
        session,
        scripts::STYLES_READY,
        &scripts::styles_ready(&style.hidden_selectors),
        readiness,
    )
    .await?;

    let pdf = session.print_pdf(&settings.pdf).await?;
    check_pdf(&pdf)?;
    tracing::debug!("Captured {} bytes of PDF for theme {}", pdf.len(), theme);

    Ok(RenderedPage { pdf, icon })
}

/// Replaces the icon with `glyph` filled in the theme's color. Missing
/// elements skip the step; only a failing script is an error.
async fn recolor_icon<P>(
    session: &mut P,
    settings: &RenderSettings,
    color_attribute: &str,
    glyph: &IconGlyph,
) -> Result<IconOutcome>
where
    P: PageSession + ?Sized,
{
    let icon = &settings.icon;

    let color: IconColor = evaluate_json(
        session,
        scripts::ICON_COLOR,
        &scripts::icon_color(&icon.link_selector, color_attribute),
    )
    .await?;
    if !color.found {
        tracing::warn!("No icon link matches '{}', keeping page icon", icon.link_selector);
        return Ok(IconOutcome::Skipped(format!(
            "no element matches {}",
            icon.link_selector
        )));
    }

    let fill = IconFill::from_attribute(color.color.as_deref());
    let svg = glyph.render(&fill, icon.size);

    let injected: bool = evaluate_json(
        session,
        scripts::INJECT_ICON,
        &scripts::inject_icon(&icon.link_selector, &icon.target_selector, &svg),
    )
    .await?;
    if !injected {
        tracing::warn!(
            "Icon link has no '{}' child, keeping page icon",
            icon.target_selector
        );
        return Ok(IconOutcome::Skipped(format!(
            "no element matches {}",
            icon.target_selector
        )));
    }

    wait_until(
        session,
        scripts::ICON_READY,
        &scripts::icon_ready(&icon.link_selector, &icon.target_selector),
        &settings.readiness,
    )
    .await?;
    tracing::debug!("Icon recolored with {}", fill.css_value());

    Ok(IconOutcome::Injected)
}

fn check_pdf(pdf: &[u8]) -> Result<()> {
    if pdf.is_empty() {
        return Err(RenderError::InvalidPdf {
            reason: "browser returned an empty buffer".to_string(),
        });
    }
    if !pdf.starts_with(b"%PDF-") {
        return Err(RenderError::InvalidPdf {
            reason: "missing %PDF- header".to_string(),
        });
    }
    Ok(())
}
