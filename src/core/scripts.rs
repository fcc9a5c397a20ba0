//! In-page JavaScript for every render step.
//!
//! Each script is a single expression tagged with a `/* stage:<name> */`
//! prefix. Actions return a `JSON.stringify`-ed result so the value survives
//! the trip through the protocol as a primitive; readiness conditions return
//! a plain boolean. An exception thrown by a script comes back as a JSON
//! string carrying [`SCRIPT_ERROR_KEY`], see [`thrown`].

use serde_json::Value;

pub const PAGE_READY: &str = "page-ready";
pub const APPLY_THEME: &str = "apply-theme";
pub const THEME_READY: &str = "theme-ready";
pub const ICON_COLOR: &str = "icon-color";
pub const INJECT_ICON: &str = "inject-icon";
pub const ICON_READY: &str = "icon-ready";
pub const INJECT_STYLES: &str = "inject-styles";
pub const STYLES_READY: &str = "styles-ready";

/// Id of the `<style>` element holding the print overrides.
pub const STYLE_ELEMENT_ID: &str = "resume-pdf-overrides";

/// Key of the object a script returns when its body threw.
pub const SCRIPT_ERROR_KEY: &str = "__scriptError";

const STAGE_PREFIX: &str = "/* stage:";

/// Recovers the stage name from a tagged script.
pub fn stage_of(script: &str) -> Option<&str> {
    let rest = script.strip_prefix(STAGE_PREFIX)?;
    let end = rest.find(" */")?;
    Some(&rest[..end])
}

fn tagged(stage: &str, body: &str) -> String {
    format!(
        "{}{} */ (() => {{ try {{ return {}; }} catch (e) {{ return JSON.stringify({{ {}: String(e) }}); }} }})()",
        STAGE_PREFIX,
        stage,
        body.trim(),
        SCRIPT_ERROR_KEY
    )
}

/// Message of the exception a script threw, if `value` is the error marker.
pub fn thrown(value: &Value) -> Option<String> {
    let Value::String(json) = value else {
        return None;
    };
    if !json.contains(SCRIPT_ERROR_KEY) {
        return None;
    }
    match serde_json::from_str::<Value>(json).ok()? {
        Value::Object(map) => map
            .get(SCRIPT_ERROR_KEY)
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

/// JavaScript string literal for `s`.
fn js_str(s: &str) -> String {
    Value::from(s).to_string()
}

/// Lazy images outside the viewport never load in a headless window, so they
/// do not hold the page back.
pub fn page_ready() -> String {
    tagged(
        PAGE_READY,
        r#"
(() => {
  if (document.readyState !== 'complete') return false;
  if (document.fonts && document.fonts.status !== 'loaded') return false;
  return Array.from(document.images).every((img) => img.complete || img.loading === 'lazy');
})()"#,
    )
}

pub fn apply_theme(attribute: &str, theme: &str, avatar_selector: &str, avatar: &str) -> String {
    let body = format!(
        r#"
(() => {{
  document.documentElement.setAttribute({attribute}, {theme});
  const avatar = document.querySelector({selector});
  if (avatar) {{
    avatar.setAttribute('src', {avatar});
  }}
  return JSON.stringify({{ avatarFound: !!avatar }});
}})()"#,
        attribute = js_str(attribute),
        theme = js_str(theme),
        selector = js_str(avatar_selector),
        avatar = js_str(avatar),
    );
    tagged(APPLY_THEME, &body)
}

/// Holds once the theme attribute is set and the new avatar finished loading.
/// A missing avatar element counts as ready.
pub fn theme_ready(attribute: &str, theme: &str, avatar_selector: &str, avatar: &str) -> String {
    let body = format!(
        r#"
(() => {{
  if (document.documentElement.getAttribute({attribute}) !== {theme}) return false;
  const avatar = document.querySelector({selector});
  if (!avatar) return true;
  return avatar.getAttribute('src') === {avatar} && avatar.complete;
}})()"#,
        attribute = js_str(attribute),
        theme = js_str(theme),
        selector = js_str(avatar_selector),
        avatar = js_str(avatar),
    );
    tagged(THEME_READY, &body)
}

pub fn icon_color(link_selector: &str, color_attribute: &str) -> String {
    let body = format!(
        r#"
(() => {{
  const link = document.querySelector({link});
  if (!link) return JSON.stringify({{ found: false, color: null }});
  return JSON.stringify({{ found: true, color: link.getAttribute({attribute}) }});
}})()"#,
        link = js_str(link_selector),
        attribute = js_str(color_attribute),
    );
    tagged(ICON_COLOR, &body)
}

pub fn inject_icon(link_selector: &str, target_selector: &str, svg: &str) -> String {
    let body = format!(
        r#"
(() => {{
  const link = document.querySelector({link});
  const target = link ? link.querySelector({target}) : null;
  if (!target) return JSON.stringify(false);
  target.innerHTML = {svg};
  return JSON.stringify(true);
}})()"#,
        link = js_str(link_selector),
        target = js_str(target_selector),
        svg = js_str(svg),
    );
    tagged(INJECT_ICON, &body)
}

pub fn icon_ready(link_selector: &str, target_selector: &str) -> String {
    let body = format!(
        r#"
(() => {{
  const link = document.querySelector({link});
  const target = link ? link.querySelector({target}) : null;
  return !!(target && target.querySelector('svg'));
}})()"#,
        link = js_str(link_selector),
        target = js_str(target_selector),
    );
    tagged(ICON_READY, &body)
}

/// Adds the override stylesheet, or replaces its content when it already exists.
pub fn inject_styles(css: &str) -> String {
    let body = format!(
        r#"
(() => {{
  let style = document.getElementById({id});
  if (!style) {{
    style = document.createElement('style');
    style.id = {id};
    (document.head || document.documentElement).appendChild(style);
  }}
  style.textContent = {css};
  return JSON.stringify(true);
}})()"#,
        id = js_str(STYLE_ELEMENT_ID),
        css = js_str(css),
    );
    tagged(INJECT_STYLES, &body)
}

pub fn styles_ready(hidden_selectors: &[String]) -> String {
    let body = format!(
        r#"
(() => {{
  if (!document.getElementById({id})) return false;
  const selectors = {selectors};
  return selectors.every((selector) =>
    Array.from(document.querySelectorAll(selector))
      .every((el) => getComputedStyle(el).display === 'none'));
}})()"#,
        id = js_str(STYLE_ELEMENT_ID),
        selectors = Value::from(hidden_selectors.to_vec()),
    );
    tagged(STYLES_READY, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripts_carry_their_stage() {
        assert_eq!(stage_of(&page_ready()), Some(PAGE_READY));
        assert_eq!(
            stage_of(&apply_theme("data-theme", "dark", "#avatar", "itsme.png")),
            Some(APPLY_THEME)
        );
        assert_eq!(stage_of(&styles_ready(&[])), Some(STYLES_READY));
        assert_eq!(stage_of("document.title"), None);
    }

    #[test]
    fn test_page_ready_ignores_lazy_images() {
        let script = page_ready();
        assert!(script.contains("img.complete || img.loading === 'lazy'"));
        assert!(script.contains("document.readyState !== 'complete'"));
    }

    #[test]
    fn test_scripts_catch_exceptions() {
        let script = styles_ready(&["[[".to_string()]);
        assert!(script.contains("try { return (() => {"));
        assert!(script.contains("catch (e) { return JSON.stringify({ __scriptError: String(e) }); }"));
    }

    #[test]
    fn test_thrown_reads_the_error_marker() {
        let marker = Value::String(
            r#"{"__scriptError":"SyntaxError: '[[' is not a valid selector."}"#.to_string(),
        );
        assert_eq!(
            thrown(&marker).as_deref(),
            Some("SyntaxError: '[[' is not a valid selector.")
        );

        assert_eq!(thrown(&Value::Bool(false)), None);
        assert_eq!(thrown(&Value::String("true".to_string())), None);
        assert_eq!(
            thrown(&Value::String(r#"{"avatarFound":true}"#.to_string())),
            None
        );
    }

    #[test]
    fn test_apply_theme_sets_attribute_and_avatar() {
        let script = apply_theme("data-theme", "light", "#avatar", "itsme_inv.png");
        assert!(script.contains(r#"setAttribute("data-theme", "light")"#));
        assert!(script.contains(r##"document.querySelector("#avatar")"##));
        assert!(script.contains(r#"setAttribute('src', "itsme_inv.png")"#));
    }

    #[test]
    fn test_literals_are_escaped() {
        let script = icon_color(r#".link[data-social-icon="github"]"#, "data-color-dark");
        assert!(script.contains(r#"document.querySelector(".link[data-social-icon=\"github\"]")"#));

        let svg = r##"<svg fill="#181717"><path d="M0 0"/></svg>"##;
        let script = inject_icon(".link", ".social-icon", svg);
        assert!(script.contains(r##"target.innerHTML = "<svg fill=\"#181717\">"##));
    }

    #[test]
    fn test_styles_ready_lists_hidden_selectors() {
        let selectors = vec![".navbar".to_string(), ".skill-label".to_string()];
        let script = styles_ready(&selectors);
        assert!(script.contains(r#"const selectors = [".navbar",".skill-label"];"#));
        assert!(script.contains(STYLE_ELEMENT_ID));
    }

    #[test]
    fn test_inject_styles_embeds_css_as_string() {
        let script = inject_styles(".navbar {\n  display: none !important;\n}");
        assert!(script.contains(r#"style.textContent = ".navbar {\n  display: none !important;\n}";"#));
    }
}
