//! Display-image and screen-density checks used by the overlay host.

#[cfg(test)]
#[path = "display_test.rs"]
mod display_test;

/// Whether an `<img>` whose `currentSrc` is `current_src` is showing
/// `display_url`.
///
/// `currentSrc` is always absolute, while the session may store a relative
/// URL; `resolved` is `display_url` resolved against the page, when that
/// succeeded.
#[must_use]
pub fn shows_current_image(current_src: &str, display_url: &str, resolved: Option<&str>) -> bool {
    let display_url = display_url.trim();
    if current_src.is_empty() || display_url.is_empty() {
        return false;
    }
    current_src == display_url || resolved.is_some_and(|url| url == current_src)
}

/// Media query that stops matching once the device pixel ratio leaves `dpr`
/// (browser zoom, or the window moving to another monitor).
#[must_use]
pub fn pixel_ratio_query(dpr: f64) -> String {
    let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
    format!("(resolution: {dpr}dppx)")
}
