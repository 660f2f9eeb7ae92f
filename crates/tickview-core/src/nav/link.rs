//! Which clicks become in-place navigations, and where their JSON lives.

use url::Url;

/// Split `url` at its first `#`.
#[must_use]
pub fn strip_fragment(url: &str) -> (&str, Option<&str>) {
    match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    }
}

/// The JSON variant of a page URL: fragment dropped, `format=json` appended
/// to any existing query.
#[must_use]
pub fn json_url(url: &str) -> String {
    let (base, _) = strip_fragment(url);
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}format=json")
}

/// A click on an anchor, as reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkClick {
    pub href: String,
    /// The anchor opts out of interception (`no-ajaxy`).
    pub bypass: bool,
    pub middle_button: bool,
    pub meta_key: bool,
}

impl LinkClick {
    #[must_use]
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            ..Self::default()
        }
    }
}

/// Whether `href`, resolved against `root`, has `root`'s scheme, host and
/// port. An unparsable `root` matches nothing.
#[must_use]
pub fn is_same_origin(href: &str, root: &str) -> bool {
    let Ok(root) = Url::parse(root) else {
        return false;
    };
    root.join(href)
        .is_ok_and(|target| target.origin() == root.origin())
}

/// Whether `click` should be handled in place rather than by the browser.
///
/// `href` and `page_url` are compared with fragments removed, so a link to
/// another anchor on the current page is left alone.
#[must_use]
pub fn should_intercept(click: &LinkClick, root: &str, page_url: &str) -> bool {
    if click.bypass || click.href.is_empty() || !is_same_origin(&click.href, root) {
        return false;
    }
    if click.middle_button || click.meta_key {
        return false;
    }
    strip_fragment(&click.href).0 != strip_fragment(page_url).0
}
