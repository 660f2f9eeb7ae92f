use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::render::Region;

static TICKET_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a\b[^>]*?\bhref\s*=\s*["'](/ticket/[^"']*)["']"#).expect("ticket href pattern")
});

/// The page the controller draws on.
pub trait Surface {
    fn set_region(&mut self, region: Region, html: &str);

    fn clear_region(&mut self, region: Region) {
        self.set_region(region, "");
    }

    fn set_username(&mut self, name: &str);

    fn set_title(&mut self, title: &str);

    /// Route clicks on links inside `region` back to the controller.
    fn intercept_links(&mut self, region: Region);

    fn scroll_to(&mut self, fragment: &str);

    /// `href` of every link on the page that starts with `/ticket/`.
    fn ticket_links(&self) -> Vec<String>;

    /// Tag a ticket link as a ticket, and as closed when `closed` is set.
    fn decorate_ticket_link(&mut self, href: &str, closed: bool);
}

/// A [`Surface`] that records what was drawn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemorySurface {
    regions: BTreeMap<Region, String>,
    username: Option<String>,
    title: String,
    intercepted: Vec<Region>,
    scrolled_to: Option<String>,
    link_classes: BTreeMap<String, &'static str>,
}

impl MemorySurface {
    #[must_use]
    pub fn region(&self, region: Region) -> &str {
        self.regions.get(&region).map_or("", String::as_str)
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Regions whose links are currently hooked.
    #[must_use]
    pub fn intercepted(&self) -> &[Region] {
        &self.intercepted
    }

    #[must_use]
    pub fn scrolled_to(&self) -> Option<&str> {
        self.scrolled_to.as_deref()
    }

    /// Class list given to a ticket link: `ticket` or `ticket closed`.
    #[must_use]
    pub fn link_class(&self, href: &str) -> Option<&'static str> {
        self.link_classes.get(href).copied()
    }

    pub fn closed_links(&self) -> impl Iterator<Item = &str> {
        self.link_classes
            .iter()
            .filter(|(_, class)| class.ends_with("closed"))
            .map(|(href, _)| href.as_str())
    }
}

impl Surface for MemorySurface {
    fn set_region(&mut self, region: Region, html: &str) {
        self.regions.insert(region, html.to_string());
        self.intercepted.retain(|r| *r != region);
        self.link_classes.clear();
        self.scrolled_to = None;
    }

    fn set_username(&mut self, name: &str) {
        self.username = Some(name.to_string());
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn intercept_links(&mut self, region: Region) {
        if !self.intercepted.contains(&region) {
            self.intercepted.push(region);
        }
    }

    fn scroll_to(&mut self, fragment: &str) {
        self.scrolled_to = Some(fragment.to_string());
    }

    fn ticket_links(&self) -> Vec<String> {
        self.regions
            .values()
            .flat_map(|html| TICKET_HREF.captures_iter(html))
            .map(|caps| caps[1].to_string())
            .collect()
    }

    fn decorate_ticket_link(&mut self, href: &str, closed: bool) {
        let class = if closed { "ticket closed" } else { "ticket" };
        self.link_classes.insert(href.to_string(), class);
    }
}
