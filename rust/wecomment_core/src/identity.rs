//! Resource identity: which video the overlay is bound to.

use std::fmt;
use url::Url;

use crate::config::HUB_FRAGMENT;

/// Query parameter carrying the video id on watch pages.
pub const VIDEO_QUERY_PARAM: &str = "v";

/// Non-empty video id. Absence is modeled as `Option<ResourceIdentity>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceIdentity(String);

impl ResourceIdentity {
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() { None } else { Some(Self(trimmed.to_string())) }
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Resolve the current identity from the page URL, falling back to the
/// `video-id` attribute of the watch element. Pure and cheap.
pub fn resolve(href: &str, fallback_attr: Option<&str>) -> Option<ResourceIdentity> {
    let from_query = Url::parse(href).ok().and_then(|url| {
        url.query_pairs()
            .find(|(k, _)| k == VIDEO_QUERY_PARAM)
            .and_then(|(_, v)| ResourceIdentity::new(&v))
    });
    from_query.or_else(|| fallback_attr.and_then(ResourceIdentity::new))
}

/// True when the URL fragment selects the hub directory view.
pub fn is_hub_route(href: &str) -> bool {
    match Url::parse(href) {
        Ok(url) => url.fragment().map(|f| format!("#{f}")) == Some(HUB_FRAGMENT.to_string()),
        Err(_) => href.ends_with(HUB_FRAGMENT),
    }
}
