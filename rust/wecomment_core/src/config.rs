//! Settings and fixed constants.

use url::Url;

use crate::storage::{KeyValueStore, Scope};

pub const DEFAULT_BACKEND: &str = "https://wecomment.wumbl3.xyz";
pub const BACKEND_KEY: &str = "wecomment_backend";
pub const TOKEN_KEY: &str = "wecomment_token";

pub const HUB_FRAGMENT: &str = "#wec-hub";
pub const HUB_LIMIT: u32 = 100;
pub const POLL_INTERVAL_MS: i32 = 800;
pub const FLAG_IMAGE_BASE: &str = "https://cdnjs.cloudflare.com/ajax/libs/twemoji/14.0.2/svg/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend_base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self { backend_base_url: DEFAULT_BACKEND.to_string() }
    }
}

impl Settings {
    /// Read settings from the sync scope. Blank or unparsable values fall back
    /// to the default backend.
    pub fn load<S: KeyValueStore>(store: &S) -> Self {
        let Some(raw) = store.get(Scope::Sync, BACKEND_KEY) else { return Self::default() };
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::default();
        }
        match Url::parse(raw) {
            Ok(_) => Self { backend_base_url: raw.trim_end_matches('/').to_string() },
            Err(err) => {
                log::warn!("ignoring backend url {raw:?}: {err}");
                Self::default()
            }
        }
    }
}
