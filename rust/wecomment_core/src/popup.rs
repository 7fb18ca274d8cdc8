//! Login popup geometry and the one-shot cross-window auth message.

use serde_json::Value;

pub const AUTH_MESSAGE_TYPE: &str = "wecomment_auth";
pub const POPUP_NAME: &str = "wecomment_login";
pub const POPUP_WIDTH: u32 = 480;
pub const POPUP_HEIGHT: u32 = 640;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginPopup {
    pub url: String,
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
}

impl LoginPopup {
    pub fn login(backend_base_url: &str) -> Self {
        Self {
            url: format!("{}/auth/google/start", backend_base_url.trim_end_matches('/')),
            name: POPUP_NAME,
            width: POPUP_WIDTH,
            height: POPUP_HEIGHT,
        }
    }

    /// `window.open` feature string, centered within the given outer size.
    /// Unknown outer sizes place the popup at the origin.
    pub fn features(&self, outer: Option<(f64, f64)>) -> String {
        let (left, top) = match outer {
            Some((w, h)) => (
                ((w - self.width as f64) / 2.0).max(0.0),
                ((h - self.height as f64) / 2.0).max(0.0),
            ),
            None => (0.0, 0.0),
        };
        format!("width={},height={},left={},top={}", self.width, self.height, left.floor(), top.floor())
    }
}

/// Extract the token from a posted message. Anything not shaped like
/// `{ type: "wecomment_auth", token: "<non-empty>" }` is ignored.
pub fn parse_auth_message(data: &Value) -> Option<String> {
    if data.get("type").and_then(Value::as_str) != Some(AUTH_MESSAGE_TYPE) {
        return None;
    }
    data.get("token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
