//! The host page as seen by the engine. Every query may come back empty
//! while the page is still rendering; callers treat that as "not ready yet".

use crate::comments::CommentId;
use crate::popup::LoginPopup;
use crate::text;

/// Overlay sub-areas whose content is replaced wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    AuthArea,
    Composer,
    CommentList,
    HubList,
}

impl Region {
    pub fn element_id(self) -> &'static str {
        match self {
            Region::AuthArea => "wecomment-auth-area",
            Region::Composer => "wecomment-compose",
            Region::CommentList => "wecomment-list",
            Region::HubList => "wec-hub-list",
        }
    }
}

/// Form controls read at action time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ComposerText,
    SortSelect,
}

impl Field {
    pub fn element_id(self) -> &'static str {
        match self {
            Field::ComposerText => "wecomment-input",
            Field::SortSelect => "wecomment-sort",
        }
    }
}

pub trait HostPage {
    fn location_href(&self) -> String;
    /// `video-id` attribute of the watch element, when present.
    fn watch_video_attribute(&self) -> Option<String>;
    fn page_title(&self) -> Option<String>;

    fn has_disabled_notice(&self) -> bool;
    fn overlay_present(&self) -> bool;
    /// Insert the overlay right after the disabled notice. False when the
    /// notice or its parent is missing.
    fn insert_overlay(&mut self, html: &str) -> bool;
    fn remove_overlay(&mut self);
    /// Rewrite every not-yet-marked notice and mark it. Returns how many
    /// notices were rewritten.
    fn replace_notice_text(&mut self, html: &str) -> usize;

    fn hub_present(&self) -> bool;
    /// Replace the page-manager content with the hub. False when the host
    /// containers are missing.
    fn mount_hub(&mut self, html: &str) -> bool;
    fn remove_hub(&mut self);

    fn set_region(&mut self, region: Region, html: &str) -> bool;
    fn field_value(&self, field: Field) -> Option<String>;
    fn clear_field(&mut self, field: Field);

    fn reply_open(&self, id: CommentId) -> bool;
    fn set_reply_open(&mut self, id: CommentId, open: bool);
    fn reply_text(&self, id: CommentId) -> Option<String>;
    fn clear_reply_text(&mut self, id: CommentId);
    /// Patch one comment's score label and vote state in place.
    fn patch_vote(&mut self, id: CommentId, score_label: &str, active: bool);

    fn notify(&mut self, message: &str);
    fn open_popup(&mut self, popup: &LoginPopup);

    fn format_timestamp(&self, raw: &str) -> String {
        text::format_timestamp(raw)
    }
}
