//! In-memory host page used by unit tests.

use std::collections::{HashMap, HashSet};

use crate::comments::CommentId;
use crate::host::{Field, HostPage, Region};
use crate::popup::LoginPopup;

#[derive(Debug, Default)]
pub struct FakePage {
    pub href: String,
    pub video_attr: Option<String>,
    pub title: Option<String>,
    pub notice: bool,
    pub notice_marked: bool,
    pub overlay: Option<String>,
    pub overlay_inserts: usize,
    pub hub: bool,
    pub hub_mounts: usize,
    pub hub_host_ready: bool,
    pub regions: HashMap<Region, String>,
    pub fields: HashMap<Field, String>,
    pub open_replies: HashSet<CommentId>,
    pub reply_texts: HashMap<CommentId, String>,
    pub vote_patches: Vec<(CommentId, String, bool)>,
    pub notices: Vec<String>,
    pub popups: Vec<LoginPopup>,
}

impl FakePage {
    pub fn at(href: &str) -> Self {
        Self { href: href.to_string(), hub_host_ready: true, ..Self::default() }
    }

    pub fn region(&self, region: Region) -> &str {
        self.regions.get(&region).map(String::as_str).unwrap_or("")
    }
}

impl HostPage for FakePage {
    fn location_href(&self) -> String { self.href.clone() }
    fn watch_video_attribute(&self) -> Option<String> { self.video_attr.clone() }
    fn page_title(&self) -> Option<String> { self.title.clone() }

    fn has_disabled_notice(&self) -> bool { self.notice }
    fn overlay_present(&self) -> bool { self.overlay.is_some() }

    fn insert_overlay(&mut self, html: &str) -> bool {
        if !self.notice {
            return false;
        }
        self.overlay = Some(html.to_string());
        self.overlay_inserts += 1;
        true
    }

    fn remove_overlay(&mut self) {
        self.overlay = None;
        self.regions.retain(|r, _| *r == Region::HubList);
        self.fields.clear();
        self.open_replies.clear();
        self.reply_texts.clear();
    }

    fn replace_notice_text(&mut self, _html: &str) -> usize {
        if self.notice && !self.notice_marked {
            self.notice_marked = true;
            1
        } else {
            0
        }
    }

    fn hub_present(&self) -> bool { self.hub }

    fn mount_hub(&mut self, _html: &str) -> bool {
        if !self.hub_host_ready {
            return false;
        }
        self.hub = true;
        self.hub_mounts += 1;
        self.notice = false;
        self.overlay = None;
        true
    }

    fn remove_hub(&mut self) {
        self.hub = false;
        self.regions.remove(&Region::HubList);
    }

    fn set_region(&mut self, region: Region, html: &str) -> bool {
        let mounted = match region {
            Region::HubList => self.hub,
            _ => self.overlay.is_some(),
        };
        if mounted {
            self.regions.insert(region, html.to_string());
        }
        mounted
    }

    fn field_value(&self, field: Field) -> Option<String> { self.fields.get(&field).cloned() }
    fn clear_field(&mut self, field: Field) { self.fields.remove(&field); }

    fn reply_open(&self, id: CommentId) -> bool { self.open_replies.contains(&id) }

    fn set_reply_open(&mut self, id: CommentId, open: bool) {
        if open {
            self.open_replies.insert(id);
        } else {
            self.open_replies.remove(&id);
        }
    }

    fn reply_text(&self, id: CommentId) -> Option<String> { self.reply_texts.get(&id).cloned() }
    fn clear_reply_text(&mut self, id: CommentId) { self.reply_texts.remove(&id); }

    fn patch_vote(&mut self, id: CommentId, score_label: &str, active: bool) {
        self.vote_patches.push((id, score_label.to_string(), active));
    }

    fn notify(&mut self, message: &str) { self.notices.push(message.to_string()); }
    fn open_popup(&mut self, popup: &LoginPopup) { self.popups.push(popup.clone()); }

    fn format_timestamp(&self, raw: &str) -> String { raw.to_string() }
}
