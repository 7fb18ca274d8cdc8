//! `HostPage` over the live YouTube document.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, HtmlSelectElement, HtmlTextAreaElement, Window};
use wecomment_core::comments::CommentId;
use wecomment_core::host::{Field, HostPage, Region};
use wecomment_core::popup::LoginPopup;
use wecomment_core::render::{HUB_ID, NOTICE_MARKER, OVERLAY_ID};

const NOTICE_CANDIDATES: &str = "ytd-message-renderer, #message, #contents";
const REPLACE_CANDIDATES: &str = "ytd-message-renderer, #message, #contents, #comments";
const NOTICE_TEXT_HOLDER: &str = "yt-formatted-string, #message, .message";
const COMMENT_THREAD: &str = "ytd-comment-thread-renderer";
const WATCH_ELEMENT: &str = "ytd-watch-flexy";
const TITLE_SELECTOR: &str = "h1.title, h1.ytd-watch-metadata, h1#title > yt-formatted-string";
const APP_ELEMENT: &str = "ytd-app";
const PAGE_MANAGER_ID: &str = "page-manager";

/// True when `text` carries YouTube's "Comments are turned off. Learn more" line.
pub fn notice_text_matches(text: &str) -> bool {
    const HEAD: &str = "comments are turned off.";
    let lower = text.to_lowercase();
    lower
        .match_indices(HEAD)
        .any(|(at, _)| lower[at + HEAD.len()..].trim_start().starts_with("learn more"))
}

/// True when `text` still carries our rewritten notice.
pub fn replaced_text_matches(text: &str) -> bool {
    text.to_lowercase().contains("comments were turned off on youtube, but fret not!")
}

fn is_disabled_notice(el: &Element) -> bool {
    notice_text_matches(&el.text_content().unwrap_or_default())
}

/// YouTube reuses `#comments` across videos, so the marker alone proves
/// nothing. A rewritten notice counts only while it still shows our text,
/// holds no comment threads and is laid out.
fn is_marked_notice(el: &Element) -> bool {
    el.has_attribute(NOTICE_MARKER)
        && replaced_text_matches(&el.text_content().unwrap_or_default())
        && el.query_selector(COMMENT_THREAD).ok().flatten().is_none()
        && el
            .dyn_ref::<HtmlElement>()
            .map(|h| h.offset_parent().is_some())
            .unwrap_or(true)
}

pub struct DomPage {
    window: Window,
    document: Document,
}

impl DomPage {
    pub fn new() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Self { window, document })
    }

    pub fn document(&self) -> &Document { &self.document }

    fn by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn query(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn query_all(&self, selector: &str) -> Vec<Element> {
        let Ok(list) = self.document.query_selector_all(selector) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn notice_element(&self) -> Option<Element> {
        let candidates = self.query_all(NOTICE_CANDIDATES);
        candidates
            .iter()
            .find(|el| is_disabled_notice(el))
            .or_else(|| candidates.iter().find(|el| is_marked_notice(el)))
            .cloned()
            .or_else(|| self.query("#comments").filter(|el| is_disabled_notice(el) || is_marked_notice(el)))
    }

    fn comment_item(&self, id: CommentId) -> Option<Element> {
        self.by_id(OVERLAY_ID)?
            .query_selector(&format!(".wec-item[data-id=\"{id}\"]"))
            .ok()
            .flatten()
    }

    fn reply_box(&self, id: CommentId) -> Option<HtmlElement> {
        self.comment_item(id)?
            .query_selector(".wec-replybox")
            .ok()
            .flatten()?
            .dyn_into::<HtmlElement>()
            .ok()
    }

    fn reply_area(&self, id: CommentId) -> Option<HtmlTextAreaElement> {
        self.reply_box(id)?
            .query_selector("textarea")
            .ok()
            .flatten()?
            .dyn_into::<HtmlTextAreaElement>()
            .ok()
    }

    fn textarea(&self, field: Field) -> Option<HtmlTextAreaElement> {
        self.by_id(field.element_id())?.dyn_into::<HtmlTextAreaElement>().ok()
    }

    fn outer_size(&self) -> Option<(f64, f64)> {
        let top = self.window.top().ok().flatten()?;
        let width = top.outer_width().ok()?.as_f64()?;
        let height = top.outer_height().ok()?.as_f64()?;
        Some((width, height))
    }
}

impl HostPage for DomPage {
    fn location_href(&self) -> String {
        self.window.location().href().unwrap_or_default()
    }

    fn watch_video_attribute(&self) -> Option<String> {
        self.query(WATCH_ELEMENT)?.get_attribute("video-id")
    }

    fn page_title(&self) -> Option<String> {
        let title = self.query(TITLE_SELECTOR)?.text_content()?;
        let title = title.trim();
        (!title.is_empty()).then(|| title.to_string())
    }

    fn has_disabled_notice(&self) -> bool {
        self.notice_element().is_some()
    }

    fn overlay_present(&self) -> bool {
        self.by_id(OVERLAY_ID).is_some()
    }

    fn insert_overlay(&mut self, html: &str) -> bool {
        let Some(notice) = self.notice_element() else { return false };
        if notice.parent_element().is_none() {
            return false;
        }
        match notice.insert_adjacent_html("afterend", html) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("overlay insert failed: {err:?}");
                false
            }
        }
    }

    fn remove_overlay(&mut self) {
        if let Some(el) = self.by_id(OVERLAY_ID) {
            el.remove();
        }
    }

    fn replace_notice_text(&mut self, html: &str) -> usize {
        let mut replaced = 0;
        for el in self.query_all(REPLACE_CANDIDATES) {
            if el.has_attribute(NOTICE_MARKER) || !is_disabled_notice(&el) {
                continue;
            }
            let holder = el.query_selector(NOTICE_TEXT_HOLDER).ok().flatten().unwrap_or_else(|| el.clone());
            holder.set_inner_html(html);
            if el.set_attribute(NOTICE_MARKER, "1").is_ok() {
                replaced += 1;
            }
        }
        replaced
    }

    fn hub_present(&self) -> bool {
        self.by_id(HUB_ID).is_some()
    }

    fn mount_hub(&mut self, html: &str) -> bool {
        if self.query(APP_ELEMENT).is_none() {
            return false;
        }
        let Some(manager) = self.by_id(PAGE_MANAGER_ID) else { return false };
        manager.set_inner_html("");
        manager.insert_adjacent_html("beforeend", html).is_ok()
    }

    fn remove_hub(&mut self) {
        if let Some(el) = self.by_id(HUB_ID) {
            el.remove();
        }
    }

    fn set_region(&mut self, region: Region, html: &str) -> bool {
        match self.by_id(region.element_id()) {
            Some(el) => {
                el.set_inner_html(html);
                true
            }
            None => false,
        }
    }

    fn field_value(&self, field: Field) -> Option<String> {
        match field {
            Field::ComposerText => self.textarea(field).map(|ta| ta.value()),
            Field::SortSelect => self
                .by_id(field.element_id())?
                .dyn_into::<HtmlSelectElement>()
                .ok()
                .map(|select| select.value()),
        }
    }

    fn clear_field(&mut self, field: Field) {
        if let Some(ta) = self.textarea(field) {
            ta.set_value("");
        }
    }

    fn reply_open(&self, id: CommentId) -> bool {
        self.reply_box(id)
            .and_then(|b| b.style().get_property_value("display").ok())
            .map(|display| display != "none")
            .unwrap_or(false)
    }

    fn set_reply_open(&mut self, id: CommentId, open: bool) {
        let Some(reply_box) = self.reply_box(id) else { return };
        let display = if open { "block" } else { "none" };
        if let Err(err) = reply_box.style().set_property("display", display) {
            log::warn!("reply box {id}: {err:?}");
        }
    }

    fn reply_text(&self, id: CommentId) -> Option<String> {
        self.reply_area(id).map(|ta| ta.value())
    }

    fn clear_reply_text(&mut self, id: CommentId) {
        if let Some(ta) = self.reply_area(id) {
            ta.set_value("");
        }
    }

    fn patch_vote(&mut self, id: CommentId, score_label: &str, active: bool) {
        let Some(item) = self.comment_item(id) else { return };
        if let Ok(Some(score)) = item.query_selector("[data-role=\"score\"]") {
            score.set_text_content(Some(score_label));
        }
        if let Ok(Some(button)) = item.query_selector(".wec-vote") {
            let _ = button.class_list().toggle_with_force("is-active", active);
        }
    }

    fn notify(&mut self, message: &str) {
        if let Err(err) = self.window.alert_with_message(message) {
            log::warn!("alert failed: {err:?}");
        }
    }

    fn open_popup(&mut self, popup: &LoginPopup) {
        let features = popup.features(self.outer_size());
        match self.window.open_with_url_and_target_and_features(&popup.url, popup.name, &features) {
            Ok(Some(_)) => log::debug!("login popup opened"),
            Ok(None) => log::warn!("login popup was blocked"),
            Err(err) => log::warn!("login popup failed: {err:?}"),
        }
    }

    fn format_timestamp(&self, raw: &str) -> String {
        let date = js_sys::Date::new(&JsValue::from_str(raw));
        if date.get_time().is_nan() {
            return raw.to_string();
        }
        let locale = self.window.navigator().language().unwrap_or_else(|| "en-US".to_string());
        date.to_locale_string(&locale, &JsValue::UNDEFINED).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_text_detection() {
        assert!(notice_text_matches("Comments are turned off. Learn more"));
        assert!(notice_text_matches("  comments are turned off.\n   LEARN MORE "));
        assert!(!notice_text_matches("Comments are turned off"));
        assert!(!notice_text_matches("Comments were turned off on YouTube, but fret not!"));
    }

    #[test]
    fn rewritten_notice_text_detection() {
        assert!(replaced_text_matches("Comments were turned off on YouTube, but fret not!.... WeComment is here."));
        assert!(!replaced_text_matches("Comments are turned off. Learn more"));
        assert!(!replaced_text_matches("Great video, thanks for sharing"));
    }
}
