//! Reconciliation state machine driven by page observation triggers.
//!
//! The watcher owns overlay presence only. It decides when to mount or drop
//! the comment overlay and the hub, and reports what it did so the caller can
//! fill in content. It is independent of how triggers are produced.

use crate::comments::SortMode;
use crate::host::HostPage;
use crate::identity::{self, ResourceIdentity};
use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Host page content changed somewhere in the document.
    Mutation,
    /// SPA navigation, history or hash change event.
    Navigation,
    /// Fallback timer tick; only acts when the URL moved.
    Poll,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WatchState {
    #[default]
    Idle,
    Bound(ResourceIdentity),
    Hub,
}

/// What a single reconciliation pass changed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reconciliation {
    pub identity_changed: bool,
    pub overlay_removed: bool,
    pub injected: Option<ResourceIdentity>,
    pub hub_opened: bool,
    pub hub_closed: bool,
    pub notices_replaced: usize,
}

#[derive(Debug, Default)]
pub struct Watcher {
    state: WatchState,
    current: Option<ResourceIdentity>,
    last_href: Option<String>,
}

impl Watcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WatchState { &self.state }
    pub fn current(&self) -> Option<&ResourceIdentity> { self.current.as_ref() }

    /// Identity the overlay is currently injected for.
    pub fn bound(&self) -> Option<&ResourceIdentity> {
        match &self.state {
            WatchState::Bound(id) => Some(id),
            _ => None,
        }
    }

    pub fn reconcile<H: HostPage>(&mut self, host: &mut H, trigger: Trigger, sort: SortMode) -> Reconciliation {
        let href = host.location_href();
        if trigger == Trigger::Poll && self.last_href.as_deref() == Some(href.as_str()) {
            return Reconciliation::default();
        }
        self.last_href = Some(href.clone());

        let mut out = Reconciliation::default();
        self.reconcile_hub(host, &href, &mut out);

        let resolved = identity::resolve(&href, host.watch_video_attribute().as_deref());
        if resolved != self.current {
            log::debug!("identity {:?} -> {:?}", self.current, resolved);
            if host.overlay_present() {
                host.remove_overlay();
                out.overlay_removed = true;
            }
            if matches!(self.state, WatchState::Bound(_)) {
                self.state = WatchState::Idle;
            }
            self.current = resolved;
            out.identity_changed = true;
        }

        if !identity::is_hub_route(&href) {
            self.ensure_overlay(host, sort, &mut out);
        }
        out.notices_replaced = host.replace_notice_text(render::NOTICE_REPLACEMENT);
        out
    }

    fn reconcile_hub<H: HostPage>(&mut self, host: &mut H, href: &str, out: &mut Reconciliation) {
        let hub_route = identity::is_hub_route(href);
        let hub_mounted = host.hub_present();
        if hub_route && !hub_mounted {
            // the overlay stays until the hub is actually up
            let had_overlay = host.overlay_present();
            if host.mount_hub(&render::hub_shell()) {
                if host.overlay_present() {
                    host.remove_overlay();
                }
                log::debug!("hub opened");
                self.state = WatchState::Hub;
                out.overlay_removed = had_overlay;
                out.hub_opened = true;
            }
        } else if !hub_route && hub_mounted {
            host.remove_hub();
            self.state = WatchState::Idle;
            out.hub_closed = true;
        } else if !hub_route && self.state == WatchState::Hub {
            // host page replaced the hub on its own
            self.state = WatchState::Idle;
        }
    }

    fn ensure_overlay<H: HostPage>(&mut self, host: &mut H, sort: SortMode, out: &mut Reconciliation) {
        if self.state == WatchState::Hub {
            return;
        }
        let Some(current) = self.current.clone() else { return };
        if !host.has_disabled_notice() {
            return;
        }
        let bound_here = self.bound() == Some(&current);
        if bound_here && host.overlay_present() {
            return;
        }
        if host.overlay_present() {
            // left over from a previous binding
            host.remove_overlay();
            out.overlay_removed = true;
        }
        if host.insert_overlay(&render::overlay_shell(sort)) {
            log::debug!("overlay injected for {current}");
            self.state = WatchState::Bound(current.clone());
            out.injected = Some(current);
        }
    }

    pub fn teardown<H: HostPage>(&mut self, host: &mut H) {
        if host.overlay_present() {
            host.remove_overlay();
        }
        if host.hub_present() {
            host.remove_hub();
        }
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePage;

    fn watch(href: &str) -> FakePage {
        FakePage::at(href)
    }

    #[test]
    fn repeated_triggers_inject_once() {
        let mut page = watch("https://www.youtube.com/watch?v=a");
        page.notice = true;
        let mut w = Watcher::new();
        let first = w.reconcile(&mut page, Trigger::Navigation, SortMode::Top);
        assert_eq!(first.injected, ResourceIdentity::new("a"));
        for _ in 0..20 {
            let again = w.reconcile(&mut page, Trigger::Mutation, SortMode::Top);
            assert_eq!(again.injected, None);
        }
        assert_eq!(page.overlay_inserts, 1);
        assert!(page.overlay.is_some());
        assert_eq!(w.bound(), ResourceIdentity::new("a").as_ref());
    }

    #[test]
    fn waits_for_notice() {
        let mut page = watch("https://www.youtube.com/watch?v=a");
        let mut w = Watcher::new();
        assert_eq!(w.reconcile(&mut page, Trigger::Mutation, SortMode::Top).injected, None);
        assert_eq!(w.state(), &WatchState::Idle);
        page.notice = true;
        assert!(w.reconcile(&mut page, Trigger::Mutation, SortMode::Top).injected.is_some());
    }

    #[test]
    fn identity_change_removes_overlay_first() {
        let mut page = watch("https://www.youtube.com/watch?v=a");
        page.notice = true;
        let mut w = Watcher::new();
        w.reconcile(&mut page, Trigger::Navigation, SortMode::Top);

        page.notice = false;
        page.href = "https://www.youtube.com/watch?v=b".into();
        let r = w.reconcile(&mut page, Trigger::Navigation, SortMode::Top);
        assert!(r.identity_changed && r.overlay_removed);
        assert!(page.overlay.is_none());
        assert_eq!(w.state(), &WatchState::Idle);
        assert_eq!(w.current(), ResourceIdentity::new("b").as_ref());

        page.notice = true;
        let r = w.reconcile(&mut page, Trigger::Mutation, SortMode::Top);
        assert_eq!(r.injected, ResourceIdentity::new("b"));
        assert_eq!(page.overlay_inserts, 2);
    }

    #[test]
    fn leaving_watch_page_unbinds() {
        let mut page = watch("https://www.youtube.com/watch?v=a");
        page.notice = true;
        let mut w = Watcher::new();
        w.reconcile(&mut page, Trigger::Navigation, SortMode::Top);
        page.href = "https://www.youtube.com/".into();
        let r = w.reconcile(&mut page, Trigger::Navigation, SortMode::Top);
        assert!(r.identity_changed);
        assert!(page.overlay.is_none());
        assert_eq!(w.current(), None);
    }

    #[test]
    fn reinjects_when_host_drops_overlay() {
        let mut page = watch("https://www.youtube.com/watch?v=a");
        page.notice = true;
        let mut w = Watcher::new();
        w.reconcile(&mut page, Trigger::Navigation, SortMode::Top);
        page.overlay = None;
        let r = w.reconcile(&mut page, Trigger::Mutation, SortMode::Top);
        assert!(r.injected.is_some());
        assert_eq!(page.overlay_inserts, 2);
    }

    #[test]
    fn poll_acts_only_on_url_change() {
        let mut page = watch("https://www.youtube.com/watch?v=a");
        let mut w = Watcher::new();
        w.reconcile(&mut page, Trigger::Navigation, SortMode::Top);
        page.notice = true;
        assert_eq!(w.reconcile(&mut page, Trigger::Poll, SortMode::Top), Reconciliation::default());
        assert!(page.overlay.is_none());

        page.href = "https://www.youtube.com/watch?v=b".into();
        let r = w.reconcile(&mut page, Trigger::Poll, SortMode::Top);
        assert!(r.identity_changed);
        assert_eq!(r.injected, ResourceIdentity::new("b"));
    }

    #[test]
    fn hub_is_exclusive_with_overlay() {
        let mut page = watch("https://www.youtube.com/watch?v=a");
        page.notice = true;
        let mut w = Watcher::new();
        w.reconcile(&mut page, Trigger::Navigation, SortMode::Top);

        page.href = "https://www.youtube.com/watch?v=a#wec-hub".into();
        let r = w.reconcile(&mut page, Trigger::Navigation, SortMode::Top);
        assert!(r.hub_opened && r.overlay_removed);
        assert_eq!(w.state(), &WatchState::Hub);
        assert!(page.overlay.is_none());

        // mutations while the hub is open never inject
        page.notice = true;
        for _ in 0..3 {
            w.reconcile(&mut page, Trigger::Mutation, SortMode::Top);
        }
        assert_eq!(page.hub_mounts, 1);
        assert!(page.overlay.is_none());

        page.href = "https://www.youtube.com/watch?v=a".into();
        let r = w.reconcile(&mut page, Trigger::Navigation, SortMode::Top);
        assert!(r.hub_closed);
        assert!(!page.hub);
        assert!(r.injected.is_some());
    }

    #[test]
    fn hub_waits_for_host_containers() {
        let mut page = watch("https://www.youtube.com/#wec-hub");
        page.hub_host_ready = false;
        let mut w = Watcher::new();
        assert!(!w.reconcile(&mut page, Trigger::Navigation, SortMode::Top).hub_opened);
        assert_eq!(w.state(), &WatchState::Idle);
        page.hub_host_ready = true;
        assert!(w.reconcile(&mut page, Trigger::Mutation, SortMode::Top).hub_opened);
    }

    #[test]
    fn pending_hub_keeps_overlay_in_place() {
        let mut page = watch("https://www.youtube.com/watch?v=a");
        page.notice = true;
        let mut w = Watcher::new();
        w.reconcile(&mut page, Trigger::Navigation, SortMode::Top);

        page.hub_host_ready = false;
        page.href = "https://www.youtube.com/watch?v=a#wec-hub".into();
        for _ in 0..5 {
            let r = w.reconcile(&mut page, Trigger::Mutation, SortMode::Top);
            assert!(!r.hub_opened && !r.overlay_removed);
            assert_eq!(r.injected, None);
        }
        assert_eq!(page.overlay_inserts, 1);
        assert_eq!(w.bound(), ResourceIdentity::new("a").as_ref());

        page.hub_host_ready = true;
        let r = w.reconcile(&mut page, Trigger::Mutation, SortMode::Top);
        assert!(r.hub_opened && r.overlay_removed);
        assert_eq!(w.state(), &WatchState::Hub);
    }

    #[test]
    fn notice_text_is_rewritten_once() {
        let mut page = watch("https://www.youtube.com/watch?v=a");
        page.notice = true;
        let mut w = Watcher::new();
        assert_eq!(w.reconcile(&mut page, Trigger::Mutation, SortMode::Top).notices_replaced, 1);
        assert_eq!(w.reconcile(&mut page, Trigger::Mutation, SortMode::Top).notices_replaced, 0);
    }

    #[test]
    fn teardown_clears_everything() {
        let mut page = watch("https://www.youtube.com/watch?v=a");
        page.notice = true;
        let mut w = Watcher::new();
        w.reconcile(&mut page, Trigger::Navigation, SortMode::Top);
        w.teardown(&mut page);
        assert!(page.overlay.is_none());
        assert_eq!(w.state(), &WatchState::Idle);
        assert_eq!(w.current(), None);
    }
}
