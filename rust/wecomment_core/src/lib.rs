pub mod api;
pub mod comments;
pub mod config;
pub mod error;
pub mod host;
pub mod identity;
pub mod popup;
pub mod render;
pub mod session;
pub mod storage;
pub mod text;
pub mod watcher;

#[cfg(test)]
mod testing;

use std::collections::HashMap;

use serde_json::Value;

use api::{ApiRequest, ApiResponse, BackendClient, CommentsPage, Outcome, VideoDirectory, VoteResult};
use comments::{CommentId, CommentTree, SortMode};
use config::Settings;
use error::{ActionError, ApiError};
use host::{Field, HostPage, Region};
use identity::ResourceIdentity;
use popup::LoginPopup;
use session::{AuthSession, SessionStore};
use storage::KeyValueStore;
use watcher::{Reconciliation, Trigger, WatchState, Watcher};

pub const SESSION_EXPIRED: &str = "Session expired. Please sign in again.";
pub const SIGN_IN_FIRST: &str = "Please sign in first.";
pub const POST_FAILED: &str = "Could not post your comment. Please try again.";

pub type Ticket = u64;

/// A request waiting to be executed by the binding.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub ticket: Ticket,
    pub request: ApiRequest,
}

/// What an in-flight request was for, and which state it was issued against.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Purpose {
    Comments { video: ResourceIdentity, sort: SortMode },
    Post { video: ResourceIdentity },
    Reply { video: ResourceIdentity, parent: CommentId },
    Vote { video: ResourceIdentity, comment: CommentId },
    Hub,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    Vote(CommentId),
    ToggleReply(CommentId),
    CancelReply(CommentId),
    SendReply(CommentId),
    PostComment,
    SortChanged,
    SignIn,
    SignOut,
    RefreshHub,
}

impl UiAction {
    /// Map a `data-act` value (plus the enclosing comment id, if any) to an action.
    pub fn from_act(act: &str, comment: Option<CommentId>) -> Option<Self> {
        let action = match (act, comment) {
            ("vote", Some(id)) => UiAction::Vote(id),
            ("reply", Some(id)) => UiAction::ToggleReply(id),
            ("cancel-reply", Some(id)) => UiAction::CancelReply(id),
            ("send-reply", Some(id)) => UiAction::SendReply(id),
            ("post", _) => UiAction::PostComment,
            ("login", _) => UiAction::SignIn,
            ("logout", _) => UiAction::SignOut,
            ("hub-refresh", _) => UiAction::RefreshHub,
            _ => return None,
        };
        Some(action)
    }
}

/// Owned context for one page life: settings, session, watcher, the current
/// comment tree and the request bookkeeping.
#[derive(Debug)]
pub struct OverlayCore<S: KeyValueStore> {
    settings: Settings,
    sessions: SessionStore<S>,
    watcher: Watcher,
    sort: SortMode,
    tree: Option<CommentTree>,
    outbox: Vec<PendingRequest>,
    in_flight: HashMap<Ticket, Purpose>,
    next_ticket: Ticket,
}

impl<S: KeyValueStore> OverlayCore<S> {
    pub fn initialize(store: S) -> Self {
        let settings = Settings::load(&store);
        let sessions = SessionStore::load(store);
        log::debug!(
            "overlay core ready, backend {}, signed in: {}",
            settings.backend_base_url,
            sessions.session().is_signed_in()
        );
        Self {
            settings,
            sessions,
            watcher: Watcher::new(),
            sort: SortMode::default(),
            tree: None,
            outbox: Vec::new(),
            in_flight: HashMap::new(),
            next_ticket: 1,
        }
    }

    pub fn teardown<H: HostPage>(&mut self, host: &mut H) {
        self.watcher.teardown(host);
        self.tree = None;
        self.outbox.clear();
        self.in_flight.clear();
    }

    pub fn settings(&self) -> &Settings { &self.settings }
    pub fn session(&self) -> &AuthSession { self.sessions.session() }
    pub fn store(&self) -> &S { self.sessions.store() }
    pub fn sort(&self) -> SortMode { self.sort }
    pub fn tree(&self) -> Option<&CommentTree> { self.tree.as_ref() }
    pub fn watcher(&self) -> &Watcher { &self.watcher }

    pub fn take_requests(&mut self) -> Vec<PendingRequest> {
        std::mem::take(&mut self.outbox)
    }

    fn client(&self) -> BackendClient<'_> {
        BackendClient::new(&self.settings.backend_base_url, self.sessions.session().token())
    }

    fn enqueue(&mut self, purpose: Purpose, request: Result<ApiRequest, ApiError>) -> bool {
        match request {
            Ok(request) => {
                let ticket = self.next_ticket;
                self.next_ticket += 1;
                self.in_flight.insert(ticket, purpose);
                self.outbox.push(PendingRequest { ticket, request });
                true
            }
            Err(err) => {
                log::warn!("cannot build request for {purpose:?}: {err}");
                false
            }
        }
    }

    fn is_bound_to(&self, video: &ResourceIdentity) -> bool {
        self.watcher.bound() == Some(video)
    }

    /// Single entry point for every observation trigger.
    pub fn on_possible_change<H: HostPage>(&mut self, host: &mut H, trigger: Trigger) -> Reconciliation {
        let outcome = self.watcher.reconcile(host, trigger, self.sort);
        if outcome.identity_changed || outcome.overlay_removed {
            self.tree = None;
        }
        if outcome.hub_opened {
            self.request_hub(host);
        }
        if let Some(video) = outcome.injected.clone() {
            self.render_auth(host);
            let title = host.page_title().unwrap_or_default();
            let touch = self.client().touch_video(&video, title.trim());
            self.enqueue(Purpose::Touch, touch);
            self.request_comments(host, video);
        }
        outcome
    }

    fn render_auth<H: HostPage>(&self, host: &mut H) {
        host.set_region(Region::AuthArea, &render::auth_area(self.session()));
        host.set_region(Region::Composer, &render::composer(self.session()));
    }

    fn request_comments<H: HostPage>(&mut self, host: &mut H, video: ResourceIdentity) {
        self.tree = None;
        host.set_region(Region::CommentList, render::LOADING);
        let sort = self.sort;
        let request = self.client().fetch_comments(&video, sort);
        if !self.enqueue(Purpose::Comments { video, sort }, request) {
            host.set_region(Region::CommentList, render::LIST_ERROR);
        }
    }

    fn request_hub<H: HostPage>(&mut self, host: &mut H) {
        host.set_region(Region::HubList, render::LOADING);
        let request = self.client().list_videos();
        if !self.enqueue(Purpose::Hub, request) {
            host.set_region(Region::HubList, render::HUB_ERROR);
        }
    }

    fn require_bound(&self) -> Result<ResourceIdentity, ActionError> {
        self.watcher.bound().cloned().ok_or(ActionError::Unbound)
    }

    fn require_session<H: HostPage>(&self, host: &mut H) -> Result<(), ActionError> {
        if self.session().is_signed_in() {
            Ok(())
        } else {
            host.notify(SIGN_IN_FIRST);
            Err(ActionError::SignedOut)
        }
    }

    pub fn on_action<H: HostPage>(&mut self, host: &mut H, action: UiAction) -> Result<(), ActionError> {
        match action {
            UiAction::Vote(comment) => {
                let video = self.require_bound()?;
                self.require_session(host)?;
                let request = self.client().toggle_vote(comment);
                self.enqueue(Purpose::Vote { video, comment }, request);
            }
            UiAction::ToggleReply(comment) => {
                let open = host.reply_open(comment);
                host.set_reply_open(comment, !open);
            }
            UiAction::CancelReply(comment) => host.set_reply_open(comment, false),
            UiAction::SendReply(parent) => {
                let video = self.require_bound()?;
                self.require_session(host)?;
                let text = non_empty(host.reply_text(parent))?;
                let request = self.client().post_comment(&video, &text, Some(parent));
                self.enqueue(Purpose::Reply { video, parent }, request);
            }
            UiAction::PostComment => {
                let video = self.require_bound()?;
                self.require_session(host)?;
                let text = non_empty(host.field_value(Field::ComposerText))?;
                let request = self.client().post_comment(&video, &text, None);
                self.enqueue(Purpose::Post { video }, request);
            }
            UiAction::SortChanged => {
                let raw = host.field_value(Field::SortSelect).unwrap_or_default();
                self.sort = SortMode::parse(&raw)?;
                self.tree = None;
                if let Some(video) = self.watcher.bound().cloned() {
                    self.request_comments(host, video);
                }
            }
            UiAction::SignIn => host.open_popup(&LoginPopup::login(&self.settings.backend_base_url)),
            UiAction::SignOut => {
                self.sessions.logout();
                self.render_auth(host);
            }
            UiAction::RefreshHub => {
                if self.watcher.state() == &WatchState::Hub {
                    self.request_hub(host);
                }
            }
        }
        Ok(())
    }

    /// Popup bridge: accept a recognized auth message, ignore anything else.
    pub fn on_auth_message<H: HostPage>(&mut self, host: &mut H, data: &Value) -> bool {
        let Some(token) = popup::parse_auth_message(data) else { return false };
        self.sessions.login(&token);
        self.render_auth(host);
        true
    }

    fn expire_session<H: HostPage>(&mut self, host: &mut H) {
        let was_signed_in = self.sessions.session().is_signed_in();
        self.sessions.expire();
        self.render_auth(host);
        // later 401s from the same burst stay quiet
        if was_signed_in {
            host.notify(SESSION_EXPIRED);
        }
    }

    pub fn on_response<H: HostPage>(&mut self, host: &mut H, ticket: Ticket, result: Result<ApiResponse, String>) {
        let Some(purpose) = self.in_flight.remove(&ticket) else {
            log::debug!("ignoring response for unknown ticket {ticket}");
            return;
        };
        let body = match api::classify(result) {
            Outcome::Success(body) => body,
            Outcome::Unauthorized => {
                self.expire_session(host);
                self.show_failure(host, &purpose);
                return;
            }
            Outcome::Failure(err) => {
                log::warn!("{purpose:?} failed: {err}");
                self.show_failure(host, &purpose);
                return;
            }
        };

        match purpose {
            Purpose::Comments { video, sort } => {
                if !self.is_bound_to(&video) || sort != self.sort {
                    log::debug!("dropping stale comments for {video} ({})", sort.as_str());
                    return;
                }
                match api::decode::<CommentsPage>(&body) {
                    Ok(page) => {
                        let tree = CommentTree::load(video, sort, page.comments);
                        let html = render::comment_list(&tree, &|raw: &str| host.format_timestamp(raw));
                        host.set_region(Region::CommentList, &html);
                        self.tree = Some(tree);
                    }
                    Err(err) => {
                        log::warn!("comments for {video}: {err}");
                        host.set_region(Region::CommentList, render::LIST_ERROR);
                    }
                }
            }
            Purpose::Post { video } => {
                if self.is_bound_to(&video) {
                    host.clear_field(Field::ComposerText);
                    self.request_comments(host, video);
                }
            }
            Purpose::Reply { video, parent } => {
                if self.is_bound_to(&video) {
                    host.clear_reply_text(parent);
                    host.set_reply_open(parent, false);
                    self.request_comments(host, video);
                }
            }
            Purpose::Vote { video, comment } => {
                if !self.is_bound_to(&video) {
                    return;
                }
                match api::decode::<VoteResult>(&body) {
                    Ok(result) => {
                        if let Some(tree) = self.tree.as_mut() {
                            tree.apply_vote(comment, result);
                        }
                        host.patch_vote(comment, &text::format_count(result.score), result.voted);
                    }
                    Err(err) => log::warn!("vote on {comment}: {err}"),
                }
            }
            Purpose::Hub => {
                if !host.hub_present() {
                    return;
                }
                let html = match api::decode::<VideoDirectory>(&body) {
                    Ok(dir) => render::hub_cards(&dir.videos),
                    Err(err) => {
                        log::warn!("hub directory: {err}");
                        render::HUB_ERROR.to_string()
                    }
                };
                host.set_region(Region::HubList, &html);
            }
            Purpose::Touch => {}
        }
    }

    fn show_failure<H: HostPage>(&self, host: &mut H, purpose: &Purpose) {
        match purpose {
            Purpose::Comments { video, sort } if self.is_bound_to(video) && *sort == self.sort => {
                host.set_region(Region::CommentList, render::LIST_ERROR);
            }
            Purpose::Post { video } | Purpose::Reply { video, .. } if self.is_bound_to(video) => {
                host.notify(POST_FAILED);
            }
            Purpose::Hub if host.hub_present() => {
                host.set_region(Region::HubList, render::HUB_ERROR);
            }
            _ => {}
        }
    }
}

fn non_empty(text: Option<String>) -> Result<String, ActionError> {
    let text = text.unwrap_or_default();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(ActionError::EmptyText)
    } else {
        Ok(trimmed.to_string())
    }
}
