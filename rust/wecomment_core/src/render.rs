//! HTML for the overlay, the auth widgets, the comment list and the hub.
//!
//! Every function is a pure function of its inputs. Interactive elements carry
//! a `data-act` attribute; the binding routes clicks by that attribute and the
//! enclosing `.wec-item`'s `data-id`.

use crate::api::VideoSummary;
use crate::comments::{Comment, CommentTree, SortMode};
use crate::session::AuthSession;
use crate::text::{escape, format_count, render_text_with_emoji};

pub const OVERLAY_ID: &str = "wecomment-container";
pub const HUB_ID: &str = "wec-hub";
pub const NOTICE_MARKER: &str = "data-wec-replaced";

pub const NOTICE_REPLACEMENT: &str = "Comments were turned off on <a style=\"color: #3ea6ff; text-decoration: none;\" href=\"https://support.google.com/youtube/answer/9706180?hl=en\">YouTube</a>, but fret not!.... <a style=\"color: #3ea6ff; text-decoration: none;\" href=\"https://github.com/realwumbl3/WeComment\">WeComment</a> is here.";

pub const LOADING: &str = "<div style=\"opacity:.8\">Loading…</div>";
pub const LIST_EMPTY: &str = "<div style=\"opacity:.8\">No comments yet. Be the first!</div>";
pub const LIST_ERROR: &str = "<div style=\"opacity:.8\">Error loading comments.</div>";
pub const HUB_EMPTY: &str = "<div style=\"opacity:.8\">No videos yet.</div>";
pub const HUB_ERROR: &str = "<div>Error loading.</div>";

const STYLES: &str = "
#wecomment-container .wec-item { padding: 16px 0; border-top: 1px solid var(--yt-spec-10-percent-layer, #303030); }
#wecomment-container .wec-row { display: grid; grid-template-columns: 40px 1fr; gap: 12px; }
#wecomment-container .wec-avatar { width: 40px; height: 40px; border-radius: 50%; object-fit: cover; background: #333; }
#wecomment-container .wec-header { display: flex; align-items: baseline; gap: 8px; }
#wecomment-container .wec-author { font-weight: 600; font-size: 14px; }
#wecomment-container .wec-time { font-size: 12px; opacity: .7; }
#wecomment-container .wec-text { margin-top: 6px; line-height: 1.5; font-size: 14px; white-space: pre-wrap; word-break: break-word; }
#wecomment-container .wec-actions { margin-top: 6px; display: flex; align-items: center; gap: 12px; color: var(--yt-spec-text-secondary, #aaa); }
#wecomment-container .wec-button { background: transparent; border: none; color: inherit; cursor: pointer; padding: 6px 10px; border-radius: 18px; }
#wecomment-container .wec-button:hover { background: var(--yt-spec-badge-chip-background, #222); }
#wecomment-container .wec-vote.is-active { background: #1b5e20; color: #fff; border: 1px solid #2e7d32; }
#wecomment-container .wec-score { font-size: 12px; opacity: .9; min-width: 16px; text-align: center; }
#wecomment-container .wec-replybox textarea { width: 100%; box-sizing: border-box; resize: vertical; background: #0f0f0f; color: #fff; border: 1px solid #333; border-radius: 18px; padding: 10px 12px; }
#wecomment-container .wec-replybox .wec-actions-line { margin-top: 8px; display: flex; gap: 8px; }
#wecomment-container .wec-indent { margin-left: 52px; }
";

/// Container with empty auth, composer and list regions.
pub fn overlay_shell(sort: SortMode) -> String {
    let selected = |mode: SortMode| if mode == sort { " selected" } else { "" };
    format!(
        "<div id=\"{OVERLAY_ID}\" style=\"border:1px solid var(--yt-spec-10-percent-layer, #303030);border-radius:8px;padding:12px;margin:12px 0;background:var(--yt-spec-additive-background, #121212);color:var(--yt-spec-text-primary, #fff);\">\
<style>{STYLES}</style>\
<div style=\"display:flex;align-items:center;justify-content:space-between;gap:8px;\">\
<div style=\"display:flex;align-items:center;gap:12px;\">\
<div style=\"font-weight:600;font-size:18px;\">WeComment</div>\
<label style=\"display:flex;align-items:center;gap:6px;font-size:12px;opacity:.85;\"><span>Sort</span>\
<select id=\"wecomment-sort\" style=\"background:#0f0f0f;color:#fff;border:1px solid #333;border-radius:6px;padding:4px 6px;\">\
<option value=\"new\"{}>Newest</option><option value=\"top\"{}>Top</option></select></label>\
</div>\
<div id=\"wecomment-auth-area\"></div>\
</div>\
<div id=\"wecomment-compose\" style=\"margin-top:12px;\"></div>\
<div id=\"wecomment-list\" style=\"margin-top:12px;\">{LOADING}</div>\
</div>",
        selected(SortMode::New),
        selected(SortMode::Top),
    )
}

fn avatar(picture: Option<&str>, size: u32, class: Option<&str>) -> String {
    let class_attr = class.map(|c| format!(" class=\"{c}\"")).unwrap_or_default();
    match picture {
        Some(src) => format!(
            "<img{class_attr} src=\"{}\" style=\"width:{size}px;height:{size}px;border-radius:50%;object-fit:cover;\"/>",
            escape(src)
        ),
        None => format!("<div{class_attr} style=\"width:{size}px;height:{size}px;border-radius:50%;background:#333;\"></div>"),
    }
}

pub fn auth_area(session: &AuthSession) -> String {
    if !session.is_signed_in() {
        return "<button data-act=\"login\" style=\"padding:6px 10px;border-radius:6px;border:1px solid #3ea6ff;background:#0f3d66;color:#fff;cursor:pointer;\">Sign in with Google</button>".to_string();
    }
    let user = session.user();
    let picture = user
        .and_then(|u| u.picture.as_deref())
        .map(|p| avatar(Some(p), 22, None))
        .unwrap_or_default();
    let name = user
        .and_then(|u| u.name.as_deref())
        .map(|n| format!("<span style=\"opacity:.9;\">{}</span>", escape(n)))
        .unwrap_or_default();
    format!(
        "<div style=\"display:flex;align-items:center;gap:8px;\">{picture}{name}<button data-act=\"logout\" style=\"padding:6px 10px;border-radius:6px;border:1px solid #555;background:#222;color:#fff;cursor:pointer;\">Sign out</button></div>"
    )
}

pub fn composer(session: &AuthSession) -> String {
    let picture = session.user().and_then(|u| u.picture.as_deref());
    format!(
        "<div style=\"display:grid;grid-template-columns:36px minmax(0,1fr) auto;gap:8px;align-items:flex-start;\">\
<div>{}</div>\
<textarea id=\"wecomment-input\" placeholder=\"Add a public comment...\" rows=\"3\" style=\"width:100%;box-sizing:border-box;resize:vertical;background:#0f0f0f;color:#fff;border:1px solid #333;border-radius:8px;padding:8px;\"></textarea>\
<button data-act=\"post\" style=\"padding:8px 12px;border-radius:8px;border:1px solid #3ea6ff;background:#065692;color:#fff;cursor:pointer;\">Post</button>\
</div>",
        avatar(picture, 36, None)
    )
}

fn comment_item(out: &mut String, c: &Comment, level: usize, fmt_time: &dyn Fn(&str) -> String) {
    let indent = if level > 0 { " wec-indent" } else { "" };
    let active = if c.user_voted { " is-active" } else { "" };
    out.push_str(&format!(
        "<div class=\"wec-item{indent}\" data-id=\"{id}\"><div class=\"wec-row\"><div>{avatar}</div><div>\
<div class=\"wec-header\"><span class=\"wec-author\">{author}</span><span class=\"wec-time\">{time}</span></div>\
<div class=\"wec-text\">{text}</div>\
<div class=\"wec-actions\">\
<button class=\"wec-button wec-vote{active}\" data-act=\"vote\">👍</button>\
<span class=\"wec-score\" data-role=\"score\">{score}</span>\
<button class=\"wec-button\" data-act=\"reply\">Reply</button>\
</div>\
<div class=\"wec-replybox\" style=\"display:none;\"><textarea rows=\"2\" placeholder=\"Write a reply...\"></textarea>\
<div class=\"wec-actions-line\"><button class=\"wec-button\" data-act=\"send-reply\">Reply</button><button class=\"wec-button\" data-act=\"cancel-reply\">Cancel</button></div>\
</div></div></div></div>",
        id = c.id,
        avatar = avatar(c.author_picture.as_deref(), 40, Some("wec-avatar")),
        author = escape(&c.author_name),
        time = escape(&fmt_time(&c.created_at)),
        text = render_text_with_emoji(&c.text),
        score = format_count(c.score),
    ));
    for reply in &c.replies {
        comment_item(out, reply, level + 1, fmt_time);
    }
}

pub fn comment_list(tree: &CommentTree, fmt_time: &dyn Fn(&str) -> String) -> String {
    if tree.is_empty() {
        return LIST_EMPTY.to_string();
    }
    let mut out = String::new();
    for root in &tree.roots {
        comment_item(&mut out, root, 0, fmt_time);
    }
    out
}

pub fn hub_shell() -> String {
    format!(
        "<div id=\"{HUB_ID}\" style=\"padding:16px 24px;color:var(--yt-spec-text-primary, #fff);\">\
<div id=\"wec-hub-header\" style=\"position:sticky;top:0;z-index:2;background:var(--yt-spec-base-background,#0f0f0f);padding:8px 0 10px;\">\
<h2 style=\"margin:0;font-size:22px;\">Comment Disabled Videos</h2>\
<div style=\"margin:8px 0 0;display:flex;align-items:center;justify-content:space-between;gap:12px;\">\
<div style=\"opacity:.8;\">Videos where WeComment has activity. Click a card to open the video.</div>\
<button data-act=\"hub-refresh\" style=\"padding:8px 12px;border:1px solid #333;border-radius:18px;background:#111;color:#fff;cursor:pointer;\">Refresh</button>\
</div></div>\
<div id=\"wec-hub-list\" style=\"display:grid;grid-template-columns:repeat(auto-fill,minmax(320px,1fr));gap:16px;\">{LOADING}</div>\
</div>"
    )
}

fn hub_card(v: &VideoSummary) -> String {
    let id = &v.youtube_video_id;
    let encoded: String = url::form_urlencoded::byte_serialize(id.as_bytes()).collect();
    let thumbnail = v
        .thumbnail_url
        .clone()
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| format!("https://i.ytimg.com/vi/{encoded}/hqdefault.jpg"));
    let title = v.title.as_deref().filter(|t| !t.is_empty()).unwrap_or(id.as_str());
    format!(
        "<a href=\"https://www.youtube.com/watch?v={encoded}\" style=\"text-decoration:none;color:inherit;border:1px solid #333;border-radius:12px;overflow:hidden;display:block;background:#0f0f0f;\">\
<div style=\"position:relative;background:#000;aspect-ratio:16/9;\">\
<img src=\"{}\" style=\"width:100%;height:100%;object-fit:cover;display:block;\"/>\
<div style=\"position:absolute;right:8px;bottom:8px;background:rgba(0,0,0,.7);padding:2px 6px;border-radius:6px;font-size:12px;\">{} comments</div>\
</div>\
<div style=\"padding:10px 12px;\"><div style=\"font-weight:600;line-height:1.4;\">{}</div>\
<div style=\"margin-top:4px;font-size:13px;opacity:.8;\">{}</div></div>\
</a>",
        escape(&thumbnail),
        v.comment_count,
        escape(title),
        escape(v.channel_title.as_deref().unwrap_or("")),
    )
}

pub fn hub_cards(videos: &[VideoSummary]) -> String {
    if videos.is_empty() {
        return HUB_EMPTY.to_string();
    }
    videos.iter().map(hub_card).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{decode, CommentsPage};
    use crate::identity::ResourceIdentity;
    use crate::session::token_for;

    fn tree() -> CommentTree {
        let page: CommentsPage = decode(
            r#"{"comments":[{"id":1,"text":"hi <there>","score":1500,"user_voted":true,"created_at":"t1",
                "user":{"name":"<Al>","picture":null},
                "replies":[{"id":2,"text":"🇺🇸","score":2,"created_at":"t2","user":{"name":"Bo","picture":"https://p/b.png"}}]}]}"#,
        )
        .unwrap();
        CommentTree::load(ResourceIdentity::new("v").unwrap(), SortMode::Top, page.comments)
    }

    #[test]
    fn list_renders_identity_keyed_items() {
        let html = comment_list(&tree(), &|raw: &str| format!("at {raw}"));
        assert!(html.contains("data-id=\"1\""));
        assert!(html.contains("data-id=\"2\""));
        assert!(html.contains("wec-item wec-indent\" data-id=\"2\""));
        assert!(html.contains("&lt;Al&gt;"));
        assert!(html.contains("hi &lt;there&gt;"));
        assert!(html.contains("at t1"));
        assert!(html.contains(">1.5K<"));
        assert!(html.contains("wec-vote is-active"));
        assert!(html.contains("1f1fa-1f1f8.svg"));
        assert_eq!(html.matches("class=\"wec-replybox\"").count(), 2);
        assert!(html.contains("<div class=\"wec-avatar\""));
    }

    #[test]
    fn empty_tree_has_placeholder() {
        let empty = CommentTree::load(ResourceIdentity::new("v").unwrap(), SortMode::New, Vec::new());
        assert_eq!(comment_list(&empty, &|s: &str| s.to_string()), LIST_EMPTY);
    }

    #[test]
    fn auth_area_follows_session() {
        assert!(auth_area(&AuthSession::default()).contains("data-act=\"login\""));
        let session = AuthSession::from_token(Some(token_for(r#"{"name":"Ann & Co","picture":"https://p/a.png"}"#)));
        let html = auth_area(&session);
        assert!(html.contains("data-act=\"logout\""));
        assert!(!html.contains("data-act=\"login\""));
        assert!(html.contains("Ann &amp; Co"));
        assert!(composer(&session).contains("https://p/a.png"));
        assert!(!composer(&AuthSession::default()).contains("<img"));
    }

    #[test]
    fn shell_marks_current_sort() {
        assert!(overlay_shell(SortMode::New).contains("value=\"new\" selected"));
        assert!(overlay_shell(SortMode::Top).contains("value=\"top\" selected"));
        assert!(overlay_shell(SortMode::Top).starts_with("<div id=\"wecomment-container\""));
    }

    #[test]
    fn hub_cards_fall_back() {
        let videos = vec![VideoSummary {
            youtube_video_id: "abc".into(),
            title: None,
            channel_title: Some("Chan".into()),
            thumbnail_url: None,
            comment_count: 3,
        }];
        let html = hub_cards(&videos);
        assert!(html.contains("https://i.ytimg.com/vi/abc/hqdefault.jpg"));
        assert!(html.contains("watch?v=abc"));
        assert!(html.contains("3 comments"));
        assert!(html.contains(">abc<"));
        assert_eq!(hub_cards(&[]), HUB_EMPTY);
    }
}
