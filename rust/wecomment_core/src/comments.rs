//! Render-ready comment tree fetched for one video and sort mode.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api::{VoteResult, WireComment};
use crate::error::ActionError;
use crate::identity::ResourceIdentity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub i64);

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl std::str::FromStr for CommentId {
    type Err = std::num::ParseIntError;
    fn from_str(s: &str) -> Result<Self, Self::Err> { s.trim().parse().map(CommentId) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    New,
    #[default]
    Top,
}

impl SortMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::New => "new",
            SortMode::Top => "top",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ActionError> {
        match raw.trim() {
            "new" => Ok(SortMode::New),
            "top" => Ok(SortMode::Top),
            other => Err(ActionError::UnknownSort(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: CommentId,
    pub author_name: String,
    pub author_picture: Option<String>,
    pub text: String,
    pub created_at: String,
    pub score: i64,
    pub user_voted: bool,
    pub parent_id: Option<CommentId>,
    pub replies: Vec<Comment>,
}

impl Comment {
    fn from_wire(wire: WireComment) -> (Self, Vec<WireComment>) {
        let user = wire.user.unwrap_or_default();
        let comment = Comment {
            id: wire.id,
            author_name: user.name.filter(|n| !n.trim().is_empty()).unwrap_or_else(|| "User".to_string()),
            author_picture: user.picture.filter(|p| !p.trim().is_empty()),
            text: wire.text,
            created_at: wire.created_at,
            score: wire.score,
            user_voted: wire.user_voted,
            parent_id: wire.parent_id,
            replies: Vec::new(),
        };
        (comment, wire.replies)
    }
}

/// Roots with one level of replies. Replaced wholesale on every load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentTree {
    pub resource: ResourceIdentity,
    pub sort: SortMode,
    pub roots: Vec<Comment>,
}

impl CommentTree {
    /// Build from the backend payload. Deeper nesting is hoisted so every
    /// reply hangs directly off its root, in depth-first order.
    pub fn load(resource: ResourceIdentity, sort: SortMode, wire: Vec<WireComment>) -> Self {
        let roots = wire
            .into_iter()
            .map(|node| {
                let (mut root, nested) = Comment::from_wire(node);
                flatten_into(nested, &mut root.replies);
                root
            })
            .collect();
        Self { resource, sort, roots }
    }

    pub fn is_empty(&self) -> bool { self.roots.is_empty() }

    pub fn find(&self, id: CommentId) -> Option<&Comment> {
        self.roots
            .iter()
            .flat_map(|root| std::iter::once(root).chain(root.replies.iter()))
            .find(|c| c.id == id)
    }

    fn find_mut(&mut self, id: CommentId) -> Option<&mut Comment> {
        self.roots.iter_mut().find_map(|root| {
            if root.id == id {
                Some(root)
            } else {
                root.replies.iter_mut().find(|r| r.id == id)
            }
        })
    }

    /// Patch the matching node with the server's vote result. Returns false
    /// when no node has that id.
    pub fn apply_vote(&mut self, id: CommentId, result: VoteResult) -> bool {
        match self.find_mut(id) {
            Some(node) => {
                node.score = result.score;
                node.user_voted = result.voted;
                true
            }
            None => false,
        }
    }
}

fn flatten_into(nodes: Vec<WireComment>, out: &mut Vec<Comment>) {
    for node in nodes {
        let (comment, nested) = Comment::from_wire(node);
        out.push(comment);
        flatten_into(nested, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{decode, CommentsPage};

    fn tree(json: &str) -> CommentTree {
        let page: CommentsPage = decode(json).unwrap();
        CommentTree::load(ResourceIdentity::new("v").unwrap(), SortMode::Top, page.comments)
    }

    const SAMPLE: &str = r#"{"comments":[
        {"id":1,"text":"root","score":4,"user_voted":false,"user":{"name":"A","picture":"p"},
         "replies":[{"id":2,"text":"r","score":1,"parent_id":1,
                     "replies":[{"id":3,"text":"deep","score":9,"parent_id":2}]}]},
        {"id":4,"text":"sibling","score":4,"user":null}
    ]}"#;

    #[test]
    fn replies_nest_one_level() {
        let t = tree(SAMPLE);
        assert_eq!(t.roots.len(), 2);
        let ids: Vec<i64> = t.roots[0].replies.iter().map(|c| c.id.0).collect();
        assert_eq!(ids, vec![2, 3]);
        assert!(t.roots[0].replies.iter().all(|r| r.replies.is_empty()));
        assert_eq!(t.roots[1].author_name, "User");
        assert_eq!(t.roots[1].author_picture, None);
    }

    #[test]
    fn vote_patches_only_the_target() {
        let mut t = tree(SAMPLE);
        assert!(t.apply_vote(CommentId(1), VoteResult { score: 5, voted: true }));
        let root = t.find(CommentId(1)).unwrap();
        assert_eq!((root.score, root.user_voted), (5, true));
        assert_eq!(t.find(CommentId(4)).unwrap().score, 4);
        assert_eq!(t.find(CommentId(2)).unwrap().score, 1);
        assert_eq!(t.find(CommentId(3)).unwrap().score, 9);
    }

    #[test]
    fn vote_reaches_replies() {
        let mut t = tree(SAMPLE);
        assert!(t.apply_vote(CommentId(3), VoteResult { score: 10, voted: true }));
        assert!(t.find(CommentId(3)).unwrap().user_voted);
        assert_eq!(t.find(CommentId(1)).unwrap().score, 4);
        assert!(!t.apply_vote(CommentId(99), VoteResult { score: 1, voted: true }));
    }

    #[test]
    fn sort_mode_parsing() {
        assert_eq!(SortMode::parse("new"), Ok(SortMode::New));
        assert_eq!(SortMode::default(), SortMode::Top);
        assert!(SortMode::parse("best").is_err());
        assert_eq!("12".parse::<CommentId>(), Ok(CommentId(12)));
    }
}
