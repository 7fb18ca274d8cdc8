//! Backend client: request descriptors for the REST contract and response
//! classification. Execution happens in the host binding.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

use crate::comments::{CommentId, SortMode};
use crate::config::HUB_LIMIT;
use crate::error::ApiError;
use crate::identity::ResourceIdentity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = Vec::new();
        if self.body.is_some() {
            headers.push(("Content-Type", "application/json".to_string()));
        }
        if let Some(token) = &self.bearer {
            headers.push(("Authorization", format!("Bearer {token}")));
        }
        headers
    }

    pub fn body_text(&self) -> Option<String> {
        self.body.as_ref().map(Value::to_string)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }
}

#[derive(Debug)]
pub enum Outcome<T> {
    Success(T),
    Unauthorized,
    Failure(ApiError),
}

/// Fold a transport result into exactly one outcome.
pub fn classify(result: Result<ApiResponse, String>) -> Outcome<String> {
    match result {
        Ok(resp) if (200..300).contains(&resp.status) => Outcome::Success(resp.body),
        Ok(resp) if resp.status == 401 => Outcome::Unauthorized,
        Ok(resp) => Outcome::Failure(ApiError::Status(resp.status)),
        Err(err) => Outcome::Failure(ApiError::Network(err)),
    }
}

// Wire shapes.

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WireUser {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WireComment {
    pub id: CommentId,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub parent_id: Option<CommentId>,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub user_voted: bool,
    #[serde(default)]
    pub user: Option<WireUser>,
    #[serde(default)]
    pub replies: Vec<WireComment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentsPage {
    #[serde(default)]
    pub comments: Vec<WireComment>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct VideoSummary {
    pub youtube_video_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub channel_title: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub comment_count: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoDirectory {
    #[serde(default)]
    pub videos: Vec<VideoSummary>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct VoteResult {
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub voted: bool,
}

pub fn decode<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, ApiError> {
    Ok(serde_json::from_str(body)?)
}

/// Stateless request builder bound to a backend origin and an optional token.
#[derive(Debug, Clone, Copy)]
pub struct BackendClient<'a> {
    base: &'a str,
    token: Option<&'a str>,
}

impl<'a> BackendClient<'a> {
    pub fn new(base: &'a str, token: Option<&'a str>) -> Self {
        Self { base, token }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(self.base)?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Endpoint(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, body: Option<Value>) -> ApiRequest {
        ApiRequest { method, url: url.into(), bearer: self.token.map(str::to_string), body }
    }

    /// Public routes go out without the token even when signed in.
    fn anonymous(&self, method: Method, url: Url) -> ApiRequest {
        ApiRequest { method, url: url.into(), bearer: None, body: None }
    }

    pub fn fetch_comments(&self, video: &ResourceIdentity, sort: SortMode) -> Result<ApiRequest, ApiError> {
        let mut url = self.endpoint(&["api", "videos", video.as_str(), "comments"])?;
        url.query_pairs_mut().append_pair("sort", sort.as_str());
        Ok(self.request(Method::Get, url, None))
    }

    pub fn post_comment(&self, video: &ResourceIdentity, text: &str, parent: Option<CommentId>) -> Result<ApiRequest, ApiError> {
        let url = self.endpoint(&["api", "videos", video.as_str(), "comments"])?;
        let body = match parent {
            Some(parent_id) => json!({ "text": text, "parent_id": parent_id }),
            None => json!({ "text": text }),
        };
        Ok(self.request(Method::Post, url, Some(body)))
    }

    pub fn toggle_vote(&self, comment: CommentId) -> Result<ApiRequest, ApiError> {
        let url = self.endpoint(&["api", "comments", &comment.to_string(), "vote"])?;
        Ok(self.request(Method::Post, url, None))
    }

    pub fn list_videos(&self) -> Result<ApiRequest, ApiError> {
        let mut url = self.endpoint(&["api", "videos"])?;
        url.query_pairs_mut()
            .append_pair("has_comments", "1")
            .append_pair("limit", &HUB_LIMIT.to_string());
        Ok(self.anonymous(Method::Get, url))
    }

    pub fn touch_video(&self, video: &ResourceIdentity, title: &str) -> Result<ApiRequest, ApiError> {
        let mut url = self.endpoint(&["api", "videos", video.as_str()])?;
        url.query_pairs_mut().append_pair("title", title);
        Ok(self.anonymous(Method::Get, url))
    }
}
