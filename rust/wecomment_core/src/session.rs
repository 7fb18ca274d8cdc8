//! Auth session: bearer token plus the display profile decoded from it.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

use crate::config::TOKEN_KEY;
use crate::storage::{KeyValueStore, Scope};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserProfile {
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// `user` is only ever derived from `token`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthSession {
    token: Option<String>,
    user: Option<UserProfile>,
}

impl AuthSession {
    pub fn from_token(token: Option<String>) -> Self {
        let token = token.filter(|t| !t.trim().is_empty());
        let user = token.as_deref().and_then(decode_profile);
        Self { token, user }
    }

    pub fn token(&self) -> Option<&str> { self.token.as_deref() }
    pub fn user(&self) -> Option<&UserProfile> { self.user.as_ref() }
    pub fn is_signed_in(&self) -> bool { self.token.is_some() }
}

#[derive(Deserialize)]
struct Claims {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

/// Decode the payload segment of a signed token. The signature is not
/// checked here; the backend decides whether the token is valid.
pub fn decode_profile(token: &str) -> Option<UserProfile> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    Some(UserProfile { name: claims.name, picture: claims.picture })
}

/// Owns the persisted store and the single in-memory session.
#[derive(Debug)]
pub struct SessionStore<S: KeyValueStore> {
    store: S,
    session: AuthSession,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn load(store: S) -> Self {
        let session = AuthSession::from_token(store.get(Scope::Local, TOKEN_KEY));
        Self { store, session }
    }

    pub fn session(&self) -> &AuthSession { &self.session }
    pub fn store(&self) -> &S { &self.store }

    pub fn login(&mut self, token: &str) {
        self.store.set(Scope::Local, TOKEN_KEY, token);
        self.session = AuthSession::from_token(Some(token.to_string()));
        log::info!("signed in as {:?}", self.session.user().and_then(|u| u.name.as_deref()));
    }

    pub fn logout(&mut self) {
        self.store.remove(Scope::Local, TOKEN_KEY);
        self.session = AuthSession::default();
        log::info!("signed out");
    }

    /// Drop the session after the backend rejected the token.
    pub fn expire(&mut self) {
        if self.session.is_signed_in() {
            log::warn!("session rejected by backend, clearing token");
        }
        self.store.remove(Scope::Local, TOKEN_KEY);
        self.session = AuthSession::default();
    }
}

#[cfg(test)]
pub(crate) fn token_for(claims_json: &str) -> String {
    format!("eyJhbGciOiJIUzI1NiJ9.{}.sig", URL_SAFE_NO_PAD.encode(claims_json))
}
