//! Local sign-in with opaque bearer tokens.
//!
//! No identity provider is contacted. Signing in mints a random token, keeps it
//! in a `TokenStore` and mirrors it into the `auth_token` cookie that the route
//! guard checks.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use azdraft_core::settings::{data_dir, write_atomic};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{SessionError, SIGN_IN_ROUTE};

pub const AUTH_COOKIE: &str = "auth_token";
const TOKEN_FILE: &str = "auth.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Provider {
    Google,
    Microsoft,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub provider: Provider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl User {
    /// The single local profile every sign-in resolves to.
    pub fn local(provider: Provider) -> Self {
        Self {
            id: "1".to_string(),
            name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
            provider,
            avatar: Some("https://api.dicebear.com/7.x/avataaars/svg?seed=John".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthToken {
    pub token: String,
    pub provider: Provider,
    pub issued_at: DateTime<Utc>,
}

/// Live result of a sign-in. Dropped on sign-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    pub user: User,
    pub token: AuthToken,
}

/// Client-local storage for the bearer token.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<AuthToken>, SessionError>;
    fn save(&self, token: &AuthToken) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<AuthToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<AuthToken>, SessionError> {
        Ok(self.token.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, token: &AuthToken) -> Result<(), SessionError> {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

/// Token kept as JSON under the data directory.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(TOKEN_FILE),
        }
    }

    /// `~/.azdraft/auth.json`
    pub fn in_data_dir() -> Self {
        Self::new(&data_dir())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<AuthToken>, SessionError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        match serde_json::from_str(&raw) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "discarding unreadable auth token");
                Ok(None)
            }
        }
    }

    fn save(&self, token: &AuthToken) -> Result<(), SessionError> {
        let json = serde_json::to_string_pretty(token)?;
        write_atomic(&self.path, &json)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Cookies visible to route checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: HashMap<String, String>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    pub fn remove(&mut self, name: &str) {
        self.cookies.remove(name);
    }
}

pub trait AuthProvider: Send + Sync {
    fn current_user(&self) -> Option<User>;
    fn sign_in(&self, provider: Provider) -> Result<UserSession, SessionError>;
    fn sign_out(&self) -> Result<(), SessionError>;
    fn cookies(&self) -> CookieJar;
}

pub struct LocalAuth {
    tokens: Box<dyn TokenStore>,
    cookies: Mutex<CookieJar>,
    session: Mutex<Option<UserSession>>,
}

impl LocalAuth {
    /// Restores the cookie from a token left by an earlier run.
    pub fn new(tokens: Box<dyn TokenStore>) -> Self {
        let mut jar = CookieJar::new();
        let mut session = None;
        match tokens.load() {
            Ok(Some(token)) => {
                jar.set(AUTH_COOKIE, &token.token);
                session = Some(UserSession {
                    user: User::local(token.provider),
                    token,
                });
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "could not restore auth token"),
        }
        Self {
            tokens,
            cookies: Mutex::new(jar),
            session: Mutex::new(session),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryTokenStore::new()))
    }

    pub fn session(&self) -> Option<UserSession> {
        self.session.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl AuthProvider for LocalAuth {
    fn current_user(&self) -> Option<User> {
        match self.tokens.load() {
            Ok(Some(token)) => Some(User::local(token.provider)),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "auth token unavailable");
                None
            }
        }
    }

    fn sign_in(&self, provider: Provider) -> Result<UserSession, SessionError> {
        let token = AuthToken {
            token: Uuid::new_v4().simple().to_string(),
            provider,
            issued_at: Utc::now(),
        };
        self.tokens.save(&token)?;
        self.cookies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .set(AUTH_COOKIE, &token.token);

        let session = UserSession {
            user: User::local(provider),
            token,
        };
        *self.session.lock().unwrap_or_else(|e| e.into_inner()) = Some(session.clone());
        tracing::info!(provider = ?provider, "signed in");
        Ok(session)
    }

    fn sign_out(&self) -> Result<(), SessionError> {
        self.tokens.clear()?;
        self.cookies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(AUTH_COOKIE);
        *self.session.lock().unwrap_or_else(|e| e.into_inner()) = None;
        tracing::info!("signed out");
        Ok(())
    }

    fn cookies(&self) -> CookieJar {
        self.cookies.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(&'static str),
}

/// `/chat` and everything below it requires the auth cookie.
pub fn guard_route(path: &str, cookies: &CookieJar) -> RouteDecision {
    let is_chat = path == "/chat" || path.starts_with("/chat/");
    if is_chat && cookies.get(AUTH_COOKIE).is_none() {
        RouteDecision::Redirect(SIGN_IN_ROUTE)
    } else {
        RouteDecision::Allow
    }
}
