mod auth;
mod phase_store;
mod tables;

pub(crate) use phase_store::PhaseStore;
pub(crate) use tables::{non_empty, NewComment, NewPhase, NewProject};

use crate::models::Session;
use crate::storage::{clear_auth_storage, load_session_from_storage, save_session_to_storage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub(crate) enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Permission denied: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request failed ({status}): {body}")]
    Http { status: u16, body: String },
    #[error("Unexpected response: {0}")]
    Parse(String),
    /// Rejected locally before any request was made.
    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self::Parse(e.to_string())
    }

    pub(crate) fn validation(msg: &str) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Map a non-success status; `body` is the raw response text.
    fn from_status(status: u16, body: &str) -> Self {
        let message = error_message(body);
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden(message),
            // PostgREST answers 406 when a single-object request matches no rows.
            404 | 406 => Self::NotFound(message),
            _ => Self::Http {
                status,
                body: message,
            },
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// Pull the human-readable part out of an auth/PostgREST error body.
fn error_message(body: &str) -> String {
    let Ok(v) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };

    ["msg", "message", "error_description", "error"]
        .iter()
        .find_map(|k| v.get(*k).and_then(|m| m.as_str()))
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct EnvConfig {
    pub supabase_url: String,
    pub anon_key: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        let mut config = Self {
            supabase_url: "http://localhost:54321".to_string(),
            anon_key: String::new(),
        };

        // We support BOTH `window.ENV.SUPABASE_URL` (upper-case, documented) and
        // lower-case keys for compatibility with older deploy scripts.
        if let Some(env) = web_sys::window().and_then(|w| w.get("ENV")) {
            if !env.is_undefined() && env.is_object() {
                if let Some(url) = env_string(&env, &["SUPABASE_URL", "supabase_url"]) {
                    config.supabase_url = url.trim_end_matches('/').to_string();
                }
                if let Some(key) = env_string(&env, &["SUPABASE_ANON_KEY", "supabase_anon_key"]) {
                    config.anon_key = key;
                }
            }
        }

        config
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn env_string(env: &js_sys::Object, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| {
        js_sys::Reflect::get(env, &(*k).into())
            .ok()
            .and_then(|v| v.as_string())
    })
}

/// Client for the hosted backend: auth, REST tables and object storage.
#[derive(Clone)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
    pub(crate) anon_key: String,
    pub(crate) session: Option<Session>,
}

impl ApiClient {
    pub fn new(config: EnvConfig) -> Self {
        Self {
            base_url: config.supabase_url,
            anon_key: config.anon_key,
            session: None,
        }
    }

    pub fn load_from_storage() -> Self {
        let mut client = Self::new(EnvConfig::new());
        client.session = load_session_from_storage();
        client
    }

    pub fn save_to_storage(&self) {
        if let Some(session) = &self.session {
            save_session_to_storage(session);
        }
    }

    pub fn set_session(&mut self, session: Session) {
        self.session = Some(session);
    }

    pub fn user_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.user.id.as_str())
    }

    pub fn user_email(&self) -> Option<&str> {
        self.session.as_ref().and_then(|s| s.user.email.as_deref())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Drop the local session. Server-side sign-out is `sign_out`.
    pub fn logout(&mut self) {
        self.session = None;
        clear_auth_storage();
    }

    fn auth_header(&self) -> String {
        let token = self
            .session
            .as_ref()
            .map(|s| s.access_token.as_str())
            .unwrap_or(&self.anon_key);
        format!("Bearer {token}")
    }

    fn builder(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        reqwest::Client::new()
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header("Authorization", self.auth_header())
    }

    async fn execute(req: reqwest::RequestBuilder) -> ApiResult<reqwest::Response> {
        let res = req.send().await.map_err(ApiError::network)?;
        if res.status().is_success() {
            return Ok(res);
        }

        let status = res.status().as_u16();
        let body = res.text().await.unwrap_or_default();
        let err = ApiError::from_status(status, &body);
        tracing::warn!(status, error = %err, "backend request failed");
        Err(err)
    }

    async fn json<T: serde::de::DeserializeOwned>(req: reqwest::RequestBuilder) -> ApiResult<T> {
        Self::execute(req).await?.json().await.map_err(ApiError::parse)
    }

    fn rest_path(table: &str) -> String {
        format!("/rest/v1/{table}")
    }

    async fn rest_select<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> ApiResult<Vec<T>> {
        let req = self
            .builder(reqwest::Method::GET, &Self::rest_path(table))
            .query(query);
        Self::json(req).await
    }

    /// First row of a filtered select; `NotFound` when nothing matches.
    async fn rest_select_one<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        self.rest_select(table, query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::NotFound(table.to_string()))
    }

    async fn rest_insert<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        body: &impl Serialize,
    ) -> ApiResult<Vec<T>> {
        let req = self
            .builder(reqwest::Method::POST, &Self::rest_path(table))
            .header("Prefer", "return=representation")
            .json(body);
        Self::json(req).await
    }

    /// Returns the rows that were changed; row-level security filters out
    /// rows the caller may not write, so an empty result means "not allowed".
    async fn rest_update<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
        body: &impl Serialize,
    ) -> ApiResult<Vec<T>> {
        let req = self
            .builder(reqwest::Method::PATCH, &Self::rest_path(table))
            .query(query)
            .header("Prefer", "return=representation")
            .json(body);
        Self::json(req).await
    }

    async fn rest_delete(&self, table: &str, query: &[(&str, String)]) -> ApiResult<()> {
        let req = self
            .builder(reqwest::Method::DELETE, &Self::rest_path(table))
            .query(query);
        Self::execute(req).await.map(|_| ())
    }
}

/// PostgREST equality filter value.
pub(crate) fn eq(v: &str) -> String {
    format!("eq.{v}")
}
