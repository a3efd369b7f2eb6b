//! The single chokepoint for outgoing backend calls.
//!
//! [`Gateway::send`] resolves the URL under the canonical `/api` prefix,
//! attaches `Authorization: Bearer <token>` when the [`Session`] holds one,
//! enforces the per-call timeout and classifies the outcome with
//! [`classify`]. Failures are logged here and returned to the caller; there
//! are no retries.

pub mod envelope;
pub mod error;
pub mod request;

pub use envelope::{Envelope, Payload, classify};
pub use error::{GatewayError, StatusKind};
pub use request::{Body, FormPart, Method, RequestDescriptor, ResponseKind};

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{Instrument, debug, error, info_span, warn};
use url::Url;

use crate::config::ClientSettings;
use crate::consts::API_PREFIX;
use crate::events::{Event, EventBus};
use crate::session::Session;

/// What the gateway does when the backend answers 401.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnauthorizedPolicy {
    /// End the session and emit [`Event::SessionExpired`], then fail.
    #[default]
    ClearSession,
    /// Log and fail; the caller decides.
    Propagate,
}

impl fmt::Display for UnauthorizedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClearSession => f.write_str("clear-session"),
            Self::Propagate => f.write_str("propagate"),
        }
    }
}

impl FromStr for UnauthorizedPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clear-session" | "clear_session" | "clear" => Ok(Self::ClearSession),
            "propagate" => Ok(Self::Propagate),
            other => bail!("unknown unauthorized policy: {other}"),
        }
    }
}

/// Backend origin plus the canonical path prefix.
#[derive(Debug, Clone)]
pub struct ApiBase {
    origin: String,
    prefix: String,
}

impl ApiBase {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut parsed = Url::parse(base_url.trim())
            .with_context(|| format!("invalid base URL: {base_url}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("unsupported scheme in base URL: {}", parsed.scheme());
        }
        // A base that already ends in the prefix would get it twice.
        let path = parsed.path().trim_end_matches('/').to_string();
        if let Some(rest) = path.strip_suffix(API_PREFIX) {
            debug!(base_url, "dropping trailing {API_PREFIX} from base URL");
            parsed.set_path(rest);
        }
        Ok(Self {
            origin: parsed.as_str().trim_end_matches('/').to_string(),
            prefix: API_PREFIX.to_string(),
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Canonical form of a resource path: always rooted under the prefix.
    /// Paths already carrying the prefix are left alone, never stripped.
    pub fn canonical_path(&self, path: &str) -> String {
        let path = path.trim();
        let rooted = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        let already_prefixed = rooted == self.prefix
            || rooted
                .strip_prefix(&self.prefix)
                .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('?'));

        if already_prefixed {
            rooted
        } else {
            format!("{}{}", self.prefix, rooted)
        }
    }

    /// Full URL for a descriptor path and its query pairs.
    pub fn url_for(&self, path: &str, query: &[(String, String)]) -> Result<Url, GatewayError> {
        let joined = format!("{}{}", self.origin, self.canonical_path(path));
        let mut url = Url::parse(&joined)
            .map_err(|e| GatewayError::InvalidRequest(format!("bad URL {joined}: {e}")))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

/// Outgoing-call chokepoint shared by every resource wrapper.
pub struct Gateway {
    client: reqwest::Client,
    base: ApiBase,
    session: Arc<Session>,
    events: Arc<EventBus>,
    on_unauthorized: UnauthorizedPolicy,
}

impl Gateway {
    pub fn new(
        settings: &ClientSettings,
        session: Arc<Session>,
        events: Arc<EventBus>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base: ApiBase::new(&settings.base_url)?,
            session,
            events,
            on_unauthorized: settings.on_unauthorized,
        })
    }

    pub fn base(&self) -> &ApiBase {
        &self.base
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Issue one call and resolve to the unwrapped payload.
    pub async fn send(&self, request: RequestDescriptor) -> Result<Payload, GatewayError> {
        let url = self.base.url_for(&request.path, &request.query)?;
        let span = info_span!(
            "gateway.send",
            http.method = %request.method,
            url = %url
        );
        self.dispatch(request, url).instrument(span).await
    }

    /// [`send`](Self::send), then deserialize the JSON payload.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestDescriptor,
    ) -> Result<T, GatewayError> {
        let value = self.send(request).await?.into_json()?;
        serde_json::from_value(value).map_err(|e| GatewayError::Decode(e.to_string()))
    }

    /// [`send`](Self::send) for calls that return raw bytes.
    pub async fn send_blob(&self, request: RequestDescriptor) -> Result<Vec<u8>, GatewayError> {
        Ok(self.send(request.expect_blob()).await?.into_bytes())
    }

    async fn dispatch(&self, request: RequestDescriptor, url: Url) -> Result<Payload, GatewayError> {
        let token = self.session.token();
        let headers = build_headers(&request, token.as_deref())?;

        let mut builder = self
            .client
            .request(request.method.into(), url)
            .headers(headers);

        builder = match request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::Multipart(parts) => builder.multipart(build_form(parts)?),
        };

        let response = builder.send().await.map_err(|e| {
            let err = GatewayError::from_transport(&e);
            self.report(&err);
            err
        })?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| {
            let err = GatewayError::from_transport(&e);
            self.report(&err);
            err
        })?;
        debug!(status, bytes = body.len(), "response received");

        classify(status, &body, request.expect).map_err(|err| {
            self.report(&err);
            if err.is_unauthorized()
                && let Some(sent) = &token
            {
                self.handle_unauthorized(sent);
            }
            err
        })
    }

    /// Clear the session for the token the backend rejected. Concurrent
    /// rejections of the same token end it and notify once.
    fn handle_unauthorized(&self, sent: &str) {
        if self.on_unauthorized != UnauthorizedPolicy::ClearSession {
            return;
        }
        match self.session.end_if_current(sent) {
            Ok(true) => {
                warn!("stored credential rejected, session cleared");
                self.events.emit(Event::SessionExpired);
            }
            Ok(false) => debug!("rejected credential already replaced or cleared"),
            Err(e) => warn!(error = %e, "failed to clear rejected credential"),
        }
    }

    /// Boundary log for every failure class.
    fn report(&self, err: &GatewayError) {
        match err {
            GatewayError::Network { timed_out: true, .. } => {
                error!(%err, "request timed out")
            }
            GatewayError::Network { .. } => {
                error!(%err, "network error, check the connection")
            }
            GatewayError::HttpStatus { status, kind, .. } => match kind {
                StatusKind::Unauthorized => warn!(status, "unauthorized, sign in again"),
                StatusKind::Forbidden => warn!(status, "access denied"),
                StatusKind::NotFound => warn!(status, "requested resource does not exist"),
                StatusKind::ServerError => error!(status, "internal server error"),
                StatusKind::Other => warn!(status, "connection error"),
            },
            GatewayError::Api { code, message } => warn!(code, %message, "request rejected"),
            GatewayError::Decode(_) | GatewayError::InvalidRequest(_) => {
                warn!(%err, "request failed")
            }
        }
    }
}

/// Headers for one call. Overrides replace defaults; the credential is
/// applied last and cannot be overridden.
fn build_headers(request: &RequestDescriptor, token: Option<&str>) -> Result<HeaderMap, GatewayError> {
    let mut headers = HeaderMap::new();
    let is_multipart = matches!(request.body, Body::Multipart(_));

    if !is_multipart {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    for (name, value) in &request.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| GatewayError::InvalidRequest(format!("bad header name {name}: {e}")))?;
        if name == AUTHORIZATION || (is_multipart && name == CONTENT_TYPE) {
            continue;
        }
        let value = HeaderValue::from_str(value)
            .map_err(|e| GatewayError::InvalidRequest(format!("bad header value: {e}")))?;
        headers.insert(name, value);
    }

    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| GatewayError::InvalidRequest("stored token is not a valid header".to_string()))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}

fn build_form(parts: Vec<FormPart>) -> Result<reqwest::multipart::Form, GatewayError> {
    let mut form = reqwest::multipart::Form::new();
    for part in parts {
        let mut body = reqwest::multipart::Part::bytes(part.bytes);
        if let Some(file_name) = part.file_name {
            body = body.file_name(file_name);
        }
        if let Some(content_type) = part.content_type {
            body = body
                .mime_str(&content_type)
                .map_err(|e| GatewayError::InvalidRequest(format!("bad content type: {e}")))?;
        }
        form = form.part(part.name, body);
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ApiBase {
        ApiBase::new("http://localhost:8080").unwrap()
    }

    #[test]
    fn canonical_path_adds_prefix_once() {
        let base = base();
        assert_eq!(base.canonical_path("/task/pending"), "/api/task/pending");
        assert_eq!(base.canonical_path("task/pending"), "/api/task/pending");
        assert_eq!(base.canonical_path("/api/task/pending"), "/api/task/pending");
        assert_eq!(base.canonical_path("/api"), "/api");
    }

    #[test]
    fn canonical_path_does_not_confuse_lookalike_prefixes() {
        assert_eq!(base().canonical_path("/apiary/list"), "/api/apiary/list");
    }

    #[test]
    fn url_for_appends_query() {
        let url = base()
            .url_for(
                "/api/task/pending",
                &[("userId".to_string(), "zhang san".to_string())],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/task/pending?userId=zhang+san"
        );
    }

    #[test]
    fn base_url_keeps_sub_path_and_drops_trailing_slash() {
        let base = ApiBase::new("https://flow.example.com/backend/").unwrap();
        assert_eq!(base.origin(), "https://flow.example.com/backend");
        let url = base.url_for("/auth/me", &[]).unwrap();
        assert_eq!(url.as_str(), "https://flow.example.com/backend/api/auth/me");
    }

    #[test]
    fn base_url_ending_in_prefix_is_not_doubled() {
        for raw in [
            "http://localhost:8080/api",
            "http://localhost:8080/api/",
        ] {
            let base = ApiBase::new(raw).unwrap();
            assert_eq!(base.origin(), "http://localhost:8080");
            let url = base.url_for("/api/task/pending", &[]).unwrap();
            assert_eq!(url.as_str(), "http://localhost:8080/api/task/pending");
        }

        let base = ApiBase::new("https://flow.example.com/backend/api").unwrap();
        let url = base.url_for("/task/pending", &[]).unwrap();
        assert_eq!(url.as_str(), "https://flow.example.com/backend/api/task/pending");
    }

    #[test]
    fn base_url_only_strips_a_whole_prefix_segment() {
        let base = ApiBase::new("http://api:8080/openapi").unwrap();
        assert_eq!(base.origin(), "http://api:8080/openapi");
    }

    #[test]
    fn base_url_rejects_other_schemes() {
        assert!(ApiBase::new("ftp://example.com").is_err());
        assert!(ApiBase::new("not a url").is_err());
    }

    #[test]
    fn headers_attach_bearer_when_token_present() {
        let req = RequestDescriptor::get("/api/auth/me");
        let headers = build_headers(&req, Some("abc")).unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn headers_omit_authorization_without_token() {
        let req = RequestDescriptor::get("/api/auth/me");
        let headers = build_headers(&req, None).unwrap();
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn override_cannot_replace_credential() {
        let req = RequestDescriptor::get("/api/auth/me").header("Authorization", "Bearer forged");
        let headers = build_headers(&req, Some("real")).unwrap();
        assert_eq!(headers.get_all(AUTHORIZATION).iter().count(), 1);
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer real");

        let headers = build_headers(&req, None).unwrap();
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn multipart_leaves_content_type_to_the_form() {
        let req = RequestDescriptor::post("/api/process-definition/upload")
            .multipart(vec![FormPart::text("name", "x")])
            .header("Content-Type", "multipart/form-data");
        let headers = build_headers(&req, None).unwrap();
        assert!(headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn overrides_replace_defaults() {
        let req = RequestDescriptor::get("/api/process-definition/1/xml")
            .header("Content-Type", "application/xml");
        let headers = build_headers(&req, None).unwrap();
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/xml");
    }

    #[test]
    fn policy_round_trips_through_strings() {
        assert_eq!(
            "clear-session".parse::<UnauthorizedPolicy>().unwrap(),
            UnauthorizedPolicy::ClearSession
        );
        assert_eq!(
            "PROPAGATE".parse::<UnauthorizedPolicy>().unwrap(),
            UnauthorizedPolicy::Propagate
        );
        assert!("redirect".parse::<UnauthorizedPolicy>().is_err());
        assert_eq!(UnauthorizedPolicy::default().to_string(), "clear-session");
    }
}
