use super::session_cache::{self, FileSessionStore, SessionStore};
use super::{AuthOutcome, IdentityProvider};
use crate::error::{BmxError, Result};
use crate::models::{AppDetail, CachedSession, MfaFactor};
use crate::saml;
use chrono::{DateTime, Utc};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::COOKIE;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const REQUEST_TIMEOUT_SECONDS: u64 = 30;
const STATUS_MFA_REQUIRED: &str = "MFA_REQUIRED";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    #[serde(default)]
    error_summary: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    #[serde(default)]
    status: String,
    session_token: Option<String>,
    state_token: Option<String>,
    #[serde(rename = "_embedded", default)]
    embedded: AuthResponseEmbedded,
}

#[derive(Debug, Default, Deserialize)]
struct AuthResponseEmbedded {
    #[serde(default)]
    factors: Vec<AuthFactor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthFactor {
    factor_type: String,
    #[serde(rename = "_links")]
    links: AuthFactorLinks,
}

#[derive(Debug, Deserialize)]
struct AuthFactorLinks {
    verify: Link,
}

#[derive(Debug, Deserialize)]
struct Link {
    href: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    id: String,
    user_id: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    id: String,
}

/// Okta authentication API client
pub struct OktaClient {
    http_client: Client,
    base_url: Url,
    store: Box<dyn SessionStore>,
    session_id: Option<String>,
    state_token: Option<String>,
    factors: Vec<MfaFactor>,
}

impl OktaClient {
    pub fn new(org: &str) -> Result<Self> {
        let base_url = Url::parse(&format!("https://{}.okta.com/api/v1/", org)).map_err(|e| {
            BmxError::ConfigError(format!("Invalid Okta organization '{}': {}", org, e))
        })?;

        Self::with_store(base_url, Box::new(FileSessionStore::new(org)?))
    }

    pub fn with_store(base_url: Url, store: Box<dyn SessionStore>) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
            .build()?;

        Ok(Self {
            http_client,
            base_url,
            store,
            session_id: None,
            state_token: None,
            factors: Vec::new(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| BmxError::IdentityProvider(format!("Invalid Okta URL '{}': {}", path, e)))
    }

    /// Attach the session cookie, if one has been established
    fn with_session(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.session_id {
            Some(sid) => request.header(COOKIE, format!("sid={}", sid)),
            None => request,
        }
    }

    fn start_session(&mut self, username: &str, session_token: &str) -> Result<String> {
        let url = self.endpoint("sessions")?;
        tracing::debug!("Starting Okta session at {}", url);

        let response = self
            .http_client
            .post(url)
            .json(&json!({ "sessionToken": session_token }))
            .send()?;
        let session: SessionResponse = check(response)?.json()?;

        self.session_id = Some(session.id.clone());

        let cached = CachedSession {
            username: username.to_string(),
            session_id: session.id,
            expires_at: session.expires_at,
        };
        if let Err(e) = session_cache::remember(self.store.as_ref(), cached) {
            tracing::warn!("Failed to cache Okta session: {}", e);
        }

        Ok(session.user_id)
    }

    fn current_user(&self) -> Result<String> {
        let url = self.endpoint("users/me")?;
        let response = self.with_session(self.http_client.get(url)).send()?;
        let me: MeResponse = check(response)?.json()?;
        Ok(me.id)
    }
}

/// Turn a non-success response into an error carrying Okta's summary
fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text()?;
    tracing::debug!("Okta error response ({}): {}", status, body);

    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(error) if !error.error_summary.is_empty() => Err(BmxError::IdentityProvider(format!(
            "{}. Response code: \"{}\"",
            error.error_summary, status
        ))),
        _ => Err(BmxError::IdentityProvider(format!(
            "Received invalid response from okta.\nResponse code: \"{}\"\nBody: {}",
            status, body
        ))),
    }
}

impl IdentityProvider for OktaClient {
    fn authenticate(&mut self, username: &str, password: &str) -> Result<AuthOutcome> {
        self.state_token = None;
        self.factors.clear();

        let url = self.endpoint("authn")?;
        tracing::debug!("Authenticating {} against {}", username, url);

        let response = self
            .http_client
            .post(url)
            .json(&json!({ "username": username, "password": password }))
            .send()?;
        let auth: AuthResponse = check(response)?.json()?;
        tracing::debug!("authn status: {}", auth.status);

        if auth.status == STATUS_MFA_REQUIRED {
            self.state_token = auth.state_token;
            self.factors = auth
                .embedded
                .factors
                .into_iter()
                .map(|f| MfaFactor {
                    factor: f.factor_type,
                    url: f.links.verify.href,
                })
                .collect();
            return Ok(AuthOutcome::MfaRequired);
        }

        let session_token = auth.session_token.ok_or_else(|| {
            BmxError::IdentityProvider(format!(
                "Okta authentication did not complete (status: {})",
                auth.status
            ))
        })?;

        self.start_session(username, &session_token)
            .map(AuthOutcome::Authenticated)
    }

    fn authenticate_from_cache(&mut self, username: &str) -> Result<Option<String>> {
        let sessions = match self.store.sessions() {
            Ok(sessions) => sessions,
            Err(e) => {
                tracing::warn!("Ignoring unreadable session cache: {}", e);
                return Ok(None);
            }
        };

        let Some(session) = session_cache::lookup(&sessions, username, Utc::now()) else {
            tracing::debug!("No cached session for {}", username);
            return Ok(None);
        };

        let session_id = session.session_id.clone();
        self.session_id = Some(session_id.clone());

        match self.current_user() {
            Ok(user_id) => {
                tracing::debug!("Resumed cached session for {}", username);
                Ok(Some(user_id))
            }
            Err(e) => {
                self.session_id = None;
                if let Err(cache_err) = session_cache::forget(self.store.as_ref(), &session_id) {
                    tracing::warn!("Failed to evict cached Okta session: {}", cache_err);
                }
                Err(e)
            }
        }
    }

    fn complete_mfa(&mut self, username: &str, factor_url: &str, code: &str) -> Result<String> {
        let state_token = self.state_token.clone().unwrap_or_default();

        let response = self
            .http_client
            .post(factor_url)
            .json(&json!({ "stateToken": state_token }))
            .send()?;
        let challenge: AuthResponse = check(response)?.json()?;
        let state_token = challenge.state_token.unwrap_or(state_token);

        let response = self
            .http_client
            .post(factor_url)
            .json(&json!({ "stateToken": state_token, "passCode": code }))
            .send()?;
        let verified: AuthResponse = check(response)?.json()?;

        let session_token = verified.session_token.ok_or_else(|| {
            BmxError::IdentityProvider(format!(
                "MFA verification failed (status: {})",
                verified.status
            ))
        })?;

        self.state_token = None;
        self.start_session(username, &session_token)
    }

    fn mfa_factors(&self) -> Result<Vec<MfaFactor>> {
        Ok(self.factors.clone())
    }

    fn list_applications(&self, user_id: &str) -> Result<Vec<AppDetail>> {
        let url = self.endpoint(&format!("users/{}/appLinks", user_id))?;
        let response = self.with_session(self.http_client.get(url)).send()?;
        let apps: Vec<AppDetail> = check(response)?.json()?;

        tracing::debug!("Found {} linked application(s)", apps.len());
        Ok(apps)
    }

    fn saml(&self, app: &AppDetail) -> Result<String> {
        tracing::debug!("Fetching SAML assertion from {}", app.link_url);

        let response = self
            .with_session(self.http_client.get(&app.link_url))
            .send()?;
        let body = check(response)?.text()?;

        saml::saml_response_from_html(&body)
    }
}
