//! Authenticated request helper for the Toggl REST API.
//!
//! Every adapter in the gateway funnels through [`TogglClient::send`]: attach
//! Basic auth, send JSON, fail on any non-2xx status, and hand the decoded body
//! back unchanged. There are no retries and no timeouts beyond reqwest's
//! defaults.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method};
use serde_json::{json, Value};

use super::api::{ApiBase, ApiSurface};
use super::auth::Credentials;
use super::error::TogglError;
use crate::config::TogglConfig;
use crate::util::sanitize_api_error;

/// A single upstream call.
#[derive(Debug, Clone, PartialEq)]
pub struct TogglRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
    pub query: Vec<(String, String)>,
    /// Overrides the client's default `User-Agent` for this call only.
    pub user_agent: Option<String>,
}

impl TogglRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            query: Vec::new(),
            user_agent: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a query pair only when the value is present.
    pub fn with_optional_query<T: ToString>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.with_query(key, value),
            None => self,
        }
    }

    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }
}

/// Shared HTTP client bound to one set of credentials and base URLs.
pub struct TogglClient {
    http: Client,
    credentials: Option<Credentials>,
    api: ApiBase,
    user_agent: String,
}

impl TogglClient {
    pub fn new(credentials: Option<Credentials>, api: ApiBase, user_agent: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            credentials,
            api,
            user_agent: user_agent.into(),
        }
    }

    pub fn from_config(config: &TogglConfig) -> Self {
        let credentials = Credentials::resolve(
            config.api_token.as_deref(),
            config.email.as_deref(),
            config.password.as_deref(),
        );
        Self::new(
            credentials,
            ApiBase::from_config(&config.endpoints),
            config.user_agent.clone(),
        )
    }

    pub fn api(&self) -> &ApiBase {
        &self.api
    }

    /// Convenience for `self.api().url(surface, path)`.
    pub fn url(&self, surface: ApiSurface, path: &str) -> String {
        self.api.url(surface, path)
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// `make_request(method, url, body?, query?)`: the one helper every
    /// resource and tool uses.
    pub async fn make_request(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
        query: Option<&[(&str, String)]>,
    ) -> Result<Value, TogglError> {
        let mut request = TogglRequest::new(method, url);
        request.body = body;
        if let Some(query) = query {
            request.query = query
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect();
        }
        self.send(request).await
    }

    pub async fn send(&self, request: TogglRequest) -> Result<Value, TogglError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(TogglError::MissingCredentials)?;

        let url = reqwest::Url::parse(&request.url).map_err(|e| TogglError::InvalidUrl {
            url: request.url.clone(),
            reason: e.to_string(),
        })?;

        let user_agent = request.user_agent.as_deref().unwrap_or(&self.user_agent);
        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .header(AUTHORIZATION, credentials.authorization_header())
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, user_agent);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        // An empty object body is the same as no body.
        if let Some(body) = request.body.as_ref().filter(|b| !is_empty_object(b)) {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(method = %request.method, url = %request.url, "Toggl request failed: {e}");
            TogglError::Transport(e)
        })?;

        let status = response.status();
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            status = status.as_u16(),
            "Toggl request completed"
        );

        let text = response.text().await.map_err(TogglError::Transport)?;

        if !status.is_success() {
            let secrets = credentials.secrets();
            let secret_refs: Vec<&str> = secrets.iter().map(String::as_str).collect();
            let body = sanitize_api_error(&text, &secret_refs);
            tracing::warn!(
                method = %request.method,
                url = %request.url,
                status = status.as_u16(),
                "Toggl API rejected request"
            );
            return Err(TogglError::Api { status, body });
        }

        parse_body(&text)
    }
}

fn is_empty_object(value: &Value) -> bool {
    value.as_object().is_some_and(serde_json::Map::is_empty)
}

/// Decode a successful response body; an empty body is the success sentinel.
pub fn parse_body(text: &str) -> Result<Value, TogglError> {
    if text.trim().is_empty() {
        return Ok(json!({"status": "success"}));
    }
    serde_json::from_str(text).map_err(TogglError::Decode)
}
