//! Slack Web API client.
//!
//! Covers the three methods the resource uses: `conversations.history`,
//! `conversations.replies` and `chat.postMessage`. Every call authenticates
//! with the source's bot token as a bearer header.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::chat::{ChatApi, HistoryQuery, Message};
use crate::error::TransportError;
use crate::message::OutMessage;

/// Default Slack Web API endpoint.
pub const SLACK_API_URL: &str = "https://slack.com/api";

/// Environment variable overriding [`SLACK_API_URL`].
pub const SLACK_API_URL_ENV: &str = "SLACK_API_URL";

/// Response envelope shared by the methods we call.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    messages: Vec<Message>,
    #[serde(default)]
    ts: Option<String>,
}

/// Slack Web API client bound to one bot token.
pub struct SlackClient {
    token: SecretString,
    base_url: String,
    client: reqwest::Client,
}

impl SlackClient {
    pub fn new(token: SecretString) -> Self {
        Self::with_base_url(token, SLACK_API_URL)
    }

    /// Client using `SLACK_API_URL` from the environment when set.
    pub fn from_env(token: SecretString) -> Self {
        match std::env::var(SLACK_API_URL_ENV) {
            Ok(url) if !url.is_empty() => Self::with_base_url(token, url),
            _ => Self::new(token),
        }
    }

    pub fn with_base_url(token: SecretString, base_url: impl Into<String>) -> Self {
        Self {
            token,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    async fn get(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<ApiResponse, TransportError> {
        let request = self
            .client
            .get(self.api_url(method))
            .bearer_auth(self.token.expose_secret())
            .query(params);
        self.send(method, request).await
    }

    async fn send(
        &self,
        method: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<ApiResponse, TransportError> {
        let resp = request.send().await.map_err(|e| TransportError::Http {
            method: method.into(),
            reason: e.to_string(),
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Http {
                method: method.into(),
                reason: format!("status {status}: {body}"),
            });
        }

        let parsed: ApiResponse = resp
            .json()
            .await
            .map_err(|e| TransportError::InvalidResponse {
                method: method.into(),
                reason: e.to_string(),
            })?;

        if !parsed.ok {
            return Err(TransportError::Api {
                method: method.into(),
                error: parsed.error.unwrap_or_else(|| "unknown_error".into()),
            });
        }

        Ok(parsed)
    }
}

/// Query parameters for `conversations.history`.
fn history_params(channel_id: &str, query: &HistoryQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![("channel", channel_id.to_string())];
    if let Some(oldest) = &query.oldest {
        params.push(("oldest", oldest.clone()));
    }
    if let Some(latest) = &query.latest {
        params.push(("latest", latest.clone()));
    }
    if query.inclusive {
        params.push(("inclusive", "true".into()));
    }
    params.push(("limit", query.limit.to_string()));
    params
}

#[async_trait]
impl ChatApi for SlackClient {
    async fn fetch_history(
        &self,
        channel_id: &str,
        query: &HistoryQuery,
    ) -> Result<Vec<Message>, TransportError> {
        let params = history_params(channel_id, query);
        let resp = self.get("conversations.history", &params).await?;
        tracing::debug!(
            channel = channel_id,
            count = resp.messages.len(),
            "Fetched channel history"
        );
        Ok(resp.messages)
    }

    async fn fetch_replies(
        &self,
        channel_id: &str,
        root_ts: &str,
    ) -> Result<Vec<Message>, TransportError> {
        let params = [("channel", channel_id.to_string()), ("ts", root_ts.to_string())];
        let resp = self.get("conversations.replies", &params).await?;
        tracing::debug!(
            channel = channel_id,
            root = root_ts,
            count = resp.messages.len(),
            "Fetched thread replies"
        );
        Ok(resp.messages)
    }

    async fn post_message(
        &self,
        channel_id: &str,
        message: &OutMessage,
    ) -> Result<String, TransportError> {
        const METHOD: &str = "chat.postMessage";

        let body = message
            .to_post_body(channel_id)
            .map_err(|e| TransportError::Encode {
                method: METHOD.into(),
                reason: e.to_string(),
            })?;

        let request = self
            .client
            .post(self.api_url(METHOD))
            .bearer_auth(self.token.expose_secret())
            .json(&body);
        let resp = self.send(METHOD, request).await?;

        resp.ts
            .filter(|ts| !ts.is_empty())
            .ok_or_else(|| TransportError::InvalidResponse {
                method: METHOD.into(),
                reason: "response has no ts".into(),
            })
    }
}
