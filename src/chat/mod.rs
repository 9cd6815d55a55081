//! Chat API capability.
//!
//! The resource directions only talk to the chat platform through the
//! [`ChatApi`] trait, so tests can substitute an in-memory implementation.

pub mod slack;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::message::OutMessage;

pub use slack::SlackClient;

/// A channel message as returned by the history and replies endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub ts: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub bot_id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub thread_ts: String,
    #[serde(default)]
    pub reply_count: u32,
}

impl Message {
    /// A message inside a thread that is not the thread's root.
    pub fn is_reply(&self) -> bool {
        !self.thread_ts.is_empty() && self.thread_ts != self.ts
    }
}

/// Window for a history fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Only messages after this timestamp.
    pub oldest: Option<String>,
    /// Only messages before this timestamp.
    pub latest: Option<String>,
    /// Include messages exactly at `oldest` / `latest`.
    pub inclusive: bool,
    pub limit: u32,
}

/// Operations the resource needs from the chat platform.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Channel history in the window, newest first.
    async fn fetch_history(
        &self,
        channel_id: &str,
        query: &HistoryQuery,
    ) -> Result<Vec<Message>, TransportError>;

    /// A thread's messages, with the root at index 0.
    async fn fetch_replies(
        &self,
        channel_id: &str,
        root_ts: &str,
    ) -> Result<Vec<Message>, TransportError>;

    /// Post a message and return its timestamp.
    async fn post_message(
        &self,
        channel_id: &str,
        message: &OutMessage,
    ) -> Result<String, TransportError>;
}
