//! Version detection over channel history.
//!
//! The scanner walks one page of history newest-first and decides per
//! message whether it is a new version. A root message whose thread already
//! has a reply matching the reply filter marks the point where a previous
//! run finished, so the walk stops there and older messages are not looked
//! at. Accepted versions are returned oldest-first.

use tracing::{debug, info};

use crate::chat::{ChatApi, HistoryQuery, Message};
use crate::error::TransportError;
use crate::matcher;
use crate::protocol::{Filter, HISTORY_PAGE_SIZE, Source, Timestamp, Version};

/// Outcome of evaluating a single history message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// New version.
    Accept,
    /// Not a candidate; keep scanning.
    Skip,
    /// Not a candidate; stop scanning older messages.
    Stop,
}

pub struct VersionScanner<'a> {
    api: &'a dyn ChatApi,
    source: &'a Source,
    page_size: u32,
}

impl<'a> VersionScanner<'a> {
    pub fn new(api: &'a dyn ChatApi, source: &'a Source) -> Self {
        Self {
            api,
            source,
            page_size: HISTORY_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Versions newer than or equal to `since`, oldest first.
    pub async fn scan(&self, since: Option<&Version>) -> Result<Vec<Version>, TransportError> {
        let oldest = since.and_then(Version::timestamp).map(str::to_string);
        if let Some(ts) = &oldest {
            info!(since = %ts, "Scanning from previous version");
        }

        let query = HistoryQuery {
            oldest,
            latest: None,
            inclusive: true,
            limit: self.page_size,
        };
        let history = self
            .api
            .fetch_history(&self.source.channel_id, &query)
            .await?;

        let mut versions = Vec::new();
        for message in &history {
            match self.evaluate(message).await? {
                Verdict::Accept => versions.push(Version::from_timestamp(&message.ts)),
                Verdict::Skip => {}
                Verdict::Stop => break,
            }
        }

        versions.reverse();
        info!(scanned = history.len(), accepted = versions.len(), "Scan complete");
        Ok(versions)
    }

    /// Decide whether `message` is a new version.
    pub async fn evaluate(&self, message: &Message) -> Result<Verdict, TransportError> {
        if message.is_reply() {
            debug!(ts = %message.ts, "Message is a reply, skipping");
            return Ok(Verdict::Skip);
        }

        let posted_at = Timestamp::parse(&message.ts)
            .ok()
            .and_then(|ts| ts.datetime())
            .map(|dt| dt.to_rfc3339());
        debug!(ts = %message.ts, posted_at = ?posted_at, text = %message.text, "Evaluating message");

        if let Some(filter) = &self.source.filter {
            if !matcher::matches(message, filter) {
                return Ok(Verdict::Skip);
            }
        }

        if let Some(reply_filter) = &self.source.reply_filter {
            if self.has_matching_reply(message, reply_filter).await? {
                info!(ts = %message.ts, "Thread has a matching reply, stopping scan");
                return Ok(Verdict::Stop);
            }
        }

        Ok(Verdict::Accept)
    }

    async fn has_matching_reply(
        &self,
        message: &Message,
        filter: &Filter,
    ) -> Result<bool, TransportError> {
        if message.reply_count == 0 {
            return Ok(false);
        }

        let thread = self
            .api
            .fetch_replies(&self.source.channel_id, &message.ts)
            .await?;

        // Index 0 is the root message itself.
        Ok(thread.iter().skip(1).any(|reply| {
            debug!(root = %message.ts, reply = %reply.ts, text = %reply.text, "Checking reply");
            matcher::matches(reply, filter)
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use regex::Regex;

    use super::*;
    use crate::message::OutMessage;

    /// In-memory channel that records which threads were fetched.
    #[derive(Default)]
    struct FakeChannel {
        history: Vec<Message>,
        threads: HashMap<String, Vec<Message>>,
        history_queries: Mutex<Vec<HistoryQuery>>,
        replies_fetched: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatApi for FakeChannel {
        async fn fetch_history(
            &self,
            _channel_id: &str,
            query: &HistoryQuery,
        ) -> Result<Vec<Message>, TransportError> {
            self.history_queries.lock().unwrap().push(query.clone());
            Ok(self.history.clone())
        }

        async fn fetch_replies(
            &self,
            _channel_id: &str,
            root_ts: &str,
        ) -> Result<Vec<Message>, TransportError> {
            self.replies_fetched.lock().unwrap().push(root_ts.to_string());
            Ok(self.threads.get(root_ts).cloned().unwrap_or_default())
        }

        async fn post_message(
            &self,
            _channel_id: &str,
            _message: &OutMessage,
        ) -> Result<String, TransportError> {
            unimplemented!("not used by the scanner")
        }
    }

    fn root(ts: &str, user: &str, text: &str, reply_count: u32) -> Message {
        Message {
            ts: ts.into(),
            user: user.into(),
            text: text.into(),
            reply_count,
            ..Default::default()
        }
    }

    fn reply(ts: &str, thread_ts: &str, user: &str, text: &str) -> Message {
        Message {
            ts: ts.into(),
            thread_ts: thread_ts.into(),
            user: user.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    fn source(filter: Option<Filter>, reply_filter: Option<Filter>) -> Source {
        Source {
            channel_id: "C1".into(),
            filter,
            reply_filter,
            ..Default::default()
        }
    }

    fn timestamps(versions: &[Version]) -> Vec<&str> {
        versions.iter().filter_map(Version::timestamp).collect()
    }

    #[tokio::test]
    async fn empty_history_yields_no_versions() {
        let api = FakeChannel::default();
        let source = source(None, None);
        let versions = VersionScanner::new(&api, &source).scan(None).await.unwrap();
        assert!(versions.is_empty());
    }

    #[tokio::test]
    async fn no_filters_accepts_all_roots_oldest_first() {
        let api = FakeChannel {
            history: vec![
                root("3.0", "U1", "c", 0),
                reply("2.5", "1.0", "U2", "thread chatter"),
                root("2.0", "U1", "b", 0),
                root("1.0", "U1", "a", 1),
            ],
            ..Default::default()
        };
        let source = source(None, None);
        let versions = VersionScanner::new(&api, &source).scan(None).await.unwrap();
        assert_eq!(timestamps(&versions), vec!["1.0", "2.0", "3.0"]);
    }

    #[tokio::test]
    async fn history_query_uses_previous_version_inclusively() {
        let api = FakeChannel::default();
        let source = source(None, None);
        let since = Version::from_timestamp("5.000100");
        VersionScanner::new(&api, &source)
            .scan(Some(&since))
            .await
            .unwrap();

        let queries = api.history_queries.lock().unwrap();
        assert_eq!(
            queries[0],
            HistoryQuery {
                oldest: Some("5.000100".into()),
                latest: None,
                inclusive: true,
                limit: HISTORY_PAGE_SIZE,
            }
        );
    }

    #[tokio::test]
    async fn root_filter_skips_without_stopping() {
        let api = FakeChannel {
            history: vec![
                root("3.0", "U1", "deploy api", 0),
                root("2.0", "U2", "deploy web", 0),
                root("1.0", "U1", "chit chat", 0),
                root("0.5", "U1", "deploy db", 0),
            ],
            ..Default::default()
        };
        let filter = Filter {
            author_id: Some("U1".into()),
            text_pattern: Some(Regex::new("^deploy").unwrap()),
        };
        let source = source(Some(filter), None);
        let versions = VersionScanner::new(&api, &source).scan(None).await.unwrap();
        assert_eq!(timestamps(&versions), vec!["0.5", "3.0"]);
    }

    #[tokio::test]
    async fn stops_at_first_root_with_matching_reply() {
        let api = FakeChannel {
            history: vec![
                root("3.0", "U1", "m3", 0),
                root("2.0", "U1", "m2", 2),
                root("1.0", "U1", "m1", 0),
            ],
            threads: HashMap::from([(
                "2.0".to_string(),
                vec![
                    root("2.0", "U1", "m2", 2),
                    reply("2.1", "2.0", "U9", "looking"),
                    reply("2.2", "2.0", "BOT", "done"),
                ],
            )]),
            ..Default::default()
        };
        let reply_filter = Filter {
            author_id: Some("BOT".into()),
            text_pattern: None,
        };
        let source = source(None, Some(reply_filter));
        let scanner = VersionScanner::new(&api, &source);

        let versions = scanner.scan(None).await.unwrap();
        assert_eq!(timestamps(&versions), vec!["3.0"]);
        assert_eq!(*api.replies_fetched.lock().unwrap(), vec!["2.0".to_string()]);
    }

    #[tokio::test]
    async fn root_is_not_tested_against_reply_filter() {
        // The thread root would satisfy the reply filter; only replies count.
        let api = FakeChannel {
            history: vec![root("2.0", "BOT", "done", 1)],
            threads: HashMap::from([(
                "2.0".to_string(),
                vec![
                    root("2.0", "BOT", "done", 1),
                    reply("2.1", "2.0", "U1", "thanks"),
                ],
            )]),
            ..Default::default()
        };
        let reply_filter = Filter {
            author_id: Some("BOT".into()),
            text_pattern: None,
        };
        let source = source(None, Some(reply_filter));
        let versions = VersionScanner::new(&api, &source).scan(None).await.unwrap();
        assert_eq!(timestamps(&versions), vec!["2.0"]);
    }

    #[tokio::test]
    async fn replies_not_fetched_without_reply_count() {
        let api = FakeChannel {
            history: vec![root("2.0", "U1", "a", 0), root("1.0", "U1", "b", 0)],
            ..Default::default()
        };
        let reply_filter = Filter {
            author_id: Some("BOT".into()),
            text_pattern: None,
        };
        let source = source(None, Some(reply_filter));
        let versions = VersionScanner::new(&api, &source).scan(None).await.unwrap();
        assert_eq!(timestamps(&versions), vec!["1.0", "2.0"]);
        assert!(api.replies_fetched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn filtered_out_root_does_not_fetch_replies() {
        let api = FakeChannel {
            history: vec![root("1.0", "U2", "noise", 4)],
            ..Default::default()
        };
        let filter = Filter {
            author_id: Some("U1".into()),
            text_pattern: None,
        };
        let reply_filter = Filter {
            author_id: Some("BOT".into()),
            text_pattern: None,
        };
        let source = source(Some(filter), Some(reply_filter));
        let versions = VersionScanner::new(&api, &source).scan(None).await.unwrap();
        assert!(versions.is_empty());
        assert!(api.replies_fetched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn evaluate_reports_verdicts() {
        let api = FakeChannel::default();
        let source = source(None, None);
        let scanner = VersionScanner::new(&api, &source);
        assert_eq!(
            scanner.evaluate(&reply("2.0", "1.0", "U1", "x")).await.unwrap(),
            Verdict::Skip
        );
        assert_eq!(
            scanner.evaluate(&root("1.0", "U1", "x", 0)).await.unwrap(),
            Verdict::Accept
        );
    }

    #[tokio::test]
    async fn custom_page_size_is_requested() {
        let api = FakeChannel::default();
        let source = source(None, None);
        VersionScanner::new(&api, &source)
            .with_page_size(10)
            .scan(None)
            .await
            .unwrap();
        assert_eq!(api.history_queries.lock().unwrap()[0].limit, 10);
    }
}
