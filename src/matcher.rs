//! Message filter predicate.

use tracing::debug;

use crate::chat::Message;
use crate::protocol::Filter;

/// Whether `message` satisfies `filter`.
///
/// The author constraint accepts either the posting user or the posting
/// bot. The text pattern is searched anywhere in the message text.
pub fn matches(message: &Message, filter: &Filter) -> bool {
    if let Some(author) = filter.author() {
        if message.user != author && message.bot_id != author {
            debug!(ts = %message.ts, author, "Author does not match");
            return false;
        }
    }

    if let Some(pattern) = &filter.text_pattern {
        if !pattern.is_match(&message.text) {
            debug!(ts = %message.ts, pattern = pattern.as_str(), "Text does not match pattern");
            return false;
        }
    }

    debug!(ts = %message.ts, "Message matched");
    true
}
