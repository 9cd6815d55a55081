//! Split a fetched message into ordered parts.

use crate::protocol::Filter;

/// Parts extracted from `text` using the filter's text pattern.
///
/// Every capture group becomes one part, in group order; groups that did
/// not participate in the match yield an empty part. A pattern without
/// groups yields the whole match. Without a pattern the whole text is the
/// only part. Returns `None` when the pattern does not match.
pub fn decompose(text: &str, filter: Option<&Filter>) -> Option<Vec<String>> {
    let Some(pattern) = filter.and_then(|f| f.text_pattern.as_ref()) else {
        return Some(vec![text.to_string()]);
    };

    let captures = pattern.captures(text)?;
    if captures.len() == 1 {
        return Some(vec![captures[0].to_string()]);
    }

    Some(
        captures
            .iter()
            .skip(1)
            .map(|group| group.map_or_else(String::new, |m| m.as_str().to_string()))
            .collect(),
    )
}
