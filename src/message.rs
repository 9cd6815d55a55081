//! Outbound message model for `chat.postMessage`.
//!
//! Only the fields that carry user-facing text are modelled; everything
//! else (post parameters, block ids, accessories, colors, ...) is kept in
//! `rest` maps and sent back untouched. Block and element kinds that are
//! not modelled are held as raw JSON and pass through unchanged.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::InterpolationError;
use crate::interpolate::{EnvSource, Interpolator};

/// A message to post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutMessage {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    /// Timestamp of the thread root to reply to.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub thread_ts: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Block>,
    /// Post parameters such as `username`, `icon_emoji`, `unfurl_links`.
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl OutMessage {
    /// Expand placeholders in every text-bearing field.
    pub fn interpolate<E: EnvSource>(
        &mut self,
        interp: &Interpolator<E>,
    ) -> Result<(), InterpolationError> {
        interp.apply(&mut self.text)?;
        interp.apply(&mut self.thread_ts)?;
        for attachment in &mut self.attachments {
            attachment.interpolate(interp)?;
        }
        for block in &mut self.blocks {
            block.interpolate(interp)?;
        }
        Ok(())
    }

    /// JSON body for `chat.postMessage` targeting `channel_id`.
    pub fn to_post_body(&self, channel_id: &str) -> Result<Value, serde_json::Error> {
        let mut body = serde_json::to_value(self)?;
        if let Value::Object(fields) = &mut body {
            fields.insert("channel".into(), Value::String(channel_id.into()));
        }
        Ok(body)
    }
}

/// Legacy message attachment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pretext: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl Attachment {
    fn interpolate<E: EnvSource>(
        &mut self,
        interp: &Interpolator<E>,
    ) -> Result<(), InterpolationError> {
        for field in [
            &mut self.fallback,
            &mut self.title,
            &mut self.title_link,
            &mut self.pretext,
            &mut self.text,
            &mut self.footer,
        ] {
            interp.apply_opt(field)?;
        }
        Ok(())
    }
}

/// A `plain_text` or `mrkdwn` text object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextObject {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl TextObject {
    fn is_text_kind(&self) -> bool {
        matches!(self.kind.as_str(), "plain_text" | "mrkdwn")
    }
}

// ── Blocks ──────────────────────────────────────────────────────────

/// A layout block. `type` and unmodelled keys live in each block's `rest`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Block {
    Section(SectionBlock),
    Context(ContextBlock),
    Actions(ActionBlock),
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextObject>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<TextObject>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextBlock {
    #[serde(default)]
    pub elements: Vec<ContextElement>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionBlock {
    #[serde(default)]
    pub elements: Vec<ActionElement>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl Block {
    fn interpolate<E: EnvSource>(
        &mut self,
        interp: &Interpolator<E>,
    ) -> Result<(), InterpolationError> {
        match self {
            Block::Section(section) => {
                if let Some(text) = &mut section.text {
                    interp.apply(&mut text.text)?;
                }
                for field in &mut section.fields {
                    interp.apply(&mut field.text)?;
                }
            }
            Block::Context(context) => {
                for element in &mut context.elements {
                    if let ContextElement::Text(text) = element {
                        interp.apply(&mut text.text)?;
                    }
                }
            }
            Block::Actions(actions) => {
                for element in &mut actions.elements {
                    if let ActionElement::Button(button) = element {
                        interp.apply(&mut button.text.text)?;
                    }
                }
            }
            Block::Other(_) => {}
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let parsed = match type_of(&value) {
            Some("section") => parse_as(&value).map(Block::Section),
            Some("context") => parse_as(&value).map(Block::Context),
            Some("actions") => parse_as(&value).map(Block::Actions),
            _ => None,
        };
        Ok(parsed.unwrap_or(Block::Other(value)))
    }
}

// ── Elements ────────────────────────────────────────────────────────

/// An element of a context block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContextElement {
    Text(TextObject),
    Other(Value),
}

impl<'de> Deserialize<'de> for ContextElement {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let text = parse_as::<TextObject>(&value).filter(TextObject::is_text_kind);
        Ok(text.map_or(ContextElement::Other(value), ContextElement::Text))
    }
}

/// A button inside an actions block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonElement {
    pub text: TextObject,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// An element of an actions block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ActionElement {
    Button(ButtonElement),
    Other(Value),
}

impl<'de> Deserialize<'de> for ActionElement {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let button = match type_of(&value) {
            Some("button") => parse_as(&value),
            _ => None,
        };
        Ok(button.map_or(ActionElement::Other(value), ActionElement::Button))
    }
}

fn type_of(value: &Value) -> Option<&str> {
    value.get("type").and_then(Value::as_str)
}

fn parse_as<T: DeserializeOwned>(value: &Value) -> Option<T> {
    serde_json::from_value(value.clone()).ok()
}
