//! Slack chat resource — treats a Slack channel as a versioned pipeline
//! resource.

pub mod chat;
pub mod cli;
pub mod decompose;
pub mod error;
pub mod interpolate;
pub mod matcher;
pub mod message;
pub mod protocol;
pub mod resource;
pub mod scanner;
