//! `{{...}}` placeholder expansion for outbound message templates.
//!
//! Two token kinds are recognized:
//! - `{{$NAME}}` — value of an environment variable (empty when unset)
//! - `{{path}}` — contents of a file under the base directory, with
//!   trailing whitespace trimmed
//!
//! Expansion is a single left-to-right pass. Substituted content is never
//! scanned again, and an opening `{{` without a closing `}}` is kept as
//! literal text.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::InterpolationError;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Source of environment variable values.
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// The current process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Expands placeholders against a base directory and an environment.
pub struct Interpolator<E = ProcessEnv> {
    base_dir: PathBuf,
    env: E,
}

impl Interpolator<ProcessEnv> {
    /// Interpolator reading variables from the process environment.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self::with_env(base_dir, ProcessEnv)
    }
}

impl<E: EnvSource> Interpolator<E> {
    pub fn with_env(base_dir: impl Into<PathBuf>, env: E) -> Self {
        Self {
            base_dir: base_dir.into(),
            env,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Expand every placeholder in `text`.
    pub fn interpolate(&self, text: &str) -> Result<String, InterpolationError> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(open) = rest.find(OPEN) {
            let body_start = open + OPEN.len();
            let Some(close) = rest[body_start..].find(CLOSE) else {
                break;
            };

            out.push_str(&rest[..open]);
            let body = &rest[body_start..body_start + close];
            out.push_str(&self.resolve(body)?);
            rest = &rest[body_start + close + CLOSE.len()..];
        }

        out.push_str(rest);
        Ok(out)
    }

    /// Interpolate a string in place.
    pub fn apply(&self, field: &mut String) -> Result<(), InterpolationError> {
        if field.contains(OPEN) {
            *field = self.interpolate(field)?;
        }
        Ok(())
    }

    /// Interpolate an optional string in place.
    pub fn apply_opt(&self, field: &mut Option<String>) -> Result<(), InterpolationError> {
        match field {
            Some(value) => self.apply(value),
            None => Ok(()),
        }
    }

    fn resolve(&self, body: &str) -> Result<String, InterpolationError> {
        if let Some(name) = body.strip_prefix('$') {
            let value = self.env.var(name);
            if value.is_none() {
                tracing::debug!(variable = name, "Environment variable unset, substituting empty string");
            }
            return Ok(value.unwrap_or_default());
        }

        let path = self.base_dir.join(body);
        let contents = std::fs::read_to_string(&path)
            .map_err(|source| InterpolationError::FileRead { path, source })?;
        Ok(contents.trim_end().to_string())
    }
}
