// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Masking of secret build parameters in user-visible text.

use crate::job::Params;
use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Replacement shown instead of a secret parameter value.
pub const MASK: &str = "******";

#[derive(Debug, Clone, Error)]
pub enum RedactError {
    #[error("invalid secret_params pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Decides which parameters are secret and masks their values.
///
/// The pattern is matched case-insensitively against parameter *names* and
/// is anchored at the start of the name, so `.*pass.*` matches `password`,
/// `PASS` and `db_passwd`.
#[derive(Debug, Clone, Default)]
pub struct SecretRedactor {
    source: Option<String>,
    pattern: Option<Regex>,
}

impl SecretRedactor {
    pub fn new(pattern: &str) -> Result<Self, RedactError> {
        let regex = RegexBuilder::new(&format!("^(?:{})", pattern))
            .case_insensitive(true)
            .build()
            .map_err(|source| RedactError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self {
            source: Some(pattern.to_string()),
            pattern: Some(regex),
        })
    }

    /// A redactor that treats no parameter as secret.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn pattern(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn is_secret(&self, name: &str) -> bool {
        self.pattern.as_ref().is_some_and(|re| re.is_match(name))
    }

    /// Copy of `params` with every secret value replaced by [`MASK`].
    pub fn mask_params(&self, params: &Params) -> Params {
        params
            .iter()
            .map(|(name, value)| {
                let shown = if self.is_secret(name) {
                    MASK.to_string()
                } else {
                    value.clone()
                };
                (name.clone(), shown)
            })
            .collect()
    }

    /// Render parameters for display: `(a='1', password='******')`.
    ///
    /// Returns an empty string when there are no parameters.
    pub fn format_params(&self, params: &Params) -> String {
        if params.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = self
            .mask_params(params)
            .iter()
            .map(|(name, value)| format!("{}='{}'", name, value))
            .collect();
        format!("({})", parts.join(", "))
    }

    /// Remove every secret value of `params` from arbitrary text.
    ///
    /// Used on text that did not come from this crate (adapter error
    /// messages, job output) before it is shown or attached to a failure.
    pub fn scrub(&self, text: &str, params: &Params) -> String {
        let mut out = text.to_string();
        for (name, value) in params {
            if !value.is_empty() && self.is_secret(name) {
                out = out.replace(value.as_str(), MASK);
            }
        }
        out
    }
}

#[cfg(test)]
#[path = "redact_tests.rs"]
mod tests;
