//! Turns verdicts into what the request layer acts on.
//!
//! On denial the request should be redirected to the safe zone (or the root
//! path when no safe zone is configured) with a user-facing notice. Flash
//! storage, i18n lookup and the HTTP redirect itself stay with the caller.

use serde::Serialize;

use crate::error::DecisionError;
use crate::eval::{Ruling, Verdict};
use crate::registry::Registry;

/// Fallback redirect target when no safe zone is configured.
pub const DEFAULT_ROOT_PATH: &str = "/";
/// Message key surfaced to the user on denial.
pub const DEFAULT_NOTICE: &str = "restricted";

/// What the request layer should do with the current request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Outcome {
    /// Continue normal processing.
    Pass,
    /// Halt processing, redirect to `location` and show `notice`.
    Redirect { location: String, notice: String },
}

/// A registry bundled with its denial handling.
#[derive(Debug)]
pub struct Gate<C = ()> {
    registry: Registry<C>,
    root_path: String,
    notice: String,
}

impl<C> Gate<C> {
    pub fn new(registry: Registry<C>) -> Self {
        Self {
            registry,
            root_path: DEFAULT_ROOT_PATH.to_string(),
            notice: DEFAULT_NOTICE.to_string(),
        }
    }

    pub fn with_root_path(mut self, root_path: impl Into<String>) -> Self {
        self.root_path = root_path.into();
        self
    }

    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = notice.into();
        self
    }

    pub fn registry(&self) -> &Registry<C> {
        &self.registry
    }

    /// Where denied requests are sent: the safe zone, else the root path.
    pub fn redirect_target(&self) -> &str {
        self.registry.safe_zone().unwrap_or(&self.root_path)
    }

    pub fn notice(&self) -> &str {
        &self.notice
    }

    /// Decide `path` and return the full ruling alongside the outcome.
    pub fn evaluate(&self, path: &str, ctx: &C) -> Result<(Ruling, Outcome), DecisionError> {
        let ruling = self.registry.decide(path, ctx)?;
        let outcome = match ruling.verdict {
            Verdict::Allow => Outcome::Pass,
            Verdict::Deny => Outcome::Redirect {
                location: self.redirect_target().to_string(),
                notice: self.notice().to_string(),
            },
        };
        Ok((ruling, outcome))
    }

    /// Decide `path`, logging the ruling, and return only the outcome.
    pub fn check(&self, path: &str, ctx: &C) -> Result<Outcome, DecisionError> {
        let (ruling, outcome) = self.evaluate(path, ctx)?;
        crate::logging::log_decision(path, &ruling);
        Ok(outcome)
    }
}
