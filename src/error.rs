//! Error types for configuration (setup time) and decisions (request time).

use std::path::PathBuf;

use crate::trigger::TriggerId;

/// Error raised by a trigger condition while it is being evaluated.
pub type ConditionError = Box<dyn std::error::Error + Send + Sync>;

/// Fail-fast errors raised while building a registry or loading configuration.
///
/// None of these can occur once a [`Registry`](crate::registry::Registry) exists.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid path pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("no authorization trigger is open; areas must be declared inside a trigger")]
    NoActiveTrigger,

    #[error("authorization trigger {0} is still open; triggers cannot be nested")]
    TriggerAlreadyOpen(TriggerId),

    #[error("authorization trigger {0} was never closed")]
    UnclosedTrigger(TriggerId),

    #[error("unknown trigger condition `{0}`")]
    UnknownCondition(String),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors surfaced while deciding a single request.
///
/// The engine never swallows these; the caller chooses whether to fail open or closed.
#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    #[error("condition `{}` for trigger {trigger} failed: {source}", .label.as_deref().unwrap_or("<anonymous>"))]
    Condition {
        trigger: TriggerId,
        label: Option<String>,
        #[source]
        source: ConditionError,
    },
}
