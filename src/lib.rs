//! zonegate: declarative trigger-based access control for request paths.
//!
//! An application declares authorization triggers (boolean conditions
//! evaluated per request) and, for each trigger, restricted and unrestricted
//! path patterns. For every request path the engine returns
//! [`Verdict::Allow`] or [`Verdict::Deny`]; a [`Gate`] turns a denial into a
//! redirect to the safe zone with a notice key.
//!
//! # Architecture
//!
//! - **[`registry`]** — Builder for the ordered trigger registry, frozen before the first request.
//! - **[`eval`]** — Decision engine, trigger conditions, and verdict types.
//! - **[`pattern`]** — Compiled path patterns and their union.
//! - **[`trigger`]** — Triggers, access classes, per-trigger path rules.
//! - **[`gate`]** — Maps verdicts to pass / redirect-with-notice.
//! - **[`config`]** — TOML configuration: embedded defaults + user overlay merge.
//! - **[`logging`]** — `simplelog` setup and per-decision log records.

/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Configuration and decision errors.
pub mod error;
/// Decision engine: conditions, verdicts, `decide`.
pub mod eval;
/// Request-layer adapter: verdict to pass or redirect.
pub mod gate;
/// Logger setup and decision records.
pub mod logging;
/// Path patterns and pattern unions.
pub mod pattern;
/// Ordered trigger registry and its builder.
pub mod registry;
/// Triggers and their path rules.
pub mod trigger;

pub use error::{ConditionError, ConfigError, DecisionError};
pub use eval::{Condition, ConditionTable, Ruling, Verdict, decide};
pub use gate::{Gate, Outcome};
pub use pattern::{PathPattern, PathSpec};
pub use registry::{Registry, RegistryBuilder};
pub use trigger::{AccessClass, TriggerId};

/// Decide `path` against a TOML configuration whose conditions are all literals
/// or bound in `conditions`.
///
/// This is the main entry point for tests and one-off checks.
/// Long-running hosts should build the [`Gate`] once and reuse it.
pub fn evaluate<C>(
    config_toml: &str,
    conditions: &ConditionTable<C>,
    path: &str,
    ctx: &C,
) -> Result<Ruling, Box<dyn std::error::Error + Send + Sync>> {
    let config = config::Config::from_toml(config_toml)?;
    let registry = config.registry(conditions)?;
    Ok(registry.decide(path, ctx)?)
}
