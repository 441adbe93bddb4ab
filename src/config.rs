use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::eval::{Condition, ConditionTable};
use crate::gate::{DEFAULT_NOTICE, DEFAULT_ROOT_PATH, Gate};
use crate::registry::{Registry, RegistryBuilder};
use crate::trigger::AccessClass;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

/// Where [`Config::load`] looks for a user overlay when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "~/.config/zonegate/config.toml";

// ── Final (merged) config types ──

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub triggers: Vec<TriggerConfig>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Settings {
    /// Exact path exempt from every trigger.
    #[serde(default)]
    pub safe_zone: Option<String>,
    /// Redirect target when no safe zone is configured.
    #[serde(default = "default_root_path")]
    pub root_path: String,
    /// Message key surfaced on denial.
    #[serde(default = "default_notice")]
    pub notice: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            safe_zone: None,
            root_path: default_root_path(),
            notice: default_notice(),
        }
    }
}

fn default_root_path() -> String {
    DEFAULT_ROOT_PATH.to_string()
}

fn default_notice() -> String {
    DEFAULT_NOTICE.to_string()
}

/// One `[[triggers]]` table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TriggerConfig {
    pub condition: ConditionRef,
    /// Unknown values coerce to restricted.
    #[serde(default)]
    pub default_access: Option<AccessClass>,
    #[serde(default)]
    pub restricted: Vec<String>,
    #[serde(default)]
    pub unrestricted: Vec<String>,
}

/// A trigger condition as written in TOML: a literal boolean or the name of
/// a condition bound by the host through a [`ConditionTable`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ConditionRef {
    Literal(bool),
    Named(String),
}

impl ConditionRef {
    fn name(&self) -> Option<&str> {
        match self {
            ConditionRef::Named(name) => Some(name),
            ConditionRef::Literal(_) => None,
        }
    }

    fn label(&self) -> String {
        match self {
            ConditionRef::Named(name) => name.clone(),
            ConditionRef::Literal(value) => value.to_string(),
        }
    }

    fn resolve<C>(&self, conditions: &ConditionTable<C>) -> Result<Condition<C>, ConfigError> {
        match self {
            ConditionRef::Literal(value) => Ok(Condition::Literal(*value)),
            ConditionRef::Named(name) => conditions.resolve(name),
        }
    }
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    triggers: Vec<TriggerConfig>,
    /// Condition names whose default triggers should be dropped.
    #[serde(default)]
    remove_triggers: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    safe_zone: Option<String>,
    root_path: Option<String>,
    notice: Option<String>,
}

// ── Merge logic ──

/// Merge user triggers into the default list.
/// In replace mode: user triggers replace the defaults entirely.
/// In merge mode: drop removed conditions first, then append in declaration order.
fn merge_triggers(
    base: &mut Vec<TriggerConfig>,
    add: Vec<TriggerConfig>,
    remove: &[String],
    replace: bool,
) {
    if replace {
        *base = add;
    } else {
        base.retain(|t| !t.condition.name().is_some_and(|n| remove.iter().any(|r| r == n)));
        base.extend(add);
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Parse a complete configuration (no merging with defaults).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge the overlay at `path`, or at [`DEFAULT_CONFIG_PATH`] if it exists
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default_config();
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (crate::logging::expand_path(DEFAULT_CONFIG_PATH), false),
        };
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no overlay at {}, using defaults", path.display());
                return Ok(config);
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        config.apply_overlay_str(&content)?;
        log::debug!(
            "loaded {} with {} trigger(s)",
            path.display(),
            config.triggers.len()
        );
        Ok(config)
    }

    /// Apply an overlay from a TOML string.
    pub fn apply_overlay_str(&mut self, toml_str: &str) -> Result<(), ConfigError> {
        let overlay: ConfigOverlay = toml::from_str(toml_str)?;
        self.apply_overlay(overlay);
        self.validate()
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        // Settings: scalar overrides
        let s = overlay.settings;
        if let Some(v) = s.safe_zone {
            self.settings.safe_zone = Some(v);
        }
        if let Some(v) = s.root_path {
            self.settings.root_path = v;
        }
        if let Some(v) = s.notice {
            self.settings.notice = v;
        }

        merge_triggers(
            &mut self.triggers,
            overlay.triggers,
            &overlay.remove_triggers,
            overlay.replace,
        );
    }

    /// Compile every pattern once so malformed text is reported at load time.
    fn validate(&self) -> Result<(), ConfigError> {
        self.triggers
            .iter()
            .flat_map(|t| t.restricted.iter().chain(&t.unrestricted))
            .try_for_each(|p| crate::pattern::PathPattern::new(p).map(|_| ()))
    }

    /// Every condition name referenced by a trigger, in first-use order.
    pub fn condition_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.triggers.iter().filter_map(|t| t.condition.name()) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Build the trigger registry, binding condition names through `conditions`.
    pub fn registry<C>(&self, conditions: &ConditionTable<C>) -> Result<Registry<C>, ConfigError> {
        let mut builder = RegistryBuilder::new();
        if let Some(zone) = &self.settings.safe_zone {
            builder.safe_zone(zone);
        }
        for trigger in &self.triggers {
            builder.begin_trigger(trigger.condition.resolve(conditions)?, trigger.default_access)?;
            builder.label(trigger.condition.label())?;
            for path in &trigger.restricted {
                builder.restricted_area(path)?;
            }
            for path in &trigger.unrestricted {
                builder.unrestricted_area(path)?;
            }
            builder.end_trigger()?;
        }
        builder.build()
    }

    /// Build a [`Gate`] carrying the configured redirect target and notice.
    pub fn gate<C>(&self, conditions: &ConditionTable<C>) -> Result<Gate<C>, ConfigError> {
        Ok(Gate::new(self.registry(conditions)?)
            .with_root_path(&self.settings.root_path)
            .with_notice(&self.settings.notice))
    }
}
