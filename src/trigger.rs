//! Triggers and the path rules they own.

use serde::{Deserialize, Deserializer, Serialize};

use crate::eval::Condition;
use crate::pattern::{PathPattern, PatternSet};

/// How a path is classified under a fired trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessClass {
    #[default]
    Restricted,
    Unrestricted,
}

impl AccessClass {
    /// Interpret a user-supplied access name.
    ///
    /// Only `restricted` and `unrestricted` are recognised; anything else,
    /// including no value at all, is `Restricted`.
    pub fn coerce(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("unrestricted") => AccessClass::Unrestricted,
            Some("restricted") | None => AccessClass::Restricted,
            Some(other) => {
                log::warn!("unrecognised default access `{other}`, using restricted");
                AccessClass::Restricted
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccessClass::Restricted => "restricted",
            AccessClass::Unrestricted => "unrestricted",
        }
    }
}

impl<'de> Deserialize<'de> for AccessClass {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(AccessClass::coerce(Some(&raw)))
    }
}

impl std::fmt::Display for AccessClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of a trigger in its registry; triggers are identified by
/// registration, not by the value of their condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerId(pub usize);

impl std::fmt::Display for TriggerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A condition plus the verdict applied when a fired trigger's rules match
/// neither list.
pub struct Trigger<C = ()> {
    pub id: TriggerId,
    /// Human name for logs and reasons (config-loaded triggers use the condition name).
    pub label: Option<String>,
    pub condition: Condition<C>,
    pub default_access: AccessClass,
}

impl<C> Trigger<C> {
    /// `label` if set, otherwise the trigger id.
    pub fn describe(&self) -> String {
        match &self.label {
            Some(label) => format!("trigger {} ({label})", self.id),
            None => format!("trigger {}", self.id),
        }
    }
}

impl<C> std::fmt::Debug for Trigger<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trigger")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("condition", &self.condition)
            .field("default_access", &self.default_access)
            .finish()
    }
}

/// Restricted and unrestricted patterns owned by one trigger.
#[derive(Debug, Clone, Default)]
pub struct PathRuleSet {
    restricted: PatternSet,
    unrestricted: PatternSet,
}

impl PathRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, class: AccessClass, pattern: PathPattern) {
        match class {
            AccessClass::Restricted => self.restricted.push(pattern),
            AccessClass::Unrestricted => self.unrestricted.push(pattern),
        }
    }

    pub fn patterns(&self, class: AccessClass) -> &PatternSet {
        match class {
            AccessClass::Restricted => &self.restricted,
            AccessClass::Unrestricted => &self.unrestricted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_known_values() {
        assert_eq!(AccessClass::coerce(Some("restricted")), AccessClass::Restricted);
        assert_eq!(AccessClass::coerce(Some("unrestricted")), AccessClass::Unrestricted);
        assert_eq!(AccessClass::coerce(Some(" Unrestricted ")), AccessClass::Unrestricted);
    }

    #[test]
    fn coerce_unknown_and_missing_to_restricted() {
        assert_eq!(AccessClass::coerce(None), AccessClass::Restricted);
        assert_eq!(AccessClass::coerce(Some("open")), AccessClass::Restricted);
        assert_eq!(AccessClass::coerce(Some("")), AccessClass::Restricted);
    }

    #[test]
    fn default_is_restricted() {
        assert_eq!(AccessClass::default(), AccessClass::Restricted);
    }

    #[test]
    fn deserialize_coerces() {
        #[derive(Deserialize)]
        struct Wrapper {
            access: AccessClass,
        }
        let w: Wrapper = toml::from_str(r#"access = "unrestricted""#).unwrap();
        assert_eq!(w.access, AccessClass::Unrestricted);
        let w: Wrapper = toml::from_str(r#"access = "everyone""#).unwrap();
        assert_eq!(w.access, AccessClass::Restricted);
    }

    #[test]
    fn rule_set_keeps_classes_apart() {
        let mut rules = PathRuleSet::new();
        rules.push(AccessClass::Restricted, PathPattern::new("^/secret").unwrap());
        rules.push(AccessClass::Unrestricted, PathPattern::new("^/public").unwrap());
        assert!(rules.patterns(AccessClass::Restricted).is_match("/secret"));
        assert!(!rules.patterns(AccessClass::Restricted).is_match("/public"));
        assert!(rules.patterns(AccessClass::Unrestricted).is_match("/public"));
        assert!(!rules.patterns(AccessClass::Unrestricted).is_match("/secret"));
    }
}
