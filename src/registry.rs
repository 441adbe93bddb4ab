//! Ordered trigger registry and the builder that declares it.
//!
//! ```
//! use zonegate::{AccessClass, Condition, RegistryBuilder, Verdict};
//!
//! struct Session { active: bool }
//!
//! let mut builder = RegistryBuilder::new();
//! builder.safe_zone("/login");
//! builder.authorization_trigger(
//!     Condition::when(|s: &Session| s.active),
//!     Some(AccessClass::Unrestricted),
//!     |t| {
//!         t.restricted_area("^/members_only")?;
//!         t.unrestricted_area("^/$")
//!     },
//! )?;
//! let registry = builder.build()?;
//!
//! let ruling = registry.decide("/members_only/lounge", &Session { active: true })?;
//! assert_eq!(ruling.verdict, Verdict::Deny);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::error::{ConfigError, DecisionError};
use crate::eval::{self, Condition, Ruling};
use crate::pattern::PathSpec;
use crate::trigger::{AccessClass, PathRuleSet, Trigger, TriggerId};

/// Immutable, ordered `(trigger, rules)` entries plus the safe zone.
///
/// Built once at startup and shared read-only across requests
/// (wrap in `Arc` to hand it to concurrent handlers).
pub struct Registry<C = ()> {
    entries: Vec<(Trigger<C>, PathRuleSet)>,
    safe_zone: Option<String>,
}

impl<C> Registry<C> {
    /// A registry with no triggers: every path is allowed.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            safe_zone: None,
        }
    }

    /// Entries in registration (evaluation) order.
    pub fn iter(&self) -> impl Iterator<Item = (&Trigger<C>, &PathRuleSet)> {
        self.entries.iter().map(|(t, r)| (t, r))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The exact path that is never restricted.
    pub fn safe_zone(&self) -> Option<&str> {
        self.safe_zone.as_deref()
    }

    /// Decide access for `path`. See [`eval::decide`].
    pub fn decide(&self, path: &str, ctx: &C) -> Result<Ruling, DecisionError> {
        eval::decide(path, self, ctx)
    }
}

impl<C> Default for Registry<C> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<C> std::fmt::Debug for Registry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.entries)
            .field("safe_zone", &self.safe_zone)
            .finish()
    }
}

/// Declares triggers and their areas, then freezes them into a [`Registry`].
///
/// Areas may only be declared while a trigger is open; misuse is reported
/// as a [`ConfigError`] here, never at request time.
pub struct RegistryBuilder<C = ()> {
    entries: Vec<(Trigger<C>, PathRuleSet)>,
    open: Option<(Trigger<C>, PathRuleSet)>,
    safe_zone: Option<String>,
}

impl<C> RegistryBuilder<C> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            open: None,
            safe_zone: None,
        }
    }

    /// Set the exact path exempt from all triggers (the redirect target on denial).
    pub fn safe_zone(&mut self, path: impl Into<String>) -> &mut Self {
        self.safe_zone = Some(path.into());
        self
    }

    /// Open a new trigger scope. `None` means restricted by default.
    pub fn begin_trigger(
        &mut self,
        condition: impl Into<Condition<C>>,
        default_access: Option<AccessClass>,
    ) -> Result<TriggerId, ConfigError> {
        if let Some((open, _)) = &self.open {
            return Err(ConfigError::TriggerAlreadyOpen(open.id));
        }
        let id = TriggerId(self.entries.len());
        let trigger = Trigger {
            id,
            label: None,
            condition: condition.into(),
            default_access: default_access.unwrap_or_default(),
        };
        self.open = Some((trigger, PathRuleSet::new()));
        Ok(id)
    }

    /// Name the open trigger for logs and rulings.
    pub fn label(&mut self, label: impl Into<String>) -> Result<&mut Self, ConfigError> {
        let (trigger, _) = self.open.as_mut().ok_or(ConfigError::NoActiveTrigger)?;
        trigger.label = Some(label.into());
        Ok(self)
    }

    /// Append a pattern to the open trigger's list for `class`.
    pub fn add_path(
        &mut self,
        class: AccessClass,
        spec: impl Into<PathSpec>,
    ) -> Result<(), ConfigError> {
        let (_, rules) = self.open.as_mut().ok_or(ConfigError::NoActiveTrigger)?;
        rules.push(class, spec.into().compile()?);
        Ok(())
    }

    pub fn restricted_area(&mut self, spec: impl Into<PathSpec>) -> Result<(), ConfigError> {
        self.add_path(AccessClass::Restricted, spec)
    }

    pub fn unrestricted_area(&mut self, spec: impl Into<PathSpec>) -> Result<(), ConfigError> {
        self.add_path(AccessClass::Unrestricted, spec)
    }

    /// Close the open trigger and append it to the registry.
    pub fn end_trigger(&mut self) -> Result<TriggerId, ConfigError> {
        let (trigger, rules) = self.open.take().ok_or(ConfigError::NoActiveTrigger)?;
        let id = trigger.id;
        log::debug!(
            "registered {} (default {}, {} restricted, {} unrestricted)",
            trigger.describe(),
            trigger.default_access,
            rules.patterns(AccessClass::Restricted).len(),
            rules.patterns(AccessClass::Unrestricted).len(),
        );
        self.entries.push((trigger, rules));
        Ok(id)
    }

    /// Block form: open a trigger, let `areas` declare its paths, close it.
    ///
    /// If `areas` fails the half-built trigger is discarded and the error returned.
    pub fn authorization_trigger<F>(
        &mut self,
        condition: impl Into<Condition<C>>,
        default_access: Option<AccessClass>,
        areas: F,
    ) -> Result<TriggerId, ConfigError>
    where
        F: FnOnce(&mut Self) -> Result<(), ConfigError>,
    {
        self.begin_trigger(condition, default_access)?;
        if let Err(e) = areas(self) {
            self.open = None;
            return Err(e);
        }
        self.end_trigger()
    }

    /// Finish configuration. Fails if a trigger scope is still open.
    pub fn build(self) -> Result<Registry<C>, ConfigError> {
        if let Some((open, _)) = &self.open {
            return Err(ConfigError::UnclosedTrigger(open.id));
        }
        Ok(Registry {
            entries: self.entries,
            safe_zone: self.safe_zone,
        })
    }
}

impl<C> Default for RegistryBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_registration_order() {
        let mut b: RegistryBuilder = RegistryBuilder::new();
        b.authorization_trigger(true, None, |t| t.restricted_area("^/a")).unwrap();
        b.authorization_trigger(false, Some(AccessClass::Unrestricted), |t| {
            t.unrestricted_area("^/b")
        })
        .unwrap();
        b.authorization_trigger(true, None, |_| Ok(())).unwrap();
        let registry = b.build().unwrap();

        let ids: Vec<_> = registry.iter().map(|(t, _)| t.id).collect();
        assert_eq!(ids, vec![TriggerId(0), TriggerId(1), TriggerId(2)]);
        let access: Vec<_> = registry.iter().map(|(t, _)| t.default_access).collect();
        assert_eq!(
            access,
            vec![
                AccessClass::Restricted,
                AccessClass::Unrestricted,
                AccessClass::Restricted
            ]
        );
    }

    #[test]
    fn identical_conditions_are_distinct_triggers() {
        let mut b: RegistryBuilder = RegistryBuilder::new();
        b.authorization_trigger(true, None, |t| t.restricted_area("^/one")).unwrap();
        b.authorization_trigger(true, None, |t| t.restricted_area("^/two")).unwrap();
        let registry = b.build().unwrap();
        assert_eq!(registry.len(), 2);

        let mut rules = registry.iter().map(|(_, r)| r);
        let first = rules.next().unwrap();
        let second = rules.next().unwrap();
        assert!(first.patterns(AccessClass::Restricted).is_match("/one"));
        assert!(!first.patterns(AccessClass::Restricted).is_match("/two"));
        assert!(second.patterns(AccessClass::Restricted).is_match("/two"));
        assert!(!second.patterns(AccessClass::Restricted).is_match("/one"));
    }

    #[test]
    fn add_path_outside_trigger_fails() {
        let mut b: RegistryBuilder = RegistryBuilder::new();
        assert!(matches!(
            b.restricted_area("^/secret"),
            Err(ConfigError::NoActiveTrigger)
        ));
        b.authorization_trigger(true, None, |_| Ok(())).unwrap();
        assert!(matches!(
            b.unrestricted_area("^/late"),
            Err(ConfigError::NoActiveTrigger)
        ));
    }

    #[test]
    fn end_without_begin_fails() {
        let mut b: RegistryBuilder = RegistryBuilder::new();
        assert!(matches!(b.end_trigger(), Err(ConfigError::NoActiveTrigger)));
    }

    #[test]
    fn nested_begin_fails() {
        let mut b: RegistryBuilder = RegistryBuilder::new();
        b.begin_trigger(true, None).unwrap();
        assert!(matches!(
            b.begin_trigger(false, None),
            Err(ConfigError::TriggerAlreadyOpen(TriggerId(0)))
        ));
    }

    #[test]
    fn build_with_open_trigger_fails() {
        let mut b: RegistryBuilder = RegistryBuilder::new();
        b.begin_trigger(true, None).unwrap();
        b.restricted_area("^/x").unwrap();
        assert!(matches!(b.build(), Err(ConfigError::UnclosedTrigger(TriggerId(0)))));
    }

    #[test]
    fn malformed_pattern_fails_at_setup() {
        let mut b: RegistryBuilder = RegistryBuilder::new();
        let err = b
            .authorization_trigger(true, None, |t| t.restricted_area("[unterminated"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
        // The failed scope is discarded, so the builder is usable again.
        b.authorization_trigger(true, None, |t| t.restricted_area("^/ok")).unwrap();
        assert_eq!(b.build().unwrap().len(), 1);
    }

    #[test]
    fn explicit_begin_and_end() {
        let mut b: RegistryBuilder = RegistryBuilder::new();
        let id = b.begin_trigger(true, Some(AccessClass::Unrestricted)).unwrap();
        b.label("everyone").unwrap();
        b.add_path(AccessClass::Restricted, "^/admin").unwrap();
        assert_eq!(b.end_trigger().unwrap(), id);
        let registry = b.build().unwrap();
        let (trigger, rules) = registry.iter().next().unwrap();
        assert_eq!(trigger.label.as_deref(), Some("everyone"));
        assert_eq!(trigger.describe(), "trigger #0 (everyone)");
        assert_eq!(rules.patterns(AccessClass::Restricted).len(), 1);
        assert!(rules.patterns(AccessClass::Unrestricted).is_empty());
    }

    #[test]
    fn safe_zone_stored() {
        let mut b: RegistryBuilder = RegistryBuilder::new();
        b.safe_zone("/login");
        let registry = b.build().unwrap();
        assert_eq!(registry.safe_zone(), Some("/login"));
        assert!(registry.is_empty());
    }

    #[test]
    fn registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry<()>>();
        assert_send_sync::<Registry<std::collections::HashMap<String, bool>>>();
    }
}
