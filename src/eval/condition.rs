use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ConditionError, ConfigError};

type Predicate<C> = dyn Fn(&C) -> Result<bool, ConditionError> + Send + Sync;

/// A trigger condition evaluated once per decision.
///
/// `C` is whatever request-scoped context the host hands to
/// [`decide`](crate::eval::decide): a session, the current user, a fact map.
/// Conditions that need nothing use the default `()`.
pub enum Condition<C = ()> {
    /// Used as-is; `Literal(true)` fires on every request.
    Literal(bool),
    /// Invoked fresh on every decision. Results are never cached.
    Predicate(Arc<Predicate<C>>),
}

impl<C> Condition<C> {
    pub fn always() -> Self {
        Condition::Literal(true)
    }

    pub fn never() -> Self {
        Condition::Literal(false)
    }

    /// An infallible predicate over the request context.
    pub fn when<F>(f: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        Condition::Predicate(Arc::new(move |ctx| Ok(f(ctx))))
    }

    /// A fallible predicate. Errors propagate out of the decision unchanged.
    pub fn try_when<F, E>(f: F) -> Self
    where
        F: Fn(&C) -> Result<bool, E> + Send + Sync + 'static,
        E: Into<ConditionError>,
    {
        Condition::Predicate(Arc::new(move |ctx| f(ctx).map_err(Into::into)))
    }

    /// Truthiness adapter: fires when `f` yields `Some`.
    ///
    /// For lookups like "the signed-in user", where presence is the condition.
    pub fn present<F, T>(f: F) -> Self
    where
        F: Fn(&C) -> Option<T> + Send + Sync + 'static,
    {
        Condition::Predicate(Arc::new(move |ctx| Ok(f(ctx).is_some())))
    }

    pub fn evaluate(&self, ctx: &C) -> Result<bool, ConditionError> {
        match self {
            Condition::Literal(value) => Ok(*value),
            Condition::Predicate(f) => f(ctx),
        }
    }
}

impl<C> Clone for Condition<C> {
    fn clone(&self) -> Self {
        match self {
            Condition::Literal(value) => Condition::Literal(*value),
            Condition::Predicate(f) => Condition::Predicate(Arc::clone(f)),
        }
    }
}

impl<C> From<bool> for Condition<C> {
    fn from(value: bool) -> Self {
        Condition::Literal(value)
    }
}

impl<C> std::fmt::Debug for Condition<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::Literal(value) => write!(f, "Literal({value})"),
            Condition::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Named conditions the host registers before loading configuration.
///
/// Config files refer to conditions by name (`condition = "signed_in"`);
/// the table binds each name to a predicate at setup time.
pub struct ConditionTable<C = ()> {
    named: HashMap<String, Condition<C>>,
}

impl<C> ConditionTable<C> {
    pub fn new() -> Self {
        Self {
            named: HashMap::new(),
        }
    }

    /// Register (or replace) a named condition.
    pub fn insert(&mut self, name: impl Into<String>, condition: impl Into<Condition<C>>) {
        self.named.insert(name.into(), condition.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, condition: impl Into<Condition<C>>) -> Self {
        self.insert(name, condition);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.named.contains_key(name)
    }

    /// Look up a condition by name.
    pub fn resolve(&self, name: &str) -> Result<Condition<C>, ConfigError> {
        self.named
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownCondition(name.to_string()))
    }
}

impl<C> Default for ConditionTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Session {
        user: Option<&'static str>,
        active: bool,
    }

    #[test]
    fn literals() {
        assert!(Condition::<()>::always().evaluate(&()).unwrap());
        assert!(!Condition::<()>::never().evaluate(&()).unwrap());
        assert!(Condition::<()>::from(true).evaluate(&()).unwrap());
    }

    #[test]
    fn predicate_reads_context() {
        let active = Condition::when(|s: &Session| s.active);
        assert!(active.evaluate(&Session { user: None, active: true }).unwrap());
        assert!(!active.evaluate(&Session { user: None, active: false }).unwrap());
    }

    #[test]
    fn present_is_truthiness() {
        let signed_in = Condition::present(|s: &Session| s.user);
        assert!(signed_in.evaluate(&Session { user: Some("ada"), active: false }).unwrap());
        assert!(!signed_in.evaluate(&Session { user: None, active: false }).unwrap());
    }

    #[test]
    fn predicate_invoked_every_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let cond = Condition::when(move |_: &()| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });
        cond.evaluate(&()).unwrap();
        cond.evaluate(&()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn try_when_propagates_error() {
        let cond = Condition::try_when(|_: &()| Err::<bool, _>("database unavailable"));
        let err = cond.evaluate(&()).unwrap_err();
        assert_eq!(err.to_string(), "database unavailable");
    }

    #[test]
    fn table_resolves_names() {
        let table: ConditionTable<Session> = ConditionTable::new()
            .with("active", Condition::when(|s: &Session| s.active))
            .with("maintenance", false);
        assert!(table.contains("active"));
        let active = table.resolve("active").unwrap();
        assert!(active.evaluate(&Session { user: None, active: true }).unwrap());
        let maintenance = table.resolve("maintenance").unwrap();
        assert!(!maintenance.evaluate(&Session { user: None, active: true }).unwrap());
    }

    #[test]
    fn table_unknown_name() {
        let table: ConditionTable = ConditionTable::new();
        assert!(matches!(
            table.resolve("current_user.active?"),
            Err(ConfigError::UnknownCondition(name)) if name == "current_user.active?"
        ));
    }
}
