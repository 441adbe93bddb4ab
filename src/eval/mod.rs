pub mod condition;
pub mod decision;

pub use condition::{Condition, ConditionTable};
pub use decision::{Ruling, Verdict};

use crate::error::DecisionError;
use crate::registry::Registry;
use crate::trigger::AccessClass;

/// Decide whether `path` may be accessed.
///
/// 1. The safe zone (exact string equality, never a pattern match) is always allowed.
/// 2. Triggers are evaluated in registration order. The first whose condition
///    is true decides: a restricted match denies, otherwise an unrestricted
///    match allows, otherwise the trigger's default access applies.
/// 3. If no trigger fires the path is allowed.
///
/// Conditions after the deciding trigger are never evaluated. A failing
/// condition aborts the decision with [`DecisionError::Condition`].
pub fn decide<C>(path: &str, registry: &Registry<C>, ctx: &C) -> Result<Ruling, DecisionError> {
    if registry.safe_zone() == Some(path) {
        return Ok(Ruling {
            verdict: Verdict::Allow,
            reason: "safe zone".into(),
            trigger: None,
        });
    }

    for (trigger, rules) in registry.iter() {
        let fired = trigger
            .condition
            .evaluate(ctx)
            .map_err(|source| DecisionError::Condition {
                trigger: trigger.id,
                label: trigger.label.clone(),
                source,
            })?;
        if !fired {
            continue;
        }

        let ruling = if let Some(p) = rules.patterns(AccessClass::Restricted).first_match(path) {
            Ruling {
                verdict: Verdict::Deny,
                reason: format!("restricted area {p} under {}", trigger.describe()),
                trigger: Some(trigger.id),
            }
        } else if let Some(p) = rules.patterns(AccessClass::Unrestricted).first_match(path) {
            Ruling {
                verdict: Verdict::Allow,
                reason: format!("unrestricted area {p} under {}", trigger.describe()),
                trigger: Some(trigger.id),
            }
        } else {
            let verdict = match trigger.default_access {
                AccessClass::Restricted => Verdict::Deny,
                AccessClass::Unrestricted => Verdict::Allow,
            };
            Ruling {
                verdict,
                reason: format!(
                    "no area matched; {} defaults to {}",
                    trigger.describe(),
                    trigger.default_access
                ),
                trigger: Some(trigger.id),
            }
        };
        log::debug!("{path} -> {}: {}", ruling.verdict.label(), ruling.reason);
        return Ok(ruling);
    }

    Ok(Ruling {
        verdict: Verdict::Allow,
        reason: "no trigger fired".into(),
        trigger: None,
    })
}
