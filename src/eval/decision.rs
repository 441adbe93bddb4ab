use serde::Serialize;

use crate::trigger::TriggerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Allow,
    Deny,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Allow => "allow",
            Verdict::Deny => "deny",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Verdict::Allow => "ALLOW",
            Verdict::Deny => "DENY",
        }
    }
}

/// A verdict plus which rule produced it.
#[derive(Debug, Clone)]
pub struct Ruling {
    pub verdict: Verdict,
    pub reason: String,
    /// The trigger that decided, or `None` for the safe zone and the no-trigger default.
    pub trigger: Option<TriggerId>,
}
