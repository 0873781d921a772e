//! Plan lifecycle: the transition table for plan statuses and the actions a
//! plan offers at each stage.
//!
//! Valid transitions:
//!
//! ```text
//! STAGING ──publish──> PUBLISHED ──deprecate──> DEPRECATED
//!    │                     │                        │
//!    └───────close─────────┴─────────close──────────┘
//!                          │
//!                          v
//!                       CLOSED (terminal)
//! ```
//!
//! CLOSED offers no further actions. A deprecated plan can only be closed;
//! re-publishing it is not supported.

pub mod dispatch;

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};

use planctl_client::models::{Plan, PlanStatus};

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// A lifecycle action that moves a plan to a new status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanAction {
    /// `STAGING -> PUBLISHED`. Makes the plan subscribable.
    Publish,
    /// `PUBLISHED -> DEPRECATED`. Existing subscriptions keep working but no
    /// new ones can be created.
    Deprecate,
    /// `* -> CLOSED`. Terminal; closes every subscription on the plan.
    Close,
}

impl PlanAction {
    /// The status a plan lands in after this action succeeds.
    pub fn target_status(self) -> PlanStatus {
        match self {
            Self::Publish => PlanStatus::Published,
            Self::Deprecate => PlanStatus::Deprecated,
            Self::Close => PlanStatus::Closed,
        }
    }

    /// Past participle used in success notifications ("has been published").
    pub fn past_tense(self) -> &'static str {
        match self {
            Self::Publish => "published",
            Self::Deprecate => "deprecated",
            Self::Close => "closed",
        }
    }
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Publish => f.write_str("publish"),
            Self::Deprecate => f.write_str("deprecate"),
            Self::Close => f.write_str("close"),
        }
    }
}

impl FromStr for PlanAction {
    type Err = PlanActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "publish" => Ok(Self::Publish),
            "deprecate" => Ok(Self::Deprecate),
            "close" => Ok(Self::Close),
            _ => Err(PlanActionParseError(s.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid plan action string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanActionParseError(pub String);

impl fmt::Display for PlanActionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid plan action: {:?}", self.0)
    }
}

impl std::error::Error for PlanActionParseError {}

// ---------------------------------------------------------------------------
// Transition table
// ---------------------------------------------------------------------------

/// The actions available for a plan in the given status, in display order.
pub fn allowed_actions(status: PlanStatus) -> &'static [PlanAction] {
    match status {
        PlanStatus::Staging => &[PlanAction::Publish, PlanAction::Close],
        PlanStatus::Published => &[PlanAction::Deprecate, PlanAction::Close],
        PlanStatus::Deprecated => &[PlanAction::Close],
        PlanStatus::Closed => &[],
    }
}

/// Whether `action` may be applied to a plan in `status`.
pub fn is_action_allowed(status: PlanStatus, action: PlanAction) -> bool {
    matches!(
        (status, action),
        (PlanStatus::Staging, PlanAction::Publish)
            | (PlanStatus::Staging, PlanAction::Close)
            | (PlanStatus::Published, PlanAction::Deprecate)
            | (PlanStatus::Published, PlanAction::Close)
            | (PlanStatus::Deprecated, PlanAction::Close)
    )
}

/// Whether a plan may move directly from `from` to `to`.
pub fn is_valid_transition(from: PlanStatus, to: PlanStatus) -> bool {
    matches!(
        (from, to),
        (PlanStatus::Staging, PlanStatus::Published)
            | (PlanStatus::Staging, PlanStatus::Closed)
            | (PlanStatus::Published, PlanStatus::Deprecated)
            | (PlanStatus::Published, PlanStatus::Closed)
            | (PlanStatus::Deprecated, PlanStatus::Closed)
    )
}

/// Validate that `action` is allowed for `plan` in its current status.
pub fn ensure_allowed(plan: &Plan, action: PlanAction) -> Result<()> {
    if !is_action_allowed(plan.status, action) {
        bail!(
            "invalid lifecycle transition: {} -> {} for plan {}",
            plan.status,
            action.target_status(),
            plan.name
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_offers_publish_and_close() {
        assert_eq!(
            allowed_actions(PlanStatus::Staging),
            &[PlanAction::Publish, PlanAction::Close]
        );
    }

    #[test]
    fn published_offers_deprecate_and_close() {
        assert_eq!(
            allowed_actions(PlanStatus::Published),
            &[PlanAction::Deprecate, PlanAction::Close]
        );
    }

    #[test]
    fn deprecated_offers_only_close() {
        assert_eq!(allowed_actions(PlanStatus::Deprecated), &[PlanAction::Close]);
    }

    #[test]
    fn closed_is_terminal() {
        assert!(allowed_actions(PlanStatus::Closed).is_empty());
        for action in [PlanAction::Publish, PlanAction::Deprecate, PlanAction::Close] {
            assert!(!is_action_allowed(PlanStatus::Closed, action));
        }
    }

    #[test]
    fn allowed_actions_matches_transition_table() {
        for status in PlanStatus::ALL {
            for action in [PlanAction::Publish, PlanAction::Deprecate, PlanAction::Close] {
                assert_eq!(
                    allowed_actions(status).contains(&action),
                    is_action_allowed(status, action),
                    "{status} / {action}"
                );
            }
        }
    }

    #[test]
    fn deprecated_cannot_be_republished() {
        assert!(!is_action_allowed(PlanStatus::Deprecated, PlanAction::Publish));
        assert!(!is_valid_transition(PlanStatus::Deprecated, PlanStatus::Published));
    }

    #[test]
    fn action_parse_round_trip() {
        for action in [PlanAction::Publish, PlanAction::Deprecate, PlanAction::Close] {
            let parsed: PlanAction = action.to_string().parse().expect("should parse");
            assert_eq!(action, parsed);
        }
    }

    #[test]
    fn action_parse_rejects_unknown() {
        let err = "reopen".parse::<PlanAction>().unwrap_err();
        assert_eq!(err.to_string(), "invalid plan action: \"reopen\"");
    }

    #[test]
    fn target_statuses() {
        assert_eq!(PlanAction::Publish.target_status(), PlanStatus::Published);
        assert_eq!(PlanAction::Deprecate.target_status(), PlanStatus::Deprecated);
        assert_eq!(PlanAction::Close.target_status(), PlanStatus::Closed);
    }
}
