//! Transition guard: what the user must confirm before a lifecycle action
//! is sent, and what notification the outcome produces.
//!
//! Every mutating transition goes through a prompt first. Publish and
//! deprecate take a plain confirmation; close is irreversible and always
//! requires typing the plan name back. Closing also sizes its warning by
//! fetching the plan's subscriptions, and publishing on a native API runs
//! the mutual-exclusivity check in [`exclusivity`].

pub mod exclusivity;

use anyhow::Result;

use planctl_client::http::ManagementClient;
use planctl_client::models::{Plan, PlanSecurityType, SubscriptionStatus};
use planctl_client::subscriptions;

use crate::lifecycle::PlanAction;

/// Subscription statuses counted when sizing the close warning. Closed and
/// rejected subscriptions are included on purpose: the prompt reports
/// everything attached to the plan, not just live traffic.
pub const CLOSE_SIZING_STATUSES: [SubscriptionStatus; 5] = [
    SubscriptionStatus::Accepted,
    SubscriptionStatus::Pending,
    SubscriptionStatus::Rejected,
    SubscriptionStatus::Closed,
    SubscriptionStatus::Paused,
];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How a prompt is acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationKind {
    /// A plain yes/no confirmation.
    Confirm,
    /// The user must type `expected` back before the action proceeds.
    TypeToConfirm { expected: String },
}

/// A confirmation dialog to present before executing a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationPrompt {
    pub title: String,
    pub message: String,
    /// Label of the confirming control ("Publish", "Yes, close this plan.").
    pub confirm_label: String,
    pub kind: ConfirmationKind,
}

impl ConfirmationPrompt {
    fn confirm(
        title: impl Into<String>,
        message: impl Into<String>,
        confirm_label: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            confirm_label: confirm_label.into(),
            kind: ConfirmationKind::Confirm,
        }
    }

    fn type_to_confirm(
        title: impl Into<String>,
        message: impl Into<String>,
        confirm_label: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            confirm_label: confirm_label.into(),
            kind: ConfirmationKind::TypeToConfirm {
                expected: expected.into(),
            },
        }
    }

    /// Whether `input` satisfies the prompt's acknowledgement rule.
    pub fn accepts(&self, input: &str) -> bool {
        match &self.kind {
            ConfirmationKind::Confirm => true,
            ConfirmationKind::TypeToConfirm { expected } => input.trim() == expected,
        }
    }
}

/// Outcome banner for a finished (or failed) action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Error(String),
}

impl Notification {
    pub fn text(&self) -> &str {
        match self {
            Self::Success(s) | Self::Error(s) => s,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// The success banner shown after `action` completed for `plan`.
pub fn success_notification(plan: &Plan, action: PlanAction) -> Notification {
    Notification::Success(format!(
        "The plan {} has been {} with success.",
        plan.name,
        action.past_tense()
    ))
}

/// The error banner for a failed action. The backend message is shown
/// verbatim.
pub fn error_notification(error: &anyhow::Error) -> Notification {
    Notification::Error(error.to_string())
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

/// The plain confirmation shown before publishing on a non-native API (and
/// on a native API without conflicting published plans).
pub fn publish_prompt(plan: &Plan) -> ConfirmationPrompt {
    ConfirmationPrompt::confirm(
        "Publish plan",
        format!("Are you sure you want to publish the plan {}?", plan.name),
        "Publish",
    )
}

/// The confirmation shown before deprecating a plan.
pub fn deprecate_prompt(plan: &Plan) -> ConfirmationPrompt {
    ConfirmationPrompt::confirm(
        "Deprecate plan",
        format!(
            "Are you sure you want to deprecate the plan {}? \
             Existing subscriptions keep working, but applications can no longer subscribe to it.",
            plan.name
        ),
        "Deprecate",
    )
}

/// Build the close confirmation for `plan`.
///
/// Fetches the plan's subscriptions first to size the warning:
/// no subscriptions and the plan can be deleted safely, otherwise the count
/// of subscriptions that will be closed alongside, with a distinct warning
/// for keyless plans whose consumers are not tracked by subscriptions at
/// all. Close is irreversible, so the prompt always demands the plan name
/// to be typed back.
pub async fn close_prompt(
    client: &ManagementClient,
    api_id: &str,
    plan: &Plan,
) -> Result<ConfirmationPrompt> {
    let page =
        subscriptions::list_subscriptions(client, api_id, &plan.id, &CLOSE_SIZING_STATUSES).await?;
    Ok(close_prompt_for_count(plan, page.total()))
}

/// The close confirmation given an already known subscription count.
pub fn close_prompt_for_count(plan: &Plan, subscription_count: usize) -> ConfirmationPrompt {
    let message = if plan.security_type() == Some(PlanSecurityType::KeyLess) {
        format!(
            "The plan {} is keyless: applications consume the API without subscribing. \
             Closing it removes all open access to the API through this plan.",
            plan.name
        )
    } else if subscription_count == 0 {
        format!(
            "No subscription is associated to the plan {}. You can delete it safely.",
            plan.name
        )
    } else {
        format!(
            "There are {subscription_count} subscription(s) associated to the plan {}. \
             All subscriptions will be closed.",
            plan.name
        )
    };

    ConfirmationPrompt::type_to_confirm("Close plan", message, "Yes, close this plan.", &plan.name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use planctl_client::models::PlanSecurity;

    fn plan(name: &str, security: Option<PlanSecurityType>) -> Plan {
        let json = serde_json::json!({
            "id": "p1",
            "name": name,
            "status": "PUBLISHED",
            "definitionVersion": "V4",
        });
        let mut plan: Plan = serde_json::from_value(json).expect("plan fixture");
        plan.security = security.map(|security_type| PlanSecurity {
            security_type,
            configuration: None,
        });
        plan
    }

    #[test]
    fn publish_prompt_is_simple_confirm() {
        let prompt = publish_prompt(&plan("Gold", Some(PlanSecurityType::ApiKey)));
        assert_eq!(prompt.kind, ConfirmationKind::Confirm);
        assert_eq!(
            prompt.message,
            "Are you sure you want to publish the plan Gold?"
        );
        assert_eq!(prompt.confirm_label, "Publish");
    }

    #[test]
    fn deprecate_prompt_mentions_existing_subscriptions() {
        let prompt = deprecate_prompt(&plan("Gold", Some(PlanSecurityType::ApiKey)));
        assert_eq!(prompt.kind, ConfirmationKind::Confirm);
        assert!(prompt.message.contains("Existing subscriptions keep working"));
    }

    #[test]
    fn close_prompt_without_subscriptions_is_safe_to_delete() {
        let prompt = close_prompt_for_count(&plan("Gold", Some(PlanSecurityType::ApiKey)), 0);
        assert!(prompt.message.contains("You can delete it safely."));
        assert_eq!(
            prompt.kind,
            ConfirmationKind::TypeToConfirm {
                expected: "Gold".to_owned()
            }
        );
        assert_eq!(prompt.confirm_label, "Yes, close this plan.");
    }

    #[test]
    fn close_prompt_counts_subscriptions() {
        let prompt = close_prompt_for_count(&plan("Gold", Some(PlanSecurityType::ApiKey)), 3);
        assert!(prompt.message.contains("3 subscription(s)"));
        assert!(prompt.message.contains("All subscriptions will be closed."));
    }

    #[test]
    fn close_prompt_warns_about_keyless_open_access() {
        let prompt = close_prompt_for_count(&plan("Open", Some(PlanSecurityType::KeyLess)), 0);
        assert!(prompt.message.contains("removes all open access"));
        assert_eq!(
            prompt.kind,
            ConfirmationKind::TypeToConfirm {
                expected: "Open".to_owned()
            }
        );
    }

    #[test]
    fn type_to_confirm_requires_exact_name() {
        let prompt = close_prompt_for_count(&plan("Gold", None), 0);
        assert!(prompt.accepts("Gold"));
        assert!(prompt.accepts("  Gold  "));
        assert!(!prompt.accepts("gold"));
        assert!(!prompt.accepts(""));
    }

    #[test]
    fn success_notification_copy() {
        let plan = plan("Gold", None);
        assert_eq!(
            success_notification(&plan, PlanAction::Publish).text(),
            "The plan Gold has been published with success."
        );
        assert_eq!(
            success_notification(&plan, PlanAction::Deprecate).text(),
            "The plan Gold has been deprecated with success."
        );
        assert_eq!(
            success_notification(&plan, PlanAction::Close).text(),
            "The plan Gold has been closed with success."
        );
    }
}
