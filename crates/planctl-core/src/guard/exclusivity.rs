//! Publish exclusivity for native (Kafka-like) APIs: at most one
//! authentication style may be live at a time.
//!
//! Published plans fall into three buckets: keyless, mTLS, and
//! authenticated (API key, JWT, OAuth2). Publishing a plan from a bucket
//! that differs from an already published plan's bucket closes those plans
//! first; the user acknowledges the closures by typing the plan name back.

use anyhow::Result;
use futures::future::try_join_all;

use planctl_client::http::ManagementClient;
use planctl_client::models::{Api, Plan, PlanSecurityType, PlanStatus};
use planctl_client::plans;

use crate::lifecycle::dispatch;

use super::{ConfirmationPrompt, publish_prompt};

// ---------------------------------------------------------------------------
// Buckets
// ---------------------------------------------------------------------------

/// The authentication style a plan occupies on a native API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityBucket {
    /// KEY_LESS: open access, no challenge.
    Keyless,
    /// MTLS: client-certificate authentication.
    Mtls,
    /// API_KEY, JWT or OAUTH2: per-application credentials.
    Authenticated,
}

/// The bucket `plan` belongs to. Plans without a security block count as
/// authenticated; the plan menu never offers them on native APIs.
pub fn bucket_of(plan: &Plan) -> SecurityBucket {
    match plan.security_type() {
        Some(PlanSecurityType::KeyLess) => SecurityBucket::Keyless,
        Some(PlanSecurityType::Mtls) => SecurityBucket::Mtls,
        _ => SecurityBucket::Authenticated,
    }
}

/// The published plans whose bucket differs from `candidate`'s. The
/// candidate itself never conflicts, even when already listed as published.
pub fn conflicting_plans(published: Vec<Plan>, candidate: &Plan) -> Vec<Plan> {
    let bucket = bucket_of(candidate);
    published
        .into_iter()
        .filter(|plan| plan.id != candidate.id && bucket_of(plan) != bucket)
        .collect()
}

// ---------------------------------------------------------------------------
// Check
// ---------------------------------------------------------------------------

/// What publishing a plan requires, after the exclusivity check.
#[derive(Debug, Clone)]
pub enum PublishCheck {
    /// No conflicting published plan: plain confirmation, publish only.
    Simple { prompt: ConfirmationPrompt },
    /// Conflicting published plans exist. The prompt lists them and demands
    /// the plan name; on confirm every conflict is closed before the
    /// publish goes out.
    Exclusive {
        prompt: ConfirmationPrompt,
        conflicts: Vec<Plan>,
    },
}

impl PublishCheck {
    pub fn prompt(&self) -> &ConfirmationPrompt {
        match self {
            Self::Simple { prompt } | Self::Exclusive { prompt, .. } => prompt,
        }
    }
}

/// Run the pre-publish check for `plan` on `api`.
///
/// Non-native APIs always get the plain confirmation without any fetch.
/// For native APIs the currently published plans are fetched and
/// partitioned; a cross-bucket candidate yields [`PublishCheck::Exclusive`].
/// With zero published plans the check is trivially simple, so confirming
/// issues exactly one request (the publish itself).
pub async fn check_publish(
    client: &ManagementClient,
    api: &Api,
    plan: &Plan,
) -> Result<PublishCheck> {
    if !api.is_native() {
        return Ok(PublishCheck::Simple {
            prompt: publish_prompt(plan),
        });
    }

    let published = plans::list_plans(client, &api.id, &[PlanStatus::Published]).await?;
    let conflicts = conflicting_plans(published, plan);

    if conflicts.is_empty() {
        return Ok(PublishCheck::Simple {
            prompt: publish_prompt(plan),
        });
    }

    tracing::debug!(
        plan_name = %plan.name,
        conflicts = conflicts.len(),
        "publish requires closing conflicting plans"
    );

    Ok(PublishCheck::Exclusive {
        prompt: exclusive_publish_prompt(plan, &conflicts),
        conflicts,
    })
}

fn exclusive_publish_prompt(plan: &Plan, conflicts: &[Plan]) -> ConfirmationPrompt {
    let names = conflicts
        .iter()
        .map(|conflict| conflict.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    ConfirmationPrompt::type_to_confirm(
        "Publish plan",
        format!(
            "A native API exposes a single authentication style at a time. \
             Publishing the plan {} will close the following published plan(s): {names}.",
            plan.name
        ),
        "Publish",
        &plan.name,
    )
}

/// Close every conflicting plan in parallel, then publish `plan`.
///
/// All closes are awaited before the publish is issued; a failing close
/// aborts the whole operation and the publish never goes out.
pub async fn execute_publish(
    client: &ManagementClient,
    api_id: &str,
    plan: &Plan,
    conflicts: &[Plan],
) -> Result<Plan> {
    try_join_all(
        conflicts
            .iter()
            .map(|conflict| dispatch::close(client, api_id, conflict)),
    )
    .await?;

    dispatch::publish(client, api_id, plan).await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
