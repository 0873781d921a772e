//! Semantic lifecycle helpers.
//!
//! Thin wrappers over the management API transition endpoints that validate
//! the move against the transition table before issuing it. Backend failures
//! are propagated untouched so their message can be shown verbatim.

use anyhow::Result;

use planctl_client::http::ManagementClient;
use planctl_client::models::Plan;
use planctl_client::plans;

use super::{PlanAction, ensure_allowed};

/// Publish a plan: `STAGING -> PUBLISHED`.
pub async fn publish(client: &ManagementClient, api_id: &str, plan: &Plan) -> Result<Plan> {
    apply(client, api_id, plan, PlanAction::Publish).await
}

/// Deprecate a plan: `PUBLISHED -> DEPRECATED`.
pub async fn deprecate(client: &ManagementClient, api_id: &str, plan: &Plan) -> Result<Plan> {
    apply(client, api_id, plan, PlanAction::Deprecate).await
}

/// Close a plan: `STAGING | PUBLISHED | DEPRECATED -> CLOSED`.
pub async fn close(client: &ManagementClient, api_id: &str, plan: &Plan) -> Result<Plan> {
    apply(client, api_id, plan, PlanAction::Close).await
}

/// Validate and execute a lifecycle action against the management API.
pub async fn apply(
    client: &ManagementClient,
    api_id: &str,
    plan: &Plan,
    action: PlanAction,
) -> Result<Plan> {
    ensure_allowed(plan, action)?;

    let updated = match action {
        PlanAction::Publish => plans::publish_plan(client, api_id, &plan.id).await?,
        PlanAction::Deprecate => plans::deprecate_plan(client, api_id, &plan.id).await?,
        PlanAction::Close => plans::close_plan(client, api_id, &plan.id).await?,
    };

    tracing::info!(
        plan_id = %plan.id,
        plan_name = %plan.name,
        action = %action,
        status = %updated.status,
        "plan transition applied"
    );

    Ok(updated)
}
