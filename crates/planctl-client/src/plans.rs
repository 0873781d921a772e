use serde::Serialize;

use crate::error::ClientError;
use crate::http::ManagementClient;
use crate::models::{Plan, PlanStatus, PlansPage};

/// List plans for an API, filtered to the given statuses.
///
/// A single page is requested, sized beyond any realistic plan count; the
/// console never pages plan lists.
pub async fn list_plans(
    client: &ManagementClient,
    api_id: &str,
    statuses: &[PlanStatus],
) -> Result<Vec<Plan>, ClientError> {
    let statuses = statuses
        .iter()
        .map(PlanStatus::to_string)
        .collect::<Vec<_>>()
        .join(",");
    let page: PlansPage = client
        .get_json(&format!(
            "/apis/{api_id}/plans?page=1&perPage=9999&statuses={statuses}"
        ))
        .await?;
    Ok(page.data)
}

/// Fetch a single plan.
pub async fn get_plan(
    client: &ManagementClient,
    api_id: &str,
    plan_id: &str,
) -> Result<Plan, ClientError> {
    client
        .get_json(&format!("/apis/{api_id}/plans/{plan_id}"))
        .await
}

/// Create a plan. The body shape depends on the API's definition version,
/// so callers assemble it and pass any serializable payload.
pub async fn create_plan<B>(
    client: &ManagementClient,
    api_id: &str,
    body: &B,
) -> Result<Plan, ClientError>
where
    B: Serialize + ?Sized,
{
    client.post_json(&format!("/apis/{api_id}/plans"), body).await
}

/// Replace a plan. Updates are full-replace: the body must carry every
/// field, not just the changed ones.
pub async fn update_plan(
    client: &ManagementClient,
    api_id: &str,
    plan: &Plan,
) -> Result<Plan, ClientError> {
    client
        .put_json(&format!("/apis/{api_id}/plans/{}", plan.id), plan)
        .await
}

/// Request a STAGING -> PUBLISHED transition. The backend applies the state
/// change; the request body is intentionally empty.
pub async fn publish_plan(
    client: &ManagementClient,
    api_id: &str,
    plan_id: &str,
) -> Result<Plan, ClientError> {
    client
        .post_json(
            &format!("/apis/{api_id}/plans/{plan_id}/_publish"),
            &serde_json::json!({}),
        )
        .await
}

/// Request a PUBLISHED -> DEPRECATED transition.
pub async fn deprecate_plan(
    client: &ManagementClient,
    api_id: &str,
    plan_id: &str,
) -> Result<Plan, ClientError> {
    client
        .post_json(
            &format!("/apis/{api_id}/plans/{plan_id}/_deprecate"),
            &serde_json::json!({}),
        )
        .await
}

/// Request a transition to CLOSED. Closing also closes the plan's
/// subscriptions, server-side.
pub async fn close_plan(
    client: &ManagementClient,
    api_id: &str,
    plan_id: &str,
) -> Result<Plan, ClientError> {
    client
        .post_json(
            &format!("/apis/{api_id}/plans/{plan_id}/_close"),
            &serde_json::json!({}),
        )
        .await
}
