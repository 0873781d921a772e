use crate::error::ClientError;
use crate::http::ManagementClient;
use crate::models::{SubscriptionStatus, SubscriptionsPage};

/// List subscriptions bound to a plan, filtered to the given statuses.
///
/// The status filter travels lowercase on the wire, unlike every other
/// status token this API exchanges.
pub async fn list_subscriptions(
    client: &ManagementClient,
    api_id: &str,
    plan_id: &str,
    statuses: &[SubscriptionStatus],
) -> Result<SubscriptionsPage, ClientError> {
    let status = statuses
        .iter()
        .map(|s| s.to_string().to_lowercase())
        .collect::<Vec<_>>()
        .join(",");
    client
        .get_json(&format!(
            "/apis/{api_id}/subscriptions?plan={plan_id}&status={status}"
        ))
        .await
}
