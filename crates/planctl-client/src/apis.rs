use crate::error::ClientError;
use crate::http::ManagementClient;
use crate::models::Api;

/// Fetch the API descriptor plan orchestration runs against.
///
/// Re-fetched after every successful plan mutation, since the API's
/// deployment state may have changed with it.
pub async fn get_api(client: &ManagementClient, api_id: &str) -> Result<Api, ClientError> {
    client.get_json(&format!("/apis/{api_id}")).await
}
