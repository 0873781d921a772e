//! Wire-level tests for the management API client against the in-process
//! mock: paths, query encoding, body shapes and error mapping.

use serde_json::json;

use planctl_client::config::ClientConfig;
use planctl_client::error::ClientError;
use planctl_client::http::ManagementClient;
use planctl_client::models::{PlanSecurityType, PlanStatus, SubscriptionStatus};
use planctl_client::{apis, plans, subscriptions};

use planctl_test_utils::{MockApi, api_fixture, plan_fixture, subscription_fixture};

const API_ID: &str = "api-1";

fn client_for(mock: &MockApi) -> ManagementClient {
    ManagementClient::new(&ClientConfig::new(mock.url())).expect("client should build")
}

// ---------------------------------------------------------------------------
// APIs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_api_decodes_the_definition() {
    let mock = MockApi::start().await;
    mock.seed_api(api_fixture(API_ID));
    let client = client_for(&mock);

    let api = apis::get_api(&client, API_ID).await.expect("api should load");
    assert_eq!(api.id, API_ID);
    assert!(!api.is_native(), "the fixture is an HTTP proxy API");

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, format!("/apis/{API_ID}"));
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_plans_requests_one_oversized_page_with_statuses() {
    let mock = MockApi::start().await;
    mock.seed_api(api_fixture(API_ID));
    mock.seed_plan(plan_fixture(API_ID, "p1", "Gold", PlanStatus::Published, PlanSecurityType::ApiKey));
    mock.seed_plan(plan_fixture(API_ID, "p2", "Draft", PlanStatus::Staging, PlanSecurityType::ApiKey));
    let client = client_for(&mock);

    let listed = plans::list_plans(&client, API_ID, &[PlanStatus::Published])
        .await
        .expect("list should succeed");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Gold");

    let request = &mock.requests()[0];
    assert_eq!(request.query_param("page"), Some("1"));
    assert_eq!(request.query_param("perPage"), Some("9999"));
    assert_eq!(request.query_param("statuses"), Some("PUBLISHED"));
}

#[tokio::test]
async fn list_plans_joins_multiple_statuses() {
    let mock = MockApi::start().await;
    mock.seed_api(api_fixture(API_ID));
    let client = client_for(&mock);

    plans::list_plans(&client, API_ID, &[PlanStatus::Staging, PlanStatus::Deprecated])
        .await
        .expect("list should succeed");

    let request = &mock.requests()[0];
    assert_eq!(request.query_param("statuses"), Some("STAGING,DEPRECATED"));
}

#[tokio::test]
async fn create_and_update_round_trip() {
    let mock = MockApi::start().await;
    mock.seed_api(api_fixture(API_ID));
    let client = client_for(&mock);

    let created = plans::create_plan(
        &client,
        API_ID,
        &json!({
            "definitionVersion": "V4",
            "name": "Bronze",
            "description": "Entry tier",
            "security": { "type": "API_KEY", "configuration": {} },
        }),
    )
    .await
    .expect("create should succeed");
    assert_eq!(created.status, PlanStatus::Staging, "plans are born staging");
    assert_eq!(created.security_type(), Some(PlanSecurityType::ApiKey));

    let mut edited = created.clone();
    edited.name = "Bronze v2".to_owned();
    let updated = plans::update_plan(&client, API_ID, &edited)
        .await
        .expect("update should succeed");
    assert_eq!(updated.name, "Bronze v2");

    let puts = mock.requests_matching("PUT", &format!("/plans/{}", created.id));
    assert_eq!(puts.len(), 1);
    assert_eq!(
        puts[0].body["description"], "Entry tier",
        "updates carry the full body"
    );
}

#[tokio::test]
async fn transition_posts_hit_the_underscore_endpoints() {
    let mock = MockApi::start().await;
    mock.seed_api(api_fixture(API_ID));
    mock.seed_plan(plan_fixture(API_ID, "p1", "Gold", PlanStatus::Staging, PlanSecurityType::ApiKey));
    let client = client_for(&mock);

    let published = plans::publish_plan(&client, API_ID, "p1")
        .await
        .expect("publish should succeed");
    assert_eq!(published.status, PlanStatus::Published);

    let deprecated = plans::deprecate_plan(&client, API_ID, "p1")
        .await
        .expect("deprecate should succeed");
    assert_eq!(deprecated.status, PlanStatus::Deprecated);

    let closed = plans::close_plan(&client, API_ID, "p1")
        .await
        .expect("close should succeed");
    assert_eq!(closed.status, PlanStatus::Closed);

    let paths: Vec<String> = mock.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(
        paths,
        [
            format!("/apis/{API_ID}/plans/p1/_publish"),
            format!("/apis/{API_ID}/plans/p1/_deprecate"),
            format!("/apis/{API_ID}/plans/p1/_close"),
        ]
    );
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_subscriptions_filters_by_plan_and_lowercase_status() {
    let mock = MockApi::start().await;
    mock.seed_api(api_fixture(API_ID));
    mock.seed_subscription(subscription_fixture("s1", "p1", SubscriptionStatus::Accepted));
    mock.seed_subscription(subscription_fixture("s2", "p1", SubscriptionStatus::Paused));
    mock.seed_subscription(subscription_fixture("s3", "p2", SubscriptionStatus::Accepted));
    let client = client_for(&mock);

    let page = subscriptions::list_subscriptions(
        &client,
        API_ID,
        "p1",
        &[SubscriptionStatus::Accepted, SubscriptionStatus::Paused],
    )
    .await
    .expect("list should succeed");
    assert_eq!(page.total(), 2);
    assert!(page.data.iter().all(|s| s.plan.as_deref() == Some("p1")));

    let request = &mock.requests()[0];
    assert_eq!(request.query_param("plan"), Some("p1"));
    assert_eq!(request.query_param("status"), Some("accepted,paused"));
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn backend_message_is_surfaced_verbatim() {
    let mock = MockApi::start().await;
    mock.seed_api(api_fixture(API_ID));
    mock.seed_plan(plan_fixture(API_ID, "p1", "Gold", PlanStatus::Published, PlanSecurityType::ApiKey));
    let client = client_for(&mock);

    // The backend rejects a second publish; its message travels untouched.
    let err = plans::publish_plan(&client, API_ID, "p1")
        .await
        .expect_err("publishing a published plan must fail");
    assert_eq!(
        err.to_string(),
        "The plan [p1] cannot move from PUBLISHED to PUBLISHED."
    );
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn not_found_carries_the_status_and_message() {
    let mock = MockApi::start().await;
    mock.seed_api(api_fixture(API_ID));
    let client = client_for(&mock);

    let err = apis::get_api(&client, "unknown")
        .await
        .expect_err("unknown api must 404");
    assert!(matches!(err, ClientError::Api { status: 404, .. }));
    assert_eq!(err.to_string(), "Api [unknown] cannot be found.");
}

#[tokio::test]
async fn connection_failures_map_to_transport_errors() {
    // A port nothing listens on.
    let config = ClientConfig::new("http://127.0.0.1:1");
    let client = ManagementClient::new(&config).expect("client should build");

    let err = apis::get_api(&client, API_ID)
        .await
        .expect_err("nothing is listening");
    assert!(matches!(err, ClientError::Transport(_)));
    assert!(err.status().is_none());
    assert!(err.to_string().starts_with("request failed:"));
}
