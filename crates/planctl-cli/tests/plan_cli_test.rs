//! End-to-end tests for the workflows the `planctl plan` commands wire
//! together: wizard create, guarded lifecycle transitions, exclusive
//! publish on native APIs, reordering through the list coordinator, and
//! write-access gating. Everything runs against the in-process management
//! API mock.

use planctl_client::apis;
use planctl_client::config::ClientConfig;
use planctl_client::http::ManagementClient;
use planctl_client::models::{
    ApiOrigin, DefinitionContext, PlanSecurityType, PlanStatus, SubscriptionStatus,
};

use planctl_core::access::{self, DenyReason, PermissionSet, WriteAccess};
use planctl_core::guard::exclusivity::{self, PublishCheck};
use planctl_core::guard::{self, ConfirmationKind};
use planctl_core::lifecycle::{self, PlanAction, dispatch};
use planctl_core::list::{self, Command, ListEvent, ListState};
use planctl_core::wizard::{PlanKind, PlanWizard};

use planctl_test_utils::{
    MockApi, api_fixture, native_api_fixture, plan_fixture, subscription_fixture,
};

const API_ID: &str = "api-1";

fn client_for(mock: &MockApi) -> ManagementClient {
    ManagementClient::new(&ClientConfig::new(mock.url())).expect("client should build")
}

/// Drain coordinator commands to quiescence, as the CLI commands do.
async fn settle(
    client: &ManagementClient,
    api_id: &str,
    state: &mut ListState,
    commands: Vec<Command>,
) {
    let mut queue = commands;
    while let Some(command) = queue.pop() {
        let event = list::execute(client, api_id, command).await;
        let mut next = list::apply(state, event);
        queue.append(&mut next);
    }
}

// ---------------------------------------------------------------------------
// Full lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_create_publish_deprecate_close_workflow() {
    let mock = MockApi::start().await;
    let api = api_fixture(API_ID);
    mock.seed_api(api.clone());
    let client = client_for(&mock);

    // Create through the wizard, as `plan create` does.
    let mut wizard = PlanWizard::create(api.clone(), PlanKind::ApiKey);
    wizard.draft.name = "Gold".to_owned();
    wizard.draft.description = "Paid tier".to_owned();
    let outcome = wizard
        .submit_create(&client)
        .await
        .expect("create should succeed");
    let plan = outcome.plan;
    assert_eq!(plan.status, PlanStatus::Staging);

    // Publish goes through the exclusivity check; an HTTP proxy API never
    // has conflicts, so the prompt is a plain confirmation.
    lifecycle::ensure_allowed(&plan, PlanAction::Publish).expect("publish allowed from staging");
    let check = exclusivity::check_publish(&client, &api, &plan)
        .await
        .expect("check should succeed");
    let PublishCheck::Simple { prompt } = check else {
        panic!("non-native APIs publish without conflicts");
    };
    assert_eq!(prompt.kind, ConfirmationKind::Confirm);

    let plan = dispatch::publish(&client, API_ID, &plan)
        .await
        .expect("publish should succeed");
    assert_eq!(plan.status, PlanStatus::Published);
    assert_eq!(
        guard::success_notification(&plan, PlanAction::Publish).text(),
        "The plan Gold has been published with success."
    );

    // Deprecate.
    let prompt = guard::deprecate_prompt(&plan);
    assert_eq!(prompt.kind, ConfirmationKind::Confirm);
    let plan = dispatch::deprecate(&client, API_ID, &plan)
        .await
        .expect("deprecate should succeed");
    assert_eq!(plan.status, PlanStatus::Deprecated);

    // Close demands the plan name and takes the subscriptions down with it.
    mock.seed_subscription(subscription_fixture("s1", &plan.id, SubscriptionStatus::Accepted));
    let prompt = guard::close_prompt(&client, API_ID, &plan)
        .await
        .expect("close prompt should build");
    assert!(matches!(
        prompt.kind,
        ConfirmationKind::TypeToConfirm { ref expected } if expected == "Gold"
    ));
    assert!(prompt.message.contains("1 subscription(s)"));
    assert!(prompt.accepts("Gold"));

    let plan = dispatch::close(&client, API_ID, &plan)
        .await
        .expect("close should succeed");
    assert_eq!(plan.status, PlanStatus::Closed);
    assert!(
        lifecycle::allowed_actions(plan.status).is_empty(),
        "closed is terminal"
    );
    assert_eq!(mock.subscriptions()[0].status, SubscriptionStatus::Closed);
}

#[tokio::test]
async fn disallowed_transitions_never_reach_the_wire() {
    let mock = MockApi::start().await;
    mock.seed_api(api_fixture(API_ID));
    let plan = plan_fixture(API_ID, "p1", "Gold", PlanStatus::Deprecated, PlanSecurityType::ApiKey);
    mock.seed_plan(plan.clone());
    let client = client_for(&mock);

    let err = dispatch::publish(&client, API_ID, &plan)
        .await
        .expect_err("deprecated plans cannot be published");
    assert!(err.to_string().contains("invalid lifecycle transition"));
    assert!(
        mock.requests_matching("POST", "_publish").is_empty(),
        "the request must be rejected client-side"
    );
}

// ---------------------------------------------------------------------------
// Exclusive publish on native APIs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn exclusive_publish_closes_the_conflicting_native_plan() {
    let mock = MockApi::start().await;
    let api = native_api_fixture(API_ID);
    mock.seed_api(api.clone());
    mock.seed_plan(plan_fixture(
        API_ID,
        "open",
        "Open",
        PlanStatus::Published,
        PlanSecurityType::KeyLess,
    ));
    let client = client_for(&mock);

    // A secured candidate next to a published keyless plan.
    let mut wizard = PlanWizard::create(api.clone(), PlanKind::Mtls);
    wizard.draft.name = "Secure".to_owned();
    let outcome = wizard
        .submit_create(&client)
        .await
        .expect("create should succeed");
    let candidate = outcome.plan;

    let check = exclusivity::check_publish(&client, &api, &candidate)
        .await
        .expect("check should succeed");
    let PublishCheck::Exclusive { prompt, conflicts } = check else {
        panic!("cross-bucket publish on a native API must be exclusive");
    };
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].name, "Open");
    assert!(prompt.message.contains("Open"));
    assert!(!prompt.accepts("wrong"), "the plan name must be typed back");
    assert!(prompt.accepts("Secure"));

    let published = exclusivity::execute_publish(&client, API_ID, &candidate, &conflicts)
        .await
        .expect("publish should succeed");
    assert_eq!(published.status, PlanStatus::Published);
    assert_eq!(mock.plan("open").expect("stored").status, PlanStatus::Closed);

    // The close must have been issued before the publish.
    let posts: Vec<String> = mock
        .requests()
        .into_iter()
        .filter(|r| r.method == "POST" && r.path.contains('_'))
        .map(|r| r.path)
        .collect();
    assert_eq!(posts.len(), 2);
    assert!(posts[0].ends_with("/plans/open/_close"));
    assert!(posts[1].ends_with(&format!("/plans/{}/_publish", published.id)));
}

// ---------------------------------------------------------------------------
// Close prompt sizing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn close_prompt_counts_subscriptions_across_all_statuses() {
    let mock = MockApi::start().await;
    mock.seed_api(api_fixture(API_ID));
    let plan = plan_fixture(API_ID, "p1", "Gold", PlanStatus::Published, PlanSecurityType::ApiKey);
    mock.seed_plan(plan.clone());
    mock.seed_subscription(subscription_fixture("s1", "p1", SubscriptionStatus::Accepted));
    mock.seed_subscription(subscription_fixture("s2", "p1", SubscriptionStatus::Pending));
    mock.seed_subscription(subscription_fixture("s3", "p1", SubscriptionStatus::Closed));
    let client = client_for(&mock);

    let prompt = guard::close_prompt(&client, API_ID, &plan)
        .await
        .expect("close prompt should build");
    assert!(
        prompt.message.contains("3 subscription(s)"),
        "closed subscriptions count too: {}",
        prompt.message
    );

    // Name acknowledgement: trimmed exact match, nothing else.
    assert!(prompt.accepts("  Gold  "));
    assert!(!prompt.accepts("gold"));
    assert!(!prompt.accepts(""));

    // The sizing fetch filters by plan and asks for every status.
    let fetches = mock.requests_matching("GET", "/subscriptions");
    assert_eq!(fetches.len(), 1);
    assert_eq!(fetches[0].query_param("plan"), Some("p1"));
    let status = fetches[0].query_param("status").expect("status filter");
    assert_eq!(status.split(',').count(), 5);
    assert_eq!(status, status.to_lowercase(), "statuses travel lowercase");
}

// ---------------------------------------------------------------------------
// Reorder
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reorder_puts_the_new_order_and_reloads() {
    let mock = MockApi::start().await;
    mock.seed_api(api_fixture(API_ID));
    for (id, name, order) in [("a", "Alpha", 1), ("b", "Bravo", 2), ("c", "Charlie", 3)] {
        let mut plan = plan_fixture(API_ID, id, name, PlanStatus::Published, PlanSecurityType::ApiKey);
        plan.order = order;
        mock.seed_plan(plan);
    }
    let client = client_for(&mock);

    let mut state = ListState::new(PlanStatus::Published);
    let commands = list::apply(&mut state, ListEvent::ReloadRequested);
    settle(&client, API_ID, &mut state, commands).await;
    let names: Vec<&str> = state.plans.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Alpha", "Bravo", "Charlie"]);

    // Drop Alpha to the bottom. The move is applied optimistically.
    let commands = list::apply(
        &mut state,
        ListEvent::ReorderMoved {
            plan_id: "a".to_owned(),
            to_index: 2,
        },
    );
    let names: Vec<&str> = state.plans.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Bravo", "Charlie", "Alpha"]);

    settle(&client, API_ID, &mut state, commands).await;
    assert!(state.error.is_none());

    let puts = mock.requests_matching("PUT", "/plans/a");
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].body["order"], 3);
    assert_eq!(mock.plan("a").expect("stored").order, 3);
}

#[tokio::test]
async fn failed_reorder_reverts_the_list() {
    let mock = MockApi::start().await;
    mock.seed_api(api_fixture(API_ID));
    for (id, name, order) in [("a", "Alpha", 1), ("b", "Bravo", 2)] {
        let mut plan = plan_fixture(API_ID, id, name, PlanStatus::Published, PlanSecurityType::ApiKey);
        plan.order = order;
        mock.seed_plan(plan);
    }
    let client = client_for(&mock);

    let mut state = ListState::new(PlanStatus::Published);
    let commands = list::apply(&mut state, ListEvent::ReloadRequested);
    settle(&client, API_ID, &mut state, commands).await;

    mock.fail_once("PUT", "/plans/a", 500, "Order update failed.");
    let commands = list::apply(
        &mut state,
        ListEvent::ReorderMoved {
            plan_id: "a".to_owned(),
            to_index: 1,
        },
    );
    settle(&client, API_ID, &mut state, commands).await;

    let names: Vec<&str> = state.plans.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Alpha", "Bravo"], "optimistic move rolled back");
    assert_eq!(state.error.as_deref(), Some("Order update failed."));
    assert_eq!(mock.plan("a").expect("stored").order, 1, "server untouched");
}

// ---------------------------------------------------------------------------
// Write access
// ---------------------------------------------------------------------------

#[tokio::test]
async fn kubernetes_managed_apis_are_read_only() {
    let mock = MockApi::start().await;
    let mut api = api_fixture(API_ID);
    api.definition_context = Some(DefinitionContext {
        origin: ApiOrigin::Kubernetes,
    });
    mock.seed_api(api);
    let client = client_for(&mock);

    let fetched = apis::get_api(&client, API_ID).await.expect("api should load");
    match access::write_access(&fetched, &PermissionSet::all()) {
        WriteAccess::Denied { reason } => {
            assert_eq!(reason, DenyReason::KubernetesOrigin);
            assert_eq!(
                reason.to_string(),
                "the API is managed by a Kubernetes operator"
            );
        }
        WriteAccess::Allowed => panic!("kubernetes-managed APIs must be read-only"),
    }
}
