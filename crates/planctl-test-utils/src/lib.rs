//! In-process mock of the management REST API for integration tests.
//!
//! Binds an axum server on an ephemeral port with seedable state. Tests
//! point a real client at [`MockApi::url`], drive the code under test, then
//! assert on the requests the mock recorded. The mock enforces the backend's
//! side of the plan state machine (publish only from STAGING, transitive
//! subscription close, and so on) so client-side orchestration is exercised
//! against honest answers.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use uuid::Uuid;

use planctl_client::models::{
    Api, ApiType, DefinitionVersion, Listener, ListenerType, Plan, PlanMode, PlanSecurity,
    PlanSecurityType, PlanStatus, PlanValidation, Subscription, SubscriptionStatus,
};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    fn with_status(status: u16, msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message: msg.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = json!({ "message": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Recorded traffic and state
// ---------------------------------------------------------------------------

/// One request the mock has served, failures included.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub body: Value,
}

impl RecordedRequest {
    /// Value of a query parameter, if present.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == name).then_some(value)
        })
    }
}

#[derive(Debug, Clone)]
struct PlannedFailure {
    method: String,
    path_fragment: String,
    status: u16,
    message: String,
}

#[derive(Default)]
struct ApiState {
    apis: HashMap<String, Api>,
    plans: HashMap<String, Plan>,
    subscriptions: Vec<Subscription>,
    requests: Vec<RecordedRequest>,
    failures: Vec<PlannedFailure>,
}

type SharedState = Arc<Mutex<ApiState>>;

/// Record the request, then serve a planned failure if one matches.
fn intercept(state: &mut ApiState, method: &str, uri: &Uri, body: Value) -> Option<AppError> {
    state.requests.push(RecordedRequest {
        method: method.to_owned(),
        path: uri.path().to_owned(),
        query: uri.query().unwrap_or_default().to_owned(),
        body,
    });

    let hit = state
        .failures
        .iter()
        .position(|f| f.method == method && uri.path().contains(&f.path_fragment))?;
    let failure = state.failures.remove(hit);
    Some(AppError::with_status(failure.status, failure.message))
}

// ---------------------------------------------------------------------------
// Server handle
// ---------------------------------------------------------------------------

/// A live mock server plus handles for seeding and inspection.
pub struct MockApi {
    addr: SocketAddr,
    state: SharedState,
    server: tokio::task::JoinHandle<()>,
}

impl MockApi {
    /// Bind on an ephemeral localhost port and start serving.
    pub async fn start() -> Self {
        let state: SharedState = Arc::default();
        let router = build_router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock api listener");
        let addr = listener.local_addr().expect("listener should have an address");

        let server = tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("mock api server failed");
        });

        Self { addr, state, server }
    }

    /// Base URL clients should be pointed at.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn seed_api(&self, api: Api) {
        let mut state = self.state.lock().unwrap();
        state.apis.insert(api.id.clone(), api);
    }

    pub fn seed_plan(&self, plan: Plan) {
        let mut state = self.state.lock().unwrap();
        state.plans.insert(plan.id.clone(), plan);
    }

    pub fn seed_subscription(&self, subscription: Subscription) {
        let mut state = self.state.lock().unwrap();
        state.subscriptions.push(subscription);
    }

    /// Make the next matching request fail with the given status and
    /// `{"message": ...}` body. Consumed on first match.
    pub fn fail_once(&self, method: &str, path_fragment: &str, status: u16, message: &str) {
        let mut state = self.state.lock().unwrap();
        state.failures.push(PlannedFailure {
            method: method.to_owned(),
            path_fragment: path_fragment.to_owned(),
            status,
            message: message.to_owned(),
        });
    }

    /// Current stored copy of a plan.
    pub fn plan(&self, plan_id: &str) -> Option<Plan> {
        let state = self.state.lock().unwrap();
        state.plans.get(plan_id).cloned()
    }

    pub fn plans(&self) -> Vec<Plan> {
        let state = self.state.lock().unwrap();
        state.plans.values().cloned().collect()
    }

    pub fn subscriptions(&self) -> Vec<Subscription> {
        let state = self.state.lock().unwrap();
        state.subscriptions.clone()
    }

    /// Everything the mock has served, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        let state = self.state.lock().unwrap();
        state.requests.clone()
    }

    /// Served requests filtered by method and a path fragment.
    pub fn requests_matching(&self, method: &str, path_fragment: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path.contains(path_fragment))
            .collect()
    }

    pub fn clear_requests(&self) {
        let mut state = self.state.lock().unwrap();
        state.requests.clear();
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/apis/{api_id}", get(get_api))
        .route("/apis/{api_id}/plans", get(list_plans).post(create_plan))
        .route("/apis/{api_id}/plans/{plan_id}", get(get_plan).put(update_plan))
        .route("/apis/{api_id}/plans/{plan_id}/_publish", post(publish_plan))
        .route("/apis/{api_id}/plans/{plan_id}/_deprecate", post(deprecate_plan))
        .route("/apis/{api_id}/plans/{plan_id}/_close", post(close_plan))
        .route("/apis/{api_id}/subscriptions", get(list_subscriptions))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_api(
    State(state): State<SharedState>,
    Path(api_id): Path<String>,
    uri: Uri,
) -> Result<Json<Api>, AppError> {
    let mut state = state.lock().unwrap();
    if let Some(err) = intercept(&mut state, "GET", &uri, Value::Null) {
        return Err(err);
    }
    let api = state
        .apis
        .get(&api_id)
        .cloned()
        .ok_or_else(|| AppError::not_found(format!("Api [{api_id}] cannot be found.")))?;
    Ok(Json(api))
}

async fn list_plans(
    State(state): State<SharedState>,
    Path(api_id): Path<String>,
    uri: Uri,
) -> Result<Json<Value>, AppError> {
    let mut state = state.lock().unwrap();
    if let Some(err) = intercept(&mut state, "GET", &uri, Value::Null) {
        return Err(err);
    }

    let statuses: Vec<PlanStatus> = uri
        .query()
        .unwrap_or_default()
        .split('&')
        .find_map(|pair| pair.strip_prefix("statuses="))
        .map(|list| list.split(',').filter_map(|s| s.parse().ok()).collect())
        .unwrap_or_else(|| PlanStatus::ALL.to_vec());

    let mut data: Vec<Plan> = state
        .plans
        .values()
        .filter(|p| p.api_id.as_deref() == Some(api_id.as_str()))
        .filter(|p| statuses.contains(&p.status))
        .cloned()
        .collect();
    data.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));

    let total = data.len();
    Ok(Json(json!({
        "data": data,
        "pagination": { "totalCount": total },
    })))
}

async fn get_plan(
    State(state): State<SharedState>,
    Path((_api_id, plan_id)): Path<(String, String)>,
    uri: Uri,
) -> Result<Json<Plan>, AppError> {
    let mut state = state.lock().unwrap();
    if let Some(err) = intercept(&mut state, "GET", &uri, Value::Null) {
        return Err(err);
    }
    let plan = state
        .plans
        .get(&plan_id)
        .cloned()
        .ok_or_else(|| AppError::not_found(format!("Plan [{plan_id}] cannot be found.")))?;
    Ok(Json(plan))
}

async fn create_plan(
    State(state): State<SharedState>,
    Path(api_id): Path<String>,
    uri: Uri,
    Json(body): Json<Value>,
) -> Result<Json<Plan>, AppError> {
    let mut state = state.lock().unwrap();
    if let Some(err) = intercept(&mut state, "POST", &uri, body.clone()) {
        return Err(err);
    }
    if !state.apis.contains_key(&api_id) {
        return Err(AppError::not_found(format!("Api [{api_id}] cannot be found.")));
    }

    let next_order = state
        .plans
        .values()
        .filter(|p| p.api_id.as_deref() == Some(api_id.as_str()))
        .map(|p| p.order)
        .max()
        .unwrap_or(0)
        + 1;
    let plan = plan_from_create_body(&api_id, &body, next_order);
    state.plans.insert(plan.id.clone(), plan.clone());
    Ok(Json(plan))
}

async fn update_plan(
    State(state): State<SharedState>,
    Path((api_id, plan_id)): Path<(String, String)>,
    uri: Uri,
    Json(body): Json<Value>,
) -> Result<Json<Plan>, AppError> {
    let mut state = state.lock().unwrap();
    if let Some(err) = intercept(&mut state, "PUT", &uri, body.clone()) {
        return Err(err);
    }

    let existing = state
        .plans
        .get(&plan_id)
        .cloned()
        .ok_or_else(|| AppError::not_found(format!("Plan [{plan_id}] cannot be found.")))?;

    let mut incoming: Plan = serde_json::from_value(body)
        .map_err(|e| AppError::bad_request(format!("Invalid plan body: {e}")))?;
    // Full-replace semantics, but identity and status are server-owned:
    // a PUT can never move a plan through its lifecycle.
    incoming.id = existing.id.clone();
    incoming.api_id = Some(api_id);
    incoming.status = existing.status;

    state.plans.insert(plan_id, incoming.clone());
    Ok(Json(incoming))
}

async fn publish_plan(
    State(state): State<SharedState>,
    Path((api_id, plan_id)): Path<(String, String)>,
    uri: Uri,
    Json(body): Json<Value>,
) -> Result<Json<Plan>, AppError> {
    transition(state, api_id, plan_id, uri, body, PlanStatus::Published)
}

async fn deprecate_plan(
    State(state): State<SharedState>,
    Path((api_id, plan_id)): Path<(String, String)>,
    uri: Uri,
    Json(body): Json<Value>,
) -> Result<Json<Plan>, AppError> {
    transition(state, api_id, plan_id, uri, body, PlanStatus::Deprecated)
}

async fn close_plan(
    State(state): State<SharedState>,
    Path((api_id, plan_id)): Path<(String, String)>,
    uri: Uri,
    Json(body): Json<Value>,
) -> Result<Json<Plan>, AppError> {
    transition(state, api_id, plan_id, uri, body, PlanStatus::Closed)
}

/// Apply a status transition the way the real backend would: validate the
/// source status, flip it, and close subscriptions along with the plan.
fn transition(
    state: SharedState,
    _api_id: String,
    plan_id: String,
    uri: Uri,
    body: Value,
    target: PlanStatus,
) -> Result<Json<Plan>, AppError> {
    let mut state = state.lock().unwrap();
    if let Some(err) = intercept(&mut state, "POST", &uri, body) {
        return Err(err);
    }

    let plan = state
        .plans
        .get_mut(&plan_id)
        .ok_or_else(|| AppError::not_found(format!("Plan [{plan_id}] cannot be found.")))?;

    let allowed = match target {
        PlanStatus::Published => plan.status == PlanStatus::Staging,
        PlanStatus::Deprecated => plan.status == PlanStatus::Published,
        PlanStatus::Closed => plan.status != PlanStatus::Closed,
        PlanStatus::Staging => false,
    };
    if !allowed {
        return Err(AppError::bad_request(format!(
            "The plan [{plan_id}] cannot move from {} to {target}.",
            plan.status
        )));
    }

    plan.status = target;
    let updated = plan.clone();

    if target == PlanStatus::Closed {
        for subscription in state
            .subscriptions
            .iter_mut()
            .filter(|s| s.plan.as_deref() == Some(plan_id.as_str()))
        {
            subscription.status = SubscriptionStatus::Closed;
        }
    }

    Ok(Json(updated))
}

async fn list_subscriptions(
    State(state): State<SharedState>,
    Path(_api_id): Path<String>,
    uri: Uri,
) -> Result<Json<Value>, AppError> {
    let mut state = state.lock().unwrap();
    if let Some(err) = intercept(&mut state, "GET", &uri, Value::Null) {
        return Err(err);
    }

    let query = uri.query().unwrap_or_default().to_owned();
    let plan_filter = query
        .split('&')
        .find_map(|pair| pair.strip_prefix("plan="))
        .map(str::to_owned);
    let status_filter: Option<Vec<String>> = query
        .split('&')
        .find_map(|pair| pair.strip_prefix("status="))
        .map(|list| list.split(',').map(|s| s.to_ascii_uppercase()).collect());

    let data: Vec<Subscription> = state
        .subscriptions
        .iter()
        .filter(|s| match &plan_filter {
            Some(plan_id) => s.plan.as_deref() == Some(plan_id.as_str()),
            None => true,
        })
        .filter(|s| match &status_filter {
            Some(statuses) => statuses.contains(&s.status.to_string()),
            None => true,
        })
        .cloned()
        .collect();

    let size = data.len();
    Ok(Json(json!({
        "data": data,
        "metadata": {},
        "page": { "size": size },
    })))
}

// ---------------------------------------------------------------------------
// Create-body normalization
// ---------------------------------------------------------------------------

/// Build a stored plan from a create request. Accepts both body dialects:
/// the structured camelCase shape and the legacy snake_case shape with a
/// stringified `securityDefinition`.
fn plan_from_create_body(api_id: &str, body: &Value, order: i32) -> Plan {
    let legacy = body.get("securityDefinition").is_some()
        || body.get("comment_required").is_some()
        || body.get("general_conditions").is_some();

    let security = if legacy {
        let security_type = body
            .get("security")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<PlanSecurityType>().ok());
        let configuration = body
            .get("securityDefinition")
            .and_then(Value::as_str)
            .and_then(|s| serde_json::from_str(s).ok());
        security_type.map(|security_type| PlanSecurity {
            security_type,
            configuration,
        })
    } else {
        body.get("security")
            .and_then(|s| serde_json::from_value(s.clone()).ok())
    };

    let comment_required_key = if legacy { "comment_required" } else { "commentRequired" };
    let comment_message_key = if legacy { "comment_message" } else { "commentMessage" };
    let general_conditions_key = if legacy { "general_conditions" } else { "generalConditions" };

    let mode = body
        .get("mode")
        .and_then(Value::as_str)
        .and_then(|s| serde_json::from_value(Value::String(s.to_owned())).ok())
        .unwrap_or(PlanMode::Standard);
    let validation = body
        .get("validation")
        .and_then(Value::as_str)
        .and_then(|s| serde_json::from_value(Value::String(s.to_owned())).ok())
        .unwrap_or(PlanValidation::Manual);
    let definition_version = body
        .get("definitionVersion")
        .and_then(Value::as_str)
        .and_then(|s| serde_json::from_value(Value::String(s.to_owned())).ok())
        .unwrap_or(DefinitionVersion::V2);

    Plan {
        id: Uuid::new_v4().to_string(),
        api_id: Some(api_id.to_owned()),
        name: body
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("unnamed")
            .to_owned(),
        description: body
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
        status: PlanStatus::Staging,
        definition_version,
        security,
        mode,
        validation,
        order,
        characteristics: Vec::new(),
        tags: Vec::new(),
        excluded_groups: None,
        general_conditions: body
            .get(general_conditions_key)
            .and_then(Value::as_str)
            .map(str::to_owned),
        comment_message: body
            .get(comment_message_key)
            .and_then(Value::as_str)
            .map(str::to_owned),
        comment_required: body
            .get(comment_required_key)
            .and_then(Value::as_bool)
            .unwrap_or(false),
        selection_rule: None,
        flows: body
            .get("flows")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        created_at: None,
        updated_at: None,
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A V4 HTTP proxy API.
pub fn api_fixture(api_id: &str) -> Api {
    Api {
        id: api_id.to_owned(),
        name: format!("{api_id} api"),
        definition_version: Some(DefinitionVersion::V4),
        api_type: Some(ApiType::Proxy),
        listeners: vec![Listener {
            listener_type: ListenerType::Http,
        }],
        definition_context: None,
    }
}

/// A NATIVE (Kafka-like) API, where published plan security is exclusive.
pub fn native_api_fixture(api_id: &str) -> Api {
    Api {
        id: api_id.to_owned(),
        name: format!("{api_id} api"),
        definition_version: Some(DefinitionVersion::V4),
        api_type: Some(ApiType::Native),
        listeners: vec![Listener {
            listener_type: ListenerType::Kafka,
        }],
        definition_context: None,
    }
}

/// A V4 plan with the given security type, ready to seed.
pub fn plan_fixture(
    api_id: &str,
    plan_id: &str,
    name: &str,
    status: PlanStatus,
    security: PlanSecurityType,
) -> Plan {
    Plan {
        id: plan_id.to_owned(),
        api_id: Some(api_id.to_owned()),
        name: name.to_owned(),
        description: "Default description".to_owned(),
        status,
        definition_version: DefinitionVersion::V4,
        security: Some(PlanSecurity {
            security_type: security,
            configuration: Some(json!({})),
        }),
        mode: PlanMode::Standard,
        validation: PlanValidation::Manual,
        order: 1,
        characteristics: Vec::new(),
        tags: Vec::new(),
        excluded_groups: None,
        general_conditions: None,
        comment_message: None,
        comment_required: false,
        selection_rule: None,
        flows: Vec::new(),
        created_at: None,
        updated_at: None,
    }
}

/// A subscription bound to a plan.
pub fn subscription_fixture(
    subscription_id: &str,
    plan_id: &str,
    status: SubscriptionStatus,
) -> Subscription {
    Subscription {
        id: subscription_id.to_owned(),
        plan: Some(plan_id.to_owned()),
        application: Some("app-1".to_owned()),
        status,
        consumer_message: None,
        publisher_message: None,
        created_at: None,
        processed_at: None,
        starting_at: None,
        ending_at: None,
        paused_at: None,
        closed_at: None,
    }
}
