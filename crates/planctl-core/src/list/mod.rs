//! List refresh coordinator: keeps the plan table, the per-status counts
//! and the owning API consistent across loads, filter changes and reorders.
//!
//! The coordinator is an explicit reducer: [`apply`] folds a [`ListEvent`]
//! into [`ListState`] and returns the [`Command`]s to execute next. All
//! decisions (what to fetch, when to revert, which results are stale) live
//! in the reducer; [`execute`] only performs the I/O for one command and
//! reports back as another event.
//!
//! Reload semantics:
//! - A **full reload** fetches every status in one request, recomputes the
//!   per-status counts client-side, and re-fetches the owning API. It runs
//!   on startup and after every successful mutation.
//! - A **filter change** fetches only the newly selected status and keeps
//!   the previous counts until the next full reload.
//! - Loads race under a generation counter: results for a superseded
//!   generation are dropped, so the last requested load always wins.

use std::collections::BTreeMap;

use planctl_client::http::ManagementClient;
use planctl_client::models::{Api, Plan, PlanStatus};
use planctl_client::{apis, plans};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// The coordinator's view of the plan list.
#[derive(Debug, Clone)]
pub struct ListState {
    /// The owning API, refreshed on every full reload.
    pub api: Option<Api>,
    /// Plans of the selected status, sorted ascending by order.
    pub plans: Vec<Plan>,
    /// Plans per status, computed from the last full reload.
    pub counts: BTreeMap<PlanStatus, usize>,
    /// The selected status tab.
    pub filter: PlanStatus,
    /// Last load or reorder error, cleared by the next successful load.
    pub error: Option<String>,
    /// Generation of the most recently issued load.
    pub generation: u64,
    /// Whether a load is in flight.
    pub loading: bool,
    /// Pre-reorder row order, kept until the PUT settles.
    reorder_snapshot: Option<Vec<Plan>>,
}

impl ListState {
    /// Fresh state opening on the given status tab.
    pub fn new(filter: PlanStatus) -> Self {
        Self {
            api: None,
            plans: Vec::new(),
            counts: BTreeMap::new(),
            filter,
            error: None,
            generation: 0,
            loading: false,
            reorder_snapshot: None,
        }
    }

    /// Count for one status tab, zero when unknown.
    pub fn count(&self, status: PlanStatus) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }
}

/// The console opens on the published tab.
impl Default for ListState {
    fn default() -> Self {
        Self::new(PlanStatus::Published)
    }
}

// ---------------------------------------------------------------------------
// Events and commands
// ---------------------------------------------------------------------------

/// What a load fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadScope {
    /// Every status plus the owning API; recomputes counts.
    Full,
    /// One status only; counts are reused until the next full reload.
    Status(PlanStatus),
}

/// An input to the reducer.
#[derive(Debug, Clone)]
pub enum ListEvent {
    /// The user selected another status tab.
    FilterChanged(PlanStatus),
    /// Initial load, or a successful mutation demanding a full reload.
    ReloadRequested,
    /// A load finished. `api` is set for full loads only.
    LoadSucceeded {
        generation: u64,
        scope: LoadScope,
        api: Option<Api>,
        plans: Vec<Plan>,
    },
    /// A load failed.
    LoadFailed { generation: u64, message: String },
    /// The user dragged a plan to a new row.
    ReorderMoved { plan_id: String, to_index: usize },
    /// The reorder PUT succeeded.
    ReorderSucceeded,
    /// The reorder PUT failed.
    ReorderFailed { message: String },
}

/// An effect the caller must execute.
#[derive(Debug, Clone)]
pub enum Command {
    /// Fetch plans (and, for full scope, the owning API).
    Load { generation: u64, scope: LoadScope },
    /// PUT the full plan body carrying its new order.
    UpdateOrder { plan: Plan },
}

// ---------------------------------------------------------------------------
// Reducer
// ---------------------------------------------------------------------------

/// Fold one event into the state and return the commands to run.
pub fn apply(state: &mut ListState, event: ListEvent) -> Vec<Command> {
    match event {
        ListEvent::FilterChanged(status) => {
            state.filter = status;
            state.generation += 1;
            state.loading = true;
            vec![Command::Load {
                generation: state.generation,
                scope: LoadScope::Status(status),
            }]
        }

        ListEvent::ReloadRequested => {
            state.generation += 1;
            state.loading = true;
            vec![Command::Load {
                generation: state.generation,
                scope: LoadScope::Full,
            }]
        }

        ListEvent::LoadSucceeded {
            generation,
            scope,
            api,
            plans,
        } => {
            if generation != state.generation {
                tracing::debug!(generation, current = state.generation, "dropping stale load");
                return Vec::new();
            }
            state.loading = false;
            state.error = None;
            match scope {
                LoadScope::Full => {
                    if api.is_some() {
                        state.api = api;
                    }
                    state.counts = count_by_status(&plans);
                    state.plans = select_sorted(plans, state.filter);
                }
                LoadScope::Status(_) => {
                    state.plans = select_sorted(plans, state.filter);
                }
            }
            Vec::new()
        }

        ListEvent::LoadFailed {
            generation,
            message,
        } => {
            if generation != state.generation {
                return Vec::new();
            }
            state.loading = false;
            state.plans.clear();
            state.counts.clear();
            state.error = Some(message);
            Vec::new()
        }

        ListEvent::ReorderMoved { plan_id, to_index } => {
            let Some(from_index) = state.plans.iter().position(|plan| plan.id == plan_id) else {
                return Vec::new();
            };
            let to_index = to_index.min(state.plans.len().saturating_sub(1));
            if to_index == from_index {
                return Vec::new();
            }

            state.reorder_snapshot = Some(state.plans.clone());
            let moved = state.plans.remove(from_index);
            state.plans.insert(to_index, moved);

            // Orders are 1-based; sibling renumbering is the backend's job
            // and arrives with the follow-up full reload.
            let mut plan = state.plans[to_index].clone();
            plan.order = to_index as i32 + 1;
            vec![Command::UpdateOrder { plan }]
        }

        ListEvent::ReorderSucceeded => {
            state.reorder_snapshot = None;
            state.generation += 1;
            state.loading = true;
            vec![Command::Load {
                generation: state.generation,
                scope: LoadScope::Full,
            }]
        }

        ListEvent::ReorderFailed { message } => {
            if let Some(snapshot) = state.reorder_snapshot.take() {
                state.plans = snapshot;
            }
            state.error = Some(message);
            Vec::new()
        }
    }
}

/// Group a full, all-statuses fetch into per-status counts.
fn count_by_status(plans: &[Plan]) -> BTreeMap<PlanStatus, usize> {
    let mut counts = BTreeMap::new();
    for plan in plans {
        *counts.entry(plan.status).or_insert(0) += 1;
    }
    counts
}

/// Keep the plans of one status, sorted ascending by order then name.
fn select_sorted(plans: Vec<Plan>, status: PlanStatus) -> Vec<Plan> {
    let mut selected: Vec<Plan> = plans
        .into_iter()
        .filter(|plan| plan.status == status)
        .collect();
    selected.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
    selected
}

// ---------------------------------------------------------------------------
// Command execution
// ---------------------------------------------------------------------------

/// Execute one command against the management API, reporting the outcome as
/// the event to feed back into [`apply`].
pub async fn execute(client: &ManagementClient, api_id: &str, command: Command) -> ListEvent {
    match command {
        Command::Load { generation, scope } => match run_load(client, api_id, scope).await {
            Ok((api, plans)) => ListEvent::LoadSucceeded {
                generation,
                scope,
                api,
                plans,
            },
            Err(e) => ListEvent::LoadFailed {
                generation,
                message: e.to_string(),
            },
        },
        Command::UpdateOrder { plan } => match plans::update_plan(client, api_id, &plan).await {
            Ok(_) => ListEvent::ReorderSucceeded,
            Err(e) => ListEvent::ReorderFailed {
                message: e.to_string(),
            },
        },
    }
}

async fn run_load(
    client: &ManagementClient,
    api_id: &str,
    scope: LoadScope,
) -> Result<(Option<Api>, Vec<Plan>), planctl_client::error::ClientError> {
    match scope {
        LoadScope::Full => {
            // The API descriptor can change with any mutation (deployment
            // state), so a full reload refreshes it too.
            let api = apis::get_api(client, api_id).await?;
            let plans = plans::list_plans(client, api_id, &PlanStatus::ALL).await?;
            Ok((Some(api), plans))
        }
        LoadScope::Status(status) => {
            let plans = plans::list_plans(client, api_id, &[status]).await?;
            Ok((None, plans))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
