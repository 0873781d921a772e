//! `planctl status` command: one-shot summary of the API and its plans.

use anyhow::{Result, bail};

use planctl_client::http::ManagementClient;
use planctl_client::models::{ApiOrigin, ApiType, PlanStatus};
use planctl_core::access::{self, PermissionSet, WriteAccess};
use planctl_core::list::{self, ListEvent, ListState};

use crate::plan_cmds::settle;

/// Full reload through the coordinator, then print the API descriptor and
/// the per-status plan counts.
pub(crate) async fn run_status(client: &ManagementClient, api_id: &str) -> Result<()> {
    let mut state = ListState::default();
    let commands = list::apply(&mut state, ListEvent::ReloadRequested);
    settle(client, api_id, &mut state, commands).await;
    if let Some(error) = state.error.take() {
        bail!(error);
    }

    let Some(api) = state.api.as_ref() else {
        bail!("API {api_id} was not returned by the management API");
    };

    println!("API: {}", api.name);
    println!("  ID:          {}", api.id);
    if let Some(version) = api.definition_version {
        println!("  Definition:  {version}");
    }
    if let Some(api_type) = api.api_type {
        println!("  Type:        {}", api_type_label(api_type));
    }
    println!("  Origin:      {}", origin_label(api.origin()));

    match access::write_access(api, &PermissionSet::all()) {
        WriteAccess::Allowed => println!("  Plans:       writable"),
        WriteAccess::Denied { reason } => println!("  Plans:       read-only ({reason})"),
    }

    println!();
    println!("Plan counts:");
    for status in PlanStatus::ALL {
        println!("  {:<12} {}", format!("{status}:"), state.count(status));
    }

    Ok(())
}

fn api_type_label(api_type: ApiType) -> &'static str {
    match api_type {
        ApiType::Proxy => "PROXY",
        ApiType::Message => "MESSAGE",
        ApiType::Native => "NATIVE",
    }
}

fn origin_label(origin: ApiOrigin) -> &'static str {
    match origin {
        ApiOrigin::Management => "MANAGEMENT",
        ApiOrigin::Kubernetes => "KUBERNETES",
    }
}
