//! Plan subcommand implementations: list, show, create, edit, the three
//! lifecycle transitions, reorder and subscriptions.
//!
//! Every mutation goes through the same orchestration the dashboard uses:
//! write access is checked first, transitions are confirmed against the
//! guard prompts, and list output is produced by the refresh coordinator.

use anyhow::{Context, Result, bail};
use serde_json::Value;

use planctl_client::http::ManagementClient;
use planctl_client::models::{Api, Plan, PlanStatus, PlanValidation, SubscriptionStatus};
use planctl_client::{apis, plans, subscriptions};
use planctl_core::access::{self, PermissionSet, WriteAccess};
use planctl_core::guard;
use planctl_core::guard::exclusivity::{self, PublishCheck};
use planctl_core::lifecycle::{self, PlanAction, dispatch};
use planctl_core::list::{self, Command, ListEvent, ListState};
use planctl_core::menu::{self, SecuritySettings};
use planctl_core::wizard::restriction::RestrictionDraft;
use planctl_core::wizard::{PlanDraft, PlanKind, PlanWizard};

use crate::PlanCommands;
use crate::prompt;

/// Every status a subscription can be in; used when listing them all.
const ALL_SUBSCRIPTION_STATUSES: [SubscriptionStatus; 6] = [
    SubscriptionStatus::Accepted,
    SubscriptionStatus::Pending,
    SubscriptionStatus::Paused,
    SubscriptionStatus::Rejected,
    SubscriptionStatus::Closed,
    SubscriptionStatus::Resumed,
];

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `PlanCommands` variant to the appropriate handler.
pub(crate) async fn run_plan_command(
    command: PlanCommands,
    client: &ManagementClient,
    api_id: &str,
) -> Result<()> {
    match command {
        PlanCommands::List { status } => cmd_list(client, api_id, status).await,
        PlanCommands::Show { plan_id } => cmd_show(client, api_id, &plan_id).await,
        PlanCommands::Create {
            kind,
            name,
            description,
            security_config,
            auto_validation,
            comment_required,
            comment_message,
            general_conditions,
            tags,
            excluded_groups,
            rate_limit,
            quota,
            resource_filtering,
        } => {
            let security_configuration =
                match parse_json_flag(security_config.as_deref(), "--security-config")? {
                    Some(value) if !value.is_object() => {
                        bail!("--security-config must be a JSON object")
                    }
                    Some(value) => value,
                    None => Value::Object(serde_json::Map::new()),
                };
            let draft = PlanDraft {
                name,
                description: description.unwrap_or_default(),
                validation: if auto_validation {
                    PlanValidation::Auto
                } else {
                    PlanValidation::Manual
                },
                comment_required,
                comment_message,
                general_conditions,
                excluded_groups,
                tags,
                security_configuration,
                restriction: RestrictionDraft {
                    rate_limit: parse_json_flag(rate_limit.as_deref(), "--rate-limit")?,
                    quota: parse_json_flag(quota.as_deref(), "--quota")?,
                    resource_filtering: parse_json_flag(
                        resource_filtering.as_deref(),
                        "--resource-filtering",
                    )?,
                },
                ..PlanDraft::default()
            };
            cmd_create(client, api_id, kind, draft).await
        }
        PlanCommands::Edit {
            plan_id,
            name,
            description,
            security_config,
            auto_validation,
            comment_required,
            comment_message,
            general_conditions,
        } => {
            let edits = PlanEdits {
                name,
                description,
                security_configuration: parse_json_flag(
                    security_config.as_deref(),
                    "--security-config",
                )?,
                auto_validation,
                comment_required,
                comment_message,
                general_conditions,
            };
            cmd_edit(client, api_id, &plan_id, edits).await
        }
        PlanCommands::Publish { plan_id, yes } => {
            cmd_transition(client, api_id, &plan_id, PlanAction::Publish, yes).await
        }
        PlanCommands::Deprecate { plan_id, yes } => {
            cmd_transition(client, api_id, &plan_id, PlanAction::Deprecate, yes).await
        }
        PlanCommands::Close { plan_id, yes } => {
            cmd_transition(client, api_id, &plan_id, PlanAction::Close, yes).await
        }
        PlanCommands::Reorder { plan_id, position } => {
            cmd_reorder(client, api_id, &plan_id, position).await
        }
        PlanCommands::Subscriptions { plan_id } => {
            cmd_subscriptions(client, api_id, &plan_id).await
        }
    }
}

// -----------------------------------------------------------------------
// Shared plumbing
// -----------------------------------------------------------------------

/// Run the coordinator's commands to completion, feeding each outcome back
/// into the reducer until it goes quiet.
pub(crate) async fn settle(
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

/// The CLI token is assumed to carry the plan permissions; the checks that
/// bite here are Kubernetes-managed and legacy V1 definitions.
fn ensure_writable(api: &Api) -> Result<()> {
    match access::write_access(api, &PermissionSet::all()) {
        WriteAccess::Allowed => Ok(()),
        WriteAccess::Denied { reason } => {
            bail!("plans on API {} are read-only: {reason}", api.name)
        }
    }
}

fn parse_json_flag(raw: Option<&str>, flag: &str) -> Result<Option<Value>> {
    raw.map(|s| serde_json::from_str(s).with_context(|| format!("invalid JSON in {flag}")))
        .transpose()
}

// -----------------------------------------------------------------------
// planctl plan list
// -----------------------------------------------------------------------

async fn cmd_list(
    client: &ManagementClient,
    api_id: &str,
    status: Option<PlanStatus>,
) -> Result<()> {
    let mut state = ListState::new(status.unwrap_or(PlanStatus::Published));
    let commands = list::apply(&mut state, ListEvent::ReloadRequested);
    settle(client, api_id, &mut state, commands).await;
    if let Some(error) = state.error.take() {
        bail!(error);
    }

    let api_name = state.api.as_ref().map_or(api_id, |api| api.name.as_str());
    println!(
        "Plans for {api_name}: {} staging, {} published, {} deprecated, {} closed",
        state.count(PlanStatus::Staging),
        state.count(PlanStatus::Published),
        state.count(PlanStatus::Deprecated),
        state.count(PlanStatus::Closed),
    );
    println!();

    if state.plans.is_empty() {
        println!("There is no plan (yet).");
        return Ok(());
    }

    println!(
        "{:<38}  {:<24}  {:<12}  {:<10}  {:>5}",
        "ID", "NAME", "STATUS", "SECURITY", "ORDER"
    );
    println!("{}", "-".repeat(97));
    for plan in &state.plans {
        println!(
            "{:<38}  {:<24}  {:<12}  {:<10}  {:>5}",
            plan.id,
            truncate(&plan.name, 24),
            plan.status.to_string(),
            security_label(plan),
            plan.order,
        );
    }

    Ok(())
}

// -----------------------------------------------------------------------
// planctl plan show
// -----------------------------------------------------------------------

async fn cmd_show(client: &ManagementClient, api_id: &str, plan_id: &str) -> Result<()> {
    let plan = plans::get_plan(client, api_id, plan_id).await?;
    print_plan_details(&plan);

    let actions = lifecycle::allowed_actions(plan.status);
    if actions.is_empty() {
        println!("  Allowed actions: none (closed is terminal)");
    } else {
        let names: Vec<String> = actions.iter().map(|action| action.to_string()).collect();
        println!("  Allowed actions: {}", names.join(", "));
    }

    Ok(())
}

fn print_plan_details(plan: &Plan) {
    println!("Plan: {}", plan.name);
    println!("  ID:            {}", plan.id);
    println!("  Status:        {}", plan.status);
    println!("  Security:      {}", security_label(plan));
    println!("  Validation:    {}", plan.validation);
    println!("  Order:         {}", plan.order);
    println!("  Definition:    {}", plan.definition_version);
    if !plan.description.is_empty() {
        println!("  Description:   {}", plan.description);
    }
    if !plan.tags.is_empty() {
        println!("  Tags:          {}", plan.tags.join(", "));
    }
    if let Some(groups) = &plan.excluded_groups {
        if !groups.is_empty() {
            println!("  Excluded:      {}", groups.join(", "));
        }
    }
    if plan.comment_required {
        match &plan.comment_message {
            Some(message) => println!("  Comment:       required ({message})"),
            None => println!("  Comment:       required"),
        }
    }
    if let Some(created) = plan.created_at {
        println!("  Created:       {}", created.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(updated) = plan.updated_at {
        println!("  Updated:       {}", updated.format("%Y-%m-%d %H:%M:%S UTC"));
    }
}

// -----------------------------------------------------------------------
// planctl plan create / edit
// -----------------------------------------------------------------------

async fn cmd_create(
    client: &ManagementClient,
    api_id: &str,
    kind: PlanKind,
    draft: PlanDraft,
) -> Result<()> {
    let api = apis::get_api(client, api_id).await?;
    ensure_writable(&api)?;

    let items = menu::plan_menu_items(&api, &SecuritySettings::default());
    if !items.iter().any(|item| item.kind == kind) {
        let offered: Vec<&str> = items.iter().map(|item| item.label).collect();
        bail!(
            "API {} does not offer {kind} plans (available: {})",
            api.name,
            offered.join(", ")
        );
    }

    let mut wizard = PlanWizard::create(api, kind);
    wizard.draft = draft;

    let outcome = wizard.submit_create(client).await?;
    println!("Created plan {} ({})", outcome.plan.name, outcome.plan.id);
    println!();
    print_plan_details(&outcome.plan);
    Ok(())
}

/// Field-level edits; `None` keeps the stored value.
pub(crate) struct PlanEdits {
    pub name: Option<String>,
    pub description: Option<String>,
    pub security_configuration: Option<Value>,
    pub auto_validation: Option<bool>,
    pub comment_required: Option<bool>,
    pub comment_message: Option<String>,
    pub general_conditions: Option<String>,
}

async fn cmd_edit(
    client: &ManagementClient,
    api_id: &str,
    plan_id: &str,
    edits: PlanEdits,
) -> Result<()> {
    let api = apis::get_api(client, api_id).await?;
    ensure_writable(&api)?;

    let plan = plans::get_plan(client, api_id, plan_id).await?;
    let mut wizard = PlanWizard::edit(api, &plan)?;

    if let Some(name) = edits.name {
        wizard.draft.name = name;
    }
    if let Some(description) = edits.description {
        wizard.draft.description = description;
    }
    if let Some(configuration) = edits.security_configuration {
        wizard.draft.security_configuration = configuration;
    }
    if let Some(auto) = edits.auto_validation {
        wizard.draft.validation = if auto {
            PlanValidation::Auto
        } else {
            PlanValidation::Manual
        };
    }
    if let Some(required) = edits.comment_required {
        wizard.draft.comment_required = required;
    }
    if let Some(message) = edits.comment_message {
        wizard.draft.comment_message = Some(message);
    }
    if let Some(conditions) = edits.general_conditions {
        wizard.draft.general_conditions = Some(conditions);
    }

    let outcome = wizard.submit_edit(client, plan_id).await?;
    println!("Updated plan {} ({})", outcome.plan.name, outcome.plan.id);
    println!();
    print_plan_details(&outcome.plan);
    Ok(())
}

// -----------------------------------------------------------------------
// planctl plan publish / deprecate / close
// -----------------------------------------------------------------------

async fn cmd_transition(
    client: &ManagementClient,
    api_id: &str,
    plan_id: &str,
    action: PlanAction,
    assume_yes: bool,
) -> Result<()> {
    let api = apis::get_api(client, api_id).await?;
    ensure_writable(&api)?;

    let plan = plans::get_plan(client, api_id, plan_id).await?;
    lifecycle::ensure_allowed(&plan, action)?;

    let (confirmation, conflicts) = match action {
        PlanAction::Publish => match exclusivity::check_publish(client, &api, &plan).await? {
            PublishCheck::Simple { prompt } => (prompt, Vec::new()),
            PublishCheck::Exclusive { prompt, conflicts } => (prompt, conflicts),
        },
        PlanAction::Deprecate => (guard::deprecate_prompt(&plan), Vec::new()),
        PlanAction::Close => (guard::close_prompt(client, api_id, &plan).await?, Vec::new()),
    };

    if !prompt::confirm(&confirmation, assume_yes)? {
        println!("Aborted.");
        return Ok(());
    }

    let updated = if conflicts.is_empty() {
        dispatch::apply(client, api_id, &plan, action).await?
    } else {
        exclusivity::execute_publish(client, api_id, &plan, &conflicts).await?
    };

    println!("{}", guard::success_notification(&updated, action).text());
    Ok(())
}

// -----------------------------------------------------------------------
// planctl plan reorder
// -----------------------------------------------------------------------

async fn cmd_reorder(
    client: &ManagementClient,
    api_id: &str,
    plan_id: &str,
    position: usize,
) -> Result<()> {
    if position == 0 {
        bail!("positions are 1-based; use 1 for the top of the tab");
    }

    let plan = plans::get_plan(client, api_id, plan_id).await?;

    // Reordering happens within the plan's own status tab.
    let mut state = ListState::new(plan.status);
    let commands = list::apply(&mut state, ListEvent::ReloadRequested);
    settle(client, api_id, &mut state, commands).await;
    if let Some(error) = state.error.take() {
        bail!(error);
    }

    let commands = list::apply(
        &mut state,
        ListEvent::ReorderMoved {
            plan_id: plan_id.to_owned(),
            to_index: position - 1,
        },
    );
    if commands.is_empty() {
        println!("The plan {} is already at position {position}.", plan.name);
        return Ok(());
    }
    settle(client, api_id, &mut state, commands).await;
    if let Some(error) = state.error.take() {
        bail!(error);
    }

    println!("Moved {} to position {position} in {}.", plan.name, plan.status);
    for (index, row) in state.plans.iter().enumerate() {
        println!("  {:>2}. {}", index + 1, row.name);
    }
    Ok(())
}

// -----------------------------------------------------------------------
// planctl plan subscriptions
// -----------------------------------------------------------------------

async fn cmd_subscriptions(client: &ManagementClient, api_id: &str, plan_id: &str) -> Result<()> {
    let plan = plans::get_plan(client, api_id, plan_id).await?;
    let page =
        subscriptions::list_subscriptions(client, api_id, plan_id, &ALL_SUBSCRIPTION_STATUSES)
            .await?;

    println!("{} subscription(s) on plan {}", page.total(), plan.name);
    if page.data.is_empty() {
        return Ok(());
    }
    println!();
    println!("{:<38}  {:<24}  {:<10}", "ID", "APPLICATION", "STATUS");
    println!("{}", "-".repeat(76));
    for subscription in &page.data {
        println!(
            "{:<38}  {:<24}  {:<10}",
            subscription.id,
            truncate(subscription.application.as_deref().unwrap_or("-"), 24),
            subscription.status.to_string(),
        );
    }
    Ok(())
}

// -----------------------------------------------------------------------
// Formatting helpers
// -----------------------------------------------------------------------

/// Column label for a plan's access control: the security type, or the
/// mode for PUSH plans which carry none.
fn security_label(plan: &Plan) -> String {
    match plan.security_type() {
        Some(security_type) => security_type.to_string(),
        None => plan.mode.to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plan_with(security: Option<Value>, mode: &str) -> Plan {
        let mut value = json!({
            "id": "p1",
            "name": "Gold",
            "status": "PUBLISHED",
            "definitionVersion": "V4",
            "mode": mode,
        });
        if let Some(security) = security {
            value["security"] = security;
        }
        serde_json::from_value(value).expect("plan fixture")
    }

    #[test]
    fn security_label_prefers_the_security_type() {
        let plan = plan_with(Some(json!({"type": "KEY_LESS"})), "STANDARD");
        assert_eq!(security_label(&plan), "KEY_LESS");
    }

    #[test]
    fn security_label_falls_back_to_the_mode() {
        let plan = plan_with(None, "PUSH");
        assert_eq!(security_label(&plan), "PUSH");
    }

    #[test]
    fn truncate_leaves_short_names_alone() {
        assert_eq!(truncate("Gold", 24), "Gold");
    }

    #[test]
    fn truncate_cuts_long_names_with_ellipsis() {
        let cut = truncate("A very long plan name that overflows", 24);
        assert_eq!(cut.chars().count(), 24);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn parse_json_flag_accepts_objects() {
        let value = parse_json_flag(Some(r#"{"limit": 10}"#), "--quota")
            .expect("should parse")
            .expect("should be present");
        assert_eq!(value["limit"], 10);
    }

    #[test]
    fn parse_json_flag_rejects_garbage() {
        let err = parse_json_flag(Some("{not json"), "--rate-limit").unwrap_err();
        assert!(err.to_string().contains("--rate-limit"));
    }

    #[test]
    fn parse_json_flag_passes_through_none() {
        assert!(
            parse_json_flag(None, "--quota")
                .expect("should parse")
                .is_none()
        );
    }
}
