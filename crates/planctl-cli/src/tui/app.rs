//! Dashboard application state.
//!
//! The dashboard is a thin shell around the list coordinator: every load
//! and reorder goes through the reducer, and lifecycle actions are staged
//! as a [`PendingAction`] until the guard prompt is confirmed.

use std::time::Duration;

use anyhow::Result;

use planctl_client::http::ManagementClient;
use planctl_client::models::{Plan, PlanStatus};
use planctl_core::guard::exclusivity::{self, PublishCheck};
use planctl_core::guard::{self, ConfirmationKind, ConfirmationPrompt, Notification};
use planctl_core::lifecycle::{self, PlanAction, dispatch};
use planctl_core::list::{self, Command, ListEvent, ListState};

/// A transition staged behind its confirmation prompt.
pub struct PendingAction {
    pub action: PlanAction,
    pub plan: Plan,
    pub prompt: ConfirmationPrompt,
    /// Published plans closed alongside an exclusive publish.
    pub conflicts: Vec<Plan>,
    /// Characters typed so far for type-to-confirm prompts.
    pub input: String,
}

/// Application state for the dashboard.
pub struct App {
    pub client: ManagementClient,
    pub api_id: String,
    pub state: ListState,
    pub selected: usize,
    pub pending: Option<PendingAction>,
    pub notification: Option<Notification>,
    pub show_help: bool,
    pub should_quit: bool,
    pub tick_rate: Duration,
}

impl App {
    pub fn new(client: ManagementClient, api_id: String) -> Self {
        Self {
            client,
            api_id,
            state: ListState::default(),
            selected: 0,
            pending: None,
            notification: None,
            show_help: false,
            should_quit: false,
            tick_rate: Duration::from_secs(2),
        }
    }

    /// Full reload through the coordinator. Load errors land in
    /// `state.error`, not here.
    pub async fn refresh(&mut self) {
        let commands = list::apply(&mut self.state, ListEvent::ReloadRequested);
        self.settle(commands).await;
        self.clamp_selection();
    }

    async fn settle(&mut self, commands: Vec<Command>) {
        let mut queue = commands;
        while let Some(command) = queue.pop() {
            let event = list::execute(&self.client, &self.api_id, command).await;
            let mut next = list::apply(&mut self.state, event);
            queue.append(&mut next);
        }
    }

    fn clamp_selection(&mut self) {
        if self.selected >= self.state.plans.len() {
            self.selected = self.state.plans.len().saturating_sub(1);
        }
    }

    pub fn selected_plan(&self) -> Option<&Plan> {
        self.state.plans.get(self.selected)
    }

    // -- Navigation --

    pub fn move_up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    pub fn move_down(&mut self) {
        if !self.state.plans.is_empty() && self.selected < self.state.plans.len() - 1 {
            self.selected += 1;
        }
    }

    pub async fn set_filter(&mut self, status: PlanStatus) {
        let commands = list::apply(&mut self.state, ListEvent::FilterChanged(status));
        self.settle(commands).await;
        self.selected = 0;
    }

    /// Tab key: advance to the next status tab, wrapping around.
    pub async fn cycle_filter(&mut self) {
        let position = PlanStatus::ALL
            .iter()
            .position(|&status| status == self.state.filter)
            .unwrap_or(0);
        let next = PlanStatus::ALL[(position + 1) % PlanStatus::ALL.len()];
        self.set_filter(next).await;
    }

    pub fn navigate_back(&mut self) {
        if self.pending.is_some() {
            self.pending = None;
        } else if self.show_help {
            self.show_help = false;
        } else {
            self.should_quit = true;
        }
    }

    // -- Lifecycle actions --

    /// Stage `action` for the selected plan behind its guard prompt.
    ///
    /// Disallowed actions produce an error banner instead of a prompt; the
    /// publish path runs the exclusivity check first.
    pub async fn begin_action(&mut self, action: PlanAction) -> Result<()> {
        let Some(plan) = self.selected_plan().cloned() else {
            return Ok(());
        };
        if !lifecycle::is_action_allowed(plan.status, action) {
            self.notification = Some(Notification::Error(format!(
                "cannot {action} a {} plan",
                plan.status
            )));
            return Ok(());
        }

        let (prompt, conflicts) = match action {
            PlanAction::Publish => {
                let Some(api) = self.state.api.clone() else {
                    return Ok(());
                };
                match exclusivity::check_publish(&self.client, &api, &plan).await? {
                    PublishCheck::Simple { prompt } => (prompt, Vec::new()),
                    PublishCheck::Exclusive { prompt, conflicts } => (prompt, conflicts),
                }
            }
            PlanAction::Deprecate => (guard::deprecate_prompt(&plan), Vec::new()),
            PlanAction::Close => (
                guard::close_prompt(&self.client, &self.api_id, &plan).await?,
                Vec::new(),
            ),
        };

        self.pending = Some(PendingAction {
            action,
            plan,
            prompt,
            conflicts,
            input: String::new(),
        });
        Ok(())
    }

    /// Enter on an open prompt: execute the staged transition if the input
    /// satisfies it.
    pub async fn confirm_pending(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        if !pending.prompt.accepts(&pending.input) {
            // Enter does nothing until the typed name matches.
            self.pending = Some(pending);
            return;
        }

        let result = if pending.conflicts.is_empty() {
            dispatch::apply(&self.client, &self.api_id, &pending.plan, pending.action).await
        } else {
            exclusivity::execute_publish(
                &self.client,
                &self.api_id,
                &pending.plan,
                &pending.conflicts,
            )
            .await
        };

        match result {
            Ok(updated) => {
                self.notification = Some(guard::success_notification(&updated, pending.action));
                self.refresh().await;
            }
            Err(error) => {
                // The backend message is shown verbatim; the list is left
                // as it was.
                self.notification = Some(guard::error_notification(&error));
            }
        }
    }

    pub fn cancel_pending(&mut self) {
        self.pending = None;
    }

    pub fn pending_push(&mut self, c: char) {
        if let Some(pending) = &mut self.pending {
            if matches!(pending.prompt.kind, ConfirmationKind::TypeToConfirm { .. }) {
                pending.input.push(c);
            }
        }
    }

    pub fn pending_backspace(&mut self) {
        if let Some(pending) = &mut self.pending {
            pending.input.pop();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
