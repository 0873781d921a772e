//! Plan form wizard: a 2-3 step create/edit form whose step set depends on
//! the plan kind, the owning API and the mode.
//!
//! The wizard holds a [`PlanDraft`], exposes step navigation (forward only
//! when the current step is valid), and submits either a create body
//! assembled by [`payload`] or a full-replace update merged over a fresh
//! fetch of the plan.

pub mod payload;
pub mod restriction;
pub mod steps;

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use serde_json::Value;

use planctl_client::http::ManagementClient;
use planctl_client::models::{Api, Plan, PlanMode, PlanSecurityType, PlanStatus, PlanValidation};
use planctl_client::plans;

use restriction::RestrictionDraft;
use steps::{StepKind, WizardMode, visible_steps};

// ---------------------------------------------------------------------------
// Plan kind
// ---------------------------------------------------------------------------

/// The kind of plan being created, as picked from the plan menu. Determines
/// the security block (or its absence, for PUSH) and the visible steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanKind {
    Oauth2,
    Jwt,
    ApiKey,
    KeyLess,
    Push,
    Mtls,
}

impl PlanKind {
    /// The security type the plan will carry. PUSH plans carry none.
    pub fn security_type(self) -> Option<PlanSecurityType> {
        match self {
            Self::Oauth2 => Some(PlanSecurityType::Oauth2),
            Self::Jwt => Some(PlanSecurityType::Jwt),
            Self::ApiKey => Some(PlanSecurityType::ApiKey),
            Self::KeyLess => Some(PlanSecurityType::KeyLess),
            Self::Mtls => Some(PlanSecurityType::Mtls),
            Self::Push => None,
        }
    }

    pub fn mode(self) -> PlanMode {
        match self {
            Self::Push => PlanMode::Push,
            _ => PlanMode::Standard,
        }
    }

    /// Recover the kind of an existing plan; `None` for a malformed plan
    /// that is neither PUSH nor carries a security block.
    pub fn from_plan(plan: &Plan) -> Option<Self> {
        if plan.mode == PlanMode::Push {
            return Some(Self::Push);
        }
        plan.security_type().map(|security_type| match security_type {
            PlanSecurityType::Oauth2 => Self::Oauth2,
            PlanSecurityType::Jwt => Self::Jwt,
            PlanSecurityType::ApiKey => Self::ApiKey,
            PlanSecurityType::KeyLess => Self::KeyLess,
            PlanSecurityType::Mtls => Self::Mtls,
        })
    }
}

impl fmt::Display for PlanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Oauth2 => "OAUTH2",
            Self::Jwt => "JWT",
            Self::ApiKey => "API_KEY",
            Self::KeyLess => "KEY_LESS",
            Self::Push => "PUSH",
            Self::Mtls => "MTLS",
        };
        f.write_str(s)
    }
}

impl FromStr for PlanKind {
    type Err = PlanKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "OAUTH2" => Ok(Self::Oauth2),
            "JWT" => Ok(Self::Jwt),
            "API_KEY" => Ok(Self::ApiKey),
            "KEY_LESS" | "KEYLESS" => Ok(Self::KeyLess),
            "PUSH" => Ok(Self::Push),
            "MTLS" => Ok(Self::Mtls),
            _ => Err(PlanKindParseError(s.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`PlanKind`] string.
#[derive(Debug, Clone)]
pub struct PlanKindParseError(pub String);

impl fmt::Display for PlanKindParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid plan kind: {:?}", self.0)
    }
}

impl std::error::Error for PlanKindParseError {}

// ---------------------------------------------------------------------------
// Draft
// ---------------------------------------------------------------------------

/// The form's working data, step by step.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanDraft {
    pub name: String,
    pub description: String,
    pub validation: PlanValidation,
    pub comment_required: bool,
    pub comment_message: Option<String>,
    pub general_conditions: Option<String>,
    pub characteristics: Vec<String>,
    pub excluded_groups: Vec<String>,
    pub tags: Vec<String>,
    /// Raw configuration from the Secure (or mTLS) step.
    pub security_configuration: Value,
    pub restriction: RestrictionDraft,
}

impl Default for PlanDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            validation: PlanValidation::Manual,
            comment_required: false,
            comment_message: None,
            general_conditions: None,
            characteristics: Vec::new(),
            excluded_groups: Vec::new(),
            tags: Vec::new(),
            security_configuration: Value::Object(serde_json::Map::new()),
            restriction: RestrictionDraft::default(),
        }
    }
}

impl PlanDraft {
    /// Seed a draft from an existing plan for editing.
    pub fn from_plan(plan: &Plan) -> Self {
        Self {
            name: plan.name.clone(),
            description: plan.description.clone(),
            validation: plan.validation,
            comment_required: plan.comment_required,
            comment_message: plan.comment_message.clone(),
            general_conditions: plan.general_conditions.clone(),
            characteristics: plan.characteristics.clone(),
            excluded_groups: plan.excluded_groups.clone().unwrap_or_default(),
            tags: plan.tags.clone(),
            security_configuration: plan
                .security
                .as_ref()
                .and_then(|s| s.configuration.clone())
                .unwrap_or_else(|| Value::Object(serde_json::Map::new())),
            restriction: RestrictionDraft::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Wizard
// ---------------------------------------------------------------------------

/// Saved plan plus the status tab the list should return to: STAGING after
/// a create, the plan's pre-edit status after an edit.
#[derive(Debug, Clone)]
pub struct WizardOutcome {
    pub plan: Plan,
    pub return_filter: PlanStatus,
}

/// The multi-step plan form.
#[derive(Debug, Clone)]
pub struct PlanWizard {
    api: Api,
    kind: PlanKind,
    mode: WizardMode,
    steps: Vec<StepKind>,
    step_index: usize,
    pub draft: PlanDraft,
}

impl PlanWizard {
    /// A create wizard for a plan of `kind` on `api`.
    pub fn create(api: Api, kind: PlanKind) -> Self {
        let steps = visible_steps(kind, &api, WizardMode::Create);
        Self {
            api,
            kind,
            mode: WizardMode::Create,
            steps,
            step_index: 0,
            draft: PlanDraft::default(),
        }
    }

    /// An edit wizard seeded from `plan`.
    pub fn edit(api: Api, plan: &Plan) -> Result<Self> {
        let kind = PlanKind::from_plan(plan)
            .with_context(|| format!("plan {} carries no security type", plan.name))?;
        let steps = visible_steps(kind, &api, WizardMode::Edit);
        Ok(Self {
            api,
            kind,
            mode: WizardMode::Edit,
            steps,
            step_index: 0,
            draft: PlanDraft::from_plan(plan),
        })
    }

    pub fn kind(&self) -> PlanKind {
        self.kind
    }

    pub fn mode(&self) -> WizardMode {
        self.mode
    }

    pub fn steps(&self) -> &[StepKind] {
        &self.steps
    }

    pub fn current_step(&self) -> StepKind {
        self.steps[self.step_index]
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn has_previous(&self) -> bool {
        self.step_index > 0
    }

    pub fn has_next(&self) -> bool {
        self.step_index + 1 < self.steps.len()
    }

    /// Advance to the next step. Refused while the current step is invalid.
    pub fn next(&mut self) -> bool {
        if self.has_next() && self.is_step_valid(self.current_step()) {
            self.step_index += 1;
            true
        } else {
            false
        }
    }

    pub fn previous(&mut self) -> bool {
        if self.has_previous() {
            self.step_index -= 1;
            true
        } else {
            false
        }
    }

    /// Validity of one step against the draft.
    pub fn is_step_valid(&self, step: StepKind) -> bool {
        match step {
            StepKind::General => !self.draft.name.trim().is_empty(),
            StepKind::Secure | StepKind::MtlsAuth => self.draft.security_configuration.is_object(),
            StepKind::Restriction => true,
        }
    }

    /// Overall validity: the conjunction of visible steps. Hidden steps do
    /// not count.
    pub fn is_valid(&self) -> bool {
        self.steps.iter().all(|&step| self.is_step_valid(step))
    }

    /// POST the assembled create body. An invalid form sends nothing.
    pub async fn submit_create(&self, client: &ManagementClient) -> Result<WizardOutcome> {
        if !self.is_valid() {
            bail!("plan form is incomplete; nothing was sent");
        }
        let body = payload::create_body(&self.api, self.kind, &self.draft)?;
        let plan = plans::create_plan(client, &self.api.id, &body).await?;

        tracing::info!(
            plan_id = %plan.id,
            plan_name = %plan.name,
            kind = %self.kind,
            "plan created"
        );

        Ok(WizardOutcome {
            plan,
            return_filter: PlanStatus::Staging,
        })
    }

    /// Re-fetch the plan, merge the draft over it and PUT the full body.
    /// An invalid form sends nothing.
    pub async fn submit_edit(&self, client: &ManagementClient, plan_id: &str) -> Result<WizardOutcome> {
        if !self.is_valid() {
            bail!("plan form is incomplete; nothing was sent");
        }
        let existing = plans::get_plan(client, &self.api.id, plan_id).await?;
        let merged = payload::merge_edit(&existing, &self.draft);
        let plan = plans::update_plan(client, &self.api.id, &merged).await?;

        tracing::info!(plan_id = %plan.id, plan_name = %plan.name, "plan updated");

        Ok(WizardOutcome {
            plan,
            return_filter: existing.status,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
