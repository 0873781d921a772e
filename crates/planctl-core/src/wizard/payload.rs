//! Create/update payload assembly.
//!
//! The create body branches on the owning API's definition version. V4 and
//! FEDERATED APIs take the structured camelCase shape; V2 APIs still speak
//! the legacy snake_case dialect where the security configuration travels
//! as a stringified JSON blob. Updates are full-replace: the merged body
//! carries every field of the fetched plan, edited or not.

use anyhow::{Result, bail};
use serde::Serialize;
use serde_json::Value;

use planctl_client::models::{
    Api, DefinitionVersion, Plan, PlanMode, PlanSecurity, PlanSecurityType, PlanValidation,
};

use super::restriction;
use super::{PlanDraft, PlanKind};

/// Create body for V4 and FEDERATED APIs. Every field is serialized, absent
/// ones as `null`, so the backend never falls back to field-level defaults.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlanV4 {
    pub definition_version: DefinitionVersion,
    pub name: String,
    pub description: String,
    pub comment_message: Option<String>,
    pub comment_required: bool,
    pub mode: PlanMode,
    pub validation: PlanValidation,
    pub general_conditions: Option<String>,
    pub characteristics: Vec<String>,
    pub excluded_groups: Vec<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<PlanSecurity>,
    pub selection_rule: Option<String>,
    pub flows: Vec<Value>,
}

/// Create body for V2 APIs: legacy snake_case field names, the security
/// type as a bare token and its configuration stringified into
/// `securityDefinition`.
#[derive(Debug, Clone, Serialize)]
pub struct LegacyNewPlan {
    pub name: String,
    pub description: String,
    pub validation: PlanValidation,
    pub comment_required: bool,
    pub comment_message: Option<String>,
    pub general_conditions: Option<String>,
    pub characteristics: Vec<String>,
    pub excluded_groups: Vec<String>,
    pub tags: Vec<String>,
    pub security: PlanSecurityType,
    #[serde(rename = "securityDefinition")]
    pub security_definition: String,
    pub selection_rule: Option<String>,
    pub flows: Vec<Value>,
}

/// Assemble the create body for `draft` on `api`.
pub fn create_body(api: &Api, kind: PlanKind, draft: &PlanDraft) -> Result<Value> {
    let (validation, comment_required) = normalize(kind, draft);

    match api.definition_version {
        Some(DefinitionVersion::V2) => {
            let Some(security) = kind.security_type() else {
                bail!("push plans require a V4 API");
            };
            let body = LegacyNewPlan {
                name: draft.name.clone(),
                description: draft.description.clone(),
                validation,
                comment_required,
                comment_message: draft.comment_message.clone(),
                general_conditions: draft.general_conditions.clone(),
                characteristics: draft.characteristics.clone(),
                excluded_groups: draft.excluded_groups.clone(),
                tags: draft.tags.clone(),
                security,
                security_definition: serde_json::to_string(&draft.security_configuration)?,
                selection_rule: None,
                flows: restriction::v2_flows(&draft.restriction),
            };
            Ok(serde_json::to_value(body)?)
        }
        version => {
            let definition_version = match version {
                Some(DefinitionVersion::Federated) => DefinitionVersion::Federated,
                _ => DefinitionVersion::V4,
            };
            let body = NewPlanV4 {
                definition_version,
                name: draft.name.clone(),
                description: draft.description.clone(),
                comment_message: draft.comment_message.clone(),
                comment_required,
                mode: kind.mode(),
                validation,
                general_conditions: draft.general_conditions.clone(),
                characteristics: draft.characteristics.clone(),
                excluded_groups: draft.excluded_groups.clone(),
                tags: draft.tags.clone(),
                security: kind.security_type().map(|security_type| PlanSecurity {
                    security_type,
                    configuration: Some(draft.security_configuration.clone()),
                }),
                selection_rule: None,
                flows: restriction::v4_flows(&draft.restriction),
            };
            Ok(serde_json::to_value(body)?)
        }
    }
}

/// Merge the draft over a freshly fetched plan for a full-replace update.
///
/// The security type is immutable on edit (only its configuration can
/// change), and the flow list is preserved as fetched.
pub fn merge_edit(existing: &Plan, draft: &PlanDraft) -> Plan {
    let kind = PlanKind::from_plan(existing).unwrap_or(PlanKind::ApiKey);
    let (validation, comment_required) = normalize(kind, draft);

    let mut updated = existing.clone();
    updated.name = draft.name.clone();
    updated.description = draft.description.clone();
    updated.characteristics = draft.characteristics.clone();
    updated.tags = draft.tags.clone();
    updated.excluded_groups = Some(draft.excluded_groups.clone());
    updated.general_conditions = draft.general_conditions.clone();
    updated.comment_message = draft.comment_message.clone();
    updated.comment_required = comment_required;
    updated.validation = validation;
    if let Some(security) = updated.security.as_mut() {
        security.configuration = Some(draft.security_configuration.clone());
    }
    updated
}

/// KEY_LESS consumers are anonymous: there is no subscription to approve
/// and nobody to require a comment from.
fn normalize(kind: PlanKind, draft: &PlanDraft) -> (PlanValidation, bool) {
    if kind == PlanKind::KeyLess {
        (PlanValidation::Auto, false)
    } else {
        (draft.validation, draft.comment_required)
    }
}
