//! Step visibility: which wizard steps a plan form shows, as a pure
//! function of the plan kind, the owning API and the wizard mode.

use std::fmt;

use planctl_client::models::{Api, DefinitionVersion, ListenerType};

use super::PlanKind;

/// One step of the plan form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    /// Name, description, validation, comments, conditions, restrictions
    /// metadata.
    General,
    /// Security configuration for the chosen kind.
    Secure,
    /// Client-certificate configuration; replaces [`StepKind::Secure`] for
    /// mTLS plans.
    MtlsAuth,
    /// Optional rate-limit, quota and resource-filtering policies.
    /// Create-only.
    Restriction,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::General => f.write_str("General"),
            Self::Secure => f.write_str("Secure"),
            Self::MtlsAuth => f.write_str("mTLS authentication"),
            Self::Restriction => f.write_str("Restriction"),
        }
    }
}

/// Whether the wizard creates a plan or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardMode {
    Create,
    Edit,
}

/// Compute the visible steps for a plan form.
///
/// The base sequence is General, Secure, Restriction, narrowed by:
/// - TCP-listener and FEDERATED APIs: General only.
/// - KEY_LESS and PUSH plans carry no security configuration, so Secure is
///   skipped.
/// - mTLS plans show [`StepKind::MtlsAuth`] in place of Secure.
/// - Restriction exists only when creating, and never on native APIs.
pub fn visible_steps(kind: PlanKind, api: &Api, mode: WizardMode) -> Vec<StepKind> {
    if api.has_listener(ListenerType::Tcp)
        || api.definition_version == Some(DefinitionVersion::Federated)
    {
        return vec![StepKind::General];
    }

    let mut steps = vec![StepKind::General];

    match kind {
        PlanKind::KeyLess | PlanKind::Push => {}
        PlanKind::Mtls => steps.push(StepKind::MtlsAuth),
        PlanKind::ApiKey | PlanKind::Jwt | PlanKind::Oauth2 => steps.push(StepKind::Secure),
    }

    if mode == WizardMode::Create && !api.is_native() {
        steps.push(StepKind::Restriction);
    }

    steps
}
