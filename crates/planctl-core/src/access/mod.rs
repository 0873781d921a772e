//! Write access: whether plan mutations are offered at all, decided from
//! explicit context (the API descriptor and the caller's permissions)
//! rather than ambient state.
//!
//! Denied does not only hide the transition actions; the plan form renders
//! read-only and create is never offered.

use std::fmt;

use planctl_client::models::{Api, ApiOrigin, DefinitionVersion};

/// The caller's plan permissions on one API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PermissionSet {
    pub plan_read: bool,
    pub plan_update: bool,
    pub plan_create: bool,
}

impl PermissionSet {
    /// Every plan permission; what an API owner holds.
    pub fn all() -> Self {
        Self {
            plan_read: true,
            plan_update: true,
            plan_create: true,
        }
    }

    /// Read-only access.
    pub fn read_only() -> Self {
        Self {
            plan_read: true,
            ..Self::default()
        }
    }

    /// Build from the management API's permission names. Unknown names are
    /// ignored.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut set = Self::default();
        for name in names {
            match name {
                "api-plan-r" => set.plan_read = true,
                "api-plan-u" => set.plan_update = true,
                "api-plan-c" => set.plan_create = true,
                _ => {}
            }
        }
        set
    }
}

/// Why plan mutations are not offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The caller lacks `api-plan-u`.
    MissingPermission,
    /// The API definition is owned by a Kubernetes operator; the console
    /// must not fight the cluster.
    KubernetesOrigin,
    /// V1 definitions are legacy and read-only in this console.
    LegacyDefinition,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MissingPermission => "the api-plan-u permission is missing",
            Self::KubernetesOrigin => "the API is managed by a Kubernetes operator",
            Self::LegacyDefinition => "V1 API definitions are read-only",
        };
        f.write_str(s)
    }
}

/// Whether plan mutations are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAccess {
    Allowed,
    Denied { reason: DenyReason },
}

impl WriteAccess {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Decide write access for `api` under `permissions`.
pub fn write_access(api: &Api, permissions: &PermissionSet) -> WriteAccess {
    if api.origin() == ApiOrigin::Kubernetes {
        return WriteAccess::Denied {
            reason: DenyReason::KubernetesOrigin,
        };
    }
    if api.definition_version == Some(DefinitionVersion::V1) {
        return WriteAccess::Denied {
            reason: DenyReason::LegacyDefinition,
        };
    }
    if !permissions.plan_update {
        return WriteAccess::Denied {
            reason: DenyReason::MissingPermission,
        };
    }
    WriteAccess::Allowed
}

/// Creating additionally needs `api-plan-c`.
pub fn can_create(api: &Api, permissions: &PermissionSet) -> bool {
    permissions.plan_create && write_access(api, permissions).is_allowed()
}
