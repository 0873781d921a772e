use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Lifecycle status of a plan.
///
/// Ordering follows the lifecycle (STAGING before PUBLISHED before
/// DEPRECATED before CLOSED) so status tabs and count maps iterate in a
/// stable order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    Staging,
    Published,
    Deprecated,
    Closed,
}

impl PlanStatus {
    /// Every status, in lifecycle order. Full reloads request all of them.
    pub const ALL: [PlanStatus; 4] = [
        PlanStatus::Staging,
        PlanStatus::Published,
        PlanStatus::Deprecated,
        PlanStatus::Closed,
    ];
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Staging => "STAGING",
            Self::Published => "PUBLISHED",
            Self::Deprecated => "DEPRECATED",
            Self::Closed => "CLOSED",
        };
        f.write_str(s)
    }
}

impl FromStr for PlanStatus {
    type Err = PlanStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "STAGING" => Ok(Self::Staging),
            "PUBLISHED" => Ok(Self::Published),
            "DEPRECATED" => Ok(Self::Deprecated),
            "CLOSED" => Ok(Self::Closed),
            _ => Err(PlanStatusParseError(s.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`PlanStatus`] string.
#[derive(Debug, Clone)]
pub struct PlanStatusParseError(pub String);

impl fmt::Display for PlanStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid plan status: {:?}", self.0)
    }
}

impl std::error::Error for PlanStatusParseError {}

// ---------------------------------------------------------------------------

/// Inbound security challenge a plan enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanSecurityType {
    ApiKey,
    Jwt,
    Oauth2,
    KeyLess,
    Mtls,
}

impl fmt::Display for PlanSecurityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ApiKey => "API_KEY",
            Self::Jwt => "JWT",
            Self::Oauth2 => "OAUTH2",
            Self::KeyLess => "KEY_LESS",
            Self::Mtls => "MTLS",
        };
        f.write_str(s)
    }
}

impl FromStr for PlanSecurityType {
    type Err = PlanSecurityTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "API_KEY" => Ok(Self::ApiKey),
            "JWT" => Ok(Self::Jwt),
            "OAUTH2" => Ok(Self::Oauth2),
            "KEY_LESS" => Ok(Self::KeyLess),
            "MTLS" => Ok(Self::Mtls),
            _ => Err(PlanSecurityTypeParseError(s.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`PlanSecurityType`] string.
#[derive(Debug, Clone)]
pub struct PlanSecurityTypeParseError(pub String);

impl fmt::Display for PlanSecurityTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid plan security type: {:?}", self.0)
    }
}

impl std::error::Error for PlanSecurityTypeParseError {}

// ---------------------------------------------------------------------------

/// STANDARD plans challenge inbound calls; PUSH plans carry no security
/// block and exist for webhook/subscription-style delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanMode {
    Standard,
    Push,
}

impl Default for PlanMode {
    fn default() -> Self {
        Self::Standard
    }
}

impl fmt::Display for PlanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Standard => "STANDARD",
            Self::Push => "PUSH",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------

/// How subscription requests against the plan are approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanValidation {
    Auto,
    Manual,
}

impl Default for PlanValidation {
    fn default() -> Self {
        Self::Manual
    }
}

impl fmt::Display for PlanValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Auto => "AUTO",
            Self::Manual => "MANUAL",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------

/// API definition version. V1 is legacy read-only; FEDERATED definitions
/// come from an external provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DefinitionVersion {
    V1,
    V2,
    V4,
    Federated,
}

impl fmt::Display for DefinitionVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::V1 => "V1",
            Self::V2 => "V2",
            Self::V4 => "V4",
            Self::Federated => "FEDERATED",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiType {
    Proxy,
    Message,
    Native,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListenerType {
    Http,
    Subscription,
    Tcp,
    Kafka,
}

/// Where an API's definition is managed from. KUBERNETES-origin APIs are
/// owned by the cluster operator and read-only in the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiOrigin {
    Management,
    Kubernetes,
}

// ---------------------------------------------------------------------------

/// Lifecycle status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    Pending,
    Accepted,
    Paused,
    Rejected,
    Closed,
    Resumed,
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::Paused => "PAUSED",
            Self::Rejected => "REJECTED",
            Self::Closed => "CLOSED",
            Self::Resumed => "RESUMED",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSecurity {
    #[serde(rename = "type")]
    pub security_type: PlanSecurityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<serde_json::Value>,
}

/// An access contract for an API. Updates are full-replace, so this carries
/// every mutable field the backend knows about; flows stay opaque JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: PlanStatus,
    pub definition_version: DefinitionVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<PlanSecurity>,
    #[serde(default)]
    pub mode: PlanMode,
    #[serde(default)]
    pub validation: PlanValidation,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub characteristics: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_groups: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general_conditions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_message: Option<String>,
    #[serde(default)]
    pub comment_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_rule: Option<String>,
    #[serde(default)]
    pub flows: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Plan {
    /// Security type, if the plan carries one. PUSH plans do not.
    pub fn security_type(&self) -> Option<PlanSecurityType> {
        self.security.as_ref().map(|s| s.security_type)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listener {
    #[serde(rename = "type")]
    pub listener_type: ListenerType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionContext {
    pub origin: ApiOrigin,
}

/// The owning API, reduced to what plan orchestration needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Api {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_version: Option<DefinitionVersion>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub api_type: Option<ApiType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub listeners: Vec<Listener>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_context: Option<DefinitionContext>,
}

impl Api {
    /// Kafka-like APIs; their transport makes plan security types mutually
    /// exclusive at publish time.
    pub fn is_native(&self) -> bool {
        self.api_type == Some(ApiType::Native)
    }

    pub fn has_listener(&self, listener_type: ListenerType) -> bool {
        self.listeners.iter().any(|l| l.listener_type == listener_type)
    }

    pub fn origin(&self) -> ApiOrigin {
        self.definition_context
            .as_ref()
            .map(|c| c.origin)
            .unwrap_or(ApiOrigin::Management)
    }
}

/// A binding between an application and a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
    pub status: SubscriptionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ending_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Page envelopes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlansPage {
    pub data: Vec<Plan>,
    #[serde(default)]
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
}

/// Subscription list envelope. Only the reported size is consumed when
/// sizing close confirmations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionsPage {
    pub data: Vec<Subscription>,
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub page: PageInfo,
}

impl SubscriptionsPage {
    /// Subscription count as reported by the page envelope, falling back to
    /// the rows actually returned.
    pub fn total(&self) -> usize {
        self.page.size.unwrap_or(self.data.len())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_status_display_roundtrip() {
        for v in &PlanStatus::ALL {
            let s = v.to_string();
            let parsed: PlanStatus = s.parse().expect("should parse");
            assert_eq!(*v, parsed);
        }
    }

    #[test]
    fn plan_status_parse_accepts_lowercase() {
        let parsed: PlanStatus = "staging".parse().expect("should parse");
        assert_eq!(parsed, PlanStatus::Staging);
    }

    #[test]
    fn plan_status_invalid() {
        let result = "archived".parse::<PlanStatus>();
        assert!(result.is_err());
    }

    #[test]
    fn security_type_display_roundtrip() {
        let variants = [
            PlanSecurityType::ApiKey,
            PlanSecurityType::Jwt,
            PlanSecurityType::Oauth2,
            PlanSecurityType::KeyLess,
            PlanSecurityType::Mtls,
        ];
        for v in &variants {
            let s = v.to_string();
            let parsed: PlanSecurityType = s.parse().expect("should parse");
            assert_eq!(*v, parsed);
        }
    }

    #[test]
    fn security_type_invalid() {
        let result = "BASIC".parse::<PlanSecurityType>();
        assert!(result.is_err());
    }

    #[test]
    fn enums_serialize_to_wire_tokens() {
        assert_eq!(
            serde_json::to_string(&PlanStatus::Staging).unwrap(),
            "\"STAGING\""
        );
        assert_eq!(
            serde_json::to_string(&PlanSecurityType::ApiKey).unwrap(),
            "\"API_KEY\""
        );
        assert_eq!(
            serde_json::to_string(&PlanSecurityType::KeyLess).unwrap(),
            "\"KEY_LESS\""
        );
        assert_eq!(
            serde_json::to_string(&DefinitionVersion::Federated).unwrap(),
            "\"FEDERATED\""
        );
    }

    #[test]
    fn plan_deserializes_with_minimal_fields() {
        let plan: Plan = serde_json::from_str(
            r#"{"id":"p1","name":"Free","status":"STAGING","definitionVersion":"V4"}"#,
        )
        .expect("should deserialize");
        assert_eq!(plan.mode, PlanMode::Standard);
        assert_eq!(plan.validation, PlanValidation::Manual);
        assert_eq!(plan.order, 0);
        assert!(plan.security.is_none());
        assert!(plan.flows.is_empty());
    }

    #[test]
    fn api_origin_defaults_to_management() {
        let api: Api = serde_json::from_str(r#"{"id":"a1","name":"Echo"}"#).expect("should parse");
        assert_eq!(api.origin(), ApiOrigin::Management);
    }

    #[test]
    fn subscriptions_page_total_prefers_page_size() {
        let page: SubscriptionsPage = serde_json::from_str(
            r#"{"data":[{"id":"s1","status":"ACCEPTED"}],"metadata":{},"page":{"size":7}}"#,
        )
        .expect("should parse");
        assert_eq!(page.total(), 7);

        let page: SubscriptionsPage =
            serde_json::from_str(r#"{"data":[{"id":"s1","status":"ACCEPTED"}]}"#)
                .expect("should parse");
        assert_eq!(page.total(), 1);
    }
}
