//! Restriction step: optional rate-limit, quota and resource-filtering
//! policies, translated into a single default flow on the new plan.
//!
//! The flow matches every path (`STARTS_WITH "/"`). Policy steps land on
//! the `request` chain for V4 plans and on the legacy `pre` chain for V2
//! plans. Flows are only built at create time; editing a plan leaves its
//! flow list untouched.

use serde_json::{Value, json};

/// Restriction policies chosen in the wizard. `None` means the policy is
/// disabled; `Some` carries its configuration as entered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestrictionDraft {
    pub rate_limit: Option<Value>,
    pub quota: Option<Value>,
    pub resource_filtering: Option<Value>,
}

impl RestrictionDraft {
    pub fn is_empty(&self) -> bool {
        self.rate_limit.is_none() && self.quota.is_none() && self.resource_filtering.is_none()
    }

    /// Policy steps in console order: rate limit, quota, resource filtering.
    fn steps(&self) -> Vec<Value> {
        let mut steps = Vec::new();
        if let Some(configuration) = &self.rate_limit {
            steps.push(policy_step("Rate Limiting", "rate-limit", configuration));
        }
        if let Some(configuration) = &self.quota {
            steps.push(policy_step("Quota", "quota", configuration));
        }
        if let Some(configuration) = &self.resource_filtering {
            steps.push(policy_step(
                "Resource Filtering",
                "resource-filtering",
                configuration,
            ));
        }
        steps
    }
}

fn policy_step(name: &str, policy: &str, configuration: &Value) -> Value {
    json!({
        "enabled": true,
        "name": name,
        "policy": policy,
        "configuration": configuration,
    })
}

/// Flows for a V4 create body. Empty when no restriction is enabled.
pub fn v4_flows(draft: &RestrictionDraft) -> Vec<Value> {
    if draft.is_empty() {
        return Vec::new();
    }
    vec![json!({
        "name": "",
        "enabled": true,
        "selectors": [{
            "type": "HTTP",
            "path": "/",
            "pathOperator": "STARTS_WITH",
        }],
        "request": draft.steps(),
        "response": [],
    })]
}

/// Flows for a V2 create body. Empty when no restriction is enabled.
pub fn v2_flows(draft: &RestrictionDraft) -> Vec<Value> {
    if draft.is_empty() {
        return Vec::new();
    }
    vec![json!({
        "name": "",
        "enabled": true,
        "path-operator": {
            "path": "/",
            "operator": "STARTS_WITH",
        },
        "pre": draft.steps(),
        "post": [],
    })]
}
