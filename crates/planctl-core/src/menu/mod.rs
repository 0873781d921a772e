//! Plan menu projection: the plan kinds an API may offer, in display
//! order, filtered by the console's enabled security settings and by the
//! API's listener capabilities.

use planctl_client::models::{Api, ListenerType};

use crate::wizard::PlanKind;

/// Console-level switches for each security type. A disabled type never
/// appears in the menu, whatever the API supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecuritySettings {
    pub apikey: bool,
    pub jwt: bool,
    pub mtls: bool,
    pub keyless: bool,
    pub oauth2: bool,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            apikey: true,
            jwt: true,
            mtls: true,
            keyless: true,
            oauth2: true,
        }
    }
}

impl SecuritySettings {
    fn allows(&self, kind: PlanKind) -> bool {
        match kind {
            PlanKind::Oauth2 => self.oauth2,
            PlanKind::Jwt => self.jwt,
            PlanKind::ApiKey => self.apikey,
            PlanKind::KeyLess => self.keyless,
            PlanKind::Mtls => self.mtls,
            // Push is a delivery mode, not a security type; it has no
            // console switch.
            PlanKind::Push => true,
        }
    }
}

/// One entry of the "new plan" menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanMenuItem {
    pub kind: PlanKind,
    pub label: &'static str,
}

/// Display label for a plan kind.
pub fn label(kind: PlanKind) -> &'static str {
    match kind {
        PlanKind::Oauth2 => "OAuth2",
        PlanKind::Jwt => "JWT",
        PlanKind::ApiKey => "API Key",
        PlanKind::KeyLess => "Keyless (public)",
        PlanKind::Push => "Push plan",
        PlanKind::Mtls => "mTLS",
    }
}

/// The plan kinds `api` may offer, in display order.
///
/// - Native APIs offer every security type including mTLS, never PUSH.
/// - TCP APIs cannot challenge requests, so only keyless applies.
/// - A SUBSCRIPTION listener without HTTP means push delivery only.
/// - HTTP APIs offer the authenticated kinds plus keyless, and push when a
///   SUBSCRIPTION listener is also present.
pub fn plan_menu_items(api: &Api, settings: &SecuritySettings) -> Vec<PlanMenuItem> {
    let kinds: &[PlanKind] = if api.is_native() {
        &[
            PlanKind::Oauth2,
            PlanKind::Jwt,
            PlanKind::ApiKey,
            PlanKind::KeyLess,
            PlanKind::Mtls,
        ]
    } else if api.has_listener(ListenerType::Tcp) {
        &[PlanKind::KeyLess]
    } else {
        let http = api.has_listener(ListenerType::Http);
        let subscription = api.has_listener(ListenerType::Subscription);
        match (http, subscription) {
            (false, true) => &[PlanKind::Push],
            (true, true) => &[
                PlanKind::Oauth2,
                PlanKind::Jwt,
                PlanKind::ApiKey,
                PlanKind::KeyLess,
                PlanKind::Push,
            ],
            _ => &[
                PlanKind::Oauth2,
                PlanKind::Jwt,
                PlanKind::ApiKey,
                PlanKind::KeyLess,
            ],
        }
    };

    kinds
        .iter()
        .filter(|&&kind| settings.allows(kind))
        .map(|&kind| PlanMenuItem {
            kind,
            label: label(kind),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use planctl_client::models::{ApiType, Listener};

    fn api(listeners: &[ListenerType], api_type: Option<ApiType>) -> Api {
        let mut api: Api = serde_json::from_value(serde_json::json!({
            "id": "api-1",
            "name": "Echo",
            "definitionVersion": "V4",
        }))
        .expect("api fixture");
        api.api_type = api_type;
        api.listeners = listeners
            .iter()
            .map(|&listener_type| Listener { listener_type })
            .collect();
        api
    }

    fn labels(items: &[PlanMenuItem]) -> Vec<&'static str> {
        items.iter().map(|item| item.label).collect()
    }

    #[test]
    fn http_proxy_menu() {
        let items = plan_menu_items(
            &api(&[ListenerType::Http], Some(ApiType::Proxy)),
            &SecuritySettings::default(),
        );
        assert_eq!(
            labels(&items),
            ["OAuth2", "JWT", "API Key", "Keyless (public)"]
        );
    }

    #[test]
    fn http_and_subscription_menu_adds_push() {
        let items = plan_menu_items(
            &api(
                &[ListenerType::Http, ListenerType::Subscription],
                Some(ApiType::Message),
            ),
            &SecuritySettings::default(),
        );
        assert_eq!(
            labels(&items),
            ["OAuth2", "JWT", "API Key", "Keyless (public)", "Push plan"]
        );
    }

    #[test]
    fn subscription_only_menu_is_push_only() {
        let items = plan_menu_items(
            &api(&[ListenerType::Subscription], Some(ApiType::Message)),
            &SecuritySettings::default(),
        );
        assert_eq!(labels(&items), ["Push plan"]);
    }

    #[test]
    fn tcp_menu_is_keyless_only() {
        let items = plan_menu_items(
            &api(&[ListenerType::Tcp], Some(ApiType::Proxy)),
            &SecuritySettings::default(),
        );
        assert_eq!(labels(&items), ["Keyless (public)"]);
    }

    #[test]
    fn native_menu_offers_mtls_but_not_push() {
        let items = plan_menu_items(
            &api(&[ListenerType::Kafka], Some(ApiType::Native)),
            &SecuritySettings::default(),
        );
        assert_eq!(
            labels(&items),
            ["OAuth2", "JWT", "API Key", "Keyless (public)", "mTLS"]
        );
    }

    #[test]
    fn disabled_settings_filter_the_menu() {
        let settings = SecuritySettings {
            oauth2: false,
            jwt: false,
            ..SecuritySettings::default()
        };
        let items = plan_menu_items(&api(&[ListenerType::Http], Some(ApiType::Proxy)), &settings);
        assert_eq!(labels(&items), ["API Key", "Keyless (public)"]);
    }
}
