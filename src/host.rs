//! JSON shapes exchanged with the launcher host, one object per line.

use crate::format::DisplayItem;
use crate::settings::{DEFAULT_KEYWORD, KEYWORD_PREFERENCE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    KeywordQuery,
    Preferences,
    PreferencesUpdate,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    KeywordQuery {
        keyword: String,
        #[serde(default)]
        argument: Option<String>,
    },
    Preferences {
        preferences: HashMap<String, String>,
    },
    PreferencesUpdate {
        id: String,
        #[serde(default)]
        old_value: Option<String>,
        new_value: String,
    },
}

impl HostEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            HostEvent::KeywordQuery { .. } => EventKind::KeywordQuery,
            HostEvent::Preferences { .. } => EventKind::Preferences,
            HostEvent::PreferencesUpdate { .. } => EventKind::PreferencesUpdate,
        }
    }

    pub fn parse(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ItemAction {
    CopyToClipboard { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultItem {
    pub icon: String,
    pub name: String,
    pub description: String,
    pub on_enter: ItemAction,
}

impl From<DisplayItem> for ResultItem {
    fn from(item: DisplayItem) -> Self {
        Self {
            icon: item.icon.to_string(),
            name: item.title,
            description: item.subtitle,
            on_enter: ItemAction::CopyToClipboard {
                text: item.copy_payload,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RenderAction {
    RenderResultList { items: Vec<ResultItem> },
}

impl RenderAction {
    pub fn result_list(items: impl IntoIterator<Item = DisplayItem>) -> Self {
        RenderAction::RenderResultList {
            items: items.into_iter().map(ResultItem::from).collect(),
        }
    }

    pub fn to_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Serialize)]
pub struct Manifest {
    pub required_api_version: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub preferences: Vec<ManifestPreference>,
}

#[derive(Debug, Serialize)]
pub struct ManifestPreference {
    pub id: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: &'static str,
    pub default_value: &'static str,
}

impl Manifest {
    pub fn current() -> Self {
        Self {
            required_api_version: "2",
            name: "Internet Speed Test",
            description: "Measure ping, download and upload speed",
            icon: "images/icon.png",
            preferences: vec![ManifestPreference {
                id: KEYWORD_PREFERENCE,
                kind: "keyword",
                name: "Speed test",
                default_value: DEFAULT_KEYWORD,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_keyword_query() {
        let event = HostEvent::parse(r#"{"event":"keyword_query","keyword":"spd"}"#).unwrap();
        assert_eq!(event.kind(), EventKind::KeywordQuery);
        assert_eq!(
            event,
            HostEvent::KeywordQuery {
                keyword: "spd".to_string(),
                argument: None
            }
        );
    }

    #[test]
    fn parses_preference_events() {
        let load = HostEvent::parse(r#"{"event":"preferences","preferences":{"recents_kw":"spd"}}"#).unwrap();
        assert_eq!(load.kind(), EventKind::Preferences);

        let update = HostEvent::parse(
            r#"{"event":"preferences_update","id":"recents_kw","old_value":"spd","new_value":"speed"}"#,
        )
        .unwrap();
        assert_eq!(update.kind(), EventKind::PreferencesUpdate);
    }

    #[test]
    fn rejects_unknown_event() {
        assert!(HostEvent::parse(r#"{"event":"item_enter"}"#).is_err());
    }

    #[test]
    fn render_action_wire_shape() {
        let item = DisplayItem {
            icon: "images/ping.png",
            title: "Ping: 14.2 ms".to_string(),
            subtitle: "Display ping information".to_string(),
            copy_payload: "Ping: 14.2 ms".to_string(),
        };
        let action = RenderAction::result_list([item]);

        let value: serde_json::Value = serde_json::from_str(&action.to_line().unwrap()).unwrap();

        assert_eq!(
            value,
            json!({
                "action": "render_result_list",
                "items": [{
                    "icon": "images/ping.png",
                    "name": "Ping: 14.2 ms",
                    "description": "Display ping information",
                    "on_enter": {"action": "copy_to_clipboard", "text": "Ping: 14.2 ms"}
                }]
            })
        );
    }

    #[test]
    fn manifest_declares_keyword_preference() {
        let value = serde_json::to_value(Manifest::current()).unwrap();
        assert_eq!(value["preferences"][0]["id"], "recents_kw");
        assert_eq!(value["preferences"][0]["type"], "keyword");
        assert_eq!(value["preferences"][0]["default_value"], DEFAULT_KEYWORD);
    }
}
