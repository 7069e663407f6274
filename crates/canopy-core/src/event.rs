//! Discrete UI event payloads.
//!
//! On the wire an event is a flat `map<string,string>` — the controller side
//! treats it as an opaque key/value record. [`UiEvent`] is the typed builder
//! the capture side uses before lowering to the wire form.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wire form of one UI event: a flat string map.
///
/// `BTreeMap` keeps serialization order stable across captures.
pub type EventPayload = BTreeMap<String, String>;

pub const KEY_EVENT_TYPE: &str = "event_type";
pub const KEY_PACKAGE_NAME: &str = "event_package_name";
pub const KEY_SOURCE_CLASS: &str = "source_class_name";
pub const KEY_TEXT: &str = "event_text";
pub const KEY_TIMESTAMP_MS: &str = "event_timestamp_ms";

/// A typed UI event as observed on-device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiEvent {
    /// Platform event type name, e.g. `TYPE_WINDOW_CONTENT_CHANGED`.
    pub event_type: String,

    /// Package of the app that produced the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,

    /// Class of the source view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_class: Option<String>,

    /// Event text, when the platform attaches any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    pub timestamp: DateTime<Utc>,

    /// Extra key/value pairs carried through verbatim.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: BTreeMap<String, String>,
}

impl UiEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            package_name: None,
            source_class: None,
            text: None,
            timestamp: Utc::now(),
            extras: BTreeMap::new(),
        }
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package_name = Some(package.into());
        self
    }

    pub fn with_source_class(mut self, class: impl Into<String>) -> Self {
        self.source_class = Some(class.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    /// Lower to the wire's flat string map. Typed fields win over extras with
    /// the same key.
    pub fn into_wire_map(self) -> EventPayload {
        let mut map = self.extras;
        map.insert(
            KEY_TIMESTAMP_MS.to_string(),
            self.timestamp.timestamp_millis().to_string(),
        );
        if let Some(package) = self.package_name {
            map.insert(KEY_PACKAGE_NAME.to_string(), package);
        }
        if let Some(class) = self.source_class {
            map.insert(KEY_SOURCE_CLASS.to_string(), class);
        }
        if let Some(text) = self.text {
            map.insert(KEY_TEXT.to_string(), text);
        }
        map.insert(KEY_EVENT_TYPE.to_string(), self.event_type);
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_map_carries_typed_fields() {
        let map = UiEvent::new("TYPE_VIEW_CLICKED")
            .with_package("com.example.game")
            .with_source_class("android.widget.Button")
            .with_text("OK")
            .into_wire_map();

        assert_eq!(map[KEY_EVENT_TYPE], "TYPE_VIEW_CLICKED");
        assert_eq!(map[KEY_PACKAGE_NAME], "com.example.game");
        assert_eq!(map[KEY_SOURCE_CLASS], "android.widget.Button");
        assert_eq!(map[KEY_TEXT], "OK");
        assert!(map.contains_key(KEY_TIMESTAMP_MS));
    }

    #[test]
    fn typed_fields_win_over_extras() {
        let map = UiEvent::new("TYPE_ANNOUNCEMENT")
            .with_extra(KEY_EVENT_TYPE, "bogus")
            .with_extra("scroll_delta_y", "42")
            .into_wire_map();

        assert_eq!(map[KEY_EVENT_TYPE], "TYPE_ANNOUNCEMENT");
        assert_eq!(map["scroll_delta_y"], "42");
    }

    #[test]
    fn absent_fields_stay_off_the_map() {
        let map = UiEvent::new("TYPE_WINDOWS_CHANGED").into_wire_map();
        assert!(!map.contains_key(KEY_PACKAGE_NAME));
        assert!(!map.contains_key(KEY_TEXT));
    }
}
