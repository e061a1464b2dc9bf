use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

pub type Properties = Map<String, Value>;

pub const RESERVED_FIELDS: [&str; 8] = [
    "action",
    "object_type",
    "objectType",
    "object_id",
    "objectId",
    "timestamp",
    "screen_resolution",
    "screenResolution",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObjectId {
    Int(i64),
    Str(String),
    Other(Value),
}

impl From<i64> for ObjectId {
    fn from(value: i64) -> Self {
        ObjectId::Int(value)
    }
}

impl From<i32> for ObjectId {
    fn from(value: i32) -> Self {
        ObjectId::Int(i64::from(value))
    }
}

impl From<u32> for ObjectId {
    fn from(value: u32) -> Self {
        ObjectId::Int(i64::from(value))
    }
}

impl From<&str> for ObjectId {
    fn from(value: &str) -> Self {
        ObjectId::Str(value.to_string())
    }
}

impl From<String> for ObjectId {
    fn from(value: String) -> Self {
        ObjectId::Str(value)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectId::Int(id) => write!(f, "{}", id),
            ObjectId::Str(id) => f.write_str(id),
            ObjectId::Other(value) => write!(f, "{}", value),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Screen {
    pub width: u32,
    pub height: u32,
}

impl Screen {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

pub trait ScreenSource: Send + Sync {
    fn screen(&self) -> Screen;
}

pub struct FixedScreen(pub Screen);

impl ScreenSource for FixedScreen {
    fn screen(&self) -> Screen {
        self.0
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Event {
    pub action: String,
    pub object_type: String,
    pub object_id: ObjectId,
    pub timestamp: f64,
    pub screen_resolution: String,
    #[serde(flatten)]
    pub properties: Properties,
}

impl Event {
    pub fn new(
        action: &str,
        object_type: &str,
        object_id: ObjectId,
        screen: Screen,
        properties: Option<Properties>,
    ) -> Self {
        let mut properties = properties.unwrap_or_default();
        for key in RESERVED_FIELDS {
            if properties.remove(key).is_some() {
                debug!(key, action, "ignoring property that shadows a fixed event field");
            }
        }

        Self {
            action: action.to_string(),
            object_type: object_type.to_string(),
            object_id,
            timestamp: Utc::now().timestamp_millis() as f64 / 1000.0,
            screen_resolution: screen.to_string(),
            properties,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Event, ObjectId, Properties, Screen};
    use chrono::Utc;
    use serde_json::json;

    fn props(value: serde_json::Value) -> Properties {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn serializes_wire_field_names_with_flattened_properties() {
        let event = Event::new(
            "view",
            "dashboard",
            ObjectId::from(42),
            Screen::new(1440, 900),
            Some(props(json!({ "embed": true, "referer": "https://example.com" }))),
        );

        let value = serde_json::to_value(&event).expect("event should serialize");
        assert_eq!(value["action"], "view");
        assert_eq!(value["object_type"], "dashboard");
        assert_eq!(value["object_id"], 42);
        assert_eq!(value["screen_resolution"], "1440x900");
        assert_eq!(value["embed"], true);
        assert_eq!(value["referer"], "https://example.com");
        assert!(value["timestamp"].is_f64());
        assert!(value.get("properties").is_none());
    }

    #[test]
    fn fixed_fields_win_over_properties() {
        let event = Event::new(
            "click",
            "button",
            ObjectId::from("save"),
            Screen::new(800, 600),
            Some(props(json!({
                "action": "overridden",
                "objectType": "other",
                "timestamp": 1,
                "screen_resolution": "1x1",
                "member_id": 9
            }))),
        );

        assert_eq!(event.action, "click");
        assert_eq!(event.object_type, "button");
        assert_eq!(event.screen_resolution, "800x600");
        assert_eq!(event.properties, props(json!({ "member_id": 9 })));

        let value = serde_json::to_value(&event).expect("event should serialize");
        assert_eq!(value["action"], "click");
        assert_ne!(value["timestamp"], 1);
    }

    #[test]
    fn object_ids_keep_their_json_type() {
        assert_eq!(serde_json::to_value(ObjectId::from(7)).unwrap(), json!(7));
        assert_eq!(
            serde_json::to_value(ObjectId::from("applications")).unwrap(),
            json!("applications")
        );
        let parsed: ObjectId = serde_json::from_value(json!("12")).unwrap();
        assert_eq!(parsed, ObjectId::Str("12".to_string()));
    }

    #[test]
    fn null_and_fractional_object_ids_are_kept_verbatim() {
        let batch = json!([
            { "action": "view", "object_type": "page", "object_id": null,
              "timestamp": 1.5, "screen_resolution": "0x0" },
            { "action": "view", "object_type": "page", "object_id": 1.5,
              "timestamp": 1.5, "screen_resolution": "0x0", "tab": "logs" }
        ]);

        let events: Vec<Event> = serde_json::from_value(batch.clone()).unwrap();
        assert_eq!(events[0].object_id, ObjectId::Other(json!(null)));
        assert_eq!(events[1].object_id, ObjectId::Other(json!(1.5)));
        assert_eq!(events[0].object_id.to_string(), "null");
        assert_eq!(events[1].properties, props(json!({ "tab": "logs" })));
        assert_eq!(serde_json::to_value(&events).unwrap(), batch);
    }

    #[test]
    fn timestamp_is_seconds_since_epoch() {
        let before = Utc::now().timestamp() as f64;
        let event = Event::new("view", "query", ObjectId::from(1), Screen::default(), None);
        let after = Utc::now().timestamp() as f64 + 1.0;
        assert!(event.timestamp >= before && event.timestamp <= after);
        assert_eq!(event.screen_resolution, "0x0");
    }

    #[test]
    fn round_trips_through_json() {
        let event = Event::new(
            "list",
            "application",
            ObjectId::from("applications"),
            Screen::new(1, 2),
            Some(props(json!({ "public": false }))),
        );
        let text = serde_json::to_string(&event).unwrap();
        let parsed: Event = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, event);
    }
}
