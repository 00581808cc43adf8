//! Attribute and event types sent to the Track API
//!
//! Customer attributes and event data are open mappings from a name to a
//! loosely typed value. Dates are carried as [`chrono::DateTime<Utc>`] and are
//! only turned into Unix seconds when a payload is serialized, so callers can
//! keep working with real timestamps until the request leaves the process.
//!
//! | Value | Sent as |
//! |-------|---------|
//! | [`AttributeValue::Date`] | integer seconds since the Unix epoch |
//! | [`AttributeValue::Json`] | the nested value, untouched |
//! | everything else | the matching JSON scalar |

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Convert a timestamp to whole seconds since the Unix epoch.
///
/// Sub-second precision is dropped.
pub fn unix_seconds(at: &DateTime<Utc>) -> i64 {
    at.timestamp()
}

// ============================================
// AttributeValue
// ============================================

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    /// A point in time, sent as Unix seconds
    Date(DateTime<Utc>),
    /// Nested structure, sent verbatim (dates inside are not converted)
    Json(serde_json::Value),
}

impl AttributeValue {
    /// Whether the value counts as "present" for required-field checks.
    ///
    /// `null`, `false`, `0` and `""` are falsy, as are their nested JSON forms.
    pub fn is_truthy(&self) -> bool {
        match self {
            AttributeValue::Null => false,
            AttributeValue::Bool(b) => *b,
            AttributeValue::Number(n) => number_truthy(n),
            AttributeValue::String(s) => !s.is_empty(),
            AttributeValue::Date(_) => true,
            AttributeValue::Json(v) => json_truthy(v),
        }
    }

    /// The value as it goes over the wire, with dates normalized.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AttributeValue::Null => serde_json::Value::Null,
            AttributeValue::Bool(b) => serde_json::Value::Bool(*b),
            AttributeValue::Number(n) => serde_json::Value::Number(n.clone()),
            AttributeValue::String(s) => serde_json::Value::String(s.clone()),
            AttributeValue::Date(at) => serde_json::Value::from(unix_seconds(at)),
            AttributeValue::Json(v) => v.clone(),
        }
    }

    /// Render the value for use in a URL path (e.g. a customer id).
    pub fn to_path_segment(&self) -> String {
        match self {
            AttributeValue::String(s) => s.clone(),
            other => other.to_json().to_string(),
        }
    }
}

fn number_truthy(n: &serde_json::Number) -> bool {
    n.as_f64().map_or(true, |f| f != 0.0)
}

fn json_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => number_truthy(n),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AttributeValue::Null => serializer.serialize_unit(),
            AttributeValue::Bool(b) => serializer.serialize_bool(*b),
            AttributeValue::Number(n) => n.serialize(serializer),
            AttributeValue::String(s) => serializer.serialize_str(s),
            AttributeValue::Date(at) => serializer.serialize_i64(unix_seconds(at)),
            AttributeValue::Json(v) => v.serialize(serializer),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for AttributeValue {
                fn from(n: $t) -> Self {
                    AttributeValue::Number(serde_json::Number::from(n))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<f64> for AttributeValue {
    /// Non-finite floats have no JSON form and become `Null`.
    fn from(f: f64) -> Self {
        serde_json::Number::from_f64(f)
            .map(AttributeValue::Number)
            .unwrap_or(AttributeValue::Null)
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(at: DateTime<Utc>) -> Self {
        AttributeValue::Date(at)
    }
}

impl From<serde_json::Value> for AttributeValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => AttributeValue::Null,
            serde_json::Value::Bool(b) => AttributeValue::Bool(b),
            serde_json::Value::Number(n) => AttributeValue::Number(n),
            serde_json::Value::String(s) => AttributeValue::String(s),
            nested => AttributeValue::Json(nested),
        }
    }
}

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(AttributeValue::Null, Into::into)
    }
}

// ============================================
// Attributes
// ============================================

/// Open mapping of attribute names to values.
///
/// Serializing an `Attributes` yields a JSON object with every top-level date
/// replaced by its Unix-seconds value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, AttributeValue>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value, returning the previous one for that key.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Option<AttributeValue> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.0.iter()
    }

    /// Whether `key` holds a truthy value.
    pub fn has_value(&self, key: &str) -> bool {
        self.get(key).is_some_and(AttributeValue::is_truthy)
    }

    /// The mapping as a JSON object with dates normalized to Unix seconds.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.0
                .iter()
                .map(|(key, value)| (key.clone(), value.to_json()))
                .collect(),
        )
    }
}

impl<K, V> FromIterator<(K, V)> for Attributes
where
    K: Into<String>,
    V: Into<AttributeValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl IntoIterator for Attributes {
    type Item = (String, AttributeValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, AttributeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// ============================================
// Event
// ============================================

/// Body of `POST /v1/customers/{id}/events`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// Event name, e.g. "purchased"
    pub name: String,
    /// Event properties
    pub data: Attributes,
    /// Optional event kind ("page" for page views)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
}

impl Event {
    pub fn new(name: impl Into<String>, data: Attributes) -> Self {
        Self {
            name: name.into(),
            data,
            event_type: None,
        }
    }

    pub fn with_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_unix_seconds_truncates_subsecond() {
        let at = Utc.timestamp_opt(1_700_000_000, 999_000_000).unwrap();
        assert_eq!(unix_seconds(&at), 1_700_000_000);
    }

    #[test]
    fn test_truthiness() {
        assert!(!AttributeValue::Null.is_truthy());
        assert!(!AttributeValue::from(false).is_truthy());
        assert!(!AttributeValue::from(0).is_truthy());
        assert!(!AttributeValue::from(0.0).is_truthy());
        assert!(!AttributeValue::from(f64::NAN).is_truthy());
        assert!(!AttributeValue::from("").is_truthy());
        assert!(!AttributeValue::Json(serde_json::Value::Null).is_truthy());

        assert!(AttributeValue::from("a@b.com").is_truthy());
        assert!(AttributeValue::from(42).is_truthy());
        assert!(AttributeValue::from(true).is_truthy());
        assert!(AttributeValue::from(Utc::now()).is_truthy());
        assert!(AttributeValue::from(serde_json::json!([])).is_truthy());
    }

    #[test]
    fn test_from_json_maps_scalars() {
        assert_eq!(
            AttributeValue::from(serde_json::json!("x")),
            AttributeValue::String("x".to_string())
        );
        assert_eq!(
            AttributeValue::from(serde_json::json!(null)),
            AttributeValue::Null
        );
        assert!(matches!(
            AttributeValue::from(serde_json::json!({"a": 1})),
            AttributeValue::Json(_)
        ));
    }

    #[test]
    fn test_attributes_serialize_dates_as_unix_seconds() {
        let signed_up = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let attrs = Attributes::new()
            .with("id", "123")
            .with("plan", serde_json::json!({"tier": "pro"}))
            .with("created_at", signed_up)
            .with("active", true);

        let json = serde_json::to_value(&attrs).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "123",
                "plan": {"tier": "pro"},
                "created_at": 1_704_067_200,
                "active": true,
            })
        );
        assert_eq!(attrs.to_json(), json);
    }

    #[test]
    fn test_path_segment_rendering() {
        assert_eq!(AttributeValue::from("abc").to_path_segment(), "abc");
        assert_eq!(AttributeValue::from(42).to_path_segment(), "42");
    }

    #[test]
    fn test_event_serialization_omits_missing_type() {
        let event = Event::new("purchased", Attributes::new().with("item", "shoe"));
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            serde_json::json!({"name": "purchased", "data": {"item": "shoe"}})
        );

        let page = event.with_type("page");
        assert_eq!(
            serde_json::to_value(&page).unwrap(),
            serde_json::json!({"name": "purchased", "data": {"item": "shoe"}, "type": "page"})
        );
    }

    #[test]
    fn test_attributes_from_iterator() {
        let attrs: Attributes = vec![("id", "1"), ("email", "a@b.com")].into_iter().collect();
        assert_eq!(attrs.len(), 2);
        assert!(attrs.has_value("email"));
        assert!(!attrs.has_value("name"));
    }
}
