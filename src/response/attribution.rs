use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Attribution resolved by the server for this install.
///
/// Every field is optional and read leniently: numbers and booleans are kept
/// in their textual form, while nested values are dropped for that field only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attribution {
    #[serde(deserialize_with = "lenient_string")]
    pub tracker_token: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub tracker_name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub network: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub campaign: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub adgroup: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub creative: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub click_label: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub adid: Option<String>,
}

impl Attribution {
    /// Reads the `attribution` object of a server response field by field.
    pub fn from_json(object: &Map<String, Value>) -> Self {
        Self {
            tracker_token: string_field(object, "tracker_token"),
            tracker_name: string_field(object, "tracker_name"),
            network: string_field(object, "network"),
            campaign: string_field(object, "campaign"),
            adgroup: string_field(object, "adgroup"),
            creative: string_field(object, "creative"),
            click_label: string_field(object, "click_label"),
            adid: string_field(object, "adid"),
        }
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    let value = object.get(key)?;
    let text = scalar_text(value);
    if text.is_none() && !value.is_null() {
        tracing::warn!(field = key, "ignoring non-scalar attribution field");
    }
    text
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(scalar_text))
}
