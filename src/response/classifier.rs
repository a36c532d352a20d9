//! Decides whether a response defers the attribution answer (`ask_in`) or
//! carries the final one.

use crate::response::attribution::Attribution;
use crate::response::envelope::ResponseData;
use serde_json::{Map, Value};
use std::time::Duration;

const ASK_IN_FIELD: &str = "ask_in";
const ATTRIBUTION_FIELD: &str = "attribution";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// No parsed body; nothing to classify.
    MissingBody,
    /// The server wants to be asked again after the given delay.
    AskIn(Duration),
    /// Final answer; the payload slot now holds the attribution, if any.
    Final,
}

/// Classifies `data`, filling its attribution slot when the answer is final.
pub fn classify(data: &mut ResponseData) -> Classification {
    let Some(json) = data.json.as_ref() else {
        return Classification::MissingBody;
    };

    let ask_in = read_long(json, ASK_IN_FIELD).unwrap_or(-1);
    if ask_in >= 0 {
        return Classification::AskIn(Duration::from_millis(ask_in as u64));
    }

    data.attribution = json
        .get(ATTRIBUTION_FIELD)
        .and_then(Value::as_object)
        .map(Attribution::from_json);
    Classification::Final
}

/// Reads an integer leniently: numbers are truncated, numeric strings parsed.
fn read_long(json: &Map<String, Value>, key: &str) -> Option<i64> {
    match json.get(key)? {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|value| value as i64)),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}
