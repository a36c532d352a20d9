use crate::response::attribution::Attribution;
use serde_json::{Map, Value};

/// Which kind of request a response answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseKind {
    Session,
    #[default]
    Attribution,
}

/// Parsed server response shared by both envelope variants.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseData {
    pub status_code: Option<u16>,
    /// Parsed body; `None` when the body was missing or not a JSON object.
    pub json: Option<Map<String, Value>>,
    pub message: Option<String>,
    pub timestamp: Option<String>,
    pub adid: Option<String>,
    /// Filled in by the classifier once the response is final.
    pub attribution: Option<Attribution>,
}

impl ResponseData {
    pub fn from_json(json: Map<String, Value>) -> Self {
        let message = string_field(&json, "message");
        let timestamp = string_field(&json, "timestamp");
        let adid = string_field(&json, "adid");
        Self {
            status_code: None,
            json: Some(json),
            message,
            timestamp,
            adid,
            attribution: None,
        }
    }

    /// Builds response data from a raw HTTP body. Unparsable bodies are logged
    /// and produce data without JSON.
    pub fn from_body(status_code: u16, body: &str) -> Self {
        let mut data = match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(json)) => Self::from_json(json),
            Ok(other) => {
                tracing::warn!(
                    status = status_code,
                    body_type = json_type(&other),
                    "attribution response body is not a JSON object"
                );
                Self::default()
            }
            Err(err) => {
                tracing::warn!(
                    status = status_code,
                    error = %err,
                    "failed to parse attribution response body"
                );
                Self::default()
            }
        };
        data.status_code = Some(status_code);
        data
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status_code, Some(code) if (200..300).contains(&code))
    }
}

/// Response delivered by the transport, tagged by the request that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEnvelope {
    Session(ResponseData),
    Attribution(ResponseData),
}

impl ResponseEnvelope {
    pub fn new(kind: ResponseKind, data: ResponseData) -> Self {
        match kind {
            ResponseKind::Session => Self::Session(data),
            ResponseKind::Attribution => Self::Attribution(data),
        }
    }

    pub fn kind(&self) -> ResponseKind {
        match self {
            Self::Session(_) => ResponseKind::Session,
            Self::Attribution(_) => ResponseKind::Attribution,
        }
    }

    pub fn data(&self) -> &ResponseData {
        match self {
            Self::Session(data) | Self::Attribution(data) => data,
        }
    }

    pub fn data_mut(&mut self) -> &mut ResponseData {
        match self {
            Self::Session(data) | Self::Attribution(data) => data,
        }
    }
}

fn string_field(json: &Map<String, Value>, key: &str) -> Option<String> {
    json.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
