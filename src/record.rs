// Record decoder: each archive entry is a single gzip stream wrapping one
// JSON object. Required keys are checked later, in `translate`.

use std::io::Read;

use flate2::read::GzDecoder;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to decompress recipe: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("failed to parse recipe JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("recipe JSON is a {0}, expected an object")]
    NotAnObject(&'static str),
}

/// A decoded but unvalidated Paprika recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeRecord(Map<String, Value>);

impl RecipeRecord {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for RecipeRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

pub fn decode_entry(bytes: &[u8]) -> Result<RecipeRecord, DecodeError> {
    let mut json = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut json)
        .map_err(DecodeError::Decompress)?;

    match serde_json::from_slice::<Value>(&json).map_err(DecodeError::Parse)? {
        Value::Object(map) => Ok(RecipeRecord(map)),
        other => Err(DecodeError::NotAnObject(json_kind(&other))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
