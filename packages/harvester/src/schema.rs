//! Structural validation of decoded upstream documents.
//!
//! A document either matches its schema completely or is rejected with every
//! mismatch listed; callers never see a partially validated tree. Only the
//! declared keys survive validation, so the result deserializes straight into
//! the typed upstream documents.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{HarvesterError, Result};
use crate::types::{StationListDocument, WeeklyScheduleDocument};

/// How an array position treats a lone object.
///
/// XML cannot tell a one-element sequence from a single child, so a decoded
/// tree holds an object where upstream sent exactly one repeated element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArrayShape {
    /// Only an array matches; a lone object fails validation.
    #[default]
    Strict,
    /// A lone object is accepted as a one-element array.
    AcceptSingle,
}

/// Expected shape of a decoded tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    String,
    Number,
    /// A sequence of elements; see [`ArrayShape`] for lone objects.
    Array(Box<Schema>),
    /// Required keys; other keys are ignored and dropped.
    Object(Vec<(&'static str, Schema)>),
}

impl Schema {
    fn array(element: Schema) -> Self {
        Self::Array(Box::new(element))
    }

    fn strings(keys: &[&'static str]) -> Self {
        Self::Object(keys.iter().map(|k| (*k, Self::String)).collect())
    }

    fn expected(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }
}

/// Schema name used in errors for the station directory.
pub const STATION_DIRECTORY: &str = "station directory";

/// Schema name used in errors for the weekly schedule.
pub const WEEKLY_SCHEDULE: &str = "weekly schedule";

/// `{ stations: { station: [ {id, name} ] } }`
pub fn station_directory_schema() -> Schema {
    Schema::Object(vec![(
        "stations",
        Schema::Object(vec![(
            "station",
            Schema::array(Schema::strings(&["id", "name"])),
        )]),
    )])
}

/// `{ radiko: { stations: { station: { id, name, progs: [ { date, prog: [..] } ] } } } }`
pub fn weekly_schedule_schema() -> Schema {
    let prog = Schema::strings(&[
        "id", "ft", "to", "dur", "title", "url", "desc", "info", "pfm", "img",
    ]);
    let progs = Schema::Object(vec![
        ("date", Schema::Number),
        ("prog", Schema::array(prog)),
    ]);
    let station = Schema::Object(vec![
        ("id", Schema::String),
        ("name", Schema::String),
        ("progs", Schema::array(progs)),
    ]);
    Schema::Object(vec![(
        "radiko",
        Schema::Object(vec![(
            "stations",
            Schema::Object(vec![("station", station)]),
        )]),
    )])
}

/// Validate a tree against a schema.
///
/// Returns the normalized tree (declared keys only, plus lone objects wrapped
/// in arrays under [`ArrayShape::AcceptSingle`]) or a `Validation` error
/// listing every mismatch with its path.
pub fn validate(
    tree: &Value,
    schema: &Schema,
    schema_name: &'static str,
    shape: ArrayShape,
) -> Result<Value> {
    let mut errors = Vec::new();
    let normalized = check(tree, schema, shape, "", &mut errors);

    if errors.is_empty() {
        Ok(normalized)
    } else {
        Err(HarvesterError::Validation {
            schema: schema_name,
            errors,
        })
    }
}

/// Validate a decoded station directory.
pub fn validate_station_directory(
    tree: &Value,
    shape: ArrayShape,
) -> Result<StationListDocument> {
    validate_into(tree, &station_directory_schema(), STATION_DIRECTORY, shape)
}

/// Validate a decoded weekly schedule.
pub fn validate_weekly_schedule(
    tree: &Value,
    shape: ArrayShape,
) -> Result<WeeklyScheduleDocument> {
    validate_into(tree, &weekly_schedule_schema(), WEEKLY_SCHEDULE, shape)
}

fn validate_into<T: DeserializeOwned>(
    tree: &Value,
    schema: &Schema,
    schema_name: &'static str,
    shape: ArrayShape,
) -> Result<T> {
    let normalized = validate(tree, schema, schema_name, shape)?;
    serde_json::from_value(normalized).map_err(|e| HarvesterError::Validation {
        schema: schema_name,
        errors: vec![e.to_string()],
    })
}

fn check(
    value: &Value,
    schema: &Schema,
    shape: ArrayShape,
    path: &str,
    errors: &mut Vec<String>,
) -> Value {
    match (schema, value) {
        (Schema::String, Value::String(_)) | (Schema::Number, Value::Number(_)) => value.clone(),
        (Schema::Array(element), Value::Array(items)) => Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| check(item, element, shape, &format!("{path}/{i}"), errors))
                .collect(),
        ),
        (Schema::Array(element), Value::Object(_)) if shape == ArrayShape::AcceptSingle => {
            Value::Array(vec![check(value, element, shape, path, errors)])
        }
        (Schema::Object(fields), Value::Object(map)) => {
            let mut normalized = Map::new();
            for (key, field_schema) in fields {
                let field_path = format!("{path}/{key}");
                match map.get(*key) {
                    Some(field) => {
                        normalized.insert(
                            (*key).to_string(),
                            check(field, field_schema, shape, &field_path, errors),
                        );
                    }
                    None => errors.push(format!("{field_path}: missing key")),
                }
            }
            Value::Object(normalized)
        }
        _ => {
            errors.push(format!(
                "{}: expected {}, found {}",
                display_path(path),
                schema.expected(),
                kind_of(value)
            ));
            Value::Null
        }
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
