//! Extraction and classification schema structures.
//!
//! The extraction endpoints shape their output with an OpenAI-style
//! `response_format` document:
//!
//! ```json
//! {
//!   "type": "json_schema",
//!   "json_schema": {
//!     "name": "invoice",
//!     "schema": {
//!       "type": "object",
//!       "properties": { "invoice_number": { "type": "string" } }
//!     }
//!   }
//! }
//! ```
//!
//! [`ExtractionSchema`] is the typed in-memory form of that document, with
//! order-preserving properties so generated request bodies list fields the
//! way the caller declared them. [`validate_schema_shape`] checks a raw JSON
//! candidate against the wire structure, one distinct error message per
//! violated rule, and [`parse_schema_json`] combines JSON parsing with shape
//! validation and typed conversion.

use indexmap::IndexMap;
use serde_json::{Map, Value, json};

use crate::error::{Result, UpstageError};

pub mod templates;

/// One field in an extraction schema: a type tag plus an optional
/// human-readable description that steers the model.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub kind: FieldKind,
    pub description: Option<String>,
}

impl FieldSpec {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            description: None,
        }
    }

    pub fn with_description(kind: FieldKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: Some(description.into()),
        }
    }

    fn to_value(&self) -> Value {
        let mut map = Map::new();
        match &self.kind {
            FieldKind::String => {
                map.insert("type".to_string(), json!("string"));
            }
            FieldKind::Number => {
                map.insert("type".to_string(), json!("number"));
            }
            FieldKind::Boolean => {
                map.insert("type".to_string(), json!("boolean"));
            }
            FieldKind::Null => {
                map.insert("type".to_string(), json!("null"));
            }
            FieldKind::Array(items) => {
                map.insert("type".to_string(), json!("array"));
                map.insert("items".to_string(), items.to_value());
            }
            FieldKind::Object(properties) => {
                map.insert("type".to_string(), json!("object"));
                map.insert("properties".to_string(), properties_to_value(properties));
            }
        }
        if let Some(description) = &self.description {
            map.insert("description".to_string(), json!(description));
        }
        Value::Object(map)
    }

    fn from_value(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| UpstageError::schema("field specification must be a JSON object"))?;
        let kind_tag = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| UpstageError::schema("field specification is missing a 'type' tag"))?;

        let kind = match kind_tag {
            "string" => FieldKind::String,
            "number" | "integer" => FieldKind::Number,
            "boolean" => FieldKind::Boolean,
            "null" => FieldKind::Null,
            "array" => {
                let items = obj
                    .get("items")
                    .ok_or_else(|| UpstageError::schema("array field is missing 'items'"))?;
                FieldKind::Array(Box::new(FieldSpec::from_value(items)?))
            }
            "object" => {
                let properties = obj
                    .get("properties")
                    .and_then(Value::as_object)
                    .ok_or_else(|| UpstageError::schema("object field is missing 'properties'"))?;
                FieldKind::Object(properties_from_map(properties)?)
            }
            other => {
                return Err(UpstageError::schema(format!("unknown field type '{}'", other)));
            }
        };

        Ok(Self {
            kind,
            description: obj
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

/// Type tag for a schema field. Every leaf carries exactly one tag.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Null,
    Array(Box<FieldSpec>),
    Object(IndexMap<String, FieldSpec>),
}

/// A named extraction schema. The root shape is always an object.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionSchema {
    pub name: String,
    pub properties: IndexMap<String, FieldSpec>,
}

impl ExtractionSchema {
    pub fn new(name: impl Into<String>, properties: IndexMap<String, FieldSpec>) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }

    /// Render the schema as the wire `response_format` document.
    pub fn to_response_format(&self) -> Value {
        json!({
            "type": "json_schema",
            "json_schema": {
                "name": self.name,
                "schema": {
                    "type": "object",
                    "properties": properties_to_value(&self.properties),
                }
            }
        })
    }

    /// Parse a wire `response_format` document back into a typed schema.
    ///
    /// The candidate must already satisfy [`validate_schema_shape`]; this
    /// performs the typed conversion of each property.
    pub fn from_response_format(value: &Value) -> Result<Self> {
        validate_schema_shape(value)?;
        let json_schema = &value["json_schema"];
        let name = json_schema["name"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        let properties = json_schema["schema"]["properties"]
            .as_object()
            .map(properties_from_map)
            .transpose()?
            .unwrap_or_default();
        Ok(Self { name, properties })
    }
}

fn properties_to_value(properties: &IndexMap<String, FieldSpec>) -> Value {
    let mut map = Map::new();
    for (name, spec) in properties {
        map.insert(name.clone(), spec.to_value());
    }
    Value::Object(map)
}

fn properties_from_map(map: &Map<String, Value>) -> Result<IndexMap<String, FieldSpec>> {
    let mut properties = IndexMap::with_capacity(map.len());
    for (name, value) in map {
        properties.insert(name.clone(), FieldSpec::from_value(value)?);
    }
    Ok(properties)
}

/// Validate that a JSON value has the wire `response_format` structure.
///
/// Rules, each with its own error message:
/// 1. the top-level `type` discriminator must be `"json_schema"`,
/// 2. `json_schema.name` must be a non-empty string,
/// 3. `json_schema.schema.type` must be `"object"`,
/// 4. `json_schema.schema.properties` must be a non-empty object.
pub fn validate_schema_shape(candidate: &Value) -> Result<()> {
    if candidate.get("type").and_then(Value::as_str) != Some("json_schema") {
        return Err(UpstageError::schema(
            "schema is missing the top-level \"type\": \"json_schema\" discriminator",
        ));
    }

    let json_schema = candidate
        .get("json_schema")
        .and_then(Value::as_object)
        .ok_or_else(|| UpstageError::schema("schema is missing the 'json_schema' object"))?;

    let name_ok = json_schema
        .get("name")
        .and_then(Value::as_str)
        .is_some_and(|name| !name.is_empty());
    if !name_ok {
        return Err(UpstageError::schema(
            "schema is missing a non-empty 'json_schema.name'",
        ));
    }

    let schema = json_schema
        .get("schema")
        .and_then(Value::as_object)
        .ok_or_else(|| UpstageError::schema("schema is missing the 'json_schema.schema' object"))?;

    if schema.get("type").and_then(Value::as_str) != Some("object") {
        return Err(UpstageError::schema(
            "'json_schema.schema.type' must be \"object\"",
        ));
    }

    let has_properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .is_some_and(|properties| !properties.is_empty());
    if !has_properties {
        return Err(UpstageError::schema(
            "'json_schema.schema.properties' must be a non-empty object",
        ));
    }

    Ok(())
}

/// Parse schema text supplied by a caller.
///
/// Syntax errors surface the JSON parser's message; structural problems
/// propagate from [`validate_schema_shape`] unchanged.
pub fn parse_schema_json(text: &str) -> Result<ExtractionSchema> {
    let value: Value = serde_json::from_str(text)
        .map_err(|err| UpstageError::schema(format!("malformed JSON: {}", err)))?;
    ExtractionSchema::from_response_format(&value)
}

/// One classification category: the label value plus a description that
/// tells the model when to pick it.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub value: String,
    pub description: String,
}

impl Category {
    pub fn new(value: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            description: description.into(),
        }
    }
}

/// A named, ordered set of mutually exclusive classification categories.
///
/// Conventionally the last category is an `others` fallback so the model has
/// somewhere to put documents that match nothing else; this is documented
/// practice, not enforced.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationSchema {
    pub name: String,
    pub categories: Vec<Category>,
}

impl ClassificationSchema {
    pub fn new(name: impl Into<String>, categories: Vec<Category>) -> Self {
        Self {
            name: name.into(),
            categories,
        }
    }

    /// Render the categories as a `response_format` document with a single
    /// enumerated `category` property.
    pub fn to_response_format(&self) -> Value {
        let one_of: Vec<Value> = self
            .categories
            .iter()
            .map(|category| {
                json!({
                    "const": category.value,
                    "description": category.description,
                })
            })
            .collect();

        json!({
            "type": "json_schema",
            "json_schema": {
                "name": self.name,
                "schema": {
                    "type": "object",
                    "properties": {
                        "category": {
                            "type": "string",
                            "oneOf": one_of,
                        }
                    },
                    "required": ["category"],
                }
            }
        })
    }
}
