use crate::{
    codec::wire::MAX_NESTING_DEPTH,
    node::QueryNode,
    registry::node_registry,
    value::{Boost, FieldValue, Float64},
};
use serde_json::{Map, Number, Value as JsonValue};
use thiserror::Error as ThisError;

/// Reserved declarative key for the node boost.
pub const BOOST_KEY: &str = "boost";

/// Reserved declarative key for the node name.
pub const NAME_KEY: &str = "_name";

///
/// ParseError
///
/// Malformed declarative input. Every variant carries the dotted path of the
/// offending key so callers can report it without re-walking the document.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ParseError {
    #[error("malformed declarative text: {message}")]
    Malformed { message: String },

    #[error("[{path}] expected an object")]
    NotAnObject { path: String },

    #[error("[{path}] expected exactly one query key, found {found}")]
    ExpectedSingleKey { path: String, found: usize },

    #[error("[{path}] unknown query type '{type_id}'")]
    UnknownQuery { path: String, type_id: String },

    #[error("[{path}] missing required field")]
    MissingField { path: String },

    #[error("[{path}] unexpected field")]
    UnexpectedField { path: String },

    #[error("[{path}] expected {expected}")]
    InvalidType {
        path: String,
        expected: &'static str,
    },

    #[error("[{path}] query nesting exceeds {max} levels")]
    NestingTooDeep { path: String, max: usize },
}

impl ParseError {
    /// Dotted location of the failure.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Malformed { .. } => "",
            Self::NotAnObject { path }
            | Self::ExpectedSingleKey { path, .. }
            | Self::UnknownQuery { path, .. }
            | Self::MissingField { path }
            | Self::UnexpectedField { path }
            | Self::InvalidType { path, .. }
            | Self::NestingTooDeep { path, .. } => path,
        }
    }

    fn invalid(path: String, expected: &'static str) -> Self {
        Self::InvalidType { path, expected }
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

/// Decode one node at `path`, dispatching on its single top-level key.
pub(crate) fn parse_node(
    value: &JsonValue,
    path: &str,
    depth: usize,
) -> Result<QueryNode, ParseError> {
    if depth >= MAX_NESTING_DEPTH {
        return Err(ParseError::NestingTooDeep {
            path: path.to_string(),
            max: MAX_NESTING_DEPTH,
        });
    }

    let JsonValue::Object(outer) = value else {
        return Err(ParseError::NotAnObject {
            path: path.to_string(),
        });
    };

    let mut entries = outer.iter();
    let (Some((type_id, body)), None) = (entries.next(), entries.next()) else {
        return Err(ParseError::ExpectedSingleKey {
            path: path.to_string(),
            found: outer.len(),
        });
    };

    let body_path = join(path, type_id);
    let decoders = node_registry()
        .lookup(type_id)
        .ok_or_else(|| ParseError::UnknownQuery {
            path: path.to_string(),
            type_id: type_id.clone(),
        })?;

    let JsonValue::Object(fields) = body else {
        return Err(ParseError::NotAnObject { path: body_path });
    };

    (decoders.declarative)(BodyReader {
        path: body_path,
        depth: depth + 1,
        fields: fields.clone(),
    })
}

///
/// BodyReader
///
/// Consuming view over one variant body. Fields are taken out as they are
/// read so `finish` can reject anything the variant did not recognise.
///

#[derive(Debug)]
pub struct BodyReader {
    path: String,
    depth: usize,
    fields: Map<String, JsonValue>,
}

impl BodyReader {
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn field_path(&self, key: &str) -> String {
        join(&self.path, key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn take(&mut self, key: &str) -> Option<JsonValue> {
        self.fields.remove(key)
    }

    /// Remove the single remaining key, if exactly one is left.
    pub fn take_single_remaining(&mut self) -> Option<(String, JsonValue)> {
        if self.fields.len() != 1 {
            return None;
        }
        let key = self.fields.keys().next()?.clone();
        let value = self.fields.remove(&key)?;

        Some((key, value))
    }

    /// Reader over an object-valued field, at the same nesting depth.
    pub fn nested(&self, key: &str, value: JsonValue) -> Result<Self, ParseError> {
        match value {
            JsonValue::Object(fields) => Ok(Self {
                path: self.field_path(key),
                depth: self.depth,
                fields,
            }),
            _ => Err(ParseError::invalid(self.field_path(key), "an object")),
        }
    }

    pub fn required_string(&mut self, key: &str) -> Result<String, ParseError> {
        self.optional_string(key)?
            .ok_or_else(|| ParseError::MissingField {
                path: self.field_path(key),
            })
    }

    pub fn optional_string(&mut self, key: &str) -> Result<Option<String>, ParseError> {
        match self.take(key) {
            None | Some(JsonValue::Null) => Ok(None),
            Some(JsonValue::String(s)) => Ok(Some(s)),
            Some(_) => Err(ParseError::invalid(self.field_path(key), "a string")),
        }
    }

    pub fn bool_or(&mut self, key: &str, default: bool) -> Result<bool, ParseError> {
        match self.take(key) {
            None | Some(JsonValue::Null) => Ok(default),
            Some(JsonValue::Bool(b)) => Ok(b),
            Some(_) => Err(ParseError::invalid(self.field_path(key), "a boolean")),
        }
    }

    pub fn required_value(&mut self, key: &str) -> Result<FieldValue, ParseError> {
        self.optional_value(key)?
            .ok_or_else(|| ParseError::MissingField {
                path: self.field_path(key),
            })
    }

    pub fn optional_value(&mut self, key: &str) -> Result<Option<FieldValue>, ParseError> {
        match self.take(key) {
            None | Some(JsonValue::Null) => Ok(None),
            Some(value) => field_value_from_json(&value, &self.field_path(key)).map(Some),
        }
    }

    /// String list; a bare string is accepted as a one-element list.
    pub fn string_list_or_empty(&mut self, key: &str) -> Result<Vec<String>, ParseError> {
        let path = self.field_path(key);
        match self.take(key) {
            None | Some(JsonValue::Null) => Ok(Vec::new()),
            Some(JsonValue::String(s)) => Ok(vec![s]),
            Some(JsonValue::Array(items)) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| match item {
                    JsonValue::String(s) => Ok(s),
                    _ => Err(ParseError::invalid(format!("{path}[{i}]"), "a string")),
                })
                .collect(),
            Some(_) => Err(ParseError::invalid(path, "a string or array of strings")),
        }
    }

    pub fn value_list(&mut self, key: &str) -> Result<Vec<FieldValue>, ParseError> {
        let path = self.field_path(key);
        match self.take(key) {
            None => Err(ParseError::MissingField { path }),
            Some(value) => field_value_list_from_json(&value, &path),
        }
    }

    pub fn required_node(&mut self, key: &str) -> Result<QueryNode, ParseError> {
        let path = self.field_path(key);
        match self.take(key) {
            None | Some(JsonValue::Null) => Err(ParseError::MissingField { path }),
            Some(value) => parse_node(&value, &path, self.depth),
        }
    }

    /// Node list; a single object is accepted as a one-element list.
    pub fn node_list(&mut self, key: &str) -> Result<Vec<QueryNode>, ParseError> {
        let path = self.field_path(key);
        match self.take(key) {
            None | Some(JsonValue::Null) => Ok(Vec::new()),
            Some(value @ JsonValue::Object(_)) => Ok(vec![parse_node(&value, &path, self.depth)?]),
            Some(JsonValue::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| parse_node(item, &format!("{path}[{i}]"), self.depth))
                .collect(),
            Some(_) => Err(ParseError::invalid(path, "a query object or array")),
        }
    }

    pub(crate) fn take_boost(&mut self) -> Result<Boost, ParseError> {
        match self.take(BOOST_KEY) {
            None | Some(JsonValue::Null) => Ok(Boost::DEFAULT),
            Some(JsonValue::Number(n)) => n
                .as_f64()
                .map(|v| Boost::from_raw(number_to_f32(v)))
                .ok_or_else(|| ParseError::invalid(self.field_path(BOOST_KEY), "a number")),
            Some(_) => Err(ParseError::invalid(self.field_path(BOOST_KEY), "a number")),
        }
    }

    pub(crate) fn take_name(&mut self) -> Result<Option<String>, ParseError> {
        self.optional_string(NAME_KEY)
    }

    /// Reject any field the variant did not consume.
    pub fn finish(self) -> Result<(), ParseError> {
        match self.fields.keys().next() {
            None => Ok(()),
            Some(key) => Err(ParseError::UnexpectedField {
                path: join(&self.path, key),
            }),
        }
    }
}

#[expect(clippy::cast_possible_truncation)]
const fn number_to_f32(value: f64) -> f32 {
    value as f32
}

/// Decode one scalar literal.
pub(crate) fn field_value_from_json(value: &JsonValue, path: &str) -> Result<FieldValue, ParseError> {
    match value {
        JsonValue::String(s) => Ok(FieldValue::Text(s.clone())),
        JsonValue::Bool(b) => Ok(FieldValue::Bool(*b)),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(FieldValue::Int(i))
            } else if n.is_u64() {
                Err(ParseError::invalid(path.to_string(), "a signed 64-bit integer"))
            } else {
                n.as_f64()
                    .map(|f| FieldValue::Double(Float64::new(f)))
                    .ok_or_else(|| ParseError::invalid(path.to_string(), "a number"))
            }
        }
        _ => Err(ParseError::invalid(
            path.to_string(),
            "a string, number, or boolean",
        )),
    }
}

pub(crate) fn field_value_list_from_json(
    value: &JsonValue,
    path: &str,
) -> Result<Vec<FieldValue>, ParseError> {
    let JsonValue::Array(items) = value else {
        return Err(ParseError::invalid(path.to_string(), "an array"));
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| field_value_from_json(item, &format!("{path}[{i}]")))
        .collect()
}

/// Encode one scalar literal. Non-finite doubles have no JSON number form
/// and are written as `null`.
#[must_use]
pub fn field_value_to_json(value: &FieldValue) -> JsonValue {
    match value {
        FieldValue::Text(s) => JsonValue::String(s.clone()),
        FieldValue::Int(i) => JsonValue::Number((*i).into()),
        FieldValue::Double(d) => Number::from_f64(d.get()).map_or(JsonValue::Null, JsonValue::Number),
        FieldValue::Bool(b) => JsonValue::Bool(*b),
    }
}

#[must_use]
pub fn boost_to_json(boost: Boost) -> JsonValue {
    Number::from_f64(f64::from(boost.get())).map_or(JsonValue::Null, JsonValue::Number)
}

#[must_use]
pub fn string_list_to_json(values: &[String]) -> JsonValue {
    JsonValue::Array(values.iter().cloned().map(JsonValue::String).collect())
}
