use crate::{
    codec::{
        json::{BodyReader, ParseError},
        wire::{WireError, WireReader, WireWriter},
    },
    compile::{CompileContext, CompileError, NativeQuery, NativeQueryKind, NativeTerm},
    node::{QueryKind, QueryVariant},
    validate::{ValidationReport, ValidationRule},
};
use serde_json::{Map, Value as JsonValue};

const VALUE: &str = "value";

/// Native field holding the mapping type of a document.
pub const TYPE_FIELD: &str = "_type";

///
/// TypeQuery
///
/// Restricts matches to documents of one mapping type.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct TypeQuery {
    pub value: String,
}

impl TypeQuery {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl QueryVariant for TypeQuery {
    const KIND: QueryKind = QueryKind::Type;

    fn write_wire(&self, out: &mut WireWriter) {
        out.write_string(&self.value);
    }

    fn read_wire(input: &mut WireReader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            value: input.read_string()?,
        })
    }

    fn write_json(&self, body: &mut Map<String, JsonValue>) {
        body.insert(VALUE.to_string(), JsonValue::String(self.value.clone()));
    }

    fn read_json(body: &mut BodyReader) -> Result<Self, ParseError> {
        Ok(Self {
            value: body.required_string(VALUE)?,
        })
    }

    fn validate(&self, report: &mut ValidationReport) {
        if self.value.is_empty() {
            report.violation(VALUE, ValidationRule::TypeNameEmpty, "type name must not be empty");
        }
    }

    fn compile(&self, _ctx: &mut CompileContext<'_>) -> Result<NativeQuery, CompileError> {
        Ok(NativeQuery::new(NativeQueryKind::Term {
            field: TYPE_FIELD.to_string(),
            term: NativeTerm::Text(self.value.clone()),
        }))
    }
}
