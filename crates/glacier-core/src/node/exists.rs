use crate::{
    codec::{
        json::{BodyReader, ParseError},
        wire::{WireError, WireReader, WireWriter},
    },
    compile::{CompileContext, CompileError, NativeClause, NativeQuery, NativeQueryKind},
    node::{QueryKind, QueryVariant},
    schema::FieldType,
    validate::{ValidationReport, ValidationRule},
};
use serde_json::{Map, Value as JsonValue};

const FIELD: &str = "field";

///
/// ExistsQuery
///
/// Matches documents with any value for the field. An object field matches
/// when any of its leaf sub-fields has a value.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ExistsQuery {
    pub field: String,
}

impl ExistsQuery {
    #[must_use]
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl QueryVariant for ExistsQuery {
    const KIND: QueryKind = QueryKind::Exists;

    fn write_wire(&self, out: &mut WireWriter) {
        out.write_string(&self.field);
    }

    fn read_wire(input: &mut WireReader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            field: input.read_string()?,
        })
    }

    fn write_json(&self, body: &mut Map<String, JsonValue>) {
        body.insert(FIELD.to_string(), JsonValue::String(self.field.clone()));
    }

    fn read_json(body: &mut BodyReader) -> Result<Self, ParseError> {
        Ok(Self {
            field: body.required_string(FIELD)?,
        })
    }

    fn validate(&self, report: &mut ValidationReport) {
        if self.field.is_empty() {
            report.violation(FIELD, ValidationRule::FieldNameEmpty, "field name must not be empty");
        }
    }

    fn compile(&self, ctx: &mut CompileContext<'_>) -> Result<NativeQuery, CompileError> {
        let Some(mapping) = ctx.resolve_field(&self.field)? else {
            // unmapped and allowed: no document can hold a value for it
            return Ok(NativeQuery::match_none());
        };

        if mapping.field_type != FieldType::Object {
            return Ok(NativeQuery::new(NativeQueryKind::FieldExists {
                field: self.field.clone(),
            }));
        }

        let leaves = ctx.leaf_paths_under(&self.field);
        if leaves.is_empty() {
            return Ok(NativeQuery::match_none());
        }

        let clauses = leaves
            .into_iter()
            .map(|field| NativeClause::should(NativeQuery::new(NativeQueryKind::FieldExists { field })))
            .collect();

        Ok(NativeQuery::new(NativeQueryKind::Boolean {
            clauses,
            minimum_should_match: Some(1),
            disable_coord: true,
        }))
    }
}
