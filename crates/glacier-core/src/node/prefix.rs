use crate::{
    codec::{
        json::{BodyReader, ParseError},
        wire::{WireError, WireReader, WireWriter},
    },
    compile::{CompileContext, CompileError, NativeQuery, NativeQueryKind, coerce},
    node::{QueryKind, QueryVariant},
    validate::{ValidationReport, ValidationRule},
};
use serde_json::{Map, Value as JsonValue};

const FIELD: &str = "field";
const VALUE: &str = "value";
const REWRITE: &str = "rewrite";

///
/// PrefixQuery
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct PrefixQuery {
    pub field: String,
    pub value: String,
    pub rewrite: Option<String>,
}

impl PrefixQuery {
    #[must_use]
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            rewrite: None,
        }
    }

    #[must_use]
    pub fn rewrite(mut self, rewrite: impl Into<String>) -> Self {
        self.rewrite = Some(rewrite.into());
        self
    }
}

impl QueryVariant for PrefixQuery {
    const KIND: QueryKind = QueryKind::Prefix;

    fn write_wire(&self, out: &mut WireWriter) {
        out.write_string(&self.field);
        out.write_string(&self.value);
        out.write_optional_string(self.rewrite.as_deref());
    }

    fn read_wire(input: &mut WireReader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            field: input.read_string()?,
            value: input.read_string()?,
            rewrite: input.read_optional_string()?,
        })
    }

    fn write_json(&self, body: &mut Map<String, JsonValue>) {
        body.insert(FIELD.to_string(), JsonValue::String(self.field.clone()));
        body.insert(VALUE.to_string(), JsonValue::String(self.value.clone()));
        if let Some(rewrite) = &self.rewrite {
            body.insert(REWRITE.to_string(), JsonValue::String(rewrite.clone()));
        }
    }

    fn read_json(body: &mut BodyReader) -> Result<Self, ParseError> {
        if body.contains(FIELD) {
            return Ok(Self {
                field: body.required_string(FIELD)?,
                value: body.required_string(VALUE)?,
                rewrite: body.optional_string(REWRITE)?,
            });
        }

        // a `"field"` key always selects the long form, so a document field
        // literally named `field` is only addressable there
        let (field, raw) = body.take_single_remaining().ok_or_else(|| ParseError::MissingField {
            path: body.field_path(FIELD),
        })?;

        match raw {
            // { "<field>": "<prefix>" }
            JsonValue::String(value) => Ok(Self::new(field, value)),

            // { "<field>": { "value": "<prefix>", "rewrite"?: .. } }
            raw => {
                let mut inner = body.nested(&field, raw)?;
                let value = inner.required_string(VALUE)?;
                let rewrite = inner.optional_string(REWRITE)?;
                inner.finish()?;

                Ok(Self {
                    field,
                    value,
                    rewrite,
                })
            }
        }
    }

    fn validate(&self, report: &mut ValidationReport) {
        if self.field.is_empty() {
            report.violation(FIELD, ValidationRule::FieldNameEmpty, "field name must not be empty");
        }
        if self.value.is_empty() {
            report.violation(VALUE, ValidationRule::PrefixValueEmpty, "prefix must not be empty");
        }
    }

    fn compile(&self, ctx: &mut CompileContext<'_>) -> Result<NativeQuery, CompileError> {
        let mapping = ctx.resolve_field(&self.field)?;
        coerce::require_text(&self.field, mapping)?;

        Ok(NativeQuery::new(NativeQueryKind::Prefix {
            field: self.field.clone(),
            prefix: self.value.clone(),
            rewrite: self.rewrite.clone(),
        }))
    }
}
