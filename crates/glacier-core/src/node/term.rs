use crate::{
    codec::{
        json::{
            BodyReader, ParseError, field_value_from_json, field_value_list_from_json,
            field_value_to_json,
        },
        wire::{WireError, WireReader, WireWriter},
    },
    compile::{CompileContext, CompileError, NativeQuery, NativeQueryKind, coerce},
    node::{QueryKind, QueryVariant},
    validate::{ValidationReport, ValidationRule},
    value::FieldValue,
};
use serde_json::{Map, Value as JsonValue};

const FIELD: &str = "field";
const VALUE: &str = "value";
const VALUES: &str = "values";

///
/// TermQuery
///
/// Exact match of one literal against one field.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct TermQuery {
    pub field: String,
    pub value: FieldValue,
}

impl TermQuery {
    #[must_use]
    pub fn new(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

impl QueryVariant for TermQuery {
    const KIND: QueryKind = QueryKind::Term;

    fn write_wire(&self, out: &mut WireWriter) {
        out.write_string(&self.field);
        out.write_field_value(&self.value);
    }

    fn read_wire(input: &mut WireReader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            field: input.read_string()?,
            value: input.read_field_value()?,
        })
    }

    fn write_json(&self, body: &mut Map<String, JsonValue>) {
        body.insert(FIELD.to_string(), JsonValue::String(self.field.clone()));
        body.insert(VALUE.to_string(), field_value_to_json(&self.value));
    }

    fn read_json(body: &mut BodyReader) -> Result<Self, ParseError> {
        if body.contains(FIELD) {
            return Ok(Self {
                field: body.required_string(FIELD)?,
                value: body.required_value(VALUE)?,
            });
        }

        // short form: { "<field>": <value> }
        // a `"field"` key always selects the long form, so a document field
        // literally named `field` is only addressable there
        let (field, raw) = body.take_single_remaining().ok_or_else(|| ParseError::MissingField {
            path: body.field_path(FIELD),
        })?;
        let value = field_value_from_json(&raw, &body.field_path(&field))?;

        Ok(Self { field, value })
    }

    fn validate(&self, report: &mut ValidationReport) {
        if self.field.is_empty() {
            report.violation(FIELD, ValidationRule::FieldNameEmpty, "field name must not be empty");
        }
        report.finite_values(VALUE, [&self.value]);
    }

    fn compile(&self, ctx: &mut CompileContext<'_>) -> Result<NativeQuery, CompileError> {
        let mapping = ctx.resolve_field(&self.field)?;
        let term = coerce::term_for(&self.field, mapping, &self.value)?;

        Ok(NativeQuery::new(NativeQueryKind::Term {
            field: self.field.clone(),
            term,
        }))
    }
}

///
/// TermsQuery
///
/// Matches when the field equals any of the listed literals.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct TermsQuery {
    pub field: String,
    pub values: Vec<FieldValue>,
}

impl TermsQuery {
    #[must_use]
    pub fn new<V: Into<FieldValue>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl QueryVariant for TermsQuery {
    const KIND: QueryKind = QueryKind::Terms;

    fn write_wire(&self, out: &mut WireWriter) {
        out.write_string(&self.field);
        out.write_len(self.values.len());
        for value in &self.values {
            out.write_field_value(value);
        }
    }

    fn read_wire(input: &mut WireReader<'_>) -> Result<Self, WireError> {
        let field = input.read_string()?;
        let len = input.read_len()?;
        let mut values = Vec::with_capacity(len.min(input.remaining()));
        for _ in 0..len {
            values.push(input.read_field_value()?);
        }

        Ok(Self { field, values })
    }

    fn write_json(&self, body: &mut Map<String, JsonValue>) {
        body.insert(FIELD.to_string(), JsonValue::String(self.field.clone()));
        body.insert(
            VALUES.to_string(),
            JsonValue::Array(self.values.iter().map(field_value_to_json).collect()),
        );
    }

    fn read_json(body: &mut BodyReader) -> Result<Self, ParseError> {
        if body.contains(FIELD) {
            return Ok(Self {
                field: body.required_string(FIELD)?,
                values: body.value_list(VALUES)?,
            });
        }

        // short form: { "<field>": [<value>, ...] }
        // a `"field"` key always selects the long form, so a document field
        // literally named `field` is only addressable there
        let (field, raw) = body.take_single_remaining().ok_or_else(|| ParseError::MissingField {
            path: body.field_path(FIELD),
        })?;
        let values = field_value_list_from_json(&raw, &body.field_path(&field))?;

        Ok(Self { field, values })
    }

    fn validate(&self, report: &mut ValidationReport) {
        if self.field.is_empty() {
            report.violation(FIELD, ValidationRule::FieldNameEmpty, "field name must not be empty");
        }
        if self.values.is_empty() {
            report.violation(
                VALUES,
                ValidationRule::TermsValuesEmpty,
                "terms query needs at least one value",
            );
        }
        report.finite_values(VALUES, &self.values);
    }

    fn compile(&self, ctx: &mut CompileContext<'_>) -> Result<NativeQuery, CompileError> {
        let mapping = ctx.resolve_field(&self.field)?;
        let terms = self
            .values
            .iter()
            .map(|value| coerce::term_for(&self.field, mapping, value))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NativeQuery::new(NativeQueryKind::Terms {
            field: self.field.clone(),
            terms,
        }))
    }
}
