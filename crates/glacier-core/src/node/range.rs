use crate::{
    codec::{
        json::{BodyReader, ParseError, field_value_to_json},
        wire::{WireError, WireReader, WireWriter},
    },
    compile::{CompileContext, CompileError, NativeQuery, NativeQueryKind, coerce},
    node::{QueryKind, QueryVariant},
    validate::{ValidationReport, ValidationRule},
    value::FieldValue,
};
use serde_json::{Map, Value as JsonValue};

const FIELD: &str = "field";
const FROM: &str = "from";
const TO: &str = "to";
const INCLUDE_LOWER: &str = "include_lower";
const INCLUDE_UPPER: &str = "include_upper";
const FORMAT: &str = "format";

///
/// RangeQuery
///
/// Bounded match on one field. A missing bound is open; the include flags
/// choose between inclusive and exclusive bounds.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct RangeQuery {
    pub field: String,
    pub from: Option<FieldValue>,
    pub to: Option<FieldValue>,
    pub include_lower: bool,
    pub include_upper: bool,
    pub format: Option<String>,
}

impl RangeQuery {
    #[must_use]
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            from: None,
            to: None,
            include_lower: true,
            include_upper: true,
            format: None,
        }
    }

    #[must_use]
    pub fn gt(mut self, value: impl Into<FieldValue>) -> Self {
        self.from = Some(value.into());
        self.include_lower = false;
        self
    }

    #[must_use]
    pub fn gte(mut self, value: impl Into<FieldValue>) -> Self {
        self.from = Some(value.into());
        self.include_lower = true;
        self
    }

    #[must_use]
    pub fn lt(mut self, value: impl Into<FieldValue>) -> Self {
        self.to = Some(value.into());
        self.include_upper = false;
        self
    }

    #[must_use]
    pub fn lte(mut self, value: impl Into<FieldValue>) -> Self {
        self.to = Some(value.into());
        self.include_upper = true;
        self
    }

    #[must_use]
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    // { "<field>": { "gt"|"gte"|"lt"|"lte"|"from"|"to"|..: .. } }
    fn read_short_form(body: &BodyReader, field: String, raw: JsonValue) -> Result<Self, ParseError> {
        let mut inner = body.nested(&field, raw)?;
        let mut query = Self::new(field);

        query.from = inner.optional_value(FROM)?;
        query.to = inner.optional_value(TO)?;
        query.include_lower = inner.bool_or(INCLUDE_LOWER, true)?;
        query.include_upper = inner.bool_or(INCLUDE_UPPER, true)?;

        if let Some(value) = inner.optional_value("gt")? {
            query = query.gt(value);
        }
        if let Some(value) = inner.optional_value("gte")? {
            query = query.gte(value);
        }
        if let Some(value) = inner.optional_value("lt")? {
            query = query.lt(value);
        }
        if let Some(value) = inner.optional_value("lte")? {
            query = query.lte(value);
        }
        query.format = inner.optional_string(FORMAT)?;
        inner.finish()?;

        Ok(query)
    }
}

impl QueryVariant for RangeQuery {
    const KIND: QueryKind = QueryKind::Range;

    fn write_wire(&self, out: &mut WireWriter) {
        out.write_string(&self.field);
        out.write_optional_field_value(self.from.as_ref());
        out.write_optional_field_value(self.to.as_ref());
        out.write_bool(self.include_lower);
        out.write_bool(self.include_upper);
        out.write_optional_string(self.format.as_deref());
    }

    fn read_wire(input: &mut WireReader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            field: input.read_string()?,
            from: input.read_optional_field_value()?,
            to: input.read_optional_field_value()?,
            include_lower: input.read_bool()?,
            include_upper: input.read_bool()?,
            format: input.read_optional_string()?,
        })
    }

    fn write_json(&self, body: &mut Map<String, JsonValue>) {
        body.insert(FIELD.to_string(), JsonValue::String(self.field.clone()));
        if let Some(from) = &self.from {
            body.insert(FROM.to_string(), field_value_to_json(from));
        }
        if let Some(to) = &self.to {
            body.insert(TO.to_string(), field_value_to_json(to));
        }
        body.insert(INCLUDE_LOWER.to_string(), JsonValue::Bool(self.include_lower));
        body.insert(INCLUDE_UPPER.to_string(), JsonValue::Bool(self.include_upper));
        if let Some(format) = &self.format {
            body.insert(FORMAT.to_string(), JsonValue::String(format.clone()));
        }
    }

    fn read_json(body: &mut BodyReader) -> Result<Self, ParseError> {
        // a `"field"` key always selects the long form, so a document field
        // literally named `field` is only addressable there
        if !body.contains(FIELD) {
            let (field, raw) =
                body.take_single_remaining()
                    .ok_or_else(|| ParseError::MissingField {
                        path: body.field_path(FIELD),
                    })?;

            return Self::read_short_form(body, field, raw);
        }

        Ok(Self {
            field: body.required_string(FIELD)?,
            from: body.optional_value(FROM)?,
            to: body.optional_value(TO)?,
            include_lower: body.bool_or(INCLUDE_LOWER, true)?,
            include_upper: body.bool_or(INCLUDE_UPPER, true)?,
            format: body.optional_string(FORMAT)?,
        })
    }

    fn validate(&self, report: &mut ValidationReport) {
        if self.field.is_empty() {
            report.violation(FIELD, ValidationRule::FieldNameEmpty, "field name must not be empty");
        }
        if self.format.as_deref().is_some_and(str::is_empty) {
            report.violation(
                FORMAT,
                ValidationRule::RangeFormatEmpty,
                "format must not be empty when present",
            );
        }

        let bound = if self.from.as_ref().is_some_and(|v| !v.is_finite()) { FROM } else { TO };
        report.finite_values(bound, self.from.iter().chain(&self.to));
    }

    fn compile(&self, ctx: &mut CompileContext<'_>) -> Result<NativeQuery, CompileError> {
        let mapping = ctx.resolve_field(&self.field)?;
        let format = self.format.as_deref();

        let lower = coerce::bound_for(
            &self.field,
            mapping,
            self.from.as_ref(),
            self.include_lower,
            format,
        )?;
        let upper = coerce::bound_for(
            &self.field,
            mapping,
            self.to.as_ref(),
            self.include_upper,
            format,
        )?;

        Ok(NativeQuery::new(NativeQueryKind::Range {
            field: self.field.clone(),
            lower,
            upper,
        }))
    }
}
