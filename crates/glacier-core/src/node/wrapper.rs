use crate::{
    codec::{
        from_json_str,
        json::{BodyReader, ParseError},
        wire::{WireError, WireReader, WireWriter},
    },
    compile::{CompileContext, CompileError, NativeQuery, compile},
    node::{QueryKind, QueryVariant},
    validate::{ValidationReport, ValidationRule},
};
use serde_json::{Map, Value as JsonValue};

const SOURCE: &str = "source";

///
/// WrapperQuery
///
/// Carries a query as embedded declarative text. The source is opaque until
/// compile time, when it is decoded and compiled in the same context.
/// Carries neither boost nor name.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct WrapperQuery {
    pub source: String,
}

impl WrapperQuery {
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl QueryVariant for WrapperQuery {
    const KIND: QueryKind = QueryKind::Wrapper;

    fn write_wire(&self, out: &mut WireWriter) {
        out.write_string(&self.source);
    }

    fn read_wire(input: &mut WireReader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            source: input.read_string()?,
        })
    }

    fn write_json(&self, body: &mut Map<String, JsonValue>) {
        body.insert(SOURCE.to_string(), JsonValue::String(self.source.clone()));
    }

    fn read_json(body: &mut BodyReader) -> Result<Self, ParseError> {
        Ok(Self {
            source: body.required_string(SOURCE)?,
        })
    }

    fn validate(&self, report: &mut ValidationReport) {
        if self.source.is_empty() {
            report.violation(SOURCE, ValidationRule::WrapperSourceEmpty, "source must not be empty");
        }
    }

    fn compile(&self, ctx: &mut CompileContext<'_>) -> Result<NativeQuery, CompileError> {
        let inner = from_json_str(&self.source).map_err(CompileError::WrappedQuery)?;

        compile(&inner, ctx)
    }
}
