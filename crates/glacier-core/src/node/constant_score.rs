use crate::{
    codec::{
        json::{BodyReader, ParseError},
        wire::{WireError, WireReader, WireWriter},
    },
    compile::{CompileContext, CompileError, NativeQuery, NativeQueryKind, compile},
    node::{QueryKind, QueryNode, QueryVariant},
    validate::ValidationReport,
};
use serde_json::{Map, Value as JsonValue};

const FILTER: &str = "filter";

///
/// ConstantScoreQuery
///
/// Wraps a filter so every match scores the node boost.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ConstantScoreQuery {
    pub filter: Box<QueryNode>,
}

impl ConstantScoreQuery {
    #[must_use]
    pub fn new(filter: impl Into<QueryNode>) -> Self {
        Self {
            filter: Box::new(filter.into()),
        }
    }
}

impl QueryVariant for ConstantScoreQuery {
    const KIND: QueryKind = QueryKind::ConstantScore;

    fn write_wire(&self, out: &mut WireWriter) {
        crate::codec::write_node(out, &self.filter);
    }

    fn read_wire(input: &mut WireReader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            filter: Box::new(crate::codec::read_node(input)?),
        })
    }

    fn write_json(&self, body: &mut Map<String, JsonValue>) {
        body.insert(FILTER.to_string(), crate::codec::to_json(&self.filter));
    }

    fn read_json(body: &mut BodyReader) -> Result<Self, ParseError> {
        Ok(Self {
            filter: Box::new(body.required_node(FILTER)?),
        })
    }

    fn validate(&self, report: &mut ValidationReport) {
        report.child(FILTER, &self.filter);
    }

    fn compile(&self, ctx: &mut CompileContext<'_>) -> Result<NativeQuery, CompileError> {
        let inner = compile(&self.filter, ctx)?;

        Ok(NativeQuery::new(NativeQueryKind::ConstantScore {
            inner: Box::new(inner),
        }))
    }
}
