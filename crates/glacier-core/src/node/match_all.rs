use crate::{
    codec::{
        json::{BodyReader, ParseError},
        wire::{WireError, WireReader, WireWriter},
    },
    compile::{CompileContext, CompileError, NativeQuery},
    node::{QueryKind, QueryVariant},
    validate::ValidationReport,
};
use serde_json::{Map, Value as JsonValue};

///
/// MatchAllQuery
///
/// Matches every document in scope.
///

#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct MatchAllQuery;

impl MatchAllQuery {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl QueryVariant for MatchAllQuery {
    const KIND: QueryKind = QueryKind::MatchAll;

    fn write_wire(&self, _out: &mut WireWriter) {}

    fn read_wire(_input: &mut WireReader<'_>) -> Result<Self, WireError> {
        Ok(Self)
    }

    fn write_json(&self, _body: &mut Map<String, JsonValue>) {}

    fn read_json(_body: &mut BodyReader) -> Result<Self, ParseError> {
        Ok(Self)
    }

    fn validate(&self, _report: &mut ValidationReport) {}

    fn compile(&self, _ctx: &mut CompileContext<'_>) -> Result<NativeQuery, CompileError> {
        Ok(NativeQuery::match_all())
    }
}

///
/// MatchNoneQuery
///
/// Matches nothing. Carries neither boost nor name.
///

#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct MatchNoneQuery;

impl MatchNoneQuery {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl QueryVariant for MatchNoneQuery {
    const KIND: QueryKind = QueryKind::MatchNone;

    fn write_wire(&self, _out: &mut WireWriter) {}

    fn read_wire(_input: &mut WireReader<'_>) -> Result<Self, WireError> {
        Ok(Self)
    }

    fn write_json(&self, _body: &mut Map<String, JsonValue>) {}

    fn read_json(_body: &mut BodyReader) -> Result<Self, ParseError> {
        Ok(Self)
    }

    fn validate(&self, _report: &mut ValidationReport) {}

    fn compile(&self, _ctx: &mut CompileContext<'_>) -> Result<NativeQuery, CompileError> {
        Ok(NativeQuery::match_none())
    }
}
