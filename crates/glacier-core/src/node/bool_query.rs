use crate::{
    codec::{
        json::{BodyReader, ParseError},
        wire::{WireError, WireReader, WireWriter},
    },
    compile::{CompileContext, CompileError, NativeClause, NativeQuery, NativeQueryKind, compile},
    node::{
        QueryKind, QueryNode, QueryVariant, node_list_to_json, read_node_list, write_node_list,
    },
    validate::{ValidationReport, ValidationRule},
};
use serde_json::{Map, Value as JsonValue};

const MUST: &str = "must";
const MUST_NOT: &str = "must_not";
const SHOULD: &str = "should";
const FILTER: &str = "filter";
const MINIMUM_SHOULD_MATCH: &str = "minimum_should_match";
const DISABLE_COORD: &str = "disable_coord";

///
/// BoolQuery
///
/// Boolean combination of child queries. A bool with no clauses at all
/// matches everything.
///

#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct BoolQuery {
    pub must: Vec<QueryNode>,
    pub must_not: Vec<QueryNode>,
    pub should: Vec<QueryNode>,
    pub filter: Vec<QueryNode>,
    pub minimum_should_match: Option<String>,
    pub disable_coord: bool,
}

impl BoolQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn must(mut self, node: impl Into<QueryNode>) -> Self {
        self.must.push(node.into());
        self
    }

    #[must_use]
    pub fn must_not(mut self, node: impl Into<QueryNode>) -> Self {
        self.must_not.push(node.into());
        self
    }

    #[must_use]
    pub fn should(mut self, node: impl Into<QueryNode>) -> Self {
        self.should.push(node.into());
        self
    }

    #[must_use]
    pub fn filter(mut self, node: impl Into<QueryNode>) -> Self {
        self.filter.push(node.into());
        self
    }

    #[must_use]
    pub fn minimum_should_match(mut self, spec: impl Into<String>) -> Self {
        self.minimum_should_match = Some(spec.into());
        self
    }

    #[must_use]
    pub const fn disable_coord(mut self, disable: bool) -> Self {
        self.disable_coord = disable;
        self
    }

    #[must_use]
    pub fn has_clauses(&self) -> bool {
        !(self.must.is_empty()
            && self.must_not.is_empty()
            && self.should.is_empty()
            && self.filter.is_empty())
    }

    fn clause_lists(&self) -> [(&'static str, &[QueryNode]); 4] {
        [
            (MUST, self.must.as_slice()),
            (MUST_NOT, self.must_not.as_slice()),
            (SHOULD, self.should.as_slice()),
            (FILTER, self.filter.as_slice()),
        ]
    }
}

impl QueryVariant for BoolQuery {
    const KIND: QueryKind = QueryKind::Bool;

    fn write_wire(&self, out: &mut WireWriter) {
        for (_, nodes) in self.clause_lists() {
            write_node_list(out, nodes);
        }
        out.write_optional_string(self.minimum_should_match.as_deref());
        out.write_bool(self.disable_coord);
    }

    fn read_wire(input: &mut WireReader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            must: read_node_list(input)?,
            must_not: read_node_list(input)?,
            should: read_node_list(input)?,
            filter: read_node_list(input)?,
            minimum_should_match: input.read_optional_string()?,
            disable_coord: input.read_bool()?,
        })
    }

    fn write_json(&self, body: &mut Map<String, JsonValue>) {
        for (key, nodes) in self.clause_lists() {
            if !nodes.is_empty() {
                body.insert(key.to_string(), node_list_to_json(nodes));
            }
        }
        if let Some(spec) = &self.minimum_should_match {
            body.insert(MINIMUM_SHOULD_MATCH.to_string(), JsonValue::String(spec.clone()));
        }
        if self.disable_coord {
            body.insert(DISABLE_COORD.to_string(), JsonValue::Bool(true));
        }
    }

    fn read_json(body: &mut BodyReader) -> Result<Self, ParseError> {
        // a bare integer is accepted for minimum_should_match
        let minimum_should_match = match body.take(MINIMUM_SHOULD_MATCH) {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::String(spec)) => Some(spec),
            Some(JsonValue::Number(n)) if n.is_i64() => Some(n.to_string()),
            Some(_) => {
                return Err(ParseError::InvalidType {
                    path: body.field_path(MINIMUM_SHOULD_MATCH),
                    expected: "an integer or percentage string",
                });
            }
        };

        Ok(Self {
            must: body.node_list(MUST)?,
            must_not: body.node_list(MUST_NOT)?,
            should: body.node_list(SHOULD)?,
            filter: body.node_list(FILTER)?,
            minimum_should_match,
            disable_coord: body.bool_or(DISABLE_COORD, false)?,
        })
    }

    fn validate(&self, report: &mut ValidationReport) {
        for (key, nodes) in self.clause_lists() {
            for (i, node) in nodes.iter().enumerate() {
                report.child(format!("{key}[{i}]"), node);
            }
        }

        if let Some(spec) = &self.minimum_should_match
            && MinimumShouldMatch::parse(spec).is_none()
        {
            report.violation(
                MINIMUM_SHOULD_MATCH,
                ValidationRule::MinimumShouldMatchInvalid,
                format!("'{spec}' is neither an integer nor a percentage"),
            );
        }
    }

    fn compile(&self, ctx: &mut CompileContext<'_>) -> Result<NativeQuery, CompileError> {
        if !self.has_clauses() {
            return Ok(NativeQuery::match_all());
        }

        let mut clauses = Vec::with_capacity(
            self.must.len() + self.filter.len() + self.should.len() + self.must_not.len(),
        );
        for node in &self.must {
            clauses.push(NativeClause::must(compile(node, ctx)?));
        }
        for node in &self.filter {
            clauses.push(NativeClause::filter(compile(node, ctx)?));
        }
        for node in &self.should {
            clauses.push(NativeClause::should(compile(node, ctx)?));
        }
        for node in &self.must_not {
            clauses.push(NativeClause::must_not(compile(node, ctx)?));
        }

        let minimum_should_match = match &self.minimum_should_match {
            None => None,
            Some(spec) => {
                let parsed =
                    MinimumShouldMatch::parse(spec).ok_or_else(|| CompileError::InvalidValue {
                        field: MINIMUM_SHOULD_MATCH.to_string(),
                        value: spec.clone(),
                        reason: "expected an integer or percentage".to_string(),
                    })?;
                Some(parsed.resolve(self.should.len()))
            }
        };

        Ok(NativeQuery::new(NativeQueryKind::Boolean {
            clauses,
            minimum_should_match,
            disable_coord: self.disable_coord,
        }))
    }
}

///
/// MinimumShouldMatch
///
/// Parsed `minimum_should_match` spec. Negative values count back from the
/// number of optional clauses.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MinimumShouldMatch {
    Count(i64),
    Percent(i64),
}

impl MinimumShouldMatch {
    #[must_use]
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        match spec.strip_suffix('%') {
            Some(percent) => percent.trim().parse().ok().map(Self::Percent),
            None => spec.parse().ok().map(Self::Count),
        }
    }

    /// Number of optional clauses that must match, clamped to `0..=optional`.
    #[must_use]
    pub fn resolve(self, optional: usize) -> u32 {
        let optional = i64::try_from(optional).unwrap_or(i64::MAX);
        let required = match self {
            Self::Count(n) if n < 0 => optional.saturating_add(n),
            Self::Count(n) => n,
            Self::Percent(p) if p < 0 => {
                optional.saturating_sub(optional.saturating_mul(p.saturating_neg()) / 100)
            }
            Self::Percent(p) => optional.saturating_mul(p) / 100,
        };

        u32::try_from(required.clamp(0, optional)).unwrap_or(u32::MAX)
    }
}

///
/// TESTS
///
