mod bool_query;
mod constant_score;
mod exists;
mod ids;
mod match_all;
mod prefix;
mod range;
mod term;
mod type_query;
mod wrapper;

#[cfg(test)]
mod tests;

pub use bool_query::{BoolQuery, MinimumShouldMatch};
pub use constant_score::ConstantScoreQuery;
pub use exists::ExistsQuery;
pub use ids::{ID_FIELD, IdsQuery, UID_FIELD};
pub use match_all::{MatchAllQuery, MatchNoneQuery};
pub use prefix::PrefixQuery;
pub use range::RangeQuery;
pub use term::{TermQuery, TermsQuery};
pub use type_query::{TYPE_FIELD, TypeQuery};
pub use wrapper::WrapperQuery;

use crate::{
    codec::{
        json::{BodyReader, ParseError},
        wire::{WireError, WireReader, WireWriter},
    },
    compile::{CompileContext, CompileError, NativeQuery},
    validate::ValidationReport,
    value::Boost,
};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

///
/// Query Nodes
///
/// Immutable value representation of one declarative query. A node is a
/// closed variant body plus the two attributes every boost-supporting
/// variant shares: `boost` and an optional `name`.
///
/// Variants that do not support boost/name ignore them: the setters are
/// no-ops, the accessors report the defaults, and neither codec carries them.
///

///
/// QueryKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum QueryKind {
    MatchAll,
    MatchNone,
    Term,
    Terms,
    Range,
    Prefix,
    Exists,
    Ids,
    Type,
    Bool,
    ConstantScore,
    Wrapper,
}

impl QueryKind {
    pub const ALL: [Self; 12] = [
        Self::MatchAll,
        Self::MatchNone,
        Self::Term,
        Self::Terms,
        Self::Range,
        Self::Prefix,
        Self::Exists,
        Self::Ids,
        Self::Type,
        Self::Bool,
        Self::ConstantScore,
        Self::Wrapper,
    ];

    /// Declarative key and wire type id.
    #[must_use]
    pub const fn type_id(self) -> &'static str {
        match self {
            Self::MatchAll => "match_all",
            Self::MatchNone => "match_none",
            Self::Term => "term",
            Self::Terms => "terms",
            Self::Range => "range",
            Self::Prefix => "prefix",
            Self::Exists => "exists",
            Self::Ids => "ids",
            Self::Type => "type",
            Self::Bool => "bool",
            Self::ConstantScore => "constant_score",
            Self::Wrapper => "wrapper",
        }
    }

    #[must_use]
    pub fn from_type_id(type_id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.type_id() == type_id)
    }

    #[must_use]
    pub const fn supports_boost_and_name(self) -> bool {
        !matches!(self, Self::MatchNone | Self::Wrapper)
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_id())
    }
}

///
/// QueryMeta
///

#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct QueryMeta {
    pub boost: Boost,
    pub name: Option<String>,
}

///
/// QueryBody
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum QueryBody {
    MatchAll(MatchAllQuery),
    MatchNone(MatchNoneQuery),
    Term(TermQuery),
    Terms(TermsQuery),
    Range(RangeQuery),
    Prefix(PrefixQuery),
    Exists(ExistsQuery),
    Ids(IdsQuery),
    Type(TypeQuery),
    Bool(BoolQuery),
    ConstantScore(ConstantScoreQuery),
    Wrapper(WrapperQuery),
}

// Forward one call to whichever variant struct the body holds.
macro_rules! dispatch {
    ($body:expr, $q:ident => $call:expr) => {
        match $body {
            QueryBody::MatchAll($q) => $call,
            QueryBody::MatchNone($q) => $call,
            QueryBody::Term($q) => $call,
            QueryBody::Terms($q) => $call,
            QueryBody::Range($q) => $call,
            QueryBody::Prefix($q) => $call,
            QueryBody::Exists($q) => $call,
            QueryBody::Ids($q) => $call,
            QueryBody::Type($q) => $call,
            QueryBody::Bool($q) => $call,
            QueryBody::ConstantScore($q) => $call,
            QueryBody::Wrapper($q) => $call,
        }
    };
}

impl QueryBody {
    #[must_use]
    pub const fn kind(&self) -> QueryKind {
        match self {
            Self::MatchAll(_) => QueryKind::MatchAll,
            Self::MatchNone(_) => QueryKind::MatchNone,
            Self::Term(_) => QueryKind::Term,
            Self::Terms(_) => QueryKind::Terms,
            Self::Range(_) => QueryKind::Range,
            Self::Prefix(_) => QueryKind::Prefix,
            Self::Exists(_) => QueryKind::Exists,
            Self::Ids(_) => QueryKind::Ids,
            Self::Type(_) => QueryKind::Type,
            Self::Bool(_) => QueryKind::Bool,
            Self::ConstantScore(_) => QueryKind::ConstantScore,
            Self::Wrapper(_) => QueryKind::Wrapper,
        }
    }
}

///
/// QueryNode
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct QueryNode {
    body: QueryBody,
    meta: QueryMeta,
}

impl QueryNode {
    #[must_use]
    pub fn new(body: impl Into<QueryBody>) -> Self {
        Self {
            body: body.into(),
            meta: QueryMeta::default(),
        }
    }

    pub(crate) fn with_meta(body: QueryBody, meta: QueryMeta) -> Self {
        let meta = if body.kind().supports_boost_and_name() {
            meta
        } else {
            QueryMeta::default()
        };

        Self { body, meta }
    }

    #[must_use]
    pub const fn body(&self) -> &QueryBody {
        &self.body
    }

    #[must_use]
    pub const fn kind(&self) -> QueryKind {
        self.body.kind()
    }

    #[must_use]
    pub const fn type_id(&self) -> &'static str {
        self.kind().type_id()
    }

    #[must_use]
    pub const fn supports_boost_and_name(&self) -> bool {
        self.kind().supports_boost_and_name()
    }

    #[must_use]
    pub const fn boost(&self) -> Boost {
        self.meta.boost
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.meta.name.as_deref()
    }

    /// Set the boost; ignored by variants without boost support.
    #[must_use]
    pub fn with_boost(mut self, boost: f32) -> Self {
        if self.supports_boost_and_name() {
            self.meta.boost = Boost::from_raw(boost);
        }
        self
    }

    /// Set the name; ignored by variants without name support.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        if self.supports_boost_and_name() {
            self.meta.name = Some(name.into());
        }
        self
    }

    #[must_use]
    pub fn without_name(mut self) -> Self {
        self.meta.name = None;
        self
    }

    /// Stable 64-bit hash of the canonical wire encoding.
    ///
    /// Agrees with `Eq`: structurally equal nodes encode to identical bytes.
    #[must_use]
    pub fn stable_hash(&self) -> u64 {
        let mut out = WireWriter::new();
        crate::codec::write_node(&mut out, self);

        xxhash_rust::xxh3::xxh3_64(out.as_bytes())
    }

    pub(crate) fn write_wire_body(&self, out: &mut WireWriter) {
        dispatch!(&self.body, q => q.write_wire(out));
    }

    pub(crate) fn write_json_body(&self, body: &mut Map<String, JsonValue>) {
        dispatch!(&self.body, q => q.write_json(body));
    }

    pub(crate) fn validate_body(&self, report: &mut ValidationReport) {
        dispatch!(&self.body, q => q.validate(report));
    }

    pub(crate) fn compile_body(
        &self,
        ctx: &mut CompileContext<'_>,
    ) -> Result<NativeQuery, CompileError> {
        dispatch!(&self.body, q => q.compile(ctx))
    }
}

macro_rules! impl_variant_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for QueryBody {
                fn from(query: $ty) -> Self {
                    Self::$variant(query)
                }
            }

            impl From<$ty> for QueryNode {
                fn from(query: $ty) -> Self {
                    Self::new(query)
                }
            }
        )*
    };
}

impl_variant_from!(
    MatchAll(MatchAllQuery),
    MatchNone(MatchNoneQuery),
    Term(TermQuery),
    Terms(TermsQuery),
    Range(RangeQuery),
    Prefix(PrefixQuery),
    Exists(ExistsQuery),
    Ids(IdsQuery),
    Type(TypeQuery),
    Bool(BoolQuery),
    ConstantScore(ConstantScoreQuery),
    Wrapper(WrapperQuery),
);

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::codec::to_json_string(self))
    }
}

///
/// QueryVariant
///
/// Per-variant codec, validation, and compilation hooks. Boost/name are
/// handled once, around these hooks, by the generic decoders below and by
/// `crate::codec` / `crate::compile`.
///

pub(crate) trait QueryVariant: Sized + Into<QueryBody> {
    const KIND: QueryKind;

    fn write_wire(&self, out: &mut WireWriter);

    fn read_wire(input: &mut WireReader<'_>) -> Result<Self, WireError>;

    fn write_json(&self, body: &mut Map<String, JsonValue>);

    fn read_json(body: &mut BodyReader) -> Result<Self, ParseError>;

    fn validate(&self, report: &mut ValidationReport);

    /// Compile the variant; the caller applies boost and named capture.
    fn compile(&self, ctx: &mut CompileContext<'_>) -> Result<NativeQuery, CompileError>;
}

/// Registered wire decoder for one variant.
pub(crate) fn decode_wire<V: QueryVariant>(
    input: &mut WireReader<'_>,
) -> Result<QueryNode, WireError> {
    let variant = V::read_wire(input)?;
    let meta = if V::KIND.supports_boost_and_name() {
        QueryMeta {
            boost: input.read_boost()?,
            name: input.read_optional_string()?,
        }
    } else {
        QueryMeta::default()
    };

    Ok(QueryNode::with_meta(variant.into(), meta))
}

/// Registered declarative decoder for one variant.
pub(crate) fn decode_json<V: QueryVariant>(mut body: BodyReader) -> Result<QueryNode, ParseError> {
    // Unsupported variants skip the reserved keys rather than rejecting them.
    let boost = body.take_boost()?;
    let name = body.take_name()?;
    let meta = QueryMeta { boost, name };

    let variant = V::read_json(&mut body)?;
    body.finish()?;

    Ok(QueryNode::with_meta(variant.into(), meta))
}

// Wire helpers for child node lists.

pub(crate) fn write_node_list(out: &mut WireWriter, nodes: &[QueryNode]) {
    out.write_len(nodes.len());
    for node in nodes {
        crate::codec::write_node(out, node);
    }
}

pub(crate) fn read_node_list(input: &mut WireReader<'_>) -> Result<Vec<QueryNode>, WireError> {
    let len = input.read_len()?;
    let mut out = Vec::with_capacity(len.min(input.remaining()));
    for _ in 0..len {
        out.push(crate::codec::read_node(input)?);
    }

    Ok(out)
}

pub(crate) fn node_list_to_json(nodes: &[QueryNode]) -> JsonValue {
    JsonValue::Array(nodes.iter().map(crate::codec::to_json).collect())
}
