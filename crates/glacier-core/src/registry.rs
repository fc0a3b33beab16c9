use crate::{
    codec::{
        json::{BodyReader, ParseError},
        wire::{WireError, WireReader},
    },
    node::{
        BoolQuery, ConstantScoreQuery, ExistsQuery, IdsQuery, MatchAllQuery, MatchNoneQuery,
        PrefixQuery, QueryKind, QueryNode, QueryVariant, RangeQuery, TermQuery, TermsQuery,
        TypeQuery, WrapperQuery, decode_json, decode_wire,
    },
};
use std::{collections::BTreeMap, sync::LazyLock};
use thiserror::Error as ThisError;

///
/// Node Registry
///
/// Maps each type id to the decoders for its variant. The process-wide
/// registry is built once on first use and never mutated afterwards, so
/// concurrent readers need no locking.
///

pub type WireDecodeFn = fn(&mut WireReader<'_>) -> Result<QueryNode, WireError>;
pub type DeclarativeDecodeFn = fn(BodyReader) -> Result<QueryNode, ParseError>;

///
/// RegistryError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum RegistryError {
    #[error("type id '{type_id}' is already registered")]
    AlreadyRegistered { type_id: String },
}

///
/// NodeDecoders
///

#[derive(Clone, Copy, Debug)]
pub struct NodeDecoders {
    pub wire: WireDecodeFn,
    pub declarative: DeclarativeDecodeFn,
}

impl NodeDecoders {
    pub(crate) fn of<V: QueryVariant>() -> Self {
        Self {
            wire: decode_wire::<V>,
            declarative: decode_json::<V>,
        }
    }
}

///
/// NodeRegistry
///

#[derive(Debug)]
pub struct NodeRegistry {
    entries: BTreeMap<String, NodeDecoders>,
}

impl NodeRegistry {
    #[must_use]
    pub fn builder() -> NodeRegistryBuilder {
        NodeRegistryBuilder {
            entries: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn lookup(&self, type_id: &str) -> Option<&NodeDecoders> {
        self.entries.get(type_id)
    }

    #[must_use]
    pub fn contains(&self, type_id: &str) -> bool {
        self.entries.contains_key(type_id)
    }

    /// Registered type ids, sorted.
    pub fn type_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

///
/// NodeRegistryBuilder
///

#[derive(Debug)]
pub struct NodeRegistryBuilder {
    entries: BTreeMap<String, NodeDecoders>,
}

impl NodeRegistryBuilder {
    pub fn register(
        mut self,
        type_id: impl Into<String>,
        decoders: NodeDecoders,
    ) -> Result<Self, RegistryError> {
        let type_id = type_id.into();
        if self.entries.contains_key(&type_id) {
            return Err(RegistryError::AlreadyRegistered { type_id });
        }
        self.entries.insert(type_id, decoders);

        Ok(self)
    }

    #[must_use]
    pub fn build(self) -> NodeRegistry {
        NodeRegistry {
            entries: self.entries,
        }
    }
}

fn builtin_entries() -> [(QueryKind, NodeDecoders); 12] {
    [
        (MatchAllQuery::KIND, NodeDecoders::of::<MatchAllQuery>()),
        (MatchNoneQuery::KIND, NodeDecoders::of::<MatchNoneQuery>()),
        (TermQuery::KIND, NodeDecoders::of::<TermQuery>()),
        (TermsQuery::KIND, NodeDecoders::of::<TermsQuery>()),
        (RangeQuery::KIND, NodeDecoders::of::<RangeQuery>()),
        (PrefixQuery::KIND, NodeDecoders::of::<PrefixQuery>()),
        (ExistsQuery::KIND, NodeDecoders::of::<ExistsQuery>()),
        (IdsQuery::KIND, NodeDecoders::of::<IdsQuery>()),
        (TypeQuery::KIND, NodeDecoders::of::<TypeQuery>()),
        (BoolQuery::KIND, NodeDecoders::of::<BoolQuery>()),
        (ConstantScoreQuery::KIND, NodeDecoders::of::<ConstantScoreQuery>()),
        (WrapperQuery::KIND, NodeDecoders::of::<WrapperQuery>()),
    ]
}

/// Builder pre-loaded with every built-in variant, for callers assembling
/// a registry of their own.
pub fn builtin_registry() -> Result<NodeRegistryBuilder, RegistryError> {
    builtin_entries()
        .into_iter()
        .try_fold(NodeRegistry::builder(), |builder, (kind, decoders)| {
            builder.register(kind.type_id(), decoders)
        })
}

static NODE_REGISTRY: LazyLock<NodeRegistry> = LazyLock::new(|| NodeRegistry {
    entries: builtin_entries()
        .into_iter()
        .map(|(kind, decoders)| (kind.type_id().to_string(), decoders))
        .collect(),
});

/// The process-wide registry.
#[must_use]
pub fn node_registry() -> &'static NodeRegistry {
    &NODE_REGISTRY
}

/// Every type id the process-wide registry knows, matching `QueryKind::ALL`.
#[must_use]
pub fn registered_kinds() -> Vec<QueryKind> {
    node_registry()
        .type_ids()
        .filter_map(QueryKind::from_type_id)
        .collect()
}

///
/// TESTS
///
