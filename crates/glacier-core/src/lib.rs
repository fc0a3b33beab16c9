//! Core query layer for Glacier: query nodes, their declarative and wire
//! codecs, the node registry, schema snapshots, and compilation into native
//! engine queries.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod codec;
pub mod compile;
pub mod error;
pub mod node;
pub mod obs;
pub mod registry;
pub mod schema;
pub mod validate;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

pub use error::Error;

///
/// Prelude
///
/// Prelude contains only domain vocabulary: node builders, the schema
/// surface, and compilation entry points.
///

pub mod prelude {
    pub use crate::{
        compile::{CompileContext, NativeQuery, TypeScope, compile},
        node::{
            BoolQuery, ConstantScoreQuery, ExistsQuery, IdsQuery, MatchAllQuery, MatchNoneQuery,
            PrefixQuery, QueryKind, QueryNode, RangeQuery, TermQuery, TermsQuery, TypeQuery,
            WrapperQuery,
        },
        schema::{FieldType, SchemaSnapshot, TypeMapping},
        value::{Boost, FieldValue},
    };
}
