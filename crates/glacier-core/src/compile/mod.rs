pub mod coerce;
mod context;
mod native;


pub use context::CompileContext;
pub use native::{NativeBound, NativeClause, NativeQuery, NativeQueryKind, NativeTerm, Occur};

// scope lives with the schema it selects from
pub use crate::schema::TypeScope;

use crate::{
    codec::json::ParseError,
    node::QueryNode,
    obs::sink::{QueryEvent, record},
    schema::FieldType,
};
use thiserror::Error as ThisError;

///
/// Compilation
///
/// Turns a validated-or-not node tree into a native query. Compilation is a
/// pure function of `(node, context)`: the same inputs always produce the
/// same native query and the same named captures.
///

///
/// CompileError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CompileError {
    #[error("field '{field}' is not mapped in the active types")]
    UnmappedField { field: String },

    #[error("value '{value}' is invalid for field '{field}': {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("range bound '{value}' does not fit field '{field}' of type {field_type}")]
    RangeBoundMismatch {
        field: String,
        value: String,
        field_type: FieldType,
    },

    #[error("field '{field}' of type {field_type} cannot be queried this way")]
    NotQueryable { field: String, field_type: FieldType },

    #[error("wrapped query failed to decode: {0}")]
    WrappedQuery(ParseError),

    #[error("query nesting exceeds {max} levels")]
    NestingTooDeep { max: usize },
}

/// Compile one node.
///
/// The node boost is applied to the result for boost-supporting variants,
/// and a named node registers its result in the context, including empty
/// results such as `MatchNone`. Captures from a tree that fails anywhere
/// are dropped. Compound variants compile their children
/// through this same entry point.
pub fn compile(node: &QueryNode, ctx: &mut CompileContext<'_>) -> Result<NativeQuery, CompileError> {
    let outermost = ctx.is_outermost();
    ctx.enter()?;
    let result = node.compile_body(ctx);
    ctx.exit();

    let mut native = match result {
        Ok(native) => native,
        Err(err) => {
            tracing::debug!(kind = %node.kind(), error = %err, "compile failed");
            record(QueryEvent::CompileFailed { kind: node.kind() });
            if outermost {
                ctx.discard_captures();
            }

            return Err(err);
        }
    };

    if node.supports_boost_and_name() {
        native = native.with_boost(node.boost());
    }
    if let Some(name) = node.name() {
        ctx.capture(name, &native);
    }
    if outermost {
        ctx.commit_captures();
    }

    record(QueryEvent::Compiled {
        kind: node.kind(),
        named: node.name().is_some(),
    });

    Ok(native)
}
