use crate::{
    codec::wire::MAX_NESTING_DEPTH,
    compile::{CompileError, NativeQuery},
    schema::{FieldMapping, SchemaSnapshot, TypeScope},
};
use std::collections::BTreeMap;

///
/// CompileContext
///
/// Everything one compilation may consult: the schema snapshot, the active
/// type scope, the unmapped-field policy, and the named-query captures it
/// produces. Built fresh per call; nothing here is shared or global.
///
/// Captures are staged while an outermost compile runs and only become
/// visible once it succeeds. A failed compile leaves the captures of earlier
/// successful calls untouched.
///

#[derive(Debug)]
pub struct CompileContext<'a> {
    schema: &'a SchemaSnapshot,
    scope: TypeScope,
    allow_unmapped_fields: bool,
    named: BTreeMap<String, NativeQuery>,
    staged: Vec<(String, NativeQuery)>,
    depth: usize,
}

impl<'a> CompileContext<'a> {
    #[must_use]
    pub fn new(schema: &'a SchemaSnapshot) -> Self {
        Self {
            schema,
            scope: TypeScope::All,
            allow_unmapped_fields: false,
            named: BTreeMap::new(),
            staged: Vec::new(),
            depth: 0,
        }
    }

    #[must_use]
    pub fn with_scope(mut self, scope: TypeScope) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub const fn allow_unmapped_fields(mut self, allow: bool) -> Self {
        self.allow_unmapped_fields = allow;
        self
    }

    #[must_use]
    pub const fn schema(&self) -> &'a SchemaSnapshot {
        self.schema
    }

    #[must_use]
    pub const fn scope(&self) -> &TypeScope {
        &self.scope
    }

    #[must_use]
    pub const fn allows_unmapped_fields(&self) -> bool {
        self.allow_unmapped_fields
    }

    /// Resolve a field under the active scope.
    ///
    /// `Ok(None)` means unmapped but permitted; the caller treats the raw
    /// field name as text.
    pub fn resolve_field(&self, field: &str) -> Result<Option<&'a FieldMapping>, CompileError> {
        match self.schema.resolve(field, &self.scope) {
            Some(mapping) => Ok(Some(mapping)),
            None if self.allow_unmapped_fields => Ok(None),
            None => Err(CompileError::UnmappedField {
                field: field.to_string(),
            }),
        }
    }

    /// Leaf paths below an object field, across active types.
    #[must_use]
    pub fn leaf_paths_under(&self, field: &str) -> Vec<String> {
        self.schema.leaf_paths_under(field, &self.scope)
    }

    /// Names of the active mapping types, in name order.
    #[must_use]
    pub fn active_type_names(&self) -> Vec<String> {
        self.schema
            .active(&self.scope)
            .map(|mapping| mapping.name().to_string())
            .collect()
    }

    #[must_use]
    pub fn named_query(&self, name: &str) -> Option<&NativeQuery> {
        self.named.get(name)
    }

    #[must_use]
    pub const fn named_queries(&self) -> &BTreeMap<String, NativeQuery> {
        &self.named
    }

    #[must_use]
    pub fn into_named_queries(self) -> BTreeMap<String, NativeQuery> {
        self.named
    }

    pub(crate) fn capture(&mut self, name: &str, query: &NativeQuery) {
        self.staged.push((name.to_string(), query.clone()));
    }

    // A later capture under the same name replaces the earlier one.
    pub(crate) fn commit_captures(&mut self) {
        self.named.extend(self.staged.drain(..));
    }

    pub(crate) fn discard_captures(&mut self) {
        self.staged.clear();
    }

    pub(crate) const fn is_outermost(&self) -> bool {
        self.depth == 0
    }

    pub(crate) const fn enter(&mut self) -> Result<(), CompileError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(CompileError::NestingTooDeep {
                max: MAX_NESTING_DEPTH,
            });
        }
        self.depth += 1;

        Ok(())
    }

    pub(crate) const fn exit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
