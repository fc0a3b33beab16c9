//! Module: fixture
//! Responsibility: randomized mapping types shared read-only by every variant run.
//! Does not own: node generation or property checks.

use crate::{HarnessConfig, HarnessError, Randomness};
use glacier_core::{
    compile::{CompileContext, TypeScope},
    schema::{FieldType, SchemaSnapshot, TypeMapping},
    value::FieldValue,
};
use std::{cell::Cell, collections::BTreeSet};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Fields every fixture type maps, in declaration order.
pub const MAPPED_FIELDS: [(&str, FieldType); 8] = [
    ("mapped_string", FieldType::Text),
    ("mapped_int", FieldType::Int),
    ("mapped_double", FieldType::Double),
    ("mapped_boolean", FieldType::Boolean),
    ("mapped_date", FieldType::Date),
    ("mapped_object", FieldType::Object),
    ("mapped_object.mapped_date", FieldType::Date),
    ("mapped_object.mapped_int", FieldType::Int),
];

// prefix keeps random names clear of mapped paths and reserved keys
const UNMAPPED_PREFIX: &str = "unmapped_";

// dates stay inside 1970..2100 so RFC 3339 rendering never fails
const MAX_EPOCH_SECONDS: i64 = 4_102_444_800;

thread_local! {
    static LIVE_FIXTURES: Cell<usize> = const { Cell::new(0) };
}

/// Fixtures built on this thread and not yet dropped.
#[must_use]
pub fn live_fixtures() -> usize {
    LIVE_FIXTURES.with(Cell::get)
}

///
/// SchemaFixture
///
/// Owns the schema for one harness run. Built on the calling thread,
/// borrowed by worker threads, and consumed by `teardown`.
///

#[derive(Debug)]
pub struct SchemaFixture {
    schema: SchemaSnapshot,
    type_names: Vec<String>,
    torn_down: bool,
}

impl SchemaFixture {
    /// Create `0..=max_types` uniquely named types carrying every mapped field.
    pub fn build(rng: &mut Randomness, config: &HarnessConfig) -> Result<Self, HarnessError> {
        let wanted = rng.len_between(0, config.max_types);
        let mut names = BTreeSet::new();
        while names.len() < wanted {
            names.insert(rng.ascii(1, 10));
        }

        let mut mappings = Vec::with_capacity(names.len());
        for name in &names {
            let mapping = MAPPED_FIELDS
                .iter()
                .fold(TypeMapping::builder(name.as_str()), |builder, (path, ty)| {
                    builder.field(*path, *ty)
                })
                .build()?;
            mappings.push(mapping);
        }

        let schema = SchemaSnapshot::from_types(mappings)?;
        LIVE_FIXTURES.with(|live| live.set(live.get() + 1));
        tracing::debug!(types = names.len(), "schema fixture built");

        Ok(Self {
            schema,
            type_names: names.into_iter().collect(),
            torn_down: false,
        })
    }

    #[must_use]
    pub const fn schema(&self) -> &SchemaSnapshot {
        &self.schema
    }

    #[must_use]
    pub fn type_names(&self) -> &[String] {
        &self.type_names
    }

    /// Compilation context over the fixture; random unmapped names are allowed.
    #[must_use]
    pub fn context(&self, scope: TypeScope) -> CompileContext<'_> {
        CompileContext::new(&self.schema)
            .with_scope(scope)
            .allow_unmapped_fields(true)
    }

    /// Any field name: mapped when types exist, unmapped otherwise or by chance.
    pub fn random_field_name(&self, rng: &mut Randomness) -> String {
        self.random_field_where(rng, |_| true)
    }

    /// Field name whose mapping satisfies `accept`, or a random unmapped name.
    pub fn random_field_where(
        &self,
        rng: &mut Randomness,
        accept: impl Fn(FieldType) -> bool,
    ) -> String {
        let candidates: Vec<&str> = MAPPED_FIELDS
            .iter()
            .filter(|(_, ty)| accept(*ty))
            .map(|(path, _)| *path)
            .collect();

        if self.type_names.is_empty() || rng.one_in(5) {
            return format!("{UNMAPPED_PREFIX}{}", rng.ascii(1, 10));
        }

        match rng.pick(&candidates) {
            Some(path) => (*path).to_string(),
            None => format!("{UNMAPPED_PREFIX}{}", rng.ascii(1, 10)),
        }
    }

    /// Mapping of `field`; every fixture type maps fields identically.
    #[must_use]
    pub fn field_type(&self, field: &str) -> Option<FieldType> {
        if self.type_names.is_empty() {
            return None;
        }
        MAPPED_FIELDS
            .iter()
            .find(|(path, _)| *path == field)
            .map(|(_, ty)| *ty)
    }

    /// Literal that compiles against `field`.
    pub fn random_value_for(&self, rng: &mut Randomness, field: &str) -> FieldValue {
        match self.field_type(field) {
            Some(FieldType::Int) => FieldValue::Int(rng.between(i64::MIN, i64::MAX)),
            Some(FieldType::Double) => random_double(rng),
            Some(FieldType::Boolean) => FieldValue::Bool(rng.bool()),
            Some(FieldType::Date) => random_date(rng),
            Some(FieldType::Text | FieldType::Object) | None => random_text(rng),
        }
    }

    /// A subset of the types, every type, or an explicit empty set.
    pub fn random_scope(&self, rng: &mut Randomness) -> TypeScope {
        match rng.between(0, 2) {
            0 => TypeScope::All,
            1 => TypeScope::types(self.type_names.iter().filter(|_| rng.bool()).cloned()),
            _ => TypeScope::types(Vec::<String>::new()),
        }
    }

    /// Consume the fixture at the end of a run.
    pub fn teardown(mut self) {
        self.torn_down = true;
        tracing::debug!(types = self.type_names.len(), "schema fixture torn down");
    }
}

impl Drop for SchemaFixture {
    fn drop(&mut self) {
        LIVE_FIXTURES.with(|live| live.set(live.get().saturating_sub(1)));

        if !self.torn_down && !std::thread::panicking() {
            tracing::warn!("schema fixture dropped without teardown");
            debug_assert!(self.torn_down, "schema fixture dropped without teardown");
        }
    }
}

/// Short text, ASCII or arbitrary scalar values.
pub fn random_text(rng: &mut Randomness) -> FieldValue {
    if rng.bool() {
        FieldValue::Text(rng.ascii(1, 10))
    } else {
        let len = rng.len_between(1, 6);
        FieldValue::Text(rng.unicode(len))
    }
}

/// Half of the draws span the whole finite range, the rest are everyday
/// magnitudes with long fractional parts.
pub fn random_double(rng: &mut Randomness) -> FieldValue {
    if rng.bool() {
        return FieldValue::double(rng.finite_double());
    }

    FieldValue::double((rng.float() - 0.5) * 2.0e6)
}

/// Epoch milliseconds or an RFC 3339 timestamp.
pub fn random_date(rng: &mut Randomness) -> FieldValue {
    let seconds = rng.between(0, MAX_EPOCH_SECONDS);
    if rng.bool() {
        return FieldValue::Int(seconds * 1000);
    }

    OffsetDateTime::from_unix_timestamp(seconds)
        .ok()
        .and_then(|at| at.format(&Rfc3339).ok())
        .map_or(FieldValue::Int(seconds * 1000), FieldValue::Text)
}

///
/// TESTS
///
