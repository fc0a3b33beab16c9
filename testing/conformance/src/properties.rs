//! Module: properties
//! Responsibility: behavioral properties every registered variant must satisfy.
//! Does not own: instance generation or fixture lifecycle.

use crate::{
    AlternateForm, HarnessConfig, HarnessError, Randomness, SchemaFixture,
    generate::{generator_for, random_node},
};
use glacier_core::{
    codec::{from_json, from_json_str, from_wire, to_json, to_json_string, to_wire},
    compile::{NativeQuery, TypeScope, compile},
    node::{BoolQuery, QueryBody, QueryNode, TermQuery, TypeQuery, WrapperQuery},
    registry::registered_kinds,
};
use std::{collections::hash_map::RandomState, fmt, hash::BuildHasher, thread};
use thiserror::Error as ThisError;

///
/// Property
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Property {
    DeclarativeRoundTrip,
    AlternateForm,
    WireRoundTrip,
    HashAgreement,
    BoostPropagation,
    NameIndependence,
    NameCapture,
    MutationInequality,
    CopyEquality,
    ValidationCount,
}

impl Property {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DeclarativeRoundTrip => "declarative round trip",
            Self::AlternateForm => "alternate form",
            Self::WireRoundTrip => "wire round trip",
            Self::HashAgreement => "hash agreement",
            Self::BoostPropagation => "boost propagation",
            Self::NameIndependence => "name independence",
            Self::NameCapture => "name capture",
            Self::MutationInequality => "mutation inequality",
            Self::CopyEquality => "copy equality",
            Self::ValidationCount => "validation count",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// PropertyViolation
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("[{type_id}] {property} violated: {detail}")]
pub struct PropertyViolation {
    pub property: Property,
    pub type_id: String,
    pub detail: String,
}

impl PropertyViolation {
    fn new(property: Property, node: &QueryNode, detail: impl Into<String>) -> Self {
        Self {
            property,
            type_id: node.type_id().to_string(),
            detail: detail.into(),
        }
    }
}

// Fails with `detail` unless `holds`.
fn ensure(
    holds: bool,
    property: Property,
    node: &QueryNode,
    detail: impl FnOnce() -> String,
) -> Result<(), PropertyViolation> {
    if holds {
        Ok(())
    } else {
        Err(PropertyViolation::new(property, node, detail()))
    }
}

///
/// VariantReport
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VariantReport {
    pub type_id: String,
    pub iterations: usize,
    pub alternate_forms: usize,
}

//
// codec properties
//

/// Encoding then decoding yields an equal node, as a value and as text.
pub fn check_declarative_round_trip(node: &QueryNode) -> Result<(), PropertyViolation> {
    let property = Property::DeclarativeRoundTrip;

    let value = to_json(node);
    let decoded = from_json(&value)
        .map_err(|err| PropertyViolation::new(property, node, format!("{value}: {err}")))?;
    ensure(decoded == *node, property, node, || format!("{value} decoded as {decoded}"))?;

    let text = to_json_string(node);
    let decoded = from_json_str(&text)
        .map_err(|err| PropertyViolation::new(property, node, format!("{text}: {err}")))?;

    ensure(decoded == *node, property, node, || format!("{text} decoded as {decoded}"))
}

/// A non-canonical form decodes to its expected node.
pub fn check_alternate_form(form: &AlternateForm) -> Result<(), PropertyViolation> {
    let property = Property::AlternateForm;
    let decoded = from_json_str(&form.text).map_err(|err| {
        PropertyViolation::new(property, &form.expected, format!("{}: {err}", form.text))
    })?;

    ensure(decoded == form.expected, property, &form.expected, || {
        format!("{} decoded as {decoded}, expected {}", form.text, form.expected)
    })
}

pub fn check_wire_round_trip(node: &QueryNode) -> Result<(), PropertyViolation> {
    let property = Property::WireRoundTrip;
    let decoded = from_wire(&to_wire(node))
        .map_err(|err| PropertyViolation::new(property, node, err.to_string()))?;

    ensure(decoded == *node, property, node, || format!("decoded as {decoded}"))
}

/// Round-tripped copies hash alike, both stably and through `Hash`.
pub fn check_hash_agreement(node: &QueryNode) -> Result<(), PropertyViolation> {
    let property = Property::HashAgreement;
    let copy = from_wire(&to_wire(node))
        .map_err(|err| PropertyViolation::new(property, node, err.to_string()))?;

    ensure(copy.stable_hash() == node.stable_hash(), property, node, || {
        format!("stable hashes {} and {} differ", node.stable_hash(), copy.stable_hash())
    })?;

    let state = RandomState::new();
    ensure(state.hash_one(&copy) == state.hash_one(node), property, node, || {
        "std hashes differ".to_string()
    })
}

//
// compile properties
//

fn compile_in(
    property: Property,
    node: &QueryNode,
    fixture: &SchemaFixture,
    scope: &TypeScope,
) -> Result<NativeQuery, PropertyViolation> {
    let mut ctx = fixture.context(scope.clone());

    compile(node, &mut ctx)
        .map_err(|err| PropertyViolation::new(property, node, format!("compile failed: {err}")))
}

/// The compiled boost equals the node boost, named or not.
pub fn check_boost_propagation(
    node: &QueryNode,
    fixture: &SchemaFixture,
    scope: &TypeScope,
) -> Result<(), PropertyViolation> {
    let property = Property::BoostPropagation;
    if !node.supports_boost_and_name() {
        return Ok(());
    }

    let mut original = None;
    for candidate in [node.clone(), node.clone().without_name()] {
        let native = compile_in(property, &candidate, fixture, scope)?;
        ensure(native.boost() == node.boost(), property, node, || {
            format!("compiled boost {} for node boost {}", native.boost(), node.boost())
        })?;
        if original.is_none() {
            original = Some(native);
        }
    }

    let boost = node.boost().get() + 1.0;
    if boost.to_bits() == node.boost().get().to_bits() {
        return Ok(());
    }
    let reboosted = compile_in(property, &node.clone().with_boost(boost), fixture, scope)?;
    ensure(original.as_ref() != Some(&reboosted), property, node, || {
        format!("boost {boost} compiled to the same query {reboosted}")
    })
}

/// Naming the root never changes what it compiles to.
pub fn check_name_independence(
    node: &QueryNode,
    fixture: &SchemaFixture,
    scope: &TypeScope,
) -> Result<(), PropertyViolation> {
    let property = Property::NameIndependence;
    let named = compile_in(property, node, fixture, scope)?;
    let unnamed = compile_in(property, &node.clone().without_name(), fixture, scope)?;

    ensure(named == unnamed, property, node, || {
        format!("named compiles to {named}, unnamed to {unnamed}")
    })
}

/// A named root registers exactly its unnamed compilation.
pub fn check_name_capture(
    node: &QueryNode,
    fixture: &SchemaFixture,
    scope: &TypeScope,
) -> Result<(), PropertyViolation> {
    let property = Property::NameCapture;
    let Some(name) = node.name() else {
        return Ok(());
    };

    let expected = compile_in(property, &node.clone().without_name(), fixture, scope)?;
    let mut ctx = fixture.context(scope.clone());
    let native = compile(node, &mut ctx)
        .map_err(|err| PropertyViolation::new(property, node, format!("compile failed: {err}")))?;

    ensure(native == expected, property, node, || {
        format!("compiled {native}, expected {expected}")
    })?;
    ensure(ctx.named_query(name) == Some(&expected), property, node, || {
        format!("'{name}' captured {:?}", ctx.named_query(name))
    })
}

//
// equality properties
//

/// Changing boost or name breaks equality on supporting variants and is
/// ignored by the rest.
pub fn check_mutation_inequality(node: &QueryNode) -> Result<(), PropertyViolation> {
    let property = Property::MutationInequality;
    let boost = if node.boost().get().to_bits() == 7.0f32.to_bits() { 3.0 } else { 7.0 };
    let name = format!("{}_renamed", node.name().unwrap_or_default());

    let reboosted = node.clone().with_boost(boost);
    let renamed = node.clone().with_name(name);

    if node.supports_boost_and_name() {
        ensure(reboosted != *node, property, node, || "boost change kept equality".to_string())?;
        ensure(renamed != *node, property, node, || "name change kept equality".to_string())?;
        ensure(
            reboosted.stable_hash() != node.stable_hash(),
            property,
            node,
            || "boost change kept the stable hash".to_string(),
        )?;
        ensure(
            renamed.stable_hash() != node.stable_hash(),
            property,
            node,
            || "name change kept the stable hash".to_string(),
        )
    } else {
        ensure(
            reboosted == *node && renamed == *node,
            property,
            node,
            || "ignored attributes changed equality".to_string(),
        )
    }
}

/// Equality over independent copies is reflexive, symmetric, and transitive,
/// and equal copies hash alike.
pub fn check_copy_equality(node: &QueryNode) -> Result<(), PropertyViolation> {
    let property = Property::CopyEquality;
    let a = node.clone();
    let b = from_wire(&to_wire(node))
        .map_err(|err| PropertyViolation::new(property, node, err.to_string()))?;
    let c = from_json(&to_json(node))
        .map_err(|err| PropertyViolation::new(property, node, err.to_string()))?;

    #[expect(clippy::eq_op)]
    let reflexive = a == a;
    ensure(reflexive, property, node, || "not reflexive".to_string())?;
    ensure(a == b && b == a, property, node, || "not symmetric".to_string())?;
    ensure(b == c && a == c, property, node, || "not transitive".to_string())?;
    ensure(
        a.stable_hash() == b.stable_hash() && b.stable_hash() == c.stable_hash(),
        property,
        node,
        || "equal copies hash differently".to_string(),
    )
}

//
// validation
//

/// A generated node validates cleanly, and a deliberately broken copy
/// reports exactly one error per broken rule.
pub fn check_validation_count(node: &QueryNode) -> Result<(), PropertyViolation> {
    let property = Property::ValidationCount;

    let errors = node.validate();
    ensure(errors.is_empty(), property, node, || {
        format!("well-formed node reported {} error(s)", errors.len())
    })?;

    let (broken, expected) = break_node(node);
    let actual = broken.validate().len();

    ensure(actual == expected, property, node, || {
        format!("{broken} reported {actual} error(s), expected {expected}")
    })
}

// Copy of `node` violating a known number of independent rules.
fn break_node(node: &QueryNode) -> (QueryNode, usize) {
    let (body, mut expected): (QueryNode, usize) = match node.body() {
        QueryBody::MatchAll(q) => (q.clone().into(), 0),
        QueryBody::MatchNone(q) => (q.clone().into(), 0),
        QueryBody::Term(q) => {
            let mut q = q.clone();
            q.field.clear();
            (q.into(), 1)
        }
        QueryBody::Terms(q) => {
            let mut q = q.clone();
            q.field.clear();
            q.values.clear();
            (q.into(), 2)
        }
        QueryBody::Range(q) => {
            let mut q = q.clone();
            q.field.clear();
            q.format = Some(String::new());
            (q.into(), 2)
        }
        QueryBody::Prefix(q) => {
            let mut q = q.clone();
            q.field.clear();
            q.value.clear();
            (q.into(), 2)
        }
        QueryBody::Exists(q) => {
            let mut q = q.clone();
            q.field.clear();
            (q.into(), 1)
        }
        QueryBody::Ids(q) => {
            let mut q = q.clone();
            q.values.clear();
            q.types = vec![String::new(), String::new()];
            (q.into(), 2)
        }
        QueryBody::Type(q) => {
            let mut q = q.clone();
            q.value.clear();
            (q.into(), 1)
        }
        QueryBody::Bool(q) => {
            let mut q: BoolQuery = q.clone();
            q.must.push(TermQuery::new("", "x").into());
            q.minimum_should_match = Some("most".to_string());
            (q.into(), 2)
        }
        QueryBody::ConstantScore(q) => {
            let mut q = q.clone();
            q.filter = Box::new(TypeQuery::new("").into());
            (q.into(), 1)
        }
        QueryBody::Wrapper(_) => (WrapperQuery::new("").into(), 1),
    };

    if !node.supports_boost_and_name() {
        return (body, expected);
    }

    let mut broken = body.with_boost(-node.boost().get());
    if let Some(name) = node.name() {
        broken = broken.with_name(name);
    }
    expected += 1;

    (broken, expected)
}

//
// runners
//

/// Every per-node property, in order.
pub fn check_all(
    node: &QueryNode,
    fixture: &SchemaFixture,
    scope: &TypeScope,
) -> Result<(), PropertyViolation> {
    check_declarative_round_trip(node)?;
    check_wire_round_trip(node)?;
    check_hash_agreement(node)?;
    check_boost_propagation(node, fixture, scope)?;
    check_name_independence(node, fixture, scope)?;
    check_name_capture(node, fixture, scope)?;
    check_mutation_inequality(node)?;
    check_copy_equality(node)?;
    check_validation_count(node)
}

/// Run every property over `config.iterations` instances of `type_id`.
///
/// The variant draws from its own stream, seeded from the harness seed and
/// the type id, so a failure reproduces from the seed alone.
pub fn run_variant(
    type_id: &str,
    fixture: &SchemaFixture,
    config: &HarnessConfig,
) -> Result<VariantReport, HarnessError> {
    let generator = generator_for(type_id).ok_or_else(|| HarnessError::UnknownVariant {
        type_id: type_id.to_string(),
    })?;
    let mut rng = Randomness::for_variant(config.seed, type_id);
    let mut alternate_forms = 0;

    for _ in 0..config.iterations {
        let node = random_node(&mut rng, fixture, generator, 0);
        let scope = fixture.random_scope(&mut rng);
        check_all(&node, fixture, &scope)?;

        for form in generator.alternate_forms(&mut rng, fixture) {
            check_alternate_form(&form)?;
            check_all(&form.expected, fixture, &scope)?;
            alternate_forms += 1;
        }
    }
    tracing::debug!(type_id, iterations = config.iterations, alternate_forms, "variant passed");

    Ok(VariantReport {
        type_id: type_id.to_string(),
        iterations: config.iterations,
        alternate_forms,
    })
}

/// Run every registered variant on its own thread over one shared fixture.
///
/// The fixture is torn down before returning, pass or fail. The first
/// failure in registry order is reported.
pub fn run_all(config: &HarnessConfig) -> Result<Vec<VariantReport>, HarnessError> {
    let mut rng = Randomness::new(config.seed);
    let fixture = SchemaFixture::build(&mut rng, config)?;
    let kinds = registered_kinds();
    tracing::info!(
        seed = config.seed,
        variants = kinds.len(),
        types = fixture.type_names().len(),
        "conformance run started"
    );

    let shared = &fixture;
    let outcomes: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = kinds
            .iter()
            .map(|kind| {
                let type_id = kind.type_id();
                (type_id, scope.spawn(move || run_variant(type_id, shared, config)))
            })
            .collect();

        handles
            .into_iter()
            .map(|(type_id, handle)| (type_id, handle.join()))
            .collect()
    });
    fixture.teardown();

    let mut reports = Vec::with_capacity(outcomes.len());
    for (type_id, outcome) in outcomes {
        match outcome {
            Ok(Ok(report)) => reports.push(report),
            Ok(Err(err)) => {
                tracing::warn!(type_id, error = %err, "conformance run failed");
                return Err(err);
            }
            Err(_) => {
                return Err(HarnessError::Panicked {
                    type_id: type_id.to_string(),
                });
            }
        }
    }
    tracing::info!(variants = reports.len(), "conformance run passed");

    Ok(reports)
}

///
/// TESTS
///
