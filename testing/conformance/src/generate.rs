use crate::{Randomness, SchemaFixture, fixture::random_text};
use glacier_core::{
    codec::{
        json::{BOOST_KEY, NAME_KEY, boost_to_json, field_value_to_json},
        to_json, to_json_string,
    },
    compile::coerce::FORMAT_EPOCH_MILLIS,
    node::{
        BoolQuery, ConstantScoreQuery, ExistsQuery, IdsQuery, MatchAllQuery, MatchNoneQuery,
        PrefixQuery, QueryKind, QueryNode, RangeQuery, TermQuery, TermsQuery, TypeQuery,
        WrapperQuery,
    },
    schema::FieldType,
    value::FieldValue,
};
use serde_json::{Map, Value as JsonValue, json};

/// Compound generators stop nesting compound children past this depth.
pub const MAX_GENERATED_DEPTH: usize = 2;

const LEAF_KINDS: [QueryKind; 9] = [
    QueryKind::MatchAll,
    QueryKind::MatchNone,
    QueryKind::Term,
    QueryKind::Terms,
    QueryKind::Range,
    QueryKind::Prefix,
    QueryKind::Exists,
    QueryKind::Ids,
    QueryKind::Type,
];

const MSM_SPECS: [&str; 5] = ["1", "2", "-1", "75%", "-25%"];

///
/// AlternateForm
///
/// Declarative text in a non-canonical form and the node it must decode to.
///

#[derive(Clone, Debug)]
pub struct AlternateForm {
    pub text: String,
    pub expected: QueryNode,
}

///
/// NodeGenerator
///
/// Produces random, well-formed, compilable instances of one variant.
/// Generated bodies carry default boost and no name; `random_node` applies
/// the common attributes.
///

pub trait NodeGenerator: Sync {
    fn kind(&self) -> QueryKind;

    fn generate(&self, rng: &mut Randomness, fixture: &SchemaFixture, depth: usize) -> QueryNode;

    /// Non-canonical declarative inputs this variant also accepts.
    fn alternate_forms(&self, _rng: &mut Randomness, _fixture: &SchemaFixture) -> Vec<AlternateForm> {
        Vec::new()
    }
}

/// Generator registered for `type_id`.
#[must_use]
pub fn generator_for(type_id: &str) -> Option<&'static dyn NodeGenerator> {
    QueryKind::from_type_id(type_id).map(generator_for_kind)
}

#[must_use]
pub fn generator_for_kind(kind: QueryKind) -> &'static dyn NodeGenerator {
    match kind {
        QueryKind::MatchAll => &MatchAllGenerator,
        QueryKind::MatchNone => &MatchNoneGenerator,
        QueryKind::Term => &TermGenerator,
        QueryKind::Terms => &TermsGenerator,
        QueryKind::Range => &RangeGenerator,
        QueryKind::Prefix => &PrefixGenerator,
        QueryKind::Exists => &ExistsGenerator,
        QueryKind::Ids => &IdsGenerator,
        QueryKind::Type => &TypeGenerator,
        QueryKind::Bool => &BoolGenerator,
        QueryKind::ConstantScore => &ConstantScoreGenerator,
        QueryKind::Wrapper => &WrapperGenerator,
    }
}

/// One instance of `generator`'s variant with common attributes applied.
pub fn random_node(
    rng: &mut Randomness,
    fixture: &SchemaFixture,
    generator: &dyn NodeGenerator,
    depth: usize,
) -> QueryNode {
    let node = generator.generate(rng, fixture, depth);

    apply_common_attributes(rng, node)
}

/// Boost and name, each by coin flip; no-ops on variants without support.
pub fn apply_common_attributes(rng: &mut Randomness, mut node: QueryNode) -> QueryNode {
    if rng.bool() {
        node = node.with_boost(random_boost(rng));
    }
    if rng.bool() {
        node = node.with_name(random_name(rng));
    }

    node
}

/// `2 / n` for `n` in `1..=20`.
pub fn random_boost(rng: &mut Randomness) -> f32 {
    let divisor = u16::try_from(rng.between(1, 20)).unwrap_or(1);

    2.0 / f32::from(divisor)
}

pub fn random_name(rng: &mut Randomness) -> String {
    rng.ascii(1, 10)
}

// Child of a compound node; deep children are leaves.
fn random_child(rng: &mut Randomness, fixture: &SchemaFixture, depth: usize) -> QueryNode {
    let kind = if depth >= MAX_GENERATED_DEPTH {
        rng.pick(&LEAF_KINDS).copied()
    } else {
        rng.pick(&QueryKind::ALL).copied()
    }
    .unwrap_or(QueryKind::MatchAll);

    random_node(rng, fixture, generator_for_kind(kind), depth + 1)
}

// Single-key object `{ key: value }`.
fn single(key: &str, value: JsonValue) -> JsonValue {
    let mut map = Map::new();
    map.insert(key.to_string(), value);

    JsonValue::Object(map)
}

// Short-form body `{ "<field>": inner }` with common attributes by coin flip.
fn short_form(
    rng: &mut Randomness,
    type_id: &str,
    field: &str,
    inner: JsonValue,
    expected: QueryNode,
) -> AlternateForm {
    let mut body = Map::new();
    body.insert(field.to_string(), inner);

    let mut expected = expected;
    if rng.bool() {
        let boost = random_boost(rng);
        expected = expected.with_boost(boost);
        body.insert(BOOST_KEY.to_string(), boost_to_json(expected.boost()));
    }
    if rng.bool() {
        let name = random_name(rng);
        body.insert(NAME_KEY.to_string(), JsonValue::String(name.clone()));
        expected = expected.with_name(name);
    }

    AlternateForm {
        text: single(type_id, JsonValue::Object(body)).to_string(),
        expected,
    }
}

fn random_values(rng: &mut Randomness, fixture: &SchemaFixture, field: &str) -> Vec<FieldValue> {
    let len = rng.len_between(1, 4);

    (0..len).map(|_| fixture.random_value_for(rng, field)).collect()
}

fn random_type_name(rng: &mut Randomness, fixture: &SchemaFixture) -> String {
    match rng.pick(fixture.type_names()) {
        Some(name) if rng.bool() => name.clone(),
        _ => rng.ascii(1, 10),
    }
}

fn text_value(rng: &mut Randomness) -> String {
    match random_text(rng) {
        FieldValue::Text(text) => text,
        other => other.to_string(),
    }
}

///
/// MatchAllGenerator
///

pub struct MatchAllGenerator;

impl NodeGenerator for MatchAllGenerator {
    fn kind(&self) -> QueryKind {
        QueryKind::MatchAll
    }

    fn generate(&self, _: &mut Randomness, _: &SchemaFixture, _: usize) -> QueryNode {
        MatchAllQuery::new().into()
    }
}

///
/// MatchNoneGenerator
///

pub struct MatchNoneGenerator;

impl NodeGenerator for MatchNoneGenerator {
    fn kind(&self) -> QueryKind {
        QueryKind::MatchNone
    }

    fn generate(&self, _: &mut Randomness, _: &SchemaFixture, _: usize) -> QueryNode {
        MatchNoneQuery::new().into()
    }
}

///
/// TermGenerator
///

pub struct TermGenerator;

impl NodeGenerator for TermGenerator {
    fn kind(&self) -> QueryKind {
        QueryKind::Term
    }

    fn generate(&self, rng: &mut Randomness, fixture: &SchemaFixture, _: usize) -> QueryNode {
        let field = fixture.random_field_where(rng, FieldType::is_leaf);
        let value = fixture.random_value_for(rng, &field);

        TermQuery::new(field, value).into()
    }

    fn alternate_forms(&self, rng: &mut Randomness, fixture: &SchemaFixture) -> Vec<AlternateForm> {
        let field = fixture.random_field_where(rng, FieldType::is_leaf);
        let value = fixture.random_value_for(rng, &field);
        let inner = field_value_to_json(&value);

        vec![short_form(
            rng,
            "term",
            &field,
            inner,
            TermQuery::new(field.clone(), value).into(),
        )]
    }
}

///
/// TermsGenerator
///

pub struct TermsGenerator;

impl NodeGenerator for TermsGenerator {
    fn kind(&self) -> QueryKind {
        QueryKind::Terms
    }

    fn generate(&self, rng: &mut Randomness, fixture: &SchemaFixture, _: usize) -> QueryNode {
        let field = fixture.random_field_where(rng, FieldType::is_leaf);
        let values = random_values(rng, fixture, &field);

        TermsQuery::new(field, values).into()
    }

    fn alternate_forms(&self, rng: &mut Randomness, fixture: &SchemaFixture) -> Vec<AlternateForm> {
        let field = fixture.random_field_where(rng, FieldType::is_leaf);
        let values = random_values(rng, fixture, &field);
        let inner = JsonValue::Array(values.iter().map(field_value_to_json).collect());

        vec![short_form(
            rng,
            "terms",
            &field,
            inner,
            TermsQuery::new(field.clone(), values).into(),
        )]
    }
}

///
/// RangeGenerator
///

pub struct RangeGenerator;

impl NodeGenerator for RangeGenerator {
    fn kind(&self) -> QueryKind {
        QueryKind::Range
    }

    fn generate(&self, rng: &mut Randomness, fixture: &SchemaFixture, _: usize) -> QueryNode {
        let field = fixture.random_field_where(rng, FieldType::is_orderable);
        let mut query = RangeQuery::new(field.clone());

        if rng.bool() {
            let value = fixture.random_value_for(rng, &field);
            query = if rng.bool() { query.gt(value) } else { query.gte(value) };
        }
        if rng.bool() {
            let value = fixture.random_value_for(rng, &field);
            query = if rng.bool() { query.lt(value) } else { query.lte(value) };
        }

        // epoch_millis only reinterprets text, so it is safe on integral bounds
        let integral = [&query.from, &query.to]
            .into_iter()
            .flatten()
            .all(|bound| matches!(bound, FieldValue::Int(_)));
        if fixture.field_type(&field) == Some(FieldType::Date) && integral && rng.bool() {
            query = query.format(FORMAT_EPOCH_MILLIS);
        }

        query.into()
    }

    fn alternate_forms(&self, rng: &mut Randomness, fixture: &SchemaFixture) -> Vec<AlternateForm> {
        let field = fixture.random_field_where(rng, FieldType::is_orderable);
        let lower = fixture.random_value_for(rng, &field);
        let upper = fixture.random_value_for(rng, &field);

        let (lower_op, expected) = if rng.bool() {
            ("gt", RangeQuery::new(field.clone()).gt(lower.clone()))
        } else {
            ("gte", RangeQuery::new(field.clone()).gte(lower.clone()))
        };
        let (upper_op, expected) = if rng.bool() {
            ("lt", expected.lt(upper.clone()))
        } else {
            ("lte", expected.lte(upper.clone()))
        };

        let mut inner = Map::new();
        inner.insert(lower_op.to_string(), field_value_to_json(&lower));
        inner.insert(upper_op.to_string(), field_value_to_json(&upper));

        vec![short_form(
            rng,
            "range",
            &field,
            JsonValue::Object(inner),
            expected.into(),
        )]
    }
}

///
/// PrefixGenerator
///

pub struct PrefixGenerator;

impl NodeGenerator for PrefixGenerator {
    fn kind(&self) -> QueryKind {
        QueryKind::Prefix
    }

    fn generate(&self, rng: &mut Randomness, fixture: &SchemaFixture, _: usize) -> QueryNode {
        let field = fixture.random_field_where(rng, |ty| ty == FieldType::Text);
        let query = PrefixQuery::new(field, text_value(rng));

        if rng.bool() {
            query.rewrite("constant_score").into()
        } else {
            query.into()
        }
    }

    fn alternate_forms(&self, rng: &mut Randomness, fixture: &SchemaFixture) -> Vec<AlternateForm> {
        let field = fixture.random_field_where(rng, |ty| ty == FieldType::Text);
        let value = text_value(rng);

        let bare = short_form(
            rng,
            "prefix",
            &field,
            JsonValue::String(value.clone()),
            PrefixQuery::new(field.clone(), value.clone()).into(),
        );
        let object = short_form(
            rng,
            "prefix",
            &field,
            json!({ "value": value.clone(), "rewrite": "top_terms" }),
            PrefixQuery::new(field.clone(), value).rewrite("top_terms").into(),
        );

        vec![bare, object]
    }
}

///
/// ExistsGenerator
///

pub struct ExistsGenerator;

impl NodeGenerator for ExistsGenerator {
    fn kind(&self) -> QueryKind {
        QueryKind::Exists
    }

    fn generate(&self, rng: &mut Randomness, fixture: &SchemaFixture, _: usize) -> QueryNode {
        ExistsQuery::new(fixture.random_field_name(rng)).into()
    }
}

///
/// IdsGenerator
///

pub struct IdsGenerator;

impl NodeGenerator for IdsGenerator {
    fn kind(&self) -> QueryKind {
        QueryKind::Ids
    }

    fn generate(&self, rng: &mut Randomness, fixture: &SchemaFixture, _: usize) -> QueryNode {
        let values: Vec<String> = (0..rng.len_between(1, 4)).map(|_| rng.ascii(1, 10)).collect();
        let types: Vec<String> = (0..rng.len_between(0, 2))
            .map(|_| random_type_name(rng, fixture))
            .collect();

        IdsQuery::new(values).types(types).into()
    }

    fn alternate_forms(&self, rng: &mut Randomness, fixture: &SchemaFixture) -> Vec<AlternateForm> {
        let type_name = random_type_name(rng, fixture);
        let id = rng.ascii(1, 10);
        let text = json!({ "ids": { "type": type_name.clone(), "values": id.clone() } }).to_string();

        vec![AlternateForm {
            text,
            expected: IdsQuery::new([id]).types([type_name]).into(),
        }]
    }
}

///
/// TypeGenerator
///

pub struct TypeGenerator;

impl NodeGenerator for TypeGenerator {
    fn kind(&self) -> QueryKind {
        QueryKind::Type
    }

    fn generate(&self, rng: &mut Randomness, fixture: &SchemaFixture, _: usize) -> QueryNode {
        TypeQuery::new(random_type_name(rng, fixture)).into()
    }
}

///
/// BoolGenerator
///

pub struct BoolGenerator;

impl NodeGenerator for BoolGenerator {
    fn kind(&self) -> QueryKind {
        QueryKind::Bool
    }

    fn generate(&self, rng: &mut Randomness, fixture: &SchemaFixture, depth: usize) -> QueryNode {
        let mut clauses = || -> Vec<QueryNode> {
            (0..rng.len_between(0, 2))
                .map(|_| random_child(rng, fixture, depth))
                .collect()
        };
        let mut query = BoolQuery::new();
        query.must = clauses();
        query.must_not = clauses();
        query.should = clauses();
        query.filter = clauses();

        if rng.bool()
            && let Some(spec) = rng.pick(&MSM_SPECS)
        {
            query = query.minimum_should_match(*spec);
        }

        query.disable_coord(rng.bool()).into()
    }

    fn alternate_forms(&self, rng: &mut Randomness, fixture: &SchemaFixture) -> Vec<AlternateForm> {
        let child = random_child(rng, fixture, MAX_GENERATED_DEPTH);
        let msm = rng.between(0, 3);
        let text = json!({
            "bool": {
                "must": to_json(&child),
                "minimum_should_match": msm,
            }
        })
        .to_string();

        vec![AlternateForm {
            text,
            expected: BoolQuery::new()
                .must(child)
                .minimum_should_match(msm.to_string())
                .into(),
        }]
    }
}

///
/// ConstantScoreGenerator
///

pub struct ConstantScoreGenerator;

impl NodeGenerator for ConstantScoreGenerator {
    fn kind(&self) -> QueryKind {
        QueryKind::ConstantScore
    }

    fn generate(&self, rng: &mut Randomness, fixture: &SchemaFixture, depth: usize) -> QueryNode {
        ConstantScoreQuery::new(random_child(rng, fixture, depth)).into()
    }
}

///
/// WrapperGenerator
///

pub struct WrapperGenerator;

impl NodeGenerator for WrapperGenerator {
    fn kind(&self) -> QueryKind {
        QueryKind::Wrapper
    }

    fn generate(&self, rng: &mut Randomness, fixture: &SchemaFixture, depth: usize) -> QueryNode {
        let inner = random_child(rng, fixture, depth.max(MAX_GENERATED_DEPTH));

        WrapperQuery::new(to_json_string(&inner)).into()
    }
}

///
/// TESTS
///
