use crate::schema::{FieldType, SchemaSnapshot, TypeMapping};

///
/// Test schema
///
/// `alpha` carries one field of every type plus an object with two leaves.
/// `beta` re-maps `mapped_int` as a double so first-match resolution in
/// type-name order is observable.
///

pub(crate) fn schema() -> SchemaSnapshot {
    let alpha = TypeMapping::builder("alpha")
        .field("mapped_string", FieldType::Text)
        .field("mapped_int", FieldType::Int)
        .field("mapped_double", FieldType::Double)
        .field("mapped_boolean", FieldType::Boolean)
        .field("mapped_date", FieldType::Date)
        .field("mapped_object", FieldType::Object)
        .field("mapped_object.mapped_date", FieldType::Date)
        .field("mapped_object.mapped_int", FieldType::Int)
        .build()
        .expect("alpha mapping should build");

    let beta = TypeMapping::builder("beta")
        .field("title", FieldType::Text)
        .field("mapped_int", FieldType::Double)
        .field("empty_object", FieldType::Object)
        .build()
        .expect("beta mapping should build");

    SchemaSnapshot::from_types([alpha, beta]).expect("test schema should build")
}

///
/// Node strategies
///
/// Arbitrary node trees for codec and equality properties. Doubles stay
/// finite and boosts stay exactly representable in both `f32` and `f64`.
///

pub(crate) mod strategy {
    use crate::{
        node::{
            BoolQuery, ConstantScoreQuery, ExistsQuery, IdsQuery, MatchAllQuery, MatchNoneQuery,
            PrefixQuery, QueryNode, RangeQuery, TermQuery, TermsQuery, TypeQuery, WrapperQuery,
        },
        value::FieldValue,
    };
    use proptest::prelude::*;

    const FIELDS: [&str; 5] = ["mapped_string", "mapped_int", "title", "user", "mapped_object"];

    pub(crate) fn arb_field() -> impl Strategy<Value = String> {
        prop::sample::select(FIELDS.to_vec()).prop_map(str::to_string)
    }

    pub(crate) fn arb_value() -> impl Strategy<Value = FieldValue> {
        prop_oneof![
            "[a-zA-Z0-9 ]{0,8}".prop_map(FieldValue::Text),
            any::<i64>().prop_map(FieldValue::Int),
            any::<f64>()
                .prop_filter("finite", |d| d.is_finite())
                .prop_map(FieldValue::double),
            any::<bool>().prop_map(FieldValue::Bool),
        ]
    }

    fn arb_boost() -> impl Strategy<Value = f32> {
        prop::sample::select(vec![1.0f32, 0.5, 2.0, 3.25, 10.0])
    }

    fn arb_name() -> impl Strategy<Value = Option<String>> {
        prop::option::of("[a-z]{1,6}")
    }

    fn arb_msm() -> impl Strategy<Value = Option<String>> {
        prop::option::of(
            prop::sample::select(vec!["1", "2", "-1", "75%", "-25%"]).prop_map(str::to_string),
        )
    }

    fn apply_meta(node: QueryNode, boost: f32, name: Option<String>) -> QueryNode {
        let node = node.with_boost(boost);
        match name {
            Some(name) => node.with_name(name),
            None => node,
        }
    }

    fn arb_range() -> impl Strategy<Value = QueryNode> {
        (
            arb_field(),
            prop::option::of(arb_value()),
            prop::option::of(arb_value()),
            any::<bool>(),
            any::<bool>(),
            prop::option::of(Just("epoch_millis".to_string())),
        )
            .prop_map(|(field, from, to, include_lower, include_upper, format)| {
                QueryNode::from(RangeQuery {
                    field,
                    from,
                    to,
                    include_lower,
                    include_upper,
                    format,
                })
            })
    }

    fn arb_leaf_body() -> impl Strategy<Value = QueryNode> {
        prop_oneof![
            Just(QueryNode::from(MatchAllQuery::new())),
            Just(QueryNode::from(MatchNoneQuery::new())),
            (arb_field(), arb_value()).prop_map(|(f, v)| QueryNode::from(TermQuery::new(f, v))),
            (arb_field(), prop::collection::vec(arb_value(), 0..4))
                .prop_map(|(f, vs)| QueryNode::from(TermsQuery::new(f, vs))),
            arb_range(),
            (arb_field(), "[a-z]{0,4}", prop::option::of(Just("constant".to_string()))).prop_map(
                |(field, value, rewrite)| QueryNode::from(PrefixQuery {
                    field,
                    value,
                    rewrite,
                })
            ),
            arb_field().prop_map(|f| QueryNode::from(ExistsQuery::new(f))),
            (
                prop::collection::vec("[a-z]{1,4}", 0..3),
                prop::collection::vec("[a-z0-9]{1,4}", 0..3),
            )
                .prop_map(|(types, values)| QueryNode::from(IdsQuery::new(values).types(types))),
            "[a-z]{1,6}".prop_map(|t| QueryNode::from(TypeQuery::new(t))),
            "[a-z{}\":]{0,12}".prop_map(|s| QueryNode::from(WrapperQuery::new(s))),
        ]
    }

    fn arb_leaf() -> impl Strategy<Value = QueryNode> {
        (arb_leaf_body(), arb_boost(), arb_name())
            .prop_map(|(node, boost, name)| apply_meta(node, boost, name))
    }

    /// Arbitrary node tree with boost/name applied where supported.
    pub(crate) fn arb_node() -> impl Strategy<Value = QueryNode> {
        arb_leaf().prop_recursive(3, 24, 4, |inner| {
            let bool_query = (
                prop::collection::vec(inner.clone(), 0..3),
                prop::collection::vec(inner.clone(), 0..3),
                prop::collection::vec(inner.clone(), 0..3),
                prop::collection::vec(inner.clone(), 0..3),
                arb_msm(),
                any::<bool>(),
            )
                .prop_map(
                    |(must, must_not, should, filter, minimum_should_match, disable_coord)| {
                        QueryNode::from(BoolQuery {
                            must,
                            must_not,
                            should,
                            filter,
                            minimum_should_match,
                            disable_coord,
                        })
                    },
                );
            let constant_score = inner.prop_map(|node| QueryNode::from(ConstantScoreQuery::new(node)));

            (prop_oneof![bool_query, constant_score], arb_boost(), arb_name())
                .prop_map(|(node, boost, name)| apply_meta(node, boost, name))
        })
    }
}
