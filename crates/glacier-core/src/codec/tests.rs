use crate::{
    codec::{
        from_json, from_json_str, from_wire, json::ParseError, to_json, to_json_string, to_wire,
        wire::WireError,
    },
    node::{
        BoolQuery, ConstantScoreQuery, ExistsQuery, IdsQuery, MatchAllQuery, MatchNoneQuery,
        PrefixQuery, QueryNode, RangeQuery, TermQuery, TermsQuery, TypeQuery, WrapperQuery,
    },
    test_fixtures::strategy::arb_node,
    value::FieldValue,
};
use proptest::prelude::*;
use serde_json::json;

fn decode(value: serde_json::Value) -> QueryNode {
    from_json(&value).expect("declarative input should decode")
}

fn decode_err(value: serde_json::Value) -> ParseError {
    from_json(&value).expect_err("declarative input should be rejected")
}

fn nested_constant_score(levels: usize) -> QueryNode {
    let mut node = QueryNode::from(MatchAllQuery::new());
    for _ in 1..levels {
        node = ConstantScoreQuery::new(node).into();
    }
    node
}

fn nested_constant_score_json(levels: usize) -> serde_json::Value {
    let mut value = json!({ "match_all": {} });
    for _ in 1..levels {
        value = json!({ "constant_score": { "filter": value } });
    }
    value
}

//
// declarative encoding
//

#[test]
fn term_encodes_canonical_form() {
    let node = QueryNode::from(TermQuery::new("user", "kimchy"));

    assert_eq!(
        to_json(&node),
        json!({ "term": { "field": "user", "value": "kimchy" } })
    );
}

#[test]
fn boost_and_name_are_emitted_only_when_set() {
    let node = QueryNode::from(TermQuery::new("age", 5))
        .with_boost(2.0)
        .with_name("adult");

    assert_eq!(
        to_json(&node),
        json!({ "term": { "field": "age", "value": 5, "boost": 2.0, "_name": "adult" } })
    );
}

#[test]
fn match_none_and_wrapper_never_emit_boost_or_name() {
    assert_eq!(
        to_json(&QueryNode::from(MatchNoneQuery::new())),
        json!({ "match_none": {} })
    );
    assert_eq!(
        to_json(&QueryNode::from(WrapperQuery::new("{}"))),
        json!({ "wrapper": { "source": "{}" } })
    );
}

#[test]
fn bool_omits_empty_clauses_and_default_flags() {
    let node = QueryNode::from(BoolQuery::new().should(ExistsQuery::new("title")));

    assert_eq!(
        to_json(&node),
        json!({ "bool": { "should": [ { "exists": { "field": "title" } } ] } })
    );
}

#[test]
fn range_always_emits_inclusivity() {
    let node = QueryNode::from(RangeQuery::new("age").gt(10));

    assert_eq!(
        to_json(&node),
        json!({
            "range": {
                "field": "age",
                "from": 10,
                "include_lower": false,
                "include_upper": true
            }
        })
    );
}

#[test]
fn ids_omit_empty_types() {
    assert_eq!(
        to_json(&QueryNode::from(IdsQuery::new(["1"]))),
        json!({ "ids": { "values": ["1"] } })
    );
}

//
// declarative decoding
//

#[test]
fn term_short_form_decodes() {
    assert_eq!(
        decode(json!({ "term": { "user": "kimchy" } })),
        QueryNode::from(TermQuery::new("user", "kimchy"))
    );
}

#[test]
fn term_short_form_keeps_boost_and_name() {
    let node = decode(json!({ "term": { "user": "kimchy", "boost": 3.0, "_name": "who" } }));

    assert_eq!(node.boost().get(), 3.0);
    assert_eq!(node.name(), Some("who"));
}

#[test]
fn terms_short_form_decodes() {
    assert_eq!(
        decode(json!({ "terms": { "tags": ["a", 1, true] } })),
        QueryNode::from(TermsQuery::new(
            "tags",
            [
                FieldValue::text("a"),
                FieldValue::Int(1),
                FieldValue::Bool(true)
            ]
        ))
    );
}

#[test]
fn range_operator_form_decodes() {
    let node = decode(json!({ "range": { "age": { "gte": 10, "lt": 20 } } }));

    assert_eq!(node, QueryNode::from(RangeQuery::new("age").gte(10).lt(20)));
}

#[test]
fn range_operator_form_rejects_unknown_operators() {
    let err = decode_err(json!({ "range": { "age": { "near": 10 } } }));

    assert_eq!(
        err,
        ParseError::UnexpectedField {
            path: "range.age.near".to_string()
        }
    );
}

#[test]
fn prefix_short_forms_decode() {
    assert_eq!(
        decode(json!({ "prefix": { "user": "ki" } })),
        QueryNode::from(PrefixQuery::new("user", "ki"))
    );
    assert_eq!(
        decode(json!({ "prefix": { "user": { "value": "ki", "rewrite": "constant" } } })),
        QueryNode::from(PrefixQuery::new("user", "ki").rewrite("constant"))
    );
}

#[test]
fn ids_accept_type_alias_and_bare_strings() {
    assert_eq!(
        decode(json!({ "ids": { "type": "alpha", "values": "1" } })),
        QueryNode::from(IdsQuery::new(["1"]).types(["alpha"]))
    );
}

#[test]
fn bool_accepts_single_clause_objects_and_numeric_msm() {
    let node = decode(json!({
        "bool": {
            "must": { "match_all": {} },
            "minimum_should_match": 2
        }
    }));

    assert_eq!(
        node,
        QueryNode::from(
            BoolQuery::new()
                .must(MatchAllQuery::new())
                .minimum_should_match("2")
        )
    );
}

#[test]
fn unsupported_variants_accept_and_discard_boost_and_name() {
    let node = decode(json!({ "match_none": { "boost": 2.0, "_name": "x" } }));

    assert_eq!(node, QueryNode::from(MatchNoneQuery::new()));
    assert_eq!(node.name(), None);
}

#[test]
fn text_decoding_reports_malformed_input() {
    let err = from_json_str("{ \"term\": ").expect_err("truncated text");

    assert!(matches!(err, ParseError::Malformed { .. }));
    assert_eq!(err.path(), "");
}

#[test]
fn unknown_query_type_reports_its_path() {
    let err = decode_err(json!({ "bool": { "must": [ { "match_all": {} }, { "fuzzy": {} } ] } }));

    assert_eq!(
        err,
        ParseError::UnknownQuery {
            path: "bool.must[1]".to_string(),
            type_id: "fuzzy".to_string()
        }
    );
}

#[test]
fn outer_object_must_hold_exactly_one_key() {
    assert_eq!(
        decode_err(json!({})),
        ParseError::ExpectedSingleKey {
            path: String::new(),
            found: 0
        }
    );
    assert_eq!(
        decode_err(json!({ "match_all": {}, "match_none": {} })),
        ParseError::ExpectedSingleKey {
            path: String::new(),
            found: 2
        }
    );
    assert_eq!(
        decode_err(json!([])),
        ParseError::NotAnObject {
            path: String::new()
        }
    );
}

#[test]
fn field_errors_carry_dotted_paths() {
    assert_eq!(
        decode_err(json!({ "exists": {} })),
        ParseError::MissingField {
            path: "exists.field".to_string()
        }
    );
    assert_eq!(
        decode_err(json!({ "exists": { "field": "a", "extra": 1 } })),
        ParseError::UnexpectedField {
            path: "exists.extra".to_string()
        }
    );
    assert_eq!(
        decode_err(json!({ "term": { "field": "a", "value": "b", "boost": "high" } })),
        ParseError::InvalidType {
            path: "term.boost".to_string(),
            expected: "a number"
        }
    );
    assert_eq!(
        decode_err(json!({ "terms": { "field": "a", "values": ["x", {}] } })),
        ParseError::InvalidType {
            path: "terms.values[1]".to_string(),
            expected: "a string, number, or boolean"
        }
    );
}

#[test]
fn field_key_always_selects_the_long_form() {
    let err = decode_err(json!({ "term": { "field": "x" } }));
    assert!(matches!(err, ParseError::MissingField { ref path } if path == "term.value"));

    let err = decode_err(json!({ "prefix": { "field": "ab" } }));
    assert!(matches!(err, ParseError::MissingField { ref path } if path == "prefix.value"));

    assert_eq!(
        decode(json!({ "term": { "field": "field", "value": "x" } })),
        QueryNode::from(TermQuery::new("field", "x"))
    );
}

#[test]
fn double_literals_survive_the_text_form() {
    for value in [994.141_423_413_993_5, 0.1 + 0.2, 5e-324, f64::MAX, -1.0 / 3.0] {
        let node = QueryNode::from(TermQuery::new("f", value));
        let text = to_json_string(&node);

        assert_eq!(from_json_str(&text).expect("text decodes"), node, "{text}");
    }
}

#[test]
fn declarative_nesting_is_bounded() {
    decode(nested_constant_score_json(64));

    let err = decode_err(nested_constant_score_json(65));
    assert!(matches!(err, ParseError::NestingTooDeep { max: 64, .. }));
}

//
// wire
//

#[test]
fn match_none_writes_only_its_type_id() {
    let bytes = to_wire(&QueryNode::from(MatchNoneQuery::new()));

    assert_eq!(bytes, b"\x0amatch_none".to_vec());
}

#[test]
fn match_all_writes_default_boost_and_absent_name() {
    let bytes = to_wire(&QueryNode::from(MatchAllQuery::new()));

    let mut expected = b"\x09match_all".to_vec();
    expected.extend_from_slice(&1.0f32.to_bits().to_be_bytes());
    expected.push(0);
    assert_eq!(bytes, expected);
}

#[test]
fn wire_round_trips_a_nested_tree() {
    let node: QueryNode = BoolQuery::new()
        .must(QueryNode::from(TermQuery::new("user", "kimchy")).with_name("who"))
        .filter(RangeQuery::new("age").gte(10).lt(20).format("epoch_millis"))
        .should(TermsQuery::new("tags", [1.5, -2.0]))
        .must_not(ConstantScoreQuery::new(TypeQuery::new("alpha")))
        .minimum_should_match("75%")
        .disable_coord(true)
        .into();
    let node = node.with_boost(0.5);

    assert_eq!(from_wire(&to_wire(&node)).expect("round trip"), node);
}

#[test]
fn trailing_bytes_are_rejected() {
    let mut bytes = to_wire(&QueryNode::from(MatchNoneQuery::new()));
    bytes.extend_from_slice(&[0, 0]);

    assert_eq!(
        from_wire(&bytes),
        Err(WireError::TrailingBytes { remaining: 2 })
    );
}

#[test]
fn unknown_wire_type_is_fatal() {
    let err = from_wire(b"\x05fuzzy").expect_err("unregistered type id");

    assert_eq!(
        err,
        WireError::UnknownNodeType {
            type_id: "fuzzy".to_string()
        }
    );
    assert!(err.is_fatal());
}

#[test]
fn truncated_wire_input_reports_eof() {
    let bytes = to_wire(&QueryNode::from(TermQuery::new("user", "kimchy")));
    let err = from_wire(&bytes[..bytes.len() - 3]).expect_err("truncated stream");

    assert!(matches!(err, WireError::UnexpectedEof { .. }));
}

#[test]
fn wire_nesting_is_bounded() {
    from_wire(&to_wire(&nested_constant_score(64))).expect("64 levels decode");

    let err = from_wire(&to_wire(&nested_constant_score(65))).expect_err("65 levels");
    assert_eq!(err, WireError::NestingTooDeep { max: 64 });
}

proptest! {
    #[test]
    fn declarative_round_trip_is_lossless(node in arb_node()) {
        let decoded = from_json(&to_json(&node)).expect("encoded node decodes");
        prop_assert_eq!(decoded, node);
    }

    #[test]
    fn declarative_text_round_trip_is_lossless(node in arb_node()) {
        let decoded = from_json_str(&to_json_string(&node)).expect("encoded text decodes");
        prop_assert_eq!(decoded, node);
    }

    #[test]
    fn any_finite_double_survives_the_text_form(
        value in any::<f64>().prop_filter("finite", |d| d.is_finite()),
    ) {
        let node = QueryNode::from(RangeQuery::new("f").gt(value).lte(value));
        let decoded = from_json_str(&to_json_string(&node)).expect("encoded text decodes");
        prop_assert_eq!(decoded, node);
    }

    #[test]
    fn wire_round_trip_is_lossless(node in arb_node()) {
        let decoded = from_wire(&to_wire(&node)).expect("encoded node decodes");
        prop_assert_eq!(decoded.stable_hash(), node.stable_hash());
        prop_assert_eq!(decoded, node);
    }

    #[test]
    fn every_strict_prefix_of_the_wire_form_fails(node in arb_node()) {
        let bytes = to_wire(&node);
        for end in 0..bytes.len() {
            prop_assert!(from_wire(&bytes[..end]).is_err());
        }
    }
}
