use crate::{
    node::{
        BoolQuery, ConstantScoreQuery, ExistsQuery, IdsQuery, MatchAllQuery, MatchNoneQuery,
        PrefixQuery, QueryKind, QueryNode, RangeQuery, TermQuery, TermsQuery, TypeQuery,
        WrapperQuery,
    },
    test_fixtures::strategy::arb_node,
    value::{Boost, FieldValue},
};
use proptest::prelude::*;
use std::collections::HashSet;

fn sample_bool() -> QueryNode {
    BoolQuery::new()
        .must(TermQuery::new("user", "kimchy"))
        .filter(RangeQuery::new("age").gte(10).lt(20))
        .should(ExistsQuery::new("title"))
        .must_not(PrefixQuery::new("user", "ki"))
        .minimum_should_match("1")
        .into()
}

#[test]
fn kind_type_ids_round_trip() {
    for kind in QueryKind::ALL {
        assert_eq!(QueryKind::from_type_id(kind.type_id()), Some(kind));
    }
    assert_eq!(QueryKind::from_type_id("fuzzy"), None);
}

#[test]
fn only_match_none_and_wrapper_lack_boost_support() {
    let unsupported: Vec<_> = QueryKind::ALL
        .into_iter()
        .filter(|kind| !kind.supports_boost_and_name())
        .collect();

    assert_eq!(unsupported, vec![QueryKind::MatchNone, QueryKind::Wrapper]);
}

#[test]
fn new_nodes_carry_default_boost_and_no_name() {
    let node = QueryNode::from(TermQuery::new("user", "kimchy"));

    assert_eq!(node.boost(), Boost::DEFAULT);
    assert_eq!(node.name(), None);
    assert_eq!(node.kind(), QueryKind::Term);
    assert_eq!(node.type_id(), "term");
}

#[test]
fn boost_and_name_setters_apply_to_supported_variants() {
    let node = QueryNode::from(MatchAllQuery::new())
        .with_boost(2.5)
        .with_name("everything");

    assert_eq!(node.boost().get(), 2.5);
    assert_eq!(node.name(), Some("everything"));
    assert_eq!(node.clone().without_name().name(), None);
}

#[test]
fn boost_and_name_setters_are_ignored_by_unsupported_variants() {
    for node in [
        QueryNode::from(MatchNoneQuery::new()),
        QueryNode::from(WrapperQuery::new("{\"match_all\":{}}")),
    ] {
        let touched = node.clone().with_boost(4.0).with_name("ignored");

        assert_eq!(touched.boost(), Boost::DEFAULT);
        assert_eq!(touched.name(), None);
        assert_eq!(touched, node);
    }
}

#[test]
fn equality_covers_body_boost_and_name() {
    let base = QueryNode::from(TermQuery::new("user", "kimchy"));

    assert_eq!(base, QueryNode::from(TermQuery::new("user", "kimchy")));
    assert_ne!(base, QueryNode::from(TermQuery::new("user", "other")));
    assert_ne!(base, base.clone().with_boost(2.0));
    assert_ne!(base, base.clone().with_name("n"));
    assert_eq!(base.clone().with_boost(1.0), base);
}

#[test]
fn literal_families_are_distinct() {
    assert_ne!(
        QueryNode::from(TermQuery::new("age", 1)),
        QueryNode::from(TermQuery::new("age", "1"))
    );
    assert_ne!(
        QueryNode::from(TermQuery::new("age", 1)),
        QueryNode::from(TermQuery::new("age", 1.0))
    );
}

#[test]
fn clause_order_is_significant() {
    let ab: QueryNode = BoolQuery::new()
        .must(TermQuery::new("a", 1))
        .must(TermQuery::new("b", 2))
        .into();
    let ba: QueryNode = BoolQuery::new()
        .must(TermQuery::new("b", 2))
        .must(TermQuery::new("a", 1))
        .into();

    assert_ne!(ab, ba);
    assert_ne!(ab.stable_hash(), ba.stable_hash());
}

#[test]
fn equal_nodes_collapse_in_hash_sets() {
    let mut set = HashSet::new();
    set.insert(sample_bool());
    set.insert(sample_bool());
    set.insert(sample_bool().with_boost(2.0));

    assert_eq!(set.len(), 2);
}

#[test]
fn stable_hash_agrees_with_equality() {
    assert_eq!(sample_bool().stable_hash(), sample_bool().stable_hash());
    assert_ne!(
        sample_bool().stable_hash(),
        sample_bool().with_name("x").stable_hash()
    );
}

#[test]
fn range_builders_set_bounds_and_inclusivity() {
    let range = RangeQuery::new("age").gt(10).lte(20);

    assert_eq!(range.from, Some(FieldValue::Int(10)));
    assert!(!range.include_lower);
    assert_eq!(range.to, Some(FieldValue::Int(20)));
    assert!(range.include_upper);
    assert_eq!(range.format, None);

    let open = RangeQuery::new("age");
    assert!(open.include_lower && open.include_upper);
    assert!(open.from.is_none() && open.to.is_none());
}

#[test]
fn builders_accept_mixed_literals() {
    let terms = TermsQuery::new("tags", ["a", "b"]);
    assert_eq!(terms.values, vec![FieldValue::text("a"), FieldValue::text("b")]);

    let ids = IdsQuery::new(["1", "2"]).types(["alpha"]);
    assert_eq!(ids.types, vec!["alpha".to_string()]);
    assert_eq!(ids.values.len(), 2);

    let wrapped = ConstantScoreQuery::new(TypeQuery::new("alpha"));
    assert_eq!(wrapped.filter.kind(), QueryKind::Type);
}

#[test]
fn empty_bool_has_no_clauses() {
    assert!(!BoolQuery::new().has_clauses());
    assert!(BoolQuery::new().should(MatchAllQuery::new()).has_clauses());
}

#[test]
fn display_renders_declarative_text() {
    let node = QueryNode::from(ExistsQuery::new("title"));

    assert_eq!(node.to_string(), r#"{"exists":{"field":"title"}}"#);
}

proptest! {
    #[test]
    fn clones_are_equal_and_hash_alike(node in arb_node()) {
        let copy = node.clone();
        prop_assert_eq!(node.stable_hash(), copy.stable_hash());
        prop_assert_eq!(node, copy);
    }

    #[test]
    fn renaming_changes_identity_of_supported_variants(node in arb_node()) {
        let renamed = node.clone().with_name("__renamed__");
        if node.supports_boost_and_name() && node.name() != Some("__renamed__") {
            prop_assert_ne!(&renamed, &node);
            prop_assert_ne!(renamed.stable_hash(), node.stable_hash());
        } else if !node.supports_boost_and_name() {
            prop_assert_eq!(renamed, node);
        }
    }
}
