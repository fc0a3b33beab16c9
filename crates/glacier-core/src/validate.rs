use crate::{codec::wire::MAX_NESTING_DEPTH, node::QueryNode, value::FieldValue};
use derive_more::{Deref, IntoIterator};
use std::fmt;
use thiserror::Error as ThisError;

///
/// Validation
///
/// Structural well-formedness of a node tree. Validation never fails fast:
/// every independently violated rule contributes exactly one error, and the
/// caller decides policy from the full list.
///

///
/// ValidationRule
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ValidationRule {
    BoostNotPositive,
    NestingTooDeep,
    FieldNameEmpty,
    DoubleNotFinite,
    TermsValuesEmpty,
    PrefixValueEmpty,
    RangeFormatEmpty,
    IdsValuesEmpty,
    IdsTypeNameEmpty,
    TypeNameEmpty,
    MinimumShouldMatchInvalid,
    WrapperSourceEmpty,
}

impl ValidationRule {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BoostNotPositive => "boost_not_positive",
            Self::NestingTooDeep => "nesting_too_deep",
            Self::FieldNameEmpty => "field_name_empty",
            Self::DoubleNotFinite => "double_not_finite",
            Self::TermsValuesEmpty => "terms_values_empty",
            Self::PrefixValueEmpty => "prefix_value_empty",
            Self::RangeFormatEmpty => "range_format_empty",
            Self::IdsValuesEmpty => "ids_values_empty",
            Self::IdsTypeNameEmpty => "ids_type_name_empty",
            Self::TypeNameEmpty => "type_name_empty",
            Self::MinimumShouldMatchInvalid => "minimum_should_match_invalid",
            Self::WrapperSourceEmpty => "wrapper_source_empty",
        }
    }
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// ValidationError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("[{path}] {rule}: {message}")]
pub struct ValidationError {
    pub path: String,
    pub rule: ValidationRule,
    pub message: String,
}

///
/// ValidationErrors
///

#[derive(Clone, Debug, Default, Deref, Eq, IntoIterator, PartialEq, ThisError)]
#[error("{} validation error(s)", .0.len())]
pub struct ValidationErrors(#[into_iterator(owned, ref)] Vec<ValidationError>);

impl ValidationErrors {
    /// Convert into a `Result`, failing when any rule was violated.
    pub fn into_result(self) -> Result<(), Self> {
        if self.0.is_empty() { Ok(()) } else { Err(self) }
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<ValidationError> {
        self.0
    }

    #[must_use]
    pub fn count(&self, rule: ValidationRule) -> usize {
        self.0.iter().filter(|err| err.rule == rule).count()
    }
}

///
/// ValidationReport
///
/// Collector handed to each variant. Tracks the node path so nested errors
/// are reported as `bool.must[1].term.field`.
///

#[derive(Debug, Default)]
pub struct ValidationReport {
    path: Vec<String>,
    errors: Vec<ValidationError>,
    depth: usize,
    too_deep: bool,
}

impl ValidationReport {
    /// Record one violated rule at `field` of the current node.
    pub fn violation(&mut self, field: &str, rule: ValidationRule, message: impl Into<String>) {
        let mut path = self.path.join(".");
        if !field.is_empty() {
            if !path.is_empty() {
                path.push('.');
            }
            path.push_str(field);
        }

        self.errors.push(ValidationError {
            path,
            rule,
            message: message.into(),
        });
    }

    /// Record a non-finite double among `values` once, at `field`.
    pub fn finite_values<'a>(
        &mut self,
        field: &str,
        values: impl IntoIterator<Item = &'a FieldValue>,
    ) {
        if let Some(value) = values.into_iter().find(|value| !value.is_finite()) {
            self.violation(
                field,
                ValidationRule::DoubleNotFinite,
                format!("double literals must be finite, got {value}"),
            );
        }
    }

    /// Validate a child node under `segment` of the current node.
    pub fn child(&mut self, segment: impl Into<String>, node: &QueryNode) {
        self.path.push(segment.into());
        validate_node(node, self);
        self.path.pop();
    }

    #[must_use]
    pub fn finish(self) -> ValidationErrors {
        ValidationErrors(self.errors)
    }
}

/// Validate a node tree.
#[must_use]
pub fn validate(node: &QueryNode) -> ValidationErrors {
    let mut report = ValidationReport::default();
    validate_node(node, &mut report);

    report.finish()
}

fn validate_node(node: &QueryNode, report: &mut ValidationReport) {
    report.path.push(node.type_id().to_string());

    // both codecs stop at MAX_NESTING_DEPTH nodes; deeper trees report once
    if report.depth >= MAX_NESTING_DEPTH {
        if !report.too_deep {
            report.too_deep = true;
            report.violation(
                "",
                ValidationRule::NestingTooDeep,
                format!("node trees may nest at most {MAX_NESTING_DEPTH} levels"),
            );
        }
        report.path.pop();
        return;
    }
    report.depth += 1;

    if node.supports_boost_and_name() && !node.boost().is_valid() {
        report.violation(
            "boost",
            ValidationRule::BoostNotPositive,
            format!("boost must be finite and positive, got {}", node.boost()),
        );
    }
    node.validate_body(report);

    report.depth -= 1;
    report.path.pop();
}

impl QueryNode {
    /// Structural validation; empty iff the node is well-formed.
    #[must_use]
    pub fn validate(&self) -> ValidationErrors {
        validate(self)
    }
}

///
/// TESTS
///
