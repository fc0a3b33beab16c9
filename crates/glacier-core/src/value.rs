use crate::validate::{ValidationError, ValidationRule};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    hash::{Hash, Hasher},
};

///
/// Boost
///
/// Multiplicative weight carried by a query node into its compiled form.
/// Equality and hashing are bitwise so boosts can live inside `Eq + Hash`
/// node types; the only canonicalisation applied is `-0.0 -> 0.0`.
///
/// Decoders keep whatever value arrived on the wire or in the declarative
/// body; well-formedness (finite, positive) is reported by `validate`.
///

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Boost(f32);

impl Boost {
    pub const DEFAULT: Self = Self(1.0);

    /// Checked constructor: the boost must be finite and positive.
    pub fn new(value: f32) -> Result<Self, ValidationError> {
        let boost = Self(value);
        if boost.is_valid() {
            Ok(boost)
        } else {
            Err(ValidationError {
                path: "boost".to_string(),
                rule: ValidationRule::BoostNotPositive,
                message: format!("boost must be finite and positive, got {value}"),
            })
        }
    }

    /// Wrap a raw boost without checking it.
    #[must_use]
    pub const fn from_raw(value: f32) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> f32 {
        self.0
    }

    #[must_use]
    pub fn is_default(self) -> bool {
        self == Self::DEFAULT
    }

    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0.is_finite() && self.0 > 0.0
    }

    const fn canonical_bits(self) -> u32 {
        if self.0 == 0.0 { 0 } else { self.0.to_bits() }
    }
}

impl Default for Boost {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl PartialEq for Boost {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_bits() == other.canonical_bits()
    }
}

impl Eq for Boost {}

impl Hash for Boost {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_bits().hash(state);
    }
}

impl fmt::Display for Boost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<f32> for Boost {
    fn from(value: f32) -> Self {
        Self(value)
    }
}

///
/// Float64
///
/// `f64` with bitwise equality/hash, used for double literals and compiled
/// double terms.
///

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Float64(f64);

impl Float64 {
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }

    const fn canonical_bits(self) -> u64 {
        if self.0 == 0.0 { 0 } else { self.0.to_bits() }
    }
}

impl PartialEq for Float64 {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_bits() == other.canonical_bits()
    }
}

impl Eq for Float64 {}

impl Hash for Float64 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_bits().hash(state);
    }
}

impl fmt::Display for Float64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<f64> for Float64 {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

///
/// FieldValue
///
/// Scalar literal referenced by term-level queries. Dates travel as text
/// (RFC 3339) or as epoch milliseconds in `Int`; interpretation happens at
/// compile time against the field mapping.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Double(Float64),
    Bool(bool),
}

impl FieldValue {
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    #[must_use]
    pub const fn double(value: f64) -> Self {
        Self::Double(Float64::new(value))
    }

    /// False only for NaN and infinite doubles, which have no declarative form.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        match self {
            Self::Double(v) => v.get().is_finite(),
            _ => true,
        }
    }

    /// Stable wire tag for this literal family.
    #[must_use]
    pub const fn tag(&self) -> u8 {
        match self {
            Self::Text(_) => 0,
            Self::Int(_) => 1,
            Self::Double(_) => 2,
            Self::Bool(_) => 3,
        }
    }

    #[must_use]
    pub const fn family(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Int(_) => "int",
            Self::Double(_) => "double",
            Self::Bool(_) => "bool",
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(v) => f.write_str(v),
            Self::Int(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::double(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::{Boost, FieldValue, Float64};
    use std::collections::HashSet;

    #[test]
    fn boost_equality_is_bitwise_with_signed_zero_folded() {
        assert_eq!(Boost::from_raw(0.0), Boost::from_raw(-0.0));
        assert_ne!(Boost::from_raw(1.0), Boost::from_raw(1.000_001));
        assert_eq!(Boost::from_raw(f32::NAN), Boost::from_raw(f32::NAN));
    }

    #[test]
    fn boost_validity_rejects_non_positive_and_non_finite() {
        assert!(Boost::DEFAULT.is_valid());
        assert!(!Boost::from_raw(0.0).is_valid());
        assert!(!Boost::from_raw(-2.0).is_valid());
        assert!(!Boost::from_raw(f32::INFINITY).is_valid());
        assert!(!Boost::from_raw(f32::NAN).is_valid());
    }

    #[test]
    fn checked_boost_reports_the_violated_rule() {
        assert_eq!(Boost::new(2.5).expect("valid boost").get(), 2.5);

        let err = Boost::new(0.0).expect_err("zero boost is invalid");
        assert_eq!(err.rule, crate::validate::ValidationRule::BoostNotPositive);
    }

    #[test]
    fn field_values_hash_consistently_with_equality() {
        let mut set = HashSet::new();
        set.insert(FieldValue::double(1.5));
        set.insert(FieldValue::Double(Float64::new(1.5)));
        set.insert(FieldValue::Int(1));
        set.insert(FieldValue::text("1"));

        assert_eq!(set.len(), 3, "equal literals must collapse in a hash set");
    }
}
