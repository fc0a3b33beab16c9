//! Module: compile::coerce
//! Responsibility: literal -> native term coercion against a field mapping.

use crate::{
    compile::{CompileError, NativeBound, NativeTerm},
    schema::{FieldMapping, FieldType},
    value::{FieldValue, Float64},
};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Range `format` that reads text bounds as epoch milliseconds.
pub const FORMAT_EPOCH_MILLIS: &str = "epoch_millis";

/// Range `format` that reads text bounds as epoch seconds.
pub const FORMAT_EPOCH_SECOND: &str = "epoch_second";

/// Coerce a term literal for `field`. Unmapped fields take the literal as text.
pub fn term_for(
    field: &str,
    mapping: Option<&FieldMapping>,
    value: &FieldValue,
) -> Result<NativeTerm, CompileError> {
    let Some(mapping) = mapping else {
        return Ok(NativeTerm::Text(value.to_string()));
    };

    if mapping.field_type == FieldType::Object {
        return Err(CompileError::NotQueryable {
            field: field.to_string(),
            field_type: mapping.field_type,
        });
    }

    coerce(mapping.field_type, value, None).map_err(|reason| CompileError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason,
    })
}

/// Coerce one range bound. An absent literal is an open bound.
pub fn bound_for(
    field: &str,
    mapping: Option<&FieldMapping>,
    value: Option<&FieldValue>,
    inclusive: bool,
    format: Option<&str>,
) -> Result<NativeBound, CompileError> {
    let mismatch = |field_type: FieldType| CompileError::RangeBoundMismatch {
        field: field.to_string(),
        value: value.map_or_else(|| "*".to_string(), ToString::to_string),
        field_type,
    };

    if let Some(mapping) = mapping
        && !mapping.field_type.is_orderable()
    {
        return Err(mismatch(mapping.field_type));
    }

    let Some(value) = value else {
        return Ok(NativeBound::Unbounded);
    };

    let term = match mapping {
        None => NativeTerm::Text(value.to_string()),
        Some(mapping) => {
            coerce(mapping.field_type, value, format).map_err(|_| mismatch(mapping.field_type))?
        }
    };

    Ok(if inclusive {
        NativeBound::Included(term)
    } else {
        NativeBound::Excluded(term)
    })
}

/// Prefix matching is defined on text only; unmapped fields are treated as text.
pub fn require_text(field: &str, mapping: Option<&FieldMapping>) -> Result<(), CompileError> {
    match mapping {
        Some(mapping) if mapping.field_type != FieldType::Text => Err(CompileError::NotQueryable {
            field: field.to_string(),
            field_type: mapping.field_type,
        }),
        _ => Ok(()),
    }
}

// Coercion failures carry a human reason; callers pick the error variant.
fn coerce(
    field_type: FieldType,
    value: &FieldValue,
    format: Option<&str>,
) -> Result<NativeTerm, String> {
    match field_type {
        FieldType::Text => Ok(NativeTerm::Text(value.to_string())),
        FieldType::Int => coerce_long(value).map(NativeTerm::Long),
        FieldType::Double => coerce_double(value).map(|v| NativeTerm::Double(Float64::new(v))),
        FieldType::Boolean => coerce_bool(value).map(NativeTerm::Bool),
        FieldType::Date => coerce_date(value, format).map(NativeTerm::DateMillis),
        FieldType::Object => Err("object fields hold no terms".to_string()),
    }
}

fn coerce_long(value: &FieldValue) -> Result<i64, String> {
    match value {
        FieldValue::Int(v) => Ok(*v),
        FieldValue::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| format!("'{s}' is not an integer")),
        other => Err(format!("{} literal is not an integer", other.family())),
    }
}

#[expect(clippy::cast_precision_loss)]
fn coerce_double(value: &FieldValue) -> Result<f64, String> {
    match value {
        FieldValue::Int(v) => Ok(*v as f64),
        FieldValue::Double(v) => Ok(v.get()),
        FieldValue::Text(s) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(format!("'{s}' is not a finite number")),
        },
        FieldValue::Bool(_) => Err("bool literal is not a number".to_string()),
    }
}

fn coerce_bool(value: &FieldValue) -> Result<bool, String> {
    match value {
        FieldValue::Bool(v) => Ok(*v),
        FieldValue::Text(s) if s == "true" => Ok(true),
        FieldValue::Text(s) if s == "false" => Ok(false),
        other => Err(format!("'{other}' is not a boolean")),
    }
}

fn coerce_date(value: &FieldValue, format: Option<&str>) -> Result<i64, String> {
    match (value, format) {
        (FieldValue::Int(secs), Some(FORMAT_EPOCH_SECOND)) => secs
            .checked_mul(1000)
            .ok_or_else(|| format!("{secs} seconds overflows the date range")),
        (FieldValue::Int(millis), _) => Ok(*millis),
        (FieldValue::Text(s), Some(FORMAT_EPOCH_MILLIS)) => s
            .trim()
            .parse()
            .map_err(|_| format!("'{s}' is not epoch milliseconds")),
        (FieldValue::Text(s), Some(FORMAT_EPOCH_SECOND)) => s
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(|secs| secs.checked_mul(1000))
            .ok_or_else(|| format!("'{s}' is not epoch seconds")),
        (FieldValue::Text(s), _) => parse_rfc3339_millis(s),
        (other, _) => Err(format!("{} literal is not a date", other.family())),
    }
}

/// Parse an RFC 3339 timestamp into epoch milliseconds.
pub fn parse_rfc3339_millis(text: &str) -> Result<i64, String> {
    let parsed = OffsetDateTime::parse(text.trim(), &Rfc3339)
        .map_err(|err| format!("'{text}' is not an RFC 3339 date: {err}"))?;

    i64::try_from(parsed.unix_timestamp_nanos() / 1_000_000)
        .map_err(|_| format!("'{text}' is outside the date range"))
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(field_type: FieldType) -> FieldMapping {
        FieldMapping {
            path: "f".to_string(),
            field_type,
        }
    }

    #[test]
    fn int_fields_accept_integral_text_only() {
        let int = mapping(FieldType::Int);

        assert_eq!(term_for("f", Some(&int), &FieldValue::Int(7)), Ok(NativeTerm::Long(7)));
        assert_eq!(term_for("f", Some(&int), &"42".into()), Ok(NativeTerm::Long(42)));
        assert!(matches!(
            term_for("f", Some(&int), &"4.2".into()),
            Err(CompileError::InvalidValue { .. })
        ));
        assert!(term_for("f", Some(&int), &FieldValue::double(1.0)).is_err());
    }

    #[test]
    fn double_fields_widen_ints_and_parse_text() {
        let double = mapping(FieldType::Double);

        assert_eq!(
            term_for("f", Some(&double), &FieldValue::Int(2)),
            Ok(NativeTerm::Double(Float64::new(2.0)))
        );
        assert_eq!(
            term_for("f", Some(&double), &"2.5".into()),
            Ok(NativeTerm::Double(Float64::new(2.5)))
        );
        assert!(term_for("f", Some(&double), &"inf".into()).is_err());
    }

    #[test]
    fn boolean_fields_accept_canonical_text() {
        let boolean = mapping(FieldType::Boolean);

        assert_eq!(term_for("f", Some(&boolean), &"true".into()), Ok(NativeTerm::Bool(true)));
        assert!(term_for("f", Some(&boolean), &"yes".into()).is_err());
    }

    #[test]
    fn dates_normalize_to_epoch_millis() {
        let date = mapping(FieldType::Date);

        assert_eq!(
            term_for("f", Some(&date), &"1970-01-01T00:00:01.5Z".into()),
            Ok(NativeTerm::DateMillis(1500))
        );
        assert_eq!(
            term_for("f", Some(&date), &FieldValue::Int(86_400_000)),
            Ok(NativeTerm::DateMillis(86_400_000))
        );
        assert!(term_for("f", Some(&date), &"yesterday".into()).is_err());
    }

    #[test]
    fn unmapped_fields_take_literals_as_text() {
        assert_eq!(
            term_for("f", None, &FieldValue::Int(3)),
            Ok(NativeTerm::Text("3".to_string()))
        );
    }

    #[test]
    fn object_fields_are_not_queryable() {
        let object = mapping(FieldType::Object);

        assert!(matches!(
            term_for("f", Some(&object), &"x".into()),
            Err(CompileError::NotQueryable { .. })
        ));
        assert!(require_text("f", Some(&object)).is_err());
        assert!(require_text("f", None).is_ok());
    }

    #[test]
    fn range_bounds_follow_inclusivity_and_format() {
        let date = mapping(FieldType::Date);

        assert_eq!(
            bound_for("f", Some(&date), Some(&"1000".into()), false, Some(FORMAT_EPOCH_MILLIS)),
            Ok(NativeBound::Excluded(NativeTerm::DateMillis(1000)))
        );
        assert_eq!(
            bound_for("f", Some(&date), Some(&FieldValue::Int(2)), true, Some(FORMAT_EPOCH_SECOND)),
            Ok(NativeBound::Included(NativeTerm::DateMillis(2000)))
        );
        assert_eq!(
            bound_for("f", Some(&date), None, true, None),
            Ok(NativeBound::Unbounded)
        );
    }

    #[test]
    fn range_on_unordered_or_mismatched_bounds_fails() {
        let boolean = mapping(FieldType::Boolean);
        let int = mapping(FieldType::Int);

        assert!(matches!(
            bound_for("f", Some(&boolean), None, true, None),
            Err(CompileError::RangeBoundMismatch { .. })
        ));
        assert!(matches!(
            bound_for("f", Some(&int), Some(&"abc".into()), true, None),
            Err(CompileError::RangeBoundMismatch { .. })
        ));
    }
}
