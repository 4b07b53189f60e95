use crate::errors::{RangeViolation, ValidationError};
use crate::features::{FeatureField, FeatureVector, FEATURE_COUNT};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Untyped request payload: a JSON object keyed by field name.
pub type RawInput = Map<String, Value>;

/// Build a `RawInput` from string pairs, as received in a query string.
pub fn raw_input_from_pairs(pairs: &HashMap<String, String>) -> RawInput {
    pairs
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect()
}

/// Validate an untyped payload into a `FeatureVector`.
///
/// Checks run in three stages and stop at the first stage that fails:
/// presence of every required key, numeric parsing of every value, then range
/// checks. Range violations are collected across all fields before returning.
pub fn validate(raw: &RawInput) -> Result<FeatureVector, ValidationError> {
    let missing: Vec<FeatureField> = FeatureField::ALL
        .into_iter()
        .filter(|field| !raw.contains_key(field.key()))
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields { fields: missing });
    }

    let mut values = [0.0; FEATURE_COUNT];
    for field in FeatureField::ALL {
        values[field.index()] =
            parse_number(&raw[field.key()]).ok_or(ValidationError::NonNumeric)?;
    }

    let violations: Vec<RangeViolation> = FeatureField::ALL
        .into_iter()
        .filter_map(|field| {
            let value = values[field.index()];
            let bounds = field.bounds();
            (!bounds.contains(value)).then(|| RangeViolation {
                field,
                value,
                rule: bounds.rule(),
            })
        })
        .collect();
    if !violations.is_empty() {
        return Err(ValidationError::OutOfRange { violations });
    }

    Ok(FeatureVector::from_array(values))
}

/// Numbers pass through; strings are trimmed and parsed. Anything that is not
/// a finite real is rejected.
fn parse_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rice_input() -> RawInput {
        json!({
            "N": 90, "P": 40, "K": 40,
            "temperature": 21.5, "humidity": 82, "ph": 6.5, "rainfall": 202
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn valid_input_is_echoed_exactly() {
        let fv = validate(&rice_input()).unwrap();
        assert_eq!(
            fv.to_array(),
            [90.0, 40.0, 40.0, 21.5, 82.0, 6.5, 202.0]
        );
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let mut raw = rice_input();
        raw.insert("N".into(), json!(" 90.0 "));
        raw.insert("ph".into(), json!("6.5"));
        let fv = validate(&raw).unwrap();
        assert_eq!(fv.nitrogen, 90.0);
        assert_eq!(fv.ph, 6.5);
    }

    #[test]
    fn bounds_are_inclusive() {
        let mut raw = rice_input();
        raw.insert("N".into(), json!(0));
        raw.insert("P".into(), json!(145));
        raw.insert("ph".into(), json!(3.5));
        raw.insert("rainfall".into(), json!(300));
        assert!(validate(&raw).is_ok());
    }

    #[test]
    fn single_missing_field_is_named_alone() {
        let mut raw = rice_input();
        raw.remove("temperature");
        assert_eq!(
            validate(&raw),
            Err(ValidationError::MissingFields {
                fields: vec![FeatureField::Temperature]
            })
        );
    }

    #[test]
    fn all_missing_fields_are_named_in_canonical_order() {
        let raw = json!({ "N": 90, "P": 40 }).as_object().cloned().unwrap();
        let err = validate(&raw).unwrap_err();
        assert_eq!(
            err.fields(),
            vec![
                FeatureField::Potassium,
                FeatureField::Temperature,
                FeatureField::Humidity,
                FeatureField::Ph,
                FeatureField::Rainfall,
            ]
        );
    }

    #[test]
    fn missing_check_runs_before_type_check() {
        let mut raw = rice_input();
        raw.insert("N".into(), json!("not_a_number"));
        raw.remove("rainfall");
        assert!(matches!(
            validate(&raw),
            Err(ValidationError::MissingFields { .. })
        ));
    }

    #[test]
    fn non_numeric_values_are_reported_generically() {
        for bad in [json!("not_a_number"), json!(null), json!(true), json!([1]), json!("NaN"), json!("inf")] {
            let mut raw = rice_input();
            raw.insert("N".into(), bad);
            assert_eq!(validate(&raw), Err(ValidationError::NonNumeric));
        }
    }

    #[test]
    fn type_check_runs_before_range_check() {
        let mut raw = rice_input();
        raw.insert("N".into(), json!(500));
        raw.insert("K".into(), json!("abc"));
        assert_eq!(validate(&raw), Err(ValidationError::NonNumeric));
    }

    #[test]
    fn high_nitrogen_is_rejected_with_its_rule() {
        let mut raw = rice_input();
        raw.insert("N".into(), json!(200));
        match validate(&raw) {
            Err(ValidationError::OutOfRange { violations }) => {
                assert_eq!(violations.len(), 1);
                assert_eq!(violations[0].field, FeatureField::Nitrogen);
                assert_eq!(violations[0].value, 200.0);
                assert!(violations[0].to_string().contains("0-140"));
            }
            other => panic!("expected range error, got {other:?}"),
        }
    }

    #[test]
    fn every_range_violation_is_collected() {
        let mut raw = rice_input();
        raw.insert("N".into(), json!(200));
        raw.insert("temperature".into(), json!(0));
        raw.insert("ph".into(), json!(10));
        let err = validate(&raw).unwrap_err();
        assert_eq!(
            err.fields(),
            vec![
                FeatureField::Nitrogen,
                FeatureField::Temperature,
                FeatureField::Ph
            ]
        );
    }

    #[test]
    fn extra_keys_are_ignored() {
        let mut raw = rice_input();
        raw.insert("expected_crop".into(), json!("Rice"));
        assert!(validate(&raw).is_ok());
    }

    #[test]
    fn query_pairs_become_string_values() {
        let pairs: HashMap<String, String> = [("N", "90"), ("ph", "6.5")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let raw = raw_input_from_pairs(&pairs);
        assert_eq!(raw["N"], json!("90"));
        assert_eq!(raw.len(), 2);
    }
}
