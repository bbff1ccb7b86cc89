//! Resolution of template keys to roster columns.
//!
//! For each key, in order:
//! 1. an explicit mapping whose `template_key` matches case-insensitively;
//! 2. a roster column whose normalized name equals the normalized key;
//! 3. nothing, leaving the key unresolved.
//!
//! Every explicit mapping must name a column the roster has.

use crate::error::{ApiError, Result};
use crate::roster::Roster;
use common::model::mapping::{CsvMapping, ResolutionSource};
use common::model::template::{CertificateTemplate, TextBox};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub key: String,
    pub column: Option<usize>,
    pub source: ResolutionSource,
}

fn explicit_for<'a>(key: &str, mappings: &'a [CsvMapping]) -> Option<&'a CsvMapping> {
    let wanted = key.trim().to_lowercase();
    mappings
        .iter()
        .find(|m| m.template_key.trim().to_lowercase() == wanted)
}

fn missing_column(column: &str, roster: &Roster) -> ApiError {
    ApiError::MissingColumn {
        column: column.to_string(),
        available: roster.headers().to_vec(),
    }
}

/// Fails with `MissingColumn` on the first mapping naming an unknown column.
pub fn check_mappings(mappings: &[CsvMapping], roster: &Roster) -> Result<()> {
    for m in mappings {
        if roster.column_index(&m.csv_column).is_none() {
            return Err(missing_column(&m.csv_column, roster));
        }
    }
    Ok(())
}

pub fn resolve(keys: &[String], mappings: &[CsvMapping], roster: &Roster) -> Result<Vec<Binding>> {
    check_mappings(mappings, roster)?;
    let bindings = keys
        .iter()
        .map(|key| {
            if let Some(m) = explicit_for(key, mappings) {
                return Binding {
                    key: key.clone(),
                    column: roster.column_index(&m.csv_column),
                    source: ResolutionSource::Explicit,
                };
            }
            match roster.column_index(key) {
                Some(col) => Binding {
                    key: key.clone(),
                    column: Some(col),
                    source: ResolutionSource::Automatic,
                },
                None => Binding {
                    key: key.clone(),
                    column: None,
                    source: ResolutionSource::Unresolved,
                },
            }
        })
        .collect();
    Ok(bindings)
}

/// Keys that need a value: the template's boxes, or the mapped keys when
/// there is no template.
pub fn required_keys(template: Option<&CertificateTemplate>, mappings: &[CsvMapping]) -> Vec<String> {
    match template {
        Some(t) => t.keys(),
        None => {
            let mut keys: Vec<String> = Vec::new();
            for m in mappings {
                let key = m.template_key.trim();
                if !key.is_empty() && !keys.iter().any(|k| k.eq_ignore_ascii_case(key)) {
                    keys.push(key.to_string());
                }
            }
            keys
        }
    }
}

/// Values of one row keyed by template key. Unresolved keys are absent.
pub fn row_values(bindings: &[Binding], row: &[String]) -> HashMap<String, String> {
    bindings
        .iter()
        .filter_map(|b| {
            let col = b.column?;
            row.get(col).map(|v| (b.key.clone(), v.clone()))
        })
        .collect()
}

/// What each box will show for a row, including box defaults.
pub fn display_values(boxes: &[TextBox], values: &HashMap<String, String>) -> BTreeMap<String, String> {
    boxes
        .iter()
        .filter_map(|tb| {
            crate::render::resolve_text(tb, values.get(&tb.key).map(String::as_str))
                .map(|text| (tb.key.clone(), text))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Roster {
        Roster::parse(
            b"Full Name,Event Date,Email\nAda Lovelace,2025-01-01,ada@example.org\n",
            "r.csv",
        )
        .unwrap()
    }

    fn mapping(key: &str, column: &str) -> CsvMapping {
        CsvMapping {
            template_key: key.to_string(),
            csv_column: column.to_string(),
        }
    }

    #[test]
    fn test_explicit_beats_automatic() {
        let keys = vec!["EMAIL".to_string()];
        let b = resolve(&keys, &[mapping("email", "Full Name")], &roster()).unwrap();
        assert_eq!(b[0].source, ResolutionSource::Explicit);
        assert_eq!(b[0].column, Some(0));
    }

    #[test]
    fn test_automatic_uses_normalized_names() {
        let keys = vec!["FULL_NAME".to_string(), "event-date".to_string()];
        let b = resolve(&keys, &[], &roster()).unwrap();
        assert_eq!(b[0].column, Some(0));
        assert_eq!(b[0].source, ResolutionSource::Automatic);
        assert_eq!(b[1].column, Some(1));
    }

    #[test]
    fn test_unknown_key_is_unresolved() {
        let keys = vec!["COURSE".to_string()];
        let b = resolve(&keys, &[], &roster()).unwrap();
        assert_eq!(b[0].source, ResolutionSource::Unresolved);
        assert_eq!(b[0].column, None);
    }

    #[test]
    fn test_mapping_to_missing_column_fails() {
        let keys = vec!["NAME".to_string()];
        let err = resolve(&keys, &[mapping("NAME", "Surname")], &roster()).unwrap_err();
        match err {
            ApiError::MissingColumn { column, available } => {
                assert_eq!(column, "Surname");
                assert_eq!(available.len(), 3);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_required_keys_without_template_dedupes() {
        let keys = required_keys(None, &[mapping("NAME", "a"), mapping("name", "b"), mapping(" ", "c")]);
        assert_eq!(keys, vec!["NAME".to_string()]);
    }

    #[test]
    fn test_row_values_skip_unresolved() {
        let r = roster();
        let keys = vec!["FULL_NAME".to_string(), "COURSE".to_string()];
        let b = resolve(&keys, &[], &r).unwrap();
        let values = row_values(&b, r.row(0).unwrap());
        assert_eq!(values.get("FULL_NAME").map(String::as_str), Some("Ada Lovelace"));
        assert!(!values.contains_key("COURSE"));
    }
}
