//! Semi-structured metadata coercion
//!
//! A metadata cell is expected to hold a JSON document. Cells holding a dict literal
//! instead are parsed permissively and re-serialized as canonical JSON: `", "` between
//! items, `": "` between keys and values, key order preserved.

use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::Value;
use std::io;

use super::literal::parse_literal;
use super::repair::FieldRepair;

/// Coerce a raw metadata cell into JSON
pub fn coerce_metadata(raw: &str) -> FieldRepair {
    if raw.trim().is_empty() || serde_json::from_str::<Value>(raw).is_ok() {
        return FieldRepair::Unchanged;
    }

    match parse_literal(raw) {
        Ok(value) => match to_canonical_json(&value) {
            Ok(json) => FieldRepair::Repaired(json),
            Err(e) => FieldRepair::pass_through(format!("could not serialize metadata: {}", e)),
        },
        Err(e) => FieldRepair::pass_through(e.to_string()),
    }
}

/// Serialize a value as single-line JSON with spaced separators
pub fn to_canonical_json(value: &Value) -> serde_json::Result<String> {
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, SpacedFormatter);
    value.serialize(&mut serializer)?;
    // serde_json only ever writes valid UTF-8.
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Compact formatter that puts a space after `,` and `:`
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dict_literal_becomes_json() {
        assert_eq!(
            coerce_metadata("{'device':'mobile'}"),
            FieldRepair::Repaired(r#"{"device": "mobile"}"#.to_string())
        );
    }

    #[test]
    fn test_valid_json_is_unchanged() {
        assert_eq!(coerce_metadata(r#"{"device":"mobile"}"#), FieldRepair::Unchanged);
        assert_eq!(coerce_metadata(r#"{"device": "mobile", "n": [1, 2]}"#), FieldRepair::Unchanged);
        assert_eq!(coerce_metadata(""), FieldRepair::Unchanged);
    }

    #[test]
    fn test_unparseable_metadata_passes_through() {
        assert!(coerce_metadata("device=mobile").is_malformed());
        assert!(coerce_metadata("{'device': mobile}").is_malformed());
    }

    #[test]
    fn test_coerced_literal_parses_back_to_the_mapping() {
        let raw = "{'device': 'mobile', 'flags': ('a', 'b'), 'beta': True, 'ref': None, 'n': 3}";
        let FieldRepair::Repaired(json) = coerce_metadata(raw) else {
            panic!("expected a repair");
        };

        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            parsed,
            json!({"device": "mobile", "flags": ["a", "b"], "beta": true, "ref": null, "n": 3})
        );
        assert_eq!(
            json,
            r#"{"device": "mobile", "flags": ["a", "b"], "beta": true, "ref": null, "n": 3}"#
        );
    }

    #[test]
    fn test_coercion_is_idempotent() {
        let once = coerce_metadata("{'a': {'b': [1, 2]}}").resolve("{'a': {'b': [1, 2]}}".into());
        assert_eq!(coerce_metadata(&once), FieldRepair::Unchanged);
    }

    #[test]
    fn test_canonical_json_of_empty_containers() {
        assert_eq!(to_canonical_json(&json!({})).unwrap(), "{}");
        assert_eq!(to_canonical_json(&json!({"a": []})).unwrap(), r#"{"a": []}"#);
    }
}
