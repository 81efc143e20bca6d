//! Owned replacement values and their YAML rendering.

use crate::scalar::ScalarValue;
use std::collections::BTreeMap;
use std::fmt;

/// Any value that can be written into a document: a scalar, a sequence or a mapping
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum YamlValue {
    /// A scalar value (string, number, boolean, null)
    Scalar(ScalarValue),
    /// A sequence of values
    Sequence(Vec<YamlValue>),
    /// A mapping of key-value pairs, written in key order
    Mapping(BTreeMap<String, YamlValue>),
}

impl YamlValue {
    /// Create a scalar value
    pub fn scalar(value: impl Into<ScalarValue>) -> Self {
        YamlValue::Scalar(value.into())
    }

    /// Check if this is a scalar
    pub fn is_scalar(&self) -> bool {
        matches!(self, YamlValue::Scalar(_))
    }

    /// Check if this is a sequence
    pub fn is_sequence(&self) -> bool {
        matches!(self, YamlValue::Sequence(_))
    }

    /// Check if this is a mapping
    pub fn is_mapping(&self) -> bool {
        matches!(self, YamlValue::Mapping(_))
    }

    /// Get as scalar if this is a scalar
    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            YamlValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Get as sequence if this is a sequence
    pub fn as_sequence(&self) -> Option<&[YamlValue]> {
        match self {
            YamlValue::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    /// Short name of the value's kind, for messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            YamlValue::Scalar(_) => "scalar",
            YamlValue::Sequence(_) => "sequence",
            YamlValue::Mapping(_) => "mapping",
        }
    }

    /// Render on a single line: `[a, b]`, `{k: v}` or a scalar
    pub fn to_flow_string(&self) -> String {
        match self {
            YamlValue::Scalar(s) => s.to_yaml_string(),
            YamlValue::Sequence(seq) => {
                let items: Vec<String> = seq.iter().map(YamlValue::to_flow_string).collect();
                format!("[{}]", items.join(", "))
            }
            YamlValue::Mapping(map) => {
                let entries: Vec<String> = map
                    .iter()
                    .map(|(key, value)| {
                        format!(
                            "{}: {}",
                            ScalarValue::new(key.as_str()).to_yaml_string(),
                            value.to_flow_string()
                        )
                    })
                    .collect();
                format!("{{{}}}", entries.join(", "))
            }
        }
    }

    /// Render in block style with every line starting at column `indent`.
    ///
    /// Scalars and empty collections come out on one line without the indent.
    /// No trailing newline is written.
    pub fn to_block_string(&self, indent: usize) -> String {
        let mut out = String::new();
        self.write_block(&mut out, indent, false);
        out
    }

    /// Write `self` at `indent`. With `inline` set the first line continues
    /// whatever precedes it (`- ` of a compact entry) instead of starting a new one.
    fn write_block(&self, out: &mut String, indent: usize, inline: bool) {
        let pad = |out: &mut String, first: bool| {
            if !(first && inline) {
                out.push_str(&" ".repeat(indent));
            }
        };

        match self {
            YamlValue::Sequence(seq) if !seq.is_empty() => {
                for (i, item) in seq.iter().enumerate() {
                    if i > 0 {
                        out.push('\n');
                    }
                    pad(out, i == 0);
                    out.push_str("- ");
                    if item.is_block_collection() {
                        item.write_block(out, indent + 2, true);
                    } else {
                        out.push_str(&item.to_flow_string());
                    }
                }
            }
            YamlValue::Mapping(map) if !map.is_empty() => {
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        out.push('\n');
                    }
                    pad(out, i == 0);
                    out.push_str(&ScalarValue::new(key.as_str()).to_yaml_string());
                    out.push(':');
                    if value.is_block_collection() {
                        out.push('\n');
                        value.write_block(out, indent + 2, false);
                    } else {
                        out.push(' ');
                        out.push_str(&value.to_flow_string());
                    }
                }
            }
            other => out.push_str(&other.to_flow_string()),
        }
    }

    fn is_block_collection(&self) -> bool {
        match self {
            YamlValue::Scalar(_) => false,
            YamlValue::Sequence(seq) => !seq.is_empty(),
            YamlValue::Mapping(map) => !map.is_empty(),
        }
    }
}

impl fmt::Display for YamlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_flow_string())
    }
}

impl From<String> for YamlValue {
    fn from(value: String) -> Self {
        YamlValue::Scalar(ScalarValue::from(value))
    }
}

impl From<&str> for YamlValue {
    fn from(value: &str) -> Self {
        YamlValue::Scalar(ScalarValue::from(value))
    }
}

impl From<&String> for YamlValue {
    fn from(value: &String) -> Self {
        YamlValue::Scalar(ScalarValue::from(value.as_str()))
    }
}

impl From<i32> for YamlValue {
    fn from(value: i32) -> Self {
        YamlValue::Scalar(ScalarValue::from(value))
    }
}

impl From<i64> for YamlValue {
    fn from(value: i64) -> Self {
        YamlValue::Scalar(ScalarValue::from(value))
    }
}

impl From<f64> for YamlValue {
    fn from(value: f64) -> Self {
        YamlValue::Scalar(ScalarValue::from(value))
    }
}

impl From<bool> for YamlValue {
    fn from(value: bool) -> Self {
        YamlValue::Scalar(ScalarValue::from(value))
    }
}

impl From<&semver::Version> for YamlValue {
    fn from(value: &semver::Version) -> Self {
        YamlValue::Scalar(ScalarValue::from(value))
    }
}

impl From<ScalarValue> for YamlValue {
    fn from(value: ScalarValue) -> Self {
        YamlValue::Scalar(value)
    }
}

impl<T> From<Vec<T>> for YamlValue
where
    T: Into<YamlValue>,
{
    fn from(vec: Vec<T>) -> Self {
        YamlValue::Sequence(vec.into_iter().map(Into::into).collect())
    }
}

impl<K, V> From<BTreeMap<K, V>> for YamlValue
where
    K: Into<String>,
    V: Into<YamlValue>,
{
    fn from(map: BTreeMap<K, V>) -> Self {
        YamlValue::Mapping(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_value() {
        let val = YamlValue::from("hello");
        assert!(val.is_scalar());
        assert_eq!(val.to_block_string(4), "hello");
        assert_eq!(YamlValue::from(42).to_flow_string(), "42");
        assert_eq!(YamlValue::from(true).to_flow_string(), "true");
    }

    #[test]
    fn test_flow_sequence() {
        let val = YamlValue::from(vec!["stable", "stable-1.31"]);
        assert!(val.is_sequence());
        assert_eq!(val.to_flow_string(), "[stable, stable-1.31]");
        assert_eq!(val.to_string(), "[stable, stable-1.31]");

        let val = YamlValue::from(vec!["a, b", "c"]);
        assert_eq!(val.to_flow_string(), "['a, b', c]");

        assert_eq!(YamlValue::Sequence(vec![]).to_flow_string(), "[]");
    }

    #[test]
    fn test_block_sequence() {
        let val = YamlValue::from(vec!["item1", "item2"]);
        assert_eq!(val.to_block_string(0), "- item1\n- item2");
        assert_eq!(val.to_block_string(2), "  - item1\n  - item2");

        assert_eq!(YamlValue::Sequence(vec![]).to_block_string(2), "[]");
    }

    #[test]
    fn test_block_sequence_of_mappings() {
        let mut first = BTreeMap::new();
        first.insert("name", YamlValue::from("serving"));
        first.insert("version", YamlValue::from("1.31.0"));
        let mut second = BTreeMap::new();
        second.insert("name", YamlValue::from("eventing"));

        let val = YamlValue::from(vec![YamlValue::from(first), YamlValue::from(second)]);
        assert_eq!(
            val.to_block_string(2),
            "  - name: serving\n    version: 1.31.0\n  - name: eventing"
        );
    }

    #[test]
    fn test_nested_block_sequence() {
        let val = YamlValue::from(vec![
            YamlValue::from(vec!["a", "b"]),
            YamlValue::from("c"),
        ]);
        assert_eq!(val.to_block_string(0), "- - a\n  - b\n- c");
    }

    #[test]
    fn test_mapping_with_collections() {
        let mut map = BTreeMap::new();
        map.insert("features", YamlValue::from(vec!["auth", "logging"]));
        map.insert("name", YamlValue::from("app"));
        map.insert("empty", YamlValue::Sequence(vec![]));

        let val = YamlValue::from(map);
        assert_eq!(
            val.to_block_string(0),
            "empty: []\nfeatures:\n  - auth\n  - logging\nname: app"
        );
        assert_eq!(
            val.to_flow_string(),
            "{empty: [], features: [auth, logging], name: app}"
        );
        assert!(val.is_mapping());
        assert_eq!(val.kind_name(), "mapping");
    }
}
