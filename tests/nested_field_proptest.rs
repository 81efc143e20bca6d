//! Property-based tests for the nested field setter.

use proptest::prelude::*;
use rowan::ast::AstNode;
use std::collections::BTreeMap;
use std::str::FromStr;
use yaml_bump::{FieldPath, MissingField, ScalarValue, Sequence, Yaml};

fn key() -> impl Strategy<Value = String> {
    "[a-z][a-z_]{0,7}"
}

fn value() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ._-]{0,16}"
}

fn fields() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map(key(), value(), 1..6)
}

/// A document with the given top-level fields, a comment and a nested section.
fn render(fields: &BTreeMap<String, String>) -> String {
    let mut text = String::from("# generated\n");
    for (key, value) in fields {
        text.push_str(&format!(
            "{}: {}  # {}\n",
            ScalarValue::new(key.as_str()),
            ScalarValue::new(value.as_str()),
            key
        ));
    }
    text.push_str("section-x:\n  inner: fixed\n");
    text
}

fn path(keys: &[&str]) -> FieldPath {
    FieldPath::new(keys.iter().copied()).unwrap()
}

proptest! {
    #[test]
    fn rendered_documents_round_trip(fields in fields()) {
        let text = render(&fields);
        let yaml = Yaml::from_str(&text).unwrap();
        prop_assert_eq!(yaml.to_string(), text);
        for (key, value) in &fields {
            prop_assert_eq!(yaml.get_nested_string(&path(&[key.as_str()])), Some(value.clone()));
        }
    }

    #[test]
    fn set_scalar_reads_back(
        fields in fields(),
        index in any::<prop::sample::Index>(),
        new_value in value(),
    ) {
        let text = render(&fields);
        let target = index.get(&fields.keys().collect::<Vec<_>>()).to_string();

        let mut yaml = Yaml::from_str(&text).unwrap();
        yaml.set_nested_field(new_value.as_str(), &path(&[target.as_str()]), MissingField::Error)
            .unwrap();

        let reparsed = Yaml::from_str(&yaml.to_string()).unwrap();
        for (key, value) in &fields {
            let expected = if *key == target { &new_value } else { value };
            prop_assert_eq!(
                reparsed.get_nested_string(&path(&[key.as_str()])),
                Some(expected.clone())
            );
        }
        prop_assert_eq!(
            reparsed.get_nested_string(&path(&["section-x", "inner"])),
            Some("fixed".to_string())
        );
        let comment_kept = yaml.to_string().contains(&format!("  # {}\n", target));
        prop_assert!(comment_kept, "comment of {} was lost", target);
    }

    #[test]
    fn set_twice_keeps_last(
        fields in fields(),
        first in value(),
        second in value(),
    ) {
        let target = fields.keys().next().unwrap().clone();
        let target_path = path(&[target.as_str()]);
        let mut yaml = Yaml::from_str(&render(&fields)).unwrap();
        for new_value in [&first, &second] {
            yaml.set_nested_field(new_value.as_str(), &target_path, MissingField::Error)
                .unwrap();
        }

        let reparsed = Yaml::from_str(&yaml.to_string()).unwrap();
        prop_assert_eq!(reparsed.get_nested_string(&target_path), Some(second));
        prop_assert_eq!(reparsed.documents().count(), 1);
    }

    #[test]
    fn missing_path_leaves_document_untouched(fields in fields(), new_value in value()) {
        let text = render(&fields);
        let mut yaml = Yaml::from_str(&text).unwrap();
        for keys in [&["missing-key"][..], &["section-x", "missing-key"], &["section-x", "inner", "deeper"]] {
            yaml.set_nested_field(new_value.as_str(), &path(keys), MissingField::Ignore)
                .unwrap();
        }
        prop_assert_eq!(yaml.to_string(), text);
    }

    #[test]
    fn sequence_replacement_has_replacement_length(
        items in prop::collection::vec(value(), 0..8),
        indent in 0usize..6,
        flow in any::<bool>(),
    ) {
        let pad = " ".repeat(indent);
        let text = if flow {
            format!("outer:\n{pad}  list: [old]\n{pad}  after: 1\n")
        } else {
            format!("outer:\n{pad}  list:\n{pad}  - old\n{pad}  after: 1\n")
        };
        let mut yaml = Yaml::from_str(&text).unwrap();
        yaml.set_nested_field(items.clone(), &path(&["outer", "list"]), MissingField::Error)
            .unwrap();

        let output = yaml.to_string();
        let reparsed = Yaml::from_str(&output).unwrap();
        let list = reparsed
            .get_nested_field(&path(&["outer", "list"]))
            .and_then(Sequence::cast)
            .unwrap();
        prop_assert_eq!(list.len(), items.len());
        prop_assert_eq!(
            reparsed.get_nested_string(&path(&["outer", "after"])),
            Some("1".to_string())
        );
    }
}
