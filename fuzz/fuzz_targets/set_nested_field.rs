#![no_main]

use libfuzzer_sys::fuzz_target;
use std::str::FromStr;
use yaml_bump::{FieldPath, MissingField, Yaml};

fuzz_target!(|input: (&str, &str, &str)| {
    let (document, dotted, value) = input;
    let (Ok(mut yaml), Ok(path)) = (Yaml::from_str(document), FieldPath::from_str(dotted)) else {
        return;
    };

    // A successful write must leave a document that parses and reads back
    if yaml
        .set_nested_field(value, &path, MissingField::Error)
        .is_ok()
    {
        let output = yaml.to_string();
        let reparsed = Yaml::from_str(&output).expect("patched document no longer parses");
        assert_eq!(reparsed.get_nested_string(&path).as_deref(), Some(value));
    }
});
