use std::str::FromStr;
use yaml_bump::{ScalarStyle, Yaml};

const PROJECT: &str = include_str!("fixtures/project.yaml");
const CHART: &str = include_str!("fixtures/Chart.yaml");

#[test]
fn test_fixtures_round_trip() {
    for text in [PROJECT, CHART] {
        let yaml = Yaml::from_str(text).unwrap();
        assert_eq!(yaml.to_string(), text);
    }
}

#[test]
fn test_project_structure() {
    let yaml = Yaml::from_str(PROJECT).unwrap();
    let root = yaml.document().unwrap().as_mapping().unwrap();
    assert_eq!(
        root.keys().collect::<Vec<_>>(),
        vec!["project", "olm", "requirements", "dependencies"]
    );

    let olm = root.get_mapping("olm").unwrap();
    let skip = olm.get_scalar("skipRange").unwrap();
    assert_eq!(skip.value(), ">=1.29.0 <1.30.0");
    assert_eq!(skip.style(), ScalarStyle::SingleQuoted);

    let list = olm
        .get_mapping("channels")
        .and_then(|channels| channels.get_sequence("list"))
        .unwrap();
    assert_eq!(list.len(), 2);
    assert!(!list.is_flow());
    assert_eq!(list.column(), 6);

    let dependencies = root.get_mapping("dependencies").unwrap();
    assert_eq!(dependencies.len(), 8);
    assert_eq!(
        dependencies
            .get_scalar("redhat-knative-istio-authz-chart")
            .unwrap()
            .value(),
        "1.30.0"
    );
}

#[test]
fn test_round_trip_odd_layouts() {
    let inputs = [
        "",
        "\n\n",
        "# only comments\n# here\n",
        "key: value",
        "key: value\r\nother: 1\r\n",
        "%YAML 1.2\n---\na: 1\n...\n",
        "---\n- a\n---\n- b\n",
        "a:\n- 1\n- 2\nb:\n  - 3\n",
        "list: [a, 'b', \"c\", {d: e}]\n",
        "nested:\n    deep:\n        deeper: x\n",
        "script: |\n  echo \"hi\" # not a comment\n  exit 0\nnext: 1\n",
        "folded: >-\n  one\n  two\n\n  three\n",
        "- name: a\n  value: 1\n- name: b\n  value: [2, 3]\n",
        "anchor: &a {x: 1}\nalias: *a\n",
        "empty:\nempty_comment: # c\n",
        "url: http://example.com:8080/path\n",
        "\"quoted key\": 1\n'single': 2\n",
        "multi: first\n  continued\n",
        "trailing spaces:    \n",
    ];
    for input in inputs {
        let parse = Yaml::parse(input);
        assert!(!parse.has_errors(), "{:?}: {:?}", input, parse.errors());
        assert_eq!(parse.tree().to_string(), input);
    }
}

#[test]
fn test_invalid_inputs_are_reported_but_lossless() {
    let inputs = [
        "key: [unclosed\n",
        "key: {unclosed: 1\n",
        "key: \"unterminated\n",
        "a: 1\n  b: 2\n",
        "a: b: c\n",
        "- a\nb: 1\n",
        "? explicit\n: value\n",
        "a: 1\n- b\n",
    ];
    for input in inputs {
        let parse = Yaml::parse(input);
        assert!(parse.has_errors(), "expected errors for {:?}", input);
        assert_eq!(parse.tree().to_string(), input);
        assert_eq!(parse.errors().len(), parse.positioned_errors().len());
    }
}

#[test]
fn test_error_positions() {
    let parse = Yaml::parse("a: 1\nb: [x, y\n");
    let error = &parse.positioned_errors()[0];
    assert!(error.message.starts_with("3:1:"), "{}", error.message);
    assert!(Yaml::from_str("a: 1\nb: [x, y\n").is_err());
}

#[test]
fn test_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Chart.yaml");
    std::fs::write(&path, CHART).unwrap();
    assert_eq!(Yaml::from_path(&path).unwrap().to_string(), CHART);

    let err = Yaml::from_path(dir.path().join("missing.yaml")).unwrap_err();
    assert!(matches!(err, yaml_bump::YamlError::Io(_)));

    std::fs::write(&path, "key: \"open\n").unwrap();
    let err = Yaml::from_path(&path).unwrap_err();
    assert!(matches!(err, yaml_bump::YamlError::Parse(_)));
}
