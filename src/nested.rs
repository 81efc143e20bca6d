//! Reading and writing fields addressed by a key path.
//!
//! A path such as `olm.channels.list` names one mapping key per level, starting
//! at the root mapping of a document. Writes happen in place: everything around
//! the replaced value (comments, blank lines, key order and the formatting of
//! untouched entries) is kept exactly as it was.

use crate::error::{YamlError, YamlResult};
use crate::lex::SyntaxKind;
use crate::scalar::ScalarStyle;
use crate::value::YamlValue;
use crate::yaml::{
    build_node, content_child, detached_token, remove_children, replace_children, take_children,
    Document, Mapping, MappingEntry, Scalar, Sequence, SyntaxElement, SyntaxNode, Yaml,
};
use crate::ParseError;
use rowan::ast::AstNode;
use rowan::NodeOrToken;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// An ordered, non-empty list of mapping keys
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Create a path from its keys
    pub fn new<I, S>(keys: I) -> YamlResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        if keys.is_empty() {
            return Err(YamlError::InvalidPath(String::new()));
        }
        Ok(Self(keys))
    }

    /// The keys, outermost first
    pub fn keys(&self) -> &[String] {
        &self.0
    }

    /// Number of keys in the path
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false: a path has at least one key
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for FieldPath {
    type Err = YamlError;

    /// Parse a dotted path: `olm.previous.replaces`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.split('.').any(str::is_empty) {
            return Err(YamlError::InvalidPath(s.to_string()));
        }
        Self::new(s.split('.'))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// What to do when a path does not lead to a value that can be replaced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingField {
    /// Leave the document untouched and report success
    #[default]
    Ignore,
    /// Fail with [`YamlError::KeyNotFound`] or [`YamlError::TypeMismatch`]
    Error,
}

/// Outcome of walking a path
#[derive(Debug)]
enum Lookup {
    Applied,
    /// No entry for this key
    Missing(String),
    /// The node found cannot take the replacement
    Mismatch(String),
}

impl Yaml {
    /// Replace the value at `path` in the first document.
    ///
    /// Later documents in the stream are never touched.
    pub fn set_nested_field(
        &mut self,
        value: impl Into<YamlValue>,
        path: &FieldPath,
        missing: MissingField,
    ) -> YamlResult<()> {
        set_nested_field(self.syntax(), &value.into(), path, missing)
    }

    /// Get the content node at `path` in the first document
    pub fn get_nested_field(&self, path: &FieldPath) -> Option<SyntaxNode> {
        find_node(self.syntax(), path.keys())
    }

    /// Get the decoded scalar at `path` in the first document; `None` when
    /// absent, null or not a scalar
    pub fn get_nested_string(&self, path: &FieldPath) -> Option<String> {
        nested_string(self.syntax(), path)
    }
}

impl Document {
    /// Replace the value at `path`, starting from the document's root mapping
    pub fn set_nested_field(
        &mut self,
        value: impl Into<YamlValue>,
        path: &FieldPath,
        missing: MissingField,
    ) -> YamlResult<()> {
        set_nested_field(self.syntax(), &value.into(), path, missing)
    }

    /// Get the content node at `path`
    pub fn get_nested_field(&self, path: &FieldPath) -> Option<SyntaxNode> {
        find_node(self.syntax(), path.keys())
    }

    /// Get the decoded scalar at `path`
    pub fn get_nested_string(&self, path: &FieldPath) -> Option<String> {
        nested_string(self.syntax(), path)
    }
}

impl Mapping {
    /// Replace the value at `path`, relative to this mapping
    pub fn set_nested_field(
        &mut self,
        value: impl Into<YamlValue>,
        path: &FieldPath,
        missing: MissingField,
    ) -> YamlResult<()> {
        set_nested_field(self.syntax(), &value.into(), path, missing)
    }

    /// Get the content node at `path`, relative to this mapping
    pub fn get_nested_field(&self, path: &FieldPath) -> Option<SyntaxNode> {
        find_node(self.syntax(), path.keys())
    }

    /// Get the decoded scalar at `path`, relative to this mapping
    pub fn get_nested_string(&self, path: &FieldPath) -> Option<String> {
        nested_string(self.syntax(), path)
    }
}

fn set_nested_field(
    node: &SyntaxNode,
    value: &YamlValue,
    path: &FieldPath,
    missing: MissingField,
) -> YamlResult<()> {
    match (set_in_node(node, value, path.keys())?, missing) {
        (Lookup::Applied, _) => Ok(()),
        (Lookup::Missing(key), MissingField::Ignore) => {
            debug!(path = %path, key = %key, "field not found, leaving document unchanged");
            Ok(())
        }
        (Lookup::Mismatch(message), MissingField::Ignore) => {
            debug!(path = %path, "{}, leaving document unchanged", message);
            Ok(())
        }
        (Lookup::Missing(_), MissingField::Error) => Err(YamlError::KeyNotFound(path.clone())),
        (Lookup::Mismatch(message), MissingField::Error) => Err(YamlError::TypeMismatch {
            path: path.clone(),
            message,
        }),
    }
}

/// Walk `keys` from `node` and write `value` at the end of the walk.
fn set_in_node(node: &SyntaxNode, value: &YamlValue, keys: &[String]) -> YamlResult<Lookup> {
    let Some((head, tail)) = keys.split_first() else {
        return Ok(Lookup::Mismatch("empty path".to_string()));
    };

    match node.kind() {
        SyntaxKind::ROOT => match node.children().find_map(Document::cast) {
            Some(document) => set_in_node(document.syntax(), value, keys),
            None => Ok(Lookup::Missing(head.clone())),
        },
        // The document wrapper does not consume a key
        SyntaxKind::DOCUMENT => match content_child(node) {
            Some(root) => set_in_node(&root, value, keys),
            None => Ok(Lookup::Missing(head.clone())),
        },
        SyntaxKind::MAPPING => {
            let Some(entry) = Mapping::cast(node.clone()).and_then(|m| m.find_entry(head)) else {
                return Ok(Lookup::Missing(head.clone()));
            };
            if tail.is_empty() {
                return set_entry_value(&entry, value);
            }
            match entry.value_node() {
                Some(child) => set_in_node(&child, value, tail),
                None => Ok(Lookup::Missing(tail[0].clone())),
            }
        }
        _ => Ok(Lookup::Missing(head.clone())),
    }
}

fn set_entry_value(entry: &MappingEntry, value: &YamlValue) -> YamlResult<Lookup> {
    let Some(slot) = entry.value() else {
        return Ok(Lookup::Mismatch("entry has no value".to_string()));
    };

    match (value, entry.value_node()) {
        (YamlValue::Scalar(scalar), None) => {
            fill_empty_value(&slot, build_node(SyntaxKind::SCALAR, &scalar.to_yaml_string()));
            Ok(Lookup::Applied)
        }
        (YamlValue::Sequence(items), None) => {
            let rendered = YamlValue::Sequence(items.clone()).to_flow_string();
            fill_empty_value(&slot, parse_sequence(&rendered)?);
            Ok(Lookup::Applied)
        }
        (YamlValue::Scalar(scalar), Some(node)) if node.kind() == SyntaxKind::SCALAR => {
            let Some(mut existing) = Scalar::cast(node) else {
                return Ok(Lookup::Mismatch("value is not a scalar".to_string()));
            };
            let style = existing.style();
            existing.set_value(&scalar.clone().styled_like(style));
            Ok(Lookup::Applied)
        }
        (YamlValue::Sequence(items), Some(node)) if node.kind() == SyntaxKind::SEQUENCE => {
            match Sequence::cast(node) {
                Some(sequence) => {
                    replace_sequence(&slot, &sequence, items)?;
                    Ok(Lookup::Applied)
                }
                None => Ok(Lookup::Mismatch("value is not a sequence".to_string())),
            }
        }
        (value, Some(node)) => Ok(Lookup::Mismatch(format!(
            "cannot replace a {} with a {}",
            kind_name(node.kind()),
            value.kind_name()
        ))),
        (value, None) => Ok(Lookup::Mismatch(format!(
            "cannot write a {} into an empty value",
            value.kind_name()
        ))),
    }
}

/// Render `text`, parse it back and return its root sequence, detached.
fn parse_sequence(text: &str) -> YamlResult<SyntaxNode> {
    let parsed = Yaml::from_str(text)?;
    let sequence = parsed
        .document()
        .and_then(|document| document.as_sequence())
        .ok_or_else(|| ParseError(vec![format!("not a sequence: {:?}", text)]))?;
    sequence.syntax().detach();
    Ok(sequence.syntax().clone())
}

/// Replace the items of `sequence` with `items`, keeping its style, column,
/// line endings and the quoting of the items it replaces.
fn replace_sequence(slot: &SyntaxNode, sequence: &Sequence, items: &[YamlValue]) -> YamlResult<()> {
    let replacement = YamlValue::Sequence(styled_like_items(sequence, items));

    if sequence.is_flow() {
        let new = parse_sequence(&replacement.to_flow_string())?;
        replace_children(sequence.syntax(), take_children(&new));
        return Ok(());
    }

    if items.is_empty() {
        // A block sequence has no empty form: swap in `[]` on the key's line
        let new = parse_sequence("[]")?;
        let children: Vec<SyntaxElement> = slot.children_with_tokens().collect();
        let Some(sequence_index) = children
            .iter()
            .position(|child| child.as_node() == Some(sequence.syntax()))
        else {
            return Ok(());
        };
        let line_break = children
            .iter()
            .position(|child| child.kind() == SyntaxKind::NEWLINE)
            .unwrap_or(sequence_index);
        remove_children(slot, line_break..sequence_index + 1);
        insert_before_comment(slot, line_break, new);
        return Ok(());
    }

    let mut rendered = replacement.to_block_string(sequence.column());
    if line_ending(slot) == "\r\n" {
        rendered = rendered.replace('\n', "\r\n");
    }
    let new = parse_sequence(&rendered)?;
    replace_children(sequence.syntax(), take_children(&new));
    Ok(())
}

/// Give each scalar item the quoting of the item it replaces. Items past the
/// end of the old sequence follow its last item.
fn styled_like_items(sequence: &Sequence, items: &[YamlValue]) -> Vec<YamlValue> {
    let styles: Vec<ScalarStyle> = sequence
        .items()
        .map(|item| Scalar::cast(item).map_or(ScalarStyle::Plain, |scalar| scalar.style()))
        .collect();
    items
        .iter()
        .enumerate()
        .map(|(i, item)| match (item, styles.get(i).or(styles.last())) {
            (YamlValue::Scalar(scalar), Some(style)) => {
                YamlValue::Scalar(scalar.clone().styled_like(*style))
            }
            (item, _) => item.clone(),
        })
        .collect()
}

/// The line terminator of the document holding `node`.
fn line_ending(node: &SyntaxNode) -> &'static str {
    let root = node.ancestors().last().unwrap_or_else(|| node.clone());
    let crlf = root
        .descendants_with_tokens()
        .find(|element| element.kind() == SyntaxKind::NEWLINE)
        .and_then(|element| element.into_token())
        .is_some_and(|token| token.text() == "\r\n");
    if crlf {
        "\r\n"
    } else {
        "\n"
    }
}

/// Put `node` into an empty VALUE slot, adding the spaces that separate it
/// from the indicator before it and from a trailing comment.
fn fill_empty_value(slot: &SyntaxNode, node: SyntaxNode) {
    let end = slot.children_with_tokens().count();
    insert_before_comment(slot, end, node);
}

/// Insert `node` into `slot` at `index`, or before a comment ending the
/// line at that point.
fn insert_before_comment(slot: &SyntaxNode, index: usize, node: SyntaxNode) {
    let children: Vec<SyntaxElement> = slot.children_with_tokens().collect();
    let mut index = index;
    while index > 0
        && matches!(
            children[index - 1].kind(),
            SyntaxKind::COMMENT | SyntaxKind::WHITESPACE
        )
    {
        index -= 1;
    }

    let preceding = if index > 0 {
        last_char(&children[index - 1])
    } else {
        slot.prev_sibling_or_token().as_ref().and_then(last_char)
    };
    let following = if index < children.len() {
        Some(children[index].kind())
    } else {
        slot.next_sibling_or_token().map(|element| element.kind())
    };

    let mut elements = Vec::new();
    if !preceding.is_some_and(char::is_whitespace) {
        elements.extend(detached_token(SyntaxKind::WHITESPACE, " ").map(NodeOrToken::Token));
    }
    elements.push(NodeOrToken::Node(node));
    if following == Some(SyntaxKind::COMMENT) {
        elements.extend(detached_token(SyntaxKind::WHITESPACE, " ").map(NodeOrToken::Token));
    }
    slot.splice_children(index..index, elements);
}

fn last_char(element: &SyntaxElement) -> Option<char> {
    match element {
        NodeOrToken::Token(token) => token.text().chars().last(),
        NodeOrToken::Node(node) => node.last_token().and_then(|t| t.text().chars().last()),
    }
}

fn kind_name(kind: SyntaxKind) -> &'static str {
    match kind {
        SyntaxKind::MAPPING => "mapping",
        SyntaxKind::SEQUENCE => "sequence",
        _ => "scalar",
    }
}

fn find_node(node: &SyntaxNode, keys: &[String]) -> Option<SyntaxNode> {
    let Some((head, tail)) = keys.split_first() else {
        return Some(node.clone());
    };
    match node.kind() {
        SyntaxKind::ROOT => find_node(node.children().find_map(Document::cast)?.syntax(), keys),
        SyntaxKind::DOCUMENT => find_node(&content_child(node)?, keys),
        SyntaxKind::MAPPING => {
            let entry = Mapping::cast(node.clone())?.find_entry(head)?;
            find_node(&entry.value_node()?, tail)
        }
        _ => None,
    }
}

fn nested_string(node: &SyntaxNode, path: &FieldPath) -> Option<String> {
    let scalar = Scalar::cast(find_node(node, path.keys())?)?;
    if scalar.is_null() {
        None
    } else {
        Some(scalar.value())
    }
}
