//! Lossless YAML parser and typed syntax tree.

use crate::{
    error::YamlResult,
    lex::{lex, SyntaxKind},
    parse::Parse,
    scalar::{ScalarStyle, ScalarValue},
    PositionedParseError,
};
use rowan::ast::AstNode;
use rowan::{GreenNodeBuilder, NodeOrToken, TextRange, TextSize};
use std::ops::Range;
use std::path::Path;
use std::str::FromStr;

/// The green tree and the errors collected while building it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct ParsedYaml {
    pub(crate) green_node: rowan::GreenNode,
    pub(crate) errors: Vec<String>,
    pub(crate) positioned_errors: Vec<PositionedParseError>,
}

/// YAML language type for rowan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lang {}

impl rowan::Language for Lang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 <= SyntaxKind::COMMENT as u16);
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// A node in the YAML syntax tree.
pub type SyntaxNode = rowan::SyntaxNode<Lang>;
pub(crate) type SyntaxToken = rowan::SyntaxToken<Lang>;
pub(crate) type SyntaxElement = rowan::SyntaxElement<Lang>;

/// A macro to create AST node wrappers.
macro_rules! ast_node {
    ($ast:ident, $kind:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, PartialEq, Eq, Hash)]
        pub struct $ast(SyntaxNode);

        impl std::fmt::Debug for $ast {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($ast))
                    .field("syntax", &self.0)
                    .finish()
            }
        }

        impl AstNode for $ast {
            type Language = Lang;

            fn can_cast(kind: SyntaxKind) -> bool {
                kind == SyntaxKind::$kind
            }

            fn cast(syntax: SyntaxNode) -> Option<Self> {
                if Self::can_cast(syntax.kind()) {
                    Some(Self(syntax))
                } else {
                    None
                }
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.0
            }
        }

        impl From<SyntaxNode> for $ast {
            fn from(node: SyntaxNode) -> Self {
                $ast(node)
            }
        }

        impl std::fmt::Display for $ast {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0.text())
            }
        }
    };
}

ast_node!(
    Yaml,
    ROOT,
    "A YAML stream containing zero or more documents"
);
ast_node!(Document, DOCUMENT, "A single YAML document");
ast_node!(Sequence, SEQUENCE, "A YAML sequence (list)");
ast_node!(SequenceEntry, SEQUENCE_ENTRY, "An entry in a YAML sequence");
ast_node!(Mapping, MAPPING, "A YAML mapping (key-value pairs)");
ast_node!(MappingEntry, MAPPING_ENTRY, "A key-value pair in a YAML mapping");
ast_node!(Scalar, SCALAR, "A YAML scalar value");

/// The first child node holding content: a scalar, mapping or sequence.
pub(crate) fn content_child(node: &SyntaxNode) -> Option<SyntaxNode> {
    node.children().find(|child| {
        matches!(
            child.kind(),
            SyntaxKind::SCALAR | SyntaxKind::MAPPING | SyntaxKind::SEQUENCE
        )
    })
}

/// Whether a collection node is written in flow style (`[..]` or `{..}`).
fn is_flow(node: &SyntaxNode) -> bool {
    node.first_token().is_some_and(|token| {
        matches!(
            token.kind(),
            SyntaxKind::LEFT_BRACKET | SyntaxKind::LEFT_BRACE
        )
    })
}

/// Column at which a node starts, counted in characters from the preceding line break.
pub(crate) fn column_of(node: &SyntaxNode) -> usize {
    let mut column = 0;
    let mut token = node.first_token().and_then(|t| t.prev_token());
    while let Some(t) = token {
        let text = t.text();
        if let Some(newline) = text.rfind('\n') {
            column += text[newline + 1..].chars().count();
            break;
        }
        column += text.chars().count();
        token = t.prev_token();
    }
    column
}

/// Lex `text` into a new mutable node of `kind`, ready to be spliced into a tree.
pub(crate) fn build_node(kind: SyntaxKind, text: &str) -> SyntaxNode {
    let mut builder = GreenNodeBuilder::new();
    builder.start_node(kind.into());
    for (token_kind, token_text) in lex(text) {
        builder.token(token_kind.into(), token_text);
    }
    builder.finish_node();
    SyntaxNode::new_root_mut(builder.finish())
}

/// Build a detached, mutable token that can be spliced into a tree.
pub(crate) fn detached_token(kind: SyntaxKind, text: &str) -> Option<SyntaxToken> {
    let mut builder = GreenNodeBuilder::new();
    builder.start_node(SyntaxKind::ROOT.into());
    builder.token(kind.into(), text);
    builder.finish_node();
    let root = SyntaxNode::new_root_mut(builder.finish());
    let token = root.first_token()?;
    token.detach();
    Some(token)
}

fn detach_all(elements: &[SyntaxElement]) {
    for element in elements {
        match element {
            NodeOrToken::Node(n) => n.detach(),
            NodeOrToken::Token(t) => t.detach(),
        }
    }
}

/// Detach every child of `node`, ready to be spliced elsewhere.
pub(crate) fn take_children(node: &SyntaxNode) -> Vec<SyntaxElement> {
    let children: Vec<SyntaxElement> = node.children_with_tokens().collect();
    detach_all(&children);
    children
}

/// Remove the children of `node` in `range`.
///
/// Each child is detached on its own: `splice_children` with a delete range
/// longer than one element skips every other child.
pub(crate) fn remove_children(node: &SyntaxNode, range: Range<usize>) {
    let doomed: Vec<SyntaxElement> = node
        .children_with_tokens()
        .skip(range.start)
        .take(range.len())
        .collect();
    detach_all(&doomed);
}

/// Swap every child of `node` for `elements`.
pub(crate) fn replace_children(node: &SyntaxNode, elements: Vec<SyntaxElement>) {
    take_children(node);
    node.splice_children(0..0, elements);
}

impl Yaml {
    /// Parse YAML text, returning a Parse result
    pub fn parse(text: &str) -> Parse<Yaml> {
        Parse::parse_yaml(text)
    }

    /// Parse YAML from a file path
    pub fn from_path<P: AsRef<Path>>(path: P) -> YamlResult<Yaml> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::from_str(&contents)?)
    }

    /// Get all documents in this YAML stream
    pub fn documents(&self) -> impl Iterator<Item = Document> {
        self.0.children().filter_map(Document::cast)
    }

    /// Get the first document, if any
    pub fn document(&self) -> Option<Document> {
        self.documents().next()
    }
}

impl FromStr for Yaml {
    type Err = crate::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Yaml::parse(s).to_result()
    }
}

impl Document {
    /// Get the root content node of this document (mapping, sequence or scalar)
    pub fn root_node(&self) -> Option<SyntaxNode> {
        content_child(&self.0)
    }

    /// Get this document as a mapping, if it is one
    pub fn as_mapping(&self) -> Option<Mapping> {
        self.root_node().and_then(Mapping::cast)
    }

    /// Get this document as a sequence, if it is one
    pub fn as_sequence(&self) -> Option<Sequence> {
        self.root_node().and_then(Sequence::cast)
    }

    /// Get this document as a scalar, if it is one
    pub fn as_scalar(&self) -> Option<Scalar> {
        self.root_node().and_then(Scalar::cast)
    }

    /// Convert the document to a YAML string
    pub fn to_yaml_string(&self) -> String {
        self.0.text().to_string()
    }
}

impl Mapping {
    /// Get all mapping entries, in document order
    pub fn entries(&self) -> impl Iterator<Item = MappingEntry> {
        self.0.children().filter_map(MappingEntry::cast)
    }

    /// Get all keys in this mapping as strings
    pub fn keys(&self) -> impl Iterator<Item = String> {
        self.entries().filter_map(|entry| entry.key_text())
    }

    /// Find the first entry whose key equals `key`
    pub fn find_entry(&self, key: &str) -> Option<MappingEntry> {
        self.entries()
            .find(|entry| entry.key_text().as_deref() == Some(key))
    }

    /// Get the content node stored under `key`
    pub fn get(&self, key: &str) -> Option<SyntaxNode> {
        self.find_entry(key).and_then(|entry| entry.value_node())
    }

    /// Get a value as a Mapping if it is one
    pub fn get_mapping(&self, key: &str) -> Option<Mapping> {
        self.get(key).and_then(Mapping::cast)
    }

    /// Get a value as a Sequence if it is one
    pub fn get_sequence(&self, key: &str) -> Option<Sequence> {
        self.get(key).and_then(Sequence::cast)
    }

    /// Get a value as a Scalar if it is one
    pub fn get_scalar(&self, key: &str) -> Option<Scalar> {
        self.get(key).and_then(Scalar::cast)
    }

    /// Check if the mapping contains a specific key
    pub fn contains_key(&self, key: &str) -> bool {
        self.find_entry(key).is_some()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries().count()
    }

    /// Check if the mapping is empty
    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// Whether this mapping is written in flow style (`{a: 1}`)
    pub fn is_flow(&self) -> bool {
        is_flow(&self.0)
    }
}

impl MappingEntry {
    /// Get the KEY node from this mapping entry
    pub fn key(&self) -> Option<SyntaxNode> {
        self.0.children().find(|n| n.kind() == SyntaxKind::KEY)
    }

    /// The decoded key, if the key is a scalar
    pub fn key_text(&self) -> Option<String> {
        self.key()
            .and_then(|key| key.children().find_map(Scalar::cast))
            .map(|scalar| scalar.value())
    }

    /// Get the VALUE node from this mapping entry
    pub fn value(&self) -> Option<SyntaxNode> {
        self.0.children().find(|n| n.kind() == SyntaxKind::VALUE)
    }

    /// Get the content held by the VALUE node; `None` for an empty value
    pub fn value_node(&self) -> Option<SyntaxNode> {
        self.value().as_ref().and_then(content_child)
    }
}

impl Sequence {
    /// Get all entries in this sequence
    pub fn entries(&self) -> impl Iterator<Item = SequenceEntry> {
        self.0.children().filter_map(SequenceEntry::cast)
    }

    /// Get the content node of each item
    pub fn items(&self) -> impl Iterator<Item = SyntaxNode> {
        self.entries().filter_map(|entry| entry.value())
    }

    /// Get the item at `index`
    pub fn get_item(&self, index: usize) -> Option<SyntaxNode> {
        self.items().nth(index)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries().count()
    }

    /// Check if the sequence is empty
    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// Whether this sequence is written in flow style (`[a, b]`)
    pub fn is_flow(&self) -> bool {
        is_flow(&self.0)
    }

    /// Column of the opening `-` or `[`
    pub fn column(&self) -> usize {
        column_of(&self.0)
    }
}

impl SequenceEntry {
    /// Get the content node of this entry; `None` for an empty item
    pub fn value(&self) -> Option<SyntaxNode> {
        content_child(&self.0)
    }
}

/// How a block scalar treats its final line break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chomping {
    Clip,
    Strip,
    Keep,
}

impl Scalar {
    fn first_kind(&self) -> Option<SyntaxKind> {
        self.0
            .children_with_tokens()
            .map(|child| child.kind())
            .find(|kind| !kind.is_trivia())
    }

    /// The presentation style of this scalar
    pub fn style(&self) -> ScalarStyle {
        match self.first_kind() {
            Some(SyntaxKind::SINGLE_QUOTED) => ScalarStyle::SingleQuoted,
            Some(SyntaxKind::DOUBLE_QUOTED) => ScalarStyle::DoubleQuoted,
            Some(SyntaxKind::BLOCK_SCALAR) => {
                if self.0.text().to_string().starts_with('>') {
                    ScalarStyle::Folded
                } else {
                    ScalarStyle::Literal
                }
            }
            _ => ScalarStyle::Plain,
        }
    }

    /// Whether this scalar is empty or a plain null literal
    pub fn is_null(&self) -> bool {
        match self.first_kind() {
            None => true,
            Some(SyntaxKind::NULL) => true,
            Some(_) => false,
        }
    }

    /// The decoded value: quotes removed, escapes processed and lines folded
    pub fn value(&self) -> String {
        let text = self.0.text().to_string();
        match self.first_kind() {
            Some(SyntaxKind::SINGLE_QUOTED) => {
                let inner = &text[1..text.len() - 1];
                fold_lines(inner).replace("''", "'")
            }
            Some(SyntaxKind::DOUBLE_QUOTED) => {
                let inner = &text[1..text.len() - 1];
                unescape_double_quoted(&fold_lines(inner))
            }
            Some(SyntaxKind::UNTERMINATED_STRING) => text[1..].to_string(),
            Some(SyntaxKind::BLOCK_SCALAR) => decode_block_scalar(&text),
            _ => fold_lines(&text),
        }
    }

    /// Replace the text of this scalar, keeping the node in place
    pub fn set_value(&mut self, value: &ScalarValue) {
        let replacement = build_node(SyntaxKind::SCALAR, &value.to_yaml_string());
        replace_children(&self.0, take_children(&replacement));
    }
}

/// Fold the lines of a multi-line flow scalar: single breaks become spaces,
/// blank lines become line feeds.
fn fold_lines(text: &str) -> String {
    if !text.contains('\n') {
        return text.to_string();
    }

    let lines: Vec<&str> = text.split('\n').collect();
    let last = lines.len() - 1;
    let mut result = String::new();
    let mut breaks = 0;
    for (i, line) in lines.iter().enumerate() {
        let line = line.trim_end_matches('\r');
        let line = match i {
            0 => line.trim_end(),
            i if i == last => line.trim_start(),
            _ => line.trim(),
        };
        if i > 0 && i < last && line.is_empty() {
            breaks += 1;
            continue;
        }
        if i > 0 {
            if breaks > 0 {
                result.extend(std::iter::repeat('\n').take(breaks));
            } else {
                result.push(' ');
            }
            breaks = 0;
        }
        result.push_str(line);
    }
    result
}

/// Decode a literal (`|`) or folded (`>`) block scalar, header included.
fn decode_block_scalar(text: &str) -> String {
    let (header, body) = text.split_once('\n').unwrap_or((text, ""));
    let header = header.split('#').next().unwrap_or_default().trim();
    let literal = header.starts_with('|');
    let chomping = if header.contains('-') {
        Chomping::Strip
    } else if header.contains('+') {
        Chomping::Keep
    } else {
        Chomping::Clip
    };

    let lines: Vec<&str> = body
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .collect();
    let indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start_matches(' ').len())
        .min()
        .unwrap_or(0);
    let lines: Vec<&str> = lines
        .iter()
        .map(|line| line.get(indent..).unwrap_or(""))
        .collect();

    let mut result = String::new();
    if literal {
        result = lines.join("\n");
    } else {
        let mut previous_was_text = false;
        for line in &lines {
            if line.is_empty() {
                result.push('\n');
                previous_was_text = false;
            } else if line.starts_with(' ') {
                // More-indented lines are kept verbatim
                if previous_was_text {
                    result.push('\n');
                }
                result.push_str(line);
                result.push('\n');
                previous_was_text = false;
            } else {
                if previous_was_text {
                    result.push(' ');
                }
                result.push_str(line);
                previous_was_text = true;
            }
        }
        if result.ends_with('\n') {
            result.pop();
        }
    }

    match chomping {
        Chomping::Strip => result,
        Chomping::Clip | Chomping::Keep if body.is_empty() => result,
        Chomping::Clip | Chomping::Keep => result + "\n",
    }
}

/// Decode the escapes of a double-quoted scalar
fn unescape_double_quoted(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        let Some(next) = chars.next() else {
            result.push('\\');
            break;
        };
        let hex_len = match next {
            'x' => 2,
            'u' => 4,
            'U' => 8,
            _ => 0,
        };
        if hex_len > 0 {
            let hex: String = chars.by_ref().take(hex_len).collect();
            match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                Some(decoded) => result.push(decoded),
                None => {
                    result.push('\\');
                    result.push(next);
                    result.push_str(&hex);
                }
            }
            continue;
        }
        match next {
            'n' => result.push('\n'),
            'r' => result.push('\r'),
            't' | '\t' => result.push('\t'),
            '\\' => result.push('\\'),
            '"' => result.push('"'),
            '/' => result.push('/'),
            '0' => result.push('\0'),
            'b' => result.push('\u{0008}'),
            'f' => result.push('\u{000C}'),
            'a' => result.push('\u{0007}'),
            'v' => result.push('\u{000B}'),
            'e' => result.push('\u{001B}'),
            ' ' => result.push(' '),
            'N' => result.push('\u{0085}'),
            '_' => result.push('\u{00A0}'),
            'L' => result.push('\u{2028}'),
            'P' => result.push('\u{2029}'),
            other => {
                result.push('\\');
                result.push(other);
            }
        }
    }

    result
}

/// Internal parser state
struct Parser {
    tokens: Vec<(SyntaxKind, String)>,
    /// Byte offset of each token
    offsets: Vec<usize>,
    /// Zero-based column of each token
    columns: Vec<usize>,
    /// One-based line of each token
    lines: Vec<usize>,
    pos: usize,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<String>,
    positioned_errors: Vec<PositionedParseError>,
}

impl Parser {
    fn new(text: &str) -> Self {
        let lexed = lex(text);
        let mut tokens = Vec::with_capacity(lexed.len());
        let mut offsets = Vec::with_capacity(lexed.len());
        let mut columns = Vec::with_capacity(lexed.len());
        let mut lines = Vec::with_capacity(lexed.len());

        let (mut offset, mut column, mut line) = (0, 0, 1);
        for (kind, token_text) in lexed {
            tokens.push((kind, token_text.to_string()));
            offsets.push(offset);
            columns.push(column);
            lines.push(line);

            offset += token_text.len();
            match token_text.rfind('\n') {
                Some(newline) => {
                    line += token_text.matches('\n').count();
                    column = token_text[newline + 1..].chars().count();
                }
                None => column += token_text.chars().count(),
            }
        }

        Self {
            tokens,
            offsets,
            columns,
            lines,
            pos: 0,
            builder: GreenNodeBuilder::new(),
            errors: Vec::new(),
            positioned_errors: Vec::new(),
        }
    }

    fn parse(mut self) -> ParsedYaml {
        self.builder.start_node(SyntaxKind::ROOT.into());

        loop {
            self.bump_trivia();
            match self.current() {
                None => break,
                Some(SyntaxKind::DIRECTIVE) => self.bump(),
                Some(SyntaxKind::DOC_END) => self.bump(),
                Some(_) => self.parse_document(),
            }
        }

        self.builder.finish_node();

        ParsedYaml {
            green_node: self.builder.finish(),
            errors: self.errors,
            positioned_errors: self.positioned_errors,
        }
    }

    fn parse_document(&mut self) {
        self.builder.start_node(SyntaxKind::DOCUMENT.into());

        if self.current() == Some(SyntaxKind::DOC_START) {
            self.bump();
            self.skip_inline_whitespace();
        }
        self.parse_value_node(0, None, true);

        loop {
            match self.next_significant() {
                None => {
                    self.bump_trivia();
                    break;
                }
                Some(idx) => match self.kind_at(idx) {
                    Some(SyntaxKind::DOC_START | SyntaxKind::DIRECTIVE) => break,
                    Some(SyntaxKind::DOC_END) => {
                        self.bump_to(idx);
                        self.bump();
                        self.finish_line();
                        break;
                    }
                    _ => {
                        self.bump_to(idx);
                        self.error_line("unexpected content after the document root");
                    }
                },
            }
        }

        self.builder.finish_node();
    }

    /// Parse the node that follows an indicator (`:`, `-` or `---`).
    ///
    /// `min_column` is the smallest column a node on a following line may start
    /// at; `sequence_column` additionally admits a block sequence at that column
    /// (`key:\n- item`). `compact` allows a block collection to start on the
    /// current line (`- key: value`).
    fn parse_value_node(&mut self, min_column: usize, sequence_column: Option<usize>, compact: bool) {
        self.parse_properties();
        match self.current() {
            None | Some(SyntaxKind::NEWLINE | SyntaxKind::COMMENT) => {
                if let Some(idx) = self.next_block_start(min_column, sequence_column) {
                    self.bump_to(idx);
                    self.parse_value_node(min_column, None, true);
                }
            }
            Some(SyntaxKind::DASH) if compact => {
                let column = self.column();
                self.parse_block_sequence(column);
            }
            Some(_) if compact && self.is_mapping_key_at(self.pos) => {
                let column = self.column();
                self.parse_block_mapping(column);
            }
            Some(_) => self.parse_inline_node(min_column),
        }
    }

    /// Anchors and tags preceding a node
    fn parse_properties(&mut self) {
        while matches!(
            self.current(),
            Some(SyntaxKind::ANCHOR | SyntaxKind::TAG)
        ) {
            self.bump();
            self.skip_inline_whitespace();
        }
    }

    /// Index of the next significant token if it starts a node at or beyond `min_column`.
    fn next_block_start(&self, min_column: usize, sequence_column: Option<usize>) -> Option<usize> {
        let idx = self.next_significant()?;
        let kind = self.kind_at(idx)?;
        if matches!(
            kind,
            SyntaxKind::DOC_START | SyntaxKind::DOC_END | SyntaxKind::DIRECTIVE
        ) {
            return None;
        }
        let column = self.columns[idx];
        if column >= min_column || (kind == SyntaxKind::DASH && sequence_column == Some(column)) {
            Some(idx)
        } else {
            None
        }
    }

    /// A node contained on the current line (flow collections and quoted
    /// scalars may continue past it).
    fn parse_inline_node(&mut self, continuation_column: usize) {
        match self.current() {
            Some(SyntaxKind::LEFT_BRACKET) => self.parse_flow_sequence(),
            Some(SyntaxKind::LEFT_BRACE) => self.parse_flow_mapping(),
            Some(kind) if kind.is_plain() => self.parse_plain_scalar(Some(continuation_column)),
            Some(
                SyntaxKind::SINGLE_QUOTED
                | SyntaxKind::DOUBLE_QUOTED
                | SyntaxKind::BLOCK_SCALAR
                | SyntaxKind::REFERENCE,
            ) => self.parse_token_scalar(),
            Some(SyntaxKind::UNTERMINATED_STRING) => {
                self.add_error("unterminated quoted string");
                self.parse_token_scalar();
            }
            Some(SyntaxKind::QUESTION) => {
                self.error_line("explicit mapping keys are not supported");
            }
            Some(kind) => self.error_line(&format!("unexpected {}", describe(kind))),
            None => {}
        }
    }

    fn parse_token_scalar(&mut self) {
        self.builder.start_node(SyntaxKind::SCALAR.into());
        self.bump();
        self.builder.finish_node();
    }

    /// A plain scalar; in block context it may continue on following lines
    /// indented at least `continuation_column`.
    fn parse_plain_scalar(&mut self, continuation_column: Option<usize>) {
        self.builder.start_node(SyntaxKind::SCALAR.into());
        self.bump_plain_line();
        if let Some(min_column) = continuation_column {
            while let Some(idx) = self.plain_continuation(min_column) {
                self.bump_to(idx);
                self.bump_plain_line();
            }
        }
        self.builder.finish_node();
    }

    fn bump_plain_line(&mut self) {
        loop {
            match self.current() {
                Some(kind) if kind.is_plain() => self.bump(),
                Some(SyntaxKind::WHITESPACE) if self.nth(1).is_some_and(SyntaxKind::is_plain) => {
                    self.bump()
                }
                _ => break,
            }
        }
    }

    fn plain_continuation(&self, min_column: usize) -> Option<usize> {
        let mut idx = self.pos;
        let mut saw_newline = false;
        while let Some(kind) = self.kind_at(idx) {
            match kind {
                SyntaxKind::NEWLINE => saw_newline = true,
                SyntaxKind::WHITESPACE | SyntaxKind::INDENT => {}
                _ => break,
            }
            idx += 1;
        }
        let kind = self.kind_at(idx)?;
        if !saw_newline
            || !kind.is_plain()
            || self.columns[idx] < min_column
            || self.is_mapping_key_at(idx)
        {
            return None;
        }
        Some(idx)
    }

    /// Whether the tokens at `idx` form `key:` on a single line.
    fn is_mapping_key_at(&self, mut idx: usize) -> bool {
        while matches!(
            self.kind_at(idx),
            Some(SyntaxKind::ANCHOR | SyntaxKind::TAG | SyntaxKind::WHITESPACE)
        ) {
            idx += 1;
        }
        match self.kind_at(idx) {
            Some(kind) if kind.is_quoted() => {
                idx += 1;
                while self.kind_at(idx) == Some(SyntaxKind::WHITESPACE) {
                    idx += 1;
                }
                self.kind_at(idx) == Some(SyntaxKind::COLON)
            }
            Some(kind) if kind.is_plain() => loop {
                idx += 1;
                match self.kind_at(idx) {
                    Some(SyntaxKind::WHITESPACE) => {}
                    Some(kind) if kind.is_plain() => {}
                    Some(SyntaxKind::COLON) => return true,
                    _ => return false,
                }
            },
            _ => false,
        }
    }

    fn parse_block_mapping(&mut self, indent: usize) {
        self.builder.start_node(SyntaxKind::MAPPING.into());
        self.parse_mapping_entry(indent);

        while let Some(idx) = self.next_significant() {
            let Some(kind) = self.kind_at(idx) else { break };
            let column = self.columns[idx];
            if matches!(
                kind,
                SyntaxKind::DOC_START | SyntaxKind::DOC_END | SyntaxKind::DIRECTIVE
            ) || column < indent
            {
                break;
            }
            self.bump_to(idx);
            if column > indent {
                self.error_line("unexpected indentation");
            } else if self.is_mapping_key_at(idx) {
                self.parse_mapping_entry(indent);
            } else {
                self.error_line("expected a mapping key");
            }
        }

        self.builder.finish_node();
    }

    fn parse_mapping_entry(&mut self, indent: usize) {
        self.builder.start_node(SyntaxKind::MAPPING_ENTRY.into());

        self.builder.start_node(SyntaxKind::KEY.into());
        self.parse_properties();
        match self.current() {
            Some(kind) if kind.is_quoted() => self.parse_token_scalar(),
            Some(kind) if kind.is_plain() => self.parse_plain_scalar(None),
            _ => {}
        }
        self.builder.finish_node();

        self.skip_inline_whitespace();
        if self.current() == Some(SyntaxKind::COLON) {
            self.bump();
        } else {
            self.add_error("expected ':' after mapping key");
        }
        self.skip_inline_whitespace();

        self.builder.start_node(SyntaxKind::VALUE.into());
        self.parse_value_node(indent + 1, Some(indent), false);
        self.builder.finish_node();

        self.finish_line();
        self.builder.finish_node();
    }

    fn parse_block_sequence(&mut self, indent: usize) {
        self.builder.start_node(SyntaxKind::SEQUENCE.into());
        self.parse_sequence_entry(indent);

        while let Some(idx) = self.next_significant() {
            let Some(kind) = self.kind_at(idx) else { break };
            let column = self.columns[idx];
            if matches!(
                kind,
                SyntaxKind::DOC_START | SyntaxKind::DOC_END | SyntaxKind::DIRECTIVE
            ) || column < indent
                || (column == indent && kind != SyntaxKind::DASH)
            {
                break;
            }
            self.bump_to(idx);
            if column > indent {
                self.error_line("unexpected indentation");
            } else {
                self.parse_sequence_entry(indent);
            }
        }

        self.builder.finish_node();
    }

    fn parse_sequence_entry(&mut self, indent: usize) {
        self.builder.start_node(SyntaxKind::SEQUENCE_ENTRY.into());
        self.bump(); // DASH
        self.skip_inline_whitespace();
        self.parse_value_node(indent + 1, None, true);
        self.finish_line();
        self.builder.finish_node();
    }

    fn parse_flow_sequence(&mut self) {
        self.builder.start_node(SyntaxKind::SEQUENCE.into());
        self.bump(); // [

        loop {
            self.bump_trivia();
            match self.current() {
                None => {
                    self.add_error("unclosed flow sequence, expected ']'");
                    break;
                }
                Some(SyntaxKind::RIGHT_BRACKET) => {
                    self.bump();
                    break;
                }
                Some(_) => {
                    self.builder.start_node(SyntaxKind::SEQUENCE_ENTRY.into());
                    self.parse_flow_node();
                    self.builder.finish_node();

                    self.bump_trivia();
                    match self.current() {
                        Some(SyntaxKind::COMMA) => self.bump(),
                        Some(SyntaxKind::RIGHT_BRACKET) | None => {}
                        Some(_) => self.error_token("expected ',' or ']' in flow sequence"),
                    }
                }
            }
        }

        self.builder.finish_node();
    }

    fn parse_flow_mapping(&mut self) {
        self.builder.start_node(SyntaxKind::MAPPING.into());
        self.bump(); // {

        loop {
            self.bump_trivia();
            match self.current() {
                None => {
                    self.add_error("unclosed flow mapping, expected '}'");
                    break;
                }
                Some(SyntaxKind::RIGHT_BRACE) => {
                    self.bump();
                    break;
                }
                Some(_) => {
                    self.builder.start_node(SyntaxKind::MAPPING_ENTRY.into());
                    self.builder.start_node(SyntaxKind::KEY.into());
                    self.parse_flow_node();
                    self.builder.finish_node();

                    self.bump_trivia();
                    if self.current() == Some(SyntaxKind::COLON) {
                        self.bump();
                        self.bump_trivia();
                        self.builder.start_node(SyntaxKind::VALUE.into());
                        if !matches!(
                            self.current(),
                            None | Some(SyntaxKind::COMMA | SyntaxKind::RIGHT_BRACE)
                        ) {
                            self.parse_flow_node();
                        }
                        self.builder.finish_node();
                    }
                    self.builder.finish_node();

                    self.bump_trivia();
                    match self.current() {
                        Some(SyntaxKind::COMMA) => self.bump(),
                        Some(SyntaxKind::RIGHT_BRACE) | None => {}
                        Some(_) => self.error_token("expected ',' or '}' in flow mapping"),
                    }
                }
            }
        }

        self.builder.finish_node();
    }

    fn parse_flow_node(&mut self) {
        let has_properties = matches!(
            self.current(),
            Some(SyntaxKind::ANCHOR | SyntaxKind::TAG)
        );
        self.parse_properties();
        match self.current() {
            Some(SyntaxKind::LEFT_BRACKET) => self.parse_flow_sequence(),
            Some(SyntaxKind::LEFT_BRACE) => self.parse_flow_mapping(),
            Some(kind) if kind.is_plain() => self.parse_plain_scalar(None),
            Some(SyntaxKind::SINGLE_QUOTED | SyntaxKind::DOUBLE_QUOTED | SyntaxKind::REFERENCE) => {
                self.parse_token_scalar()
            }
            Some(SyntaxKind::UNTERMINATED_STRING) => {
                self.add_error("unterminated quoted string");
                self.parse_token_scalar();
            }
            None | Some(SyntaxKind::COMMA | SyntaxKind::RIGHT_BRACKET | SyntaxKind::RIGHT_BRACE)
                if has_properties => {}
            Some(kind) => {
                self.error_token(&format!("unexpected {} in flow collection", describe(kind)))
            }
            None => {}
        }
    }

    /// Consume trailing whitespace and a comment; anything else left on the line is an error.
    fn finish_line(&mut self) {
        while matches!(
            self.current(),
            Some(SyntaxKind::WHITESPACE | SyntaxKind::COMMENT)
        ) {
            self.bump();
        }
        if !matches!(self.current(), None | Some(SyntaxKind::NEWLINE)) {
            let kind = self.current().map_or("end of input", describe);
            self.error_line(&format!("unexpected {}", kind));
        }
    }

    /// Report an error and wrap the rest of the line in an ERROR node.
    fn error_line(&mut self, message: &str) {
        self.add_error(message);
        self.builder.start_node(SyntaxKind::ERROR.into());
        while !matches!(self.current(), None | Some(SyntaxKind::NEWLINE)) {
            self.bump();
        }
        self.builder.finish_node();
    }

    /// Report an error and wrap the current token in an ERROR node.
    fn error_token(&mut self, message: &str) {
        self.add_error(message);
        if self.current().is_some() {
            self.builder.start_node(SyntaxKind::ERROR.into());
            self.bump();
            self.builder.finish_node();
        }
    }

    fn add_error(&mut self, message: &str) {
        let (start, len, line, column) = match self.tokens.get(self.pos) {
            Some((_, text)) => (
                self.offsets[self.pos],
                text.len(),
                self.lines[self.pos],
                self.columns[self.pos] + 1,
            ),
            None => match self.tokens.last() {
                Some((_, text)) => {
                    let last = self.tokens.len() - 1;
                    let end = self.offsets[last] + text.len();
                    let (line, column) = match text.rfind('\n') {
                        Some(newline) => (
                            self.lines[last] + text.matches('\n').count(),
                            text[newline + 1..].chars().count() + 1,
                        ),
                        None => (self.lines[last], self.columns[last] + text.chars().count() + 1),
                    };
                    (end, 0, line, column)
                }
                None => (0, 0, 1, 1),
            },
        };
        let message = format!("{}:{}: {}", line, column, message);
        let range = TextRange::at(TextSize::from(start as u32), TextSize::from(len as u32));

        self.errors.push(message.clone());
        self.positioned_errors.push(PositionedParseError {
            message,
            range,
            code: None,
        });
    }

    fn current(&self) -> Option<SyntaxKind> {
        self.nth(0)
    }

    fn nth(&self, n: usize) -> Option<SyntaxKind> {
        self.kind_at(self.pos + n)
    }

    fn kind_at(&self, idx: usize) -> Option<SyntaxKind> {
        self.tokens.get(idx).map(|(kind, _)| *kind)
    }

    fn column(&self) -> usize {
        self.columns.get(self.pos).copied().unwrap_or(0)
    }

    fn next_significant(&self) -> Option<usize> {
        (self.pos..self.tokens.len()).find(|&idx| !self.tokens[idx].0.is_trivia())
    }

    fn bump(&mut self) {
        if let Some((kind, text)) = self.tokens.get(self.pos) {
            self.builder.token((*kind).into(), text);
            self.pos += 1;
        }
    }

    fn bump_to(&mut self, idx: usize) {
        while self.pos < idx {
            self.bump();
        }
    }

    fn bump_trivia(&mut self) {
        while self.current().is_some_and(SyntaxKind::is_trivia) {
            self.bump();
        }
    }

    fn skip_inline_whitespace(&mut self) {
        while self.current() == Some(SyntaxKind::WHITESPACE) {
            self.bump();
        }
    }
}

fn describe(kind: SyntaxKind) -> &'static str {
    match kind {
        SyntaxKind::DASH => "'-'",
        SyntaxKind::COLON => "':'",
        SyntaxKind::QUESTION => "'?'",
        SyntaxKind::LEFT_BRACKET => "'['",
        SyntaxKind::RIGHT_BRACKET => "']'",
        SyntaxKind::LEFT_BRACE => "'{'",
        SyntaxKind::RIGHT_BRACE => "'}'",
        SyntaxKind::COMMA => "','",
        SyntaxKind::DOC_START => "document start",
        SyntaxKind::DOC_END => "document end",
        SyntaxKind::BLOCK_SCALAR => "block scalar",
        SyntaxKind::ANCHOR => "anchor",
        SyntaxKind::TAG => "tag",
        SyntaxKind::REFERENCE => "alias",
        SyntaxKind::DIRECTIVE => "directive",
        kind if kind.is_plain() || kind.is_quoted() => "scalar",
        _ => "token",
    }
}

pub(crate) fn parse(text: &str) -> ParsedYaml {
    Parser::new(text).parse()
}
