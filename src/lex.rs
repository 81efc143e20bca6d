//! Lexer for YAML files.

/// Lexical analysis: the variants are different kinds of "tokens".
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // Structural
    /// Root node of the syntax tree
    ROOT = 0,
    /// A YAML document
    DOCUMENT,
    /// A YAML sequence (list), block or flow
    SEQUENCE,
    /// One item of a sequence, including its `-` indicator in block style
    SEQUENCE_ENTRY,
    /// A YAML mapping (key-value pairs), block or flow
    MAPPING,
    /// One key-value pair of a mapping
    MAPPING_ENTRY,
    /// The key half of a mapping entry
    KEY,
    /// The value half of a mapping entry
    VALUE,
    /// A YAML scalar value
    SCALAR,
    /// Parse error marker
    ERROR,

    // Tokens
    /// Sequence entry indicator '-'
    DASH,
    /// Mapping value indicator ':'
    COLON,
    /// Explicit key indicator '?'
    QUESTION,
    /// Left bracket '['
    LEFT_BRACKET,
    /// Right bracket ']'
    RIGHT_BRACKET,
    /// Left brace '{'
    LEFT_BRACE,
    /// Right brace '}'
    RIGHT_BRACE,
    /// Comma ','
    COMMA,

    // Document markers
    /// Document start marker '---'
    DOC_START,
    /// Document end marker '...'
    DOC_END,

    // Content tokens
    /// Plain string
    STRING,
    /// Integer literal
    INT,
    /// Float literal
    FLOAT,
    /// Boolean literal (true/false)
    BOOL,
    /// Null literal
    NULL,
    /// Single-quoted string, quotes included
    SINGLE_QUOTED,
    /// Double-quoted string, quotes included
    DOUBLE_QUOTED,
    /// Quoted string missing its closing quote
    UNTERMINATED_STRING,
    /// Literal or folded block scalar, header and content lines included
    BLOCK_SCALAR,
    /// YAML tag like '!tag'
    TAG,
    /// YAML anchor like '&anchor'
    ANCHOR,
    /// YAML alias like '*anchor'
    REFERENCE,
    /// YAML directive like '%YAML 1.2'
    DIRECTIVE,

    // Whitespace and formatting
    /// Spaces and tabs
    WHITESPACE,
    /// Newline characters
    NEWLINE,
    /// Leading whitespace that determines structure
    INDENT,
    /// Comments starting with '#'
    COMMENT,
}

impl SyntaxKind {
    /// Whether this token carries no structure: whitespace, newlines, indentation and comments.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            SyntaxKind::WHITESPACE | SyntaxKind::NEWLINE | SyntaxKind::INDENT | SyntaxKind::COMMENT
        )
    }

    /// Whether this token is (part of) a plain scalar.
    pub fn is_plain(self) -> bool {
        matches!(
            self,
            SyntaxKind::STRING
                | SyntaxKind::INT
                | SyntaxKind::FLOAT
                | SyntaxKind::BOOL
                | SyntaxKind::NULL
        )
    }

    /// Whether this token is a complete quoted scalar.
    pub fn is_quoted(self) -> bool {
        matches!(self, SyntaxKind::SINGLE_QUOTED | SyntaxKind::DOUBLE_QUOTED)
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

/// Tokenizer state that survives across tokens.
struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    tokens: Vec<(SyntaxKind, &'a str)>,
    flow_depth: usize,
    /// Last non-trivia token; reset at each newline outside flow collections
    prev: Option<SyntaxKind>,
    /// Only indentation and '-' indicators seen so far on this line
    line_has_only_dashes: bool,
}

impl<'a> Lexer<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_line_start(&self) -> bool {
        self.pos == 0 || self.input.as_bytes()[self.pos - 1] == b'\n'
    }

    fn push(&mut self, kind: SyntaxKind, len: usize) {
        let text = &self.input[self.pos..self.pos + len];
        self.pos += len;
        self.tokens.push((kind, text));

        match kind {
            SyntaxKind::NEWLINE => {
                if self.flow_depth == 0 {
                    self.prev = None;
                }
                self.line_has_only_dashes = true;
            }
            SyntaxKind::WHITESPACE | SyntaxKind::INDENT | SyntaxKind::COMMENT => {}
            SyntaxKind::DASH => self.prev = Some(kind),
            _ => {
                self.prev = Some(kind);
                self.line_has_only_dashes = false;
            }
        }
    }

    /// Whether a new node may begin here, so that indicators keep their meaning.
    fn at_node_start(&self) -> bool {
        matches!(
            self.prev,
            None | Some(
                SyntaxKind::COLON
                    | SyntaxKind::DASH
                    | SyntaxKind::QUESTION
                    | SyntaxKind::DOC_START
                    | SyntaxKind::TAG
                    | SyntaxKind::ANCHOR
                    | SyntaxKind::LEFT_BRACKET
                    | SyntaxKind::LEFT_BRACE
                    | SyntaxKind::COMMA
            )
        )
    }

    fn is_marker(&self, marker: &str) -> bool {
        let rest = self.rest();
        self.at_line_start()
            && rest.starts_with(marker)
            && rest[3..].chars().next().map_or(true, char::is_whitespace)
    }

    /// A ':' is an indicator when followed by whitespace, or by a flow delimiter
    /// inside a flow collection, or directly after a JSON-like quoted key.
    fn colon_is_indicator(&self, offset: usize) -> bool {
        let next = self.input[offset + 1..].chars().next();
        match next {
            None => true,
            Some(c) if c.is_whitespace() => true,
            Some(',' | ']' | '}') if self.flow_depth > 0 => true,
            _ => {
                offset == self.pos
                    && matches!(
                        self.prev,
                        Some(
                            SyntaxKind::SINGLE_QUOTED
                                | SyntaxKind::DOUBLE_QUOTED
                                | SyntaxKind::RIGHT_BRACKET
                                | SyntaxKind::RIGHT_BRACE
                        )
                    )
                    && self.tokens.last().is_some_and(|(k, _)| !k.is_trivia())
            }
        }
    }

    fn run_len(&self, pred: impl Fn(char) -> bool) -> usize {
        self.rest()
            .char_indices()
            .find(|(_, c)| !pred(*c))
            .map_or(self.rest().len(), |(i, _)| i)
    }

    fn line_len(&self) -> usize {
        self.run_len(|c| c != '\n' && c != '\r')
    }

    /// Length of a plain scalar starting at the current position.
    fn plain_len(&self) -> usize {
        let rest = self.rest();
        let mut chars = rest.char_indices();
        // The first character always belongs to the scalar
        let mut end = chars.next().map_or(0, |(_, c)| c.len_utf8());
        for (i, c) in chars {
            if c.is_whitespace() {
                break;
            }
            if c == ':' && self.colon_is_indicator(self.pos + i) {
                break;
            }
            if self.flow_depth > 0 && matches!(c, ',' | '[' | ']' | '{' | '}') {
                break;
            }
            end = i + c.len_utf8();
        }
        end
    }

    fn single_quoted_len(&self) -> Option<usize> {
        let rest = self.rest();
        let bytes = rest.as_bytes();
        let mut i = 1;
        while i < bytes.len() {
            if bytes[i] == b'\'' {
                if bytes.get(i + 1) == Some(&b'\'') {
                    i += 2;
                    continue;
                }
                return Some(i + 1);
            }
            i += 1;
        }
        None
    }

    fn double_quoted_len(&self) -> Option<usize> {
        let bytes = self.rest().as_bytes();
        let mut i = 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b'"' => return Some(i + 1),
                _ => i += 1,
            }
        }
        None
    }

    /// Indentation of the node owning a block scalar header: the column of the
    /// first content after any `- ` indicators, or of the last `-` when the
    /// header itself is that content.
    fn block_scalar_parent_indent(&self) -> usize {
        let line_start = self.input[..self.pos].rfind('\n').map_or(0, |p| p + 1);
        let prefix = &self.input[line_start..self.pos];
        let spaces = |s: &str| s.len() - s.trim_start_matches(' ').len();

        let mut indent = spaces(prefix);
        let mut column = indent;
        while prefix[column..].starts_with("- ") {
            indent = column;
            column += 1 + spaces(&prefix[column + 1..]);
        }
        if column < prefix.len() {
            column
        } else {
            indent
        }
    }

    /// Length of a block scalar: its header line plus every following line that
    /// is blank or indented deeper than the node owning the header.
    fn block_scalar_len(&self) -> usize {
        let parent_indent = self.block_scalar_parent_indent();

        let mut end = self.pos + self.line_len();
        let mut cursor = end;
        while cursor < self.input.len() {
            // Skip the line break ending the previous line
            let after_break = if self.input[cursor..].starts_with("\r\n") {
                cursor + 2
            } else {
                cursor + 1
            };
            let line_end = self.input[after_break..]
                .find('\n')
                .map_or(self.input.len(), |p| after_break + p);
            let line = self.input[after_break..line_end].trim_end_matches('\r');
            let indent = line.chars().take_while(|c| *c == ' ').count();
            if line.trim().is_empty() {
                cursor = line_end;
                continue;
            }
            if indent <= parent_indent {
                break;
            }
            end = after_break + line.len();
            cursor = line_end;
        }
        end - self.pos
    }

    fn name_len(&self) -> usize {
        // Anchor, alias and tag names run until whitespace or a flow delimiter
        let rest = self.rest();
        rest.char_indices()
            .skip(1)
            .find(|(_, c)| c.is_whitespace() || matches!(c, ',' | '[' | ']' | '{' | '}'))
            .map_or(rest.len(), |(i, _)| i)
    }

    fn next_token(&mut self) {
        use SyntaxKind::*;

        let rest = self.rest();
        let Some(ch) = rest.chars().next() else {
            return;
        };
        let next = rest[ch.len_utf8()..].chars().next();
        let followed_by_space = next.map_or(true, char::is_whitespace);

        if self.at_line_start() {
            if self.is_marker("---") {
                self.flow_depth = 0;
                return self.push(DOC_START, 3);
            }
            if self.is_marker("...") {
                self.flow_depth = 0;
                return self.push(DOC_END, 3);
            }
            if ch == '%' && self.flow_depth == 0 {
                return self.push(DIRECTIVE, self.line_len());
            }
            if ch == ' ' || ch == '\t' {
                return self.push(INDENT, self.run_len(|c| c == ' ' || c == '\t'));
            }
        }

        match ch {
            '\n' => self.push(NEWLINE, 1),
            '\r' => {
                let len = if next == Some('\n') { 2 } else { 1 };
                self.push(NEWLINE, len)
            }
            ' ' | '\t' => self.push(WHITESPACE, self.run_len(|c| c == ' ' || c == '\t')),
            '#' => self.push(COMMENT, self.line_len()),
            '-' if followed_by_space && self.flow_depth == 0 && self.line_has_only_dashes => {
                self.push(DASH, 1)
            }
            '?' if followed_by_space && self.at_node_start() => self.push(QUESTION, 1),
            ':' if self.colon_is_indicator(self.pos) => self.push(COLON, 1),
            '[' | '{' if self.flow_depth > 0 || self.at_node_start() => {
                self.flow_depth += 1;
                self.push(if ch == '[' { LEFT_BRACKET } else { LEFT_BRACE }, 1)
            }
            ']' | '}' if self.flow_depth > 0 || self.at_node_start() => {
                self.flow_depth = self.flow_depth.saturating_sub(1);
                self.push(if ch == ']' { RIGHT_BRACKET } else { RIGHT_BRACE }, 1)
            }
            ',' if self.flow_depth > 0 || self.at_node_start() => self.push(COMMA, 1),
            '\'' if self.at_node_start() => match self.single_quoted_len() {
                Some(len) => self.push(SINGLE_QUOTED, len),
                None => self.push(UNTERMINATED_STRING, rest.len()),
            },
            '"' if self.at_node_start() => match self.double_quoted_len() {
                Some(len) => self.push(DOUBLE_QUOTED, len),
                None => self.push(UNTERMINATED_STRING, rest.len()),
            },
            '|' | '>' if self.flow_depth == 0 && self.at_node_start() => {
                self.push(BLOCK_SCALAR, self.block_scalar_len())
            }
            '&' | '*' | '!' if self.at_node_start() && !followed_by_space => {
                let kind = match ch {
                    '&' => ANCHOR,
                    '*' => REFERENCE,
                    _ => TAG,
                };
                self.push(kind, self.name_len())
            }
            _ => {
                let len = self.plain_len();
                let kind = classify_scalar(&rest[..len]);
                self.push(kind, len)
            }
        }
    }
}

/// Tokenize YAML input
pub fn lex(input: &str) -> Vec<(SyntaxKind, &str)> {
    let mut lexer = Lexer {
        input,
        pos: 0,
        tokens: Vec::new(),
        flow_depth: 0,
        prev: None,
        line_has_only_dashes: true,
    };

    while lexer.pos < input.len() {
        lexer.next_token();
    }

    lexer.tokens
}

/// Classify a plain scalar token based on its content
fn classify_scalar(text: &str) -> SyntaxKind {
    use SyntaxKind::*;

    match text {
        "true" | "false" | "True" | "False" | "TRUE" | "FALSE" => return BOOL,
        "null" | "Null" | "NULL" | "~" => return NULL,
        _ => {}
    }

    if text.parse::<i64>().is_ok() {
        return INT;
    }

    // Rust accepts "inf" and "NaN" where YAML wants ".inf" and ".nan"
    if text.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'))
        && text.parse::<f64>().is_ok()
    {
        return FLOAT;
    }

    STRING
}

#[cfg(test)]
mod tests {
    use super::*;
    use SyntaxKind::*;

    fn kinds(input: &str) -> Vec<SyntaxKind> {
        lex(input).into_iter().map(|(kind, _)| kind).collect()
    }

    #[test]
    fn test_simple_mapping() {
        let tokens = lex("key: value");
        assert_eq!(
            tokens,
            vec![
                (STRING, "key"),
                (COLON, ":"),
                (WHITESPACE, " "),
                (STRING, "value")
            ]
        );
    }

    #[test]
    fn test_scalar_types() {
        assert_eq!(lex("age: 42")[3], (INT, "42"));
        assert_eq!(lex("pi: 3.14")[3], (FLOAT, "3.14"));
        assert_eq!(lex("enabled: true")[3], (BOOL, "true"));
        assert_eq!(lex("value: ~")[3], (NULL, "~"));
        assert_eq!(lex("version: 1.30.0")[3], (STRING, "1.30.0"));
        assert_eq!(lex("name: inf")[3], (STRING, "inf"));
    }

    #[test]
    fn test_sequences() {
        assert_eq!(
            lex("- item1\n- item2"),
            vec![
                (DASH, "-"),
                (WHITESPACE, " "),
                (STRING, "item1"),
                (NEWLINE, "\n"),
                (DASH, "-"),
                (WHITESPACE, " "),
                (STRING, "item2"),
            ]
        );
    }

    #[test]
    fn test_nested_dashes() {
        assert_eq!(kinds("- - a"), vec![DASH, WHITESPACE, DASH, WHITESPACE, STRING]);
    }

    #[test]
    fn test_hyphen_in_scalars() {
        assert_eq!(lex("name: example-project")[3], (STRING, "example-project"));
        assert_eq!(lex("a: b - c")[3], (STRING, "b"));
        assert_eq!(lex("a: b - c")[5], (STRING, "-"));
        assert_eq!(lex("n: -1")[3], (INT, "-1"));
    }

    #[test]
    fn test_colon_inside_plain_scalar() {
        let tokens = lex("image: quay.io/repo:tag");
        assert_eq!(tokens[3], (STRING, "quay.io/repo:tag"));

        let tokens = lex("url: http://example.com");
        assert_eq!(tokens[3], (STRING, "http://example.com"));
    }

    #[test]
    fn test_quoted_strings() {
        let tokens = lex(r#"a: "x # not a comment""#);
        assert_eq!(tokens[3], (DOUBLE_QUOTED, r#""x # not a comment""#));

        let tokens = lex("a: 'it''s'");
        assert_eq!(tokens[3], (SINGLE_QUOTED, "'it''s'"));

        let tokens = lex(r#"a: "esc \" quote""#);
        assert_eq!(tokens[3], (DOUBLE_QUOTED, r#""esc \" quote""#));
    }

    #[test]
    fn test_quote_inside_plain_scalar() {
        let tokens = lex("a: it's fine");
        assert_eq!(tokens[3], (STRING, "it's"));
    }

    #[test]
    fn test_unterminated_string() {
        let tokens = lex("a: \"open\nb: c");
        assert_eq!(tokens[3].0, UNTERMINATED_STRING);
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            kinds("a: b # trailing\n# full line"),
            vec![STRING, COLON, WHITESPACE, STRING, WHITESPACE, COMMENT, NEWLINE, COMMENT]
        );
        // '#' glued to a scalar is content
        assert_eq!(lex("a: b#c")[3], (STRING, "b#c"));
    }

    #[test]
    fn test_flow_collections() {
        assert_eq!(
            kinds("[a, b]"),
            vec![LEFT_BRACKET, STRING, COMMA, WHITESPACE, STRING, RIGHT_BRACKET]
        );
        assert_eq!(
            kinds("{a: 1}"),
            vec![LEFT_BRACE, STRING, COLON, WHITESPACE, INT, RIGHT_BRACE]
        );
        assert_eq!(
            kinds(r#"{"a":1}"#),
            vec![LEFT_BRACE, DOUBLE_QUOTED, COLON, INT, RIGHT_BRACE]
        );
    }

    #[test]
    fn test_brackets_inside_block_scalar() {
        assert_eq!(lex("a: b[0]")[3], (STRING, "b[0]"));
        assert_eq!(lex("a: x, y")[3], (STRING, "x,"));
    }

    #[test]
    fn test_document_markers() {
        assert_eq!(
            kinds("---\na: 1\n...\n"),
            vec![DOC_START, NEWLINE, STRING, COLON, WHITESPACE, INT, NEWLINE, DOC_END, NEWLINE]
        );
        // Not a marker unless at the start of a line
        assert_eq!(lex("a: ---")[3], (STRING, "---"));
    }

    #[test]
    fn test_indentation() {
        assert_eq!(
            kinds("a:\n  b: 1"),
            vec![STRING, COLON, NEWLINE, INDENT, STRING, COLON, WHITESPACE, INT]
        );
    }

    #[test]
    fn test_block_scalar_extent() {
        let input = "text: |\n  line one\n\n  line two\nnext: 1\n";
        let tokens = lex(input);
        assert_eq!(tokens[3], (BLOCK_SCALAR, "|\n  line one\n\n  line two"));
        assert_eq!(tokens[4], (NEWLINE, "\n"));
        assert_eq!(tokens[5], (STRING, "next"));
    }

    #[test]
    fn test_block_scalar_keeps_quotes_and_hashes() {
        let input = "script: >-\n  echo \"# hi\n  it's\n";
        let tokens = lex(input);
        assert_eq!(tokens[3], (BLOCK_SCALAR, ">-\n  echo \"# hi\n  it's"));
    }

    #[test]
    fn test_block_scalar_in_sequence() {
        let tokens = lex("- run: |\n    make\n  name: build\n");
        assert_eq!(tokens[5], (BLOCK_SCALAR, "|\n    make"));
        assert_eq!(tokens[7], (INDENT, "  "));
        assert_eq!(lex("- |\n  text\n- next\n")[2], (BLOCK_SCALAR, "|\n  text"));
    }

    #[test]
    fn test_anchors_tags_aliases() {
        assert_eq!(
            kinds("a: &x !!str v\nb: *x"),
            vec![
                STRING, COLON, WHITESPACE, ANCHOR, WHITESPACE, TAG, WHITESPACE, STRING, NEWLINE,
                STRING, COLON, WHITESPACE, REFERENCE
            ]
        );
        // A lone ampersand is plain text
        assert_eq!(lex("a: Tom & Jerry")[5], (STRING, "&"));
    }

    #[test]
    fn test_directive() {
        assert_eq!(lex("%YAML 1.2\n---")[0], (DIRECTIVE, "%YAML 1.2"));
    }

    #[test]
    fn test_lossless() {
        let input = "a:   b  # c\r\n  - [x,  y]\n\t'q': \"r\"\n";
        let joined: String = lex(input).into_iter().map(|(_, text)| text).collect();
        assert_eq!(joined, input);
    }
}
