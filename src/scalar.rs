//! Scalar values and how they are written back into a document.

use std::fmt;

/// Style of scalar representation in YAML
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarStyle {
    /// Plain scalar (no quotes)
    Plain,
    /// Single-quoted scalar
    SingleQuoted,
    /// Double-quoted scalar
    DoubleQuoted,
    /// Literal block scalar (|)
    Literal,
    /// Folded block scalar (>)
    Folded,
}

/// Type of a scalar value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// String value
    String,
    /// Integer value
    Integer,
    /// Float value
    Float,
    /// Boolean value
    Boolean,
    /// Null value
    Null,
}

/// A scalar value with metadata about its style and content
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScalarValue {
    value: String,
    style: ScalarStyle,
    scalar_type: ScalarType,
}

impl ScalarValue {
    /// Create a string scalar, quoted only when the plain form would read back differently
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let style = Self::detect_style(&value);
        Self {
            value,
            style,
            scalar_type: ScalarType::String,
        }
    }

    /// Create a new string scalar with a specific style
    pub fn with_style(value: impl Into<String>, style: ScalarStyle) -> Self {
        Self {
            value: value.into(),
            style,
            scalar_type: ScalarType::String,
        }
    }

    /// Create a single-quoted scalar
    pub fn single_quoted(value: impl Into<String>) -> Self {
        Self::with_style(value, ScalarStyle::SingleQuoted)
    }

    /// Create a double-quoted scalar
    pub fn double_quoted(value: impl Into<String>) -> Self {
        Self::with_style(value, ScalarStyle::DoubleQuoted)
    }

    /// Create a null scalar
    pub fn null() -> Self {
        Self {
            value: "null".to_string(),
            style: ScalarStyle::Plain,
            scalar_type: ScalarType::Null,
        }
    }

    /// Get the raw value
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Get the style
    pub fn style(&self) -> ScalarStyle {
        self.style
    }

    /// Get the type
    pub fn scalar_type(&self) -> ScalarType {
        self.scalar_type
    }

    /// Adopt the quoting of a scalar already in the document.
    ///
    /// Quoted styles are kept. A plain or block original leaves the value's
    /// own style in place, so plain stays plain unless it has to be quoted.
    pub fn styled_like(mut self, existing: ScalarStyle) -> Self {
        if self.scalar_type == ScalarType::String
            && matches!(
                existing,
                ScalarStyle::SingleQuoted | ScalarStyle::DoubleQuoted
            )
        {
            self.style = existing;
        }
        self
    }

    fn detect_style(value: &str) -> ScalarStyle {
        if value.contains('\n') || value.chars().any(char::is_control) {
            ScalarStyle::DoubleQuoted
        } else if Self::needs_quoting(value) {
            if value.contains('\'') {
                ScalarStyle::DoubleQuoted
            } else {
                ScalarStyle::SingleQuoted
            }
        } else {
            ScalarStyle::Plain
        }
    }

    /// Whether a string would not read back as itself when written plain
    pub fn needs_quoting(value: &str) -> bool {
        if value.is_empty() || value != value.trim() {
            return true;
        }

        // Keywords that resolve to booleans or null
        if matches!(
            value.to_lowercase().as_str(),
            "true" | "false" | "yes" | "no" | "on" | "off" | "y" | "n" | "null" | "~"
        ) {
            return true;
        }

        // Numbers must stay strings
        if value.parse::<i64>().is_ok() || value.parse::<f64>().is_ok() {
            return true;
        }

        if value.chars().any(|ch| {
            matches!(
                ch,
                ':' | '#'
                    | '&'
                    | '*'
                    | '!'
                    | '|'
                    | '>'
                    | '\''
                    | '"'
                    | '%'
                    | '@'
                    | '`'
                    | ','
                    | '['
                    | ']'
                    | '{'
                    | '}'
            ) || ch.is_control()
        }) {
            return true;
        }

        value.starts_with(['-', '?'])
    }

    /// Render the scalar as a YAML string with proper escaping.
    ///
    /// The result always fits on the line after a `key: ` or `- ` indicator:
    /// block styles and multi-line single-quoted values are written double-quoted.
    pub fn to_yaml_string(&self) -> String {
        match self.style {
            ScalarStyle::Plain => match self.scalar_type {
                ScalarType::String if Self::needs_quoting(&self.value) => {
                    match Self::detect_style(&self.value) {
                        ScalarStyle::SingleQuoted => self.to_single_quoted(),
                        _ => self.to_double_quoted(),
                    }
                }
                _ => self.value.clone(),
            },
            ScalarStyle::SingleQuoted
                if !self.value.contains('\n') && !self.value.chars().any(char::is_control) =>
            {
                self.to_single_quoted()
            }
            ScalarStyle::SingleQuoted
            | ScalarStyle::DoubleQuoted
            | ScalarStyle::Literal
            | ScalarStyle::Folded => self.to_double_quoted(),
        }
    }

    fn to_single_quoted(&self) -> String {
        format!("'{}'", self.value.replace('\'', "''"))
    }

    fn to_double_quoted(&self) -> String {
        let mut result = String::from("\"");
        for ch in self.value.chars() {
            match ch {
                '"' => result.push_str("\\\""),
                '\\' => result.push_str("\\\\"),
                '\n' => result.push_str("\\n"),
                '\r' => result.push_str("\\r"),
                '\t' => result.push_str("\\t"),
                '\x08' => result.push_str("\\b"),
                '\x0C' => result.push_str("\\f"),
                c if c.is_control() => {
                    result.push_str(&format!("\\x{:02x}", c as u32));
                }
                c => result.push(c),
            }
        }
        result.push('"');
        result
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_yaml_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<&semver::Version> for ScalarValue {
    fn from(value: &semver::Version) -> Self {
        Self::new(value.to_string())
    }
}

macro_rules! typed_scalar_from {
    ($($ty:ty => $scalar_type:ident),* $(,)?) => {
        $(
            impl From<$ty> for ScalarValue {
                fn from(value: $ty) -> Self {
                    Self {
                        value: value.to_string(),
                        style: ScalarStyle::Plain,
                        scalar_type: ScalarType::$scalar_type,
                    }
                }
            }
        )*
    };
}

typed_scalar_from!(
    i32 => Integer,
    i64 => Integer,
    u32 => Integer,
    u64 => Integer,
    f64 => Float,
    bool => Boolean,
);
