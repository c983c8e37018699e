use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Source language an entity was extracted from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Golang,
    Java,
    Python,
    Kotlin,
    JavaScript,
    #[default]
    Unknown,
}

impl Language {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Golang => "golang",
            Self::Java => "java",
            Self::Python => "python",
            Self::Kotlin => "kotlin",
            Self::JavaScript => "javascript",
            Self::Unknown => "unknown",
        }
    }

    /// Detect language from a file extension (without the dot)
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "go" => Self::Golang,
            "java" => Self::Java,
            "py" | "pyi" => Self::Python,
            "kt" | "kts" => Self::Kotlin,
            "js" | "mjs" | "cjs" | "jsx" => Self::JavaScript,
            _ => Self::Unknown,
        }
    }
}

impl FromStr for Language {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "golang" | "go" => Self::Golang,
            "java" => Self::Java,
            "python" => Self::Python,
            "kotlin" => Self::Kotlin,
            "javascript" | "js" => Self::JavaScript,
            _ => Self::Unknown,
        })
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque identifier of the parse-tree node an entity was extracted from.
///
/// Entities outlive the tree they came from, so they keep an id the
/// extractor can resolve while its tree is alive instead of a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Typed name, used for parameters and return values
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueUnit {
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
}

impl ValueUnit {
    pub fn new(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
        }
    }
}

/// A declared function or method
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Function {
    pub name: String,

    /// Owning type for methods, empty for free functions
    #[serde(default)]
    pub receiver: String,

    #[serde(default)]
    pub parameters: Vec<ValueUnit>,

    #[serde(default)]
    pub returns: Vec<ValueUnit>,

    /// Where the definition actually happens, ignoring annotations/decorators
    #[serde(default)]
    pub def_line: u32,

    /// Header and body
    pub span: Span,

    /// Body only
    #[serde(default)]
    pub body_span: Span,

    #[serde(default)]
    pub lang: Language,

    /// Language-specific payload, opaque to the graph
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub extras: serde_json::Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeId>,
}

impl Function {
    pub fn new(name: impl Into<String>, span: Span, body_span: Span) -> Self {
        Self {
            name: name.into(),
            def_line: span.start.row,
            span,
            body_span,
            ..Default::default()
        }
    }

    /// Builder: set receiver
    #[must_use]
    pub fn receiver(mut self, receiver: impl Into<String>) -> Self {
        self.receiver = receiver.into();
        self
    }

    /// Builder: add parameter
    #[must_use]
    pub fn param(mut self, type_name: impl Into<String>, name: impl Into<String>) -> Self {
        self.parameters.push(ValueUnit::new(type_name, name));
        self
    }

    /// Builder: add return value
    #[must_use]
    pub fn returns(mut self, type_name: impl Into<String>, name: impl Into<String>) -> Self {
        self.returns.push(ValueUnit::new(type_name, name));
        self
    }

    /// Builder: set language
    #[must_use]
    pub const fn lang(mut self, lang: Language) -> Self {
        self.lang = lang;
        self
    }

    /// Builder: set parse-tree node id
    #[must_use]
    pub const fn node(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }

    /// The region whose symbols belong to this function: the body, or the
    /// whole declaration when the extractor produced no body span.
    #[must_use]
    pub fn scope_span(&self) -> &Span {
        if self.body_span.is_empty() {
            &self.span
        } else {
            &self.body_span
        }
    }
}

/// Named token occurrence. Declarations and references look the same.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    pub symbol: String,

    #[serde(default)]
    pub kind: String,

    pub span: Span,

    #[serde(default)]
    pub field_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeId>,
}

impl Symbol {
    pub fn new(symbol: impl Into<String>, kind: impl Into<String>, span: Span) -> Self {
        Self {
            symbol: symbol.into(),
            kind: kind.into(),
            span,
            field_name: String::new(),
            node: None,
        }
    }

    /// Line index of the occurrence
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.span.start.row
    }
}

/// Function plus the file it was declared in.
///
/// Extracted functions do not know their file, they may not come from one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionWithPath {
    #[serde(flatten)]
    pub function: Function,
    pub path: String,
}

impl FunctionWithPath {
    pub fn new(function: Function, path: impl Into<String>) -> Self {
        Self {
            function,
            path: path.into(),
        }
    }
}

impl std::ops::Deref for FunctionWithPath {
    type Target = Function;

    fn deref(&self) -> &Function {
        &self.function
    }
}

/// Extraction output for one file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileResult<T> {
    pub path: String,
    #[serde(default)]
    pub language: Language,
    pub units: Vec<T>,
}

pub type FunctionFile = FileResult<Function>;
pub type SymbolFile = FileResult<Symbol>;

impl<T> FileResult<T> {
    pub fn new(path: impl Into<String>, language: Language, units: Vec<T>) -> Self {
        Self {
            path: path.into(),
            language,
            units,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
