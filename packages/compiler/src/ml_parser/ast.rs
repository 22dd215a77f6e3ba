//! HTML AST
//!
//! Node tree produced by the HTML parser. Consumers dispatch with `match` on
//! `Node`.

use crate::parse_util::ParseSourceSpan;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(Text),
    Attribute(Attribute),
    Comment(Comment),
    Expansion(Expansion),
    ExpansionCase(ExpansionCase),
}

impl Node {
    pub fn source_span(&self) -> &ParseSourceSpan {
        match self {
            Node::Element(e) => &e.source_span,
            Node::Text(t) => &t.source_span,
            Node::Attribute(a) => &a.source_span,
            Node::Comment(c) => &c.source_span,
            Node::Expansion(e) => &e.source_span,
            Node::ExpansionCase(c) => &c.source_span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub value: String,
    pub source_span: ParseSourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
    pub source_span: ParseSourceSpan,
    pub value_span: Option<ParseSourceSpan>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>, source_span: ParseSourceSpan) -> Self {
        Attribute {
            name: name.into(),
            value: value.into(),
            source_span,
            value_span: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<Attribute>,
    pub children: Vec<Node>,
    pub source_span: ParseSourceSpan,
    pub start_source_span: ParseSourceSpan,
    pub end_source_span: Option<ParseSourceSpan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub value: Option<String>,
    pub source_span: ParseSourceSpan,
}

/// An ICU message: `{count, plural, =0 {none} other {many}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    pub switch_value: String,
    pub type_: String,
    pub cases: Vec<ExpansionCase>,
    pub source_span: ParseSourceSpan,
    pub switch_value_source_span: ParseSourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionCase {
    pub value: String,
    pub expression: Vec<Node>,
    pub source_span: ParseSourceSpan,
    pub value_source_span: ParseSourceSpan,
    pub exp_source_span: ParseSourceSpan,
}
