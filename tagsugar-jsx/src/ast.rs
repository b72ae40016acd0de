use serde::Serialize;

/// Source location of a node: byte range plus the 1-based line/column of its start.
/// `Span::default()` marks a node synthesized by the rewriter with no source of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn is_synthetic(&self) -> bool {
        self.line == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(Text),
    ExprContainer(ExprContainer), // {expr}
    Fragment(Fragment),           // <>...</>
    Expr(Expr),
}

impl Node {
    pub fn span(&self) -> Span {
        match self {
            Node::Element(e) => e.span,
            Node::Text(t) => t.span,
            Node::ExprContainer(c) => c.span,
            Node::Fragment(f) => f.span,
            Node::Expr(e) => e.span(),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(Text {
            value: value.into(),
            span: Span::default(),
        })
    }

    pub fn raw(source: impl Into<String>) -> Self {
        Node::ExprContainer(ExprContainer {
            expr: Expr::raw(source),
            span: Span::default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<Attr>,
    pub children: Vec<Node>,
    pub self_closing: bool,
    pub span: Span,
}

impl Element {
    pub fn new(tag: impl Into<String>, attrs: Vec<Attr>, children: Vec<Node>) -> Self {
        Self {
            tag: tag.into(),
            attrs,
            children,
            self_closing: false,
            span: Span::default(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&Attr> {
        self.attrs.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub value: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprContainer {
    pub expr: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    pub children: Vec<Node>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub name: String,
    pub value: Option<AttrValue>, // None for bare boolean attrs, e.g. `disabled`
    pub span: Span,
}

impl Attr {
    pub fn literal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(AttrValue::Literal(value.into())),
            span: Span::default(),
        }
    }

    pub fn expr(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(AttrValue::Expr(Expr::raw(source))),
            span: Span::default(),
        }
    }

    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            span: Span::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Literal(String), // var="item"
    Expr(Expr),      // of={items}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Embedded expression source, kept verbatim and never re-parsed.
    Raw { source: String, span: Span },
    Null,
    Fragment(Fragment),
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Member {
        object: Box<Expr>,
        property: String,
    },
    /// Single-parameter arrow function; `param` is binding-pattern source text.
    Arrow { param: String, body: Box<Expr> },
}

impl Expr {
    pub fn raw(source: impl Into<String>) -> Self {
        Expr::Raw {
            source: source.into(),
            span: Span::default(),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Expr::Raw { span, .. } => *span,
            Expr::Fragment(f) => f.span,
            _ => Span::default(),
        }
    }
}

/// Top-level content of one source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub children: Vec<Node>,
}
