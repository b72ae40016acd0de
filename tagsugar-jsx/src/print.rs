use serde::Serialize;

use crate::ast::{Attr, AttrValue, Document, Element, Expr, Fragment, Node, Span};

/// One generated position and the source position it came from (both 1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Mapping {
    pub generated_line: usize,
    pub generated_column: usize,
    pub original_line: usize,
    pub original_column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SourceMap {
    pub mappings: Vec<Mapping>,
}

impl SourceMap {
    /// Closest mapping at or before a generated position.
    pub fn lookup(&self, line: usize, column: usize) -> Option<&Mapping> {
        self.mappings
            .iter()
            .filter(|m| (m.generated_line, m.generated_column) <= (line, column))
            .max_by_key(|m| (m.generated_line, m.generated_column))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Printed {
    pub code: String,
    pub map: SourceMap,
}

pub fn print_document(doc: &Document) -> Printed {
    let mut p = Printer::default();
    for n in &doc.children {
        p.node(n, true);
    }
    p.finish()
}

pub fn print_node(node: &Node) -> Printed {
    let mut p = Printer::default();
    p.node(node, true);
    p.finish()
}

pub fn print_expr(expr: &Expr) -> String {
    let mut p = Printer::default();
    p.expr(expr);
    p.finish().code
}

struct Printer {
    out: String,
    line: usize,
    column: usize,
    map: SourceMap,
}

impl Default for Printer {
    fn default() -> Self {
        Self {
            out: String::new(),
            line: 1,
            column: 1,
            map: SourceMap::default(),
        }
    }
}

impl Printer {
    fn finish(self) -> Printed {
        Printed {
            code: self.out,
            map: self.map,
        }
    }

    fn push(&mut self, s: &str) {
        for ch in s.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.out.push_str(s);
    }

    fn mark(&mut self, span: Span) {
        if span.is_synthetic() {
            return;
        }
        // an enclosing node already mapped this generated position
        if self
            .map
            .mappings
            .last()
            .is_some_and(|m| (m.generated_line, m.generated_column) == (self.line, self.column))
        {
            return;
        }
        self.map.mappings.push(Mapping {
            generated_line: self.line,
            generated_column: self.column,
            original_line: span.line,
            original_column: span.column,
        });
    }

    /// `top` is true outside markup, where a bare expression needs no braces.
    fn node(&mut self, n: &Node, top: bool) {
        self.mark(n.span());
        match n {
            Node::Element(el) => self.element(el),
            Node::Text(t) => self.push(&t.value),
            Node::ExprContainer(c) => {
                self.push("{");
                self.expr(&c.expr);
                self.push("}");
            }
            Node::Fragment(f) => self.fragment(f),
            Node::Expr(e) if top => self.expr(e),
            Node::Expr(e) => {
                self.push("{");
                self.expr(e);
                self.push("}");
            }
        }
    }

    fn element(&mut self, el: &Element) {
        self.push("<");
        self.push(&el.tag);
        for a in &el.attrs {
            self.push(" ");
            self.attr(a);
        }
        if el.self_closing && el.children.is_empty() {
            self.push(" />");
            return;
        }
        self.push(">");
        for c in &el.children {
            self.node(c, false);
        }
        self.push("</");
        self.push(&el.tag);
        self.push(">");
    }

    fn attr(&mut self, a: &Attr) {
        self.push(&a.name);
        match &a.value {
            None => {}
            Some(AttrValue::Literal(s)) => {
                // literals carry no escapes; pick the quote that is absent
                let q = if s.contains('"') { "'" } else { "\"" };
                self.push("=");
                self.push(q);
                self.push(s);
                self.push(q);
            }
            Some(AttrValue::Expr(e)) => {
                self.push("={");
                self.expr(e);
                self.push("}");
            }
        }
    }

    fn fragment(&mut self, f: &Fragment) {
        self.push("<>");
        for c in &f.children {
            self.node(c, false);
        }
        self.push("</>");
    }

    fn expr(&mut self, e: &Expr) {
        match e {
            Expr::Raw { source, span } => {
                self.mark(*span);
                self.push(source);
            }
            Expr::Null => self.push("null"),
            Expr::Fragment(f) => {
                self.mark(f.span);
                self.fragment(f);
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                self.operand(test);
                self.push(" ? ");
                self.operand(consequent);
                self.push(" : ");
                self.operand(alternate);
            }
            Expr::Call { callee, args } => {
                self.operand(callee);
                self.push("(");
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.argument(a);
                }
                self.push(")");
            }
            Expr::Member { object, property } => {
                self.operand(object);
                self.push(".");
                self.push(property);
            }
            Expr::Arrow { param, body } => {
                self.push("(");
                self.push(param);
                self.push(") => ");
                self.expr(body);
            }
        }
    }

    /// Expressions in operand position: parenthesized unless they bind tighter
    /// than any operator we emit around them.
    fn operand(&mut self, e: &Expr) {
        if is_atom(e) {
            self.expr(e);
        } else {
            self.push("(");
            self.expr(e);
            self.push(")");
        }
    }

    /// A raw argument with a top-level comma (`a, b`) is one sequence expression,
    /// not several arguments.
    fn argument(&mut self, e: &Expr) {
        match e {
            Expr::Raw { source, .. } if has_top_level_comma(source) => {
                self.push("(");
                self.expr(e);
                self.push(")");
            }
            _ => self.expr(e),
        }
    }
}

fn is_atom(e: &Expr) -> bool {
    match e {
        Expr::Raw { source, .. } => is_simple_path(source.trim()),
        Expr::Null | Expr::Fragment(_) | Expr::Call { .. } | Expr::Member { .. } => true,
        Expr::Conditional { .. } | Expr::Arrow { .. } => false,
    }
}

// `items`, `props.items`, `$state.list`
fn is_simple_path(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && !s.ends_with('.')
        && s.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$' || c == '.')
}

/// Commas outside brackets and string literals.
fn has_top_level_comma(s: &str) -> bool {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for ch in s.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' | '`' => quote = Some(ch),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return true,
            _ => {}
        }
    }
    false
}
