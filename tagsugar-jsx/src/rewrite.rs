use crate::TransformOptions;
use crate::ast::{Document, Element, Expr, ExprContainer, Fragment, Node};
use crate::schema::{self, PseudoTagKind, SchemaError};
use crate::synth;

/// Rewrite one tree with default options.
pub fn rewrite(root: Node) -> Result<Node, SchemaError> {
    Rewriter::default().rewrite(root)
}

pub fn rewrite_document(doc: Document) -> Result<Document, SchemaError> {
    Rewriter::default().rewrite_document(doc)
}

/// Replaces every `$if`/`$for`/`$let` element with the expression it stands for.
/// Children are resolved before their enclosing tag, so nesting of any kind works.
#[derive(Debug, Clone, Default)]
pub struct Rewriter {
    options: TransformOptions,
}

impl Rewriter {
    pub fn new(options: TransformOptions) -> Self {
        Self { options }
    }

    pub fn rewrite_document(&self, doc: Document) -> Result<Document, SchemaError> {
        Ok(Document {
            children: self.rewrite_children(doc.children)?,
        })
    }

    pub fn rewrite(&self, node: Node) -> Result<Node, SchemaError> {
        match node {
            Node::Element(el) => match PseudoTagKind::from_tag(&el.tag) {
                Some(kind) => self.desugar(kind, el).map(Node::ExprContainer),
                None => {
                    log::trace!("walking <{}> at {}:{}", el.tag, el.span.line, el.span.column);
                    Ok(Node::Element(Element {
                        children: self.rewrite_children(el.children)?,
                        ..el
                    }))
                }
            },
            Node::Fragment(f) => self.rewrite_fragment(f).map(Node::Fragment),
            Node::ExprContainer(c) => Ok(Node::ExprContainer(ExprContainer {
                expr: self.rewrite_expr(c.expr)?,
                span: c.span,
            })),
            Node::Expr(e) => self.rewrite_expr(e).map(Node::Expr),
            Node::Text(t) => Ok(Node::Text(t)),
        }
    }

    fn rewrite_children(&self, children: Vec<Node>) -> Result<Vec<Node>, SchemaError> {
        children.into_iter().map(|n| self.rewrite(n)).collect()
    }

    fn rewrite_fragment(&self, f: Fragment) -> Result<Fragment, SchemaError> {
        Ok(Fragment {
            children: self.rewrite_children(f.children)?,
            span: f.span,
        })
    }

    // Raw source is opaque; only structured expressions can hold markup.
    fn rewrite_expr(&self, expr: Expr) -> Result<Expr, SchemaError> {
        let boxed = |e: Box<Expr>| self.rewrite_expr(*e).map(Box::new);
        Ok(match expr {
            Expr::Raw { .. } | Expr::Null => expr,
            Expr::Fragment(f) => Expr::Fragment(self.rewrite_fragment(f)?),
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => Expr::Conditional {
                test: boxed(test)?,
                consequent: boxed(consequent)?,
                alternate: boxed(alternate)?,
            },
            Expr::Call { callee, args } => Expr::Call {
                callee: boxed(callee)?,
                args: args
                    .into_iter()
                    .map(|a| self.rewrite_expr(a))
                    .collect::<Result<_, _>>()?,
            },
            Expr::Member { object, property } => Expr::Member {
                object: boxed(object)?,
                property,
            },
            Expr::Arrow { param, body } => Expr::Arrow {
                param,
                body: boxed(body)?,
            },
        })
    }

    fn desugar(&self, kind: PseudoTagKind, el: Element) -> Result<ExprContainer, SchemaError> {
        let span = el.span;
        let children = self.rewrite_children(el.children)?;
        let attrs = schema::validate_with(kind, &el.attrs, &self.options).map_err(|violations| {
            SchemaError {
                tag: kind,
                span,
                violations,
            }
        })?;
        log::debug!(
            "desugaring {kind} at {}:{} ({} children)",
            span.line,
            span.column,
            children.len()
        );
        let body = Fragment {
            children,
            span: Default::default(),
        };
        Ok(synth::synthesize(attrs, body, span))
    }
}
