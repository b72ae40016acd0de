use pest::Parser;
use pest::error::LineColLocation;
use pest::iterators::Pair;
use thiserror::Error;

use crate::ast::{Attr, AttrValue, Document, Element, Expr, ExprContainer, Fragment, Node, Span, Text};

#[derive(pest_derive::Parser)]
#[grammar = "markup.pest"]
struct MarkupParser;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("syntax error at {line}:{column}: {message}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },
    #[error("duplicate attribute `{name}` on <{tag}> at {}:{}", .span.line, .span.column)]
    DuplicateAttribute { tag: String, name: String, span: Span },
}

/// Parse markup source into a [`Document`]:
/// - nested elements, self-closing tags (`<br/>`) and `<>...</>` fragments
/// - attributes: literal (`var="x"`), embedded expression (`of={items}`), bare flags
/// - text and `{expr}` containers, with expression source kept verbatim
pub fn parse_document(source: &str) -> Result<Document, ParseError> {
    let mut pairs = MarkupParser::parse(Rule::document, source).map_err(syntax_error)?;
    let Some(document) = pairs.next() else {
        return Ok(Document::default());
    };
    debug_assert!(document.as_rule() == Rule::document);

    let mut children = Vec::new();
    for node in document.into_inner() {
        if node.as_rule() == Rule::EOI {
            continue;
        }
        children.push(build_node(node)?);
    }
    Ok(Document { children })
}

fn syntax_error(e: pest::error::Error<Rule>) -> ParseError {
    let (line, column) = match e.line_col {
        LineColLocation::Pos(pos) => pos,
        LineColLocation::Span(start, _) => start,
    };
    ParseError::Syntax {
        message: e.variant.message().into_owned(),
        line,
        column,
    }
}

fn span_of(pair: &Pair<Rule>) -> Span {
    let span = pair.as_span();
    let (line, column) = span.start_pos().line_col();
    Span {
        start: span.start(),
        end: span.end(),
        line,
        column,
    }
}

fn build_node(pair: Pair<Rule>) -> Result<Node, ParseError> {
    let span = span_of(&pair);
    match pair.as_rule() {
        Rule::text => Ok(Node::Text(Text {
            value: pair.as_str().to_string(),
            span,
        })),
        Rule::expr_container => Ok(Node::ExprContainer(ExprContainer {
            expr: build_expr(pair),
            span,
        })),
        Rule::fragment => Ok(Node::Fragment(Fragment {
            children: build_children(pair.into_inner())?,
            span,
        })),
        Rule::element => build_element(pair).map(Node::Element),
        rule => unreachable!("grammar yields no {rule:?} in content position"),
    }
}

fn build_children<'i>(pairs: impl Iterator<Item = Pair<'i, Rule>>) -> Result<Vec<Node>, ParseError> {
    pairs.map(build_node).collect()
}

fn build_element(pair: Pair<Rule>) -> Result<Element, ParseError> {
    let span = span_of(&pair);
    let mut inner = pair.into_inner();
    let Some(head) = inner.next() else {
        unreachable!("element always starts with a tag");
    };
    let self_closing = head.as_rule() == Rule::self_closing;

    let mut tag = String::new();
    let mut attrs: Vec<Attr> = Vec::new();
    for part in head.into_inner() {
        match part.as_rule() {
            Rule::tag_name => tag = part.as_str().to_string(),
            Rule::attribute => {
                let attr = build_attr(part);
                if attrs.iter().any(|a| a.name == attr.name) {
                    return Err(ParseError::DuplicateAttribute {
                        tag,
                        name: attr.name,
                        span: attr.span,
                    });
                }
                attrs.push(attr);
            }
            _ => {}
        }
    }

    // remaining pairs of an open/close element: content nodes, then the close tag
    let children = build_children(inner.filter(|p| p.as_rule() != Rule::close_tag))?;

    Ok(Element {
        tag,
        attrs,
        children,
        self_closing,
        span,
    })
}

fn build_attr(pair: Pair<Rule>) -> Attr {
    // attribute = attr_name ( "=" (string_literal | expr_value) )?
    let span = span_of(&pair);
    let mut name = String::new();
    let mut value: Option<AttrValue> = None;

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::attr_name => name = part.as_str().to_string(),
            Rule::string_literal => {
                let chars = part.into_inner().next().map(|p| p.as_str()).unwrap_or("");
                value = Some(AttrValue::Literal(chars.to_string()));
            }
            Rule::expr_value => value = Some(AttrValue::Expr(build_expr(part))),
            _ => {}
        }
    }
    Attr { name, value, span }
}

/// `{ source }` -> `Expr::Raw`, spanning the source between the braces.
fn build_expr(braced: Pair<Rule>) -> Expr {
    match braced.into_inner().find(|p| p.as_rule() == Rule::expr_source) {
        Some(source) => Expr::Raw {
            span: span_of(&source),
            source: source.as_str().to_string(),
        },
        None => Expr::raw(""),
    }
}
