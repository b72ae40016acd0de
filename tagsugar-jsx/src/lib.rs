pub mod ast;
pub mod parse;
pub mod print;
pub mod rewrite;
pub mod schema;
pub mod synth;


use thiserror::Error;

pub use ast::{Attr, AttrValue, Document, Element, Expr, ExprContainer, Fragment, Node, Span, Text};
pub use parse::{ParseError, parse_document};
pub use print::{Mapping, Printed, SourceMap, print_document, print_expr, print_node};
pub use rewrite::{Rewriter, rewrite, rewrite_document};
pub use schema::{PseudoTagKind, SchemaError, ValidatedAttributes, Violations, validate, validate_with};
pub use synth::synthesize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransformOptions {
    /// Reject malformed `var` patterns up front instead of leaving them to the
    /// downstream parser.
    pub strict_patterns: bool,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Parse `source`, desugar its pseudo-tags and print the result.
pub fn transform(source: &str, options: &TransformOptions) -> Result<Printed, TransformError> {
    let doc = transform_tree(source, options)?;
    let printed = print_document(&doc);
    log::debug!(
        "transformed {} bytes into {} bytes ({} mappings)",
        source.len(),
        printed.code.len(),
        printed.map.mappings.len()
    );
    Ok(printed)
}

/// Like [`transform`], stopping before printing.
pub fn transform_tree(source: &str, options: &TransformOptions) -> Result<Document, TransformError> {
    let doc = parse_document(source)?;
    Ok(Rewriter::new(*options).rewrite_document(doc)?)
}
