use std::fmt;

use thiserror::Error;

use crate::TransformOptions;
use crate::ast::{Attr, AttrValue, Expr, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PseudoTagKind {
    If,  // <$if test={cond}>
    For, // <$for var="item" of={items}>
    Let, // <$let var="x" value={expr}>
}

impl PseudoTagKind {
    /// Exact, case-sensitive match; nothing else is ever a pseudo-tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "$if" => Some(Self::If),
            "$for" => Some(Self::For),
            "$let" => Some(Self::Let),
            _ => None,
        }
    }

    pub fn tag_name(self) -> &'static str {
        match self {
            Self::If => "$if",
            Self::For => "$for",
            Self::Let => "$let",
        }
    }

    /// Required attribute names, in the order they are reported.
    pub fn required(self) -> &'static [&'static str] {
        match self {
            Self::If => &["test"],
            Self::For => &["var", "of"],
            Self::Let => &["var", "value"],
        }
    }
}

impl fmt::Display for PseudoTagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.tag_name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedAttributes {
    If { test: Expr },
    For { pattern: String, of: Expr },
    Let { pattern: String, value: Expr },
}

impl ValidatedAttributes {
    pub fn kind(&self) -> PseudoTagKind {
        match self {
            Self::If { .. } => PseudoTagKind::If,
            Self::For { .. } => PseudoTagKind::For,
            Self::Let { .. } => PseudoTagKind::Let,
        }
    }
}

/// Every problem found on one pseudo-tag, each list in attribute order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Violations {
    pub missing: Vec<String>,
    pub unexpected: Vec<String>,
    pub wrong_kind: Vec<String>,
    pub empty: Vec<String>,
    pub invalid_pattern: Vec<String>,
}

impl Violations {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty()
            && self.unexpected.is_empty()
            && self.wrong_kind.is_empty()
            && self.empty.is_empty()
            && self.invalid_pattern.is_empty()
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let groups = [
            ("missing", &self.missing),
            ("unexpected", &self.unexpected),
            ("expected a different value kind for", &self.wrong_kind),
            ("empty value for", &self.empty),
            ("invalid binding pattern in", &self.invalid_pattern),
        ];
        let mut first = true;
        for (label, names) in groups {
            if names.is_empty() {
                continue;
            }
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            let quoted: Vec<String> = names.iter().map(|n| format!("`{n}`")).collect();
            write!(f, "{label} {}", quoted.join(", "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid {tag} at {}:{}: {violations}", .span.line, .span.column)]
pub struct SchemaError {
    pub tag: PseudoTagKind,
    pub span: Span,
    pub violations: Violations,
}

pub fn validate(kind: PseudoTagKind, attrs: &[Attr]) -> Result<ValidatedAttributes, Violations> {
    validate_with(kind, attrs, &TransformOptions::default())
}

pub fn validate_with(
    kind: PseudoTagKind,
    attrs: &[Attr],
    options: &TransformOptions,
) -> Result<ValidatedAttributes, Violations> {
    let mut violations = Violations::default();
    let mut pattern: Option<String> = None;
    let mut expr: Option<Expr> = None;

    for required in kind.required() {
        if !attrs.iter().any(|a| a.name == *required) {
            violations.missing.push(required.to_string());
        }
    }

    for attr in attrs {
        if !kind.required().contains(&attr.name.as_str()) {
            violations.unexpected.push(attr.name.clone());
            continue;
        }
        match (attr.name.as_str(), &attr.value) {
            ("var", Some(AttrValue::Literal(text))) => {
                if text.trim().is_empty() {
                    violations.empty.push(attr.name.clone());
                } else if options.strict_patterns && !is_binding_pattern(text) {
                    violations.invalid_pattern.push(attr.name.clone());
                } else {
                    pattern = Some(text.clone());
                }
            }
            ("var", _) => violations.wrong_kind.push(attr.name.clone()),
            // `test={}` or `of={ }`: nothing to evaluate
            (_, Some(AttrValue::Expr(Expr::Raw { source, .. }))) if source.trim().is_empty() => {
                violations.empty.push(attr.name.clone())
            }
            (_, Some(AttrValue::Expr(e))) => expr = Some(e.clone()),
            (_, _) => violations.wrong_kind.push(attr.name.clone()),
        }
    }

    if !violations.is_empty() {
        return Err(violations);
    }

    // both are set once every required attribute is present with the right kind
    match (kind, pattern, expr) {
        (PseudoTagKind::If, _, Some(test)) => Ok(ValidatedAttributes::If { test }),
        (PseudoTagKind::For, Some(pattern), Some(of)) => Ok(ValidatedAttributes::For { pattern, of }),
        (PseudoTagKind::Let, Some(pattern), Some(value)) => {
            Ok(ValidatedAttributes::Let { pattern, value })
        }
        _ => Err(violations),
    }
}

const RESERVED: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "enum", "export", "extends", "false", "finally", "for", "function", "if", "import",
    "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw", "true", "try",
    "typeof", "var", "void", "while", "with", "yield", "let", "static", "await",
];

/// Eager check used in strict mode: a plain identifier, or a bracket-balanced
/// object/array destructuring pattern. Anything finer is left to the real parser.
pub fn is_binding_pattern(text: &str) -> bool {
    let text = text.trim();
    match text.chars().next() {
        Some('{') => text.ends_with('}') && brackets_balanced(text),
        Some('[') => text.ends_with(']') && brackets_balanced(text),
        Some(_) => is_identifier(text),
        None => false,
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c == '_' || c == '$' || c.is_alphabetic());
    head_ok
        && chars.all(|c| c == '_' || c == '$' || c.is_alphanumeric())
        && !RESERVED.contains(&text)
}

fn brackets_balanced(text: &str) -> bool {
    let mut stack: Vec<char> = Vec::new();
    for (i, ch) in text.char_indices() {
        match ch {
            '{' | '[' | '(' => stack.push(ch),
            '}' | ']' | ')' => {
                let open = match ch {
                    '}' => '{',
                    ']' => '[',
                    _ => '(',
                };
                if stack.pop() != Some(open) {
                    return false;
                }
                // the outer bracket must close only at the very end
                if stack.is_empty() && i + ch.len_utf8() != text.len() {
                    return false;
                }
            }
            _ => {}
        }
    }
    stack.is_empty()
}
