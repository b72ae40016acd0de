use crate::ast::{Expr, ExprContainer, Fragment, Span};
use crate::schema::ValidatedAttributes;

/// Build the replacement for one pseudo-tag. `body` holds the tag's children,
/// already rewritten; `span` is the original element's position.
///
/// - `$if`  -> `test ? <>body</> : null`
/// - `$for` -> `of.map((pattern) => <>body</>)`
/// - `$let` -> `((pattern) => <>body</>)(value)`
pub fn synthesize(attrs: ValidatedAttributes, body: Fragment, span: Span) -> ExprContainer {
    let body = Box::new(Expr::Fragment(body));
    let expr = match attrs {
        ValidatedAttributes::If { test } => Expr::Conditional {
            test: Box::new(test),
            consequent: body,
            alternate: Box::new(Expr::Null),
        },
        ValidatedAttributes::For { pattern, of } => Expr::Call {
            callee: Box::new(Expr::Member {
                object: Box::new(of),
                property: "map".to_string(),
            }),
            args: vec![Expr::Arrow {
                param: pattern,
                body,
            }],
        },
        // evaluated once, before the body can see the binding
        ValidatedAttributes::Let { pattern, value } => Expr::Call {
            callee: Box::new(Expr::Arrow {
                param: pattern,
                body,
            }),
            args: vec![value],
        },
    };
    ExprContainer { expr, span }
}
