//! Structs and enums that make up a JSONPath query syntax tree.
//!
//! A [`Query`] contains zero or more [`Segment`]s, and each segment contains
//! one or more [`Selector`]s. When a segment includes a _filter selector_,
//! that filter selector is a tree of [`FilterExpression`]s.
//!
//! Every node retains the token it was parsed from. Tokens borrow from the
//! query string, so a syntax tree cannot outlive the query it was parsed
//! from. Decoded member names and string literal values are owned.
//!
//! Displaying any of these types renders the canonical form of the path,
//! with shorthand selectors replaced by their bracketed equivalents.

use std::fmt::{self, Write};

use itertools::Itertools;
use lazy_static::lazy_static;

use crate::{errors::JSONPathError, parser::Parser, token::Token};

lazy_static! {
    static ref PARSER: Parser = Parser::new();
}

#[derive(Debug)]
pub struct Query<'q> {
    pub segments: Vec<Segment<'q>>,
}

impl fmt::Display for Query<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.segments.iter().join(""))
    }
}

impl<'q> Query<'q> {
    /// Parse `expr` using the standard function extension registry.
    pub fn standard(expr: &'q str) -> Result<Self, JSONPathError> {
        PARSER.parse(expr)
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Return `true` if this query selects at most one node for any JSON
    /// document, which is the case when every segment is a child segment
    /// with a single name or index selector.
    pub fn is_singular(&self) -> bool {
        self.segments.iter().all(|segment| match segment {
            Segment::Child { selectors, .. } => {
                selectors.len() == 1
                    && selectors.first().is_some_and(|s| {
                        matches!(s, Selector::Name { .. } | Selector::Index { .. })
                    })
            }
            Segment::Recursive { .. } => false,
        })
    }
}

#[derive(Debug)]
pub enum Segment<'q> {
    Child {
        token: Token<'q>,
        selectors: Vec<Selector<'q>>,
    },
    Recursive {
        token: Token<'q>,
        selectors: Vec<Selector<'q>>,
    },
}

impl fmt::Display for Segment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Child { selectors, .. } => {
                write!(f, "[{}]", selectors.iter().join(", "))
            }
            Segment::Recursive { selectors, .. } => {
                write!(f, "..[{}]", selectors.iter().join(", "))
            }
        }
    }
}

#[derive(Debug)]
pub enum Selector<'q> {
    Name {
        token: Token<'q>,
        /// The decoded member name, with escape sequences resolved.
        name: String,
        /// Whether the selector was written as `.name` rather than
        /// `['name']`. Kept for source round-tripping only, the canonical
        /// form is always bracketed.
        shorthand: bool,
    },
    Index {
        token: Token<'q>,
        index: i64,
    },
    Slice {
        token: Token<'q>,
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
    },
    Wild {
        token: Token<'q>,
        shorthand: bool,
    },
    Filter {
        token: Token<'q>,
        expression: Box<FilterExpression<'q>>,
    },
}

/// Write `value` with backslashes, control characters and `quote` escaped,
/// so that the canonical form can be parsed again.
fn write_escaped(f: &mut fmt::Formatter<'_>, value: &str, quote: char) -> fmt::Result {
    for ch in value.chars() {
        match ch {
            '\\' => f.write_str("\\\\")?,
            '\u{0008}' => f.write_str("\\b")?,
            '\u{000C}' => f.write_str("\\f")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            ch if ch == quote => {
                f.write_char('\\')?;
                f.write_char(ch)?;
            }
            ch if (ch as u32) < 0x20 => write!(f, "\\u{:04x}", ch as u32)?,
            ch => f.write_char(ch)?,
        }
    }
    Ok(())
}

impl fmt::Display for Selector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Name { name, .. } => {
                f.write_char('\'')?;
                write_escaped(f, name, '\'')?;
                f.write_char('\'')
            }
            Selector::Index { index, .. } => write!(f, "{index}"),
            Selector::Slice {
                start, stop, step, ..
            } => {
                write!(
                    f,
                    "{}:{}:{}",
                    start.map(|i| i.to_string()).unwrap_or_default(),
                    stop.map(|i| i.to_string()).unwrap_or_default(),
                    step.map(|i| i.to_string())
                        .unwrap_or_else(|| String::from("1")),
                )
            }
            Selector::Wild { .. } => f.write_char('*'),
            Selector::Filter { expression, .. } => write!(f, "?{expression}"),
        }
    }
}

#[derive(Debug)]
pub enum LogicalOperator {
    And,
    Or,
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOperator::And => f.write_str("&&"),
            LogicalOperator::Or => f.write_str("||"),
        }
    }
}

#[derive(Debug)]
pub enum ComparisonOperator {
    Eq,
    Ne,
    Ge,
    Gt,
    Le,
    Lt,
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonOperator::Eq => f.write_str("=="),
            ComparisonOperator::Ne => f.write_str("!="),
            ComparisonOperator::Ge => f.write_str(">="),
            ComparisonOperator::Gt => f.write_str(">"),
            ComparisonOperator::Le => f.write_str("<="),
            ComparisonOperator::Lt => f.write_str("<"),
        }
    }
}

#[derive(Debug)]
pub enum FilterExpressionType<'q> {
    True,
    False,
    Null,
    String {
        value: String,
    },
    Int {
        value: i64,
    },
    Float {
        value: f64,
    },
    Not {
        expression: Box<FilterExpression<'q>>,
    },
    Logical {
        left: Box<FilterExpression<'q>>,
        operator: LogicalOperator,
        right: Box<FilterExpression<'q>>,
    },
    Comparison {
        left: Box<FilterExpression<'q>>,
        operator: ComparisonOperator,
        right: Box<FilterExpression<'q>>,
    },
    RelativeQuery {
        query: Box<Query<'q>>,
    },
    RootQuery {
        query: Box<Query<'q>>,
    },
    Function {
        name: String,
        args: Vec<FilterExpression<'q>>,
    },
}

#[derive(Debug)]
pub struct FilterExpression<'q> {
    pub token: Token<'q>,
    pub kind: FilterExpressionType<'q>,
}

impl<'q> FilterExpression<'q> {
    pub fn new(token: Token<'q>, kind: FilterExpressionType<'q>) -> Self {
        FilterExpression { token, kind }
    }

    pub fn is_literal(&self) -> bool {
        use FilterExpressionType::*;
        matches!(
            self.kind,
            True | False | Null | String { .. } | Int { .. } | Float { .. }
        )
    }
}

impl fmt::Display for FilterExpression<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FilterExpressionType::True => f.write_str("true"),
            FilterExpressionType::False => f.write_str("false"),
            FilterExpressionType::Null => f.write_str("null"),
            FilterExpressionType::String { value } => {
                f.write_char('"')?;
                write_escaped(f, value, '"')?;
                f.write_char('"')
            }
            FilterExpressionType::Int { value } => write!(f, "{value}"),
            FilterExpressionType::Float { value } => write!(f, "{value}"),
            FilterExpressionType::Not { expression } => write!(f, "!{expression}"),
            FilterExpressionType::Logical {
                left,
                operator,
                right,
            } => write!(f, "({left} {operator} {right})"),
            FilterExpressionType::Comparison {
                left,
                operator,
                right,
            } => write!(f, "{left} {operator} {right}"),
            FilterExpressionType::RelativeQuery { query } => {
                write!(f, "@{}", query.segments.iter().join(""))
            }
            FilterExpressionType::RootQuery { query } => {
                write!(f, "${}", query.segments.iter().join(""))
            }
            FilterExpressionType::Function { name, args } => {
                write!(f, "{}({})", name, args.iter().join(", "))
            }
        }
    }
}
