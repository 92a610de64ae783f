//! A recursive descent JSONPath parser, with a Pratt parser for filter
//! expressions.
//!
//! [`Parser::parse`] produces a [`Query`] from a query string, enforcing
//! the well-typedness rules for comparison expressions and filter function
//! extensions along the way.

use std::{collections::HashMap, iter::Peekable, ops::RangeInclusive, vec::IntoIter};

use crate::{
    errors::JSONPathError,
    function::{standard_functions, ExpressionType, FunctionSignature},
    lexer::lex,
    query::{
        ComparisonOperator, FilterExpression, FilterExpressionType, LogicalOperator, Query,
        Segment, Selector,
    },
    token::{Token, TokenType},
    unescape::unescape,
};

use TokenType::*;

const PRECEDENCE_LOWEST: u8 = 1;
const PRECEDENCE_LOGICAL_AND: u8 = 4;
const PRECEDENCE_LOGICAL_OR: u8 = 5;
const PRECEDENCE_COMPARISON: u8 = 6;
const PRECEDENCE_PREFIX: u8 = 7;

/// A token iterator that keeps returning an end-of-query token once the
/// underlying tokens are exhausted.
struct TokenStream<'q> {
    tokens: Peekable<IntoIter<Token<'q>>>,
    eof: Token<'q>,
}

impl<'q> TokenStream<'q> {
    fn new(tokens: Vec<Token<'q>>) -> Self {
        let query = tokens.first().map(|t| t.query).unwrap_or_default();
        Self {
            tokens: tokens.into_iter().peekable(),
            eof: Token::new(Eof, "", query.len(), query),
        }
    }

    fn next(&mut self) -> Token<'q> {
        self.tokens.next().unwrap_or_else(|| self.eof.clone())
    }

    fn peek(&mut self) -> &Token<'q> {
        self.tokens.peek().unwrap_or(&self.eof)
    }
}

/// A JSONPath query parser.
///
/// A parser holds no state between calls to [`Parser::parse`], so a single
/// instance can be shared freely, including between threads. `functions`
/// is the registry of filter function extensions available to filter
/// expressions, and `index_range` bounds array indices and slice
/// components to the interoperability range of I-JSON integers.
pub struct Parser {
    pub index_range: RangeInclusive<i64>,
    pub functions: HashMap<String, FunctionSignature>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// A parser with the standard function extension registry.
    pub fn new() -> Self {
        Parser {
            index_range: ((-2_i64).pow(53) + 1..=2_i64.pow(53) - 1),
            functions: standard_functions(),
        }
    }

    /// A parser with a custom function extension registry.
    pub fn with_functions(functions: HashMap<String, FunctionSignature>) -> Self {
        Parser {
            index_range: ((-2_i64).pow(53) + 1..=2_i64.pow(53) - 1),
            functions,
        }
    }

    /// Register a function extension with this parser.
    pub fn add_function(
        &mut self,
        name: &str,
        params: Vec<ExpressionType>,
        returns: ExpressionType,
    ) {
        self.functions.insert(
            name.to_owned(),
            FunctionSignature {
                param_types: params,
                return_type: returns,
            },
        );
    }

    /// Tokenize and parse `query`.
    pub fn parse<'q>(&self, query: &'q str) -> Result<Query<'q>, JSONPathError> {
        self.parse_tokens(lex(query)?)
    }

    /// Parse pre-tokenized input, as produced by [`crate::lexer::tokenize`].
    pub fn parse_tokens<'q>(&self, tokens: Vec<Token<'q>>) -> Result<Query<'q>, JSONPathError> {
        // promote a trailing error token left by the lexer
        if let Some(token) = tokens.last() {
            if token.kind == Error {
                return Err(JSONPathError::syntax(token.value.to_string(), token));
            }
        }

        let mut stream = TokenStream::new(tokens);

        if stream.peek().kind == Root {
            stream.next();
        }

        let segments = self.parse_segments(&mut stream)?;

        match stream.peek() {
            Token { kind: Eof, .. } => Ok(Query { segments }),
            token => Err(JSONPathError::syntax(
                format!("expected end of query, found '{}'", token.value),
                token,
            )),
        }
    }

    fn parse_segments<'q>(
        &self,
        stream: &mut TokenStream<'q>,
    ) -> Result<Vec<Segment<'q>>, JSONPathError> {
        let mut segments: Vec<Segment> = Vec::new();
        loop {
            match stream.peek().kind {
                DoubleDot => {
                    let token = stream.next();
                    let selectors = self.parse_selectors(stream)?;
                    // A missing selection after a descendant segment should
                    // have been caught by the lexer.
                    if selectors.is_empty() {
                        return Err(JSONPathError::syntax(
                            String::from("bald descendant segment"),
                            &token,
                        ));
                    }
                    segments.push(Segment::Recursive { token, selectors });
                }
                LBracket | Name | Wild => {
                    let token = stream.peek().clone();
                    let selectors = self.parse_selectors(stream)?;
                    segments.push(Segment::Child { token, selectors });
                }
                _ => {
                    break;
                }
            }
        }

        Ok(segments)
    }

    fn parse_selectors<'q>(
        &self,
        stream: &mut TokenStream<'q>,
    ) -> Result<Vec<Selector<'q>>, JSONPathError> {
        match stream.peek().kind {
            Name => {
                let token = stream.next();
                let name = token.value.to_string();
                Ok(vec![Selector::Name {
                    token,
                    name,
                    shorthand: true,
                }])
            }
            Wild => Ok(vec![Selector::Wild {
                token: stream.next(),
                shorthand: true,
            }]),
            LBracket => self.parse_bracketed(stream),
            _ => Ok(Vec::new()),
        }
    }

    fn parse_bracketed<'q>(
        &self,
        stream: &mut TokenStream<'q>,
    ) -> Result<Vec<Selector<'q>>, JSONPathError> {
        #[cfg(debug_assertions)]
        debug_assert!(
            stream.peek().kind == LBracket,
            "expected the start of a bracketed selection"
        );

        let segment_token = stream.next(); // LBracket
        let mut selectors: Vec<Selector> = Vec::new();

        loop {
            match stream.peek().kind {
                RBracket => {
                    stream.next();
                    break;
                }
                Index | Colon => {
                    let selector = self.parse_slice_or_index(stream)?;
                    selectors.push(selector);
                }
                DoubleQuoteString | SingleQuoteString => {
                    let token = stream.next();
                    let name = self.decode_string_token(&token)?;
                    selectors.push(Selector::Name {
                        token,
                        name,
                        shorthand: false,
                    });
                }
                Wild => {
                    let token = stream.next();
                    selectors.push(Selector::Wild {
                        token,
                        shorthand: false,
                    });
                }
                Filter => {
                    let selector = self.parse_filter(stream)?;
                    selectors.push(selector);
                }
                Eof => {
                    return Err(JSONPathError::syntax(
                        String::from("unexpected end of query"),
                        stream.peek(),
                    ));
                }
                _ => {
                    let token = stream.peek();
                    return Err(JSONPathError::syntax(
                        format!("unexpected selector token '{}'", token.value),
                        token,
                    ));
                }
            }

            // expect a comma or closing bracket
            match stream.peek().kind {
                RBracket => continue,
                Comma => {
                    // eat comma
                    stream.next();
                }
                _ => {
                    let token = stream.peek();
                    return Err(JSONPathError::syntax(
                        format!(
                            "expected a comma or closing bracket, found '{}'",
                            token.value
                        ),
                        token,
                    ));
                }
            }
        }

        if selectors.is_empty() {
            return Err(JSONPathError::syntax(
                String::from("empty bracketed segment"),
                &segment_token,
            ));
        }

        Ok(selectors)
    }

    fn parse_slice_or_index<'q>(
        &self,
        stream: &mut TokenStream<'q>,
    ) -> Result<Selector<'q>, JSONPathError> {
        let token = stream.next(); // index or colon

        #[cfg(debug_assertions)]
        debug_assert!(
            matches!(token.kind, Colon | Index),
            "expected an index or slice"
        );

        if token.kind == Colon || stream.peek().kind == Colon {
            // a slice
            let mut start: Option<i64> = None;
            let mut stop: Option<i64> = None;
            let mut step: Option<i64> = None;

            // 1: or :
            if token.kind == Index {
                start = Some(self.token_to_int(&token)?);
                stream.next(); // eat colon
            }

            // 1 or 1: or : or ]
            if matches!(stream.peek().kind, Index | Colon) {
                let t = stream.next();
                if t.kind == Index {
                    stop = Some(self.token_to_int(&t)?);
                    if stream.peek().kind == Colon {
                        stream.next(); // eat colon
                    }
                }
            }

            // 1 or ]
            if stream.peek().kind == Index {
                let t = stream.next();
                step = Some(self.token_to_int(&t)?);
            }

            Ok(Selector::Slice {
                token,
                start,
                stop,
                step,
            })
        } else {
            // an index
            let index = self.token_to_int(&token)?;
            Ok(Selector::Index { token, index })
        }
    }

    fn parse_filter<'q>(
        &self,
        stream: &mut TokenStream<'q>,
    ) -> Result<Selector<'q>, JSONPathError> {
        #[cfg(debug_assertions)]
        debug_assert!(stream.peek().kind == Filter, "expected a filter");

        let token = stream.next();
        let expr = self.parse_filter_expression(stream, PRECEDENCE_LOWEST)?;

        if let FilterExpressionType::Function { ref name, .. } = expr.kind {
            if self.function_result_type(name, &expr.token)? == ExpressionType::Value {
                return Err(JSONPathError::typ(
                    format!("result of {}() must be compared", name),
                    &expr.token,
                ));
            }
        }

        if expr.is_literal() {
            return Err(JSONPathError::typ(
                String::from("filter expression literals must be compared"),
                &expr.token,
            ));
        }

        Ok(Selector::Filter {
            token,
            expression: Box::new(expr),
        })
    }

    fn parse_filter_expression<'q>(
        &self,
        stream: &mut TokenStream<'q>,
        precedence: u8,
    ) -> Result<FilterExpression<'q>, JSONPathError> {
        let mut left = self.parse_basic_expression(stream)?;

        loop {
            let peek_kind = stream.peek().kind;
            if matches!(peek_kind, Eof | RBracket)
                || self.precedence(peek_kind) < precedence
                || !is_binary_operator(peek_kind)
            {
                break;
            }

            left = self.parse_infix_expression(stream, left)?;
        }

        Ok(left)
    }

    fn parse_basic_expression<'q>(
        &self,
        stream: &mut TokenStream<'q>,
    ) -> Result<FilterExpression<'q>, JSONPathError> {
        match stream.peek().kind {
            True => Ok(FilterExpression::new(
                stream.next(),
                FilterExpressionType::True,
            )),
            False => Ok(FilterExpression::new(
                stream.next(),
                FilterExpressionType::False,
            )),
            Null => Ok(FilterExpression::new(
                stream.next(),
                FilterExpressionType::Null,
            )),
            Int => {
                let token = stream.next();
                let value = self.token_to_int(&token)?;
                Ok(FilterExpression::new(
                    token,
                    FilterExpressionType::Int { value },
                ))
            }
            Float => {
                let token = stream.next();
                let value = self.token_to_float(&token)?;
                Ok(FilterExpression::new(
                    token,
                    FilterExpressionType::Float { value },
                ))
            }
            DoubleQuoteString | SingleQuoteString => {
                let token = stream.next();
                let value = self.decode_string_token(&token)?;
                Ok(FilterExpression::new(
                    token,
                    FilterExpressionType::String { value },
                ))
            }
            Root => {
                let token = stream.next();
                let segments = self.parse_segments(stream)?;
                Ok(FilterExpression::new(
                    token,
                    FilterExpressionType::RootQuery {
                        query: Box::new(Query { segments }),
                    },
                ))
            }
            Current => {
                let token = stream.next();
                let segments = self.parse_segments(stream)?;
                Ok(FilterExpression::new(
                    token,
                    FilterExpressionType::RelativeQuery {
                        query: Box::new(Query { segments }),
                    },
                ))
            }
            Function => self.parse_function_call(stream),
            LParen => self.parse_grouped_expression(stream),
            Not => self.parse_not_expression(stream),
            RBracket | Eof => Err(JSONPathError::syntax(
                String::from("unexpected end of filter expression"),
                stream.peek(),
            )),
            _ => {
                let token = stream.peek();
                Err(JSONPathError::syntax(
                    format!("unexpected basic expression token {}", token.kind),
                    token,
                ))
            }
        }
    }

    fn parse_not_expression<'q>(
        &self,
        stream: &mut TokenStream<'q>,
    ) -> Result<FilterExpression<'q>, JSONPathError> {
        let token = stream.next();
        let expr = self.parse_filter_expression(stream, PRECEDENCE_PREFIX)?;
        Ok(FilterExpression::new(
            token,
            FilterExpressionType::Not {
                expression: Box::new(expr),
            },
        ))
    }

    fn parse_grouped_expression<'q>(
        &self,
        stream: &mut TokenStream<'q>,
    ) -> Result<FilterExpression<'q>, JSONPathError> {
        stream.next(); // eat open paren

        if stream.peek().kind == RParen {
            return Err(JSONPathError::syntax(
                String::from("expected a filter expression"),
                stream.peek(),
            ));
        }

        let mut expr = self.parse_filter_expression(stream, PRECEDENCE_LOWEST)?;

        loop {
            match stream.peek().kind {
                Eof | RBracket => {
                    return Err(JSONPathError::syntax(
                        String::from("unbalanced parentheses"),
                        stream.peek(),
                    ));
                }
                RParen => break,
                _ => expr = self.parse_infix_expression(stream, expr)?,
            }
        }

        stream.next(); // eat closing paren
        Ok(expr)
    }

    fn parse_infix_expression<'q>(
        &self,
        stream: &mut TokenStream<'q>,
        left: FilterExpression<'q>,
    ) -> Result<FilterExpression<'q>, JSONPathError> {
        let token = stream.next();
        let precedence = self.precedence(token.kind);
        let right = self.parse_filter_expression(stream, precedence)?;

        if precedence == PRECEDENCE_COMPARISON {
            // Non-singular queries and functions that do not return a value
            // are not comparable.
            self.assert_comparable(&left)?;
            self.assert_comparable(&right)?;
        }

        match token.kind {
            And | Or => {
                if left.is_literal() || right.is_literal() {
                    let literal = if left.is_literal() { &left } else { &right };
                    return Err(JSONPathError::typ(
                        String::from("filter expression literals must be compared"),
                        &literal.token,
                    ));
                }

                let operator = if token.kind == And {
                    LogicalOperator::And
                } else {
                    LogicalOperator::Or
                };

                Ok(FilterExpression::new(
                    token,
                    FilterExpressionType::Logical {
                        left: Box::new(left),
                        operator,
                        right: Box::new(right),
                    },
                ))
            }
            Eq | Ge | Gt | Le | Lt | Ne => {
                let operator = match token.kind {
                    Eq => ComparisonOperator::Eq,
                    Ge => ComparisonOperator::Ge,
                    Gt => ComparisonOperator::Gt,
                    Le => ComparisonOperator::Le,
                    Lt => ComparisonOperator::Lt,
                    _ => ComparisonOperator::Ne,
                };

                Ok(FilterExpression::new(
                    token,
                    FilterExpressionType::Comparison {
                        left: Box::new(left),
                        operator,
                        right: Box::new(right),
                    },
                ))
            }
            _ => Err(JSONPathError::syntax(
                format!("unexpected infix operator {}", token.kind),
                &token,
            )),
        }
    }

    fn parse_function_call<'q>(
        &self,
        stream: &mut TokenStream<'q>,
    ) -> Result<FilterExpression<'q>, JSONPathError> {
        let token = stream.next();
        let mut args: Vec<FilterExpression> = Vec::new();

        while stream.peek().kind != RParen {
            let mut expr = self.parse_basic_expression(stream)?;

            // Is this argument part of a comparison or logical expression?
            while is_binary_operator(stream.peek().kind) {
                expr = self.parse_infix_expression(stream, expr)?;
            }

            args.push(expr);

            match stream.peek().kind {
                RParen => break,
                RBracket => break, // let the segment handler fail on a missing paren
                Comma => {
                    stream.next(); // eat comma
                }
                _ => {
                    let t = stream.peek();
                    return Err(JSONPathError::syntax(
                        format!("expected a comma or closing paren, found '{}'", t.value),
                        t,
                    ));
                }
            }
        }

        if stream.peek().kind == RParen {
            stream.next(); // eat closing paren
        } else {
            return Err(JSONPathError::syntax(
                String::from("unbalanced parentheses"),
                stream.peek(),
            ));
        }

        self.assert_function_signature(&token, &args)?;
        let name = token.value.to_string();

        Ok(FilterExpression::new(
            token,
            FilterExpressionType::Function { name, args },
        ))
    }

    fn precedence(&self, kind: TokenType) -> u8 {
        match kind {
            And => PRECEDENCE_LOGICAL_AND,
            Or => PRECEDENCE_LOGICAL_OR,
            Eq | Ge | Gt | Le | Lt | Ne => PRECEDENCE_COMPARISON,
            Not => PRECEDENCE_PREFIX,
            _ => PRECEDENCE_LOWEST,
        }
    }

    /// Return an error if `expr` is a non-singular query or a function call
    /// that does not return a value.
    fn assert_comparable(&self, expr: &FilterExpression) -> Result<(), JSONPathError> {
        match &expr.kind {
            FilterExpressionType::RelativeQuery { query }
            | FilterExpressionType::RootQuery { query } => {
                if !query.is_singular() {
                    Err(JSONPathError::typ(
                        String::from("non-singular query is not comparable"),
                        &expr.token,
                    ))
                } else {
                    Ok(())
                }
            }
            FilterExpressionType::Function { name, .. } => {
                if self.function_result_type(name, &expr.token)? != ExpressionType::Value {
                    Err(JSONPathError::typ(
                        format!("result of {}() is not comparable", name),
                        &expr.token,
                    ))
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }

    /// Return an error if `args` does not match the signature of the
    /// function extension named by `token`.
    fn assert_function_signature(
        &self,
        token: &Token,
        args: &[FilterExpression],
    ) -> Result<(), JSONPathError> {
        let name = token.value.as_ref();
        let signature = self
            .functions
            .get(name)
            .ok_or_else(|| JSONPathError::name(format!("no such function '{}'", name), token))?;

        // correct number of arguments?
        if args.len() != signature.param_types.len() {
            return Err(JSONPathError::typ(
                format!(
                    "{}() takes {} argument{} but {} were given",
                    name,
                    signature.param_types.len(),
                    if signature.param_types.len() == 1 {
                        ""
                    } else {
                        "s"
                    },
                    args.len()
                ),
                token,
            ));
        }

        // correct argument types?
        for (idx, typ) in signature.param_types.iter().enumerate() {
            let arg = &args[idx];
            match typ {
                ExpressionType::Value => {
                    if !self.is_value_type(arg) {
                        return Err(JSONPathError::typ(
                            format!("{}() argument {} must be of ValueType", name, idx),
                            token,
                        ));
                    }
                }
                ExpressionType::Logical => {
                    if !matches!(
                        arg.kind,
                        FilterExpressionType::RelativeQuery { .. }
                            | FilterExpressionType::RootQuery { .. }
                            | FilterExpressionType::Logical { .. }
                            | FilterExpressionType::Comparison { .. }
                            | FilterExpressionType::Not { .. }
                    ) {
                        return Err(JSONPathError::typ(
                            format!("{}() argument {} must be of LogicalType", name, idx),
                            token,
                        ));
                    }
                }
                ExpressionType::Nodes => {
                    if !self.is_nodes_type(arg) {
                        return Err(JSONPathError::typ(
                            format!("{}() argument {} must be of NodesType", name, idx),
                            token,
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    fn is_value_type(&self, expr: &FilterExpression) -> bool {
        // literals are values
        if expr.is_literal() {
            return true;
        }

        match &expr.kind {
            FilterExpressionType::RelativeQuery { query }
            | FilterExpressionType::RootQuery { query } => {
                // singular queries will be coerced to a value
                query.is_singular()
            }
            FilterExpressionType::Function { name, .. } => {
                // some functions return a value
                matches!(
                    self.functions.get(name),
                    Some(FunctionSignature {
                        return_type: ExpressionType::Value,
                        ..
                    })
                )
            }
            _ => false,
        }
    }

    fn is_nodes_type(&self, expr: &FilterExpression) -> bool {
        match &expr.kind {
            FilterExpressionType::RelativeQuery { .. } | FilterExpressionType::RootQuery { .. } => {
                true
            }
            FilterExpressionType::Function { name, .. } => {
                matches!(
                    self.functions.get(name),
                    Some(FunctionSignature {
                        return_type: ExpressionType::Nodes,
                        ..
                    })
                )
            }
            _ => false,
        }
    }

    /// The result type for the function extension named `name`, or a name
    /// error if it is not in the registry.
    fn function_result_type(
        &self,
        name: &str,
        token: &Token,
    ) -> Result<ExpressionType, JSONPathError> {
        self.functions
            .get(name)
            .map(|sig| sig.return_type)
            .ok_or_else(|| JSONPathError::name(format!("no such function '{}'", name), token))
    }

    /// Replace escaped quotes in single quoted strings, then decode escape
    /// sequences, giving an owned string suitable for output in double
    /// quotes.
    fn decode_string_token(&self, token: &Token) -> Result<String, JSONPathError> {
        if token.kind == SingleQuoteString {
            unescape(&token.value.replace("\\'", "'"), token)
        } else {
            unescape(&token.value, token)
        }
    }

    /// Convert a token's value to an integer. Integer literals in scientific
    /// notation are computed as a double before narrowing.
    fn token_to_int(&self, token: &Token) -> Result<i64, JSONPathError> {
        let value = token.value.as_ref();

        if value.len() > 1 && value.starts_with('0') {
            if token.kind == Index {
                return Err(JSONPathError::syntax(
                    String::from("array indicies with a leading zero are not allowed"),
                    token,
                ));
            }
            return Err(JSONPathError::syntax(
                String::from("integers with a leading zero are not allowed"),
                token,
            ));
        }

        if value.starts_with("-0") {
            if token.kind == Index {
                return Err(JSONPathError::syntax(
                    String::from("negative zero array indicies are not allowed"),
                    token,
                ));
            }
            if value.len() > 2 {
                return Err(JSONPathError::syntax(
                    String::from("integers with a leading zero are not allowed"),
                    token,
                ));
            }
        }

        let d = value.parse::<f64>().map_err(|_| {
            JSONPathError::syntax(format!("invalid integer literal '{}'", value), token)
        })?;

        if d < i64::MIN as f64 || d > i64::MAX as f64 {
            return Err(JSONPathError::syntax(
                format!("integer out of range '{}'", value),
                token,
            ));
        }

        let i = d as i64;

        if token.kind == Index && !self.index_range.contains(&i) {
            return Err(JSONPathError::syntax(
                format!("index out of range '{}'", value),
                token,
            ));
        }

        Ok(i)
    }

    fn token_to_float(&self, token: &Token) -> Result<f64, JSONPathError> {
        token.value.parse::<f64>().map_err(|_| {
            JSONPathError::syntax(format!("invalid float literal '{}'", token.value), token)
        })
    }
}

fn is_binary_operator(kind: TokenType) -> bool {
    matches!(kind, And | Or | Eq | Ge | Gt | Le | Lt | Ne)
}
