//! A JSONPath expression parser, producing a JSON implementation agnostic
//! abstract syntax tree, following the JSONPath model described in RFC 9535.
//!
//! ## Standard queries
//!
//! To parse a JSONPath expression that is limited to standard [function extensions],
//! use [`Query::standard`] or the top-level [`parse`] function.
//!
//! ```
//! use jsonpath_syntax::{errors::JSONPathError, Query};
//!
//! fn main() -> Result<(), JSONPathError> {
//!     let q = Query::standard("$..foo[0]")?;
//!     println!("{:#?}", q);
//!     Ok(())
//! }
//! ```
//!
//! A [`Query`] is displayed in its canonical form when printed, with
//! shorthand selectors rewritten to their bracketed equivalents.
//!
//! ```text
//! $..['foo'][0]
//! ```
//!
//! ## Function extensions
//!
//! Register [function extensions] with a new [`Parser`] by calling
//! [`Parser::add_function`], then use [`Parser::parse`] to create a new
//! [`Query`].
//!
//! ```
//! use jsonpath_syntax::{errors::JSONPathError, ExpressionType, Parser};
//!
//! fn main() -> Result<(), JSONPathError> {
//!     let mut parser = Parser::new();
//!
//!     parser.add_function(
//!         "foo",
//!         vec![ExpressionType::Value, ExpressionType::Nodes],
//!         ExpressionType::Logical,
//!     );
//!
//!     let q = parser.parse("$.some[?foo('7', @.thing)][1, 4]")?;
//!
//!     println!("{}", q);
//!     Ok(())
//! }
//! ```
//!
//! Without registering a signature for `foo`, we would get a
//! [`JSONPathError`] with `kind` set to [`JSONPathErrorType::NameError`].
//!
//! [function extensions]: https://datatracker.ietf.org/doc/html/rfc9535#name-function-extensions
pub mod errors;
pub mod function;
pub mod lexer;
pub mod parser;
pub mod query;
pub mod token;

mod unescape;

use std::collections::HashMap;

pub use errors::JSONPathError;
pub use errors::JSONPathErrorType;
pub use function::standard_functions;
pub use function::ExpressionType;
pub use function::FunctionSignature;
pub use lexer::Lexer;
pub use parser::Parser;
pub use query::Query;

/// Parse `query` using the standard function extension registry.
pub fn parse(query: &str) -> Result<Query<'_>, JSONPathError> {
    Query::standard(query)
}

/// Parse `query` with a custom function extension registry.
pub fn parse_with_functions(
    query: &str,
    functions: HashMap<String, FunctionSignature>,
) -> Result<Query<'_>, JSONPathError> {
    Parser::with_functions(functions).parse(query)
}

/// Return the canonical string representation of a parsed query.
pub fn to_string(query: &Query) -> String {
    query.to_string()
}
