use jsonpath_syntax::{JSONPathErrorType, Query};

fn expect_error(query: &str, kind: JSONPathErrorType, msg: &str, index: usize) {
    match Query::standard(query) {
        Err(err) => {
            assert_eq!(err.kind, kind, "unexpected error kind for {}", query);
            assert_eq!(err.msg, msg, "unexpected message for {}", query);
            assert_eq!(err.index, index, "unexpected index for {}", query);
            assert_eq!(err.query, query);
        }
        Ok(q) => panic!("expected an error for {}, found {}", query, q),
    }
}

mod syntax {
    use super::*;
    use JSONPathErrorType::SyntaxError;

    #[test]
    fn leading_whitespace() {
        expect_error("  $.foo", SyntaxError, "expected '$', found ' '", 0);
    }

    #[test]
    fn exception_message_includes_query_and_index() {
        let err = Query::standard("  $.foo").unwrap_err();
        assert_eq!(err.to_string(), "expected '$', found ' ' ('  $.foo':0)");
    }

    #[test]
    fn shorthand_index() {
        expect_error("$.1", SyntaxError, "unexpected shorthand selector '1'", 2);
    }

    #[test]
    fn shorthand_symbol() {
        expect_error("$.&", SyntaxError, "unexpected shorthand selector '&'", 2);
    }

    #[test]
    fn trailing_whitespace() {
        expect_error("$.foo ", SyntaxError, "unexpected trailing whitespace", 6);
    }

    #[test]
    fn empty_bracketed_segment() {
        expect_error("$.foo[]", SyntaxError, "empty bracketed segment", 5);
        let err = Query::standard("$.foo[]").unwrap_err();
        assert_eq!(err.to_string(), "empty bracketed segment ('$.foo[]':5)");
    }

    #[test]
    fn array_index_with_leading_zero() {
        expect_error(
            "$.foo[01]",
            SyntaxError,
            "array indicies with a leading zero are not allowed",
            6,
        );
    }

    #[test]
    fn negative_zero_array_index() {
        expect_error(
            "$[-0]",
            SyntaxError,
            "negative zero array indicies are not allowed",
            1,
        );
    }

    #[test]
    fn int_literal_with_leading_zero() {
        expect_error(
            "$.some[?(@.thing == 01)]",
            SyntaxError,
            "integers with a leading zero are not allowed",
            20,
        );
    }

    #[test]
    fn negative_int_literal_with_leading_zero() {
        expect_error(
            "$.some[?(@.thing == -01)]",
            SyntaxError,
            "integers with a leading zero are not allowed",
            20,
        );
    }

    #[test]
    fn index_out_of_range() {
        expect_error(
            "$[9007199254740992]",
            SyntaxError,
            "index out of range '9007199254740992'",
            2,
        );
    }

    #[test]
    fn int_literal_out_of_range() {
        expect_error(
            "$[?@.a == 1e400]",
            SyntaxError,
            "integer out of range '1e400'",
            10,
        );
    }

    #[test]
    fn invalid_character_in_string_literal() {
        expect_error(
            "$[\"\u{01}\"]",
            SyntaxError,
            "invalid character in string literal",
            3,
        );
    }

    #[test]
    fn unbalanced_parens() {
        expect_error("$[?((@.foo)]", SyntaxError, "unbalanced parentheses", 11);
    }

    #[test]
    fn unbalanced_parens_in_function_call() {
        expect_error("$[?count(@.foo]", SyntaxError, "unbalanced parentheses", 14);
    }

    #[test]
    fn empty_parens() {
        expect_error("$[?()]", SyntaxError, "expected a filter expression", 4);
    }

    #[test]
    fn unclosed_bracketed_selection() {
        expect_error("$[1, 3", SyntaxError, "unclosed bracketed selection", 6);
    }

    #[test]
    fn unclosed_bracketed_selection_inside_filter() {
        expect_error("$[?@.a < 1", SyntaxError, "unclosed bracketed selection", 10);
    }

    #[test]
    fn bare_keyword_in_filter() {
        expect_error(
            "$[?truthy]",
            SyntaxError,
            "expected a keyword or function call",
            3,
        );
    }

    #[test]
    fn just_equals() {
        expect_error("$[?@.a = 1]", SyntaxError, "expected '==', found '='", 7);
    }
}

mod typing {
    use super::*;
    use JSONPathErrorType::TypeError;

    #[test]
    fn non_singular_query_in_comparison() {
        expect_error(
            "$[?@[*]==0]",
            TypeError,
            "non-singular query is not comparable",
            3,
        );
        let err = Query::standard("$[?@[*]==0]").unwrap_err();
        assert_eq!(
            err.to_string(),
            "non-singular query is not comparable ('$[?@[*]==0]':3)"
        );
    }

    #[test]
    fn non_singular_root_query_in_comparison() {
        expect_error(
            "$[?$..thing == 7]",
            TypeError,
            "non-singular query is not comparable",
            3,
        );
    }

    #[test]
    fn result_must_be_compared() {
        expect_error(
            "$[?count(@..*)]",
            TypeError,
            "result of count() must be compared",
            3,
        );
    }

    #[test]
    fn result_is_not_comparable() {
        let query = "$[?match(@.a, 'a.*')==true]";
        expect_error(query, TypeError, "result of match() is not comparable", 3);
        let err = Query::standard(query).unwrap_err();
        assert_eq!(
            err.to_string(),
            "result of match() is not comparable ('$[?match(@.a, 'a.*')==true]':3)"
        );
    }

    #[test]
    fn length_argument_must_be_of_value_type() {
        expect_error(
            "$[?length(@.*) < 3]",
            TypeError,
            "length() argument 0 must be of ValueType",
            3,
        );
    }

    #[test]
    fn count_argument_must_be_of_nodes_type() {
        expect_error(
            "$[?count(1) == 1]",
            TypeError,
            "count() argument 0 must be of NodesType",
            3,
        );
    }

    #[test]
    fn not_enough_arguments() {
        expect_error(
            "$[?count()]",
            TypeError,
            "count() takes 1 argument but 0 were given",
            3,
        );
    }

    #[test]
    fn too_many_arguments() {
        expect_error(
            "$[?count(@.foo, $.bar)]",
            TypeError,
            "count() takes 1 argument but 2 were given",
            3,
        );
    }

    #[test]
    fn filter_just_true() {
        expect_error(
            "$[?true]",
            TypeError,
            "filter expression literals must be compared",
            3,
        );
    }

    #[test]
    fn filter_just_string() {
        expect_error(
            "$[?'foo']",
            TypeError,
            "filter expression literals must be compared",
            4,
        );
    }

    #[test]
    fn filter_comparison_and_literal() {
        expect_error(
            "$[?true == false && false]",
            TypeError,
            "filter expression literals must be compared",
            20,
        );
    }
}

mod naming {
    use super::*;
    use JSONPathErrorType::NameError;

    #[test]
    fn unknown_function() {
        expect_error(
            "$[?nosuchthing()]",
            NameError,
            "no such function 'nosuchthing'",
            3,
        );
    }

    #[test]
    fn unknown_function_in_argument() {
        expect_error(
            "$[?count(nosuchthing(@.foo))]",
            NameError,
            "no such function 'nosuchthing'",
            9,
        );
    }
}

mod encoding {
    use super::*;
    use JSONPathErrorType::EncodingError;

    #[test]
    fn lone_low_surrogate() {
        expect_error(
            "$[\"\\uDD1E\"]",
            EncodingError,
            "unexpected low surrogate code point",
            3,
        );
    }

    #[test]
    fn unpaired_high_surrogate() {
        expect_error(
            "$[\"\\uD834\"]",
            EncodingError,
            "unpaired high surrogate code point",
            3,
        );
    }

    #[test]
    fn high_surrogate_followed_by_non_surrogate() {
        expect_error(
            "$[\"\\uD834\\u263A\"]",
            EncodingError,
            "unexpected code point",
            3,
        );
    }
}
