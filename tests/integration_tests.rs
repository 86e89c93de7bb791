// Front-end integration tests: parser robustness plus token-stream and
// AST-shape checks.

use rill::ast::{BinaryOp, Expr, Stmt};
use rill::error::{ErrorKind, RillError};
use rill::lexer::{Lexer, Literal, TokenType};
use rill::parser::Parser;
use rill::value::Value;

/// Test result for a single test case
#[derive(Debug)]
pub enum TestResult {
    Pass,
    Fail(String),
    Crash(String),
}

/// Individual test case
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub input: String,
    pub should_succeed: bool,
    pub expected_error_contains: Option<String>,
}

impl TestCase {
    pub fn should_succeed(name: &str, input: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: true,
            expected_error_contains: None,
        }
    }

    pub fn should_fail(name: &str, input: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: false,
            expected_error_contains: None,
        }
    }

    pub fn should_fail_with_message(name: &str, input: &str, expected_msg: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: false,
            expected_error_contains: Some(expected_msg.to_string()),
        }
    }
}

/// Test suite containing multiple test cases
#[derive(Debug)]
pub struct TestSuite {
    pub name: String,
    pub tests: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tests: Vec::new(),
        }
    }

    pub fn add_test(&mut self, test: TestCase) {
        self.tests.push(test);
    }

    /// Runs all tests in this suite, returning the number of failures.
    pub fn run(&self) -> usize {
        let mut failures = 0;

        println!("Running test suite: {}", self.name);

        for test in &self.tests {
            match run_single_test(test) {
                TestResult::Pass => {
                    println!("  ok   {}", test.name);
                }
                TestResult::Fail(msg) => {
                    failures += 1;
                    println!("  FAIL {}: {}", test.name, msg);
                }
                TestResult::Crash(msg) => {
                    failures += 1;
                    println!("  CRASH {}: {}", test.name, msg);
                }
            }
        }

        failures
    }
}

/// Run a single test case, catching panics to detect parser crashes.
fn run_single_test(test: &TestCase) -> TestResult {
    let input = test.input.clone();
    let result = std::panic::catch_unwind(move || parse_input(&input));

    match result {
        Ok(parse_result) => match (parse_result, test.should_succeed) {
            (Ok(_), true) => TestResult::Pass,
            (Ok(_), false) => {
                TestResult::Fail("Expected parsing to fail, but it succeeded".to_string())
            }
            (Err(error), false) => {
                if let Some(expected) = &test.expected_error_contains {
                    if error.message.contains(expected) {
                        TestResult::Pass
                    } else {
                        TestResult::Fail(format!(
                            "Error message '{}' doesn't contain expected text '{}'",
                            error.message, expected
                        ))
                    }
                } else {
                    TestResult::Pass // Any error is acceptable
                }
            }
            (Err(error), true) => TestResult::Fail(format!(
                "Expected parsing to succeed, but got error: {}",
                error.message
            )),
        },
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else {
                "Unknown panic".to_string()
            };
            TestResult::Crash(panic_msg)
        }
    }
}

fn parse_input(input: &str) -> Result<rill::ast::Program, RillError> {
    let mut lexer = Lexer::new(input.to_string());
    let tokens = lexer.scan_tokens()?;
    let mut parser = Parser::new(tokens);
    parser.parse()
}

// ============================================================================
// Test Suite Creation Functions
// ============================================================================

fn create_malformed_expressions_tests() -> TestSuite {
    let mut suite = TestSuite::new("Malformed Expressions");

    suite.add_test(TestCase::should_fail_with_message(
        "unmatched_opening_paren",
        "(1 + 2;",
        "Expected ')' after expression",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "unmatched_opening_paren_nested",
        "((1 + 2);",
        "Expected ')' after expression",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "unmatched_closing_paren",
        "1 + 2);",
        "Expected ';' after expression",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "empty_parentheses",
        "();",
        "Expected expression, found ')'",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "empty_parentheses_in_expression",
        "1 + ();",
        "Expected expression after '+'",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "unmatched_opening_brace",
        "{ x = 1;",
        "Expected '}' after block",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "unmatched_closing_brace",
        "x = 1; }",
        "Expected expression, found '}'",
    ));

    suite
}

fn create_edge_case_tests() -> TestSuite {
    let mut suite = TestSuite::new("Edge Cases");

    suite.add_test(TestCase::should_succeed("empty_input", ""));
    suite.add_test(TestCase::should_succeed("only_whitespace", "   \n\t  "));
    suite.add_test(TestCase::should_succeed("only_comment", "// nothing here\n"));

    suite.add_test(TestCase::should_fail("unexpected_eof_after_operator", "1 +"));
    suite.add_test(TestCase::should_fail("unexpected_eof_in_expression", "1 + ("));

    let deep_parens = "(".repeat(100) + "1" + &")".repeat(100) + ";";
    suite.add_test(TestCase::should_succeed(
        "deeply_nested_parens",
        &deep_parens,
    ));

    suite
}

fn create_operator_tests() -> TestSuite {
    let mut suite = TestSuite::new("Operator Tests");

    suite.add_test(TestCase::should_fail("missing_left_operand", "+ 1;"));
    suite.add_test(TestCase::should_fail("missing_right_operand", "1 +;"));
    suite.add_test(TestCase::should_fail("missing_both_operands", "+;"));

    // '++' and '--' munch maximally, so these are postfix operators followed
    // by a stray operand
    suite.add_test(TestCase::should_fail("double_plus_between_operands", "1 ++ 2;"));
    suite.add_test(TestCase::should_fail("double_minus_between_operands", "1 -- 2;"));
    suite.add_test(TestCase::should_succeed("plus_then_unary_minus", "1 +- 2;"));

    suite.add_test(TestCase::should_succeed("comparison_equal", "1 == 2;"));
    suite.add_test(TestCase::should_succeed("comparison_not_equal", "1 != 2;"));
    suite.add_test(TestCase::should_succeed("comparison_less", "1 < 2;"));
    suite.add_test(TestCase::should_succeed("comparison_greater", "1 > 2;"));
    suite.add_test(TestCase::should_succeed("logical_mix", "1 and 2 or 0;"));

    suite.add_test(TestCase::should_succeed("postfix_increment", "x++;"));
    suite.add_test(TestCase::should_succeed("prefix_increment", "++x;"));
    suite.add_test(TestCase::should_succeed("postfix_chain", "x++--;"));

    suite
}

fn create_control_flow_tests() -> TestSuite {
    let mut suite = TestSuite::new("Control Flow Tests");

    suite.add_test(TestCase::should_succeed("valid_if", "if (true) { x = 1; }"));
    suite.add_test(TestCase::should_succeed(
        "if_else",
        "if (x < 1) print x; else print 0;",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "if_missing_condition",
        "if { x = 1; }",
        "Expected '(' after 'if'",
    ));
    suite.add_test(TestCase::should_fail("if_missing_body", "if (true)"));

    suite.add_test(TestCase::should_succeed(
        "valid_while",
        "while (true) { x = 1; }",
    ));
    suite.add_test(TestCase::should_fail("while_missing_condition", "while { x = 1; }"));
    suite.add_test(TestCase::should_fail("while_missing_body", "while (true)"));

    suite.add_test(TestCase::should_succeed(
        "valid_for",
        "for (let i = 0; i < 10; i = i + 1) { print i; }",
    ));
    suite.add_test(TestCase::should_succeed(
        "for_empty_clauses",
        "for (;;) { print 1; }",
    ));
    suite.add_test(TestCase::should_fail(
        "for_missing_semicolon",
        "for (i = 0 i < 10; i = i + 1) { print i; }",
    ));

    suite.add_test(TestCase::should_succeed("top_level_return", "return 1;"));
    suite.add_test(TestCase::should_fail(
        "return_missing_semicolon",
        "return 1",
    ));

    suite
}

fn create_literal_tests() -> TestSuite {
    let mut suite = TestSuite::new("Literal Tests");

    suite.add_test(TestCase::should_succeed("number_literal", "42;"));
    suite.add_test(TestCase::should_succeed("fractional_literal", "3.14;"));
    suite.add_test(TestCase::should_succeed("string_literal", "\"hello\";"));
    suite.add_test(TestCase::should_succeed("boolean_true", "true;"));
    suite.add_test(TestCase::should_succeed("boolean_false", "false;"));

    // There is no '.' token, so stray dots are lexical errors
    suite.add_test(TestCase::should_fail_with_message(
        "multiple_dots",
        "3.14.159;",
        "Unexpected character",
    ));
    suite.add_test(TestCase::should_fail("trailing_dot", "42.;"));
    suite.add_test(TestCase::should_fail("leading_dot", ".42;"));

    suite.add_test(TestCase::should_fail_with_message(
        "unterminated_string",
        "\"hello",
        "Unterminated string",
    ));

    suite
}

fn create_function_tests() -> TestSuite {
    let mut suite = TestSuite::new("Function Tests");

    suite.add_test(TestCase::should_succeed("simple_call", "foo();"));
    suite.add_test(TestCase::should_succeed("call_with_args", "foo(1, 2, 3);"));
    suite.add_test(TestCase::should_succeed("nested_call", "foo(bar(1), 2);"));

    suite.add_test(TestCase::should_fail_with_message(
        "call_missing_closing_paren",
        "foo(1, 2;",
        "Expected ')' after arguments",
    ));
    suite.add_test(TestCase::should_fail("call_trailing_comma", "foo(1, 2,);"));

    suite.add_test(TestCase::should_succeed(
        "function_declaration",
        "function add(a, b) { return a + b; }",
    ));
    suite.add_test(TestCase::should_succeed(
        "function_no_params",
        "function f() { print 1; }",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "function_missing_body",
        "function f();",
        "Expected '{' before function body",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "function_missing_name",
        "function (a) { return a; }",
        "Expected function name",
    ));

    suite
}

fn create_statement_tests() -> TestSuite {
    let mut suite = TestSuite::new("Statement Tests");

    suite.add_test(TestCase::should_succeed("let_declaration", "let x = 42;"));
    suite.add_test(TestCase::should_succeed("var_declaration", "var x = 42;"));
    suite.add_test(TestCase::should_fail_with_message(
        "let_missing_initializer",
        "let x;",
        "Expected '=' after variable name",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "let_missing_name",
        "let 1 = 2;",
        "Expected variable name",
    ));

    suite.add_test(TestCase::should_succeed("print_statement", "print 1 + 2;"));
    suite.add_test(TestCase::should_fail_with_message(
        "print_missing_semicolon",
        "print 1",
        "Expected ';' after value",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "expression_missing_semicolon",
        "1 + 2",
        "Expected ';' after expression",
    ));

    suite.add_test(TestCase::should_succeed("simple_assignment", "x = 1;"));
    suite.add_test(TestCase::should_succeed("chained_assignment", "x = y = 2;"));
    suite.add_test(TestCase::should_fail("assignment_missing_value", "x =;"));
    suite.add_test(TestCase::should_fail_with_message(
        "invalid_assignment_target",
        "1 = x;",
        "Invalid assignment target",
    ));

    suite
}

fn create_positive_tests() -> TestSuite {
    let mut suite = TestSuite::new("Positive Tests");

    suite.add_test(TestCase::should_succeed("simple_arithmetic", "1 + 2 * 3;"));
    suite.add_test(TestCase::should_succeed("parentheses", "(1 + 2) * 3;"));
    suite.add_test(TestCase::should_succeed(
        "string_concatenation",
        "\"hello\" + \" world\";",
    ));
    suite.add_test(TestCase::should_succeed("boolean_operations", "true and false;"));
    suite.add_test(TestCase::should_succeed(
        "complex_expression",
        "x = (1 + 2) * 3 + foo(4, 5);",
    ));
    suite.add_test(TestCase::should_succeed(
        "full_program",
        "let total = 0; for (let i = 0; i < 10; i = i + 1) { total = total + i; } print total;",
    ));

    suite
}

#[test]
fn comprehensive_parser_tests() {
    let suites = vec![
        create_malformed_expressions_tests(),
        create_edge_case_tests(),
        create_operator_tests(),
        create_control_flow_tests(),
        create_literal_tests(),
        create_function_tests(),
        create_statement_tests(),
        create_positive_tests(),
    ];

    let mut failures = 0;
    for suite in suites {
        failures += suite.run();
    }

    assert_eq!(failures, 0, "{} parser test case(s) failed", failures);
}

// ============================================================================
// Token stream checks
// ============================================================================

fn scan(source: &str) -> Vec<rill::lexer::Token> {
    Lexer::new(source.to_string())
        .scan_tokens()
        .expect("lexing failed")
}

#[test]
fn single_character_tokens() {
    let tokens = scan("()+-*/;{},");
    let expected = [
        TokenType::LeftParen,
        TokenType::RightParen,
        TokenType::Plus,
        TokenType::Minus,
        TokenType::Star,
        TokenType::Slash,
        TokenType::Semicolon,
        TokenType::LeftBrace,
        TokenType::RightBrace,
        TokenType::Comma,
        TokenType::Eof,
    ];

    assert_eq!(tokens.len(), expected.len());
    for (token, expected_type) in tokens.iter().zip(expected.iter()) {
        assert_eq!(&token.token_type, expected_type);
    }
}

#[test]
fn double_character_tokens() {
    let tokens = scan("== != <= >= ++ --");
    let expected = [
        TokenType::EqualEqual,
        TokenType::BangEqual,
        TokenType::LessEqual,
        TokenType::GreaterEqual,
        TokenType::PlusPlus,
        TokenType::MinusMinus,
        TokenType::Eof,
    ];

    assert_eq!(tokens.len(), expected.len());
    for (token, expected_type) in tokens.iter().zip(expected.iter()) {
        assert_eq!(&token.token_type, expected_type);
    }
}

#[test]
fn number_literals_are_decoded() {
    let tokens = scan("123 45.67");
    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[0].token_type, TokenType::Number);
    assert_eq!(tokens[0].literal, Literal::Number(123.0));
    assert_eq!(tokens[1].token_type, TokenType::Number);
    assert_eq!(tokens[1].literal, Literal::Number(45.67));
    assert_eq!(tokens[2].token_type, TokenType::Eof);
}

#[test]
fn string_literal_keeps_quotes_in_lexeme() {
    let tokens = scan("\"hello\"");
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].token_type, TokenType::String);
    assert_eq!(tokens[0].lexeme, "\"hello\"");
    assert_eq!(tokens[0].literal, Literal::Text("hello".to_string()));
}

#[test]
fn keywords_and_identifiers() {
    let tokens = scan("let var print function foo");
    let expected = [
        TokenType::Let,
        TokenType::Var,
        TokenType::Print,
        TokenType::Function,
        TokenType::Identifier,
        TokenType::Eof,
    ];

    assert_eq!(tokens.len(), expected.len());
    for (token, expected_type) in tokens.iter().zip(expected.iter()) {
        assert_eq!(&token.token_type, expected_type);
    }
    assert_eq!(tokens[4].lexeme, "foo");
}

#[test]
fn newlines_advance_the_line_counter() {
    let tokens = scan("1\n2\n3");
    assert_eq!(tokens[0].line, 1);
    assert_eq!(tokens[1].line, 2);
    assert_eq!(tokens[2].line, 3);
}

#[test]
fn comments_are_discarded() {
    let tokens = scan("1 // the rest is ignored\n+ 2");
    let expected = [
        TokenType::Number,
        TokenType::Plus,
        TokenType::Number,
        TokenType::Eof,
    ];

    assert_eq!(tokens.len(), expected.len());
    for (token, expected_type) in tokens.iter().zip(expected.iter()) {
        assert_eq!(&token.token_type, expected_type);
    }
}

#[test]
fn unexpected_character_is_a_lex_error() {
    let error = Lexer::new("1 @ 2".to_string())
        .scan_tokens()
        .expect_err("lexing should fail");
    assert_eq!(error.kind, ErrorKind::LexError);
}

// ============================================================================
// AST shape checks
// ============================================================================

fn parse_single_statement(source: &str) -> Stmt {
    let program = parse_input(source).expect("parsing failed");
    assert_eq!(program.statements.len(), 1);
    program.statements.into_iter().next().unwrap()
}

#[test]
fn parses_let_declaration() {
    let stmt = parse_single_statement("let x = 42;");

    match stmt {
        Stmt::Var {
            name, initializer, ..
        } => {
            assert_eq!(name, "x");
            assert!(matches!(
                initializer,
                Expr::Literal {
                    value: Value::Number(n),
                    ..
                } if n == 42.0
            ));
        }
        other => panic!("expected a var statement, got {:?}", other),
    }
}

#[test]
fn parses_print_statement() {
    let stmt = parse_single_statement("print 2 + 3;");

    match stmt {
        Stmt::Print { expr, .. } => {
            assert!(matches!(
                expr,
                Expr::Binary {
                    operator: BinaryOp::Add,
                    ..
                }
            ));
        }
        other => panic!("expected a print statement, got {:?}", other),
    }
}

#[test]
fn parses_while_loop() {
    let stmt = parse_single_statement("while (x < 10) print x;");

    match stmt {
        Stmt::While { condition, .. } => {
            assert!(matches!(
                condition,
                Expr::Binary {
                    operator: BinaryOp::Less,
                    ..
                }
            ));
        }
        other => panic!("expected a while statement, got {:?}", other),
    }
}

#[test]
fn parses_function_declaration() {
    let stmt = parse_single_statement("function add(a, b) { return a + b; }");

    match stmt {
        Stmt::Function {
            name, params, body, ..
        } => {
            assert_eq!(name, "add");
            assert_eq!(params, vec!["a".to_string(), "b".to_string()]);
            assert_eq!(body.len(), 1);
            assert!(matches!(body[0], Stmt::Return { .. }));
        }
        other => panic!("expected a function statement, got {:?}", other),
    }
}

#[test]
fn assignment_is_right_associative() {
    let stmt = parse_single_statement("a = b = 2;");

    match stmt {
        Stmt::Expression {
            expr: Expr::Assign { name, value, .. },
            ..
        } => {
            assert_eq!(name, "a");
            assert!(matches!(*value, Expr::Assign { .. }));
        }
        other => panic!("expected an assignment, got {:?}", other),
    }
}

#[test]
fn identifier_followed_by_paren_is_a_call() {
    let stmt = parse_single_statement("foo(1, 2, 3);");

    match stmt {
        Stmt::Expression {
            expr: Expr::Call { callee, args, .. },
            ..
        } => {
            assert_eq!(callee, "foo");
            assert_eq!(args.len(), 3);
        }
        other => panic!("expected a call, got {:?}", other),
    }
}

#[test]
fn for_loop_desugars_into_while() {
    let stmt = parse_single_statement("for (let i = 0; i < 3; i = i + 1) print i;");

    // { let i = 0; while (i < 3) { print i; i = i + 1; } }
    let statements = match stmt {
        Stmt::Block { statements, .. } => statements,
        other => panic!("expected the desugared outer block, got {:?}", other),
    };
    assert_eq!(statements.len(), 2);
    assert!(matches!(statements[0], Stmt::Var { ref name, .. } if name == "i"));

    let body = match &statements[1] {
        Stmt::While { body, .. } => body,
        other => panic!("expected the desugared while loop, got {:?}", other),
    };
    match body.as_ref() {
        Stmt::Block { statements, .. } => {
            assert_eq!(statements.len(), 2);
            assert!(matches!(statements[0], Stmt::Print { .. }));
            assert!(matches!(statements[1], Stmt::Expression { .. }));
        }
        other => panic!("expected the increment-wrapping block, got {:?}", other),
    }
}

#[test]
fn condition_free_for_loop_gets_an_always_true_condition() {
    let stmt = parse_single_statement("for (;;) print 1;");

    match stmt {
        Stmt::While { condition, .. } => {
            assert!(matches!(
                condition,
                Expr::Literal {
                    value: Value::Number(n),
                    ..
                } if n == 1.0
            ));
        }
        other => panic!("expected a bare while loop, got {:?}", other),
    }
}

#[test]
fn parenthesized_expressions_collapse() {
    let stmt = parse_single_statement("(1 + 2) * 3;");

    match stmt {
        Stmt::Expression {
            expr:
                Expr::Binary {
                    left,
                    operator: BinaryOp::Multiply,
                    ..
                },
            ..
        } => {
            assert!(matches!(
                *left,
                Expr::Binary {
                    operator: BinaryOp::Add,
                    ..
                }
            ));
        }
        other => panic!("expected multiplication at the root, got {:?}", other),
    }
}
