use crate::ast::{BinaryOp, Expr, PostfixOp, Program, Stmt, UnaryOp};
use crate::error::{RillError, Span};
use crate::lexer::{Literal, Token, TokenType};
use crate::value::Value;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    /// Parses the whole token stream into a program, stopping at the first
    /// grammar violation. There is no error recovery.
    pub fn parse(&mut self) -> Result<Program, RillError> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            statements.push(self.declaration()?);
        }

        Ok(Program { statements })
    }

    fn declaration(&mut self) -> Result<Stmt, RillError> {
        if self.match_types(&[TokenType::Let, TokenType::Var]) {
            self.var_declaration()
        } else if self.match_types(&[TokenType::Function]) {
            self.function_declaration()
        } else {
            self.statement()
        }
    }

    fn var_declaration(&mut self) -> Result<Stmt, RillError> {
        let start_span = self.previous().span.start;

        let name_token = self.consume(TokenType::Identifier, "Expected variable name")?;
        let name = name_token.lexeme.clone();

        self.consume_with_help(
            TokenType::Equal,
            "Expected '=' after variable name",
            "Declarations require an initializer. Example: let x = 10;".to_string(),
        )?;
        let initializer = self.expression()?;
        self.consume(TokenType::Semicolon, "Expected ';' after variable declaration")?;

        let end_span = self.previous().span.end;

        Ok(Stmt::Var {
            name,
            initializer,
            span: Span::new(start_span, end_span),
        })
    }

    fn function_declaration(&mut self) -> Result<Stmt, RillError> {
        let start_span = self.previous().span.start;

        let name_token = self.consume(TokenType::Identifier, "Expected function name")?;
        let name = name_token.lexeme.clone();

        self.consume(TokenType::LeftParen, "Expected '(' after function name")?;

        let mut params = Vec::new();
        if !self.check(&TokenType::RightParen) {
            loop {
                let param = self.consume(TokenType::Identifier, "Expected parameter name")?;
                params.push(param.lexeme.clone());
                if !self.match_types(&[TokenType::Comma]) {
                    break;
                }
            }
        }

        self.consume(TokenType::RightParen, "Expected ')' after parameters")?;
        self.consume_with_help(
            TokenType::LeftBrace,
            "Expected '{' before function body",
            "Function bodies must be blocks. Example: function add(a, b) { return a + b; }"
                .to_string(),
        )?;
        let body = self.block()?;

        let end_span = self.previous().span.end;

        Ok(Stmt::Function {
            name,
            params,
            body,
            span: Span::new(start_span, end_span),
        })
    }

    fn statement(&mut self) -> Result<Stmt, RillError> {
        if self.match_types(&[TokenType::Print]) {
            self.print_statement()
        } else if self.match_types(&[TokenType::LeftBrace]) {
            let start_span = self.previous().span.start;
            let statements = self.block()?;
            let end_span = self.previous().span.end;
            Ok(Stmt::Block {
                statements,
                span: Span::new(start_span, end_span),
            })
        } else if self.match_types(&[TokenType::If]) {
            self.if_statement()
        } else if self.match_types(&[TokenType::While]) {
            self.while_statement()
        } else if self.match_types(&[TokenType::For]) {
            self.for_statement()
        } else if self.match_types(&[TokenType::Return]) {
            self.return_statement()
        } else {
            self.expression_statement()
        }
    }

    fn block(&mut self) -> Result<Vec<Stmt>, RillError> {
        let mut statements = Vec::new();

        while !self.check(&TokenType::RightBrace) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }

        self.consume_with_help(
            TokenType::RightBrace,
            "Expected '}' after block",
            "Blocks must be closed with '}' after the opening '{'.".to_string(),
        )?;
        Ok(statements)
    }

    fn print_statement(&mut self) -> Result<Stmt, RillError> {
        let start_span = self.previous().span.start;
        let expr = self.expression()?;
        self.consume(TokenType::Semicolon, "Expected ';' after value")?;
        let end_span = self.previous().span.end;

        Ok(Stmt::Print {
            expr,
            span: Span::new(start_span, end_span),
        })
    }

    fn if_statement(&mut self) -> Result<Stmt, RillError> {
        let start_span = self.previous().span.start;

        self.consume_with_help(
            TokenType::LeftParen,
            "Expected '(' after 'if'",
            "If statements require parentheses around the condition: if (condition) { ... }"
                .to_string(),
        )?;
        let condition = self.expression()?;
        self.consume(TokenType::RightParen, "Expected ')' after if condition")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_types(&[TokenType::Else]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        let end_span = if let Some(ref else_stmt) = else_branch {
            else_stmt.span().end
        } else {
            then_branch.span().end
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
            span: Span::new(start_span, end_span),
        })
    }

    fn while_statement(&mut self) -> Result<Stmt, RillError> {
        let start_span = self.previous().span.start;

        self.consume(TokenType::LeftParen, "Expected '(' after 'while'")?;
        let condition = self.expression()?;
        self.consume(TokenType::RightParen, "Expected ')' after while condition")?;

        let body = Box::new(self.statement()?);
        let end_span = body.span().end;

        Ok(Stmt::While {
            condition,
            body,
            span: Span::new(start_span, end_span),
        })
    }

    /// Desugars `for (init; cond; inc) body` at parse time into
    /// `{ init; while (cond) { body; inc; } }`, with a missing condition
    /// replaced by the always-true literal 1.0.
    fn for_statement(&mut self) -> Result<Stmt, RillError> {
        let for_span = self.previous().span.clone();

        self.consume(TokenType::LeftParen, "Expected '(' after 'for'")?;

        let initializer = if self.match_types(&[TokenType::Semicolon]) {
            None
        } else if self.match_types(&[TokenType::Let, TokenType::Var]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(&TokenType::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::Semicolon, "Expected ';' after loop condition")?;

        let increment = if !self.check(&TokenType::RightParen) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::RightParen, "Expected ')' after for clauses")?;

        let mut body = self.statement()?;
        let end_span = body.span().end;

        if let Some(inc) = increment {
            let inc_span = inc.span().clone();
            body = Stmt::Block {
                statements: vec![
                    body,
                    Stmt::Expression {
                        expr: inc,
                        span: inc_span,
                    },
                ],
                span: Span::new(for_span.start, end_span),
            };
        }

        let condition = condition.unwrap_or(Expr::Literal {
            value: Value::Number(1.0),
            span: for_span.clone(),
        });

        body = Stmt::While {
            condition,
            body: Box::new(body),
            span: Span::new(for_span.start, end_span),
        };

        if let Some(init) = initializer {
            body = Stmt::Block {
                statements: vec![init, body],
                span: Span::new(for_span.start, end_span),
            };
        }

        Ok(body)
    }

    fn return_statement(&mut self) -> Result<Stmt, RillError> {
        let start_span = self.previous().span.start;
        let value = self.expression()?;
        self.consume(TokenType::Semicolon, "Expected ';' after return value")?;
        let end_span = self.previous().span.end;

        Ok(Stmt::Return {
            value,
            span: Span::new(start_span, end_span),
        })
    }

    fn expression_statement(&mut self) -> Result<Stmt, RillError> {
        let start_span = self.peek().span.start;
        let expr = self.expression()?;
        self.consume(TokenType::Semicolon, "Expected ';' after expression")?;
        let end_span = self.previous().span.end;

        Ok(Stmt::Expression {
            expr,
            span: Span::new(start_span, end_span),
        })
    }

    fn expression(&mut self) -> Result<Expr, RillError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, RillError> {
        let expr = self.or()?;

        if self.match_types(&[TokenType::Equal]) {
            let equals = self.previous().clone();
            let value = self.assignment()?;

            if let Expr::Variable { name, span } = expr {
                return Ok(Expr::Assign {
                    name,
                    value: Box::new(value),
                    span: Span::new(span.start, self.previous().span.end),
                });
            }

            return Err(RillError::parse_error_with_help(
                equals.span,
                "Invalid assignment target".to_string(),
                "Only variables can be assigned to. Example: x = 10".to_string(),
            ));
        }

        Ok(expr)
    }

    fn or(&mut self) -> Result<Expr, RillError> {
        let mut expr = self.and()?;

        while self.match_types(&[TokenType::Or]) {
            let start = expr.span().start;
            let right = self.and()?;
            let end = right.span().end;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator: BinaryOp::Or,
                right: Box::new(right),
                span: Span::new(start, end),
            };
        }

        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr, RillError> {
        let mut expr = self.equality()?;

        while self.match_types(&[TokenType::And]) {
            let start = expr.span().start;
            let right = self.equality()?;
            let end = right.span().end;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator: BinaryOp::And,
                right: Box::new(right),
                span: Span::new(start, end),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr, RillError> {
        let mut expr = self.comparison()?;

        while self.match_types(&[TokenType::BangEqual, TokenType::EqualEqual]) {
            let operator_token = self.previous().clone();
            let operator = match operator_token.token_type {
                TokenType::BangEqual => BinaryOp::NotEqual,
                TokenType::EqualEqual => BinaryOp::Equal,
                _ => unreachable!(),
            };

            let start = expr.span().start;
            let right = self.comparison().map_err(|_| {
                RillError::parse_error_with_help(
                    operator_token.span.clone(),
                    format!("Expected expression after '{}'", operator_token.lexeme),
                    "Equality operators like '==' and '!=' require expressions on both sides."
                        .to_string(),
                )
            })?;
            let end = right.span().end;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
                span: Span::new(start, end),
            };
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr, RillError> {
        let mut expr = self.term()?;

        while self.match_types(&[
            TokenType::Greater,
            TokenType::GreaterEqual,
            TokenType::Less,
            TokenType::LessEqual,
        ]) {
            let operator_token = self.previous().clone();
            let operator = match operator_token.token_type {
                TokenType::Greater => BinaryOp::Greater,
                TokenType::GreaterEqual => BinaryOp::GreaterEqual,
                TokenType::Less => BinaryOp::Less,
                TokenType::LessEqual => BinaryOp::LessEqual,
                _ => unreachable!(),
            };

            let start = expr.span().start;
            let right = self.term().map_err(|_| {
                RillError::parse_error_with_help(
                    operator_token.span.clone(),
                    format!("Expected expression after '{}'", operator_token.lexeme),
                    "Comparison operators like '>', '<', '>=' and '<=' require expressions on both sides."
                        .to_string(),
                )
            })?;
            let end = right.span().end;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
                span: Span::new(start, end),
            };
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, RillError> {
        let mut expr = self.factor()?;

        while self.match_types(&[TokenType::Minus, TokenType::Plus]) {
            let operator_token = self.previous().clone();
            let operator = match operator_token.token_type {
                TokenType::Minus => BinaryOp::Subtract,
                TokenType::Plus => BinaryOp::Add,
                _ => unreachable!(),
            };

            let start = expr.span().start;
            let right = self.factor().map_err(|_| {
                RillError::parse_error_with_help(
                    operator_token.span.clone(),
                    format!("Expected expression after '{}'", operator_token.lexeme),
                    "Arithmetic operators like '+' and '-' require expressions on both sides."
                        .to_string(),
                )
            })?;
            let end = right.span().end;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
                span: Span::new(start, end),
            };
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, RillError> {
        let mut expr = self.unary()?;

        while self.match_types(&[TokenType::Slash, TokenType::Star]) {
            let operator_token = self.previous().clone();
            let operator = match operator_token.token_type {
                TokenType::Slash => BinaryOp::Divide,
                TokenType::Star => BinaryOp::Multiply,
                _ => unreachable!(),
            };

            let start = expr.span().start;
            let right = self.unary().map_err(|_| {
                RillError::parse_error_with_help(
                    operator_token.span.clone(),
                    format!("Expected expression after '{}'", operator_token.lexeme),
                    "Multiplication and division operators require expressions on both sides."
                        .to_string(),
                )
            })?;
            let end = right.span().end;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
                span: Span::new(start, end),
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, RillError> {
        if self.match_types(&[
            TokenType::Bang,
            TokenType::Minus,
            TokenType::PlusPlus,
            TokenType::MinusMinus,
        ]) {
            let operator = match self.previous().token_type {
                TokenType::Bang => UnaryOp::Not,
                TokenType::Minus => UnaryOp::Negate,
                TokenType::PlusPlus => UnaryOp::Increment,
                TokenType::MinusMinus => UnaryOp::Decrement,
                _ => unreachable!(),
            };

            let start = self.previous().span.start;
            let right = self.unary()?;
            let end = right.span().end;

            return Ok(Expr::Unary {
                operator,
                operand: Box::new(right),
                span: Span::new(start, end),
            });
        }

        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr, RillError> {
        let mut expr = self.primary()?;

        while self.match_types(&[TokenType::PlusPlus, TokenType::MinusMinus]) {
            let operator = match self.previous().token_type {
                TokenType::PlusPlus => PostfixOp::Increment,
                TokenType::MinusMinus => PostfixOp::Decrement,
                _ => unreachable!(),
            };

            let start = expr.span().start;
            let end = self.previous().span.end;

            expr = Expr::Postfix {
                operand: Box::new(expr),
                operator,
                span: Span::new(start, end),
            };
        }

        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, RillError> {
        if self.is_at_end() {
            return Err(RillError::parse_error_with_help(
                self.peek().span.clone(),
                "Unexpected end of input".to_string(),
                "Expected an expression here. Check for unmatched parentheses or incomplete statements."
                    .to_string(),
            ));
        }

        let token = self.advance().clone();

        match token.token_type {
            TokenType::Number => {
                if let Literal::Number(value) = token.literal {
                    Ok(Expr::Literal {
                        value: Value::Number(value),
                        span: token.span,
                    })
                } else {
                    Err(RillError::parse_error(
                        token.span,
                        "Malformed number token".to_string(),
                    ))
                }
            }
            TokenType::String => {
                if let Literal::Text(value) = token.literal {
                    Ok(Expr::Literal {
                        value: Value::Text(value),
                        span: token.span,
                    })
                } else {
                    Err(RillError::parse_error(
                        token.span,
                        "Malformed string token".to_string(),
                    ))
                }
            }
            TokenType::True => Ok(Expr::Literal {
                value: Value::Number(1.0),
                span: token.span,
            }),
            TokenType::False => Ok(Expr::Literal {
                value: Value::Number(0.0),
                span: token.span,
            }),
            TokenType::LeftParen => {
                let expr = self.expression()?;
                self.consume_with_help(
                    TokenType::RightParen,
                    "Expected ')' after expression",
                    "Every opening parenthesis '(' must have a matching closing parenthesis ')'."
                        .to_string(),
                )?;
                Ok(expr)
            }
            TokenType::Identifier => {
                if self.match_types(&[TokenType::LeftParen]) {
                    self.finish_call(token)
                } else {
                    Ok(Expr::Variable {
                        name: token.lexeme,
                        span: token.span,
                    })
                }
            }
            _ => {
                let help_msg = match token.token_type {
                    TokenType::RightParen => {
                        "Found ')' without matching '('. Check for unbalanced parentheses."
                    }
                    TokenType::RightBrace => {
                        "Found '}' without matching '{'. Check for unbalanced braces."
                    }
                    _ => "Expected a literal value, variable, or parenthesized expression here.",
                };

                Err(RillError::parse_error_with_help(
                    token.span,
                    format!("Expected expression, found '{}'", token.lexeme),
                    help_msg.to_string(),
                ))
            }
        }
    }

    fn finish_call(&mut self, name_token: Token) -> Result<Expr, RillError> {
        let mut args = Vec::new();

        if !self.check(&TokenType::RightParen) {
            loop {
                args.push(self.expression()?);
                if !self.match_types(&[TokenType::Comma]) {
                    break;
                }
            }
        }

        let paren = self.consume_with_help(
            TokenType::RightParen,
            "Expected ')' after arguments",
            "Function calls must be closed with ')' after the arguments. Example: add(1, 2)"
                .to_string(),
        )?;
        let end = paren.span.end;

        Ok(Expr::Call {
            callee: name_token.lexeme,
            args,
            span: Span::new(name_token.span.start, end),
        })
    }

    fn match_types(&mut self, types: &[TokenType]) -> bool {
        for token_type in types {
            if self.check(token_type) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            false
        } else {
            &self.peek().token_type == token_type
        }
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> Result<&Token, RillError> {
        if self.check(&token_type) {
            Ok(self.advance())
        } else {
            Err(RillError::parse_error(
                self.error_span(),
                message.to_string(),
            ))
        }
    }

    fn consume_with_help(
        &mut self,
        token_type: TokenType,
        message: &str,
        help: String,
    ) -> Result<&Token, RillError> {
        if self.check(&token_type) {
            Ok(self.advance())
        } else {
            Err(RillError::parse_error_with_help(
                self.error_span(),
                message.to_string(),
                help,
            ))
        }
    }

    /// Span to blame for a missing token: the end of the last real token at
    /// EOF, otherwise the unexpected token itself.
    fn error_span(&self) -> Span {
        if self.is_at_end() && self.current > 0 {
            let last_token = &self.tokens[self.current - 1];
            Span::single(last_token.span.end)
        } else {
            self.peek().span.clone()
        }
    }
}
