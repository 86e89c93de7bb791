use crate::ast::{BinaryOp, Expr, PostfixOp, Program, Stmt, UnaryOp};
use crate::error::{ErrorKind, RillError, Span};
use crate::value::{Function, Value};
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

/// Parent-chained scope frame. Lookup walks outward; `define` binds in the
/// current frame; `assign` mutates the nearest frame that already binds the
/// name, or creates the binding in the current frame if none does.
#[derive(Debug, Clone)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Box<Environment>>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Environment) -> Self {
        Self {
            values: HashMap::new(),
            enclosing: Some(Box::new(enclosing)),
        }
    }

    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            Some(value.clone())
        } else if let Some(ref enclosing) = self.enclosing {
            enclosing.get(name)
        } else {
            None
        }
    }

    pub fn assign(&mut self, name: &str, value: Value) {
        if let Err(value) = self.assign_existing(name, value) {
            self.values.insert(name.to_string(), value);
        }
    }

    /// Walks outward for an existing binding; hands the value back if none
    /// of the frames defines the name.
    fn assign_existing(&mut self, name: &str, value: Value) -> Result<(), Value> {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            Ok(())
        } else if let Some(ref mut enclosing) = self.enclosing {
            enclosing.assign_existing(name, value)
        } else {
            Err(value)
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

/// Statement-level control flow. `Return` unwinds up through blocks, loops
/// and branches until a call boundary (or the top level) consumes it.
#[derive(Debug)]
pub enum Control {
    Normal,
    Return(Value),
}

pub struct Evaluator<W: Write> {
    environment: Environment,
    out: W,
}

impl Evaluator<io::Stdout> {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Evaluator<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Evaluator<W> {
    /// Builds an evaluator writing `print` output to the given sink.
    pub fn with_output(out: W) -> Self {
        Self {
            environment: Environment::new(),
            out,
        }
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Executes the program's statements in order against the owned
    /// environment. An error aborts immediately; effects from earlier
    /// statements are retained.
    pub fn evaluate_program(&mut self, program: &Program) -> Result<(), RillError> {
        for statement in &program.statements {
            if let Control::Return(_) = self.execute_statement(statement)? {
                return Err(RillError::invalid_target(
                    statement.span().clone(),
                    "Cannot return from top-level code".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn execute_statement(&mut self, stmt: &Stmt) -> Result<Control, RillError> {
        match stmt {
            Stmt::Expression { expr, .. } => {
                self.evaluate_expression(expr)?;
                Ok(Control::Normal)
            }
            Stmt::Print { expr, span } => {
                let value = self.evaluate_expression(expr)?;
                writeln!(self.out, "{}", value).map_err(|e| {
                    RillError::new(
                        ErrorKind::Io,
                        span.clone(),
                        format!("Failed to write output: {}", e),
                    )
                })?;
                Ok(Control::Normal)
            }
            Stmt::Var {
                name, initializer, ..
            } => {
                let value = self.evaluate_expression(initializer)?;
                self.environment.define(name, value);
                Ok(Control::Normal)
            }
            Stmt::Block { statements, .. } => self.execute_block(statements),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                let condition_value = self.evaluate_expression(condition)?;
                if condition_value.is_truthy() {
                    self.execute_statement(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute_statement(else_stmt)
                } else {
                    Ok(Control::Normal)
                }
            }
            Stmt::While {
                condition, body, ..
            } => {
                while self.evaluate_expression(condition)?.is_truthy() {
                    if let Control::Return(value) = self.execute_statement(body)? {
                        return Ok(Control::Return(value));
                    }
                }
                Ok(Control::Normal)
            }
            Stmt::Function {
                name, params, body, ..
            } => {
                let function = Rc::new(Function {
                    name: name.clone(),
                    params: params.clone(),
                    body: body.clone(),
                });
                self.environment.define(name, Value::Function(function));
                Ok(Control::Normal)
            }
            Stmt::Return { value, .. } => {
                let value = self.evaluate_expression(value)?;
                Ok(Control::Return(value))
            }
        }
    }

    /// Blocks run in a fresh child frame; bindings created inside are
    /// dropped with the frame, mutations to outer names persist.
    fn execute_block(&mut self, statements: &[Stmt]) -> Result<Control, RillError> {
        let previous = std::mem::take(&mut self.environment);
        self.environment = Environment::with_enclosing(previous);

        let result = self.run_statements(statements);

        if let Some(enclosing) = self.environment.enclosing.take() {
            self.environment = *enclosing;
        }
        result
    }

    fn run_statements(&mut self, statements: &[Stmt]) -> Result<Control, RillError> {
        for statement in statements {
            if let Control::Return(value) = self.execute_statement(statement)? {
                return Ok(Control::Return(value));
            }
        }
        Ok(Control::Normal)
    }

    pub fn evaluate_expression(&mut self, expr: &Expr) -> Result<Value, RillError> {
        match expr {
            Expr::Literal { value, .. } => Ok(value.clone()),
            Expr::Variable { name, span } => self.environment.get(name).ok_or_else(|| {
                RillError::undefined_name(span.clone(), format!("Undefined variable '{}'", name))
            }),
            Expr::Assign { name, value, .. } => {
                let value = self.evaluate_expression(value)?;
                self.environment.assign(name, value.clone());
                Ok(value)
            }
            Expr::Binary {
                left,
                operator,
                right,
                span,
            } => {
                let left_value = self.evaluate_expression(left)?;

                match operator {
                    // Logical operators short-circuit: the right operand is
                    // only evaluated (and type-checked) when needed.
                    BinaryOp::And => {
                        if number_operand(&left_value, left.span())? == 0.0 {
                            return Ok(Value::Number(0.0));
                        }
                        let right_value = self.evaluate_expression(right)?;
                        let r = number_operand(&right_value, right.span())?;
                        Ok(Value::Number(if r != 0.0 { 1.0 } else { 0.0 }))
                    }
                    BinaryOp::Or => {
                        if number_operand(&left_value, left.span())? != 0.0 {
                            return Ok(Value::Number(1.0));
                        }
                        let right_value = self.evaluate_expression(right)?;
                        let r = number_operand(&right_value, right.span())?;
                        Ok(Value::Number(if r != 0.0 { 1.0 } else { 0.0 }))
                    }
                    _ => {
                        let right_value = self.evaluate_expression(right)?;
                        evaluate_binary_op(operator, left_value, right_value, span)
                    }
                }
            }
            Expr::Unary {
                operator,
                operand,
                span,
            } => match operator {
                UnaryOp::Negate => {
                    let value = self.evaluate_expression(operand)?;
                    let n = number_operand(&value, span)?;
                    Ok(Value::Number(-n))
                }
                UnaryOp::Not => {
                    let value = self.evaluate_expression(operand)?;
                    let n = number_operand(&value, span)?;
                    Ok(Value::Number(if n == 0.0 { 1.0 } else { 0.0 }))
                }
                UnaryOp::Increment => self.mutate_variable(operand, 1.0, span).map(|(_, new)| new),
                UnaryOp::Decrement => self.mutate_variable(operand, -1.0, span).map(|(_, new)| new),
            },
            Expr::Postfix {
                operand,
                operator,
                span,
            } => {
                let delta = match operator {
                    PostfixOp::Increment => 1.0,
                    PostfixOp::Decrement => -1.0,
                };
                // Postfix reads then mutates: the pre-mutation value is the result
                self.mutate_variable(operand, delta, span).map(|(old, _)| old)
            }
            Expr::Call { callee, args, span } => self.evaluate_call(callee, args, span),
        }
    }

    /// Shared ++/-- machinery: the operand must be a variable bound to a
    /// number. Returns (pre-mutation, post-mutation) values.
    fn mutate_variable(
        &mut self,
        operand: &Expr,
        delta: f64,
        span: &Span,
    ) -> Result<(Value, Value), RillError> {
        let name = match operand {
            Expr::Variable { name, .. } => name,
            _ => {
                return Err(RillError::invalid_target(
                    span.clone(),
                    "Increment and decrement require a variable operand".to_string(),
                ));
            }
        };

        let current = self.environment.get(name).ok_or_else(|| {
            RillError::undefined_name(span.clone(), format!("Undefined variable '{}'", name))
        })?;

        let n = match current {
            Value::Number(n) => n,
            other => {
                return Err(RillError::type_mismatch(
                    span.clone(),
                    format!(
                        "Cannot increment or decrement a {}, '{}' must be a number",
                        other.type_name(),
                        name
                    ),
                ));
            }
        };

        let new_value = Value::Number(n + delta);
        self.environment.assign(name, new_value.clone());
        Ok((Value::Number(n), new_value))
    }

    fn evaluate_call(
        &mut self,
        callee: &str,
        args: &[Expr],
        span: &Span,
    ) -> Result<Value, RillError> {
        let value = self.environment.get(callee).ok_or_else(|| {
            RillError::undefined_name(span.clone(), format!("Undefined function '{}'", callee))
        })?;

        let function = match value {
            Value::Function(function) => function,
            other => {
                return Err(RillError::not_callable(
                    span.clone(),
                    format!("'{}' is not a function, it is a {}", callee, other.type_name()),
                ));
            }
        };

        if args.len() != function.params.len() {
            return Err(RillError::arity_mismatch(
                span.clone(),
                format!(
                    "Function '{}' expects {} argument(s), got {}",
                    callee,
                    function.params.len(),
                    args.len()
                ),
            ));
        }

        // Arguments are evaluated in the caller's environment
        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.evaluate_expression(arg)?);
        }

        // The call frame holds only the parameters and chains onto the
        // caller's environment: mutations to pre-existing names are visible
        // to the caller, bindings created inside the call are not.
        let previous = std::mem::take(&mut self.environment);
        self.environment = Environment::with_enclosing(previous);
        for (param, value) in function.params.iter().zip(arg_values) {
            self.environment.define(param, value);
        }

        let result = self.run_statements(&function.body);

        if let Some(enclosing) = self.environment.enclosing.take() {
            self.environment = *enclosing;
        }

        match result? {
            Control::Return(value) => Ok(value),
            Control::Normal => Ok(Value::Nil),
        }
    }
}

fn number_operand(value: &Value, span: &Span) -> Result<f64, RillError> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(RillError::type_mismatch(
            span.clone(),
            format!("Expected a number, got {}", other.type_name()),
        )),
    }
}

fn evaluate_binary_op(
    operator: &BinaryOp,
    left: Value,
    right: Value,
    span: &Span,
) -> Result<Value, RillError> {
    match operator {
        BinaryOp::Add => match (left, right) {
            (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
            (Value::Text(l), Value::Text(r)) => Ok(Value::Text(l + &r)),
            (l, r) => Err(RillError::type_mismatch(
                span.clone(),
                format!("Cannot add {} and {}", l.type_name(), r.type_name()),
            )),
        },
        BinaryOp::Subtract => match (left, right) {
            (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l - r)),
            (l, r) => Err(RillError::type_mismatch(
                span.clone(),
                format!("Cannot subtract {} and {}", l.type_name(), r.type_name()),
            )),
        },
        BinaryOp::Multiply => match (left, right) {
            (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l * r)),
            (l, r) => Err(RillError::type_mismatch(
                span.clone(),
                format!("Cannot multiply {} and {}", l.type_name(), r.type_name()),
            )),
        },
        BinaryOp::Divide => match (left, right) {
            (Value::Number(l), Value::Number(r)) => {
                if r == 0.0 {
                    Err(RillError::division_by_zero(span.clone()))
                } else {
                    Ok(Value::Number(l / r))
                }
            }
            (l, r) => Err(RillError::type_mismatch(
                span.clone(),
                format!("Cannot divide {} and {}", l.type_name(), r.type_name()),
            )),
        },
        // Equality is structural; values of different kinds are never equal
        BinaryOp::Equal => Ok(bool_value(left == right)),
        BinaryOp::NotEqual => Ok(bool_value(left != right)),
        BinaryOp::Greater => compare(left, right, span, |l, r| l > r),
        BinaryOp::GreaterEqual => compare(left, right, span, |l, r| l >= r),
        BinaryOp::Less => compare(left, right, span, |l, r| l < r),
        BinaryOp::LessEqual => compare(left, right, span, |l, r| l <= r),
        BinaryOp::And | BinaryOp::Or => unreachable!("logical operators short-circuit"),
    }
}

fn compare(
    left: Value,
    right: Value,
    span: &Span,
    op: fn(f64, f64) -> bool,
) -> Result<Value, RillError> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => Ok(bool_value(op(l, r))),
        (l, r) => Err(RillError::type_mismatch(
            span.clone(),
            format!("Cannot compare {} and {}", l.type_name(), r.type_name()),
        )),
    }
}

fn bool_value(b: bool) -> Value {
    Value::Number(if b { 1.0 } else { 0.0 })
}
