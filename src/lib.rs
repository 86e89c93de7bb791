// Rill Language Interpreter Library
//
// Core library for the Rill interpreter: a small dynamically-typed scripting
// language with a lexer, a recursive-descent parser and a tree-walking
// evaluator, wired up with source-span error diagnostics.

// Public modules
pub mod ast;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runner;
pub mod value;

// Re-export commonly used items
pub use ast::{Expr, Program, Stmt};
pub use error::{ErrorKind, RillError, Span};
pub use evaluator::{Environment, Evaluator};
pub use lexer::{Lexer, Token, TokenType};
pub use parser::Parser;
pub use value::Value;

// Re-export main functions
pub use repl::start as start_repl;
pub use runner::run;
