use crate::evaluator::Evaluator;
use crate::lexer::Lexer;
use crate::parser::Parser;
use std::io::{self, Write};

/// Interactive session. Input lines accumulate until the brace balance is
/// even, then the joined text runs against one persistent evaluator so
/// bindings survive across inputs.

pub fn start() {
    println!("Rill Interpreter v0.1.0");
    println!("Type 'exit' or press Ctrl+D to quit");
    println!();

    let mut evaluator = Evaluator::new();
    let mut buffer = String::new();

    loop {
        if buffer.is_empty() {
            print!("> ");
        } else {
            print!(".. ");
        }
        io::stdout().flush().unwrap();

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => {
                // EOF reached (Ctrl+D or piped input ended)
                println!();
                break;
            }
            Ok(_) => {
                if buffer.is_empty() {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    if trimmed == "exit" || trimmed == "quit" {
                        println!("Goodbye!");
                        break;
                    }
                }

                buffer.push_str(&line);

                // Keep reading while braces are still open
                if brace_balance(&buffer) > 0 {
                    continue;
                }

                let source = std::mem::take(&mut buffer);
                run_repl_command(source.trim(), &mut evaluator);
            }
            Err(error) => {
                eprintln!("Error reading input: {}", error);
                break;
            }
        }
    }
}

/// Net count of open braces, ignoring braces inside string literals.
fn brace_balance(source: &str) -> i32 {
    let mut depth = 0;
    let mut in_string = false;

    for c in source.chars() {
        match c {
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => depth -= 1,
            _ => {}
        }
    }

    depth
}

fn run_repl_command(source: &str, evaluator: &mut Evaluator<io::Stdout>) {
    // Lexical analysis
    let mut lexer = Lexer::new(source.to_string());
    let tokens = match lexer.scan_tokens() {
        Ok(tokens) => tokens,
        Err(error) => {
            error.report(source, None);
            return;
        }
    };

    // Parsing
    let mut parser = Parser::new(tokens);
    let program = match parser.parse() {
        Ok(program) => program,
        Err(error) => {
            error.report(source, None);
            return;
        }
    };

    // Evaluation against the persistent environment; errors keep the
    // session (and any mutations already made) alive
    if let Err(error) = evaluator.evaluate_program(&program) {
        error.report(source, None);
    }
}
