use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use std::fmt;

#[derive(Debug, Clone)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    LexError,
    ParseError,
    UndefinedName,
    NotCallable,
    ArityMismatch,
    TypeMismatch,
    DivisionByZero,
    InvalidTarget,
    Io,
}

#[derive(Debug, Clone)]
pub struct RillError {
    pub kind: ErrorKind,
    pub span: Span,
    pub message: String,
    pub help: Option<String>,
}

impl RillError {
    pub fn new(kind: ErrorKind, span: Span, message: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: None,
        }
    }

    pub fn new_with_help(kind: ErrorKind, span: Span, message: String, help: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: Some(help),
        }
    }

    pub fn lex_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::LexError, span, message)
    }

    pub fn parse_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::ParseError, span, message)
    }

    pub fn parse_error_with_help(span: Span, message: String, help: String) -> Self {
        Self::new_with_help(ErrorKind::ParseError, span, message, help)
    }

    pub fn undefined_name(span: Span, message: String) -> Self {
        Self::new(ErrorKind::UndefinedName, span, message)
    }

    pub fn not_callable(span: Span, message: String) -> Self {
        Self::new(ErrorKind::NotCallable, span, message)
    }

    pub fn arity_mismatch(span: Span, message: String) -> Self {
        Self::new(ErrorKind::ArityMismatch, span, message)
    }

    pub fn type_mismatch(span: Span, message: String) -> Self {
        Self::new(ErrorKind::TypeMismatch, span, message)
    }

    pub fn division_by_zero(span: Span) -> Self {
        Self::new(
            ErrorKind::DivisionByZero,
            span,
            "Division by zero".to_string(),
        )
    }

    pub fn invalid_target(span: Span, message: String) -> Self {
        Self::new(ErrorKind::InvalidTarget, span, message)
    }

    pub fn report(&self, source: &str, filename: Option<&str>) {
        let filename = filename.unwrap_or("<repl>");

        let color = match self.kind {
            ErrorKind::LexError => Color::Red,
            ErrorKind::ParseError => Color::Yellow,
            _ => Color::Magenta,
        };

        let kind_str = match self.kind {
            ErrorKind::LexError => "Lexical Error",
            ErrorKind::ParseError => "Parse Error",
            ErrorKind::UndefinedName => "Undefined Name",
            ErrorKind::NotCallable => "Not Callable",
            ErrorKind::ArityMismatch => "Arity Mismatch",
            ErrorKind::TypeMismatch => "Type Mismatch",
            ErrorKind::DivisionByZero => "Division by Zero",
            ErrorKind::InvalidTarget => "Invalid Target",
            ErrorKind::Io => "I/O Error",
        };

        let mut report_builder = Report::build(ReportKind::Error, filename, self.span.start)
            .with_message(format!("{}: {}", kind_str.fg(color), self.message))
            .with_label(
                Label::new((filename, self.span.start..self.span.end))
                    .with_message(&self.message)
                    .with_color(color),
            );

        // Add help note if available
        if let Some(ref help_text) = self.help {
            report_builder =
                report_builder.with_note(format!("{}: {}", "help".fg(Color::Cyan), help_text));
        }

        report_builder
            .finish()
            .print((filename, Source::from(source)))
            .unwrap();
    }
}

impl fmt::Display for RillError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RillError {}
