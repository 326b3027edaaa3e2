// ABOUTME: Error types for reading Blisp source into a parse tree

use thiserror::Error;

/// Failures that occur before evaluation ever begins: turning source text
/// into a parse tree, or opening a script file. Everything past this point
/// is represented as a first-class `Value::Error`, never a Rust `Result`
/// (see `spec.md` §7) — these variants only cover the boundary the
/// evaluator never sees.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    #[error("Parse error: unexpected input at {0:?}")]
    UnexpectedInput(String),

    #[error("Parse error: unterminated string literal")]
    UnterminatedString,

    #[error("Parse error: unterminated list, missing '{0}'")]
    UnterminatedList(char),
}
