// ABOUTME: Syntax highlighter for the REPL with color support
// Implements rustyline's Highlighter trait to provide ANSI color codes
// for Blisp syntax elements while preserving display width.

use rustyline::completion::Completer;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::Helper;
use std::borrow::Cow;
use std::collections::HashSet;

const COLOR_RESET: &str = "\x1b[0m";
const COLOR_PARENS: &str = "\x1b[1;34m"; // Bold blue
const COLOR_BUILTIN: &str = "\x1b[36m"; // Cyan
const COLOR_NUMBER: &str = "\x1b[33m"; // Yellow
const COLOR_STRING: &str = "\x1b[32m"; // Green
const COLOR_BOOLEAN: &str = "\x1b[33m"; // Yellow
const COLOR_COMMENT: &str = "\x1b[90m"; // Bright black (gray)

/// Syntax-aware color highlighting for the Blisp REPL prompt.
pub struct LispHelper;

impl LispHelper {
    pub fn new() -> Self {
        LispHelper
    }

    /// Highlights a single already-evaluated result for the `=> ...` line.
    pub fn highlight_output(value: &crate::value::Value) -> String {
        highlight_line(&value.to_string(), &get_builtins())
    }
}

impl Default for LispHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl Helper for LispHelper {}

impl Completer for LispHelper {
    type Candidate = String;
}

impl Hinter for LispHelper {
    type Hint = String;
}

impl Validator for LispHelper {}

impl Highlighter for LispHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let builtins = get_builtins();
        let highlighted = highlight_line(line, &builtins);

        if highlighted == line {
            Cow::Borrowed(line)
        } else {
            Cow::Owned(highlighted)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

/// Tokenizes a line of Blisp source and applies ANSI color codes.
fn highlight_line(line: &str, builtins: &HashSet<&'static str>) -> String {
    let mut result = String::new();
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            ';' => {
                result.push_str(COLOR_COMMENT);
                while i < chars.len() && chars[i] != '\n' {
                    result.push(chars[i]);
                    i += 1;
                }
                result.push_str(COLOR_RESET);
            }

            '"' => {
                result.push_str(COLOR_STRING);
                result.push('"');
                i += 1;

                while i < chars.len() {
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        result.push(chars[i]);
                        result.push(chars[i + 1]);
                        i += 2;
                    } else if chars[i] == '"' {
                        result.push('"');
                        i += 1;
                        break;
                    } else {
                        result.push(chars[i]);
                        i += 1;
                    }
                }

                result.push_str(COLOR_RESET);
            }

            '(' | ')' | '{' | '}' => {
                result.push_str(COLOR_PARENS);
                result.push(chars[i]);
                i += 1;
                result.push_str(COLOR_RESET);
            }

            ' ' | '\t' | '\n' | '\r' => {
                result.push(chars[i]);
                i += 1;
            }

            _ => {
                let start = i;
                while i < chars.len() && is_token_char(chars[i]) {
                    i += 1;
                }

                if i == start {
                    // Not a token character (stray punctuation); pass through.
                    result.push(chars[i]);
                    i += 1;
                    continue;
                }

                let token: String = chars[start..i].iter().collect();
                classify_and_push(&token, builtins, &mut result);
            }
        }
    }

    result
}

fn is_token_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '(' | ')' | '{' | '}' | '"' | ';')
}

fn classify_and_push(token: &str, builtins: &HashSet<&'static str>, out: &mut String) {
    let looks_like_number = token.parse::<f64>().is_ok();

    if looks_like_number {
        out.push_str(COLOR_NUMBER);
        out.push_str(token);
        out.push_str(COLOR_RESET);
    } else if token == "true" || token == "false" {
        out.push_str(COLOR_BOOLEAN);
        out.push_str(token);
        out.push_str(COLOR_RESET);
    } else if builtins.contains(token) {
        out.push_str(COLOR_BUILTIN);
        out.push_str(token);
        out.push_str(COLOR_RESET);
    } else {
        out.push_str(token);
    }
}

/// Every name `register_all` binds in a fresh environment (see
/// `crate::builtins`), used purely for cosmetic REPL highlighting.
fn get_builtins() -> HashSet<&'static str> {
    [
        "+", "add", "-", "sub", "*", "mul", "/", "div", "%", "^", "min", "max", ">", "<", ">=",
        "<=", "==", "!=", "&&", "||", "!", "list", "head", "tail", "init", "len", "join", "cons",
        "eval", "def", "=", "\\", "if", "print", "show", "read", "error", "load", "values",
        "exit",
    ]
    .iter()
    .copied()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_is_colored() {
        let highlighted = highlight_line("42", &get_builtins());
        assert!(highlighted.contains(COLOR_NUMBER));
    }

    #[test]
    fn string_is_colored() {
        let highlighted = highlight_line("\"hello\"", &get_builtins());
        assert!(highlighted.contains(COLOR_STRING));
    }

    #[test]
    fn comment_is_colored() {
        let highlighted = highlight_line("; a comment", &get_builtins());
        assert!(highlighted.contains(COLOR_COMMENT));
    }

    #[test]
    fn builtin_symbol_is_colored() {
        let highlighted = highlight_line("(+ 1 2)", &get_builtins());
        assert!(highlighted.contains(COLOR_BUILTIN));
        assert!(highlighted.contains(COLOR_PARENS));
    }

    #[test]
    fn boolean_literal_is_colored() {
        let highlighted = highlight_line("true false", &get_builtins());
        assert!(highlighted.contains(COLOR_BOOLEAN));
    }

    #[test]
    fn qexpr_braces_are_colored_as_parens() {
        let highlighted = highlight_line("{1 2 3}", &get_builtins());
        assert!(highlighted.contains(COLOR_PARENS));
    }

    #[test]
    fn plain_symbol_is_unstyled() {
        let highlighted = highlight_line("my-var", &get_builtins());
        assert_eq!(highlighted, "my-var");
    }
}
