// ABOUTME: Value types representing Blisp data structures and expressions

use crate::env::Environment;
use std::fmt;
use std::rc::Rc;

/// A native operation. Builtins receive the calling environment and an
/// already-evaluated argument list, and return a value; they never raise a
/// Rust-level error, only a `Value::Error`.
pub type BuiltinFn = fn(Rc<Environment>, Vec<Value>) -> Value;

/// A single Blisp runtime value. Exactly one variant is active at a time.
///
/// Sequence children of `SExpr`/`QExpr` are owned exclusively by their
/// parent; popping a child out transfers ownership to the caller. There is
/// no shared mutable aliasing in this tree — every read out of an
/// `Environment` hands back an independent deep copy (see [`Value::clone`]
/// and [`Environment::get`]).
#[derive(Debug)]
pub enum Value {
    Number(f64),
    Boolean(bool),
    String(String),
    Symbol(String),
    Error(String),
    /// The "active" composite: evaluation applies it as a function call.
    SExpr(Vec<Value>),
    /// The "quoted" composite: inert data, the language's list literal.
    QExpr(Vec<Value>),
    Builtin { name: String, func: BuiltinFn },
    Lambda {
        /// A `QExpr` of Symbols, optionally with a `&` marker before the
        /// final Symbol to denote variadic capture.
        formals: Box<Value>,
        /// A `QExpr` holding the body expressions.
        body: Box<Value>,
        env: Rc<Environment>,
    },
}

impl Value {
    /// Name used in type-mismatch error messages, matching the printed
    /// variant names from the grammar (`S-Expression`, `Q-Expression`, ...).
    /// Builtins and Lambdas both report as `Function`, matching the
    /// original interpreter's single `LVAL_FUN` type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "Number",
            Value::Boolean(_) => "Boolean",
            Value::String(_) => "String",
            Value::Symbol(_) => "Symbol",
            Value::Error(_) => "Error",
            Value::SExpr(_) => "S-Expression",
            Value::QExpr(_) => "Q-Expression",
            Value::Builtin { .. } | Value::Lambda { .. } => "Function",
        }
    }

    pub fn empty_sexpr() -> Value {
        Value::SExpr(Vec::new())
    }

    pub fn empty_qexpr() -> Value {
        Value::QExpr(Vec::new())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }
}

/// Environment reads/writes and value transfer both rely on deep copies:
/// an `Environment`'s bindings are cloned recursively, and a Lambda's
/// captured environment is deep-copied along with it rather than shared,
/// so mutating one copy (e.g. binding a partial application's arguments)
/// can never be observed through another copy retrieved earlier. The
/// parent pointer inside that copied environment is *not* deep-copied —
/// it is a non-owning reference to whatever parent chain is currently in
/// effect, reassigned at each call (see `Environment::set_parent`).
impl Clone for Value {
    fn clone(&self) -> Value {
        match self {
            Value::Number(n) => Value::Number(*n),
            Value::Boolean(b) => Value::Boolean(*b),
            Value::String(s) => Value::String(s.clone()),
            Value::Symbol(s) => Value::Symbol(s.clone()),
            Value::Error(s) => Value::Error(s.clone()),
            Value::SExpr(items) => Value::SExpr(items.iter().map(Value::clone).collect()),
            Value::QExpr(items) => Value::QExpr(items.iter().map(Value::clone).collect()),
            Value::Builtin { name, func } => Value::Builtin {
                name: name.clone(),
                func: *func,
            },
            Value::Lambda { formals, body, env } => Value::Lambda {
                formals: Box::new((**formals).clone()),
                body: Box::new((**body).clone()),
                env: env.deep_clone(),
            },
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::SExpr(a), Value::SExpr(b)) | (Value::QExpr(a), Value::QExpr(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            (Value::Builtin { func: a, .. }, Value::Builtin { func: b, .. }) => a == b,
            (
                Value::Lambda {
                    formals: fa,
                    body: ba,
                    ..
                },
                Value::Lambda {
                    formals: fb,
                    body: bb,
                    ..
                },
            ) => fa == fb && ba == bb,
            _ => false,
        }
    }
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

fn print_seq(f: &mut fmt::Formatter<'_>, items: &[Value], open: char, close: char) -> fmt::Result {
    write!(f, "{open}")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, "{close}")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            Value::Boolean(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::String(s) => write!(f, "\"{}\"", escape_string(s)),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::Error(msg) => write!(f, "Error: {msg}"),
            Value::SExpr(items) => print_seq(f, items, '(', ')'),
            Value::QExpr(items) => print_seq(f, items, '{', '}'),
            Value::Builtin { name, .. } => write!(f, "<builtin: {name}>"),
            Value::Lambda { formals, body, .. } => write!(f, "(\u{3bb} {formals} {body})"),
        }
    }
}
