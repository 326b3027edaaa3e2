// ABOUTME: Built-in functions module — the initial environment's operations

use crate::env::Environment;
use crate::eval;
use crate::sandbox::Sandbox;
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

// ============================================================================
// Sandbox storage for `load`
// ============================================================================

thread_local! {
    static SANDBOX: RefCell<Option<Sandbox>> = const { RefCell::new(None) };
}

/// Installs the filesystem sandbox `load` reads through. Call once at
/// startup before evaluating any Blisp source.
pub fn set_sandbox(sandbox: Sandbox) {
    SANDBOX.with(|s| *s.borrow_mut() = Some(sandbox));
}

// ============================================================================
// Teardown hook for `exit`
// ============================================================================

thread_local! {
    static TEARDOWN: RefCell<Option<Box<dyn FnMut()>>> = const { RefCell::new(None) };
}

/// Registers a callback run by `exit` immediately before the process
/// terminates (flushing REPL history, dropping the sandbox, ...). See
/// `spec.md` §9 open question 4: `exit` must still run teardown.
pub fn set_teardown_hook(hook: impl FnMut() + 'static) {
    TEARDOWN.with(|t| *t.borrow_mut() = Some(Box::new(hook)));
}

fn run_teardown() {
    TEARDOWN.with(|t| {
        if let Some(hook) = t.borrow_mut().as_mut() {
            hook();
        }
    });
}

// ============================================================================
// Error message helpers (exact wording per SPEC_FULL §4.5)
// ============================================================================

fn err_arity(name: &str, got: usize, expected: &str) -> Value {
    Value::Error(format!(
        "Function '{name}' passed incorrect number of arguments. Got {got}, Expected {expected}."
    ))
}

fn err_type(name: &str, index: usize, got: &Value, expected: &str) -> Value {
    Value::Error(format!(
        "Function '{name}' passed incorrect type for argument {index}. Got {}, Expected {expected}.",
        got.type_name()
    ))
}

fn err_empty(name: &str, index: usize) -> Value {
    Value::Error(format!("Function '{name}' passed {{}} for argument {index}."))
}

// ============================================================================
// Arithmetic
// ============================================================================

fn fold_arith(name: &str, args: Vec<Value>, op: fn(f64, f64) -> f64) -> Value {
    if args.is_empty() {
        return err_arity(name, 0, "at least 1");
    }
    let mut nums = Vec::with_capacity(args.len());
    for (i, arg) in args.iter().enumerate() {
        match arg {
            Value::Number(n) => nums.push(*n),
            other => return err_type(name, i, other, "Number"),
        }
    }
    let mut acc = nums[0];
    for n in &nums[1..] {
        acc = op(acc, *n);
    }
    Value::Number(acc)
}

fn builtin_add(_env: Rc<Environment>, args: Vec<Value>) -> Value {
    fold_arith("+", args, |a, b| a + b)
}

fn builtin_add_alias(_env: Rc<Environment>, args: Vec<Value>) -> Value {
    fold_arith("add", args, |a, b| a + b)
}

fn builtin_sub(_env: Rc<Environment>, args: Vec<Value>) -> Value {
    if args.is_empty() {
        return err_arity("-", 0, "at least 1");
    }
    let mut nums = Vec::with_capacity(args.len());
    for (i, arg) in args.iter().enumerate() {
        match arg {
            Value::Number(n) => nums.push(*n),
            other => return err_type("-", i, other, "Number"),
        }
    }
    if nums.len() == 1 {
        return Value::Number(-nums[0]);
    }
    let mut acc = nums[0];
    for n in &nums[1..] {
        acc -= n;
    }
    Value::Number(acc)
}

fn builtin_sub_alias(_env: Rc<Environment>, args: Vec<Value>) -> Value {
    builtin_sub(_env, args)
}

fn builtin_mul(_env: Rc<Environment>, args: Vec<Value>) -> Value {
    fold_arith("*", args, |a, b| a * b)
}

fn builtin_mul_alias(_env: Rc<Environment>, args: Vec<Value>) -> Value {
    fold_arith("mul", args, |a, b| a * b)
}

fn builtin_div(_env: Rc<Environment>, args: Vec<Value>) -> Value {
    if args.is_empty() {
        return err_arity("/", 0, "at least 1");
    }
    let mut nums = Vec::with_capacity(args.len());
    for (i, arg) in args.iter().enumerate() {
        match arg {
            Value::Number(n) => nums.push(*n),
            other => return err_type("/", i, other, "Number"),
        }
    }
    let mut acc = nums[0];
    for n in &nums[1..] {
        if *n == 0.0 {
            return Value::Error("Division by zero!".to_string());
        }
        acc /= n;
    }
    Value::Number(acc)
}

fn builtin_div_alias(_env: Rc<Environment>, args: Vec<Value>) -> Value {
    builtin_div(_env, args)
}

fn builtin_mod(_env: Rc<Environment>, args: Vec<Value>) -> Value {
    if args.is_empty() {
        return err_arity("%", 0, "at least 1");
    }
    let mut nums = Vec::with_capacity(args.len());
    for (i, arg) in args.iter().enumerate() {
        match arg {
            Value::Number(n) => nums.push(*n),
            other => return err_type("%", i, other, "Number"),
        }
    }
    let mut acc = nums[0].trunc() as i64;
    for n in &nums[1..] {
        let d = n.trunc() as i64;
        if d == 0 {
            return Value::Error("Division by zero!".to_string());
        }
        acc %= d;
    }
    Value::Number(acc as f64)
}

fn builtin_pow(_env: Rc<Environment>, args: Vec<Value>) -> Value {
    fold_arith("^", args, f64::powf)
}

fn builtin_min(_env: Rc<Environment>, args: Vec<Value>) -> Value {
    fold_arith("min", args, f64::min)
}

fn builtin_max(_env: Rc<Environment>, args: Vec<Value>) -> Value {
    fold_arith("max", args, f64::max)
}

// ============================================================================
// Ordering, equality, logic
// ============================================================================

fn compare(name: &str, args: Vec<Value>, op: fn(f64, f64) -> bool) -> Value {
    if args.len() != 2 {
        return err_arity(name, args.len(), "2");
    }
    let a = match &args[0] {
        Value::Number(n) => *n,
        other => return err_type(name, 0, other, "Number"),
    };
    let b = match &args[1] {
        Value::Number(n) => *n,
        other => return err_type(name, 1, other, "Number"),
    };
    Value::Boolean(op(a, b))
}

fn builtin_gt(_env: Rc<Environment>, args: Vec<Value>) -> Value {
    compare(">", args, |a, b| a > b)
}
fn builtin_lt(_env: Rc<Environment>, args: Vec<Value>) -> Value {
    compare("<", args, |a, b| a < b)
}
fn builtin_ge(_env: Rc<Environment>, args: Vec<Value>) -> Value {
    compare(">=", args, |a, b| a >= b)
}
fn builtin_le(_env: Rc<Environment>, args: Vec<Value>) -> Value {
    compare("<=", args, |a, b| a <= b)
}

fn builtin_eq(_env: Rc<Environment>, args: Vec<Value>) -> Value {
    if args.len() != 2 {
        return err_arity("==", args.len(), "2");
    }
    Value::Boolean(args[0] == args[1])
}

fn builtin_neq(_env: Rc<Environment>, args: Vec<Value>) -> Value {
    if args.len() != 2 {
        return err_arity("!=", args.len(), "2");
    }
    Value::Boolean(args[0] != args[1])
}

fn logic(name: &str, args: Vec<Value>, op: fn(bool, bool) -> bool) -> Value {
    if args.len() != 2 {
        return err_arity(name, args.len(), "2");
    }
    let a = match &args[0] {
        Value::Boolean(b) => *b,
        other => return err_type(name, 0, other, "Boolean"),
    };
    let b = match &args[1] {
        Value::Boolean(b) => *b,
        other => return err_type(name, 1, other, "Boolean"),
    };
    Value::Boolean(op(a, b))
}

fn builtin_and(_env: Rc<Environment>, args: Vec<Value>) -> Value {
    logic("&&", args, |a, b| a && b)
}
fn builtin_or(_env: Rc<Environment>, args: Vec<Value>) -> Value {
    logic("||", args, |a, b| a || b)
}

fn builtin_not(_env: Rc<Environment>, mut args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return err_arity("!", args.len(), "1");
    }
    match args.remove(0) {
        Value::Boolean(b) => Value::Boolean(!b),
        other => err_type("!", 0, &other, "Boolean"),
    }
}

// ============================================================================
// List surgery
// ============================================================================

fn builtin_list(_env: Rc<Environment>, args: Vec<Value>) -> Value {
    Value::QExpr(args)
}

fn builtin_head(_env: Rc<Environment>, mut args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return err_arity("head", args.len(), "1");
    }
    match args.remove(0) {
        Value::QExpr(mut items) => {
            if items.is_empty() {
                return err_empty("head", 0);
            }
            Value::QExpr(vec![items.remove(0)])
        }
        other => err_type("head", 0, &other, "Q-Expression"),
    }
}

fn builtin_tail(_env: Rc<Environment>, mut args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return err_arity("tail", args.len(), "1");
    }
    match args.remove(0) {
        Value::QExpr(mut items) => {
            if items.is_empty() {
                return err_empty("tail", 0);
            }
            items.remove(0);
            Value::QExpr(items)
        }
        other => err_type("tail", 0, &other, "Q-Expression"),
    }
}

fn builtin_init(_env: Rc<Environment>, mut args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return err_arity("init", args.len(), "1");
    }
    match args.remove(0) {
        Value::QExpr(mut items) => {
            if items.is_empty() {
                return err_empty("init", 0);
            }
            items.pop();
            Value::QExpr(items)
        }
        other => err_type("init", 0, &other, "Q-Expression"),
    }
}

fn builtin_len(_env: Rc<Environment>, mut args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return err_arity("len", args.len(), "1");
    }
    match args.remove(0) {
        Value::QExpr(items) => Value::Number(items.len() as f64),
        other => err_type("len", 0, &other, "Q-Expression"),
    }
}

fn builtin_join(_env: Rc<Environment>, args: Vec<Value>) -> Value {
    if args.is_empty() {
        return err_arity("join", 0, "at least 1");
    }
    let mut result = Vec::new();
    for (i, arg) in args.into_iter().enumerate() {
        match arg {
            Value::QExpr(items) => result.extend(items),
            other => return err_type("join", i, &other, "Q-Expression"),
        }
    }
    Value::QExpr(result)
}

fn builtin_cons(_env: Rc<Environment>, mut args: Vec<Value>) -> Value {
    if args.len() != 2 {
        return err_arity("cons", args.len(), "2");
    }
    let second = args.remove(1);
    let first = args.remove(0);
    let n = match first {
        Value::Number(n) => n,
        other => return err_type("cons", 0, &other, "Number"),
    };
    match second {
        Value::QExpr(mut items) => {
            items.insert(0, Value::Number(n));
            Value::QExpr(items)
        }
        other => err_type("cons", 1, &other, "Q-Expression"),
    }
}

fn builtin_eval(env: Rc<Environment>, mut args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return err_arity("eval", args.len(), "1");
    }
    match args.remove(0) {
        Value::QExpr(items) => eval::eval(&env, Value::SExpr(items)),
        other => err_type("eval", 0, &other, "Q-Expression"),
    }
}

// ============================================================================
// Binding, abstraction, control
// ============================================================================

fn bind(name: &str, write: fn(&Rc<Environment>, String, Value), env: &Rc<Environment>, mut args: Vec<Value>) -> Value {
    if args.is_empty() {
        return err_arity(name, 0, "at least 1");
    }
    let symbols = match args.remove(0) {
        Value::QExpr(items) => items,
        other => return err_type(name, 0, &other, "Q-Expression"),
    };
    if symbols.len() != args.len() {
        return Value::Error(format!(
            "Function '{name}' cannot define incorrect number of values to symbols."
        ));
    }
    let mut names = Vec::with_capacity(symbols.len());
    for sym in &symbols {
        match sym {
            Value::Symbol(s) => names.push(s.clone()),
            other => {
                return Value::Error(format!(
                    "Function '{name}' cannot define non-symbol. Got {}, Expected Symbol.",
                    other.type_name()
                ))
            }
        }
    }
    for (n, v) in names.into_iter().zip(args) {
        write(env, n, v);
    }
    Value::empty_sexpr()
}

fn builtin_def(env: Rc<Environment>, args: Vec<Value>) -> Value {
    bind("def", |e, n, v| e.def(n, v), &env, args)
}

fn builtin_put(env: Rc<Environment>, args: Vec<Value>) -> Value {
    bind("=", |e, n, v| e.put(n, v), &env, args)
}

fn builtin_lambda(_env: Rc<Environment>, mut args: Vec<Value>) -> Value {
    if args.len() != 2 {
        return err_arity("\\", args.len(), "2");
    }
    let body = args.remove(1);
    let formals = args.remove(0);

    let formal_items = match &formals {
        Value::QExpr(items) => items,
        other => return err_type("\\", 0, other, "Q-Expression"),
    };
    for item in formal_items {
        if !matches!(item, Value::Symbol(_)) {
            return Value::Error(format!(
                "Function '\\' cannot define non-symbol. Got {}, Expected Symbol.",
                item.type_name()
            ));
        }
    }
    if !matches!(body, Value::QExpr(_)) {
        return err_type("\\", 1, &body, "Q-Expression");
    }

    Value::Lambda {
        formals: Box::new(formals),
        body: Box::new(body),
        env: Environment::new(),
    }
}

fn builtin_if(env: Rc<Environment>, args: Vec<Value>) -> Value {
    if args.len() != 3 {
        return err_arity("if", args.len(), "3");
    }
    let cond = match &args[0] {
        Value::Boolean(b) => *b,
        other => return err_type("if", 0, other, "Boolean"),
    };
    let then_items = match &args[1] {
        Value::QExpr(items) => items.clone(),
        other => return err_type("if", 1, other, "Q-Expression"),
    };
    let else_items = match &args[2] {
        Value::QExpr(items) => items.clone(),
        other => return err_type("if", 2, other, "Q-Expression"),
    };

    let branch = if cond { then_items } else { else_items };
    eval::eval(&env, Value::SExpr(branch))
}

// ============================================================================
// I/O and reflection
// ============================================================================

fn builtin_print(_env: Rc<Environment>, args: Vec<Value>) -> Value {
    let parts: Vec<String> = args.iter().map(Value::to_string).collect();
    println!("{}", parts.join(" "));
    Value::empty_sexpr()
}

fn builtin_show(_env: Rc<Environment>, mut args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return err_arity("show", args.len(), "1");
    }
    let value = args.remove(0);
    if !matches!(value, Value::String(_)) {
        return err_type("show", 0, &value, "String");
    }
    println!("{value}");
    Value::empty_sexpr()
}

fn builtin_read(_env: Rc<Environment>, mut args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return err_arity("read", args.len(), "1");
    }
    match args.remove(0) {
        Value::String(s) => Value::QExpr(vec![Value::String(s)]),
        other => err_type("read", 0, &other, "String"),
    }
}

fn builtin_error(_env: Rc<Environment>, mut args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return err_arity("error", args.len(), "1");
    }
    match args.remove(0) {
        Value::String(s) => Value::Error(s),
        other => err_type("error", 0, &other, "String"),
    }
}

fn builtin_load(env: Rc<Environment>, mut args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return err_arity("load", args.len(), "1");
    }
    let path = match args.remove(0) {
        Value::String(s) => s,
        other => return err_type("load", 0, &other, "String"),
    };

    let read_result = SANDBOX.with(|s| s.borrow().as_ref().map(|sandbox| sandbox.read_file(&path)));
    let contents = match read_result {
        Some(Ok(text)) => text,
        Some(Err(e)) => {
            println!("Error: {e}");
            return Value::empty_sexpr();
        }
        None => {
            println!("Error: no filesystem sandbox configured");
            return Value::empty_sexpr();
        }
    };

    let root = match crate::parser::parse_program(&contents) {
        Ok(root) => root,
        Err(e) => {
            println!("Error: {e}");
            return Value::empty_sexpr();
        }
    };

    for expr in crate::reader::read_program(&root) {
        let result = eval::eval(&env, expr);
        if result.is_error() {
            println!("{result}");
        }
    }

    Value::empty_sexpr()
}

/// Lists names bound directly in `env` — never the parent chain. Matches
/// the original's `builtin_values`, which loops `e->count`/`e->syms[i]`
/// without recursing into `e->parent`, so calling `values` from inside a
/// lambda body only ever sees that call's own (usually empty) argument
/// bindings, not the caller's or the global environment's names.
fn builtin_values(env: Rc<Environment>, mut args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return err_arity("values", args.len(), "1");
    }
    let n = match args.remove(0) {
        Value::Number(n) => n,
        other => return err_type("values", 0, &other, "Number"),
    };
    let names = env.own_names();
    let selected: Vec<Value> = if n < 0.0 {
        names.into_iter().map(Value::Symbol).collect()
    } else {
        names.into_iter().take(n as usize).map(Value::Symbol).collect()
    };
    Value::QExpr(selected)
}

fn builtin_exit(_env: Rc<Environment>, mut args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return err_arity("exit", args.len(), "1");
    }
    let code = match args.remove(0) {
        Value::Number(n) => n,
        other => return err_type("exit", 0, &other, "Number"),
    };
    println!("Goodbye!");
    run_teardown();
    std::process::exit(code as i32);
}

// ============================================================================
// Registration
// ============================================================================

macro_rules! register {
    ($env:expr, { $($name:literal => $func:path),* $(,)? }) => {
        $(
            $env.define($name.to_string(), Value::Builtin { name: $name.to_string(), func: $func });
        )*
    };
}

/// Populates `env` with every builtin from `spec.md` §4.5.
pub fn register_all(env: &Rc<Environment>) {
    register!(env, {
        "+" => builtin_add,
        "add" => builtin_add_alias,
        "-" => builtin_sub,
        "sub" => builtin_sub_alias,
        "*" => builtin_mul,
        "mul" => builtin_mul_alias,
        "/" => builtin_div,
        "div" => builtin_div_alias,
        "%" => builtin_mod,
        "^" => builtin_pow,
        "min" => builtin_min,
        "max" => builtin_max,

        ">" => builtin_gt,
        "<" => builtin_lt,
        ">=" => builtin_ge,
        "<=" => builtin_le,
        "==" => builtin_eq,
        "!=" => builtin_neq,
        "&&" => builtin_and,
        "||" => builtin_or,
        "!" => builtin_not,

        "list" => builtin_list,
        "head" => builtin_head,
        "tail" => builtin_tail,
        "init" => builtin_init,
        "len" => builtin_len,
        "join" => builtin_join,
        "cons" => builtin_cons,
        "eval" => builtin_eval,

        "def" => builtin_def,
        "=" => builtin_put,
        "\\" => builtin_lambda,
        "if" => builtin_if,

        "print" => builtin_print,
        "show" => builtin_show,
        "read" => builtin_read,
        "error" => builtin_error,
        "load" => builtin_load,
        "values" => builtin_values,
        "exit" => builtin_exit,
    });
}
