// ABOUTME: Evaluator module for executing parsed Blisp expressions

use crate::env::Environment;
use crate::value::Value;
use std::rc::Rc;

/// Evaluates `value` in `env`, consuming it and returning an owned result.
///
/// Symbols resolve against the environment chain; S-Expressions reduce
/// per [`eval_sexpr`]; every other variant (including Q-Expressions) is
/// self-evaluating and returned unchanged.
pub fn eval(env: &Rc<Environment>, value: Value) -> Value {
    match value {
        Value::Symbol(name) => env
            .get(&name)
            .unwrap_or_else(|| Value::Error(format!("Unbound symbol: '{name}'"))),
        Value::SExpr(children) => eval_sexpr(env, children),
        other => other,
    }
}

/// Reduces an S-Expression's children, then applies the result.
fn eval_sexpr(env: &Rc<Environment>, children: Vec<Value>) -> Value {
    let mut evaluated = Vec::with_capacity(children.len());
    for child in children {
        let result = eval(env, child);
        if result.is_error() {
            return result;
        }
        evaluated.push(result);
    }

    if evaluated.is_empty() {
        return Value::SExpr(evaluated);
    }
    if evaluated.len() == 1 {
        return evaluated.into_iter().next().unwrap();
    }

    let head = evaluated.remove(0);
    match head {
        Value::Builtin { .. } | Value::Lambda { .. } => apply(env, head, evaluated),
        other => Value::Error(format!(
            "S-Expression starts with incorrect type. Got {}, Expected Function",
            other.type_name()
        )),
    }
}

/// Applies a callable to an already-evaluated argument list.
pub fn apply(env: &Rc<Environment>, callable: Value, args: Vec<Value>) -> Value {
    match callable {
        Value::Builtin { func, .. } => func(env.clone(), args),
        Value::Lambda { formals, body, env: lambda_env } => {
            apply_lambda(env, *formals, *body, lambda_env, args)
        }
        other => Value::Error(format!(
            "S-Expression starts with incorrect type. Got {}, Expected Function",
            other.type_name()
        )),
    }
}

/// The binding loop from the function-application contract: pops
/// formals and actuals in lockstep, supports `&`-marked variadic
/// capture, and either completes the call or returns a new partially
/// bound Lambda.
fn apply_lambda(
    caller_env: &Rc<Environment>,
    formals: Value,
    body: Value,
    lambda_env: Rc<Environment>,
    args: Vec<Value>,
) -> Value {
    let mut formals = match formals {
        Value::QExpr(items) => items,
        other => return Value::Error(format!("malformed lambda formals: {other}")),
    };
    let total_expected = formals.len();
    let given = args.len();

    let mut actuals = args.into_iter();

    while let Some(actual) = actuals.next() {
        if formals.is_empty() {
            return Value::Error(format!(
                "Function passed too many arguments. Got {given}, Expected {total_expected}."
            ));
        }

        let formal = formals.remove(0);
        let name = match &formal {
            Value::Symbol(s) => s.clone(),
            other => return Value::Error(format!("malformed lambda formals: {other}")),
        };

        if name == "&" {
            if formals.len() != 1 {
                return Value::Error(
                    "Function format invalid. Symbol '&' not followed by single symbol."
                        .to_string(),
                );
            }
            let variadic_name = match formals.remove(0) {
                Value::Symbol(s) => s,
                other => return Value::Error(format!("malformed lambda formals: {other}")),
            };
            let mut rest = vec![actual];
            rest.extend(actuals);
            lambda_env.define(variadic_name, Value::QExpr(rest));
            formals.clear();
            break;
        }

        lambda_env.define(name, actual);
    }

    if formals.first() == Some(&Value::Symbol("&".to_string())) {
        if formals.len() != 2 {
            return Value::Error(
                "Function format invalid. Symbol '&' not followed by single symbol.".to_string(),
            );
        }
        let variadic_name = match formals.remove(1) {
            Value::Symbol(s) => s,
            other => return Value::Error(format!("malformed lambda formals: {other}")),
        };
        formals.remove(0);
        lambda_env.define(variadic_name, Value::empty_qexpr());
    }

    if formals.is_empty() {
        lambda_env.set_parent(caller_env.clone());
        let body_items = match body {
            Value::QExpr(items) => items,
            other => return Value::Error(format!("malformed lambda body: {other}")),
        };
        eval(&lambda_env, Value::SExpr(body_items))
    } else {
        Value::Lambda {
            formals: Box::new(Value::QExpr(formals)),
            body: Box::new(body),
            env: lambda_env,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;

    fn setup() -> Rc<Environment> {
        let env = Environment::new();
        builtins::register_all(&env);
        env
    }

    fn eval_src(env: &Rc<Environment>, src: &str) -> Value {
        let root = crate::parser::parse_program(src).unwrap();
        let mut values = crate::reader::read_program(&root);
        assert_eq!(values.len(), 1);
        eval(env, values.remove(0))
    }

    #[test]
    fn self_evaluating_values_pass_through() {
        let env = setup();
        assert_eq!(eval(&env, Value::Number(5.0)), Value::Number(5.0));
        assert_eq!(eval(&env, Value::empty_qexpr()), Value::empty_qexpr());
    }

    #[test]
    fn unbound_symbol_is_an_error() {
        let env = setup();
        assert_eq!(
            eval(&env, Value::Symbol("nope".to_string())),
            Value::Error("Unbound symbol: 'nope'".to_string())
        );
    }

    #[test]
    fn empty_sexpr_is_unit() {
        let env = setup();
        assert_eq!(eval_src(&env, "()"), Value::empty_sexpr());
    }

    #[test]
    fn singleton_sexpr_unwraps() {
        let env = setup();
        assert_eq!(eval_src(&env, "(5)"), Value::Number(5.0));
    }

    #[test]
    fn arithmetic_applies_builtin() {
        let env = setup();
        assert_eq!(eval_src(&env, "(+ 2 3)"), Value::Number(5.0));
    }

    #[test]
    fn calling_a_non_function_is_an_error() {
        let env = setup();
        assert_eq!(
            eval_src(&env, "(1 2 3)"),
            Value::Error(
                "S-Expression starts with incorrect type. Got Number, Expected Function"
                    .to_string()
            )
        );
    }

    #[test]
    fn errors_short_circuit_sexpr_reduction() {
        let env = setup();
        assert_eq!(
            eval_src(&env, "(+ 1 (/ 1 0))"),
            Value::Error("Division by zero!".to_string())
        );
    }

    #[test]
    fn lambda_full_application() {
        let env = setup();
        assert_eq!(eval_src(&env, "((\\ {x y} {+ x y}) 3 4)"), Value::Number(7.0));
    }

    #[test]
    fn lambda_partial_application() {
        let env = setup();
        eval_src(&env, "(def {f} (\\ {a b c} {+ a (+ b c)}))");
        assert_eq!(eval_src(&env, "((f 1) 2 3)"), eval_src(&env, "(f 1 2 3)"));
        assert_eq!(eval_src(&env, "(f 1 2 3)"), Value::Number(6.0));
    }

    #[test]
    fn lambda_variadic_capture() {
        let env = setup();
        eval_src(&env, "(def {f} (\\ {x & xs} {xs}))");
        assert_eq!(eval_src(&env, "(f 1 2 3)"), eval_src(&env, "{2 3}"));
    }

    #[test]
    fn def_writes_to_root_from_inside_a_lambda_body() {
        let env = setup();
        eval_src(&env, "(def {f} (\\ {} {def {x} 99}))");
        eval_src(&env, "(f)");
        assert_eq!(eval_src(&env, "x"), Value::Number(99.0));
    }
}
