// ABOUTME: Reader module — converts a parse tree into Blisp Values

use crate::parser::ParseNode;
use crate::value::Value;

const GROUPING_TOKENS: [&str; 4] = ["(", ")", "{", "}"];

/// Converts a single parse node into a value, per the tag-driven rules
/// below. Comment nodes never reach here directly — they are filtered
/// out of a parent sequence before conversion (rule 5).
fn read_node(node: &ParseNode) -> Value {
    let tag = node.tag.as_str();

    if tag.contains("number") {
        return match node.contents.parse::<f64>() {
            Ok(n) => Value::Number(n),
            Err(_) => Value::Error("invalid number".to_string()),
        };
    }

    if tag.contains("boolean") {
        return Value::Boolean(node.contents == "true");
    }

    if tag.contains("string") {
        return Value::String(decode_string(&node.contents));
    }

    if tag.contains("symbol") {
        return Value::Symbol(node.contents.clone());
    }

    if tag == ">" || tag.contains("sexpr") {
        return Value::SExpr(read_children(node));
    }

    if tag.contains("qexpr") {
        return Value::QExpr(read_children(node));
    }

    Value::Error(format!("unrecognized parse node tag '{tag}'"))
}

/// Applies rules 5-7: comment nodes and grouping-token punctuation
/// children are skipped, everything else is converted recursively.
fn read_children(node: &ParseNode) -> Vec<Value> {
    node.children
        .iter()
        .filter(|child| {
            child.tag != "comment"
                && child.tag != "regex"
                && !GROUPING_TOKENS.contains(&child.contents.as_str())
        })
        .map(read_node)
        .collect()
}

/// Strips the surrounding quotes from a parsed `string` token's raw
/// contents and decodes its escape sequences.
fn decode_string(raw: &str) -> String {
    let inner = raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')).unwrap_or(raw);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Converts a whole program's root parse node into its top-level
/// expressions, ready for independent evaluation one at a time.
pub fn read_program(root: &ParseNode) -> Vec<Value> {
    read_children(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;

    fn read_one(src: &str) -> Value {
        let root = parse_program(src).unwrap();
        let mut values = read_program(&root);
        assert_eq!(values.len(), 1, "expected exactly one top-level value");
        values.remove(0)
    }

    #[test]
    fn reads_numbers() {
        assert_eq!(read_one("42"), Value::Number(42.0));
        assert_eq!(read_one("-3.5"), Value::Number(-3.5));
    }

    #[test]
    fn reads_booleans() {
        assert_eq!(read_one("true"), Value::Boolean(true));
        assert_eq!(read_one("false"), Value::Boolean(false));
    }

    #[test]
    fn reads_symbols() {
        assert_eq!(read_one("+"), Value::Symbol("+".to_string()));
        assert_eq!(read_one("foo-bar"), Value::Symbol("foo-bar".to_string()));
    }

    #[test]
    fn reads_and_decodes_strings() {
        assert_eq!(
            read_one(r#""hello\nworld""#),
            Value::String("hello\nworld".to_string())
        );
        assert_eq!(
            read_one(r#""quote: \" backslash: \\""#),
            Value::String("quote: \" backslash: \\".to_string())
        );
    }

    #[test]
    fn reads_sexpr_dropping_punctuation() {
        assert_eq!(
            read_one("(+ 1 2)"),
            Value::SExpr(vec![
                Value::Symbol("+".to_string()),
                Value::Number(1.0),
                Value::Number(2.0),
            ])
        );
    }

    #[test]
    fn reads_qexpr_dropping_punctuation() {
        assert_eq!(
            read_one("{1 2 3}"),
            Value::QExpr(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)])
        );
    }

    #[test]
    fn comments_are_omitted_from_the_parent_sequence() {
        let root = parse_program("1 ; a comment\n2").unwrap();
        let values = read_program(&root);
        assert_eq!(values, vec![Value::Number(1.0), Value::Number(2.0)]);
    }

    #[test]
    fn nested_structures_convert_recursively() {
        assert_eq!(
            read_one("(+ 1 {2 3})"),
            Value::SExpr(vec![
                Value::Symbol("+".to_string()),
                Value::Number(1.0),
                Value::QExpr(vec![Value::Number(2.0), Value::Number(3.0)]),
            ])
        );
    }

    #[test]
    fn a_whole_program_yields_one_value_per_top_level_expression() {
        let root = parse_program("(+ 1 2) (* 3 4)").unwrap();
        let values = read_program(&root);
        assert_eq!(values.len(), 2);
    }
}
