// ABOUTME: Parser module — turns Blisp source text into a tagged parse tree

use nom::{
    branch::alt,
    bytes::complete::{escaped, take_while, take_while1},
    character::complete::{char, digit1, multispace0, none_of, one_of},
    combinator::{map, opt, recognize, value},
    multi::many0,
    sequence::delimited,
    IResult, Parser,
};

use crate::error::ReadError;

/// A single node of the parse tree that feeds the reader (`crate::reader`).
///
/// This mirrors the tagged-AST-node shape the interpreter's original
/// parser produced: every node carries a `tag` (one of `number`,
/// `boolean`, `symbol`, `string`, `comment`, `sexpr`, `qexpr`, or the root
/// marker `>`) and, for leaves, a `contents` string. Grouping punctuation
/// (`(` `)` `{` `}`) is kept as literal child nodes rather than elided
/// here, so the reader's own skip-the-punctuation-children rule (see
/// `spec.md` §4.1 rule 6/7) has real work to do — this module has no
/// opinion about what the tags *mean*, only about the grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNode {
    pub tag: String,
    pub contents: String,
    pub children: Vec<ParseNode>,
}

impl ParseNode {
    fn leaf(tag: &str, contents: impl Into<String>) -> Self {
        ParseNode {
            tag: tag.to_string(),
            contents: contents.into(),
            children: Vec::new(),
        }
    }

    fn branch(tag: &str, children: Vec<ParseNode>) -> Self {
        ParseNode {
            tag: tag.to_string(),
            contents: String::new(),
            children,
        }
    }
}

const SYMBOL_CHARS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_+-*/\\=<>!&^|%";

fn is_symbol_char(c: char) -> bool {
    SYMBOL_CHARS.contains(c)
}

/// `;[^\r\n]*`
fn parse_comment(input: &str) -> IResult<&str, ParseNode> {
    map(
        recognize((char(';'), take_while(|c| c != '\n' && c != '\r'))),
        |text: &str| ParseNode::leaf("comment", text),
    )
    .parse(input)
}

/// `-?[0-9]+([.][0-9]+)?`
fn parse_number(input: &str) -> IResult<&str, ParseNode> {
    map(
        recognize((
            opt(char('-')),
            digit1,
            opt((char('.'), digit1)),
        )),
        |text: &str| ParseNode::leaf("number", text),
    )
    .parse(input)
}

/// A maximal run of symbol characters; the caller decides whether the
/// result is the `boolean` literal `true`/`false` or a plain `symbol`,
/// exactly like the original grammar's alternation order (boolean before
/// symbol, over an identical character class).
fn parse_token(input: &str) -> IResult<&str, ParseNode> {
    map(take_while1(is_symbol_char), |text: &str| match text {
        "true" | "false" => ParseNode::leaf("boolean", text),
        _ => ParseNode::leaf("symbol", text),
    })
    .parse(input)
}

/// `"(\\.|[^"])*"` — contents keep the surrounding quotes; the reader
/// strips them and decodes escapes.
fn parse_string(input: &str) -> IResult<&str, ParseNode> {
    let (rest, text) = recognize(delimited(
        char('"'),
        opt(escaped(none_of("\"\\"), '\\', one_of("\"\\ntr"))),
        char('"'),
    ))
    .parse(input)?;
    Ok((rest, ParseNode::leaf("string", text)))
}

fn ws(input: &str) -> IResult<&str, ()> {
    value((), multispace0).parse(input)
}

fn parse_expr(input: &str) -> IResult<&str, ParseNode> {
    alt((
        parse_number,
        parse_string,
        parse_comment,
        parse_token,
        parse_sexpr,
        parse_qexpr,
    ))
    .parse(input)
}

fn parse_seq(open: char, close: char, tag_name: &'static str) -> impl Fn(&str) -> IResult<&str, ParseNode> {
    move |input: &str| {
        let (input, _) = char(open)(input)?;
        let (input, _) = ws(input)?;
        let (input, mut children) = many0((|i| {
            let (i, e) = parse_expr(i)?;
            let (i, _) = ws(i)?;
            Ok((i, e))
        }))
        .parse(input)?;
        let (input, _) = char(close)(input)?;

        children.insert(0, ParseNode::leaf("punct", open.to_string()));
        children.push(ParseNode::leaf("punct", close.to_string()));
        Ok((input, ParseNode::branch(tag_name, children)))
    }
}

fn parse_sexpr(input: &str) -> IResult<&str, ParseNode> {
    parse_seq('(', ')', "sexpr")(input)
}

fn parse_qexpr(input: &str) -> IResult<&str, ParseNode> {
    parse_seq('{', '}', "qexpr")(input)
}

/// `expr*` — a whole program, wrapped in the root `>` node.
fn parse_program_inner(input: &str) -> IResult<&str, ParseNode> {
    let (input, _) = ws(input)?;
    let (input, children) = many0((|i| {
        let (i, e) = parse_expr(i)?;
        let (i, _) = ws(i)?;
        Ok((i, e))
    }))
    .parse(input)?;
    Ok((input, ParseNode::branch(">", children)))
}

/// Parses a whole program's source text into its root parse node.
pub fn parse_program(input: &str) -> Result<ParseNode, ReadError> {
    match parse_program_inner(input) {
        Ok((rest, node)) if rest.trim().is_empty() => Ok(node),
        Ok((rest, _)) => Err(ReadError::UnexpectedInput(rest.to_string())),
        Err(nom::Err::Incomplete(_)) => Err(ReadError::UnterminatedList(')')),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            Err(ReadError::UnexpectedInput(e.input.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbers_and_symbols() {
        let root = parse_program("+ 2 3").unwrap();
        assert_eq!(root.tag, ">");
        assert_eq!(root.children.len(), 3);
        assert_eq!(root.children[0].tag, "symbol");
        assert_eq!(root.children[1].tag, "number");
        assert_eq!(root.children[1].contents, "2");
    }

    #[test]
    fn parses_negative_and_decimal_numbers() {
        let root = parse_program("-5 3.25").unwrap();
        assert_eq!(root.children[0].contents, "-5");
        assert_eq!(root.children[1].contents, "3.25");
    }

    #[test]
    fn parses_booleans_distinct_from_symbols() {
        let root = parse_program("true false truest").unwrap();
        assert_eq!(root.children[0].tag, "boolean");
        assert_eq!(root.children[1].tag, "boolean");
        assert_eq!(root.children[2].tag, "symbol");
        assert_eq!(root.children[2].contents, "truest");
    }

    #[test]
    fn parses_sexpr_and_qexpr_with_punctuation_children() {
        let root = parse_program("(+ 1 2)").unwrap();
        let sexpr = &root.children[0];
        assert_eq!(sexpr.tag, "sexpr");
        assert_eq!(sexpr.children.first().unwrap().contents, "(");
        assert_eq!(sexpr.children.last().unwrap().contents, ")");

        let root = parse_program("{1 2 3}").unwrap();
        assert_eq!(root.children[0].tag, "qexpr");
    }

    #[test]
    fn parses_strings_with_escapes_keeping_quotes() {
        let root = parse_program(r#""hello\nworld""#).unwrap();
        assert_eq!(root.children[0].tag, "string");
        assert_eq!(root.children[0].contents, r#""hello\nworld""#);
    }

    #[test]
    fn comments_are_kept_as_nodes_for_the_reader_to_drop() {
        let root = parse_program("1 ; a comment\n2").unwrap();
        assert_eq!(root.children.len(), 3);
        assert_eq!(root.children[1].tag, "comment");
    }

    #[test]
    fn nested_expressions_parse_recursively() {
        let root = parse_program("(+ 1 {2 3})").unwrap();
        let sexpr = &root.children[0];
        // punct, symbol, number, qexpr, punct
        assert_eq!(sexpr.children.len(), 5);
        assert_eq!(sexpr.children[3].tag, "qexpr");
    }

    #[test]
    fn reports_unexpected_trailing_input() {
        let err = parse_program("(+ 1 2").unwrap_err();
        assert!(matches!(
            err,
            ReadError::UnexpectedInput(_) | ReadError::UnterminatedList(_)
        ));
    }
}
