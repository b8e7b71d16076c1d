//! Syntactic classification of a cursor position.
//!
//! Completion has to decide from local syntax alone whether the cursor sits in
//! a position that accepts any expression, only a type, a generic constraint
//! or a `goto` label, and whether it follows a member-access operator. This
//! module tokenizes the text before the cursor with a small `winnow` lexer and
//! inspects the last few tokens; it never attempts full parse recovery.
//!
//! ## Rules
//!
//! ```text
//! static |          async |          const |        TypeOnly (declaration modifiers)
//! new |             x as |           typeof(|       TypeOnly
//! List<|            Dictionary<K, |                 TypeOnly (generic argument list)
//! void M(ref |      { ref |                         TypeOnly (declaration)
//! M(out |           M(a, ref |                      Expression (argument)
//! where T : |       where T : IFoo, |               TypeConstraint
//! goto |                                            Label
//! x is E.|          x is not E.|     case E.|       member access, in_pattern
//! ```
//!
//! Comments and string literals are skipped by the lexer. A cursor inside an
//! unterminated string degrades to a plain expression position.

use serde::{Deserialize, Serialize};
use winnow::ascii::{multispace1, till_line_ending};
use winnow::combinator::{alt, opt, repeat};
use winnow::prelude::*;
use winnow::token::{any, none_of, one_of, rest, take_until, take_while};
use winnow::ModalResult;

use crate::keywords::{is_predefined_type, is_reserved_keyword};

// ============================================================================
// Types
// ============================================================================

/// What kind of symbol the position syntactically accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionKind {
    /// Any expression (values, types and namespaces).
    #[default]
    Expression,
    /// Only types and namespaces.
    TypeOnly,
    /// A generic constraint (`where T : |`).
    TypeConstraint,
    /// A `goto` target.
    Label,
}

/// Member-access operator preceding the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessOperator {
    /// `.`
    Dot,
    /// `?.`
    ConditionalDot,
}

/// Local syntactic facts about a cursor position.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyntacticContext {
    pub position_kind: PositionKind,
    /// Operator before the cursor when completing a member.
    pub access: Option<AccessOperator>,
    /// The member access is the operand of a pattern or equality operator
    /// (`is`, `not`, `and`, `or`, `==`, `!=`, `case`).
    pub in_pattern: bool,
    /// Partially typed identifier touching the cursor.
    pub prefix: String,
    /// Dotted identifier chain before the access operator (`a.b.|` → `[a, b]`).
    /// Empty when the receiver is not a simple name chain.
    pub receiver_path: Vec<String>,
}

impl SyntacticContext {
    /// Check if the cursor follows a member-access operator.
    pub fn is_member_access(&self) -> bool {
        self.access.is_some()
    }
}

// ============================================================================
// Lexer
// ============================================================================

/// Token classes produced by [`tokenize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword.
    Identifier,
    /// Numeric, string or character literal.
    Literal,
    /// String or character literal missing its closing quote.
    Unterminated,
    /// Operator or punctuation.
    Punct,
}

/// A token with its byte range in the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Split source text into tokens, skipping whitespace and comments.
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut input = source;
    let mut tokens = Vec::new();

    loop {
        if trivia.parse_next(&mut input).is_err() || input.is_empty() {
            break;
        }
        let start = source.len() - input.len();
        match next_token.parse_next(&mut input) {
            Ok(kind) => {
                let end = source.len() - input.len();
                tokens.push(Token {
                    kind,
                    text: &source[start..end],
                    start,
                    end,
                });
            }
            Err(_) => break,
        }
    }

    tokens
}

fn trivia(input: &mut &str) -> ModalResult<()> {
    repeat(0.., alt((multispace1.void(), line_comment, block_comment))).parse_next(input)
}

fn line_comment(input: &mut &str) -> ModalResult<()> {
    ("//", till_line_ending).void().parse_next(input)
}

fn block_comment(input: &mut &str) -> ModalResult<()> {
    (
        "/*",
        alt(((take_until(0.., "*/"), "*/").void(), rest.void())),
    )
        .void()
        .parse_next(input)
}

fn next_token(input: &mut &str) -> ModalResult<TokenKind> {
    alt((
        verbatim_string,
        regular_string,
        char_literal,
        identifier.value(TokenKind::Identifier),
        number.value(TokenKind::Literal),
        punctuation.value(TokenKind::Punct),
    ))
    .parse_next(input)
}

fn closed_kind(closed: bool) -> TokenKind {
    if closed {
        TokenKind::Literal
    } else {
        TokenKind::Unterminated
    }
}

/// `"..."` and `$"..."`; an unterminated literal stops at the line end.
fn regular_string(input: &mut &str) -> ModalResult<TokenKind> {
    opt('$').parse_next(input)?;
    '"'.parse_next(input)?;
    let () = repeat(
        0..,
        alt((('\\', any).void(), none_of(['"', '\\', '\n']).void())),
    )
    .parse_next(input)?;
    let closed = opt('"').parse_next(input)?.is_some();
    Ok(closed_kind(closed))
}

/// `@"..."`, `$@"..."` and `@$"..."` with `""` escapes.
fn verbatim_string(input: &mut &str) -> ModalResult<TokenKind> {
    alt(("$@\"", "@$\"", "@\"")).parse_next(input)?;
    let () = repeat(0.., alt(("\"\"".void(), none_of(['"']).void()))).parse_next(input)?;
    let closed = opt('"').parse_next(input)?.is_some();
    Ok(closed_kind(closed))
}

fn char_literal(input: &mut &str) -> ModalResult<TokenKind> {
    '\''.parse_next(input)?;
    let () = repeat(
        0..,
        alt((('\\', any).void(), none_of(['\'', '\\', '\n']).void())),
    )
    .parse_next(input)?;
    let closed = opt('\'').parse_next(input)?.is_some();
    Ok(closed_kind(closed))
}

fn identifier<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (
        opt('@'),
        one_of(|c: char| c == '_' || c.is_alphabetic()),
        take_while(0.., |c: char| c == '_' || c.is_alphanumeric()),
    )
        .take()
        .parse_next(input)
}

fn number<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (
        take_while(1.., |c: char| c.is_ascii_digit()),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

fn punctuation<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    alt((
        alt((
            "?.", "??=", "??", "=>", "==", "!=", "<=", ">=", "&&", "||", "::", "++", "--",
        )),
        any.take(),
    ))
    .parse_next(input)
}

// ============================================================================
// Classification
// ============================================================================

/// Operators after which a member access is a pattern/constant operand.
const PATTERN_OPERATORS: &[&str] = &["is", "not", "and", "or", "==", "!=", "case"];

/// Modifiers that start a declaration; the next identifier is a type.
const DECLARATION_MODIFIERS: &[&str] = &[
    "static",
    "async",
    "const",
    "readonly",
    "unsafe",
    "extern",
    "volatile",
    "abstract",
    "virtual",
    "override",
    "sealed",
    "public",
    "private",
    "protected",
    "internal",
    "partial",
    "required",
    "fixed",
];

/// Classify the cursor position at the end of `text_before_cursor`.
pub fn classify(text_before_cursor: &str) -> SyntacticContext {
    let mut tokens = tokenize(text_before_cursor);
    let mut context = SyntacticContext::default();

    if let Some(last) = tokens.last() {
        if last.kind == TokenKind::Unterminated {
            return context;
        }
        if last.kind == TokenKind::Identifier && last.end == text_before_cursor.len() {
            context.prefix = last.text.trim_start_matches('@').to_string();
            tokens.pop();
        }
    }

    let access = match tokens.last().map(|t| t.text) {
        Some(".") => Some(AccessOperator::Dot),
        Some("?.") => Some(AccessOperator::ConditionalDot),
        _ => None,
    };

    match access {
        Some(access) => {
            tokens.pop();
            context.access = Some(access);
            match receiver_chain_start(&tokens) {
                Some(start) => {
                    context.receiver_path = tokens[start..]
                        .iter()
                        .filter(|t| t.kind == TokenKind::Identifier)
                        .map(|t| t.text.trim_start_matches('@').to_string())
                        .collect();
                    let before = &tokens[..start];
                    context.in_pattern = before
                        .last()
                        .is_some_and(|t| PATTERN_OPERATORS.contains(&t.text));
                    context.position_kind = classify_position(before);
                }
                None => context.position_kind = PositionKind::Expression,
            }
        }
        None => context.position_kind = classify_position(&tokens),
    }

    tracing::trace!(?context, "classified cursor position");
    context
}

/// Index where the trailing `a.b.c` chain begins, or `None` if the chain
/// starts with something other than a name (`f().x`).
fn receiver_chain_start(tokens: &[Token<'_>]) -> Option<usize> {
    let mut i = tokens.len();
    while i > 0 && tokens[i - 1].kind == TokenKind::Identifier {
        i -= 1;
        if i > 0 && matches!(tokens[i - 1].text, "." | "?." | "::") {
            i -= 1;
            if i == 0 || tokens[i - 1].kind != TokenKind::Identifier {
                return None;
            }
            continue;
        }
        break;
    }
    Some(i)
}

fn classify_position(tokens: &[Token<'_>]) -> PositionKind {
    let Some(last) = tokens.last() else {
        return PositionKind::Expression;
    };
    let before_last = tokens.len().checked_sub(2).map(|i| &tokens[i]);

    match last.text {
        "goto" => return PositionKind::Label,
        "new" | "as" => return PositionKind::TypeOnly,
        "(" if before_last.is_some_and(|t| matches!(t.text, "typeof" | "sizeof" | "default")) => {
            return PositionKind::TypeOnly
        }
        _ => {}
    }

    if in_generic_argument_list(tokens) {
        return PositionKind::TypeOnly;
    }
    if in_constraint_clause(tokens) {
        return PositionKind::TypeConstraint;
    }
    if DECLARATION_MODIFIERS.contains(&last.text) {
        return PositionKind::TypeOnly;
    }
    if matches!(last.text, "ref" | "out" | "in" | "scoped") {
        return classify_ref_kind(tokens);
    }

    PositionKind::Expression
}

/// `List<|`, `Dictionary<string, |`. The `<` must touch the preceding name so
/// that `i < |` stays a comparison.
fn in_generic_argument_list(tokens: &[Token<'_>]) -> bool {
    let mut depth = 0usize;
    for i in (0..tokens.len()).rev() {
        let token = &tokens[i];
        match token.text {
            ">" => depth += 1,
            "<" => {
                if depth == 0 {
                    return i > 0
                        && tokens[i - 1].kind == TokenKind::Identifier
                        && tokens[i - 1].end == token.start;
                }
                depth -= 1;
            }
            "," | "." | "?" | "[" | "]" | "::" => {}
            _ if token.kind == TokenKind::Identifier => {}
            _ => return false,
        }
    }
    false
}

/// `where T : |` and `where T : A, |`.
fn in_constraint_clause(tokens: &[Token<'_>]) -> bool {
    let Some(last) = tokens.last() else {
        return false;
    };
    if last.text != ":" && last.text != "," {
        return false;
    }
    for i in (0..tokens.len()).rev() {
        match tokens[i].text {
            "where" => {
                return tokens
                    .get(i + 1)
                    .is_some_and(|t| t.kind == TokenKind::Identifier)
                    && tokens.get(i + 2).is_some_and(|t| t.text == ":");
            }
            "{" | "}" | ";" | "(" | ")" | "=" | "=>" => return false,
            _ => {}
        }
    }
    false
}

/// `ref`/`out`/`in`/`scoped` start a declaration at statement start or in a
/// parameter list, and an argument inside an invocation.
fn classify_ref_kind(tokens: &[Token<'_>]) -> PositionKind {
    let n = tokens.len();
    let Some(before) = n.checked_sub(2).map(|i| &tokens[i]) else {
        return PositionKind::TypeOnly;
    };

    match before.text {
        "{" | "}" | ";" => PositionKind::TypeOnly,
        "ref" | "scoped" | "readonly" => PositionKind::TypeOnly,
        "(" | "," => {
            if opens_parameter_list(tokens, n - 2) {
                PositionKind::TypeOnly
            } else {
                PositionKind::Expression
            }
        }
        text if DECLARATION_MODIFIERS.contains(&text) => PositionKind::TypeOnly,
        _ => PositionKind::Expression,
    }
}

/// Check whether the list containing `tokens[idx]` is a declaration's
/// parameter list (`void M(`) rather than an argument list (`M(`).
fn opens_parameter_list(tokens: &[Token<'_>], idx: usize) -> bool {
    let mut depth = 0usize;
    let mut open = None;
    for i in (0..=idx).rev() {
        match tokens[i].text {
            ")" | "]" => depth += 1,
            "(" | "[" => {
                if depth == 0 {
                    open = Some(i);
                    break;
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    let Some(open) = open else {
        return false;
    };
    if open < 2 || tokens[open].text != "(" {
        return false;
    }

    let name = &tokens[open - 1];
    let declared_type = &tokens[open - 2];
    let type_like = match declared_type.kind {
        TokenKind::Identifier => {
            !is_reserved_keyword(declared_type.text) || is_predefined_type(declared_type.text)
        }
        TokenKind::Punct => matches!(declared_type.text, ">" | "]" | "?"),
        _ => false,
    };
    name.kind == TokenKind::Identifier && !is_reserved_keyword(name.text) && type_like
}

// ============================================================================
// Tests
// ============================================================================
