//! Function header recognition.
//!
//! A header runs from the storage class / return type through the parameter
//! list and the opening `{`. Any identifier-shaped token is accepted as a
//! type, so macro invocations that look like headers match too.

use crate::grammar::{is_ident_byte, is_space_byte, skip_whitespace, CharClass, Rule};
use crate::types::Span;

// ---------------------------------------------------------------------------
// Grammar
// ---------------------------------------------------------------------------

fn identifier() -> Rule {
    Rule::word(CharClass::Identifier)
}

fn type_qualifier() -> Rule {
    Rule::one_of(&["const", "volatile"])
}

fn declarator() -> Rule {
    Rule::seq([Rule::optional(Rule::word(CharClass::PointerMarks)), identifier()])
}

fn param() -> Rule {
    Rule::seq([
        Rule::optional(type_qualifier()),
        Rule::optional(Rule::keyword("struct")),
        Rule::optional(identifier()),
        Rule::optional(declarator()),
    ])
}

fn variadic_tail() -> Rule {
    Rule::seq([Rule::literal(","), Rule::literal("...")])
}

fn param_list() -> Rule {
    // `param` can match empty, so a bare `...` has to be tried first or the
    // empty param would win the choice and leave `...` unconsumed.
    Rule::choice([
        Rule::literal("..."),
        Rule::seq([
            param(),
            Rule::zero_or_more(Rule::seq([Rule::not(variadic_tail()), Rule::literal(","), param()])),
            Rule::optional(variadic_tail()),
        ]),
    ])
}

fn header() -> Rule {
    let storage_class = Rule::one_of(&["auto", "register", "static", "extern", "typedef"]);
    let function_specifier = Rule::keyword("inline");
    let type_name = Rule::seq([
        Rule::optional(type_qualifier()),
        Rule::optional(identifier()),
        Rule::zero_or_more(type_qualifier()),
    ]);

    Rule::seq([
        Rule::optional(storage_class),
        Rule::optional(function_specifier),
        type_name,
        declarator(),
        Rule::literal("("),
        Rule::optional(param_list()),
        Rule::literal(")"),
        Rule::literal("{"),
    ])
}

// ---------------------------------------------------------------------------
// Matcher
// ---------------------------------------------------------------------------

/// Recognizes function headers, either anchored at an offset or located
/// anywhere after one.
pub struct HeaderMatcher {
    rule: Rule,
}

impl Default for HeaderMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderMatcher {
    pub fn new() -> Self {
        HeaderMatcher { rule: header() }
    }

    /// Match a header starting at `pos` (leading whitespace is skipped).
    /// The returned span ends just past the opening `{`.
    pub fn match_at(&self, text: &str, pos: usize) -> Option<Span> {
        let src = text.as_bytes();
        let end = self.rule.parse(src, pos)?;
        Some(Span::new(skip_whitespace(src, pos), end))
    }

    /// Find the first header starting at or after `from`.
    ///
    /// Candidates are token starts: non-whitespace bytes that do not continue
    /// an identifier. `from` itself always counts as a fresh start.
    pub fn locate(&self, text: &str, from: usize) -> Option<Span> {
        let src = text.as_bytes();
        (from..src.len())
            .filter(|&pos| is_token_start(src, pos, from))
            .find_map(|pos| self.match_at(text, pos))
    }
}

fn is_token_start(src: &[u8], pos: usize, from: usize) -> bool {
    let b = src[pos];
    if is_space_byte(b) {
        return false;
    }
    pos == from || !(is_ident_byte(b) && is_ident_byte(src[pos - 1]))
}

// ---------------------------------------------------------------------------
// Header text helpers
// ---------------------------------------------------------------------------

/// The declarator identifier: the identifier right before the first `(`.
pub fn declarator_name(header: &str) -> &str {
    let before = match header.find('(') {
        Some(paren) => header[..paren].trim_end(),
        None => header.trim_end(),
    };
    let ident_len = before.bytes().rev().take_while(|&b| is_ident_byte(b)).count();
    &before[before.len() - ident_len..]
}

/// One-line signature: everything before the first `{`, whitespace collapsed.
pub fn signature(header: &str) -> String {
    let before = match header.find('{') {
        Some(brace) => &header[..brace],
        None => header,
    };
    before.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parameter texts between the first `(` and the following `)`. A lone
/// `void` means no parameters.
pub fn parameters(header: &str) -> Vec<&str> {
    let Some(open) = header.find('(') else {
        return Vec::new();
    };
    let inner = &header[open + 1..];
    let inner = match inner.find(')') {
        Some(close) => &inner[..close],
        None => inner,
    };
    let params: Vec<&str> = inner.split(',').map(str::trim).filter(|p| !p.is_empty()).collect();
    if params == ["void"] {
        return Vec::new();
    }
    params
}
