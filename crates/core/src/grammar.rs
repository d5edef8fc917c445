//! Ordered recognizers the header grammar is built from.
//!
//! Rules work on the raw bytes of the source and skip whitespace before every
//! token, so they compose without caring about layout. Composition is
//! PEG-style: optional and repetition are greedy, and an ordered choice falls
//! back to its next alternative only when the previous one fails.

// ---------------------------------------------------------------------------
// Character classes
// ---------------------------------------------------------------------------

/// Byte classes a [`Rule::Word`] can be made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// ASCII letters, digits and `_`.
    Identifier,
    /// `*` and `&`.
    PointerMarks,
}

impl CharClass {
    pub fn contains(self, b: u8) -> bool {
        match self {
            CharClass::Identifier => is_ident_byte(b),
            CharClass::PointerMarks => b == b'*' || b == b'&',
        }
    }
}

pub fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

pub fn is_space_byte(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

/// Position of the first non-whitespace byte at or after `pos`.
pub fn skip_whitespace(src: &[u8], mut pos: usize) -> usize {
    while pos < src.len() && is_space_byte(src[pos]) {
        pos += 1;
    }
    pos
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Rule {
    /// Reserved word. Fails when directly followed by an identifier byte, so
    /// `constant` never matches `const`.
    Keyword(&'static str),
    /// Maximal non-empty run of bytes from one class.
    Word(CharClass),
    /// Exact punctuation.
    Literal(&'static str),
    Seq(Vec<Rule>),
    Choice(Vec<Rule>),
    Optional(Box<Rule>),
    ZeroOrMore(Box<Rule>),
    /// Negative lookahead: succeeds without consuming when the inner rule fails.
    Not(Box<Rule>),
}

impl Rule {
    pub fn keyword(word: &'static str) -> Rule {
        Rule::Keyword(word)
    }

    /// Ordered choice over a list of keywords.
    pub fn one_of(words: &[&'static str]) -> Rule {
        Rule::Choice(words.iter().map(|&w| Rule::Keyword(w)).collect())
    }

    pub fn word(class: CharClass) -> Rule {
        Rule::Word(class)
    }

    pub fn literal(text: &'static str) -> Rule {
        Rule::Literal(text)
    }

    pub fn seq(rules: impl IntoIterator<Item = Rule>) -> Rule {
        Rule::Seq(rules.into_iter().collect())
    }

    pub fn choice(rules: impl IntoIterator<Item = Rule>) -> Rule {
        Rule::Choice(rules.into_iter().collect())
    }

    pub fn optional(rule: Rule) -> Rule {
        Rule::Optional(Box::new(rule))
    }

    pub fn zero_or_more(rule: Rule) -> Rule {
        Rule::ZeroOrMore(Box::new(rule))
    }

    pub fn not(rule: Rule) -> Rule {
        Rule::Not(Box::new(rule))
    }

    /// Try the rule anchored at `pos`. Returns the offset just past the last
    /// byte consumed, or `None` when the rule does not match there.
    pub fn parse(&self, src: &[u8], pos: usize) -> Option<usize> {
        match self {
            Rule::Keyword(word) => {
                let start = skip_whitespace(src, pos);
                let end = start + word.len();
                if src.get(start..end)? != word.as_bytes() {
                    return None;
                }
                if src.get(end).is_some_and(|&b| is_ident_byte(b)) {
                    return None;
                }
                Some(end)
            }
            Rule::Word(class) => {
                let start = skip_whitespace(src, pos);
                let len = src[start..].iter().take_while(|&&b| class.contains(b)).count();
                (len > 0).then_some(start + len)
            }
            Rule::Literal(text) => {
                let start = skip_whitespace(src, pos);
                let end = start + text.len();
                (src.get(start..end)? == text.as_bytes()).then_some(end)
            }
            Rule::Seq(rules) => rules.iter().try_fold(pos, |at, rule| rule.parse(src, at)),
            Rule::Choice(rules) => rules.iter().find_map(|rule| rule.parse(src, pos)),
            Rule::Optional(rule) => Some(rule.parse(src, pos).unwrap_or(pos)),
            Rule::ZeroOrMore(rule) => {
                let mut at = pos;
                while let Some(next) = rule.parse(src, at) {
                    // An empty iteration would repeat forever.
                    if next == at {
                        break;
                    }
                    at = next;
                }
                Some(at)
            }
            Rule::Not(rule) => match rule.parse(src, pos) {
                Some(_) => None,
                None => Some(pos),
            },
        }
    }
}
