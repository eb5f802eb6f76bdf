//! CSS selector parsing and matching for in-memory documents.
//!
//! Covers the subset of Selectors Level 4 that interactive-element queries use:
//! type and universal selectors, `#id`, `.class`, attribute selectors with all
//! six operators and the `i`/`s` flags, selector lists, and the descendant and
//! child combinators. Anything else is rejected with a parse error instead of
//! silently matching nothing.

use std::fmt;
use std::str::FromStr;

/// Read access to an element, as needed for selector matching.
pub trait SelectorElement: Sized {
    fn tag_name(&self) -> &str;
    fn attribute(&self, name: &str) -> Option<&str>;
    fn parent_element(&self) -> Option<Self>;
}

/// A parse failure with its byte offset in the selector text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorParseError {
    pub position: usize,
    pub message: String,
}

impl fmt::Display for SelectorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.message, self.position)
    }
}

impl std::error::Error for SelectorParseError {}

/// Comma-separated list of complex selectors.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList {
    selectors: Vec<ComplexSelector>,
}

#[derive(Debug, Clone, PartialEq)]
struct ComplexSelector {
    /// `parts[i].0` joins `parts[i - 1]` to `parts[i]`; ignored for `i == 0`.
    parts: Vec<(Combinator, Compound)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeSelector>,
}

#[derive(Debug, Clone, PartialEq)]
struct AttributeSelector {
    name: String,
    test: Option<AttributeTest>,
}

#[derive(Debug, Clone, PartialEq)]
struct AttributeTest {
    op: AttributeOp,
    value: String,
    case_insensitive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttributeOp {
    /// `=`
    Equals,
    /// `~=`
    Includes,
    /// `|=`
    DashMatch,
    /// `^=`
    Prefix,
    /// `$=`
    Suffix,
    /// `*=`
    Substring,
}

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self, SelectorParseError> {
        Parser::new(input).parse_list()
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    pub fn matches<E: SelectorElement>(&self, element: &E) -> bool {
        self.selectors.iter().any(|s| s.matches(element))
    }
}

impl FromStr for SelectorList {
    type Err = SelectorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SelectorList::parse(s)
    }
}

impl ComplexSelector {
    fn matches<E: SelectorElement>(&self, element: &E) -> bool {
        self.match_from(self.parts.len() - 1, element)
    }

    fn match_from<E: SelectorElement>(&self, index: usize, element: &E) -> bool {
        let (combinator, compound) = &self.parts[index];
        if !compound.matches(element) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match combinator {
            Combinator::Child => element
                .parent_element()
                .is_some_and(|parent| self.match_from(index - 1, &parent)),
            Combinator::Descendant => {
                let mut ancestor = element.parent_element();
                while let Some(current) = ancestor {
                    if self.match_from(index - 1, &current) {
                        return true;
                    }
                    ancestor = current.parent_element();
                }
                false
            }
        }
    }
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.ids.is_empty() && self.classes.is_empty() && self.attributes.is_empty()
    }

    fn matches<E: SelectorElement>(&self, element: &E) -> bool {
        if let Some(tag) = &self.tag {
            if tag != "*" && !element.tag_name().eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if !self.ids.iter().all(|id| element.attribute("id") == Some(id.as_str())) {
            return false;
        }
        if !self.classes.is_empty() {
            let class_attr = element.attribute("class").unwrap_or("");
            if !self
                .classes
                .iter()
                .all(|wanted| class_attr.split_ascii_whitespace().any(|c| c == wanted))
            {
                return false;
            }
        }
        self.attributes.iter().all(|a| a.matches(element))
    }
}

impl AttributeSelector {
    fn matches<E: SelectorElement>(&self, element: &E) -> bool {
        let Some(actual) = element.attribute(&self.name) else {
            return false;
        };
        let Some(test) = &self.test else {
            return true;
        };
        let (actual, expected) = if test.case_insensitive {
            (actual.to_ascii_lowercase(), test.value.to_ascii_lowercase())
        } else {
            (actual.to_string(), test.value.clone())
        };
        match test.op {
            AttributeOp::Equals => actual == expected,
            AttributeOp::Includes => {
                !expected.is_empty() && actual.split_ascii_whitespace().any(|w| w == expected)
            }
            AttributeOp::DashMatch => {
                actual == expected || actual.starts_with(&format!("{}-", expected))
            }
            AttributeOp::Prefix => !expected.is_empty() && actual.starts_with(&expected),
            AttributeOp::Suffix => !expected.is_empty() && actual.ends_with(&expected),
            AttributeOp::Substring => !expected.is_empty() && actual.contains(&expected),
        }
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn error(&self, message: impl Into<String>) -> SelectorParseError {
        SelectorParseError {
            position: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    /// Returns whether any whitespace was consumed.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.pos > start
    }

    fn parse_list(mut self) -> Result<SelectorList, SelectorParseError> {
        let mut selectors = Vec::new();
        loop {
            self.skip_whitespace();
            selectors.push(self.parse_complex()?);
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some(',') => {
                    self.bump();
                }
                Some(c) => return Err(self.error(format!("unexpected character '{}'", c))),
            }
        }
        Ok(SelectorList { selectors })
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, SelectorParseError> {
        let first = self.parse_compound()?;
        if first.is_empty() {
            return Err(match self.peek() {
                None => self.error("expected a selector"),
                Some(c) => self.error(format!("unexpected character '{}'", c)),
            });
        }
        let mut parts = vec![(Combinator::Descendant, first)];

        loop {
            let had_whitespace = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.bump();
                    self.skip_whitespace();
                    Combinator::Child
                }
                Some('+') | Some('~') => {
                    return Err(self.error("sibling combinators are not supported"));
                }
                Some(_) if had_whitespace => Combinator::Descendant,
                Some(c) => return Err(self.error(format!("unexpected character '{}'", c))),
            };
            let compound = self.parse_compound()?;
            if compound.is_empty() {
                return Err(self.error("expected a selector after combinator"));
            }
            parts.push((combinator, compound));
        }

        Ok(ComplexSelector { parts })
    }

    fn parse_compound(&mut self) -> Result<Compound, SelectorParseError> {
        let mut compound = Compound::default();

        if self.eat('*') {
            compound.tag = Some("*".to_string());
        } else if self.peek().is_some_and(|c| is_ident_start(c) || c == '\\') {
            compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.ids.push(self.parse_ident()?);
                }
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.parse_ident()?);
                }
                Some('[') => {
                    self.bump();
                    compound.attributes.push(self.parse_attribute()?);
                }
                Some(':') => return Err(self.error("pseudo-classes are not supported")),
                Some('*') => return Err(self.error("universal selector must come first")),
                Some(c) if is_ident_start(c) && !compound.is_empty() => {
                    return Err(self.error("type selector must come first"));
                }
                _ => break,
            }
        }

        Ok(compound)
    }

    fn parse_ident(&mut self) -> Result<String, SelectorParseError> {
        if !self.peek().is_some_and(|c| is_ident_start(c) || c == '\\') {
            return Err(self.error("expected an identifier"));
        }
        self.parse_ident_chars()
    }

    fn parse_unquoted_value(&mut self) -> Result<String, SelectorParseError> {
        let value = self.parse_ident_chars()?;
        if value.is_empty() {
            return Err(self.error("expected an attribute value"));
        }
        Ok(value)
    }

    /// Identifier characters with escapes decoded.
    fn parse_ident_chars(&mut self) -> Result<String, SelectorParseError> {
        let mut ident = String::new();
        loop {
            match self.peek() {
                Some('\\') => {
                    self.bump();
                    ident.push(self.parse_escape()?);
                }
                Some(c) if is_ident_char(c) => {
                    self.bump();
                    ident.push(c);
                }
                _ => return Ok(ident),
            }
        }
    }

    /// The character after a backslash: up to six hex digits plus one optional
    /// whitespace, or any other character taken literally.
    fn parse_escape(&mut self) -> Result<char, SelectorParseError> {
        let start = self.pos;
        while self.pos - start < 6 && self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            self.bump();
        }
        if self.pos > start {
            let code = u32::from_str_radix(&self.input[start..self.pos], 16)
                .map_err(|_| self.error("invalid escape"))?;
            if self.peek().is_some_and(char::is_whitespace) {
                self.bump();
            }
            return Ok(match char::from_u32(code) {
                Some(c) if code != 0 => c,
                _ => char::REPLACEMENT_CHARACTER,
            });
        }
        match self.bump() {
            Some('\n') | None => Err(self.error("invalid escape")),
            Some(c) => Ok(c),
        }
    }

    fn parse_attribute(&mut self) -> Result<AttributeSelector, SelectorParseError> {
        self.skip_whitespace();
        if self.peek().is_none() {
            return Err(self.error("unterminated attribute selector"));
        }
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_whitespace();

        let op = match self.bump() {
            Some(']') => return Ok(AttributeSelector { name, test: None }),
            Some('=') => AttributeOp::Equals,
            Some(c @ ('~' | '|' | '^' | '$' | '*')) => {
                if !self.eat('=') {
                    return Err(self.error(format!("expected '=' after '{}'", c)));
                }
                match c {
                    '~' => AttributeOp::Includes,
                    '|' => AttributeOp::DashMatch,
                    '^' => AttributeOp::Prefix,
                    '$' => AttributeOp::Suffix,
                    _ => AttributeOp::Substring,
                }
            }
            Some(c) => return Err(self.error(format!("unexpected character '{}' in attribute selector", c))),
            None => return Err(self.error("unterminated attribute selector")),
        };

        self.skip_whitespace();
        let value = match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.bump();
                self.parse_quoted(q)?
            }
            Some(_) => self.parse_unquoted_value()?,
            None => return Err(self.error("unterminated attribute selector")),
        };
        self.skip_whitespace();

        let mut case_insensitive = false;
        match self.peek() {
            Some('i') | Some('I') => {
                self.bump();
                case_insensitive = true;
                self.skip_whitespace();
            }
            Some('s') | Some('S') => {
                self.bump();
                self.skip_whitespace();
            }
            _ => {}
        }

        if !self.eat(']') {
            return Err(self.error("unterminated attribute selector"));
        }

        Ok(AttributeSelector {
            name,
            test: Some(AttributeTest {
                op,
                value,
                case_insensitive,
            }),
        })
    }

    fn parse_quoted(&mut self, quote: char) -> Result<String, SelectorParseError> {
        let mut value = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(value),
                Some('\\') => match self.bump() {
                    Some(escaped) => value.push(escaped),
                    None => return Err(self.error("unterminated string")),
                },
                Some(c) => value.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }
}

/// Escape `ident` for use as a CSS identifier, following `CSS.escape`.
pub(crate) fn escape_ident(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    let first = ident.chars().next();
    for (i, c) in ident.chars().enumerate() {
        let leading_digit = c.is_ascii_digit() && (i == 0 || (i == 1 && first == Some('-')));
        match c {
            '\0' => out.push(char::REPLACEMENT_CHARACTER),
            '\u{1}'..='\u{1f}' | '\u{7f}' => out.push_str(&format!("\\{:x} ", c as u32)),
            _ if leading_digit => out.push_str(&format!("\\{:x} ", c as u32)),
            '-' if i == 0 && ident.len() == 1 => out.push_str("\\-"),
            _ if !c.is_ascii() || c.is_ascii_alphanumeric() || c == '-' || c == '_' => out.push(c),
            _ => {
                out.push('\\');
                out.push(c);
            }
        }
    }
    out
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

#[cfg(test)]
#[path = "selector_tests.rs"]
mod tests;
