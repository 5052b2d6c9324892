use tracing::debug;

use super::ParseError;
use super::lexer::{Span, SyntaxError, Token, TokenKind, tokenize};
use super::literal::unescape;

/// The object literal a config module exports, with every member located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedObject {
    pub span: Span,
    pub members: Vec<Member>,
}

impl ExportedObject {
    /// Looks up a member by key. Later duplicates win, as they do at run time.
    pub fn member(&self, key: &str) -> Option<&Member> {
        self.members
            .iter()
            .rev()
            .find(|member| member.key.as_deref() == Some(key))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// `None` for computed keys and spreads.
    pub key: Option<String>,
    pub span: Span,
    pub value: MemberValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberValue {
    Array(ArrayLiteral),
    /// Anything else: expressions, shorthand, methods, accessors, spreads.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayLiteral {
    /// From `[` through `]`.
    pub span: Span,
    pub elements: Vec<Element>,
}

impl ArrayLiteral {
    /// The text between the brackets.
    pub fn inner(&self) -> Span {
        Span::new(self.span.start + 1, self.span.end - 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub span: Span,
    pub kind: ElementKind,
    /// The comma that follows the element, if any.
    pub comma: Option<Span>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    Str { value: String, quote: char },
    Other,
}

/// Parses `source` and locates the object literal assigned to
/// `module.exports` or exported with `export default`.
pub fn parse_exported_object(source: &str) -> Result<ExportedObject, ParseError> {
    let tokens: Vec<Token> = tokenize(source)?
        .into_iter()
        .filter(|token| !token.is_comment())
        .collect();
    let (depths, matching) = match_brackets(source, &tokens)?;

    let parser = Parser {
        source,
        tokens: &tokens,
        matching: &matching,
    };

    let Some(value_idx) = parser.find_export(&depths) else {
        return Err(ParseError::Shape(
            "no `module.exports = { ... }` or `export default { ... }` found".to_string(),
        ));
    };

    if !tokens[value_idx].is_punct('{') {
        return Err(ParseError::Shape(format!(
            "the exported value is not an object literal (line {})",
            SyntaxError::at(source, tokens[value_idx].span.start, "").line
        )));
    }

    let object = parser.object(value_idx)?;
    debug!(
        members = object.members.len(),
        start = object.span.start,
        "located exported object"
    );
    Ok(object)
}

/// Returns each token's bracket depth and, for opening brackets, the index
/// of the matching closer.
fn match_brackets(
    source: &str,
    tokens: &[Token],
) -> Result<(Vec<usize>, Vec<Option<usize>>), SyntaxError> {
    let mut depths = Vec::with_capacity(tokens.len());
    let mut matching = vec![None; tokens.len()];
    let mut stack: Vec<(char, usize)> = Vec::new();

    for (idx, token) in tokens.iter().enumerate() {
        depths.push(stack.len());
        let TokenKind::Punct(ch) = token.kind else {
            continue;
        };

        match ch {
            '(' | '[' | '{' => stack.push((ch, idx)),
            ')' | ']' | '}' => {
                let expected = match ch {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match stack.pop() {
                    Some((open, open_idx)) if open == expected => matching[open_idx] = Some(idx),
                    _ => {
                        return Err(SyntaxError::at(
                            source,
                            token.span.start,
                            format!("unexpected `{ch}`"),
                        ));
                    }
                }
            }
            _ => {}
        }
    }

    if let Some((open, open_idx)) = stack.pop() {
        return Err(SyntaxError::at(
            source,
            tokens[open_idx].span.start,
            format!("unclosed `{open}`"),
        ));
    }

    Ok((depths, matching))
}

struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    matching: &'a [Option<usize>],
}

impl Parser<'_> {
    fn text(&self, idx: usize) -> &str {
        self.tokens[idx].text(self.source)
    }

    fn is_ident(&self, idx: usize, name: &str) -> bool {
        self.tokens
            .get(idx)
            .is_some_and(|token| token.kind == TokenKind::Ident && token.text(self.source) == name)
    }

    fn is_punct(&self, idx: usize, ch: char) -> bool {
        self.tokens.get(idx).is_some_and(|token| token.is_punct(ch))
    }

    /// Index of the token holding the exported value of the last top-level
    /// export statement.
    fn find_export(&self, depths: &[usize]) -> Option<usize> {
        let mut found = None;

        for idx in 0..self.tokens.len() {
            if depths[idx] != 0 {
                continue;
            }

            let commonjs = self.is_ident(idx, "module")
                && !(idx > 0 && self.is_punct(idx - 1, '.'))
                && self.is_punct(idx + 1, '.')
                && self.is_ident(idx + 2, "exports")
                && self.is_punct(idx + 3, '=')
                && !self.is_punct(idx + 4, '=')
                && !self.is_punct(idx + 4, '>');
            if commonjs && idx + 4 < self.tokens.len() {
                found = Some(idx + 4);
                continue;
            }

            let esm = self.is_ident(idx, "export") && self.is_ident(idx + 1, "default");
            if esm && idx + 2 < self.tokens.len() {
                found = Some(idx + 2);
            }
        }

        found
    }

    fn closer(&self, open: usize) -> usize {
        self.matching[open].unwrap_or(self.tokens.len().saturating_sub(1))
    }

    /// Index of the next `,` at this nesting level, or `close` if none.
    fn next_separator(&self, from: usize, close: usize) -> usize {
        let mut idx = from;
        while idx < close {
            let token = &self.tokens[idx];
            match token.kind {
                TokenKind::Punct('(' | '[' | '{') => idx = self.closer(idx) + 1,
                TokenKind::Punct(',') => return idx,
                _ => idx += 1,
            }
        }
        close
    }

    fn span_of(&self, first: usize, last: usize) -> Span {
        Span::new(self.tokens[first].span.start, self.tokens[last].span.end)
    }

    fn object(&self, open: usize) -> Result<ExportedObject, ParseError> {
        let close = self.closer(open);
        let mut members = Vec::new();
        let mut idx = open + 1;

        while idx < close {
            let end = self.next_separator(idx, close);
            if end == idx {
                return Err(self.unexpected(idx).into());
            }
            members.push(self.member(idx, end)?);
            idx = end + 1;
        }

        Ok(ExportedObject {
            span: self.span_of(open, close),
            members,
        })
    }

    fn member(&self, start: usize, end: usize) -> Result<Member, ParseError> {
        let span = self.span_of(start, end - 1);
        let first = self.tokens[start];

        let key = match first.kind {
            TokenKind::Ident | TokenKind::Number => Some(self.text(start).to_string()),
            TokenKind::Str { .. } => Some(self.string_value(start)?),
            _ => None,
        };

        if key.is_some() && self.is_punct(start + 1, ':') {
            let value_start = start + 2;
            if value_start >= end {
                return Err(
                    SyntaxError::at(self.source, self.tokens[start + 1].span.end, "missing value")
                        .into(),
                );
            }
            let value = if self.is_punct(value_start, '[') && self.closer(value_start) == end - 1 {
                MemberValue::Array(self.array(value_start)?)
            } else {
                MemberValue::Other
            };
            return Ok(Member { key, span, value });
        }

        // Shorthand `name` or method `name() {}` keep their key; accessors,
        // computed keys and spreads do not expose one.
        let keyed = first.kind == TokenKind::Ident && (end == start + 1 || self.is_punct(start + 1, '('));
        Ok(Member {
            key: if keyed { key } else { None },
            span,
            value: MemberValue::Other,
        })
    }

    fn array(&self, open: usize) -> Result<ArrayLiteral, ParseError> {
        let close = self.closer(open);
        let mut elements = Vec::new();
        let mut idx = open + 1;

        while idx < close {
            let end = self.next_separator(idx, close);
            let comma = (end < close).then(|| self.tokens[end].span);

            if end == idx {
                // Elision: `[a, , b]`.
                elements.push(Element {
                    span: Span::empty(self.tokens[idx].span.start),
                    kind: ElementKind::Other,
                    comma,
                });
                idx = end + 1;
                continue;
            }

            let kind = if end == idx + 1 {
                self.element_kind(idx)?
            } else {
                ElementKind::Other
            };
            elements.push(Element {
                span: self.span_of(idx, end - 1),
                kind,
                comma,
            });
            idx = end + 1;
        }

        Ok(ArrayLiteral {
            span: self.span_of(open, close),
            elements,
        })
    }

    fn element_kind(&self, idx: usize) -> Result<ElementKind, ParseError> {
        match self.tokens[idx].kind {
            TokenKind::Str { quote } => Ok(ElementKind::Str {
                value: self.string_value(idx)?,
                quote,
            }),
            TokenKind::Template {
                substitutions: false,
            } => Ok(ElementKind::Str {
                value: self.string_value(idx)?,
                quote: '`',
            }),
            _ => Ok(ElementKind::Other),
        }
    }

    fn string_value(&self, idx: usize) -> Result<String, SyntaxError> {
        let span = self.tokens[idx].span;
        let body = &self.source[span.start + 1..span.end - 1];
        unescape(body).map_err(|reason| SyntaxError::at(self.source, span.start, reason))
    }

    fn unexpected(&self, idx: usize) -> SyntaxError {
        SyntaxError::at(
            self.source,
            self.tokens[idx].span.start,
            format!("unexpected `{}`", self.text(idx)),
        )
    }
}
