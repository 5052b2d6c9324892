use thiserror::Error;

/// Byte range into the source text, end-exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Number,
    /// Single or double quoted string.
    Str { quote: char },
    Template { substitutions: bool },
    Regex,
    Punct(char),
    LineComment,
    BlockComment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::LineComment | TokenKind::BlockComment)
    }

    pub fn is_punct(&self, ch: char) -> bool {
        self.kind == TokenKind::Punct(ch)
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.start..self.span.end]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at line {line}, column {column}")]
pub struct SyntaxError {
    pub message: String,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl SyntaxError {
    /// Builds an error positioned at `offset`, with 1-based line and column.
    pub fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let offset = offset.min(source.len());
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|idx| idx + 1).unwrap_or(0);
        let column = before[line_start..].chars().count() + 1;

        Self {
            message: message.into(),
            offset,
            line,
            column,
        }
    }
}

/// Keywords after which a `/` starts a regular expression rather than a division.
const REGEX_PRECEDING_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "yield",
    "await",
];

/// Keywords whose parenthesized condition may be followed by a regex literal.
const CONDITION_KEYWORDS: &[&str] = &["if", "while", "for", "with"];

/// Splits JavaScript source into tokens. Comments are kept as tokens so
/// callers can tell significant tokens from trivia; whitespace is dropped.
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut lexer = Lexer {
        src: source,
        pos: 0,
        tokens: Vec::new(),
        parens: Vec::new(),
        after_condition: false,
    };
    lexer.skip_hashbang();
    lexer.lex_until(None)?;
    Ok(lexer.tokens)
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    tokens: Vec<Token>,
    /// One entry per open `(`: whether it starts a statement condition.
    parens: Vec<bool>,
    /// Whether the last `)` closed a statement condition.
    after_condition: bool,
}

impl Lexer<'_> {
    fn prev_significant(&self) -> Option<&Token> {
        self.tokens.iter().rev().find(|token| !token.is_comment())
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.src[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) {
        if let Some(ch) = self.peek() {
            self.pos += ch.len_utf8();
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token {
            kind,
            span: Span::new(start, self.pos),
        });
    }

    fn error(&self, offset: usize, message: &str) -> SyntaxError {
        SyntaxError::at(self.src, offset, message)
    }

    fn skip_hashbang(&mut self) {
        if self.src.starts_with("#!") {
            self.pos = self.src.find('\n').unwrap_or(self.src.len());
        }
    }

    /// Lexes to the end of input, or, when `template_start` is set, to the
    /// brace that closes a template substitution.
    fn lex_until(&mut self, template_start: Option<usize>) -> Result<(), SyntaxError> {
        let mut depth = 0usize;

        while let Some(ch) = self.peek() {
            let start = self.pos;
            match ch {
                c if c.is_whitespace() || c == '\u{feff}' => self.bump(),
                '/' => match self.peek_second() {
                    Some('/') => self.line_comment(start),
                    Some('*') => self.block_comment(start)?,
                    _ if self.regex_allowed() => self.regex(start)?,
                    _ => self.punct(start),
                },
                '\'' | '"' => self.string(start, ch)?,
                '`' => self.template(start)?,
                c if c.is_ascii_digit() => self.number(start),
                '.' if self.peek_second().is_some_and(|c| c.is_ascii_digit()) => {
                    self.number(start)
                }
                c if is_ident_start(c) => self.ident(start),
                '(' => {
                    let condition = self.prev_significant().is_some_and(|prev| {
                        prev.kind == TokenKind::Ident
                            && CONDITION_KEYWORDS.contains(&prev.text(self.src))
                    });
                    self.parens.push(condition);
                    self.punct(start);
                }
                ')' => {
                    self.after_condition = self.parens.pop().unwrap_or(false);
                    self.punct(start);
                }
                '{' => {
                    depth += 1;
                    self.punct(start);
                }
                '}' if template_start.is_some() && depth == 0 => {
                    self.bump();
                    return Ok(());
                }
                '}' => {
                    depth = depth.saturating_sub(1);
                    self.punct(start);
                }
                _ => self.punct(start),
            }
        }

        match template_start {
            Some(start) => Err(self.error(start, "unterminated template literal")),
            None => Ok(()),
        }
    }

    fn punct(&mut self, start: usize) {
        let Some(ch) = self.peek() else {
            return;
        };
        self.bump();
        self.push(TokenKind::Punct(ch), start);
    }

    fn regex_allowed(&self) -> bool {
        let Some(prev) = self.prev_significant() else {
            return true;
        };

        match prev.kind {
            TokenKind::Punct(')') => self.after_condition,
            TokenKind::Punct(c) => !matches!(c, ']' | '}'),
            TokenKind::Ident => REGEX_PRECEDING_KEYWORDS.contains(&prev.text(self.src)),
            _ => false,
        }
    }

    fn line_comment(&mut self, start: usize) {
        let rest = &self.src[start..];
        let len = rest.find(['\n', '\r']).unwrap_or(rest.len());
        self.pos = start + len;
        self.push(TokenKind::LineComment, start);
    }

    fn block_comment(&mut self, start: usize) -> Result<(), SyntaxError> {
        let Some(close) = self.src[start + 2..].find("*/") else {
            return Err(self.error(start, "unterminated block comment"));
        };
        self.pos = start + 2 + close + 2;
        self.push(TokenKind::BlockComment, start);
        Ok(())
    }

    fn string(&mut self, start: usize, quote: char) -> Result<(), SyntaxError> {
        self.bump();
        loop {
            match self.peek() {
                None | Some('\n') | Some('\r') => {
                    return Err(self.error(start, "unterminated string literal"));
                }
                Some('\\') => self.escape(),
                Some(c) if c == quote => {
                    self.bump();
                    break;
                }
                Some(_) => self.bump(),
            }
        }
        self.push(TokenKind::Str { quote }, start);
        Ok(())
    }

    /// Consumes a backslash and the character it escapes, treating CRLF as one.
    fn escape(&mut self) {
        self.bump();
        let escaped = self.peek();
        self.bump();
        if escaped == Some('\r') && self.peek() == Some('\n') {
            self.bump();
        }
    }

    fn template(&mut self, start: usize) -> Result<(), SyntaxError> {
        self.bump();
        let mut substitutions = false;

        loop {
            match self.peek() {
                None => return Err(self.error(start, "unterminated template literal")),
                Some('\\') => self.escape(),
                Some('`') => {
                    self.bump();
                    break;
                }
                Some('$') if self.peek_second() == Some('{') => {
                    self.pos += 2;
                    substitutions = true;
                    // Substitution tokens belong to the template, not the outer stream.
                    let outer = std::mem::take(&mut self.tokens);
                    let result = self.lex_until(Some(start));
                    self.tokens = outer;
                    result?;
                }
                Some(_) => self.bump(),
            }
        }

        self.push(TokenKind::Template { substitutions }, start);
        Ok(())
    }

    fn regex(&mut self, start: usize) -> Result<(), SyntaxError> {
        self.bump();
        let mut in_class = false;

        loop {
            match self.peek() {
                None | Some('\n') | Some('\r') => {
                    return Err(self.error(start, "unterminated regular expression"));
                }
                Some('\\') => {
                    self.bump();
                    if !matches!(self.peek(), None | Some('\n') | Some('\r')) {
                        self.bump();
                    }
                }
                Some('[') => {
                    in_class = true;
                    self.bump();
                }
                Some(']') => {
                    in_class = false;
                    self.bump();
                }
                Some('/') if !in_class => {
                    self.bump();
                    break;
                }
                Some(_) => self.bump(),
            }
        }

        while self.peek().is_some_and(is_ident_part) {
            self.bump();
        }
        self.push(TokenKind::Regex, start);
        Ok(())
    }

    fn number(&mut self, start: usize) {
        let hex = self.src[start..].starts_with("0x") || self.src[start..].starts_with("0X");
        let mut prev = '\0';

        while let Some(c) = self.peek() {
            let exponent_sign = matches!(c, '+' | '-') && matches!(prev, 'e' | 'E') && !hex;
            if !(c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign) {
                break;
            }
            prev = c;
            self.bump();
        }
        self.push(TokenKind::Number, start);
    }

    fn ident(&mut self, start: usize) {
        while self.peek().is_some_and(is_ident_part) {
            self.bump();
        }
        self.push(TokenKind::Ident, start);
    }
}

fn is_ident_start(c: char) -> bool {
    c == '$' || c == '_' || c.is_alphabetic()
}

fn is_ident_part(c: char) -> bool {
    is_ident_start(c) || c.is_alphanumeric() || c == '\u{200c}' || c == '\u{200d}'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn test_tokenizes_commonjs_export() {
        let source = "module.exports = { plugins: ['a'] };";
        let tokens = tokenize(source).unwrap();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text(source)).collect();
        assert_eq!(
            texts,
            vec![
                "module", ".", "exports", "=", "{", "plugins", ":", "[", "'a'", "]", "}", ";"
            ]
        );
        assert_eq!(tokens[8].kind, TokenKind::Str { quote: '\'' });
    }

    #[test]
    fn test_comments_are_kept_as_tokens() {
        let source = "// head\nx /* mid */ y";
        let tokens = tokenize(source).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::LineComment);
        assert_eq!(tokens[0].text(source), "// head");
        assert_eq!(tokens[2].kind, TokenKind::BlockComment);
        assert_eq!(tokens[2].text(source), "/* mid */");
    }

    #[test]
    fn test_string_with_escaped_quote_and_brackets() {
        let source = r#""a \" ] }""#;
        assert_eq!(kinds(source), vec![TokenKind::Str { quote: '"' }]);
    }

    #[test]
    fn test_template_with_nested_substitution_is_one_token() {
        let source = "`x ${ { a: `${b}` }.a } }`";
        assert_eq!(
            kinds(source),
            vec![TokenKind::Template {
                substitutions: true
            }]
        );
    }

    #[test]
    fn test_regex_versus_division() {
        assert_eq!(
            kinds("a / b"),
            vec![TokenKind::Ident, TokenKind::Punct('/'), TokenKind::Ident]
        );
        assert_eq!(
            kinds("x = /[/\\]]+/g"),
            vec![TokenKind::Ident, TokenKind::Punct('='), TokenKind::Regex]
        );
        assert_eq!(
            kinds("return /}/"),
            vec![TokenKind::Ident, TokenKind::Regex]
        );
    }

    #[test]
    fn test_regex_after_statement_condition() {
        assert_eq!(
            kinds("if (x) /[}]/.test(s)")[4],
            TokenKind::Regex
        );
        assert_eq!(
            kinds("while (f(a)) /a/g"),
            vec![
                TokenKind::Ident,
                TokenKind::Punct('('),
                TokenKind::Ident,
                TokenKind::Punct('('),
                TokenKind::Ident,
                TokenKind::Punct(')'),
                TokenKind::Punct(')'),
                TokenKind::Regex,
            ]
        );
        assert_eq!(
            kinds("(a) / (b)")[3],
            TokenKind::Punct('/')
        );
        assert_eq!(kinds("f(x) / 2")[4], TokenKind::Punct('/'));
    }

    #[test]
    fn test_numbers_with_exponent_and_hex() {
        assert_eq!(kinds("1e-5"), vec![TokenKind::Number]);
        assert_eq!(kinds("0xff"), vec![TokenKind::Number]);
        assert_eq!(kinds(".5"), vec![TokenKind::Number]);
    }

    #[test]
    fn test_hashbang_and_bom_are_skipped() {
        assert_eq!(kinds("#!/usr/bin/env node\nx"), vec![TokenKind::Ident]);
        assert_eq!(kinds("\u{feff}x"), vec![TokenKind::Ident]);
    }

    #[test]
    fn test_unterminated_string_reports_position() {
        let err = tokenize("x = {\n  a: 'oops\n}").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 6);
        assert!(err.message.contains("string"));
    }

    #[test]
    fn test_unterminated_comment_and_template() {
        assert!(tokenize("/* never closed").is_err());
        assert!(tokenize("`abc ${ x").is_err());
    }
}
