// Tokenizer for contract scripts.
//
// Covers the JavaScript subset contract scripts are written in: literals,
// identifiers, punctuation, `//` and `/* */` comments. Tracks line/column for
// error reporting.

use super::error::ScriptError;
use serde_json::Number;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,
    Colon,
    Comma,
    Semicolon,
    Dot,
    Equals,
    Minus,
    Plus,
    Str(String),
    Num(Number),
    Ident(String),
    Eof,
}

impl TokenKind {
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Str(s) => format!("string {s:?}"),
            TokenKind::Num(n) => format!("number {n}"),
            TokenKind::Ident(name) => format!("identifier `{name}`"),
            TokenKind::Eof => "end of script".to_string(),
            punct => format!("`{}`", punct.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            TokenKind::LeftBrace => "{",
            TokenKind::RightBrace => "}",
            TokenKind::LeftBracket => "[",
            TokenKind::RightBracket => "]",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::Colon => ":",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Dot => ".",
            TokenKind::Equals => "=",
            TokenKind::Minus => "-",
            TokenKind::Plus => "+",
            _ => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
    pub col: u32,
}

pub struct Lexer<'a> {
    src: &'a str,
    /// Current byte offset into src.
    pos: usize,
    line: u32,
    col: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            src: source,
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn next_token(&mut self) -> Result<Token, ScriptError> {
        self.skip_whitespace_and_comments()?;

        let line = self.line;
        let col = self.col;
        let Some(ch) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                line,
                col,
            });
        };

        let kind = match ch {
            '\'' | '"' => self.lex_string(ch)?,
            '0'..='9' => self.lex_number()?,
            '.' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => self.lex_number()?,
            c if c.is_alphabetic() || c == '_' || c == '$' => self.lex_identifier(),
            _ => {
                self.advance();
                match ch {
                    '{' => TokenKind::LeftBrace,
                    '}' => TokenKind::RightBrace,
                    '[' => TokenKind::LeftBracket,
                    ']' => TokenKind::RightBracket,
                    '(' => TokenKind::LeftParen,
                    ')' => TokenKind::RightParen,
                    ':' => TokenKind::Colon,
                    ',' => TokenKind::Comma,
                    ';' => TokenKind::Semicolon,
                    '.' => TokenKind::Dot,
                    '=' => TokenKind::Equals,
                    '-' => TokenKind::Minus,
                    '+' => TokenKind::Plus,
                    other => {
                        return Err(self.error_at(line, col, format!("unexpected character {other:?}")))
                    }
                }
            }
        };
        Ok(Token { kind, line, col })
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn error_at(&self, line: u32, col: u32, message: String) -> ScriptError {
        ScriptError::Syntax { line, col, message }
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), ScriptError> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => {
                    self.advance();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.advance() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                (Some('/'), Some('*')) => {
                    let (line, col) = (self.line, self.col);
                    self.advance();
                    self.advance();
                    loop {
                        match self.advance() {
                            Some('*') if self.peek() == Some('/') => {
                                self.advance();
                                break;
                            }
                            Some(_) => {}
                            None => {
                                return Err(self.error_at(line, col, "unterminated comment".into()))
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn lex_string(&mut self, quote: char) -> Result<TokenKind, ScriptError> {
        let (line, col) = (self.line, self.col);
        self.advance();
        let mut out = String::new();
        loop {
            match self.advance() {
                None | Some('\n') => {
                    return Err(self.error_at(line, col, "unterminated string".into()))
                }
                Some(c) if c == quote => return Ok(TokenKind::Str(out)),
                Some('\\') => {
                    let escaped = self
                        .advance()
                        .ok_or_else(|| self.error_at(line, col, "unterminated string".into()))?;
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        'b' => out.push('\u{8}'),
                        'f' => out.push('\u{c}'),
                        '0' => out.push('\0'),
                        'u' => out.push(self.lex_unicode_escape(line, col)?),
                        // Line continuation.
                        '\n' => {}
                        other => out.push(other),
                    }
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn lex_unicode_escape(&mut self, line: u32, col: u32) -> Result<char, ScriptError> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .advance()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error_at(line, col, "invalid \\u escape".into()))?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or_else(|| self.error_at(line, col, "invalid \\u escape".into()))
    }

    fn lex_number(&mut self) -> Result<TokenKind, ScriptError> {
        let (line, col) = (self.line, self.col);
        let start = self.pos;
        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => {}
                '.' => is_float = true,
                'e' | 'E' => {
                    is_float = true;
                    if matches!(self.peek_at(1), Some('+') | Some('-')) {
                        self.advance();
                    }
                }
                _ => break,
            }
            self.advance();
        }
        let text = &self.src[start..self.pos];
        let number = if is_float {
            text.parse::<f64>().ok().and_then(Number::from_f64)
        } else {
            text.parse::<i64>()
                .map(Number::from)
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(Number::from_f64))
        };
        number
            .map(TokenKind::Num)
            .ok_or_else(|| self.error_at(line, col, format!("invalid number {text:?}")))
    }

    fn lex_identifier(&mut self) -> TokenKind {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                self.advance();
            } else {
                break;
            }
        }
        TokenKind::Ident(self.src[start..self.pos].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token().unwrap();
            let eof = tok.kind == TokenKind::Eof;
            out.push(tok.kind);
            if eof {
                return out;
            }
        }
    }

    #[test]
    fn test_punctuation_and_literals() {
        assert_eq!(
            kinds("{a: 'x', \"b\": -1.5e2}"),
            vec![
                TokenKind::LeftBrace,
                TokenKind::Ident("a".into()),
                TokenKind::Colon,
                TokenKind::Str("x".into()),
                TokenKind::Comma,
                TokenKind::Str("b".into()),
                TokenKind::Colon,
                TokenKind::Minus,
                TokenKind::Num(Number::from_f64(150.0).unwrap()),
                TokenKind::RightBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("// line\n/* block\n */ 42"),
            vec![TokenKind::Num(42.into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#"'it\'s\nA'"#),
            vec![TokenKind::Str("it's\nA".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_positions_and_errors() {
        let mut lexer = Lexer::new("\n  #");
        match lexer.next_token() {
            Err(ScriptError::Syntax { line, col, .. }) => assert_eq!((line, col), (2, 3)),
            other => panic!("expected syntax error, got {other:?}"),
        }
        assert!(Lexer::new("'open").next_token().is_err());
        assert!(Lexer::new("/* open").next_token().is_err());
    }
}
