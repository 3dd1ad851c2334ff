//! Tokenizer for the static subset of HCL used by lock files

use crate::error::ParserError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Ident(String),
    /// Quoted string with escapes already decoded
    Str(String),
    Number(String),
    Equals,
    Comma,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Newline,
    Eof,
}

impl Token {
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("identifier {:?}", name),
            Token::Str(_) => "string".to_string(),
            Token::Number(n) => format!("number {}", n),
            Token::Equals => "\"=\"".to_string(),
            Token::Comma => "\",\"".to_string(),
            Token::LBrace => "\"{\"".to_string(),
            Token::RBrace => "\"}\"".to_string(),
            Token::LBracket => "\"[\"".to_string(),
            Token::RBracket => "\"]\"".to_string(),
            Token::Newline => "newline".to_string(),
            Token::Eof => "end of file".to_string(),
        }
    }
}

/// A token with its byte range in the source
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub(crate) token: Token,
    pub(crate) start: usize,
    pub(crate) end: usize,
}

/// Line and column (both 1-based) of a byte offset
pub(crate) fn position(src: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, c) in src.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

pub(crate) fn syntax_error(src: &str, offset: usize, summary: &str, detail: impl AsRef<str>) -> ParserError {
    let (line, col) = position(src, offset);
    ParserError::document(
        summary,
        format!("On line {}, column {}: {}", line, col, detail.as_ref()),
    )
}

pub(crate) struct Lexer<'src> {
    src: &'src str,
    pos: usize,
}

impl<'src> Lexer<'src> {
    pub(crate) fn new(src: &'src str) -> Self {
        Self { src, pos: 0 }
    }

    pub(crate) fn tokenize(mut self) -> Result<Vec<Spanned>, ParserError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eof = tok.token == Token::Eof;
            tokens.push(tok);
            if is_eof {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn spanned(&self, token: Token, start: usize) -> Spanned {
        Spanned {
            token,
            start,
            end: self.pos,
        }
    }

    fn next_token(&mut self) -> Result<Spanned, ParserError> {
        self.skip_trivia()?;

        let start = self.pos;
        let Some(c) = self.bump() else {
            return Ok(self.spanned(Token::Eof, start));
        };

        let token = match c {
            '\n' => Token::Newline,
            '=' => Token::Equals,
            ',' => Token::Comma,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '"' => Token::Str(self.scan_string(start)?),
            c if c.is_ascii_digit() => Token::Number(self.scan_number(start)),
            c if c.is_alphabetic() || c == '_' => Token::Ident(self.scan_ident(start)),
            c => {
                return Err(syntax_error(
                    self.src,
                    start,
                    "Invalid character",
                    format!("This character {:?} is not used within the language.", c),
                ))
            }
        };
        Ok(self.spanned(token, start))
    }

    /// Skip spaces and comments, stopping before a newline
    fn skip_trivia(&mut self) -> Result<(), ParserError> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(' ' | '\t' | '\r'), _) => {
                    self.bump();
                }
                (Some('#'), _) | (Some('/'), Some('/')) => {
                    while matches!(self.peek(), Some(c) if c != '\n') {
                        self.bump();
                    }
                }
                (Some('/'), Some('*')) => {
                    let start = self.pos;
                    self.pos += 2;
                    match self.src[self.pos..].find("*/") {
                        Some(end) => self.pos += end + 2,
                        None => {
                            return Err(syntax_error(
                                self.src,
                                start,
                                "Unterminated comment",
                                "There is no closing */ for this comment.",
                            ))
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn scan_ident(&mut self, start: usize) -> String {
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_' || c == '-') {
            self.bump();
        }
        self.src[start..self.pos].to_string()
    }

    fn scan_number(&mut self, start: usize) -> String {
        let digits = |lexer: &mut Self| {
            while matches!(lexer.peek(), Some(c) if c.is_ascii_digit()) {
                lexer.bump();
            }
        };
        digits(self);
        if self.peek() == Some('.') && matches!(self.peek_at(1), Some(c) if c.is_ascii_digit()) {
            self.bump();
            digits(self);
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let sign = usize::from(matches!(self.peek_at(1), Some('+' | '-')));
            if matches!(self.peek_at(1 + sign), Some(c) if c.is_ascii_digit()) {
                for _ in 0..=sign {
                    self.bump();
                }
                digits(self);
            }
        }
        self.src[start..self.pos].to_string()
    }

    /// Scan a quoted string; the opening quote is already consumed
    fn scan_string(&mut self, start: usize) -> Result<String, ParserError> {
        let mut out = String::new();
        loop {
            let at = self.pos;
            match self.bump() {
                None | Some('\n') => {
                    return Err(syntax_error(
                        self.src,
                        start,
                        "Unterminated template string",
                        "No closing marker was found for the string.",
                    ))
                }
                Some('"') => return Ok(out),
                Some('\\') => out.push(self.scan_escape(at)?),
                Some(marker @ ('$' | '%')) => match (self.peek(), self.peek_at(1)) {
                    (Some(c), Some('{')) if c == marker => {
                        self.bump();
                        self.bump();
                        out.push(marker);
                        out.push('{');
                    }
                    (Some('{'), _) => {
                        return Err(syntax_error(
                            self.src,
                            at,
                            "Template sequences not allowed",
                            "Lock files may only contain literal strings.",
                        ))
                    }
                    _ => out.push(marker),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn scan_escape(&mut self, at: usize) -> Result<char, ParserError> {
        let invalid = |lexer: &Self, detail: &str| {
            syntax_error(lexer.src, at, "Invalid escape sequence", detail)
        };
        match self.bump() {
            Some('n') => Ok('\n'),
            Some('r') => Ok('\r'),
            Some('t') => Ok('\t'),
            Some('"') => Ok('"'),
            Some('\\') => Ok('\\'),
            Some(kind @ ('u' | 'U')) => {
                let len = if kind == 'u' { 4 } else { 8 };
                let mut value: u32 = 0;
                for _ in 0..len {
                    let digit = self
                        .peek()
                        .and_then(|c| c.to_digit(16))
                        .ok_or_else(|| invalid(self, "Expected hexadecimal digits after \\u or \\U."))?;
                    self.bump();
                    value = value.checked_mul(16).and_then(|v| v.checked_add(digit)).ok_or_else(
                        || invalid(self, "The escape sequence is out of range."),
                    )?;
                }
                char::from_u32(value)
                    .ok_or_else(|| invalid(self, "The escape sequence is not a valid Unicode character."))
            }
            _ => Err(invalid(
                self,
                "The only valid escapes are \\n, \\r, \\t, \\\", \\\\, \\uNNNN and \\UNNNNNNNN.",
            )),
        }
    }
}
