//! Syntax tree for lock files
//!
//! Produces a generic body of attributes and blocks. Interpretation of the
//! tree lives in the parent module.

use super::lexer::{syntax_error, Lexer, Spanned, Token};
use crate::error::ParserError;

/// Maximum nesting of blocks and lists
pub(crate) const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Str(String),
    Number(String),
    Bool(bool),
    Null,
    List(Vec<Expr>),
    /// A bare identifier other than a literal keyword
    Reference(String),
}

impl Expr {
    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Expr::Str(_) => "string",
            Expr::Number(_) => "number",
            Expr::Bool(_) => "bool",
            Expr::Null => "null",
            Expr::List(_) => "list",
            Expr::Reference(_) => "reference",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Attribute {
    pub(crate) name: String,
    pub(crate) value: Expr,
    pub(crate) start: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Block {
    pub(crate) kind: String,
    pub(crate) labels: Vec<String>,
    pub(crate) body: Body,
    /// Byte range from the block type through the closing brace
    pub(crate) start: usize,
    pub(crate) end: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Item {
    Attribute(Attribute),
    Block(Block),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Body {
    pub(crate) items: Vec<Item>,
}

/// Parse a whole document into its top-level body
pub(crate) fn parse(src: &str) -> Result<Body, ParserError> {
    let tokens = Lexer::new(src).tokenize()?;
    let mut parser = Parser {
        src,
        tokens,
        pos: 0,
    };
    let body = parser.parse_body(0)?;
    match parser.peek() {
        Token::Eof => Ok(body),
        other => Err(parser.unexpected(other.clone(), "an argument or block definition")),
    }
}

struct Parser<'src> {
    src: &'src str,
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser<'_> {
    fn current(&self) -> &Spanned {
        // The token list always ends with Eof and the cursor never passes it
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.current().token
    }

    fn advance(&mut self) -> Spanned {
        let tok = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn skip_newlines(&mut self) {
        while *self.peek() == Token::Newline {
            self.advance();
        }
    }

    fn unexpected(&self, found: Token, expected: &str) -> ParserError {
        syntax_error(
            self.src,
            self.current().start,
            "Invalid syntax",
            format!("Expected {}, found {}.", expected, found.describe()),
        )
    }

    fn expect(&mut self, token: Token, expected: &str) -> Result<Spanned, ParserError> {
        if *self.peek() == token {
            Ok(self.advance())
        } else {
            Err(self.unexpected(self.peek().clone(), expected))
        }
    }

    fn check_depth(&self, depth: usize) -> Result<(), ParserError> {
        if depth > MAX_DEPTH {
            return Err(syntax_error(
                self.src,
                self.current().start,
                "Nesting too deep",
                format!("Blocks and lists may be nested at most {} levels.", MAX_DEPTH),
            ));
        }
        Ok(())
    }

    /// Parse items until a closing brace or end of file
    fn parse_body(&mut self, depth: usize) -> Result<Body, ParserError> {
        self.check_depth(depth)?;
        let mut body = Body::default();
        loop {
            self.skip_newlines();
            match self.peek() {
                Token::Eof | Token::RBrace => return Ok(body),
                Token::Ident(_) => body.items.push(self.parse_item(depth)?),
                other => {
                    return Err(self.unexpected(other.clone(), "an argument or block definition"))
                }
            }
        }
    }

    fn parse_item(&mut self, depth: usize) -> Result<Item, ParserError> {
        let head = self.advance();
        let Token::Ident(name) = head.token else {
            return Err(self.unexpected(head.token, "an identifier"));
        };

        if *self.peek() == Token::Equals {
            self.advance();
            let value = self.parse_expr(depth + 1)?;
            self.end_of_item()?;
            return Ok(Item::Attribute(Attribute {
                name,
                value,
                start: head.start,
            }));
        }

        let mut labels = Vec::new();
        loop {
            match self.peek().clone() {
                Token::Str(label) | Token::Ident(label) => {
                    self.advance();
                    labels.push(label);
                }
                Token::LBrace => break,
                other => {
                    return Err(self.unexpected(other, "a block label or an opening brace"))
                }
            }
        }
        self.expect(Token::LBrace, "an opening brace")?;
        let body = self.parse_body(depth + 1)?;
        let close = self.expect(Token::RBrace, "a closing brace")?;
        self.end_of_item()?;
        Ok(Item::Block(Block {
            kind: name,
            labels,
            body,
            start: head.start,
            end: close.end,
        }))
    }

    /// Items end at a newline; a closing brace or end of file also ends one
    fn end_of_item(&mut self) -> Result<(), ParserError> {
        match self.peek() {
            Token::Newline => {
                self.advance();
                Ok(())
            }
            Token::RBrace | Token::Eof => Ok(()),
            other => Err(self.unexpected(other.clone(), "a newline")),
        }
    }

    fn parse_expr(&mut self, depth: usize) -> Result<Expr, ParserError> {
        self.check_depth(depth)?;
        if matches!(
            self.peek(),
            Token::Newline | Token::Eof | Token::Equals | Token::Comma | Token::LBrace
                | Token::RBrace | Token::RBracket
        ) {
            return Err(self.unexpected(self.peek().clone(), "an expression"));
        }
        match self.advance().token {
            Token::Str(s) => Ok(Expr::Str(s)),
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::Ident(id) => Ok(match id.as_str() {
                "true" => Expr::Bool(true),
                "false" => Expr::Bool(false),
                "null" => Expr::Null,
                _ => Expr::Reference(id),
            }),
            _ => self.parse_list(depth),
        }
    }

    /// Parse list elements; the opening bracket is already consumed
    fn parse_list(&mut self, depth: usize) -> Result<Expr, ParserError> {
        let mut items = Vec::new();
        loop {
            self.skip_newlines();
            if *self.peek() == Token::RBracket {
                self.advance();
                return Ok(Expr::List(items));
            }
            items.push(self.parse_expr(depth + 1)?);
            self.skip_newlines();
            match self.peek() {
                Token::Comma => {
                    self.advance();
                }
                Token::RBracket => {}
                other => return Err(self.unexpected(other.clone(), "a comma or closing bracket")),
            }
        }
    }
}
