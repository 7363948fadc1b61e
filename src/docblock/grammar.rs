//! Recursive-descent parser for annotation arguments.
//!
//! ```text
//! annotation := '@' IDENT [ '(' [ arg (',' arg)* [','] ] ')' ]
//! arg        := [ (IDENT | STRING) ('=' | ':') ] expr
//! expr       := annotation | array | literal
//! array      := '[' [ arg (',' arg)* [','] ] ']'
//!             | '{' [ arg (',' arg)* [','] ] '}'
//! literal    := INTEGER | DOUBLE | STRING | IDENT | null | true | false
//! ```

use crate::error::{AnnotationsError, Result};
use crate::node::{AnnotationNode, ExprItem, LiteralKind, ParseNode};

use super::scanner::{ScanError, Scanner, Token, TokenKind};

/// Deepest allowed nesting of argument lists and arrays.
pub const MAX_NESTING: u32 = 64;

pub(crate) struct Parser<'a> {
    scanner: Scanner<'a>,
    peeked: Option<Token>,
    file: &'a str,
    depth: u32,
}

impl<'a> Parser<'a> {
    pub fn new(text: &'a str, file: &'a str, line: u32) -> Self {
        Parser {
            scanner: Scanner::new(text, line),
            peeked: None,
            file,
            depth: 0,
        }
    }

    /// Parse every annotation in the text, skipping free text between
    /// them.
    pub fn parse_all(mut self) -> Result<Vec<AnnotationNode>> {
        let mut annotations = Vec::new();
        while self.scanner.seek_annotation() {
            let at = self.next()?;
            annotations.push(self.annotation(at.line, true)?);
        }
        Ok(annotations)
    }

    fn next(&mut self) -> Result<Token> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.scanner.next_token().map_err(|e| self.scan_error(e)),
        }
    }

    fn peek(&mut self) -> Result<TokenKind> {
        if self.peeked.is_none() {
            let token = self.scanner.next_token().map_err(|e| self.scan_error(e))?;
            self.peeked = Some(token);
        }
        Ok(self.peeked.as_ref().map_or(TokenKind::Eof, |t| t.kind))
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        let token = self.next()?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(self.unexpected(&token))
        }
    }

    /// The `@` has been consumed; parse the name and optional arguments.
    ///
    /// At the top level the argument list must open on the same line as
    /// the name, otherwise the following text is free prose.
    fn annotation(&mut self, line: u32, top_level: bool) -> Result<AnnotationNode> {
        let name = self.next()?;
        if !matches!(
            name.kind,
            TokenKind::Identifier | TokenKind::Null | TokenKind::True | TokenKind::False
        ) {
            return Err(self.unexpected(&name));
        }

        let has_arguments = if top_level {
            self.scanner.paren_follows_inline()
        } else {
            self.peek()? == TokenKind::ParenOpen
        };

        let arguments = if has_arguments {
            let open = self.expect(TokenKind::ParenOpen)?;
            self.items(open.line, TokenKind::ParenClose)?
        } else {
            Vec::new()
        };

        Ok(AnnotationNode {
            name: Some(name.text),
            arguments,
            file: Some(self.file.to_string()),
            line: Some(line),
        })
    }

    /// Comma-separated items up to and including `close`.
    fn items(&mut self, line: u32, close: TokenKind) -> Result<Vec<ExprItem>> {
        if self.depth >= MAX_NESTING {
            let message = format!("Syntax error, nesting deeper than {MAX_NESTING} levels");
            return Err(self.syntax(message, line));
        }
        self.depth += 1;
        let items = self.item_list(close);
        self.depth -= 1;
        items
    }

    fn item_list(&mut self, close: TokenKind) -> Result<Vec<ExprItem>> {
        let mut items = Vec::new();
        if self.peek()? == close {
            self.next()?;
            return Ok(items);
        }

        loop {
            items.push(self.item()?);

            let separator = self.next()?;
            match separator.kind {
                TokenKind::Comma => {
                    if self.peek()? == close {
                        self.next()?;
                        return Ok(items);
                    }
                }
                kind if kind == close => return Ok(items),
                _ => return Err(self.unexpected(&separator)),
            }
        }
    }

    fn item(&mut self) -> Result<ExprItem> {
        let first = self.next()?;
        if matches!(first.kind, TokenKind::Identifier | TokenKind::String)
            && matches!(self.peek()?, TokenKind::Equals | TokenKind::Colon)
        {
            self.next()?;
            let value = self.next()?;
            return Ok(ExprItem {
                name: Some(first.text),
                expr: self.expression(value)?,
            });
        }

        Ok(ExprItem {
            name: None,
            expr: self.expression(first)?,
        })
    }

    fn expression(&mut self, token: Token) -> Result<ParseNode> {
        let node = match token.kind {
            TokenKind::At => ParseNode::Annotation(self.annotation(token.line, false)?),
            TokenKind::BracketOpen => {
                ParseNode::Array(self.items(token.line, TokenKind::BracketClose)?)
            }
            TokenKind::BraceOpen => ParseNode::Array(self.items(token.line, TokenKind::BraceClose)?),
            TokenKind::Integer => ParseNode::literal(LiteralKind::Integer, token.text),
            TokenKind::Double => ParseNode::literal(LiteralKind::Double, token.text),
            TokenKind::String => ParseNode::literal(LiteralKind::String, token.text),
            TokenKind::Identifier => ParseNode::literal(LiteralKind::Identifier, token.text),
            TokenKind::Null => ParseNode::Null,
            TokenKind::True => ParseNode::True,
            TokenKind::False => ParseNode::False,
            _ => return Err(self.unexpected(&token)),
        };
        Ok(node)
    }

    fn syntax(&self, message: String, line: u32) -> AnnotationsError {
        AnnotationsError::Syntax {
            message,
            file: self.file.to_string(),
            line,
        }
    }

    /// Remaining text on the line starting at `offset`.
    fn near(&self, offset: usize) -> &str {
        let rest = self.scanner.source().get(offset..).unwrap_or("");
        rest.split('\n').next().unwrap_or("").trim_end()
    }

    fn unexpected(&self, token: &Token) -> AnnotationsError {
        if token.kind == TokenKind::Eof {
            return self.syntax("Syntax error, unexpected EOF".to_string(), token.line);
        }
        let message = format!(
            "Syntax error, unexpected token '{}', near to '{}'",
            token.text,
            self.near(token.offset)
        );
        self.syntax(message, token.line)
    }

    fn scan_error(&self, error: ScanError) -> AnnotationsError {
        let message = format!("Scanning error before '{}'", self.near(error.offset));
        self.syntax(message, error.line)
    }
}
