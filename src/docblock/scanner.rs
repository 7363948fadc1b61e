//! Tokenizer for the annotation language.
//!
//! The scanner has two modes.  Between annotations it skips free text
//! and only stops at an `@` that opens an annotation (see
//! [`Scanner::seek_annotation`]).  Inside an annotation it produces the
//! tokens of the argument grammar via [`Scanner::next_token`].

/// Token kinds of the argument grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    At,
    Identifier,
    Integer,
    Double,
    String,
    Null,
    True,
    False,
    ParenOpen,
    ParenClose,
    BracketOpen,
    BracketClose,
    BraceOpen,
    BraceClose,
    Comma,
    Equals,
    Colon,
    Eof,
}

#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Literal value (unquoted for strings) or the matched source text.
    pub text: String,
    pub line: u32,
    /// Byte offset of the token's first character.
    pub offset: usize,
}

/// A character the grammar has no token for, or an unterminated string.
#[derive(Debug)]
pub(crate) struct ScanError {
    pub offset: usize,
    pub line: u32,
}

pub(crate) struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    line: u32,
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'\\' || b >= 0x80
}

fn is_ident_char(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str, line: u32) -> Self {
        Scanner { src, pos: 0, line }
    }

    pub fn source(&self) -> &'a str {
        self.src
    }

    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    fn peek_byte(&self, ahead: usize) -> Option<u8> {
        self.bytes().get(self.pos + ahead).copied()
    }

    /// Move to `target`, counting the newlines skipped over.
    fn advance_to(&mut self, target: usize) {
        let skipped = &self.bytes()[self.pos..target];
        self.line += memchr::memchr_iter(b'\n', skipped).count() as u32;
        self.pos = target;
    }

    /// Skip free text up to the next `@` that starts an annotation.
    ///
    /// An `@` counts only at the start of the text or after whitespace,
    /// and only when an identifier follows, so e-mail addresses and
    /// inline `{@tags}` are ignored.  Returns `false` at end of input.
    pub fn seek_annotation(&mut self) -> bool {
        let bytes = self.bytes();
        while let Some(found) = memchr::memchr(b'@', &bytes[self.pos..]) {
            let at = self.pos + found;
            self.advance_to(at);

            let opens = (at == 0 || bytes[at - 1].is_ascii_whitespace())
                && bytes.get(at + 1).copied().is_some_and(is_ident_start);
            if opens {
                return true;
            }
            self.pos = at + 1;
        }
        self.advance_to(bytes.len());
        false
    }

    /// After an annotation name at the top level: is the next
    /// non-blank character on the same line an opening parenthesis?
    pub fn paren_follows_inline(&mut self) -> bool {
        while let Some(b' ' | b'\t' | b'\r') = self.peek_byte(0) {
            self.pos += 1;
        }
        self.peek_byte(0) == Some(b'(')
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek_byte(0) {
            if !b.is_ascii_whitespace() {
                break;
            }
            if b == b'\n' {
                self.line += 1;
            }
            self.pos += 1;
        }
    }

    pub fn next_token(&mut self) -> Result<Token, ScanError> {
        self.skip_whitespace();

        let start = self.pos;
        let line = self.line;
        let token = |kind, text: String| Token {
            kind,
            text,
            line,
            offset: start,
        };

        let Some(b) = self.peek_byte(0) else {
            return Ok(token(TokenKind::Eof, String::new()));
        };

        let punct = match b {
            b'@' => Some(TokenKind::At),
            b'(' => Some(TokenKind::ParenOpen),
            b')' => Some(TokenKind::ParenClose),
            b'[' => Some(TokenKind::BracketOpen),
            b']' => Some(TokenKind::BracketClose),
            b'{' => Some(TokenKind::BraceOpen),
            b'}' => Some(TokenKind::BraceClose),
            b',' => Some(TokenKind::Comma),
            b'=' => Some(TokenKind::Equals),
            b':' => Some(TokenKind::Colon),
            _ => None,
        };
        if let Some(kind) = punct {
            self.pos += 1;
            return Ok(token(kind, (b as char).to_string()));
        }

        match b {
            b'"' | b'\'' => {
                let text = self.scan_string(b)?;
                Ok(token(TokenKind::String, text))
            }
            b'-' | b'0'..=b'9' => {
                let kind = self.scan_number()?;
                Ok(token(kind, self.src[start..self.pos].to_string()))
            }
            b if is_ident_start(b) => {
                self.scan_identifier();
                let text = &self.src[start..self.pos];
                let kind = if text.eq_ignore_ascii_case("null") {
                    TokenKind::Null
                } else if text.eq_ignore_ascii_case("true") {
                    TokenKind::True
                } else if text.eq_ignore_ascii_case("false") {
                    TokenKind::False
                } else {
                    TokenKind::Identifier
                };
                Ok(token(kind, text.to_string()))
            }
            _ => Err(ScanError {
                offset: start,
                line,
            }),
        }
    }

    fn scan_identifier(&mut self) {
        loop {
            match self.peek_byte(0) {
                Some(b) if is_ident_char(b) => self.pos += 1,
                // `Foo::BAR` stays one identifier; a lone `:` separates.
                Some(b':')
                    if self.peek_byte(1) == Some(b':')
                        && self.peek_byte(2).is_some_and(is_ident_start) =>
                {
                    self.pos += 2;
                }
                _ => break,
            }
        }
    }

    fn scan_number(&mut self) -> Result<TokenKind, ScanError> {
        let error = ScanError {
            offset: self.pos,
            line: self.line,
        };
        if self.peek_byte(0) == Some(b'-') {
            self.pos += 1;
        }
        if !self.peek_byte(0).is_some_and(|b| b.is_ascii_digit()) {
            return Err(error);
        }
        while self.peek_byte(0).is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.peek_byte(0) == Some(b'.') && self.peek_byte(1).is_some_and(|b| b.is_ascii_digit())
        {
            self.pos += 1;
            while self.peek_byte(0).is_some_and(|b| b.is_ascii_digit()) {
                self.pos += 1;
            }
            return Ok(TokenKind::Double);
        }
        Ok(TokenKind::Integer)
    }

    /// Scan a quoted string; `\` escapes the quote and itself only.
    fn scan_string(&mut self, quote: u8) -> Result<String, ScanError> {
        let error = ScanError {
            offset: self.pos,
            line: self.line,
        };
        self.pos += 1;

        let mut buf = Vec::new();
        loop {
            let Some(b) = self.peek_byte(0) else {
                return Err(error);
            };
            match b {
                b'\\' if matches!(self.peek_byte(1), Some(n) if n == quote || n == b'\\') => {
                    buf.push(self.bytes()[self.pos + 1]);
                    self.pos += 2;
                }
                b if b == quote => {
                    self.pos += 1;
                    break;
                }
                b => {
                    if b == b'\n' {
                        self.line += 1;
                    }
                    buf.push(b);
                    self.pos += 1;
                }
            }
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
