//! A one-token-lookahead lexer over the source buffer. Whitespace and
//! `//` line comments are skipped between tokens; keywords are
//! recognized by dispatching on an identifier's first byte.

use bsc_hir::{Token, TokenKind};

pub struct Lexer<'s> {
    source: &'s str,
    bytes: &'s [u8],
    pos: usize,
    line: usize,
    cache: Option<Token>,
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn keyword_kind(text: &str) -> Option<TokenKind> {
    match text {
        "if" => Some(TokenKind::KwIf),
        "else" => Some(TokenKind::KwElse),
        "while" => Some(TokenKind::KwWhile),
        "return" => Some(TokenKind::KwReturn),
        "let" => Some(TokenKind::KwLet),
        _ => None,
    }
}

impl<'s> Lexer<'s> {
    pub fn new(source: &'s str) -> Self {
        Lexer {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            cache: None,
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            while self.pos < self.bytes.len() && (self.bytes[self.pos] as char).is_whitespace() {
                if self.bytes[self.pos] == b'\n' {
                    self.line += 1;
                }
                self.pos += 1;
            }
            if self.pos + 1 < self.bytes.len()
                && self.bytes[self.pos] == b'/'
                && self.bytes[self.pos + 1] == b'/'
            {
                while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    fn scan(&mut self) -> Token {
        self.skip_trivia();

        let start = self.pos;
        let start_line = self.line;

        if start >= self.bytes.len() {
            return Token {
                kind: TokenKind::Eof,
                start,
                length: 0,
                line: start_line,
            };
        }

        let first = self.bytes[start];
        let kind = if first.is_ascii_digit() {
            self.pos += 1;
            while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
                self.pos += 1;
            }
            TokenKind::IntLiteral
        } else if is_ident_byte(first) {
            self.pos += 1;
            while self.pos < self.bytes.len() && is_ident_byte(self.bytes[self.pos]) {
                self.pos += 1;
            }
            keyword_kind(&self.source[start..self.pos]).unwrap_or(TokenKind::Ident)
        } else {
            self.pos += 1;
            TokenKind::Punct(first)
        };

        Token {
            kind,
            start,
            length: self.pos - start,
            line: start_line,
        }
    }

    /// The next token without consuming it.
    pub fn peek(&mut self) -> Token {
        if self.cache.is_none() {
            self.cache = Some(self.scan());
        }
        self.cache.unwrap()
    }

    /// Consume and return the next token.
    pub fn lex(&mut self) -> Token {
        match self.cache.take() {
            Some(tok) => tok,
            None => self.scan(),
        }
    }

    pub fn source_text(&self) -> &'s str {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        loop {
            let tok = lexer.lex();
            let done = tok.kind == TokenKind::Eof;
            out.push(tok.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn skips_whitespace_and_line_comments() {
        let toks = kinds("  // hello\n  42 ");
        assert_eq!(toks, vec![TokenKind::IntLiteral, TokenKind::Eof]);
    }

    #[test]
    fn recognizes_keywords_and_idents() {
        let toks = kinds("if iffy");
        assert_eq!(toks, vec![TokenKind::KwIf, TokenKind::Ident, TokenKind::Eof]);
    }

    #[test]
    fn tracks_line_numbers_across_newlines() {
        let mut lexer = Lexer::new("a\nb\nc");
        assert_eq!(lexer.lex().line, 1);
        assert_eq!(lexer.lex().line, 2);
        assert_eq!(lexer.lex().line, 3);
    }

    #[test]
    fn single_char_punctuation_is_its_own_token() {
        let toks = kinds("{}=;");
        assert_eq!(
            toks,
            vec![
                TokenKind::Punct(b'{'),
                TokenKind::Punct(b'}'),
                TokenKind::Punct(b'='),
                TokenKind::Punct(b';'),
                TokenKind::Eof,
            ]
        );
    }
}
