//! The lexical position `bs` carries on every HIR node and every
//! diagnostic: which kind of lexeme it was, where it starts in the
//! source buffer, and which source line it's on. `bsc-frontend`'s lexer
//! produces these; `bsc-hir` only needs to carry and display them.

/// Lexeme categories: ASCII punctuation is its own kind (`'{'`, `'='`,
/// ...), keywords and multi-character lexemes get their own variants.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TokenKind {
    Eof,
    Ident,
    IntLiteral,
    KwIf,
    KwElse,
    KwWhile,
    KwReturn,
    KwLet,
    /// A single-byte ASCII punctuation lexeme, e.g. `{`, `}`, `=`, `+`.
    Punct(u8),
}

impl TokenKind {
    pub fn describe(self) -> String {
        match self {
            TokenKind::Eof => "end of file".to_string(),
            TokenKind::Ident => "identifier".to_string(),
            TokenKind::IntLiteral => "integer literal".to_string(),
            TokenKind::KwIf => "'if'".to_string(),
            TokenKind::KwElse => "'else'".to_string(),
            TokenKind::KwWhile => "'while'".to_string(),
            TokenKind::KwReturn => "'return'".to_string(),
            TokenKind::KwLet => "'let'".to_string(),
            TokenKind::Punct(b) => format!("'{}'", b as char),
        }
    }
}

/// A lexeme's kind, source span, and line. `line` is 1-based; line `0` is
/// reserved for synthetic tokens with no source position (command-line
/// or generated diagnostics), matching `cranelift-reader`'s `Location`
/// convention.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub length: usize,
    pub line: usize,
}

impl Token {
    pub fn synthetic() -> Self {
        Token {
            kind: TokenKind::Eof,
            start: 0,
            length: 0,
            line: 0,
        }
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.start + self.length]
    }
}
