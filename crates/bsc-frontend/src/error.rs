//! Diagnostics. `ParseError`/`SemanticError` both carry the offending
//! `Token` and a message; `render` formats them as a `path(line):
//! error: ...` header, the source line, and a caret pointing at the
//! token.

use bsc_hir::Token;

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub token: Token,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct SemanticError {
    pub token: Token,
    pub message: String,
}

/// `path(line): error: <line text>\n<padding>^ <message>`. The line text
/// is found by scanning backward from the token's start to the previous
/// newline (or buffer start), skipping leading whitespace, then forward
/// to the next newline or end of buffer.
pub fn render(token: &Token, message: &str, source_path: &str, source: &str) -> String {
    let bytes = source.as_bytes();
    let mut line_start = token.start.min(bytes.len());
    while line_start != 0 && bytes[line_start - 1] != b'\n' {
        line_start -= 1;
    }
    while line_start < bytes.len() && bytes[line_start].is_ascii_whitespace() {
        line_start += 1;
    }
    let mut line_end = line_start;
    while line_end < bytes.len() && bytes[line_end] != b'\n' {
        line_end += 1;
    }
    let line_text = &source[line_start..line_end];

    let header = format!("{}({}): error: ", source_path, token.line);
    let offset = header.len() + token.start.saturating_sub(line_start);

    let mut out = String::new();
    out.push_str(&header);
    out.push_str(line_text);
    out.push('\n');
    for _ in 0..offset {
        out.push(' ');
    }
    out.push_str("^ ");
    out.push_str(message);
    out
}

impl ParseError {
    pub fn render(&self, source_path: &str, source: &str) -> String {
        render(&self.token, &self.message, source_path, source)
    }
}

impl SemanticError {
    pub fn render(&self, source_path: &str, source: &str) -> String {
        render(&self.token, &self.message, source_path, source)
    }
}

/// Everything `parse_source` can fail with: a syntactic problem (wrong
/// or missing token) or a semantic one (unresolved name, clashing
/// declaration, assigning to a non-lvalue, a value-less block used for
/// its value).
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Semantic(#[from] SemanticError),
}

impl CompileError {
    pub fn render(&self, source_path: &str, source: &str) -> String {
        match self {
            CompileError::Parse(e) => e.render(source_path, source),
            CompileError::Semantic(e) => e.render(source_path, source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bsc_hir::TokenKind;

    #[test]
    fn renders_caret_under_token_start() {
        let source = "let x;\nfoo\n";
        let token = Token {
            kind: TokenKind::Ident,
            start: 7,
            length: 3,
            line: 2,
        };
        let err = ParseError {
            token,
            message: "symbol doesn't exist in this scope".to_string(),
        };
        let rendered = err.render("test.bs", source);
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines[0], "test.bs(2): error: foo");
        assert!(lines[1].starts_with("                   ^"));
    }
}
