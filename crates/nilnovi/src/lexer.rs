//! Lexical analysis: source text to a token sequence, plus the cursor the
//! parser consumes it through.
//!
//! [`Lexer::tokenize`] scans the whole source up front; [`TokenStream`] then
//! exposes the `is_*` / `accept_*` probe-and-consume surface the recursive
//! descent is written against. An `accept_*` call either advances past the
//! expected token or fails with a parse error reporting the expected and the
//! actual token at its source position.

use tracing::trace;

use crate::error::{Error, Result};
use crate::token::{Keyword, Symbol, Token, TokenKind};

/// Characters that lex as single-character punctuation tokens.
const PUNCTUATION: &[char] = &['(', ')', ',', ';', ':', '+', '-', '*', '/', '<', '>', '='];

pub struct Lexer;

impl Lexer {
    /// Tokenize NNP source text.
    ///
    /// Recognizes identifiers (`[A-Za-z][A-Za-z0-9_]*`, reserved words lex as
    /// keywords), decimal integers, the two-character symbols `:=` `<=` `>=`
    /// `/=`, single-character punctuation, and `--` comments running to end
    /// of line. Anything else is a lexical error.
    pub fn tokenize(source: &str) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        for (index, line) in source.lines().enumerate() {
            Self::tokenize_line(index + 1, line, &mut tokens)?;
        }
        trace!(count = tokens.len(), "tokenized source");
        Ok(tokens)
    }

    fn tokenize_line(line_no: usize, line: &str, tokens: &mut Vec<Token>) -> Result<()> {
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            let column = i + 1;

            if c.is_whitespace() {
                i += 1;
                continue;
            }

            // Comment to end of line.
            if c == '-' && chars.get(i + 1) == Some(&'-') {
                break;
            }

            if c.is_ascii_alphabetic() {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let kind = match Keyword::from_word(&word) {
                    Some(kw) => TokenKind::Keyword(kw),
                    None => TokenKind::Identifier(word),
                };
                tokens.push(Token::new(kind, line_no, column));
                continue;
            }

            if c.is_ascii_digit() {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let digits: String = chars[start..i].iter().collect();
                let value: i64 = digits.parse().map_err(|_| Error::Lexical {
                    line: line_no,
                    column,
                    message: format!("integer literal '{digits}' is out of range"),
                })?;
                tokens.push(Token::new(TokenKind::Integer(value), line_no, column));
                continue;
            }

            if PUNCTUATION.contains(&c) {
                let next_is_eq = chars.get(i + 1) == Some(&'=');
                let (kind, width) = match c {
                    ':' if next_is_eq => (TokenKind::Symbol(Symbol::Assign), 2),
                    '/' if next_is_eq => (TokenKind::Symbol(Symbol::Ne), 2),
                    '<' if next_is_eq => (TokenKind::Symbol(Symbol::Le), 2),
                    '>' if next_is_eq => (TokenKind::Symbol(Symbol::Ge), 2),
                    '<' => (TokenKind::Symbol(Symbol::Lt), 1),
                    '>' => (TokenKind::Symbol(Symbol::Gt), 1),
                    '=' => (TokenKind::Symbol(Symbol::Eq), 1),
                    other => (TokenKind::Character(other), 1),
                };
                tokens.push(Token::new(kind, line_no, column));
                i += width;
                continue;
            }

            return Err(Error::Lexical {
                line: line_no,
                column,
                message: format!("unrecognized character '{c}'"),
            });
        }
        Ok(())
    }
}

/// Cursor over a token sequence.
///
/// The `is_*` methods probe the current token without consuming it; the
/// `accept_*` methods consume it or fail. [`TokenStream::peek_kind`] gives
/// the parser the one extra token of lookahead it needs to tell a program
/// header from a callable declaration.
pub struct TokenStream {
    tokens: Vec<Token>,
    index: usize,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, index: 0 }
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    /// Kind of the token `offset` positions past the current one.
    pub fn peek_kind(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.index + offset).map(|t| &t.kind)
    }

    /// Source position of the current token, or of the last token when the
    /// stream is exhausted.
    pub fn here(&self) -> (usize, usize) {
        match self.current().or_else(|| self.tokens.last()) {
            Some(t) => (t.line, t.column),
            None => (1, 1),
        }
    }

    /// Lexeme text of the current token, or `"end of file"`.
    pub fn current_value(&self) -> String {
        match self.current() {
            Some(t) => t.kind.to_string(),
            None => "end of file".to_string(),
        }
    }

    pub fn is_keyword(&self, kw: Keyword) -> bool {
        matches!(self.current(), Some(t) if t.kind == TokenKind::Keyword(kw))
    }

    pub fn is_character(&self, c: char) -> bool {
        matches!(self.current(), Some(t) if t.kind == TokenKind::Character(c))
    }

    pub fn is_symbol(&self, s: Symbol) -> bool {
        matches!(self.current(), Some(t) if t.kind == TokenKind::Symbol(s))
    }

    pub fn is_identifier(&self) -> bool {
        matches!(self.current(), Some(t) if matches!(t.kind, TokenKind::Identifier(_)))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.current(), Some(t) if matches!(t.kind, TokenKind::Integer(_)))
    }

    fn expected(&self, expected: impl Into<String>) -> Error {
        let (line, column) = self.here();
        Error::Parse {
            line,
            column,
            expected: expected.into(),
            found: self.current_value(),
        }
    }

    /// A parse error at the current position, for callers that expected
    /// something no single `accept_*` call expresses.
    pub fn parse_error(&self, expected: impl Into<String>) -> Error {
        self.expected(expected)
    }

    pub fn accept_keyword(&mut self, kw: Keyword) -> Result<()> {
        if self.is_keyword(kw) {
            self.index += 1;
            Ok(())
        } else {
            Err(self.expected(format!("'{kw}'")))
        }
    }

    pub fn accept_character(&mut self, c: char) -> Result<()> {
        if self.is_character(c) {
            self.index += 1;
            Ok(())
        } else {
            Err(self.expected(format!("'{c}'")))
        }
    }

    pub fn accept_symbol(&mut self, s: Symbol) -> Result<()> {
        if self.is_symbol(s) {
            self.index += 1;
            Ok(())
        } else {
            Err(self.expected(format!("'{s}'")))
        }
    }

    /// Consume an identifier, returning its name and source position.
    pub fn accept_identifier(&mut self) -> Result<(String, usize, usize)> {
        match self.current() {
            Some(t) => {
                if let TokenKind::Identifier(name) = &t.kind {
                    let out = (name.clone(), t.line, t.column);
                    self.index += 1;
                    Ok(out)
                } else {
                    Err(self.expected("an identifier"))
                }
            }
            None => Err(self.expected("an identifier")),
        }
    }

    pub fn accept_integer(&mut self) -> Result<i64> {
        match self.current() {
            Some(t) => {
                if let TokenKind::Integer(value) = t.kind {
                    self.index += 1;
                    Ok(value)
                } else {
                    Err(self.expected("an integer"))
                }
            }
            None => Err(self.expected("an integer")),
        }
    }

    /// Fails unless every token has been consumed.
    pub fn accept_eof(&mut self) -> Result<()> {
        if self.current().is_none() {
            Ok(())
        } else {
            Err(self.expected("end of file"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_assignment_and_comparisons() {
        assert_eq!(
            kinds("x := 1; a <= b /= c < d"),
            vec![
                TokenKind::Identifier("x".into()),
                TokenKind::Symbol(Symbol::Assign),
                TokenKind::Integer(1),
                TokenKind::Character(';'),
                TokenKind::Identifier("a".into()),
                TokenKind::Symbol(Symbol::Le),
                TokenKind::Identifier("b".into()),
                TokenKind::Symbol(Symbol::Ne),
                TokenKind::Identifier("c".into()),
                TokenKind::Symbol(Symbol::Lt),
                TokenKind::Identifier("d".into()),
            ]
        );
    }

    #[test]
    fn colon_and_slash_stand_alone() {
        assert_eq!(
            kinds("i : integer / 2"),
            vec![
                TokenKind::Identifier("i".into()),
                TokenKind::Character(':'),
                TokenKind::Keyword(Keyword::Integer),
                TokenKind::Character('/'),
                TokenKind::Integer(2),
            ]
        );
    }

    #[test]
    fn keywords_are_not_identifiers() {
        assert_eq!(
            kinds("while whilst"),
            vec![
                TokenKind::Keyword(Keyword::While),
                TokenKind::Identifier("whilst".into()),
            ]
        );
    }

    #[test]
    fn comments_run_to_end_of_line() {
        assert_eq!(
            kinds("put(1); -- prints one\nput(2);"),
            kinds("put(1);\nput(2);")
        );
    }

    #[test]
    fn positions_are_one_based() {
        let tokens = Lexer::tokenize("ab\n  cd").unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (2, 3));
    }

    #[test]
    fn rejects_unknown_characters() {
        let err = Lexer::tokenize("x # y").unwrap_err();
        match err {
            Error::Lexical { line, column, .. } => {
                assert_eq!((line, column), (1, 3));
            }
            other => panic!("expected lexical error, got {other:?}"),
        }
    }

    #[test]
    fn token_texts_relex_to_the_same_sequence() {
        let source = "procedure main is i : integer; begin i := i + 1; put(i); end";
        let tokens = Lexer::tokenize(source).unwrap();
        let joined = tokens
            .iter()
            .map(|t| t.kind.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        let relexed: Vec<TokenKind> = kinds(&joined);
        let original: Vec<TokenKind> = tokens.into_iter().map(|t| t.kind).collect();
        assert_eq!(relexed, original);
    }

    #[test]
    fn accept_reports_expected_and_found() {
        let mut stream = TokenStream::new(Lexer::tokenize("begin").unwrap());
        let err = stream.accept_keyword(Keyword::End).unwrap_err();
        match err {
            Error::Parse {
                expected, found, ..
            } => {
                assert_eq!(expected, "'end'");
                assert_eq!(found, "begin");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn accept_eof_rejects_leftover_tokens() {
        let mut stream = TokenStream::new(Lexer::tokenize("end").unwrap());
        assert!(stream.accept_eof().is_err());
        stream.accept_keyword(Keyword::End).unwrap();
        stream.accept_eof().unwrap();
    }
}
