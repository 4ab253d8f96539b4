use crate::compiler::error::CompilerError;
use logos::{Lexer, Logos};
use std::fmt;
use std::ops::Range;

/// A token with its byte span in the (comment-stripped) source.
pub type SpannedToken = (Token, Range<usize>);

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Period,

    /// Keywords, field names, logical file names and aliases; hyphens are
    /// part of the word (`READ-ITEM`, `PRODUCT-NO`, `FILE-A`). Normalized
    /// to uppercase.
    #[regex(r"[A-Za-z][A-Za-z0-9-]*", uppercase_word)]
    Word(String),

    #[regex(r"-?[0-9]+\.[0-9]+", allocated_string)]
    DecimalLiteral(String),

    #[regex(r"-?[0-9]+", allocated_string)]
    IntegerLiteral(String),

    /// Double-quoted text; a doubled quote stands for a literal quote.
    #[regex(r#""(?:[^"]|"")*""#, text_content)]
    TextLiteral(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::Semicolon => write!(f, ";"),
            Token::Comma => write!(f, ","),
            Token::Period => write!(f, "."),
            Token::Word(w) => write!(f, "{w}"),
            Token::DecimalLiteral(s) | Token::IntegerLiteral(s) => write!(f, "{s}"),
            Token::TextLiteral(s) => write!(f, "\"{s}\""),
        }
    }
}

fn uppercase_word(lex: &mut Lexer<Token>) -> String {
    lex.slice().to_uppercase()
}

fn allocated_string(lex: &mut Lexer<Token>) -> String {
    lex.slice().to_owned()
}

fn text_content(lex: &mut Lexer<Token>) -> String {
    let slice = lex.slice();
    slice[1..slice.len() - 1].replace("\"\"", "\"")
}

/// Tokenizes comment-stripped source. Fails with a SYNTAX error on any
/// character no token pattern covers.
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, CompilerError> {
    let mut tokens = Vec::new();
    for (result, span) in Token::lexer(source).spanned() {
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                let fragment = &source[span.start..source.len().min(span.end)];
                return Err(CompilerError::syntax(
                    source,
                    span.start,
                    format!("unexpected character {fragment:?}"),
                ));
            }
        }
    }
    Ok(tokens)
}
