//! Lexical analysis: turns a formula string into a vector of tokens.
//!
//! The tokenizer knows nothing about syntax. Numeric runs (digits and `.`)
//! are kept as text so that malformed literals like `1.2.3` surface later as
//! syntax errors rather than lexing ones.

use crate::error::{EquError, EquResult};

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  /// One of `+ - * / ^ ( )`.
  Punctuator,
  /// The free variable `x`.
  Ident,
  Num,
}

/// Location of a lexeme in the source; the text is recovered with [`token_text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub loc: usize,
  pub len: usize,
}

impl Token {
  pub fn new(kind: TokenKind, loc: usize, len: usize) -> Self {
    Self { kind, loc, len }
  }
}

/// Lex the input into a flat vector of tokens, in source order.
pub fn tokenize(input: &str) -> EquResult<Vec<Token>> {
  let mut tokens = Vec::new();
  // Start offset of the numeric run being accumulated, if any.
  let mut pending: Option<usize> = None;

  for (i, c) in input.char_indices() {
    if c.is_ascii_digit() || c == '.' {
      pending.get_or_insert(i);
      continue;
    }

    if let Some(start) = pending.take() {
      tokens.push(Token::new(TokenKind::Num, start, i - start));
    }

    if c.is_whitespace() {
      continue;
    }

    if c == 'x' {
      tokens.push(Token::new(TokenKind::Ident, i, 1));
      continue;
    }

    if matches!(c, '+' | '-' | '*' | '/' | '^' | '(' | ')') {
      tokens.push(Token::new(TokenKind::Punctuator, i, 1));
      continue;
    }

    let message = if c.is_alphabetic() {
      format!("unknown identifier '{c}', only 'x' is allowed")
    } else {
      format!("invalid token: '{c}'")
    };
    return Err(EquError::lex_at(input, i, message));
  }

  if let Some(start) = pending {
    tokens.push(Token::new(TokenKind::Num, start, input.len() - start));
  }

  tracing::trace!(count = tokens.len(), "tokenized expression");
  Ok(tokens)
}

/// Return the slice from the source that produced this token.
pub fn token_text<'a>(token: &Token, source: &'a str) -> &'a str {
  let end = token.loc + token.len;
  &source[token.loc..end]
}

/// Human-friendly description used in diagnostics.
pub fn describe_token(token: Option<&Token>, source: &str) -> String {
  match token {
    Some(t) => token_text(t, source).to_string(),
    None => "end of input".to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ErrorKind;

  fn texts(source: &str) -> Vec<&str> {
    tokenize(source)
      .unwrap()
      .iter()
      .map(|t| token_text(t, source))
      .collect()
  }

  #[test]
  fn splits_symbols_and_numbers() {
    assert_eq!(texts("2*(x+10.5)^3"), ["2", "*", "(", "x", "+", "10.5", ")", "^", "3"]);
  }

  #[test]
  fn whitespace_is_insignificant_but_separates_numbers() {
    assert_eq!(texts("  12   34\t"), ["12", "34"]);
  }

  #[test]
  fn keeps_malformed_numeric_runs_whole() {
    let tokens = tokenize("1.2.3").unwrap();
    assert_eq!(tokens, [Token::new(TokenKind::Num, 0, 5)]);
  }

  #[test]
  fn classifies_tokens() {
    let kinds: Vec<_> = tokenize("x - 1").unwrap().iter().map(|t| t.kind).collect();
    assert_eq!(kinds, [TokenKind::Ident, TokenKind::Punctuator, TokenKind::Num]);
  }

  #[test]
  fn any_unicode_whitespace_separates_tokens() {
    assert_eq!(texts("1\u{a0}2\x0b+\u{2003}x\r\n"), ["1", "2", "+", "x"]);
  }

  #[test]
  fn empty_source_has_no_tokens() {
    assert!(tokenize("   ").unwrap().is_empty());
  }

  #[test]
  fn rejects_unknown_characters() {
    let err = tokenize("2 & 3").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Lex);
    assert!(err.to_string().contains("invalid token: '&'"));

    let err = tokenize("y + 1").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Lex);
  }

  #[test]
  fn rejects_non_ascii_without_panicking() {
    let err = tokenize("2 × 3").unwrap_err();
    assert!(err.to_string().contains("'×'"));
  }
}
