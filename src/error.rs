//! Shared error type for the whole pipeline.
//!
//! Text-facing failures (lexing and parsing) point at the offending byte with
//! a caret under a quoted copy of the source. Binary-facing failures carry the
//! byte offset at which the decoder gave up.

use std::fmt;

use snafu::Snafu;

pub type EquResult<T> = Result<T, EquError>;

#[derive(Debug, Snafu)]
pub enum EquError {
  #[snafu(display("lex error\n{expr_line}\n{marker} {message}"))]
  Lex {
    expr_line: String,
    marker: String,
    message: String,
  },
  #[snafu(display("syntax error\n{expr_line}\n{marker} {message}"))]
  Syntax {
    expr_line: String,
    marker: String,
    message: String,
  },
  #[snafu(display("format error at byte {offset}: {kind}"))]
  Format { offset: usize, kind: FormatErrorKind },
  #[snafu(display("invalid sample range: {message}"))]
  SampleRange { message: String },
}

/// Coarse classification of [`EquError`], for callers that only branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Lex,
  Syntax,
  Format,
  SampleRange,
}

/// What exactly was wrong with a binary buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatErrorKind {
  InvalidOpcode(u8),
  Truncated { needed: usize, available: usize },
  ActionTooLong(usize),
  BadMagic,
  UnsupportedVersion(u8),
  TooManyEquations(usize),
  TrailingBytes(usize),
}

impl fmt::Display for FormatErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::InvalidOpcode(op) => write!(f, "invalid opcode {op:#04x}"),
      Self::Truncated { needed, available } => {
        write!(f, "truncated input: needed {needed} bytes, {available} available")
      }
      Self::ActionTooLong(len) => {
        write!(f, "serialized action is {len} bytes, limit is {}", u16::MAX)
      }
      Self::BadMagic => write!(f, "missing equation file signature"),
      Self::UnsupportedVersion(v) => write!(f, "unsupported format version {v}"),
      Self::TooManyEquations(n) => write!(f, "{n} equations do not fit in one file"),
      Self::TrailingBytes(n) => write!(f, "{n} unexpected bytes after the last equation"),
    }
  }
}

impl EquError {
  /// Lexing failure anchored at a byte offset in the source.
  pub fn lex_at(expr: &str, loc: usize, message: impl Into<String>) -> Self {
    let (expr_line, marker) = caret(expr, loc);
    Self::Lex {
      expr_line,
      marker,
      message: message.into(),
    }
  }

  /// Parsing failure anchored at a byte offset in the source.
  pub fn syntax_at(expr: &str, loc: usize, message: impl Into<String>) -> Self {
    let (expr_line, marker) = caret(expr, loc);
    Self::Syntax {
      expr_line,
      marker,
      message: message.into(),
    }
  }

  pub fn format_at(offset: usize, kind: FormatErrorKind) -> Self {
    Self::Format { offset, kind }
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Lex { .. } => ErrorKind::Lex,
      Self::Syntax { .. } => ErrorKind::Syntax,
      Self::Format { .. } => ErrorKind::Format,
      Self::SampleRange { .. } => ErrorKind::SampleRange,
    }
  }

  /// The binary failure detail, if this is a format error.
  pub fn format_kind(&self) -> Option<FormatErrorKind> {
    match self {
      Self::Format { kind, .. } => Some(*kind),
      _ => None,
    }
  }
}

fn caret(expr: &str, loc: usize) -> (String, String) {
  let expr_line = format!("'{expr}'");
  let safe_loc = loc.min(expr.len());
  let char_offset = expr[..safe_loc].chars().count() + 1; // account for opening quote
  let marker = format!("{}^", " ".repeat(char_offset));
  (expr_line, marker)
}
