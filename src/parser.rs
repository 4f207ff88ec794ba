//! Recursive-descent parser producing an [`Action`] tree.
//!
//! One helper per precedence level, lowest first. Each binary level folds its
//! operands iteratively, so every operator (`^` included) is left-associative:
//! `2 ^ 3 ^ 2` is `(2 ^ 3) ^ 2`.

use crate::action::{Action, BinaryOp};
use crate::error::{EquError, EquResult};
use crate::tokenizer::{Token, TokenKind, describe_token, token_text};

/// Deepest allowed chain of parentheses and unary minus. These are the only
/// constructs the parser recurses on; the binary levels fold in loops and
/// are unbounded.
pub const MAX_NESTING: usize = 64;

/// Parse a complete expression; leftover tokens are an error.
pub fn parse(tokens: Vec<Token>, source: &str) -> EquResult<Action> {
  let mut stream = TokenStream::new(tokens, source);

  let action = parse_sum(&mut stream)?;

  if let Some(token) = stream.peek() {
    let got = describe_token(Some(token), source);
    return Err(EquError::syntax_at(
      source,
      token.loc,
      format!("unexpected token \"{got}\" after expression"),
    ));
  }

  Ok(action)
}

fn parse_sum(stream: &mut TokenStream) -> EquResult<Action> {
  let mut node = parse_mul(stream)?;

  loop {
    let op = match stream.peek_punctuator() {
      Some("+") => BinaryOp::Add,
      Some("-") => BinaryOp::Sub,
      _ => break,
    };

    stream.advance();
    let rhs = parse_mul(stream)?;
    node = Action::binary(op, node, rhs);
  }

  Ok(node)
}

fn parse_mul(stream: &mut TokenStream) -> EquResult<Action> {
  let mut node = parse_power(stream)?;

  loop {
    let op = match stream.peek_punctuator() {
      Some("*") => BinaryOp::Mul,
      Some("/") => BinaryOp::Div,
      _ => break,
    };

    stream.advance();
    let rhs = parse_power(stream)?;
    node = Action::binary(op, node, rhs);
  }

  Ok(node)
}

fn parse_power(stream: &mut TokenStream) -> EquResult<Action> {
  let mut node = parse_unary(stream)?;

  while stream.equal("^") {
    let rhs = parse_unary(stream)?;
    node = Action::binary(BinaryOp::Pow, node, rhs);
  }

  Ok(node)
}

fn parse_unary(stream: &mut TokenStream) -> EquResult<Action> {
  let loc = stream.loc();
  if stream.equal("-") {
    // The operand extends over a whole power chain: -x^2 is -(x^2).
    stream.enter(loc)?;
    let operand = parse_power(stream)?;
    stream.leave();
    return Ok(Action::negate(operand));
  }

  parse_atom(stream)
}

fn parse_atom(stream: &mut TokenStream) -> EquResult<Action> {
  let loc = stream.loc();
  if stream.equal("(") {
    stream.enter(loc)?;
    let node = parse_sum(stream)?;
    stream.skip(")")?;
    stream.leave();
    return Ok(node);
  }

  let Some(token) = stream.peek() else {
    return Err(EquError::syntax_at(
      stream.source,
      stream.source.len(),
      "expected an expression, but reached end of input",
    ));
  };

  match token.kind {
    TokenKind::Ident => {
      stream.advance();
      Ok(Action::variable())
    }
    TokenKind::Num => {
      let value = stream.get_number()?;
      Ok(Action::constant(value))
    }
    TokenKind::Punctuator => {
      let got = describe_token(Some(token), stream.source);
      Err(EquError::syntax_at(
        stream.source,
        token.loc,
        format!("expected an expression, but got \"{got}\""),
      ))
    }
  }
}

/// Lightweight cursor over the token vector.
struct TokenStream<'a> {
  tokens: Vec<Token>,
  source: &'a str,
  pos: usize,
  depth: usize,
}

impl<'a> TokenStream<'a> {
  fn new(tokens: Vec<Token>, source: &'a str) -> Self {
    Self {
      tokens,
      source,
      pos: 0,
      depth: 0,
    }
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  fn peek_punctuator(&self) -> Option<&'a str> {
    self
      .peek()
      .filter(|token| token.kind == TokenKind::Punctuator)
      .map(|token| token_text(token, self.source))
  }

  /// Byte offset of the current token, or the end of the source.
  fn loc(&self) -> usize {
    self.peek().map_or(self.source.len(), |token| token.loc)
  }

  fn advance(&mut self) {
    self.pos += 1;
  }

  /// Consume the current token if it is the given punctuator.
  fn equal(&mut self, op: &str) -> bool {
    if self.peek_punctuator() == Some(op) {
      self.pos += 1;
      return true;
    }
    false
  }

  fn skip(&mut self, s: &str) -> EquResult<()> {
    if self.equal(s) {
      Ok(())
    } else {
      let got = describe_token(self.peek(), self.source);
      Err(EquError::syntax_at(
        self.source,
        self.loc(),
        format!("expected \"{s}\", but got \"{got}\""),
      ))
    }
  }

  /// Convert the current numeric token to `f32` and consume it.
  fn get_number(&mut self) -> EquResult<f32> {
    let Some(token) = self.peek() else {
      return Err(EquError::syntax_at(
        self.source,
        self.source.len(),
        "expected a number, but reached end of input",
      ));
    };
    let text = token_text(token, self.source);
    let value = text.parse::<f32>().map_err(|err| {
      EquError::syntax_at(
        self.source,
        token.loc,
        format!("invalid number \"{text}\": {err}"),
      )
    })?;
    self.pos += 1;
    Ok(value)
  }

  fn enter(&mut self, loc: usize) -> EquResult<()> {
    self.depth += 1;
    if self.depth > MAX_NESTING {
      return Err(EquError::syntax_at(
        self.source,
        loc,
        format!("expression nested deeper than {MAX_NESTING} levels"),
      ));
    }
    Ok(())
  }

  fn leave(&mut self) {
    self.depth -= 1;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ErrorKind;
  use crate::tokenizer::tokenize;

  fn compile(source: &str) -> EquResult<Action> {
    parse(tokenize(source)?, source)
  }

  fn eval(source: &str, x: f32) -> f32 {
    compile(source).unwrap().evaluate(x)
  }

  fn syntax_error(source: &str) -> String {
    let err = compile(source).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax, "{source}: {err}");
    err.to_string()
  }

  #[test]
  fn multiplication_binds_tighter_than_addition() {
    assert_eq!(eval("2 + 3 * 4", 0.0), 14.0);
    assert_eq!(eval("2 + 3 * 4", 100.0), 14.0);
  }

  #[test]
  fn power_chains_fold_left() {
    assert_eq!(eval("2 ^ 3 ^ 2", 0.0), 64.0);
    assert_eq!(compile("x^2^3").unwrap().to_string(), "((x ^ 2) ^ 3)");
  }

  #[test]
  fn subtraction_and_division_fold_left() {
    assert_eq!(eval("10 - 2 - 3", 0.0), 5.0);
    assert_eq!(eval("64 / 4 / 2", 0.0), 8.0);
  }

  #[test]
  fn unary_minus_covers_the_power_chain() {
    assert_eq!(eval("-x^2", 3.0), -9.0);
    assert_eq!(eval("(-x)^2", 3.0), 9.0);
    assert_eq!(eval("2^-1", 0.0), 0.5);
    assert_eq!(eval("--x", 4.0), 4.0);
    assert_eq!(eval("-2 * 3", 0.0), -6.0);
  }

  #[test]
  fn unary_minus_desugars_to_subtraction() {
    assert_eq!(
      compile("-x").unwrap(),
      Action::binary(BinaryOp::Sub, Action::constant(0.0), Action::variable())
    );
  }

  #[test]
  fn parentheses_override_precedence() {
    assert_eq!(eval("(1 + 2) * 3", 0.0), 9.0);
    assert_eq!(eval("((x))", 7.0), 7.0);
  }

  #[test]
  fn decimal_literals() {
    assert_eq!(eval("1.5 * x + .5", 2.0), 3.5);
    assert_eq!(eval("2.", 0.0), 2.0);
  }

  #[test]
  fn rejects_missing_operand() {
    assert!(syntax_error("2 +").contains("reached end of input"));
    assert!(syntax_error("").contains("reached end of input"));
    assert!(syntax_error("* 2").contains("got \"*\""));
  }

  #[test]
  fn rejects_unbalanced_parentheses() {
    assert!(syntax_error("(1 + 2").contains("expected \")\""));
    assert!(syntax_error("1 + 2)").contains("unexpected token \")\""));
    assert!(syntax_error("()").contains("got \")\""));
  }

  #[test]
  fn rejects_trailing_tokens() {
    assert!(syntax_error("2 x").contains("unexpected token \"x\""));
    assert!(syntax_error("1 2").contains("unexpected token \"2\""));
  }

  #[test]
  fn rejects_malformed_literals() {
    assert!(syntax_error("1.2.3 + x").contains("invalid number \"1.2.3\""));
    assert!(syntax_error(".").contains("invalid number"));
  }

  #[test]
  fn rejects_runaway_nesting() {
    let deep = format!("{}x{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
    assert!(syntax_error(&deep).contains("nested deeper"));

    let ok = format!("{}x{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
    assert_eq!(eval(&ok, 1.0), 1.0);

    let negations = format!("{}x", "-".repeat(MAX_NESTING + 1));
    assert!(syntax_error(&negations).contains("nested deeper"));
  }

  #[test]
  fn long_operator_chains_are_not_nesting() {
    let chain = format!("x{}", " + x".repeat(3000));
    let action = compile(&chain).unwrap();
    assert_eq!(action.depth(), 3001);
    assert_eq!(action.evaluate(2.0), 6002.0);
  }
}
