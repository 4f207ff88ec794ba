//! Color-tagged equation records.
//!
//! Record layout: `u16` little-endian action length, three color bytes
//! (red, green, blue), then the encoded action.

use crate::action::Action;
use crate::codec::{self, Decoder};
use crate::error::{EquError, EquResult, FormatErrorKind};

/// Bytes preceding the action in a record.
pub const RECORD_HEADER_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
  pub r: u8,
  pub g: u8,
  pub b: u8,
}

impl Rgb {
  pub const fn new(r: u8, g: u8, b: u8) -> Self {
    Self { r, g, b }
  }

  /// Channels scaled to `[0, 1]`.
  pub fn to_unit(self) -> [f32; 3] {
    [self.r, self.g, self.b].map(|c| f32::from(c) / 255.0)
  }
}

impl From<(u8, u8, u8)> for Rgb {
  fn from((r, g, b): (u8, u8, u8)) -> Self {
    Self { r, g, b }
  }
}

impl From<Rgb> for (u8, u8, u8) {
  fn from(color: Rgb) -> Self {
    (color.r, color.g, color.b)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
  pub color: Rgb,
  pub action: Action,
}

impl Equation {
  pub fn new(color: impl Into<Rgb>, action: Action) -> Self {
    Self {
      color: color.into(),
      action,
    }
  }

  /// Compile `expr` and tag it with `color`.
  pub fn from_source(color: impl Into<Rgb>, expr: &str) -> EquResult<Self> {
    Ok(Self::new(color, crate::compile(expr)?))
  }

  pub fn evaluate(&self, x: f32) -> f32 {
    self.action.evaluate(x)
  }

  /// Encode as one record. Fails if the action does not fit the 16-bit
  /// length field.
  pub fn serialize(&self) -> EquResult<Vec<u8>> {
    let action_len = self.action.encoded_len();
    let len = u16::try_from(action_len)
      .map_err(|_| EquError::format_at(0, FormatErrorKind::ActionTooLong(action_len)))?;

    let mut buf = Vec::with_capacity(RECORD_HEADER_LEN + action_len);
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(&[self.color.r, self.color.g, self.color.b]);
    buf.extend_from_slice(&codec::serialize(&self.action));
    Ok(buf)
  }

  /// Decode one record from the front of `bytes` and return the bytes after
  /// it. The cursor always advances by the stored length, even if the action
  /// ends before the end of its window.
  pub fn decode(bytes: &[u8]) -> EquResult<(Self, &[u8])> {
    let mut decoder = Decoder::new(bytes);
    let len = usize::from(u16::from_le_bytes(decoder.read_array::<2>()?));
    let [r, g, b] = decoder.read_array::<3>()?;
    let window = decoder.read_bytes(len)?;

    let (action, slack) = codec::decode(window).map_err(|err| shift(err, RECORD_HEADER_LEN))?;
    if !slack.is_empty() {
      tracing::debug!(
        declared = len,
        unused = slack.len(),
        "equation action ended before its declared length"
      );
    }

    Ok((Self::new(Rgb::new(r, g, b), action), decoder.rest()))
  }
}

/// Rebase a format error's offset onto an enclosing buffer.
pub(crate) fn shift(err: EquError, by: usize) -> EquError {
  match err {
    EquError::Format { offset, kind } => EquError::format_at(offset + by, kind),
    other => other,
  }
}
