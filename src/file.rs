//! Whole-file container for equations.
//!
//! Layout: magic `7F 'E' 'Q' 'U'`, one version byte (always 0), one count
//! byte, then that many equation records back to back. Nothing may follow the
//! last record.

use rayon::prelude::*;

use crate::codec::Decoder;
use crate::equation::{self, Equation, Rgb};
use crate::error::{EquError, EquResult, FormatErrorKind};
use crate::sample::SampleRange;

pub const MAGIC: [u8; 4] = [0x7f, b'E', b'Q', b'U'];
pub const VERSION: u8 = 0;
pub const HEADER_LEN: usize = 6;
pub const MAX_EQUATIONS: usize = u8::MAX as usize;

/// Sampled points of one equation, tinted with its color.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
  pub color: Rgb,
  pub points: Vec<(f32, f32)>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EquationFile {
  pub equations: Vec<Equation>,
}

impl EquationFile {
  pub fn new(equations: Vec<Equation>) -> Self {
    Self { equations }
  }

  /// Compile every `(color, expression)` pair. The first failing expression
  /// aborts the whole file.
  pub fn from_sources<C, S>(sources: impl IntoIterator<Item = (C, S)>) -> EquResult<Self>
  where
    C: Into<Rgb>,
    S: AsRef<str>,
  {
    let equations = sources
      .into_iter()
      .map(|(color, expr)| Equation::from_source(color, expr.as_ref()))
      .collect::<EquResult<Vec<_>>>()?;
    Ok(Self::new(equations))
  }

  #[tracing::instrument(skip(self), fields(equations = self.equations.len()))]
  pub fn encode(&self) -> EquResult<Vec<u8>> {
    let count = u8::try_from(self.equations.len()).map_err(|_| {
      EquError::format_at(
        HEADER_LEN - 1,
        FormatErrorKind::TooManyEquations(self.equations.len()),
      )
    })?;

    let mut buf = Vec::with_capacity(HEADER_LEN);
    buf.extend_from_slice(&MAGIC);
    buf.push(VERSION);
    buf.push(count);
    for eq in &self.equations {
      let at = buf.len();
      let record = eq.serialize().map_err(|err| equation::shift(err, at))?;
      buf.extend_from_slice(&record);
    }

    tracing::debug!(bytes = buf.len(), "encoded equation file");
    Ok(buf)
  }

  /// Decode a complete file. The header is checked before any record is
  /// touched, and leftover bytes after the last record reject the file.
  #[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
  pub fn decode(bytes: &[u8]) -> EquResult<Self> {
    let mut decoder = Decoder::new(bytes);
    let magic = decoder.read_array::<4>()?;
    if magic != MAGIC {
      return Err(EquError::format_at(0, FormatErrorKind::BadMagic));
    }
    let version = decoder.read_u8()?;
    if version != VERSION {
      return Err(EquError::format_at(
        4,
        FormatErrorKind::UnsupportedVersion(version),
      ));
    }
    let count = usize::from(decoder.read_u8()?);

    let mut rest = decoder.rest();
    let mut equations = Vec::with_capacity(count);
    for index in 0..count {
      let at = bytes.len() - rest.len();
      let (eq, tail) = Equation::decode(rest).map_err(|err| equation::shift(err, at))?;
      tracing::debug!(index, offset = at, "decoded equation record");
      equations.push(eq);
      rest = tail;
    }

    if !rest.is_empty() {
      return Err(EquError::format_at(
        bytes.len() - rest.len(),
        FormatErrorKind::TrailingBytes(rest.len()),
      ));
    }

    Ok(Self::new(equations))
  }

  /// Sample every equation over `range`, one curve per equation in file
  /// order. Equations are evaluated in parallel.
  #[tracing::instrument(skip(self), fields(equations = self.equations.len()))]
  pub fn sample(&self, range: &SampleRange) -> Vec<Curve> {
    let xs = range.points();
    self
      .equations
      .par_iter()
      .map(|eq| Curve {
        color: eq.color,
        points: eq.sample_at(&xs),
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::action::Action;
  use crate::error::ErrorKind;

  fn sample_file() -> EquationFile {
    EquationFile::from_sources([((255, 0, 0), "x"), ((0, 128, 255), "2 * x + 1")]).unwrap()
  }

  #[test]
  fn header_layout() {
    let bytes = EquationFile::default().encode().unwrap();
    assert_eq!(bytes, [0x7f, b'E', b'Q', b'U', 0, 0]);
  }

  #[test]
  fn round_trips_equations_in_order() {
    let file = sample_file();
    let decoded = EquationFile::decode(&file.encode().unwrap()).unwrap();
    assert_eq!(decoded, file);
  }

  #[test]
  fn rejects_bad_magic_before_records() {
    let mut bytes = sample_file().encode().unwrap();
    bytes[0] = b'E';
    // Corrupt the first record too; the magic check must fire first.
    bytes[HEADER_LEN + 5] = 0xff;
    let err = EquationFile::decode(&bytes).unwrap_err();
    assert_eq!(err.format_kind(), Some(FormatErrorKind::BadMagic));
  }

  #[test]
  fn rejects_unknown_version() {
    let mut bytes = sample_file().encode().unwrap();
    bytes[4] = 1;
    let err = EquationFile::decode(&bytes).unwrap_err();
    assert_eq!(err.format_kind(), Some(FormatErrorKind::UnsupportedVersion(1)));
  }

  #[test]
  fn rejects_trailing_bytes() {
    let mut bytes = sample_file().encode().unwrap();
    let end = bytes.len();
    bytes.extend_from_slice(&[0, 0]);
    let err = EquationFile::decode(&bytes).unwrap_err();
    assert!(matches!(
      err,
      EquError::Format {
        offset,
        kind: FormatErrorKind::TrailingBytes(2)
      } if offset == end
    ));
  }

  #[test]
  fn rejects_missing_records() {
    let mut bytes = sample_file().encode().unwrap();
    bytes[5] = 3;
    let err = EquationFile::decode(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
    assert!(matches!(
      err.format_kind(),
      Some(FormatErrorKind::Truncated { .. })
    ));
  }

  #[test]
  fn rejects_short_header() {
    let err = EquationFile::decode(&[0x7f, b'E']).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
  }

  #[test]
  fn record_errors_are_reported_at_file_offsets() {
    // One record declaring a 1-byte action holding an invalid opcode.
    let bytes = [0x7f, b'E', b'Q', b'U', 0, 1, 1, 0, 0, 0, 0, 9];
    let err = EquationFile::decode(&bytes).unwrap_err();
    assert!(matches!(
      err,
      EquError::Format {
        offset: 11,
        kind: FormatErrorKind::InvalidOpcode(9)
      }
    ));
  }

  #[test]
  fn refuses_more_than_255_equations() {
    let file = EquationFile::new(vec![
      Equation::new(Rgb::default(), Action::variable());
      MAX_EQUATIONS + 1
    ]);
    let err = file.encode().unwrap_err();
    assert_eq!(
      err.format_kind(),
      Some(FormatErrorKind::TooManyEquations(256))
    );
  }

  #[test]
  fn samples_each_equation_in_order() {
    let range = SampleRange::new(0.0, 2.0, 1.0).unwrap();
    let curves = sample_file().sample(&range);
    assert_eq!(curves.len(), 2);
    assert_eq!(curves[0].color, Rgb::new(255, 0, 0));
    assert_eq!(curves[0].points, [(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
    assert_eq!(curves[1].points, [(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)]);
  }
}
