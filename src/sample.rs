//! Sampling equations over a numeric range.

use crate::equation::Equation;
use crate::error::{EquError, EquResult};

/// Inclusive range of sample points: `start`, `start + step`, ... up to `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRange {
  start: f64,
  end: f64,
  step: f64,
}

impl SampleRange {
  pub fn new(start: f64, end: f64, step: f64) -> EquResult<Self> {
    if !(start.is_finite() && end.is_finite() && step.is_finite()) {
      return Err(invalid(format!(
        "bounds and step must be finite (start={start}, end={end}, step={step})"
      )));
    }
    if step <= 0.0 {
      return Err(invalid(format!("step must be positive, got {step}")));
    }
    if start > end {
      return Err(invalid(format!("start {start} is after end {end}")));
    }
    Ok(Self { start, end, step })
  }

  pub fn start(&self) -> f64 {
    self.start
  }

  pub fn end(&self) -> f64 {
    self.end
  }

  pub fn step(&self) -> f64 {
    self.step
  }

  /// Sample points, accumulated by repeated addition in `f64`.
  pub fn points(&self) -> Vec<f32> {
    let mut xs = Vec::new();
    let mut x = self.start;
    while x <= self.end {
      xs.push(x as f32);
      let next = x + self.step;
      if next == x {
        // Step too small to make progress at this magnitude.
        break;
      }
      x = next;
    }
    xs
  }
}

fn invalid(message: String) -> EquError {
  EquError::SampleRange { message }
}

impl Equation {
  /// Evaluate at every point of `range`, as `(x, y)` pairs.
  pub fn sample(&self, range: &SampleRange) -> Vec<(f32, f32)> {
    self.sample_at(&range.points())
  }

  pub fn sample_at(&self, xs: &[f32]) -> Vec<(f32, f32)> {
    xs.iter().map(|&x| (x, self.evaluate(x))).collect()
  }
}
