//! Binary encoding of [`Action`] trees.
//!
//! Pre-order, one opcode byte per node, little-endian payloads, no lengths or
//! separators between nodes:
//!
//! | opcode | node     | payload                    |
//! |--------|----------|----------------------------|
//! | 0      | Variable | none                       |
//! | 1      | Constant | 4-byte `f32`               |
//! | 2..=6  | Binary   | left child, then right child |

use crate::action::{Action, BinaryOp, Node};
use crate::error::{EquError, EquResult, FormatErrorKind};

pub const OP_VARIABLE: u8 = 0;
pub const OP_CONSTANT: u8 = 1;

impl BinaryOp {
  pub fn opcode(self) -> u8 {
    match self {
      BinaryOp::Add => 2,
      BinaryOp::Sub => 3,
      BinaryOp::Mul => 4,
      BinaryOp::Div => 5,
      BinaryOp::Pow => 6,
    }
  }

  pub fn from_opcode(opcode: u8) -> Option<Self> {
    match opcode {
      2 => Some(BinaryOp::Add),
      3 => Some(BinaryOp::Sub),
      4 => Some(BinaryOp::Mul),
      5 => Some(BinaryOp::Div),
      6 => Some(BinaryOp::Pow),
      _ => None,
    }
  }
}

/// Encode a tree. The output is exactly [`Action::encoded_len`] bytes.
pub fn serialize(action: &Action) -> Vec<u8> {
  let mut buf = Vec::with_capacity(action.encoded_len());
  let nodes = action.nodes();
  // Right child is pushed first so the left one is emitted first.
  let mut pending = vec![action.root_index()];
  while let Some(index) = pending.pop() {
    match nodes[index] {
      Node::Variable => buf.push(OP_VARIABLE),
      Node::Constant(value) => {
        buf.push(OP_CONSTANT);
        buf.extend_from_slice(&value.to_le_bytes());
      }
      Node::Binary { op, lhs, rhs } => {
        buf.push(op.opcode());
        pending.push(rhs);
        pending.push(lhs);
      }
    }
  }
  buf
}

/// Decode one tree from the front of `bytes`, returning it together with the
/// bytes that follow it.
pub fn decode(bytes: &[u8]) -> EquResult<(Action, &[u8])> {
  let mut decoder = Decoder::new(bytes);
  let action = decoder.read_action()?;
  Ok((action, decoder.rest()))
}

/// A binary node whose children are still being read.
struct OpenNode {
  op: BinaryOp,
  lhs: Option<usize>,
}

/// Cursor over a byte slice; offsets in errors are relative to its start.
pub(crate) struct Decoder<'a> {
  data: &'a [u8],
  pos: usize,
}

impl<'a> Decoder<'a> {
  pub(crate) fn new(data: &'a [u8]) -> Self {
    Self { data, pos: 0 }
  }

  pub(crate) fn rest(&self) -> &'a [u8] {
    &self.data[self.pos..]
  }

  pub(crate) fn read_u8(&mut self) -> EquResult<u8> {
    let [b] = self.read_array::<1>()?;
    Ok(b)
  }

  pub(crate) fn read_array<const N: usize>(&mut self) -> EquResult<[u8; N]> {
    let bytes = self.read_bytes(N)?;
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    Ok(out)
  }

  pub(crate) fn read_bytes(&mut self, n: usize) -> EquResult<&'a [u8]> {
    let available = self.data.len() - self.pos;
    if n > available {
      return Err(EquError::format_at(
        self.pos,
        FormatErrorKind::Truncated {
          needed: n,
          available,
        },
      ));
    }
    let bytes = &self.data[self.pos..self.pos + n];
    self.pos += n;
    Ok(bytes)
  }

  /// Read one pre-order tree, building its post-order nodes. Open binary
  /// nodes live on a heap stack, so input depth cannot exhaust the call stack.
  fn read_action(&mut self) -> EquResult<Action> {
    let mut nodes = Vec::new();
    let mut open: Vec<OpenNode> = Vec::new();

    loop {
      let at = self.pos;
      let leaf = match self.read_u8()? {
        OP_VARIABLE => Node::Variable,
        OP_CONSTANT => Node::Constant(f32::from_le_bytes(self.read_array::<4>()?)),
        opcode => {
          let op = BinaryOp::from_opcode(opcode)
            .ok_or_else(|| EquError::format_at(at, FormatErrorKind::InvalidOpcode(opcode)))?;
          open.push(OpenNode { op, lhs: None });
          continue;
        }
      };
      nodes.push(leaf);
      let mut done = nodes.len() - 1;

      // Close every binary node this subtree completes.
      loop {
        let Some(parent) = open.last_mut() else {
          return Ok(Action::from_nodes(nodes));
        };
        match parent.lhs {
          None => {
            parent.lhs = Some(done);
            break;
          }
          Some(lhs) => {
            let op = parent.op;
            open.pop();
            nodes.push(Node::Binary { op, lhs, rhs: done });
            done = nodes.len() - 1;
          }
        }
      }
    }
  }
}
