//! Expression tree ("action") produced by the parser and the binary decoder.
//!
//! A tree is stored flat, in post-order: every node's children come before it
//! and the root is the last node. Children are referenced by index. Nothing
//! walks the tree recursively, so depth is bounded only by memory.
//!
//! Trees are never mutated after construction and can be evaluated from many
//! threads at once.

use std::fmt;

/// Binary operators, in opcode order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
  Pow,
}

impl BinaryOp {
  pub const ALL: [BinaryOp; 5] = [
    BinaryOp::Add,
    BinaryOp::Sub,
    BinaryOp::Mul,
    BinaryOp::Div,
    BinaryOp::Pow,
  ];

  /// Apply the operator with IEEE-754 semantics; never fails.
  pub fn apply(self, lhs: f32, rhs: f32) -> f32 {
    match self {
      BinaryOp::Add => lhs + rhs,
      BinaryOp::Sub => lhs - rhs,
      BinaryOp::Mul => lhs * rhs,
      BinaryOp::Div => lhs / rhs,
      BinaryOp::Pow => lhs.powf(rhs),
    }
  }

  pub fn symbol(self) -> char {
    match self {
      BinaryOp::Add => '+',
      BinaryOp::Sub => '-',
      BinaryOp::Mul => '*',
      BinaryOp::Div => '/',
      BinaryOp::Pow => '^',
    }
  }
}

/// One node of an [`Action`]. `lhs` and `rhs` index earlier nodes of the same
/// action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Node {
  Variable,
  Constant(f32),
  Binary { op: BinaryOp, lhs: usize, rhs: usize },
}

impl Node {
  fn shifted(self, by: usize) -> Self {
    match self {
      Node::Binary { op, lhs, rhs } => Node::Binary {
        op,
        lhs: lhs + by,
        rhs: rhs + by,
      },
      leaf => leaf,
    }
  }
}

/// Expression tree over the single free variable `x`.
///
/// Equality is structural: two actions are equal when they have the same
/// shape, operators and constants.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
  // Non-empty, post-order, children of a node are at smaller indices.
  nodes: Vec<Node>,
}

impl Action {
  pub fn variable() -> Self {
    Self {
      nodes: vec![Node::Variable],
    }
  }

  pub fn constant(value: f32) -> Self {
    Self {
      nodes: vec![Node::Constant(value)],
    }
  }

  /// Join two trees under `op`. `lhs` is reused in place, so left folds stay
  /// linear in the size of the result.
  pub fn binary(op: BinaryOp, lhs: Action, rhs: Action) -> Self {
    let mut nodes = lhs.nodes;
    let lhs_root = nodes.len() - 1;
    let offset = nodes.len();
    nodes.extend(rhs.nodes.into_iter().map(|node| node.shifted(offset)));
    let rhs_root = nodes.len() - 1;
    nodes.push(Node::Binary {
      op,
      lhs: lhs_root,
      rhs: rhs_root,
    });
    Self { nodes }
  }

  /// `-operand`, expressed as `0 - operand`.
  pub fn negate(operand: Action) -> Self {
    Self::binary(BinaryOp::Sub, Self::constant(0.0), operand)
  }

  /// Build from post-order nodes whose child indices are already valid.
  pub(crate) fn from_nodes(nodes: Vec<Node>) -> Self {
    debug_assert!(!nodes.is_empty());
    Self { nodes }
  }

  /// All nodes in post-order; the root is last.
  pub fn nodes(&self) -> &[Node] {
    &self.nodes
  }

  pub fn root_index(&self) -> usize {
    self.nodes.len() - 1
  }

  pub fn root(&self) -> Node {
    self.nodes[self.root_index()]
  }

  /// Evaluate the tree at `x`. Division by zero and invalid powers yield
  /// `inf`/`NaN` and propagate through parent nodes.
  pub fn evaluate(&self, x: f32) -> f32 {
    let mut values = Vec::with_capacity(self.nodes.len());
    for node in &self.nodes {
      let value = match *node {
        Node::Variable => x,
        Node::Constant(value) => value,
        Node::Binary { op, lhs, rhs } => op.apply(values[lhs], values[rhs]),
      };
      values.push(value);
    }
    values[self.root_index()]
  }

  /// Number of bytes [`crate::codec::serialize`] produces for this tree.
  pub fn encoded_len(&self) -> usize {
    self
      .nodes
      .iter()
      .map(|node| match node {
        Node::Constant(_) => 5,
        Node::Variable | Node::Binary { .. } => 1,
      })
      .sum()
  }

  /// Height of the tree; a leaf has depth 1.
  pub fn depth(&self) -> usize {
    let mut depths: Vec<usize> = Vec::with_capacity(self.nodes.len());
    for node in &self.nodes {
      let depth = match *node {
        Node::Variable | Node::Constant(_) => 1,
        Node::Binary { lhs, rhs, .. } => 1 + depths[lhs].max(depths[rhs]),
      };
      depths.push(depth);
    }
    depths[self.root_index()]
  }
}

/// Fully parenthesized infix, e.g. `((2 + 3) * x)`.
impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    enum Step {
      Node(usize),
      Op(BinaryOp),
      Close,
    }

    let mut pending = vec![Step::Node(self.root_index())];
    while let Some(step) = pending.pop() {
      match step {
        Step::Node(index) => match self.nodes[index] {
          Node::Variable => write!(f, "x")?,
          Node::Constant(value) => write!(f, "{value}")?,
          Node::Binary { op, lhs, rhs } => {
            write!(f, "(")?;
            pending.extend([Step::Close, Step::Node(rhs), Step::Op(op), Step::Node(lhs)]);
          }
        },
        Step::Op(op) => write!(f, " {} ", op.symbol())?,
        Step::Close => write!(f, ")")?,
      }
    }
    Ok(())
  }
}
