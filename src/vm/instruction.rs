//! Instruction structure for the field VM
//!
//! The original design packed a float immediate, an external-cell pointer and
//! two operand indices into one overlapped payload. Here each variant carries
//! exactly the fields its opcode needs; the layout saving is not semantic.
//!
//! Author: Moroya Sakamoto

use super::opcode::OpCode;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Reference to a value produced earlier by the same [`Builder`]
///
/// A `ValueId` is the append-time position of its instruction, so it is
/// stable for the lifetime of the builder and strictly less than the position
/// of any instruction that consumes it.
///
/// [`Builder`]: super::Builder
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ValueId(pub(crate) u32);

impl ValueId {
    /// Position of the referenced instruction
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ValueId {
    /// Renders in the `_<hex>` form of the text instruction format
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_{:x}", self.0)
    }
}

/// Externally owned mutable scalar, read fresh on every interpreter call
///
/// This is the mechanism for a value that is constant within one call (e.g.
/// one output row's Y coordinate) but varies call to call. The cell stores
/// the float's bit pattern in an `Arc<AtomicU32>` so that compiled programs
/// referencing it stay `Send + Sync` and can be shared across threads.
///
/// Cloning a `UniformCell` clones the handle, not the value: all clones
/// observe the same cell.
#[derive(Clone, Debug, Default)]
pub struct UniformCell(Arc<AtomicU32>);

impl UniformCell {
    /// Create a cell holding `value`
    pub fn new(value: f32) -> Self {
        UniformCell(Arc::new(AtomicU32::new(value.to_bits())))
    }

    /// Store a new value, visible to the next interpreter call
    #[inline]
    pub fn set(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Read the current value
    #[inline]
    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }
}

/// A single instruction of the field VM
///
/// Operand references are strictly less than the instruction's own position
/// (enforced by [`Builder`]), so every instruction sequence is acyclic and
/// topologically ordered by construction.
///
/// [`Builder`]: super::Builder
#[derive(Clone, Debug)]
pub enum Instruction {
    /// Per-lane running position as float
    Index,
    /// Literal constant broadcast to all lanes
    Immediate(f32),
    /// Broadcast read of an external cell
    Uniform(UniformCell),
    /// Elementwise `a + b`
    Add(ValueId, ValueId),
    /// Elementwise `a - b`
    Sub(ValueId, ValueId),
    /// Elementwise `a * b`
    Mul(ValueId, ValueId),
    /// Branchless `a < b ? a : b`
    Min(ValueId, ValueId),
    /// Branchless `a > b ? a : b`
    Max(ValueId, ValueId),
    /// Elementwise `-a`
    Negate(ValueId),
    /// Elementwise square root
    SquareRoot(ValueId),
    /// Copy value `a` to the destination; always last in a compiled program
    Terminal(ValueId),
}

impl Instruction {
    /// The opcode tag of this instruction
    #[inline]
    pub fn opcode(&self) -> OpCode {
        match self {
            Instruction::Index => OpCode::Index,
            Instruction::Immediate(_) => OpCode::Immediate,
            Instruction::Uniform(_) => OpCode::UniformRef,
            Instruction::Add(..) => OpCode::Add,
            Instruction::Sub(..) => OpCode::Sub,
            Instruction::Mul(..) => OpCode::Mul,
            Instruction::Min(..) => OpCode::Min,
            Instruction::Max(..) => OpCode::Max,
            Instruction::Negate(_) => OpCode::Negate,
            Instruction::SquareRoot(_) => OpCode::SquareRoot,
            Instruction::Terminal(_) => OpCode::Terminal,
        }
    }

    /// Operand references of this instruction, in order
    #[inline]
    pub fn operands(&self) -> impl Iterator<Item = ValueId> + '_ {
        let (a, b) = match *self {
            Instruction::Add(a, b)
            | Instruction::Sub(a, b)
            | Instruction::Mul(a, b)
            | Instruction::Min(a, b)
            | Instruction::Max(a, b) => (Some(a), Some(b)),
            Instruction::Negate(a) | Instruction::SquareRoot(a) | Instruction::Terminal(a) => {
                (Some(a), None)
            }
            _ => (None, None),
        };
        a.into_iter().chain(b)
    }

    /// Rewrite every operand through an old→new translation table
    ///
    /// Used by the scheduler after reordering; `table[old]` must already hold
    /// the compiled-order position of every referenced value.
    pub(crate) fn remap_operands(&mut self, table: &[u32]) {
        match self {
            Instruction::Add(a, b)
            | Instruction::Sub(a, b)
            | Instruction::Mul(a, b)
            | Instruction::Min(a, b)
            | Instruction::Max(a, b) => {
                a.0 = table[a.index()];
                b.0 = table[b.index()];
            }
            Instruction::Negate(a) | Instruction::SquareRoot(a) | Instruction::Terminal(a) => {
                a.0 = table[a.index()];
            }
            _ => {}
        }
    }
}
