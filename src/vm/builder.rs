//! Append-only SSA construction for the field VM
//!
//! Author: Moroya Sakamoto

use super::instruction::{Instruction, UniformCell, ValueId};

/// Error type for malformed builder input.
///
/// The instruction stream normally comes from a trusted toolchain, but an
/// out-of-range operand surfaces here as an explicit construction-time error
/// rather than undefined behavior, which keeps the VM testable without
/// process termination.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BuilderError {
    /// An operand does not reference a value this builder produced earlier.
    #[error("instruction {inst} references {operand}, but only {inst} values exist")]
    UndefinedOperand {
        /// Position the offending instruction would have taken
        inst: usize,
        /// The out-of-range operand
        operand: ValueId,
    },
}

/// Instruction builder: owns a growable, append-only SSA sequence
///
/// One constructor per opcode; each returns the [`ValueId`] of the new value
/// for use as a later operand. Index 0 is a reserved zero immediate, handy as
/// a known-zero default operand.
///
/// Ids are append-time positions and constructors accept only earlier ids, so
/// the instruction graph is acyclic and topologically ordered by
/// construction. A builder is consumed exactly once by
/// [`Program::compile`](super::Program::compile).
///
/// # Example
///
/// ```rust
/// use alice_fieldvm::vm::Builder;
///
/// let mut b = Builder::new();
/// let x = b.index();
/// let r = b.immediate(3.0);
/// b.sub(x, r).unwrap(); // negative for positions 0..3
/// ```
#[derive(Debug)]
pub struct Builder {
    instructions: Vec<Instruction>,
}

impl Builder {
    /// Create a builder seeded with the reserved zero immediate at id 0
    pub fn new() -> Self {
        let mut b = Builder {
            instructions: Vec::with_capacity(64),
        };
        b.immediate(0.0);
        b
    }

    /// Number of instructions built so far
    #[inline]
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Id of the most recently built value
    ///
    /// Never empty: the reserved zero immediate exists from construction.
    #[inline]
    pub fn last_value(&self) -> ValueId {
        ValueId(self.instructions.len() as u32 - 1)
    }

    /// The built instructions, in append order
    #[inline]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    #[inline]
    fn push(&mut self, inst: Instruction) -> ValueId {
        let id = ValueId(self.instructions.len() as u32);
        self.instructions.push(inst);
        id
    }

    #[inline]
    fn check(&self, operand: ValueId) -> Result<ValueId, BuilderError> {
        if operand.index() < self.instructions.len() {
            Ok(operand)
        } else {
            Err(BuilderError::UndefinedOperand {
                inst: self.instructions.len(),
                operand,
            })
        }
    }

    // === Sources ===

    /// Per-lane running position: lane k of a batch at base i yields `i + k`
    pub fn index(&mut self) -> ValueId {
        self.push(Instruction::Index)
    }

    /// Constant `value` broadcast to all lanes
    pub fn immediate(&mut self, value: f32) -> ValueId {
        self.push(Instruction::Immediate(value))
    }

    /// Broadcast read of `cell`, re-read on every interpreter call
    pub fn uniform(&mut self, cell: &UniformCell) -> ValueId {
        self.push(Instruction::Uniform(cell.clone()))
    }

    // === Binary arithmetic ===

    /// Elementwise `a + b`
    pub fn add(&mut self, a: ValueId, b: ValueId) -> Result<ValueId, BuilderError> {
        let (a, b) = (self.check(a)?, self.check(b)?);
        Ok(self.push(Instruction::Add(a, b)))
    }

    /// Elementwise `a - b`
    pub fn sub(&mut self, a: ValueId, b: ValueId) -> Result<ValueId, BuilderError> {
        let (a, b) = (self.check(a)?, self.check(b)?);
        Ok(self.push(Instruction::Sub(a, b)))
    }

    /// Elementwise `a * b`
    pub fn mul(&mut self, a: ValueId, b: ValueId) -> Result<ValueId, BuilderError> {
        let (a, b) = (self.check(a)?, self.check(b)?);
        Ok(self.push(Instruction::Mul(a, b)))
    }

    /// Branchless minimum: `a < b ? a : b`
    ///
    /// When the comparison is false - ties and NaN operands included - `b` is
    /// selected. This is the comparison-select rule existing programs depend
    /// on, not IEEE `minNum`.
    pub fn min(&mut self, a: ValueId, b: ValueId) -> Result<ValueId, BuilderError> {
        let (a, b) = (self.check(a)?, self.check(b)?);
        Ok(self.push(Instruction::Min(a, b)))
    }

    /// Branchless maximum: `a > b ? a : b` (`b` wins on ties and NaN)
    pub fn max(&mut self, a: ValueId, b: ValueId) -> Result<ValueId, BuilderError> {
        let (a, b) = (self.check(a)?, self.check(b)?);
        Ok(self.push(Instruction::Max(a, b)))
    }

    // === Unary arithmetic ===

    /// Elementwise `-a`
    pub fn negate(&mut self, a: ValueId) -> Result<ValueId, BuilderError> {
        let a = self.check(a)?;
        Ok(self.push(Instruction::Negate(a)))
    }

    /// Elementwise square root; negative finite input yields NaN
    pub fn square_root(&mut self, a: ValueId) -> Result<ValueId, BuilderError> {
        let a = self.check(a)?;
        Ok(self.push(Instruction::SquareRoot(a)))
    }

    /// Consume the builder, appending the terminal instruction
    pub(crate) fn into_instructions_with_terminal(mut self) -> Vec<Instruction> {
        let last = self.last_value();
        self.push(Instruction::Terminal(last));
        self.instructions
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
