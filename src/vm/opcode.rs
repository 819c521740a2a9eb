//! OpCode definitions for the field VM
//!
//! Author: Moroya Sakamoto

/// Operation codes for the field virtual machine
///
/// Each opcode is either a source (produces a value from the execution
/// context), an arithmetic operation over earlier values, or the terminal
/// that stores the program's output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    // === Sources (no operands) ===
    /// Per-lane running position: lane k of a batch at base i yields i+k
    Index = 0,
    /// Literal constant broadcast to all lanes
    Immediate = 1,
    /// External mutable cell, re-read on every interpreter call
    UniformRef = 2,

    // === Binary arithmetic ===
    /// Elementwise addition
    Add = 16,
    /// Elementwise subtraction
    Sub = 17,
    /// Elementwise multiplication
    Mul = 18,
    /// Branchless minimum: `a < b ? a : b` (b wins on ties and NaN)
    Min = 19,
    /// Branchless maximum: `a > b ? a : b` (b wins on ties and NaN)
    Max = 20,

    // === Unary arithmetic ===
    /// Arithmetic negation
    Negate = 32,
    /// Elementwise square root (negative input yields NaN)
    SquareRoot = 33,

    // === Control ===
    /// Copy the referenced value into the destination; ends the chain
    Terminal = 255,
}

impl OpCode {
    /// Returns true if this opcode reads no earlier values
    #[inline]
    pub fn is_source(self) -> bool {
        (self as u8) < 16
    }

    /// Returns true if this opcode is a pure literal constant
    ///
    /// Only these are hoisted into the invariant prefix by the scheduler.
    /// `UniformRef` is deliberately excluded: a uniform is constant within
    /// one call but must be re-read on the next.
    #[inline]
    pub fn is_constant(self) -> bool {
        self == OpCode::Immediate
    }

    /// Returns true if this opcode takes two operands
    #[inline]
    pub fn is_binary(self) -> bool {
        let v = self as u8;
        (16..32).contains(&v)
    }

    /// Returns true if this opcode takes one operand
    #[inline]
    pub fn is_unary(self) -> bool {
        let v = self as u8;
        (32..48).contains(&v)
    }
}
