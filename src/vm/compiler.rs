//! Scheduler: Builder DAG → scheduled Program
//!
//! Compilation performs one transform: a stable two-bucket partition that
//! moves pure constants in front of everything else, so the interpreter can
//! compute them once per call instead of once per batch. This is
//! loop-invariant code motion restricted to literal constants - no common
//! subexpression elimination, no dead-code elimination, no hoisting of
//! uniform-derived arithmetic.
//!
//! Uniform reads stay in the varying partition. A uniform is constant within
//! one call, so hoisting it would also be correct, but keeping it varying
//! matches the constant-only hoisting rule and keeps the invariant prefix
//! exactly the set of immediates.
//!
//! Author: Moroya Sakamoto

use super::builder::Builder;
use super::instruction::Instruction;

/// Compiled program: immutable, scheduled instruction sequence
///
/// Instructions are in compiled order (constants first), all operand ids have
/// been rewritten into that order, and exactly one `Terminal` instruction
/// sits last, referencing the program's output value. `loop_start` is the
/// boundary between the invariant prefix and the varying suffix; the
/// interpreter re-enters at this offset for every batch after the first.
///
/// A `Program` is read-only for the lifetime of all interpreter invocations
/// and may be shared across threads without synchronization.
#[derive(Clone, Debug)]
pub struct Program {
    /// Scheduled instructions, terminal last
    pub(crate) instructions: Vec<Instruction>,
    /// First instruction of the varying suffix
    pub(crate) loop_start: usize,
}

impl Program {
    /// Compile a builder into a scheduled program, consuming it.
    ///
    /// 1. Appends a `Terminal` referencing the last built value.
    /// 2. Emits every `Immediate` instruction, in original order, into the
    ///    invariant bucket; then every remaining instruction, in original
    ///    order, into the varying bucket.
    /// 3. Rewrites all operand ids through an old→new translation table.
    ///    Invariants are emitted first, so the table is fully populated for
    ///    any constant referenced from the varying bucket.
    /// 4. Records the invariant bucket's length as the re-entry offset.
    ///
    /// Topological order is preserved: within each bucket original order is
    /// kept, and a constant can never reference a varying value.
    pub fn compile(builder: Builder) -> Program {
        let source = builder.into_instructions_with_terminal();

        let mut instructions = Vec::with_capacity(source.len());
        let mut table = vec![0u32; source.len()];
        let mut loop_start = 0;

        for varying in [false, true] {
            if varying {
                loop_start = instructions.len();
            }
            for (old, inst) in source.iter().enumerate() {
                if inst.opcode().is_constant() == varying {
                    continue;
                }
                let mut inst = inst.clone();
                inst.remap_operands(&table);
                table[old] = instructions.len() as u32;
                instructions.push(inst);
            }
        }

        Program {
            instructions,
            loop_start,
        }
    }

    /// Number of instructions, terminal included
    #[inline]
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Length of the invariant prefix (offset of the first varying instruction)
    #[inline]
    pub fn invariant_len(&self) -> usize {
        self.loop_start
    }

    /// The scheduled instructions
    #[inline]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Memory held by the instruction sequence in bytes
    #[inline]
    pub fn memory_size(&self) -> usize {
        self.instructions.len() * std::mem::size_of::<Instruction>()
    }
}
