//! Field VM: builder, scheduling compiler, and vectorized interpreter
//!
//! This module is the core of the crate: a tiny single-assignment virtual
//! machine for scalar functions of two coordinates.
//!
//! # Architecture
//!
//! The VM has three stages, each owning one immutable artifact:
//!
//! | Stage | Input | Output | Cost |
//! |-------|-------|--------|------|
//! | [`Builder`] | constructor calls | SSA instruction DAG | O(1) append |
//! | [`Program::compile`] | `Builder` (consumed) | scheduled `Program` | O(n) |
//! | [`run`] | `Program` + destination | one f32 per position | O(n·count/8) |
//!
//! ## Builder
//!
//! The builder owns a growable, append-only instruction sequence. Each
//! constructor returns the [`ValueId`] of the new value; operands must be ids
//! the same builder returned earlier. Because ids are append-time positions
//! and only earlier ids are accepted, every program is in topological order
//! by construction - no back-references are representable.
//!
//! ## Compiler
//!
//! `Program::compile` appends a terminal instruction referencing the last
//! built value, then performs a stable two-bucket partition: pure constants
//! ([`OpCode::Immediate`]) first, everything else after. All operand ids are
//! rewritten through an old→new translation table, and the boundary between
//! the buckets is recorded. This is loop-invariant code motion restricted to
//! literal constants - no CSE, no dead-code elimination.
//!
//! ## Interpreter
//!
//! [`run`] evaluates positions in batches of [`LANES`] (8) using
//! `wide::f32x8`. One 8-wide slot is held per compiled instruction. The first
//! batch executes the whole program; every later batch restarts at the
//! recorded boundary, reusing the invariant prefix's slots without
//! recomputation. A trailing partial batch evaluates into scratch and copies
//! only the valid lanes out.
//!
//! # Concurrency
//!
//! A compiled [`Program`] is immutable and `Send + Sync`; it may be shared
//! read-only across threads. Each `run` call allocates its own slot storage,
//! so concurrent calls on one program are safe as long as any
//! [`UniformCell`] it reads is not mutated during the call.
//!
//! Author: Moroya Sakamoto

mod builder;
mod compiler;
mod eval;
mod instruction;
mod opcode;
mod simd;

pub use builder::{Builder, BuilderError};
pub use compiler::Program;
pub use eval::{eval_direct, run};
pub use instruction::{Instruction, UniformCell, ValueId};
pub use opcode::OpCode;
pub use simd::LANES;
