//! # ALICE-FieldVM
//!
//! **A.L.I.C.E. FieldVM - Adaptive Lightweight Implicit Compression Engine,
//! field rasterization VM**
//!
//! A tiny special-purpose virtual machine that evaluates a single-assignment
//! arithmetic DSL (a scalar function of two coordinates) over a dense pixel
//! grid and rasterizes a binary image from the sign of the result.
//!
//! ## Pipeline
//!
//! ```text
//! text source → parse → Builder (SSA DAG) → Program (scheduled) → run() → rows → PGM
//! ```
//!
//! - **Builder**: append-only instruction construction; every operand
//!   reference points strictly backwards, so the graph is acyclic by
//!   construction.
//! - **Compiler**: hoists pure constants into an invariant prefix that the
//!   interpreter computes once per call, and remaps all operand ids into
//!   compiled order.
//! - **Interpreter**: evaluates 8 positions per step using `wide::f32x8`,
//!   reusing the invariant prefix across all batches of one call.
//!
//! ## Example
//!
//! ```rust
//! use alice_fieldvm::prelude::*;
//!
//! // d(i) = i*i - 1, negative only at position 0
//! let mut b = Builder::new();
//! let x = b.index();
//! let sq = b.mul(x, x).unwrap();
//! let one = b.immediate(1.0);
//! b.sub(sq, one).unwrap();
//!
//! let program = Program::compile(b);
//! let mut out = [0.0f32; 4];
//! run(&program, &mut out);
//! assert!(out[0] < 0.0);
//! assert!(out[2] > 0.0);
//! ```
//!
//! ## Author
//!
//! Moroya Sakamoto

#![warn(missing_docs)]

pub mod parse;
pub mod render;
pub mod vm;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude - commonly used types and functions
pub mod prelude {
    pub use crate::parse::{parse_source, ParseError, SourceInst, SourceOp};
    pub use crate::render::{
        lower_source, render_image, render_image_parallel, write_pgm, FieldImage, RenderConfig,
        RenderError,
    };
    pub use crate::vm::{
        eval_direct, run, Builder, BuilderError, Instruction, OpCode, Program, UniformCell,
        ValueId, LANES,
    };
}

// Re-exports for convenience
pub use vm::{run, Builder, Program};
