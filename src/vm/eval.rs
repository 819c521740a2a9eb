//! Batched interpreter for compiled field programs
//!
//! Executes a [`Program`] over a run of positions in 8-lane batches. One
//! 8-wide slot is held per compiled instruction; the first batch executes the
//! whole program, every later batch re-enters at the invariant/varying
//! boundary and reuses the prefix's slots. Slot storage lives in a fixed
//! stack buffer for programs up to [`SLOT_BUFFER`] instructions and falls
//! back to a heap allocation above that, released when the call returns.
//!
//! Author: Moroya Sakamoto

use super::builder::Builder;
use super::compiler::Program;
use super::instruction::Instruction;
use super::simd::{iota, select_max, select_min, LANES};
use wide::f32x8;

/// Fixed slot-buffer capacity; larger programs take the heap path
const SLOT_BUFFER: usize = 1024;

/// Evaluate `dst.len()` positions, writing one float per position
///
/// Position p (0-based within this call) is evaluated with the `Index`
/// source yielding `p as f32`. A trailing partial batch is computed into
/// scratch at full lane width and only its leading `dst.len() % 8` values are
/// copied out; `dst` is never read or written beyond its length.
///
/// Output is deterministic: the same program and same uniform values produce
/// bit-identical results on every call.
pub fn run(program: &Program, dst: &mut [f32]) {
    let n = program.instruction_count();
    if n <= SLOT_BUFFER {
        let mut slots = [f32x8::ZERO; SLOT_BUFFER];
        run_batches(program, &mut slots[..n], dst);
    } else {
        let mut slots = vec![f32x8::ZERO; n];
        run_batches(program, &mut slots, dst);
    }
}

fn run_batches(program: &Program, slots: &mut [f32x8], dst: &mut [f32]) {
    let count = dst.len();
    let full = count - count % LANES;

    // First batch computes the invariant prefix; later batches re-enter past it.
    let mut start = 0;
    let mut base = 0;
    while base < full {
        let out = execute(program, slots, start, base);
        dst[base..base + LANES].copy_from_slice(&out.to_array());
        start = program.invariant_len();
        base += LANES;
    }

    if base < count {
        let out = execute(program, slots, start, base);
        dst[base..].copy_from_slice(&out.to_array()[..count - base]);
    }
}

/// Execute instructions `start..`, returning the terminal's 8 lanes
fn execute(program: &Program, slots: &mut [f32x8], start: usize, base: usize) -> f32x8 {
    for (off, inst) in program.instructions()[start..].iter().enumerate() {
        let i = start + off;
        slots[i] = match inst {
            Instruction::Index => f32x8::splat(base as f32) + iota(),
            Instruction::Immediate(v) => f32x8::splat(*v),
            Instruction::Uniform(cell) => f32x8::splat(cell.get()),
            Instruction::Add(a, b) => slots[a.index()] + slots[b.index()],
            Instruction::Sub(a, b) => slots[a.index()] - slots[b.index()],
            Instruction::Mul(a, b) => slots[a.index()] * slots[b.index()],
            Instruction::Min(a, b) => select_min(slots[a.index()], slots[b.index()]),
            Instruction::Max(a, b) => select_max(slots[a.index()], slots[b.index()]),
            Instruction::Negate(a) => -slots[a.index()],
            Instruction::SquareRoot(a) => slots[a.index()].sqrt(),
            Instruction::Terminal(a) => return slots[a.index()],
        };
    }
    // Compilation always places a terminal last
    unreachable!("program has no terminal instruction")
}

/// Naive scalar evaluation of an uncompiled builder at one position
///
/// Walks the instructions in build order, reading uniforms fresh, and returns
/// the last value. This is the unscheduled reference path: for every input,
/// [`run`] on the compiled program must agree with it exactly.
pub fn eval_direct(builder: &Builder, position: f32) -> f32 {
    let insts = builder.instructions();
    let mut vals = vec![0.0f32; insts.len()];
    for (i, inst) in insts.iter().enumerate() {
        vals[i] = match inst {
            Instruction::Index => position,
            Instruction::Immediate(v) => *v,
            Instruction::Uniform(cell) => cell.get(),
            Instruction::Add(a, b) => vals[a.index()] + vals[b.index()],
            Instruction::Sub(a, b) => vals[a.index()] - vals[b.index()],
            Instruction::Mul(a, b) => vals[a.index()] * vals[b.index()],
            Instruction::Min(a, b) => {
                let (x, y) = (vals[a.index()], vals[b.index()]);
                if x < y {
                    x
                } else {
                    y
                }
            }
            Instruction::Max(a, b) => {
                let (x, y) = (vals[a.index()], vals[b.index()]);
                if x > y {
                    x
                } else {
                    y
                }
            }
            Instruction::Negate(a) => -vals[a.index()],
            Instruction::SquareRoot(a) => vals[a.index()].sqrt(),
            Instruction::Terminal(a) => vals[a.index()],
        };
    }
    *vals.last().expect("builder is never empty")
}
