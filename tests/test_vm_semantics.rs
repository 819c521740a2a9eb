//! Integration tests: VM semantics pinned by the builder/compiler/interpreter
//! contracts - scheduling equivalence, numeric rules, batching bounds.
//!
//! Author: Moroya Sakamoto

mod common;

use alice_fieldvm::prelude::*;
use common::*;

// ============================================================================
// Schedule equivalence: compiled program == naive unscheduled evaluation
// ============================================================================

#[test]
fn scheduled_matches_unscheduled_sqrt_chain() {
    assert_schedule_equivalent(sqrt_builder(), 41);
}

#[test]
fn scheduled_matches_unscheduled_all_opcodes() {
    let y = UniformCell::new(0.75);
    assert_schedule_equivalent(full_opcode_builder(&y), 37);
}

#[test]
fn invariant_prefix_is_the_constant_set() {
    let y = UniformCell::new(0.0);
    let builder = full_opcode_builder(&y);
    let immediates = builder
        .instructions()
        .iter()
        .filter(|i| i.opcode() == OpCode::Immediate)
        .count();

    let program = Program::compile(builder);
    assert_eq!(program.invariant_len(), immediates);
    assert!(program.instructions()[..program.invariant_len()]
        .iter()
        .all(|i| i.opcode() == OpCode::Immediate));
}

#[test]
fn compiled_operands_are_topologically_valid() {
    let y = UniformCell::new(0.0);
    let program = Program::compile(full_opcode_builder(&y));
    for (i, inst) in program.instructions().iter().enumerate() {
        for op in inst.operands() {
            assert!(op.index() < i);
        }
    }
}

// ============================================================================
// Algebraic identities
// ============================================================================

#[test]
fn add_zero_is_identity() {
    let mut b = Builder::new();
    let x = b.index();
    let zero = b.immediate(0.0);
    b.add(x, zero).unwrap();
    let program = Program::compile(b);

    let mut out = [0.0f32; 20];
    run(&program, &mut out);
    for (i, v) in out.iter().enumerate() {
        assert_eq!(*v, i as f32);
    }
}

#[test]
fn mul_one_is_identity() {
    let mut b = Builder::new();
    let x = b.index();
    let one = b.immediate(1.0);
    b.mul(x, one).unwrap();
    let program = Program::compile(b);

    let mut out = [0.0f32; 20];
    run(&program, &mut out);
    for (i, v) in out.iter().enumerate() {
        assert_eq!(*v, i as f32);
    }
}

#[test]
fn sub_self_is_zero() {
    let mut b = Builder::new();
    let x = b.index();
    b.sub(x, x).unwrap();
    let program = Program::compile(b);

    let mut out = [1.0f32; 20];
    run(&program, &mut out);
    assert!(out.iter().all(|v| *v == 0.0));
}

// ============================================================================
// min/max totality: b wins when the comparison is false
// ============================================================================

fn run_binop(
    a: f32,
    b: f32,
    op: fn(&mut Builder, ValueId, ValueId) -> Result<ValueId, BuilderError>,
) -> f32 {
    let mut builder = Builder::new();
    let x = builder.immediate(a);
    let y = builder.immediate(b);
    op(&mut builder, x, y).unwrap();
    let program = Program::compile(builder);
    let mut out = [0.0f32; 1];
    run(&program, &mut out);
    out[0]
}

#[test]
fn min_max_ordered_operands() {
    assert_eq!(run_binop(1.0, 2.0, Builder::min), 1.0);
    assert_eq!(run_binop(2.0, 1.0, Builder::min), 1.0);
    assert_eq!(run_binop(1.0, 2.0, Builder::max), 2.0);
    assert_eq!(run_binop(2.0, 1.0, Builder::max), 2.0);
}

#[test]
fn min_max_ties_select_b() {
    // -0.0 == 0.0, so the comparison is false and b's bit pattern comes out
    assert_eq!(run_binop(-0.0, 0.0, Builder::min).to_bits(), 0.0f32.to_bits());
    assert_eq!(run_binop(0.0, -0.0, Builder::min).to_bits(), (-0.0f32).to_bits());
    assert_eq!(run_binop(-0.0, 0.0, Builder::max).to_bits(), 0.0f32.to_bits());
}

#[test]
fn min_max_nan_selects_b() {
    assert_eq!(run_binop(f32::NAN, 5.0, Builder::min), 5.0);
    assert_eq!(run_binop(f32::NAN, 5.0, Builder::max), 5.0);
    assert!(run_binop(5.0, f32::NAN, Builder::min).is_nan());
    assert!(run_binop(5.0, f32::NAN, Builder::max).is_nan());
}

// ============================================================================
// Batching bounds
// ============================================================================

#[test]
fn partial_batch_never_touches_past_count() {
    let program = Program::compile(sqrt_builder());

    for count in [1, 7, 8, 9, 15, 16, 17, 31] {
        let mut buf = vec![f32::MAX; count + LANES];
        run(&program, &mut buf[..count]);

        for (i, v) in buf[..count].iter().enumerate() {
            let expected = (i as f32).sqrt() - 2.0;
            assert_eq!(v.to_bits(), expected.to_bits(), "count={count} pos={i}");
        }
        for v in &buf[count..] {
            assert_eq!(*v, f32::MAX, "write past count={count}");
        }
    }
}

// ============================================================================
// Uniform freshness
// ============================================================================

#[test]
fn uniform_reread_every_call_without_recompile() {
    let y = UniformCell::new(10.0);
    let mut b = Builder::new();
    let x = b.index();
    let yv = b.uniform(&y);
    b.add(x, yv).unwrap();
    let program = Program::compile(b);

    let mut out = [0.0f32; 12];
    run(&program, &mut out);
    assert_eq!(out[0], 10.0);
    assert_eq!(out[11], 21.0);

    y.set(-1.0);
    run(&program, &mut out);
    assert_eq!(out[0], -1.0);
    assert_eq!(out[11], 10.0);
}

#[test]
fn uniform_constant_across_batches_within_call() {
    // 3 full batches; the uniform is position-invariant, so subtracting it
    // from itself must be zero in every batch
    let y = UniformCell::new(4.25);
    let mut b = Builder::new();
    let u = b.uniform(&y);
    b.sub(u, u).unwrap();
    let program = Program::compile(b);

    let mut out = [f32::MAX; 24];
    run(&program, &mut out);
    assert!(out.iter().all(|v| *v == 0.0));
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn repeated_runs_are_bit_identical() {
    let y = UniformCell::new(0.123);
    let program = Program::compile(full_opcode_builder(&y));

    let mut a = vec![0.0f32; 100];
    let mut b = vec![0.0f32; 100];
    run(&program, &mut a);
    run(&program, &mut b);
    for (x, y) in a.iter().zip(&b) {
        assert_eq!(x.to_bits(), y.to_bits());
    }
}

#[test]
fn shared_program_runs_concurrently() {
    // Programs are immutable after compilation; concurrent calls with
    // per-call destinations must agree with a sequential call.
    let program = std::sync::Arc::new(Program::compile(sqrt_builder()));

    let mut reference = vec![0.0f32; 64];
    run(&program, &mut reference);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let p = program.clone();
            std::thread::spawn(move || {
                let mut out = vec![0.0f32; 64];
                run(&p, &mut out);
                out
            })
        })
        .collect();

    for h in handles {
        let out = h.join().unwrap();
        for (x, y) in out.iter().zip(&reference) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }
}
