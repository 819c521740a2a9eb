//! Common test helpers for ALICE-FieldVM integration tests
//!
//! Author: Moroya Sakamoto

use alice_fieldvm::prelude::*;

// ============================================================================
// Standard test programs
// ============================================================================

/// Unit disk source: x^2 + y^2 - 1, foreground where the point is inside
#[allow(dead_code)]
pub const UNIT_DISK_SRC: &str = "\
_0 var-x
_1 var-y
_2 mul _0 _0
_3 mul _1 _1
_4 add _2 _3
_5 const 1.0
_6 sub _4 _5
";

/// d(i) = sqrt(i) - 2, crossing zero at position 4
#[allow(dead_code)]
pub fn sqrt_builder() -> Builder {
    let mut b = Builder::new();
    let i = b.index();
    let r = b.square_root(i).unwrap();
    let two = b.immediate(2.0);
    b.sub(r, two).unwrap();
    b
}

/// Mixed program exercising every opcode, with y supplied as a uniform
#[allow(dead_code)]
pub fn full_opcode_builder(y: &UniformCell) -> Builder {
    let mut b = Builder::new();
    let i = b.index();
    let yv = b.uniform(y);
    let c = b.immediate(0.5);
    let a = b.add(i, c).unwrap();
    let s = b.sub(a, yv).unwrap();
    let m = b.mul(s, s).unwrap();
    let lo = b.min(m, a).unwrap();
    let hi = b.max(lo, yv).unwrap();
    let n = b.negate(hi).unwrap();
    let nn = b.negate(n).unwrap();
    b.square_root(nn).unwrap();
    b
}

// ============================================================================
// Assertion helpers
// ============================================================================

/// Assert that running a compiled copy of the builder matches naive
/// unscheduled evaluation at every one of `count` positions, bit for bit.
#[allow(dead_code)]
pub fn assert_schedule_equivalent(builder: Builder, count: usize) {
    let direct: Vec<f32> = (0..count).map(|i| eval_direct(&builder, i as f32)).collect();

    let program = Program::compile(builder);
    let mut out = vec![0.0f32; count];
    run(&program, &mut out);

    for (i, (d, c)) in direct.iter().zip(&out).enumerate() {
        assert!(
            d.to_bits() == c.to_bits() || (d.is_nan() && c.is_nan()),
            "scheduled/unscheduled mismatch at position {}: direct={}, compiled={}",
            i,
            d,
            c
        );
    }
}
