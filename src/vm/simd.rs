//! Lane-width types and helpers for 8-wide evaluation
//!
//! The interpreter evaluates [`LANES`] positions per instruction step using
//! `wide::f32x8` (AVX2/NEON under the hood). The lane width is a pure
//! performance knob: it changes batching granularity, never output values.
//!
//! Author: Moroya Sakamoto

use wide::{f32x8, CmpGt, CmpLt};

/// Number of positions evaluated together by one vectorized instruction step
pub const LANES: usize = 8;

/// Lane offsets 0..8 as floats, for the `Index` source
#[inline]
pub(crate) fn iota() -> f32x8 {
    f32x8::new([0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0])
}

/// Branchless minimum: `a < b ? a : b`
///
/// When the comparison is false - ties and NaN operands included - `b` is
/// selected. Existing field programs rely on this exact rule, so it is kept
/// rather than IEEE `minNum` semantics.
#[inline]
pub(crate) fn select_min(a: f32x8, b: f32x8) -> f32x8 {
    a.cmp_lt(b).blend(a, b)
}

/// Branchless maximum: `a > b ? a : b` (`b` wins on ties and NaN)
#[inline]
pub(crate) fn select_max(a: f32x8, b: f32x8) -> f32x8 {
    a.cmp_gt(b).blend(a, b)
}
