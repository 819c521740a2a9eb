//! Rasterization: parsed source → compiled program → binary PGM image
//!
//! The image spans `[-1, 1]²` with Y decreasing downward:
//! column i → X = −1 + i·step, row j → Y = +1 − j·step, step = 2/(N−1).
//! X is lowered as `index * step - 1` (the per-lane running position scaled
//! into grid space); Y is a per-row uniform, set once before each row's
//! interpreter call. A pixel is foreground (0xff) where the evaluated field
//! is strictly negative, else background (0x00).
//!
//! Rows are independent, so [`render_image_parallel`] shards them into bands
//! across rayon workers. Each band compiles its own program with its own Y
//! cell: a uniform cell must be exclusively owned by the calling thread
//! during a call, so sharing one compiled program's cell across workers is
//! not an option.
//!
//! Author: Moroya Sakamoto

use crate::parse::{SourceInst, SourceOp};
use crate::vm::{run, Builder, BuilderError, Program, UniformCell, ValueId};
use rayon::prelude::*;
use std::io::Write;

/// Rasterization settings
#[derive(Clone, Copy, Debug)]
pub struct RenderConfig {
    /// Image width and height in pixels (N ≥ 2)
    pub size: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig { size: 1024 }
    }
}

/// Rasterized binary image, one byte per pixel, row-major top-to-bottom
#[derive(Clone, Debug)]
pub struct FieldImage {
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
    /// 0xff where the field is strictly negative, 0x00 elsewhere
    pub pixels: Vec<u8>,
}

/// Error type for rasterization failures
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The grid mapping step = 2/(N−1) needs at least two samples per axis.
    #[error("image size must be at least 2, got {0}")]
    SizeTooSmall(usize),

    /// Lowering produced an out-of-range operand (unreachable for parsed
    /// source, which validates references).
    #[error(transparent)]
    Builder(#[from] BuilderError),

    /// Output I/O failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Lower parsed source into a builder
///
/// `var-x` becomes `index * step - 1`, `var-y` a read of `y_cell`, `square`
/// expands to `mul(a, a)` and `neg` to arithmetic negation. Returns the
/// builder ready for [`Program::compile`]; the last lowered value is the
/// program's output.
///
/// # Panics
///
/// Panics if an operand id does not reference an earlier instruction.
/// [`parse_source`](crate::parse::parse_source) output always satisfies
/// this.
pub fn lower_source(
    insts: &[SourceInst],
    step: f32,
    y_cell: &UniformCell,
) -> Result<Builder, BuilderError> {
    let mut b = Builder::new();
    let mut vals: Vec<ValueId> = Vec::with_capacity(insts.len());

    for inst in insts {
        let v = |id: u32| vals[id as usize];
        let val = match inst.op {
            SourceOp::VarX => {
                let i = b.index();
                let s = b.immediate(step);
                let scaled = b.mul(i, s)?;
                let offset = b.immediate(-1.0);
                b.add(scaled, offset)?
            }
            SourceOp::VarY => b.uniform(y_cell),
            SourceOp::Const(c) => b.immediate(c),
            SourceOp::Add(x, y) => b.add(v(x), v(y))?,
            SourceOp::Sub(x, y) => b.sub(v(x), v(y))?,
            SourceOp::Mul(x, y) => b.mul(v(x), v(y))?,
            SourceOp::Min(x, y) => b.min(v(x), v(y))?,
            SourceOp::Max(x, y) => b.max(v(x), v(y))?,
            SourceOp::Square(x) => b.mul(v(x), v(x))?,
            SourceOp::Neg(x) => b.negate(v(x))?,
            SourceOp::Sqrt(x) => b.square_root(v(x))?,
        };
        vals.push(val);
    }

    Ok(b)
}

#[inline]
fn threshold_row(row: &[f32], pixels: &mut [u8]) {
    for (px, v) in pixels.iter_mut().zip(row) {
        *px = if *v < 0.0 { 0xff } else { 0x00 };
    }
}

/// Rasterize parsed source on a single thread
pub fn render_image(insts: &[SourceInst], config: &RenderConfig) -> Result<FieldImage, RenderError> {
    let size = config.size;
    if size < 2 {
        return Err(RenderError::SizeTooSmall(size));
    }
    let step = 2.0 / (size - 1) as f32;

    let y_cell = UniformCell::default();
    let program = Program::compile(lower_source(insts, step, &y_cell)?);

    let mut pixels = vec![0u8; size * size];
    let mut row = vec![0.0f32; size];
    for (j, out_row) in pixels.chunks_mut(size).enumerate() {
        y_cell.set(1.0 - j as f32 * step);
        run(&program, &mut row);
        threshold_row(&row, out_row);
    }

    Ok(FieldImage {
        width: size,
        height: size,
        pixels,
    })
}

/// Rasterize parsed source with rows sharded across rayon workers
///
/// Output is bit-identical to [`render_image`]; only the row scheduling
/// differs. Compilation per band is cheap next to the evaluation work.
pub fn render_image_parallel(
    insts: &[SourceInst],
    config: &RenderConfig,
) -> Result<FieldImage, RenderError> {
    let size = config.size;
    if size < 2 {
        return Err(RenderError::SizeTooSmall(size));
    }
    let step = 2.0 / (size - 1) as f32;

    let band_rows = size.div_ceil(rayon::current_num_threads().max(1));
    let mut pixels = vec![0u8; size * size];

    pixels
        .par_chunks_mut(band_rows * size)
        .enumerate()
        .try_for_each(|(band, chunk)| -> Result<(), RenderError> {
            let y_cell = UniformCell::default();
            let program = Program::compile(lower_source(insts, step, &y_cell)?);

            let mut row = vec![0.0f32; size];
            for (r, out_row) in chunk.chunks_mut(size).enumerate() {
                let j = band * band_rows + r;
                y_cell.set(1.0 - j as f32 * step);
                run(&program, &mut row);
                threshold_row(&row, out_row);
            }
            Ok(())
        })?;

    Ok(FieldImage {
        width: size,
        height: size,
        pixels,
    })
}

/// Write an image as binary PGM (P5)
///
/// Minimal header: magic, width, height, max sample value.
pub fn write_pgm<W: Write>(writer: &mut W, image: &FieldImage) -> Result<(), RenderError> {
    write!(writer, "P5\n{} {}\n255\n", image.width, image.height)?;
    writer.write_all(&image.pixels)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_source;

    const UNIT_DISK: &str = "\
_0 var-x
_1 var-y
_2 mul _0 _0
_3 mul _1 _1
_4 add _2 _3
_5 const 1.0
_6 sub _4 _5
";

    #[test]
    fn test_unit_disk_5x5() {
        let insts = parse_source(UNIT_DISK).unwrap();
        let image = render_image(&insts, &RenderConfig { size: 5 }).unwrap();

        // Corners are at squared distance 2: background
        for corner in [0, 4, 20, 24] {
            assert_eq!(image.pixels[corner], 0x00, "corner {corner}");
        }
        // Center (0,0): foreground
        assert_eq!(image.pixels[12], 0xff);
        // Edge midpoints sit exactly on the circle (d = 0, not < 0): background
        assert_eq!(image.pixels[2], 0x00);
        assert_eq!(image.pixels[10], 0x00);
    }

    #[test]
    fn test_grid_mapping_extremes() {
        // Field = x: left half negative, right half not
        let insts = parse_source("_0 var-x\n").unwrap();
        let image = render_image(&insts, &RenderConfig { size: 4 }).unwrap();
        for row in image.pixels.chunks(4) {
            assert_eq!(row[0], 0xff); // x = -1
            assert_eq!(row[1], 0xff); // x = -1/3
            assert_eq!(row[2], 0x00); // x = +1/3
            assert_eq!(row[3], 0x00); // x = +1
        }

        // Field = y: top half positive (background), bottom half negative
        let insts = parse_source("_0 var-y\n").unwrap();
        let image = render_image(&insts, &RenderConfig { size: 4 }).unwrap();
        let rows: Vec<&[u8]> = image.pixels.chunks(4).collect();
        assert_eq!(rows[0], [0x00; 4]); // y = +1
        assert_eq!(rows[3], [0xff; 4]); // y = -1
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let insts = parse_source(UNIT_DISK).unwrap();
        let config = RenderConfig { size: 33 };
        let seq = render_image(&insts, &config).unwrap();
        let par = render_image_parallel(&insts, &config).unwrap();
        assert_eq!(seq.pixels, par.pixels);
    }

    #[test]
    fn test_size_too_small() {
        let insts = parse_source(UNIT_DISK).unwrap();
        assert!(matches!(
            render_image(&insts, &RenderConfig { size: 1 }),
            Err(RenderError::SizeTooSmall(1))
        ));
    }

    #[test]
    fn test_pgm_header() {
        let image = FieldImage {
            width: 3,
            height: 2,
            pixels: vec![0x00, 0xff, 0x00, 0xff, 0x00, 0xff],
        };
        let mut out = Vec::new();
        write_pgm(&mut out, &image).unwrap();
        assert!(out.starts_with(b"P5\n3 2\n255\n"));
        assert_eq!(&out[out.len() - 6..], &image.pixels[..]);
    }
}
