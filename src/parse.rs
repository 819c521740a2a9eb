//! Parser for the line-oriented field program text format
//!
//! One instruction per line, `#`-prefixed lines are comments:
//!
//! ```text
//! _0 var-x
//! _1 var-y
//! _2 const 2.75
//! _3 add _0 _2
//! _4 square _1
//! _5 min _3 _4
//! _6 neg _5
//! _7 sqrt _3
//! ```
//!
//! Ids are hexadecimal, dense and gapless: each must equal the running count
//! of previously defined instructions, and operands must reference earlier
//! ids. Violations are reported as [`ParseError`] values naming the offending
//! line, not fatal aborts.
//!
//! `square` and `neg` are sugar; [`lower_source`](crate::render::lower_source)
//! expands them to `mul(a, a)` and arithmetic negation.
//!
//! Author: Moroya Sakamoto

/// Operation of one parsed source line
///
/// Operands are source-level ids, already validated to reference earlier
/// instructions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SourceOp {
    /// X coordinate of the sample position
    VarX,
    /// Y coordinate of the sample position
    VarY,
    /// Literal constant
    Const(f32),
    /// `a + b`
    Add(u32, u32),
    /// `a - b`
    Sub(u32, u32),
    /// `a * b`
    Mul(u32, u32),
    /// Branchless minimum (b wins on ties and NaN)
    Min(u32, u32),
    /// Branchless maximum (b wins on ties and NaN)
    Max(u32, u32),
    /// `a * a`
    Square(u32),
    /// `-a`
    Neg(u32),
    /// Square root
    Sqrt(u32),
}

/// One parsed instruction: id plus operation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceInst {
    /// Source-level id (equals the instruction's position)
    pub id: u32,
    /// The operation
    pub op: SourceOp,
}

/// Error type for malformed field program text
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParseError {
    /// A line does not match `_<hex-id> <mnemonic> [args]`.
    #[error("line {line}: malformed instruction {text:?}")]
    MalformedLine {
        /// 1-based source line number
        line: usize,
        /// The offending line text
        text: String,
    },

    /// An id does not equal the running instruction count.
    #[error("line {line}: id _{found:x} out of sequence, expected _{expected:x}")]
    NonDenseId {
        /// 1-based source line number
        line: usize,
        /// The id this line must carry
        expected: u32,
        /// The id it carries
        found: u32,
    },

    /// Unrecognized instruction mnemonic.
    #[error("line {line}: unknown instruction {mnemonic:?}")]
    UnknownOp {
        /// 1-based source line number
        line: usize,
        /// The unrecognized mnemonic
        mnemonic: String,
    },

    /// A `const` payload is not a parseable float.
    #[error("line {line}: invalid constant {text:?}")]
    InvalidConstant {
        /// 1-based source line number
        line: usize,
        /// The offending payload
        text: String,
    },

    /// An operand references an id not defined on an earlier line.
    #[error("line {line}: operand _{id:x} is not defined by an earlier instruction")]
    UndefinedRef {
        /// 1-based source line number
        line: usize,
        /// The dangling operand id
        id: u32,
    },
}

/// Parse `_<hex>` into an id
fn parse_id(token: &str) -> Option<u32> {
    let hex = token.strip_prefix('_')?;
    u32::from_str_radix(hex, 16).ok()
}

/// Parse a complete field program source into validated instructions
///
/// Blank lines and `#` comments are skipped. Everything else must be a
/// well-formed instruction line with a dense, gapless id and backward-only
/// operand references.
pub fn parse_source(src: &str) -> Result<Vec<SourceInst>, ParseError> {
    let mut insts = Vec::new();

    for (idx, raw) in src.lines().enumerate() {
        let line = idx + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        let malformed = || ParseError::MalformedLine {
            line,
            text: text.to_string(),
        };

        let mut tokens = text.split_whitespace();
        let id = tokens
            .next()
            .and_then(parse_id)
            .ok_or_else(|| malformed())?;

        let expected = insts.len() as u32;
        if id != expected {
            return Err(ParseError::NonDenseId {
                line,
                expected,
                found: id,
            });
        }

        let mnemonic = tokens.next().ok_or_else(|| malformed())?;

        // Operand ids must be earlier definitions
        let operand = |tok: Option<&str>| -> Result<u32, ParseError> {
            let op = tok.and_then(parse_id).ok_or_else(|| malformed())?;
            if op >= id {
                return Err(ParseError::UndefinedRef { line, id: op });
            }
            Ok(op)
        };

        let op = match mnemonic {
            "var-x" => SourceOp::VarX,
            "var-y" => SourceOp::VarY,
            "const" => {
                let payload = tokens.next().ok_or_else(|| malformed())?;
                let value: f32 = payload.parse().map_err(|_| ParseError::InvalidConstant {
                    line,
                    text: payload.to_string(),
                })?;
                SourceOp::Const(value)
            }
            "add" => SourceOp::Add(operand(tokens.next())?, operand(tokens.next())?),
            "sub" => SourceOp::Sub(operand(tokens.next())?, operand(tokens.next())?),
            "mul" => SourceOp::Mul(operand(tokens.next())?, operand(tokens.next())?),
            "min" => SourceOp::Min(operand(tokens.next())?, operand(tokens.next())?),
            "max" => SourceOp::Max(operand(tokens.next())?, operand(tokens.next())?),
            "square" => SourceOp::Square(operand(tokens.next())?),
            "neg" => SourceOp::Neg(operand(tokens.next())?),
            "sqrt" => SourceOp::Sqrt(operand(tokens.next())?),
            other => {
                return Err(ParseError::UnknownOp {
                    line,
                    mnemonic: other.to_string(),
                })
            }
        };

        if tokens.next().is_some() {
            return Err(malformed());
        }

        insts.push(SourceInst { id, op });
    }

    Ok(insts)
}
