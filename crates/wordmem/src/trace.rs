//! Memory access trace format, parsed with nom
//!
//! One operation per line:
//! ```text
//! R <addr>
//! W <addr> <data>
//! ```
//!
//! Integers are decimal, or hex with a `0x` prefix. Blank lines and lines
//! starting with `#` are ignored. Addresses are word indices.

use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{char, digit1, hex_digit1, space0, space1},
    combinator::{all_consuming, map, map_res},
    sequence::{delimited, pair, preceded},
    IResult,
};

use crate::error::{Error, Result};

/// A single traced memory operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Read the word at `addr`
    Read {
        /// Word address
        addr: u32,
    },
    /// Write `data` to the word at `addr`
    Write {
        /// Word address
        addr: u32,
        /// Word value
        data: u32,
    },
}

impl Access {
    /// Word address touched by this operation
    pub fn addr(&self) -> u32 {
        match *self {
            Access::Read { addr } | Access::Write { addr, .. } => addr,
        }
    }

    /// Check if this is a write
    pub fn is_write(&self) -> bool {
        matches!(self, Access::Write { .. })
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Read { addr } => write!(f, "R {:#x}", addr),
            Access::Write { addr, data } => write!(f, "W {:#x} {:#x}", addr, data),
        }
    }
}

/// Parse a `u32` literal: `0x`-prefixed hex or plain decimal
pub fn parse_number(input: &str) -> IResult<&str, u32> {
    alt((
        map_res(preceded(tag_no_case("0x"), hex_digit1), |digits: &str| {
            u32::from_str_radix(digits, 16)
        }),
        map_res(digit1, |digits: &str| digits.parse::<u32>()),
    ))(input)
}

fn read_op(input: &str) -> IResult<&str, Access> {
    map(preceded(char('R'), preceded(space1, parse_number)), |addr| {
        Access::Read { addr }
    })(input)
}

fn write_op(input: &str) -> IResult<&str, Access> {
    map(
        preceded(
            char('W'),
            pair(preceded(space1, parse_number), preceded(space1, parse_number)),
        ),
        |(addr, data)| Access::Write { addr, data },
    )(input)
}

/// Parse one trace line
///
/// # Returns
/// * `Ok(None)` for blank and comment lines
/// * `Ok(Some(access))` for a valid operation
/// * `Err(Error::MalformedTrace)` otherwise (line number left as 0)
pub fn parse_line(line: &str) -> Result<Option<Access>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    // Reject unknown opcodes by name before handing the operands to nom
    let opcode = trimmed.split_whitespace().next().unwrap_or_default();
    if opcode != "R" && opcode != "W" {
        return Err(Error::MalformedTrace {
            line: 0,
            reason: format!(
                "unrecognized opcode {:?}, expected \"R\" (read) or \"W\" (write)",
                opcode
            ),
        });
    }

    let (_, access) = all_consuming(delimited(space0, alt((read_op, write_op)), space0))(trimmed)?;
    Ok(Some(access))
}

/// Parse a whole trace
///
/// Stops at the first malformed line; no partial trace is returned.
pub fn parse_trace(input: &str) -> Result<Vec<Access>> {
    let mut ops = Vec::new();
    for (idx, line) in input.lines().enumerate() {
        if let Some(access) = parse_line(line).map_err(|e| e.at_line(idx + 1))? {
            ops.push(access);
        }
    }
    Ok(ops)
}
