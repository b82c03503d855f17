//! Operand grammar for the four addressing modes

use regex::Regex;

use super::validate_label;
use crate::assembler::error::ErrorKind;

/// Addressing mode numbers as encoded into the first instruction word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Immediate = 0,
    Direct = 1,
    MatrixAccess = 2,
    RegisterDirect = 3,
}

impl AddressingMode {
    /// The two-bit value placed in a mode field
    pub fn code(self) -> u16 {
        self as u16
    }
}

/// A single parsed operand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// `#value`: the literal travels inside the instruction
    Immediate(i16),
    /// A symbol reference resolved during the second pass
    Direct(String),
    /// `LABEL[rX][rY]`: a matrix cell indexed by two registers
    MatrixAccess {
        label: String,
        row_reg: u8,
        col_reg: u8,
    },
    /// `r0`..`r7`
    RegisterDirect(u8),
}

impl Operand {
    /// The addressing mode this operand uses
    pub fn mode(&self) -> AddressingMode {
        match self {
            Operand::Immediate(_) => AddressingMode::Immediate,
            Operand::Direct(_) => AddressingMode::Direct,
            Operand::MatrixAccess { .. } => AddressingMode::MatrixAccess,
            Operand::RegisterDirect(_) => AddressingMode::RegisterDirect,
        }
    }

    /// How many extra instruction words the operand occupies on its own
    pub fn word_count(&self) -> usize {
        match self {
            Operand::MatrixAccess { .. } => 2,
            _ => 1,
        }
    }
}

/// Parse one comma-separated operand field (already trimmed, non-empty)
pub fn parse_operand(field: &str) -> Result<Operand, ErrorKind> {
    if let Some(rest) = field.strip_prefix('#') {
        return parse_immediate(rest);
    }
    if let Some(register) = parse_register(field)? {
        return Ok(Operand::RegisterDirect(register));
    }
    if field.contains('[') {
        return parse_matrix_access(field);
    }
    if !field.starts_with(|c: char| c.is_ascii_alphabetic()) {
        // neither a literal, a register, a matrix cell, nor a label
        return Err(ErrorKind::InvalidOperandSyntax);
    }
    validate_label(field)?;
    Ok(Operand::Direct(field.to_string()))
}

/// `#<signed decimal>`; the literal must fit the 8-bit payload field
fn parse_immediate(rest: &str) -> Result<Operand, ErrorKind> {
    let value: i32 = rest.parse().map_err(|_| ErrorKind::InvalidNumberFormat)?;
    if !(-128..=127).contains(&value) {
        return Err(ErrorKind::InvalidNumberFormat);
    }
    Ok(Operand::Immediate(value as i16))
}

/// Recognize `r<digit>`. A digit above 7 is its own error; anything
/// else is not a register at all.
fn parse_register(field: &str) -> Result<Option<u8>, ErrorKind> {
    let shape = Regex::new(r"^r([0-9])$").unwrap();
    match shape.captures(field) {
        Some(caps) => {
            let digit = caps[1].as_bytes()[0] - b'0';
            if digit > 7 {
                Err(ErrorKind::InvalidRegister)
            } else {
                Ok(Some(digit))
            }
        }
        None => Ok(None),
    }
}

/// `LABEL[rX][rY]`; the bracket groups are adjacent and nothing may
/// follow the second one
fn parse_matrix_access(field: &str) -> Result<Operand, ErrorKind> {
    let shape = Regex::new(r"^([^\[\]]*)\[([^\[\]]*)\]\[([^\[\]]*)\]$").unwrap();
    let caps = shape
        .captures(field)
        .ok_or(ErrorKind::InvalidMatrixFormat)?;
    validate_label(&caps[1])?;
    let row_reg = parse_index_register(&caps[2])?;
    let col_reg = parse_index_register(&caps[3])?;
    Ok(Operand::MatrixAccess {
        label: caps[1].to_string(),
        row_reg,
        col_reg,
    })
}

/// A bracket must hold exactly one register
fn parse_index_register(text: &str) -> Result<u8, ErrorKind> {
    match parse_register(text)? {
        Some(register) => Ok(register),
        None => Err(ErrorKind::InvalidMatrixFormat),
    }
}
