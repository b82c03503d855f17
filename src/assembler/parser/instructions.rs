//! Instruction mnemonics, operand counts and addressing-mode rules

use super::operands::{self, AddressingMode, Operand};
use crate::assembler::error::ErrorKind;

/// The sixteen machine opcodes, in encoding order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Mov,
    Cmp,
    Add,
    Sub,
    Not,
    Clr,
    Lea,
    Inc,
    Dec,
    Jmp,
    Bne,
    Red,
    Prn,
    Jsr,
    Rts,
    Stop,
}

impl Opcode {
    /// Look a mnemonic up; mnemonics are lowercase and case-sensitive
    pub fn from_mnemonic(name: &str) -> Option<Opcode> {
        Some(match name {
            "mov" => Opcode::Mov,
            "cmp" => Opcode::Cmp,
            "add" => Opcode::Add,
            "sub" => Opcode::Sub,
            "not" => Opcode::Not,
            "clr" => Opcode::Clr,
            "lea" => Opcode::Lea,
            "inc" => Opcode::Inc,
            "dec" => Opcode::Dec,
            "jmp" => Opcode::Jmp,
            "bne" => Opcode::Bne,
            "red" => Opcode::Red,
            "prn" => Opcode::Prn,
            "jsr" => Opcode::Jsr,
            "rts" => Opcode::Rts,
            "stop" => Opcode::Stop,
            _ => return None,
        })
    }

    /// The numeric opcode encoded into bits 6..10 of the first word
    pub fn code(self) -> u16 {
        self as u16
    }

    /// How many operands the instruction requires
    pub fn operand_count(self) -> usize {
        match self {
            Opcode::Mov | Opcode::Cmp | Opcode::Add | Opcode::Sub | Opcode::Lea => 2,
            Opcode::Rts | Opcode::Stop => 0,
            _ => 1,
        }
    }
}

/// Parse an instruction statement: the mnemonic plus its operand fields
pub fn parse_operation(body: &str) -> Result<(Opcode, Vec<Operand>), ErrorKind> {
    let (name, rest) = match body.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (body, ""),
    };
    let opcode = Opcode::from_mnemonic(name).ok_or(ErrorKind::UnknownCommandName)?;
    let operands = parse_operand_fields(rest, opcode.operand_count())?;
    validate_addressing(opcode, &operands)?;
    Ok((opcode, operands))
}

/// Split the operand text at commas and parse each field. The field
/// count must match the opcode's requirement exactly.
fn parse_operand_fields(rest: &str, expected: usize) -> Result<Vec<Operand>, ErrorKind> {
    if rest.is_empty() {
        return if expected == 0 {
            Ok(Vec::new())
        } else {
            Err(ErrorKind::InvalidOperandCountForCommand)
        };
    }
    if expected == 0 {
        return Err(ErrorKind::TooManyOperands);
    }

    let fields: Vec<&str> = rest.split(',').map(str::trim).collect();
    // stray, duplicate, leading and trailing commas all leave an empty
    // field, which outranks any count mismatch they also cause
    if fields.iter().any(|field| field.is_empty()) {
        return Err(ErrorKind::ExpectedOperand);
    }
    if fields.len() > expected {
        return Err(ErrorKind::TooManyOperands);
    }
    if fields.len() < expected {
        return Err(ErrorKind::InvalidOperandCountForCommand);
    }

    let mut parsed = Vec::with_capacity(fields.len());
    for field in fields {
        parsed.push(operands::parse_operand(field)?);
    }
    Ok(parsed)
}

/// Apply the per-opcode addressing-mode table. A single operand sits in
/// the source slot but plays the destination role.
fn validate_addressing(opcode: Opcode, operands: &[Operand]) -> Result<(), ErrorKind> {
    match operands {
        [src, dst] => {
            if !source_allows(opcode, src.mode()) || !destination_allows(opcode, dst.mode()) {
                return Err(ErrorKind::InvalidAddressingMode);
            }
        }
        [dst] => {
            if !destination_allows(opcode, dst.mode()) {
                return Err(ErrorKind::InvalidAddressingMode);
            }
        }
        _ => {}
    }
    Ok(())
}

fn source_allows(opcode: Opcode, mode: AddressingMode) -> bool {
    match opcode {
        Opcode::Lea => matches!(mode, AddressingMode::Direct | AddressingMode::MatrixAccess),
        _ => true,
    }
}

fn destination_allows(opcode: Opcode, mode: AddressingMode) -> bool {
    match opcode {
        Opcode::Cmp | Opcode::Prn => true,
        _ => !matches!(mode, AddressingMode::Immediate),
    }
}
