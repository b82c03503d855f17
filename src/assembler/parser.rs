//! Line-level syntactic and semantic analysis
//!
//! Every line of macro-expanded source is converted independently into a
//! [`ParsedLine`]. The parser never aborts: for any input line it returns
//! either a parsed statement or a single [`ErrorKind`] describing the
//! first violation it found. Comments start with a semicolon (`;`) and
//! continue to the end of the line; they are stripped before anything
//! else is examined.
//!
//! A line has the general shape
//!
//! ```ignore
//! LABEL:  body            ; comment
//! ```
//!
//! where the optional label ends with a colon and the body is either a
//! directive (first token starts with `.`) or an instruction. Labels
//! start with a letter, contain only letters and digits, are at most 30
//! characters long, and may not shadow a reserved word.

pub mod directives;
pub mod instructions;
pub mod operands;

use regex::Regex;

use super::error::ErrorKind;
use super::{MAX_LABEL_LENGTH, MAX_LINE_LENGTH, is_reserved_name};
use directives::DirectiveBody;
use instructions::Opcode;
use operands::Operand;

/// One line of source after parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// A blank line, or one holding nothing but a comment
    EmptyOrComment,
    Directive {
        label: Option<String>,
        body: DirectiveBody,
    },
    Operation {
        label: Option<String>,
        opcode: Opcode,
        operands: Vec<Operand>,
    },
}

/// Parse a single line of expanded source
pub fn parse_line(line: &str) -> Result<ParsedLine, ErrorKind> {
    if line.len() > MAX_LINE_LENGTH {
        return Err(ErrorKind::LineTooLong);
    }

    let code = match line.split_once(';') {
        Some((code, _comment)) => code,
        None => line,
    }
    .trim();

    if code.is_empty() {
        return Ok(ParsedLine::EmptyOrComment);
    }

    let (label, body) = split_label(code)?;

    if body.starts_with('.') {
        let body = directives::parse_directive(body)?;
        Ok(ParsedLine::Directive { label, body })
    } else {
        let (opcode, operands) = instructions::parse_operation(body)?;
        Ok(ParsedLine::Operation {
            label,
            opcode,
            operands,
        })
    }
}

/// Detach the optional leading label from a trimmed, non-empty line
fn split_label(code: &str) -> Result<(Option<String>, &str), ErrorKind> {
    let Some(first) = code.split_whitespace().next() else {
        return Ok((None, code));
    };
    match first.strip_suffix(':') {
        Some(name) => {
            validate_label(name)?;
            let body = code[first.len()..].trim();
            if body.is_empty() {
                // a label with nothing to attach to names no statement
                return Err(ErrorKind::UnknownCommandName);
            }
            Ok((Some(name.to_string()), body))
        }
        None => Ok((None, code)),
    }
}

/// Check a prospective label name against the character, length and
/// reserved-word rules
pub fn validate_label(name: &str) -> Result<(), ErrorKind> {
    let shape = Regex::new(r"^[a-zA-Z][a-zA-Z0-9]*$").unwrap();
    if !shape.is_match(name) {
        return Err(ErrorKind::IllegalLabel);
    }
    if name.len() > MAX_LABEL_LENGTH || is_reserved_name(name) {
        return Err(ErrorKind::InvalidLabel);
    }
    Ok(())
}
