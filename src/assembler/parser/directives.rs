//! Parsing of the five assembler directives

use regex::Regex;

use super::validate_label;
use crate::assembler::error::ErrorKind;
use crate::assembler::{MAX_DATA_VALUES, MAX_MATRIX_DIMENSION, MAX_STRING_LENGTH};

/// The body of a directive line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveBody {
    /// `.data`: a list of initialized words
    Data(Vec<i16>),
    /// `.string`: characters followed by a zero terminator word
    StringLit(String),
    /// `.mat [rows][cols]` with optional row-major initializers
    Mat {
        rows: usize,
        cols: usize,
        cells: Vec<i16>,
    },
    /// `.entry`: export a locally defined symbol
    Entry(String),
    /// `.extern`: import a symbol defined elsewhere
    Extern(String),
}

impl DirectiveBody {
    /// How many data-image words the directive emits
    pub fn data_words(&self) -> usize {
        match self {
            DirectiveBody::Data(values) => values.len(),
            DirectiveBody::StringLit(text) => text.len() + 1,
            DirectiveBody::Mat { rows, cols, .. } => rows * cols,
            DirectiveBody::Entry(_) | DirectiveBody::Extern(_) => 0,
        }
    }

    /// Whether the directive defines storage a label can name
    pub fn defines_data(&self) -> bool {
        !matches!(self, DirectiveBody::Entry(_) | DirectiveBody::Extern(_))
    }
}

/// Parse a directive body: everything after the optional label,
/// beginning with the `.` of the directive name
pub fn parse_directive(body: &str) -> Result<DirectiveBody, ErrorKind> {
    let (name, rest) = match body.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (body, ""),
    };
    match name {
        ".data" => parse_data(rest),
        ".string" => parse_string(rest),
        ".mat" => parse_mat(rest),
        ".entry" => parse_symbol_directive(rest).map(DirectiveBody::Entry),
        ".extern" => parse_symbol_directive(rest).map(DirectiveBody::Extern),
        _ => Err(ErrorKind::InvalidDirective),
    }
}

fn parse_data(rest: &str) -> Result<DirectiveBody, ErrorKind> {
    if rest.is_empty() {
        return Err(ErrorKind::ExpectedOperand);
    }
    let mut values = Vec::new();
    for field in rest.split(',') {
        let field = field.trim();
        if field.is_empty() {
            return Err(ErrorKind::ExpectedOperand);
        }
        values.push(parse_data_value(field)?);
    }
    if values.len() > MAX_DATA_VALUES {
        return Err(ErrorKind::DataOverflow);
    }
    Ok(DirectiveBody::Data(values))
}

/// A signed decimal that fits the 10-bit machine word
fn parse_data_value(field: &str) -> Result<i16, ErrorKind> {
    let value: i32 = field.parse().map_err(|_| ErrorKind::InvalidNumberFormat)?;
    if !(-512..=511).contains(&value) {
        return Err(ErrorKind::InvalidNumberFormat);
    }
    Ok(value as i16)
}

fn parse_string(rest: &str) -> Result<DirectiveBody, ErrorKind> {
    let inner = rest
        .strip_prefix('"')
        .ok_or(ErrorKind::InvalidStringFormat)?;
    let close = inner.rfind('"').ok_or(ErrorKind::InvalidStringFormat)?;
    let (text, tail) = inner.split_at(close);
    if !tail[1..].trim().is_empty() {
        return Err(ErrorKind::TrailingCharacters);
    }
    if text.contains('"') || !text.is_ascii() {
        return Err(ErrorKind::InvalidStringFormat);
    }
    if text.len() >= MAX_STRING_LENGTH {
        return Err(ErrorKind::StringTooLong);
    }
    Ok(DirectiveBody::StringLit(text.to_string()))
}

fn parse_mat(rest: &str) -> Result<DirectiveBody, ErrorKind> {
    let shape = Regex::new(r"^\[([^\[\]]*)\]\[([^\[\]]*)\](.*)$").unwrap();
    let caps = shape
        .captures(rest)
        .ok_or(ErrorKind::InvalidMatrixFormat)?;
    let rows = parse_dimension(&caps[1])?;
    let cols = parse_dimension(&caps[2])?;
    let values = caps[3].trim();
    let cells = if values.is_empty() {
        vec![0; rows * cols]
    } else {
        parse_mat_values(values, rows * cols)?
    };
    Ok(DirectiveBody::Mat { rows, cols, cells })
}

/// One matrix dimension: a positive decimal within the machine bound
fn parse_dimension(text: &str) -> Result<usize, ErrorKind> {
    let value: usize = text
        .parse()
        .map_err(|_| ErrorKind::InvalidMatrixDimensions)?;
    if value == 0 || value > MAX_MATRIX_DIMENSION {
        return Err(ErrorKind::InvalidMatrixDimensions);
    }
    Ok(value)
}

fn parse_mat_values(text: &str, expected: usize) -> Result<Vec<i16>, ErrorKind> {
    let mut cells = Vec::new();
    for field in text.split(',') {
        let field = field.trim();
        if field.is_empty() {
            return Err(ErrorKind::ExpectedOperand);
        }
        cells.push(parse_data_value(field)?);
    }
    if cells.len() != expected {
        return Err(ErrorKind::InvalidMatrixInitialization);
    }
    Ok(cells)
}

/// `.entry` / `.extern` take exactly one legal label name
fn parse_symbol_directive(rest: &str) -> Result<String, ErrorKind> {
    if rest.is_empty() {
        return Err(ErrorKind::ExpectedOperand);
    }
    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or("");
    if parts.next().is_some() {
        return Err(ErrorKind::TrailingCharacters);
    }
    validate_label(name)?;
    Ok(name.to_string())
}
