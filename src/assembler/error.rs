//! The flat error taxonomy shared by every stage of the assembler

use std::fmt;

/// Everything that can go wrong while assembling a file.
///
/// Each kind carries a fixed human-readable message; the stage that
/// detects the error attaches the file name and line number when it
/// reports the diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    // Resources
    CannotOpenFile,
    WriteFailed,
    MemoryAllocationFailed,

    // Lexical
    LineTooLong,
    TrailingCharacters,

    // Macros
    InvalidMacroName,
    TokenAfterMacro,

    // Labels
    InvalidLabel,
    IllegalLabel,
    DuplicateLabelDefinition,

    // Statements
    UnknownCommandName,
    InvalidDirective,
    InvalidOperandSyntax,
    ExpectedOperand,
    InvalidOperandCountForCommand,
    TooManyOperands,

    // Operands
    InvalidNumberFormat,
    InvalidStringFormat,
    StringTooLong,
    InvalidMatrixDimensions,
    InvalidMatrixInitialization,
    InvalidMatrixFormat,
    InvalidRegister,
    InvalidAddressingMode,
    DataOverflow,

    // Semantics
    UndefinedSymbolUsed,
    ExternalSymbolCannotBeEntry,
    EntrySymbolNotDefined,
    DuplicateEntryDeclaration,
}

impl ErrorKind {
    /// The fixed message for this error kind
    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::CannotOpenFile => "cannot open file",
            ErrorKind::WriteFailed => "failed to write output file",
            ErrorKind::MemoryAllocationFailed => "memory allocation failed",

            ErrorKind::LineTooLong => "line exceeds the maximum length",
            ErrorKind::TrailingCharacters => "unexpected characters at end of statement",

            ErrorKind::InvalidMacroName => "invalid macro definition or name",
            ErrorKind::TokenAfterMacro => "unexpected token after macro delimiter",

            ErrorKind::InvalidLabel => "label is too long or shadows a reserved word",
            ErrorKind::IllegalLabel => "label contains illegal characters",
            ErrorKind::DuplicateLabelDefinition => "label is already defined",

            ErrorKind::UnknownCommandName => "unknown command name",
            ErrorKind::InvalidDirective => "unknown directive",
            ErrorKind::InvalidOperandSyntax => "operand matches no addressing mode",
            ErrorKind::ExpectedOperand => "expected an operand",
            ErrorKind::InvalidOperandCountForCommand => "missing operand for command",
            ErrorKind::TooManyOperands => "too many operands for command",

            ErrorKind::InvalidNumberFormat => "invalid or out-of-range number",
            ErrorKind::InvalidStringFormat => "malformed string literal",
            ErrorKind::StringTooLong => "string literal exceeds the maximum length",
            ErrorKind::InvalidMatrixDimensions => "matrix dimensions must be positive and within bounds",
            ErrorKind::InvalidMatrixInitialization => "matrix initializer count does not match its dimensions",
            ErrorKind::InvalidMatrixFormat => "malformed matrix syntax",
            ErrorKind::InvalidRegister => "no such register",
            ErrorKind::InvalidAddressingMode => "addressing mode not allowed for this command",
            ErrorKind::DataOverflow => "data exceeds the machine's capacity",

            ErrorKind::UndefinedSymbolUsed => "use of undefined symbol",
            ErrorKind::ExternalSymbolCannotBeEntry => "external symbol cannot be an entry",
            ErrorKind::EntrySymbolNotDefined => "entry symbol is never defined",
            ErrorKind::DuplicateEntryDeclaration => "symbol is already declared as an entry",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ErrorKind {}
