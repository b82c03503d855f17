//! First pass: symbol collection, address assignment and image sizing

use super::error::ErrorKind;
use super::parser::directives::DirectiveBody;
use super::parser::operands::Operand;
use super::parser::{self, ParsedLine};
use super::symbols::{SymbolFlags, SymbolTable};
use super::{BASE_ADDRESS, IMAGE_LENGTH};
use crate::logging;

/// Everything the first pass hands to the second
pub struct FirstPass {
    pub symbols: SymbolTable,
    /// Successfully parsed statements with their 1-based line numbers
    pub statements: Vec<(usize, ParsedLine)>,
    pub ic_final: usize,
    pub dc_final: usize,
    pub error_count: usize,
}

/// Walk the expanded source, building the symbol table and sizing both
/// images. Diagnostics are printed as they are found; the pass always
/// runs to the end of the file so every line gets its say.
pub fn run(expanded: &str, file_name: &str) -> FirstPass {
    let mut symbols = SymbolTable::new();
    let mut statements = Vec::new();
    let mut ic = 0usize;
    let mut dc = 0usize;
    let mut error_count = 0usize;

    let report = |line_number: usize, kind: ErrorKind| {
        logging::error_at(file_name, line_number, kind.to_string());
    };

    for (index, line) in expanded.lines().enumerate() {
        let line_number = index + 1;
        let parsed = match parser::parse_line(line) {
            Ok(parsed) => parsed,
            Err(kind) => {
                report(line_number, kind);
                error_count += 1;
                continue;
            }
        };

        match &parsed {
            ParsedLine::EmptyOrComment => continue,

            ParsedLine::Operation { label, operands, .. } => {
                if let Some(name) = label {
                    if let Err(kind) = symbols.insert(name, BASE_ADDRESS + ic, SymbolFlags::CODE) {
                        report(line_number, kind);
                        error_count += 1;
                    }
                }
                ic += instruction_words(operands);
            }

            ParsedLine::Directive { label, body } => {
                if body.defines_data() {
                    if let Some(name) = label {
                        if let Err(kind) =
                            symbols.insert(name, BASE_ADDRESS + dc, SymbolFlags::DATA)
                        {
                            report(line_number, kind);
                            error_count += 1;
                        }
                    }
                    dc += body.data_words();
                } else {
                    if label.is_some() {
                        logging::warning_at(
                            file_name,
                            line_number,
                            "label before .entry or .extern is ignored".to_string(),
                        );
                    }
                    let declaration = match body {
                        DirectiveBody::Entry(name) => Some((name, SymbolFlags::ENTRY)),
                        DirectiveBody::Extern(name) => Some((name, SymbolFlags::EXTERN)),
                        _ => None,
                    };
                    if let Some((name, flags)) = declaration {
                        if let Err(kind) = symbols.insert(name, 0, flags) {
                            report(line_number, kind);
                            error_count += 1;
                        }
                    }
                }
            }
        }

        statements.push((line_number, parsed));
    }

    symbols.bump_data_addresses(ic);

    // every exported symbol must exist locally by now
    for symbol in symbols.iter() {
        if !symbol.flags.contains(SymbolFlags::ENTRY) {
            continue;
        }
        let kind = if symbol.flags.contains(SymbolFlags::EXTERN) {
            Some(ErrorKind::ExternalSymbolCannotBeEntry)
        } else if !symbol.flags.intersects(SymbolFlags::CODE | SymbolFlags::DATA) {
            Some(ErrorKind::EntrySymbolNotDefined)
        } else {
            None
        };
        if let Some(kind) = kind {
            logging::error(format!("{}: {}: {}", file_name, symbol.name, kind));
            error_count += 1;
        }
    }

    if BASE_ADDRESS + ic + dc > IMAGE_LENGTH {
        logging::error(format!("{}: {}", file_name, ErrorKind::DataOverflow));
        error_count += 1;
    }

    FirstPass {
        symbols,
        statements,
        ic_final: ic,
        dc_final: dc,
        error_count,
    }
}

/// Machine words occupied by one instruction: one for the opcode plus
/// the operands' words, minus the word two registers share
fn instruction_words(operands: &[Operand]) -> usize {
    let mut words = 1 + operands.iter().map(Operand::word_count).sum::<usize>();
    if let [Operand::RegisterDirect(_), Operand::RegisterDirect(_)] = operands {
        words -= 1;
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_word_counts_cover_every_operand_shape() {
        let pass = run(
            "stop\n\
             inc r1\n\
             prn #5\n\
             mov r1, r2\n\
             mov r1, LEN\n\
             lea M[r1][r2], r6\n\
             LEN: .data 1\n\
             M: .mat [2][2]\n",
            "test.am",
        );
        assert_eq!(pass.error_count, 0);
        // 1 + 2 + 2 + 2 + 3 + 4
        assert_eq!(pass.ic_final, 14);
        assert_eq!(pass.dc_final, 5);
    }

    #[test]
    fn code_labels_get_instruction_addresses() {
        let pass = run("A: stop\nB: mov r1, r2\nC: stop\n", "test.am");
        assert_eq!(pass.error_count, 0);
        assert_eq!(pass.symbols.lookup("A").unwrap().address, 100);
        assert_eq!(pass.symbols.lookup("B").unwrap().address, 101);
        assert_eq!(pass.symbols.lookup("C").unwrap().address, 103);
    }

    #[test]
    fn data_labels_are_rebased_past_the_code() {
        let pass = run(
            "MAIN: mov r1, r2\n\
             \tstop\n\
             VAL: .data 5\n\
             STR: .string \"ab\"\n\
             .entry MAIN\n",
            "test.am",
        );
        assert_eq!(pass.error_count, 0);
        assert_eq!(pass.ic_final, 3);
        assert_eq!(pass.dc_final, 4);

        let main = pass.symbols.lookup("MAIN").unwrap();
        assert_eq!(main.address, 100);
        assert!(main.flags.contains(SymbolFlags::CODE | SymbolFlags::ENTRY));

        let val = pass.symbols.lookup("VAL").unwrap();
        assert_eq!(val.address, 103);
        assert!(val.flags.contains(SymbolFlags::DATA));

        assert_eq!(pass.symbols.lookup("STR").unwrap().address, 104);
    }

    #[test]
    fn entry_may_precede_the_definition() {
        let pass = run(".entry MAIN\nMAIN: stop\n", "test.am");
        assert_eq!(pass.error_count, 0);
        let main = pass.symbols.lookup("MAIN").unwrap();
        assert_eq!(main.address, 100);
        assert!(main.flags.contains(SymbolFlags::CODE | SymbolFlags::ENTRY));
    }

    #[test]
    fn an_undefined_entry_is_reported() {
        let pass = run(".entry GHOST\nstop\n", "test.am");
        assert_eq!(pass.error_count, 1);
    }

    #[test]
    fn an_extern_cannot_also_be_an_entry() {
        let pass = run(".extern X\n.entry X\nstop\n", "test.am");
        assert_eq!(pass.error_count, 1);
    }

    #[test]
    fn parse_errors_accumulate_without_stopping_the_pass() {
        let pass = run(
            "bogus r1\n\
             mov r1, r2, r3\n\
             stop\n\
             A: stop\n",
            "test.am",
        );
        assert_eq!(pass.error_count, 2);
        // the two healthy lines were still counted and retained
        assert_eq!(pass.ic_final, 2);
        assert_eq!(pass.statements.len(), 2);
        assert!(pass.symbols.lookup("A").is_some());
    }

    #[test]
    fn duplicate_labels_are_reported_per_line() {
        let pass = run("A: stop\nA: stop\n", "test.am");
        assert_eq!(pass.error_count, 1);
    }

    #[test]
    fn an_image_larger_than_memory_is_rejected() {
        // 40 matrix directives of 4 words each overflow the 156
        // machine words left past the code base
        let mut source = String::new();
        for _ in 0..40 {
            source.push_str(".mat [2][2]\n");
        }
        let pass = run(&source, "test.am");
        assert_eq!(pass.error_count, 1);
    }
}
