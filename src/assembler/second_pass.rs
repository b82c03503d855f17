//! Second pass: instruction encoding, symbol resolution and the base-4
//! output files

use std::fs;

use super::BASE_ADDRESS;
use super::encoding::{self, Word};
use super::error::ErrorKind;
use super::parser::ParsedLine;
use super::parser::directives::DirectiveBody;
use super::parser::instructions::Opcode;
use super::parser::operands::Operand;
use super::symbols::{SymbolFlags, SymbolTable};
use crate::logging;

/// The encoded images and symbol usage records for one file
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ObjectOutput {
    pub code: Vec<Word>,
    pub data: Vec<Word>,
    /// Entry symbols, address ascending
    pub entries: Vec<(String, usize)>,
    /// External usages in the order their reference words were emitted
    pub externals: Vec<(String, usize)>,
}

/// Encode every retained statement against the final symbol table.
/// Unresolved references are reported per line; when any surface the
/// scan still finishes, but no output may be written.
pub fn run(
    statements: &[(usize, ParsedLine)],
    symbols: &SymbolTable,
    file_name: &str,
) -> Result<ObjectOutput, usize> {
    let mut output = ObjectOutput::default();
    let mut error_count = 0usize;

    for (line_number, statement) in statements {
        match statement {
            ParsedLine::Operation { opcode, operands, .. } => {
                if let Err(kind) = encode_operation(*opcode, operands, symbols, &mut output) {
                    logging::error_at(file_name, *line_number, kind.to_string());
                    error_count += 1;
                }
            }
            ParsedLine::Directive { body, .. } => encode_directive(body, &mut output.data),
            ParsedLine::EmptyOrComment => {}
        }
    }

    for symbol in symbols.iter() {
        if symbol.flags.contains(SymbolFlags::ENTRY) {
            output.entries.push((symbol.name.clone(), symbol.address));
        }
    }
    output.entries.sort_by_key(|(_, address)| *address);

    if error_count > 0 {
        Err(error_count)
    } else {
        Ok(output)
    }
}

fn encode_operation(
    opcode: Opcode,
    operands: &[Operand],
    symbols: &SymbolTable,
    output: &mut ObjectOutput,
) -> Result<(), ErrorKind> {
    let (src, dst): (Option<&Operand>, Option<&Operand>) = match operands {
        [src, dst] => (Some(src), Some(dst)),
        [dst] => (None, Some(dst)),
        _ => (None, None),
    };

    let src_mode = src.map_or(0, |operand| operand.mode().code());
    let dst_mode = dst.map_or(0, |operand| operand.mode().code());
    output
        .code
        .push(encoding::first_word(opcode.code(), src_mode, dst_mode));

    // two register operands share a single combined word
    if let (Some(Operand::RegisterDirect(a)), Some(Operand::RegisterDirect(b))) = (src, dst) {
        output.code.push(encoding::register_word(Some(*a), Some(*b)));
        return Ok(());
    }

    if let Some(operand) = src {
        encode_operand(operand, true, symbols, output)?;
    }
    if let Some(operand) = dst {
        encode_operand(operand, false, symbols, output)?;
    }
    Ok(())
}

fn encode_operand(
    operand: &Operand,
    is_source: bool,
    symbols: &SymbolTable,
    output: &mut ObjectOutput,
) -> Result<(), ErrorKind> {
    match operand {
        Operand::Immediate(value) => output.code.push(encoding::immediate_word(*value)),
        Operand::RegisterDirect(register) => {
            let word = if is_source {
                encoding::register_word(Some(*register), None)
            } else {
                encoding::register_word(None, Some(*register))
            };
            output.code.push(word);
        }
        Operand::Direct(label) => push_symbol_word(label, symbols, output)?,
        Operand::MatrixAccess {
            label,
            row_reg,
            col_reg,
        } => {
            push_symbol_word(label, symbols, output)?;
            output
                .code
                .push(encoding::matrix_index_word(*row_reg, *col_reg));
        }
    }
    Ok(())
}

/// Resolve a symbol reference into one relocatable or external word.
/// External usages are recorded with the absolute address of the word
/// being emitted.
fn push_symbol_word(
    label: &str,
    symbols: &SymbolTable,
    output: &mut ObjectOutput,
) -> Result<(), ErrorKind> {
    let symbol = symbols.lookup(label).ok_or(ErrorKind::UndefinedSymbolUsed)?;
    if symbol.flags.contains(SymbolFlags::EXTERN) {
        output
            .externals
            .push((label.to_string(), BASE_ADDRESS + output.code.len()));
        output.code.push(encoding::external_word());
    } else {
        output.code.push(encoding::relocatable_word(symbol.address));
    }
    Ok(())
}

fn encode_directive(body: &DirectiveBody, data: &mut Vec<Word>) {
    match body {
        DirectiveBody::Data(values) => {
            data.extend(values.iter().map(|&value| encoding::data_word(value)));
        }
        DirectiveBody::StringLit(text) => {
            data.extend(text.bytes().map(Word::from));
            data.push(0);
        }
        DirectiveBody::Mat { cells, .. } => {
            data.extend(cells.iter().map(|&value| encoding::data_word(value)));
        }
        DirectiveBody::Entry(_) | DirectiveBody::Extern(_) => {}
    }
}

/// Render the `.ob` object text: the length header, then one line per
/// word, code first, data following immediately
pub fn render_object(output: &ObjectOutput) -> String {
    let mut text = format!(
        "{} {}\n",
        encoding::to_base4(output.code.len() as u16, encoding::CODE_LEN_BASE4_WIDTH),
        encoding::to_base4(output.data.len() as u16, encoding::DATA_LEN_BASE4_WIDTH),
    );
    let words = output.code.iter().chain(output.data.iter());
    for (offset, word) in words.enumerate() {
        text.push_str(&format!(
            "{}\t{}\n",
            encoding::to_base4((BASE_ADDRESS + offset) as u16, encoding::ADDRESS_BASE4_WIDTH),
            encoding::to_base4(*word, encoding::WORD_BASE4_WIDTH),
        ));
    }
    text
}

/// Render the `.ent` text; empty when the file exports nothing
pub fn render_entries(output: &ObjectOutput) -> String {
    let mut text = String::new();
    for (name, address) in &output.entries {
        text.push_str(&format!(
            "{}\t{}\n",
            name,
            encoding::to_base4(*address as u16, encoding::ADDRESS_BASE4_WIDTH),
        ));
    }
    text
}

/// Render the `.ext` text; empty when no external symbol is used
pub fn render_externals(output: &ObjectOutput) -> String {
    let mut text = String::new();
    for (name, address) in &output.externals {
        text.push_str(&format!(
            "{}\t{}\n",
            name,
            encoding::to_base4(*address as u16, encoding::ADDRESS_BASE4_WIDTH),
        ));
    }
    text
}

/// Write `.ob` and, when they have content, `.ent` / `.ext`. If any
/// write fails, every file written so far is removed so a failed run
/// leaves nothing behind.
pub fn write_outputs(stem: &str, output: &ObjectOutput) -> Result<(), usize> {
    let ob_path = format!("{stem}.ob");
    let ent_path = format!("{stem}.ent");
    let ext_path = format!("{stem}.ext");

    let mut plan: Vec<(&str, String)> = vec![(ob_path.as_str(), render_object(output))];
    if !output.entries.is_empty() {
        plan.push((ent_path.as_str(), render_entries(output)));
    }
    if !output.externals.is_empty() {
        plan.push((ext_path.as_str(), render_externals(output)));
    }

    let mut written: Vec<&str> = Vec::new();
    for (path, text) in &plan {
        if fs::write(path, text).is_err() {
            logging::error(format!("{}: {}", path, ErrorKind::WriteFailed));
            for cleanup in &written {
                let _ = fs::remove_file(cleanup);
            }
            return Err(1);
        }
        written.push(*path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::first_pass;

    fn encode(source: &str) -> Result<ObjectOutput, usize> {
        let pass = first_pass::run(source, "test.am");
        assert_eq!(pass.error_count, 0, "unexpected first pass errors");
        run(&pass.statements, &pass.symbols, "test.am")
    }

    #[test]
    fn a_minimal_program_encodes_end_to_end() {
        let output = encode(
            "MAIN: mov r1, r2\n\
             \tstop\n\
             VAL: .data 5\n\
             .entry MAIN\n",
        )
        .unwrap();

        // mov: opcode 0, both modes 3, then the shared register word
        // stop: opcode 15 alone
        assert_eq!(output.code, vec![0b0000_1111_00, (1 << 6) | (2 << 2), 15 << 6]);
        assert_eq!(output.data, vec![5]);
        assert_eq!(output.entries, vec![("MAIN".to_string(), 100)]);
        assert!(output.externals.is_empty());
    }

    #[test]
    fn direct_references_are_relocatable_words() {
        let output = encode("A: stop\njmp A\n").unwrap();
        // jmp: opcode 9, destination mode 1
        assert_eq!(
            output.code,
            vec![15 << 6, (9 << 6) | (1 << 2), (100 << 2) | encoding::ARE_RELOCATABLE]
        );
    }

    #[test]
    fn external_references_emit_zero_words_and_records() {
        let output = encode(".extern X\njmp X\ncmp X, X\n").unwrap();
        assert_eq!(
            output.code,
            vec![
                (9 << 6) | (1 << 2),
                encoding::ARE_EXTERNAL,
                (1 << 6) | (1 << 4) | (1 << 2),
                encoding::ARE_EXTERNAL,
                encoding::ARE_EXTERNAL,
            ]
        );
        assert_eq!(
            output.externals,
            vec![
                ("X".to_string(), 101),
                ("X".to_string(), 103),
                ("X".to_string(), 104),
            ]
        );
    }

    #[test]
    fn matrix_access_emits_base_and_index_words() {
        let output = encode("M: .mat [2][2]\nmov M[r1][r2], r3\n").unwrap();
        assert_eq!(
            output.code,
            vec![
                (2 << 4) | (3 << 2),
                (104 << 2) | encoding::ARE_RELOCATABLE,
                (1 << 6) | (2 << 2),
                3 << 2,
            ]
        );
        assert_eq!(output.data, vec![0, 0, 0, 0]);
    }

    #[test]
    fn single_operands_are_encoded_as_destinations() {
        let output = encode("clr r5\n").unwrap();
        assert_eq!(output.code, vec![(5 << 6) | (3 << 2), 5 << 2]);
    }

    #[test]
    fn immediates_ride_in_the_payload_bits() {
        let output = encode("prn #-1\n").unwrap();
        assert_eq!(output.code, vec![(12 << 6), 0b1111_1111_00]);
    }

    #[test]
    fn strings_gain_a_zero_terminator() {
        let output = encode("S: .string \"ab\"\nstop\n").unwrap();
        assert_eq!(output.data, vec![u16::from(b'a'), u16::from(b'b'), 0]);
    }

    #[test]
    fn an_unresolved_symbol_fails_the_file() {
        let pass = first_pass::run("jmp NOWHERE\n", "test.am");
        assert_eq!(pass.error_count, 0);
        assert_eq!(run(&pass.statements, &pass.symbols, "test.am"), Err(1));
    }

    #[test]
    fn every_emitted_word_fits_ten_bits() {
        let output = encode(
            "MAIN: mov #-128, r7\n\
             cmp r7, #127\n\
             V: .data -512, 511\n\
             jmp MAIN\n",
        )
        .unwrap();
        for word in output.code.iter().chain(output.data.iter()) {
            assert_eq!(word & !encoding::WORD_MASK, 0);
        }
    }

    #[test]
    fn the_object_text_has_the_expected_layout() {
        let output = encode(
            "MAIN: mov r1, r2\n\
             \tstop\n\
             VAL: .data 5\n\
             .entry MAIN\n",
        )
        .unwrap();
        assert_eq!(
            render_object(&output),
            "aad ab\n\
             bcba\taadda\n\
             bcbb\tabaca\n\
             bcbc\tddaaa\n\
             bcbd\taaabb\n"
        );
        assert_eq!(render_entries(&output), "MAIN\tbcba\n");
        assert_eq!(render_externals(&output), "");
    }

    #[test]
    fn entries_render_in_address_order() {
        let output = encode(
            ".entry B\n\
             .entry A\n\
             A: stop\n\
             B: stop\n",
        )
        .unwrap();
        assert_eq!(render_entries(&output), "A\tbcba\nB\tbcbb\n");
    }
}
