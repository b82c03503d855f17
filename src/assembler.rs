//! Converts assembly for a 10-bit teaching machine into base-4 object
//! text in a two-pass manner
//!
//! The macro preprocessor first rewrites the source into its expanded
//! form. The first pass then resolves labels and generates a symbol
//! table, while the second pass generates the machine words and the
//! output files.
//!
//! Comments start with a semicolon (`;`) and continue to the end of the
//! line. Labels are case-sensitive names of at most 30 letters and
//! digits, defined with a colon at the start of a line:
//!
//! ```ignore
//! MAIN:   mov r1, r2
//! LOOP:   dec r1
//!         bne LOOP
//!         stop
//! VAL:    .data 5, -3
//! MSG:    .string "done"
//! TBL:    .mat [2][3] 1,2,3,4,5,6
//! ```
//!
//! The machine has eight registers `r0`..`r7` and four addressing
//! modes: immediate (`#5`), direct (`LABEL`), matrix access
//! (`LABEL[r1][r2]`) and register direct (`r3`).
//!
//! The assembler supports the following instructions:
//! - mov, cmp, add, sub, lea: two operands
//! - clr, not, inc, dec, jmp, bne, red, prn, jsr: one operand
//! - rts, stop: no operands
//!
//! The assembler supports the following directives:
//! - .data: store a list of initialized words
//! - .string: store a zero-terminated ASCII string
//! - .mat: store a matrix, zero-filled or initialized row-major
//! - .entry: export a symbol through the entry file
//! - .extern: import a symbol defined in another file
//!
//! Macros are defined with `mcro NAME` ... `mcrend` and expanded
//! wherever NAME stands alone on a line.
//!
//! For an input named `prog`, the assembler reads `prog.as` and writes
//! `prog.am` (the expanded source), `prog.ob` (the object text) and,
//! when they would have content, `prog.ent` and `prog.ext`.

pub mod encoding;
pub mod error;
pub mod first_pass;
pub mod parser;
pub mod preprocessor;
pub mod second_pass;
pub mod symbols;

use std::fs;

use crate::logging;
use error::ErrorKind;
use second_pass::ObjectOutput;

/// Maximum length of a source line, excluding the line terminator
pub const MAX_LINE_LENGTH: usize = 80;
/// Maximum length of a label name
pub const MAX_LABEL_LENGTH: usize = 30;
/// Maximum rows or columns of a matrix
pub const MAX_MATRIX_DIMENSION: usize = 15;
/// Maximum number of values on a single `.data` line
pub const MAX_DATA_VALUES: usize = 32;
/// Maximum length of a string literal, excluding quotes and terminator
pub const MAX_STRING_LENGTH: usize = 64;
/// Number of machine words an assembled image may occupy in total
pub const IMAGE_LENGTH: usize = 256;
/// Load address of the first code word
pub const BASE_ADDRESS: usize = 100;

const MNEMONICS: [&str; 16] = [
    "mov", "cmp", "add", "sub", "not", "clr", "lea", "inc", "dec", "jmp", "bne", "red", "prn",
    "jsr", "rts", "stop",
];

// the directive names are reserved both with and without the dot
const DIRECTIVES: [&str; 10] = [
    "data", "string", "mat", "entry", "extern", ".data", ".string", ".mat", ".entry", ".extern",
];

const REGISTERS: [&str; 8] = ["r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7"];

const MACRO_DELIMITERS: [&str; 3] = ["mcro", "mcrend", "endmcro"];

/// Reserved words that no label, macro name, or symbol may shadow
pub fn is_reserved_name(name: &str) -> bool {
    MNEMONICS.contains(&name)
        || DIRECTIVES.contains(&name)
        || REGISTERS.contains(&name)
        || MACRO_DELIMITERS.contains(&name)
}

/// Assemble a whole source text in memory, returning the expanded
/// source and the encoded output. Diagnostics are printed as they are
/// found; the error count is returned on failure.
pub fn assemble(source: &str, file_name: &str) -> Result<(String, ObjectOutput), usize> {
    let expanded = preprocessor::preprocess(source, file_name)?;
    let pass = first_pass::run(&expanded, file_name);
    if pass.error_count > 0 {
        return Err(pass.error_count);
    }
    let output = second_pass::run(&pass.statements, &pass.symbols, file_name)?;
    Ok((expanded, output))
}

/// Assemble `<stem>.as` into its output files. Diagnostics are printed
/// as they are found and the error count is returned on failure; no
/// output file of a failed stage is left on disk.
pub fn assemble_file(stem: &str) -> Result<(), usize> {
    let source_path = format!("{stem}.as");
    let am_path = format!("{stem}.am");

    let source = match fs::read_to_string(&source_path) {
        Ok(source) => source,
        Err(_) => {
            logging::error(format!("{}: {}", source_path, ErrorKind::CannotOpenFile));
            return Err(1);
        }
    };

    let expanded = match preprocessor::preprocess(&source, &source_path) {
        Ok(expanded) => expanded,
        Err(count) => {
            // a stale expansion from an earlier run must not survive
            let _ = fs::remove_file(&am_path);
            return Err(count);
        }
    };

    if fs::write(&am_path, &expanded).is_err() {
        logging::error(format!("{}: {}", am_path, ErrorKind::WriteFailed));
        let _ = fs::remove_file(&am_path);
        return Err(1);
    }

    // the passes report against the expanded file, whose line numbers
    // are the ones they see
    let pass = first_pass::run(&expanded, &am_path);
    if pass.error_count > 0 {
        return Err(pass.error_count);
    }

    let output = second_pass::run(&pass.statements, &pass.symbols, &am_path)?;
    second_pass::write_outputs(stem, &output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_names_cover_every_category() {
        assert!(is_reserved_name("mov"));
        assert!(is_reserved_name("stop"));
        assert!(is_reserved_name("data"));
        assert!(is_reserved_name(".data"));
        assert!(is_reserved_name("extern"));
        assert!(is_reserved_name(".extern"));
        assert!(is_reserved_name("r0"));
        assert!(is_reserved_name("r7"));
        assert!(is_reserved_name("mcro"));
        assert!(is_reserved_name("endmcro"));
        assert!(!is_reserved_name("r8"));
        assert!(!is_reserved_name("MOV"));
        assert!(!is_reserved_name("main"));
    }

    #[test]
    fn a_macro_heavy_program_assembles_end_to_end() {
        let source = "mcro finish\n\
                      stop\n\
                      mcrend\n\
                      MAIN: mov r1, r2\n\
                      finish\n\
                      VAL: .data 5\n\
                      .entry MAIN\n";
        let (expanded, output) = assemble(source, "prog.as").unwrap();
        assert_eq!(
            expanded,
            "MAIN: mov r1, r2\nstop\nVAL: .data 5\n.entry MAIN\n"
        );
        assert_eq!(output.code.len(), 3);
        assert_eq!(output.data, vec![5]);
        assert_eq!(output.entries, vec![("MAIN".to_string(), 100)]);
        assert!(output.externals.is_empty());
    }

    #[test]
    fn the_code_image_ends_where_the_data_image_begins() {
        let source = "mov r1, LEN\nstop\nLEN: .data 9\n";
        let (_, output) = assemble(source, "prog.as").unwrap();
        let first_data_address = BASE_ADDRESS + output.code.len();
        // LEN names the first data word
        assert_eq!(
            output.code[2],
            ((first_data_address as u16) << 2) | encoding::ARE_RELOCATABLE
        );
    }

    #[test]
    fn assembly_fails_when_any_stage_reports() {
        // preprocessor: reserved macro name
        assert!(assemble("mcro mov\nsub r1, r1\nendmcro\n", "p.as").is_err());
        // first pass: unparseable line
        assert!(assemble("mov r1, r2, r3\n", "p.as").is_err());
        // second pass: unresolved symbol
        assert!(assemble("jmp NOWHERE\n", "p.as").is_err());
    }

    fn scratch_stem(tag: &str) -> String {
        let dir = std::env::temp_dir().join(format!("asm10-{}-{}", tag, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir.join("prog").to_string_lossy().into_owned()
    }

    fn exists(path: String) -> bool {
        fs::metadata(path).is_ok()
    }

    #[test]
    fn assemble_file_writes_the_expected_outputs() {
        let stem = scratch_stem("ok");
        fs::write(
            format!("{stem}.as"),
            "MAIN: mov r1, r2\nstop\nVAL: .data 5\n.entry MAIN\n",
        )
        .unwrap();

        assemble_file(&stem).unwrap();

        let expanded = fs::read_to_string(format!("{stem}.am")).unwrap();
        assert!(expanded.starts_with("MAIN:"));
        let object = fs::read_to_string(format!("{stem}.ob")).unwrap();
        assert!(object.starts_with("aad ab\n"));
        let entries = fs::read_to_string(format!("{stem}.ent")).unwrap();
        assert_eq!(entries, "MAIN\tbcba\n");
        assert!(!exists(format!("{stem}.ext")));
    }

    #[test]
    fn a_failed_expansion_leaves_no_am_file_behind() {
        let stem = scratch_stem("badmacro");
        fs::write(format!("{stem}.as"), "mcro mov\nsub r1, r1\nendmcro\n").unwrap();

        assert!(assemble_file(&stem).is_err());
        assert!(!exists(format!("{stem}.am")));
    }

    #[test]
    fn a_failed_pass_leaves_no_object_behind() {
        let stem = scratch_stem("undef");
        fs::write(format!("{stem}.as"), "jmp NOWHERE\n").unwrap();

        assert!(assemble_file(&stem).is_err());
        // the expansion itself succeeded, so the .am file stays
        assert!(exists(format!("{stem}.am")));
        assert!(!exists(format!("{stem}.ob")));
    }

    #[test]
    fn a_missing_source_is_reported() {
        let stem = scratch_stem("missing");
        assert!(assemble_file(&stem).is_err());
    }
}
