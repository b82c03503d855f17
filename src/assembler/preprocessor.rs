//! Whole-file macro expansion
//!
//! The preprocessor runs before any parsing. A definition opens with
//! `mcro NAME` and closes with `mcrend` (the spelling `endmcro` is
//! accepted as well); everything between the delimiters is recorded
//! verbatim. A later line holding nothing but a defined name is replaced
//! by the recorded body; every other line passes through untouched.
//! Definitions may not nest, and macro names may not shadow reserved
//! words or earlier macros.

use std::collections::HashMap;

use super::error::ErrorKind;
use super::is_reserved_name;
use crate::logging;

/// A recorded macro: the raw lines between the delimiters
#[derive(Debug, Default)]
struct Macro {
    body: Vec<String>,
}

/// Tokens that close an open definition
fn is_end_delimiter(token: &str) -> bool {
    token == "mcrend" || token == "endmcro"
}

/// Expand every macro in `source`, returning the text destined for the
/// `.am` file. Diagnostics are printed as they are found; the total
/// error count is returned when any definition or call site is
/// malformed.
pub fn preprocess(source: &str, file_name: &str) -> Result<String, usize> {
    let mut macros: HashMap<String, Macro> = HashMap::new();
    let mut collecting: Option<String> = None;
    let mut expanded = String::new();
    let mut error_count = 0usize;

    for (index, line) in source.lines().enumerate() {
        let line_number = index + 1;
        let mut tokens = line.split_whitespace();
        let first = tokens.next();

        if let Some(name) = &collecting {
            match first {
                Some(token) if is_end_delimiter(token) => {
                    if tokens.next().is_some() {
                        logging::error_at(
                            file_name,
                            line_number,
                            ErrorKind::TokenAfterMacro.to_string(),
                        );
                        error_count += 1;
                    }
                    collecting = None;
                }
                Some("mcro") => {
                    // definitions may not nest
                    logging::error_at(
                        file_name,
                        line_number,
                        ErrorKind::InvalidMacroName.to_string(),
                    );
                    error_count += 1;
                }
                _ => {
                    if let Some(entry) = macros.get_mut(name) {
                        entry.body.push(line.to_string());
                    }
                }
            }
            continue;
        }

        match first {
            Some("mcro") => match tokens.next() {
                None => {
                    logging::error_at(
                        file_name,
                        line_number,
                        ErrorKind::InvalidMacroName.to_string(),
                    );
                    error_count += 1;
                }
                Some(name) => {
                    if tokens.next().is_some() {
                        logging::error_at(
                            file_name,
                            line_number,
                            ErrorKind::TokenAfterMacro.to_string(),
                        );
                        error_count += 1;
                    } else if is_reserved_name(name) || macros.contains_key(name) {
                        logging::error_at(
                            file_name,
                            line_number,
                            ErrorKind::InvalidMacroName.to_string(),
                        );
                        error_count += 1;
                    } else {
                        macros.insert(name.to_string(), Macro::default());
                        collecting = Some(name.to_string());
                    }
                }
            },
            Some(name) => {
                if macros.contains_key(name) && tokens.next().is_none() {
                    for body_line in &macros[name].body {
                        expanded.push_str(body_line);
                        expanded.push('\n');
                    }
                } else {
                    expanded.push_str(line);
                    expanded.push('\n');
                }
            }
            None => {
                expanded.push_str(line);
                expanded.push('\n');
            }
        }
    }

    if collecting.is_some() {
        // the file ended inside a definition
        logging::error(format!("{}: {}", file_name, ErrorKind::InvalidMacroName));
        error_count += 1;
    }

    if error_count > 0 {
        Err(error_count)
    } else {
        Ok(expanded)
    }
}
