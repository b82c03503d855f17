//! Pretty-printing messages to the console

use colored::Colorize;

/// Pretty-print an error message to the console
pub fn error(error_message: String) {
    let error_title = "error:".red().bold();
    eprintln!("{} {}", error_title, error_message);
}

/// Pretty-print an error message that concerns a specific source line
pub fn error_at(file_name: &str, line_number: usize, error_message: String) {
    let error_title = "error:".red().bold();
    eprintln!("{} {}:{}: {}", error_title, file_name, line_number, error_message);
}

/// Pretty-print a warning message to the console
pub fn warning(message: String) {
    let warning_title = "warning:".yellow().bold();
    eprintln!("{} {}", warning_title, message);
}

/// Pretty-print a warning message that concerns a specific source line
pub fn warning_at(file_name: &str, line_number: usize, message: String) {
    let warning_title = "warning:".yellow().bold();
    eprintln!("{} {}:{}: {}", warning_title, file_name, line_number, message);
}
