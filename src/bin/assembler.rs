use std::env;
use asm10::assembler;
use asm10::logging::warning;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <source> [<source> ...]", args[0]);
        std::process::exit(1);
    }

    let mut failed = false;
    for stem in &args[1..] {
        if stem.ends_with(".as") {
            warning(format!(
                "{}: the \".as\" extension is appended automatically", stem
            ));
        }
        if assembler::assemble_file(stem).is_err() {
            failed = true;
        }
    }

    if failed {
        std::process::exit(2);
    }
}
