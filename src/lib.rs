//! A two-pass assembler for a small 10-bit teaching machine, featuring:
//! - macro preprocessor
//! - strict line parser
//! - base-4 object file output

pub mod assembler;
pub mod logging;
