//! Progress output for container scripts.
//!
//! Sections and info go to stdout; errors go to stderr in red.

use colored::Colorize;

pub fn section(message: &str) {
    println!("{}", format!("==> {message}").cyan().bold());
}

pub fn info(message: &str) {
    println!("{message}");
}

pub fn error(message: &str) {
    eprintln!("{}", message.red());
}
