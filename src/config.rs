// ABOUTME: Configuration and constants for the Blisp interpreter
// This module holds version info, the REPL welcome banner, and the
// filesystem sandbox defaults used by the `load` builtin.

use std::path::PathBuf;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const WELCOME_MESSAGE: &str = "Blisp";
pub const WELCOME_SUBTITLE: &str = "A small Lisp-family interpreter";
pub const WELCOME_FOOTER: &str = "Ctrl-D to exit.";

/// Filesystem sandbox configuration used by the `load` builtin.
///
/// Paths supplied directly on the command line (`blisp script.bl`) are
/// trusted input and bypass this sandbox; it only governs `(load "...")`
/// calls made from *within* running Blisp code.
#[derive(Debug, Clone)]
pub struct FsConfig {
    pub allowed_paths: Vec<PathBuf>,
    pub max_file_size: usize,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            allowed_paths: vec![PathBuf::from("./data"), PathBuf::from("./scripts")],
            max_file_size: 10 * 1024 * 1024,
        }
    }
}
