// ABOUTME: Configuration constants for the REPL

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PROMPT: &str = "user> ";
pub const WELCOME_MESSAGE: &str = "mal-core REPL";
pub const WELCOME_SUBTITLE: &str = "a minimal trampolined Lisp evaluator";

/// A line at or over this length is a fatal error; see SPEC_FULL §6.
pub const MAX_LINE_BYTES: usize = 16 * 1024;
