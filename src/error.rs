// ABOUTME: Error types for the reader and the evaluator

use thiserror::Error;

// ===== Arity constant strings (eliminates allocations in error paths) =====
pub const ARITY_TWO: &str = "2";
pub const ARITY_AT_LEAST_ONE: &str = "at least 1";
pub const ARITY_TWO_OR_THREE: &str = "2-3";

/// Errors raised while tokenizing or parsing source text. Never aborts the
/// process: the REPL prints `PARSE ERROR: <message>` and keeps going.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    #[error("expected ')', got EOF")]
    EofInList,
    #[error("expected ']', got EOF")]
    EofInVector,
    #[error("expected '}}', got EOF")]
    EofInHashMap,
    #[error("expected '\"', got EOF")]
    EofInString,
    #[error("invalid number literal: {0}")]
    InvalidNumber(String),
    #[error("hash-map literal has an odd number of forms")]
    OddHashMapBody,
    #[error("hash-map keys must be strings or keywords, got {0}")]
    InvalidHashMapKey(String),
    #[error("unexpected ')'")]
    UnexpectedCloseParen,
}

/// Errors raised while evaluating. Never aborts the process: the REPL prints
/// `RUNTIME ERROR: <message>` and keeps going.
#[derive(Error, Debug, Clone)]
pub enum RuntimeError {
    #[error("'{0}' not found")]
    NotFound(String),

    #[error("not a function")]
    NotCallable,

    #[error("{function}: expected {expected} argument{}, got {actual}", if expected.as_str() == "1" { "" } else { "s" })]
    ArityMismatch {
        function: String,
        expected: String,
        actual: usize,
    },

    #[error("{function}: expected {expected} at argument {position}, got {actual}")]
    TypeMismatch {
        function: String,
        expected: String,
        actual: String,
        position: usize,
    },

    #[error("division by zero")]
    DivideByZero,

    #[error("{0}")]
    Custom(String),
}

impl RuntimeError {
    pub fn arity(function: &str, expected: impl Into<String>, actual: usize) -> Self {
        RuntimeError::ArityMismatch {
            function: function.to_string(),
            expected: expected.into(),
            actual,
        }
    }

    pub fn type_error(function: &str, expected: &str, actual: &str, position: usize) -> Self {
        RuntimeError::TypeMismatch {
            function: function.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
            position,
        }
    }

    pub fn custom(message: impl Into<String>) -> Self {
        RuntimeError::Custom(message.into())
    }
}
