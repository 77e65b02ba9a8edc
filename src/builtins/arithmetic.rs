//! Arithmetic: `+ - * /`, all exactly two Number arguments.

use super::define;
use crate::env::Environment;
use crate::error::{RuntimeError, ARITY_TWO};
use crate::value::Value;
use std::rc::Rc;

fn two_numbers(name: &str, args: &[Value]) -> Result<(i64, i64), RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity(name, ARITY_TWO, args.len()));
    }
    let a = match &args[0] {
        Value::Number(n) => *n,
        other => return Err(RuntimeError::type_error(name, "number", other.type_name(), 0)),
    };
    let b = match &args[1] {
        Value::Number(n) => *n,
        other => return Err(RuntimeError::type_error(name, "number", other.type_name(), 1)),
    };
    Ok((a, b))
}

pub fn register(env: &Rc<Environment>) {
    define(env, "+", |args, _| {
        let (a, b) = two_numbers("+", args)?;
        Ok(Value::Number(a + b))
    });
    define(env, "-", |args, _| {
        let (a, b) = two_numbers("-", args)?;
        Ok(Value::Number(a - b))
    });
    define(env, "*", |args, _| {
        let (a, b) = two_numbers("*", args)?;
        Ok(Value::Number(a * b))
    });
    define(env, "/", |args, _| {
        let (a, b) = two_numbers("/", args)?;
        if b == 0 {
            return Err(RuntimeError::DivideByZero);
        }
        Ok(Value::Number(a / b))
    });
}
