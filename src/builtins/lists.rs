//! List operations: `list`, `list?`, `empty?`, `count`, `cons`, `concat`.

use super::define;
use crate::env::Environment;
use crate::error::{RuntimeError, ARITY_TWO};
use crate::value::Value;
use std::rc::Rc;

fn as_list<'a>(name: &str, v: &'a Value, position: usize) -> Result<&'a [Value], RuntimeError> {
    match v {
        Value::List(items) => Ok(items),
        other => Err(RuntimeError::type_error(name, "list", other.type_name(), position)),
    }
}

pub fn register(env: &Rc<Environment>) {
    define(env, "list", |args, _| Ok(Value::list(args.to_vec())));

    define(env, "list?", |args, _| {
        if args.len() != 1 {
            return Err(RuntimeError::arity("list?", "1", args.len()));
        }
        Ok(Value::Bool(matches!(args[0], Value::List(_))))
    });

    define(env, "empty?", |args, _| {
        if args.len() != 1 {
            return Err(RuntimeError::arity("empty?", "1", args.len()));
        }
        let items = as_list("empty?", &args[0], 0)?;
        Ok(Value::Bool(items.is_empty()))
    });

    define(env, "count", |args, _| {
        if args.len() != 1 {
            return Err(RuntimeError::arity("count", "1", args.len()));
        }
        let n = match &args[0] {
            Value::Nil => 0,
            other => as_list("count", other, 0)?.len(),
        };
        Ok(Value::Number(n as i64))
    });

    define(env, "cons", |args, _| {
        if args.len() != 2 {
            return Err(RuntimeError::arity("cons", ARITY_TWO, args.len()));
        }
        let rest = as_list("cons", &args[1], 1)?;
        let mut items = Vec::with_capacity(rest.len() + 1);
        items.push(args[0].clone());
        items.extend_from_slice(rest);
        Ok(Value::list(items))
    });

    // Each argument's type/arity is checked once, on first use; an argument
    // that has already failed `as_list` is never re-validated.
    define(env, "concat", |args, _| {
        let mut items = Vec::new();
        for (i, arg) in args.iter().enumerate() {
            items.extend_from_slice(as_list("concat", arg, i)?);
        }
        Ok(Value::list(items))
    });
}
