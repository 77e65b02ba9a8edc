//! Atoms: `atom`, `atom?`, `deref`, `reset!`, `swap!`.

use super::define;
use crate::env::Environment;
use crate::error::{RuntimeError, ARITY_TWO};
use crate::eval;
use crate::value::{Function, Value};
use std::cell::RefCell;
use std::rc::Rc;

pub fn register(env: &Rc<Environment>) {
    define(env, "atom", |args, _| {
        if args.len() != 1 {
            return Err(RuntimeError::arity("atom", "1", args.len()));
        }
        Ok(Value::Atom(Rc::new(RefCell::new(args[0].clone()))))
    });

    define(env, "atom?", |args, _| {
        if args.len() != 1 {
            return Err(RuntimeError::arity("atom?", "1", args.len()));
        }
        Ok(Value::Bool(matches!(args[0], Value::Atom(_))))
    });

    define(env, "deref", |args, _| {
        if args.len() != 1 {
            return Err(RuntimeError::arity("deref", "1", args.len()));
        }
        let cell = as_atom("deref", &args[0])?;
        Ok(cell.borrow().clone())
    });

    define(env, "reset!", |args, _| {
        if args.len() != 2 {
            return Err(RuntimeError::arity("reset!", ARITY_TWO, args.len()));
        }
        let cell = as_atom("reset!", &args[0])?;
        *cell.borrow_mut() = args[1].clone();
        Ok(args[1].clone())
    });

    define(env, "swap!", |args, _| {
        if args.len() < 2 {
            return Err(RuntimeError::arity("swap!", "at least 2", args.len()));
        }
        let cell = as_atom("swap!", &args[0])?;
        let function = match &args[1] {
            Value::Fn(f) => f.clone(),
            other => return Err(RuntimeError::type_error("swap!", "function", other.type_name(), 1)),
        };

        let mut call_args = Vec::with_capacity(args.len() - 1);
        call_args.push(cell.borrow().clone());
        call_args.extend_from_slice(&args[2..]);

        let result = eval::apply(&function, &call_args)?;
        *cell.borrow_mut() = result.clone();
        Ok(result)
    });
}

fn as_atom<'a>(name: &str, v: &'a Value) -> Result<&'a Rc<RefCell<Value>>, RuntimeError> {
    match v {
        Value::Atom(cell) => Ok(cell),
        other => Err(RuntimeError::type_error(name, "atom", other.type_name(), 0)),
    }
}
