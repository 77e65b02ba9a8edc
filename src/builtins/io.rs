//! Printing (`pr-str`, `str`, `prn`, `println`), reading (`read-string`),
//! filesystem (`slurp`), and eval reinjection (`eval`).

use super::define;
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::eval;
use crate::printer::{pr_str, pr_str_join, str_join};
use crate::reader;
use crate::value::Value;
use std::rc::Rc;

pub fn register(env: &Rc<Environment>) {
    define(env, "pr-str", |args, _| Ok(Value::String(pr_str_join(args))));

    define(env, "str", |args, _| Ok(Value::String(str_join(args))));

    define(env, "prn", |args, _| {
        println!("{}", pr_str_join(args));
        Ok(Value::Nil)
    });

    define(env, "println", |args, _| {
        let parts: Vec<String> = args.iter().map(|v| pr_str(v, false)).collect();
        println!("{}", parts.join(" "));
        Ok(Value::Nil)
    });

    define(env, "read-string", |args, _| {
        if args.len() != 1 {
            return Err(RuntimeError::arity("read-string", "1", args.len()));
        }
        let s = match &args[0] {
            Value::String(s) => s,
            other => return Err(RuntimeError::type_error("read-string", "string", other.type_name(), 0)),
        };
        reader::read_str(s).map_err(|e| RuntimeError::custom(e.to_string()))
    });

    define(env, "slurp", |args, _| {
        if args.len() != 1 {
            return Err(RuntimeError::arity("slurp", "1", args.len()));
        }
        let path = match &args[0] {
            Value::String(s) => s,
            other => return Err(RuntimeError::type_error("slurp", "string", other.type_name(), 0)),
        };
        std::fs::read_to_string(path)
            .map(Value::String)
            .map_err(|e| RuntimeError::custom(format!("slurp: {path}: {e}")))
    });

    define(env, "eval", |args, _| {
        if args.len() != 1 {
            return Err(RuntimeError::arity("eval", "1", args.len()));
        }
        eval::eval(args[0].clone(), eval::root_env())
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(env: &Rc<Environment>, name: &str, args: &[Value]) -> Result<Value, RuntimeError> {
        match env.get(name).unwrap() {
            Value::Fn(crate::value::Function::Builtin(b)) => (b.func)(args, env),
            _ => unreachable!(),
        }
    }

    #[test]
    fn pr_str_and_str_differ_on_strings() {
        let env = Environment::new();
        register(&env);
        let args = [Value::String("hi".to_string())];
        assert_eq!(call(&env, "pr-str", &args).unwrap(), Value::String("\"hi\"".to_string()));
        assert_eq!(call(&env, "str", &args).unwrap(), Value::String("hi".to_string()));
    }

    #[test]
    fn read_string_parses_a_form() {
        let env = Environment::new();
        register(&env);
        let v = call(&env, "read-string", &[Value::String("(1 2)".to_string())]).unwrap();
        assert_eq!(v, Value::list(vec![Value::Number(1), Value::Number(2)]));
    }

    #[test]
    fn read_string_surfaces_parse_errors_as_runtime_errors() {
        let env = Environment::new();
        register(&env);
        let err = call(&env, "read-string", &[Value::String("(1 2".to_string())]).unwrap_err();
        assert!(matches!(err, RuntimeError::Custom(_)));
    }

    #[test]
    fn slurp_reports_missing_file() {
        let env = Environment::new();
        register(&env);
        let err = call(&env, "slurp", &[Value::String("/no/such/file".to_string())]).unwrap_err();
        assert!(matches!(err, RuntimeError::Custom(_)));
    }
}
