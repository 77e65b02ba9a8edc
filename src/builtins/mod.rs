// ABOUTME: Builtins module: registration helper plus the root environment builder

use crate::env::Environment;
use crate::error::RuntimeError;
use crate::value::{Builtin, Function, Value};
use std::rc::Rc;

pub mod arithmetic;
pub mod atoms;
pub mod comparison;
pub mod io;
pub mod lists;

/// Binds `name` to a host function with no captured environment.
fn define(
    env: &Rc<Environment>,
    name: &'static str,
    func: impl Fn(&[Value], &Rc<Environment>) -> Result<Value, RuntimeError> + 'static,
) {
    env.set(
        name.to_string(),
        Value::Fn(Function::Builtin(Builtin {
            name,
            func: Rc::new(func),
            env: None,
        })),
    );
}

fn register_builtins(env: &Rc<Environment>) {
    arithmetic::register(env);
    comparison::register(env);
    lists::register(env);
    atoms::register(env);
    io::register(env);
}

const BOOTSTRAP: &[&str] = &[
    "(def! not (fn* (a) (if a false true)))",
    r#"(def! load-file (fn* (f) (eval (read-string (str "(do " (slurp f) "\nnil)")))))"#,
];

/// Builds a fresh root environment with every core builtin registered and
/// the bootstrapped definitions evaluated into it, as if typed by the user.
pub fn new_root_env() -> Rc<Environment> {
    let env = Environment::new();
    register_builtins(&env);
    crate::eval::set_root_env(env.clone());

    for src in BOOTSTRAP {
        let form = crate::reader::read_str(src).expect("bootstrap form must parse");
        crate::eval::eval(form, env.clone()).expect("bootstrap form must evaluate");
    }

    env
}
