// ABOUTME: Evaluator module: the trampoline loop, special forms, and function application

use crate::env::{self, Environment};
use crate::error::{RuntimeError, ARITY_AT_LEAST_ONE, ARITY_TWO, ARITY_TWO_OR_THREE};
use crate::printer::pr_str;
use crate::value::{Function, UserFn, Value};
use std::cell::RefCell;
use std::rc::Rc;

thread_local! {
    /// The REPL's top-level environment, held so the `eval` builtin can
    /// reinject into it without threading "which env is root" through every
    /// builtin signature.
    static ROOT_ENV: RefCell<Option<Rc<Environment>>> = const { RefCell::new(None) };
}

pub fn set_root_env(env: Rc<Environment>) {
    ROOT_ENV.with(|r| *r.borrow_mut() = Some(env));
}

pub fn root_env() -> Rc<Environment> {
    ROOT_ENV.with(|r| {
        r.borrow()
            .clone()
            .expect("root environment not initialized")
    })
}

/// Evaluates `expr` in `env`, running the trampoline until a terminal value
/// or error is produced. Tail positions (the last form of `do`, either branch
/// of `if`, the body of `let*`, and a UserFn's body) rewrite `(expr, env)`
/// and loop instead of recursing, so they run in bounded host-stack space.
pub fn eval(mut expr: Value, env: Rc<Environment>) -> Result<Value, RuntimeError> {
    let mut current_env = env;

    loop {
        debug_trace(&expr, &current_env);

        match &expr {
            Value::Symbol(name) => {
                return current_env
                    .get(name)
                    .ok_or_else(|| RuntimeError::NotFound(name.clone()));
            }

            Value::List(items) if items.is_empty() => return Ok(expr),

            Value::List(items) => {
                if let Value::Symbol(head) = &items[0] {
                    match head.as_str() {
                        "def!" => return eval_def(items, &current_env),
                        "let*" => {
                            let (body, child_env) = eval_let_star(items, &current_env)?;
                            expr = body;
                            current_env = child_env;
                            continue;
                        }
                        "do" => {
                            expr = eval_do(items, &current_env)?;
                            continue;
                        }
                        "if" => {
                            expr = eval_if(items, &current_env)?;
                            continue;
                        }
                        "fn*" => return eval_fn_star(items, &current_env),
                        _ => {}
                    }
                }

                let f = eval(items[0].clone(), current_env.clone())?;
                let args = items[1..]
                    .iter()
                    .map(|a| eval(a.clone(), current_env.clone()))
                    .collect::<Result<Vec<_>, _>>()?;

                let function = match f {
                    Value::Fn(function) => function,
                    _ => return Err(RuntimeError::NotCallable),
                };

                match function {
                    Function::Builtin(b) => return (b.func)(&args, &current_env),
                    Function::User(u) => {
                        let new_env = Environment::with_outer(Some(u.env.clone()));
                        new_env.bind(&u.params, u.variadic, &args)?;
                        expr = (*u.body).clone();
                        current_env = new_env;
                        continue;
                    }
                }
            }

            // Everything else (Number, String, Keyword, Nil, Bool, Vector,
            // HashMap, Fn, Atom) is self-evaluating.
            _ => return Ok(expr),
        }
    }
}

/// Invokes `function` with already-evaluated `args`, through the same
/// trampoline entry point used for ordinary application, so a UserFn
/// argument runs under its own captured environment. Used by `swap!`.
pub fn apply(function: &Function, args: &[Value]) -> Result<Value, RuntimeError> {
    match function {
        Function::Builtin(b) => {
            let env = b.env.clone().unwrap_or_else(root_env);
            (b.func)(args, &env)
        }
        Function::User(u) => {
            let new_env = Environment::with_outer(Some(u.env.clone()));
            new_env.bind(&u.params, u.variadic, args)?;
            eval((*u.body).clone(), new_env)
        }
    }
}

fn debug_trace(expr: &Value, env: &Rc<Environment>) {
    if let Some(flag) = env.get("DEBUG-EVAL") {
        if flag.is_truthy() {
            eprintln!("EVAL: {}", pr_str(expr, true));
        }
    }
}

fn eval_def(items: &[Value], env: &Rc<Environment>) -> Result<Value, RuntimeError> {
    if items.len() != 3 {
        return Err(RuntimeError::arity("def!", ARITY_TWO, items.len() - 1));
    }
    let name = symbol_name(&items[1], "def!", 1)?;
    let value = eval(items[2].clone(), env.clone())?;
    env.set(name, value.clone());
    Ok(value)
}

/// Returns the `(body, child_env)` pair for the trampoline to continue with.
fn eval_let_star(items: &[Value], env: &Rc<Environment>) -> Result<(Value, Rc<Environment>), RuntimeError> {
    if items.len() != 3 {
        return Err(RuntimeError::arity("let*", ARITY_TWO, items.len() - 1));
    }
    let bindings = items[1]
        .as_seq()
        .ok_or_else(|| RuntimeError::type_error("let*", "list or vector", items[1].type_name(), 1))?;
    if bindings.len() % 2 != 0 {
        return Err(RuntimeError::custom(
            "let*: binding list must have an even number of elements",
        ));
    }

    let child_env = Environment::with_outer(Some(env.clone()));
    let mut i = 0;
    while i < bindings.len() {
        let name = symbol_name(&bindings[i], "let*", i)?;
        let value = eval(bindings[i + 1].clone(), child_env.clone())?;
        child_env.set(name, value);
        i += 2;
    }

    Ok((items[2].clone(), child_env))
}

/// Evaluates all but the last form for effect, returning the last form for
/// the trampoline to continue with.
fn eval_do(items: &[Value], env: &Rc<Environment>) -> Result<Value, RuntimeError> {
    if items.len() < 2 {
        return Err(RuntimeError::arity("do", ARITY_AT_LEAST_ONE, items.len() - 1));
    }
    for form in &items[1..items.len() - 1] {
        eval(form.clone(), env.clone())?;
    }
    Ok(items[items.len() - 1].clone())
}

fn eval_if(items: &[Value], env: &Rc<Environment>) -> Result<Value, RuntimeError> {
    if items.len() != 3 && items.len() != 4 {
        return Err(RuntimeError::arity("if", ARITY_TWO_OR_THREE, items.len() - 1));
    }
    let cond = eval(items[1].clone(), env.clone())?;
    if cond.is_truthy() {
        Ok(items[2].clone())
    } else if items.len() == 4 {
        Ok(items[3].clone())
    } else {
        Ok(Value::Nil)
    }
}

fn eval_fn_star(items: &[Value], env: &Rc<Environment>) -> Result<Value, RuntimeError> {
    if items.len() != 3 {
        return Err(RuntimeError::arity("fn*", ARITY_TWO, items.len() - 1));
    }
    let formals = items[1]
        .as_seq()
        .ok_or_else(|| RuntimeError::type_error("fn*", "list or vector", items[1].type_name(), 1))?;

    let mut params = Vec::with_capacity(formals.len());
    let mut variadic = false;
    let mut i = 0;
    while i < formals.len() {
        let name = symbol_name(&formals[i], "fn*", i)?;
        if name == "&" {
            variadic = true;
            let rest_name = symbol_name(
                formals
                    .get(i + 1)
                    .ok_or_else(|| RuntimeError::custom("fn*: '&' must be followed by a rest parameter"))?,
                "fn*",
                i + 1,
            )?;
            params.push(rest_name);
            break;
        }
        params.push(name);
        i += 1;
    }

    Ok(Value::Fn(Function::User(UserFn {
        params: Rc::new(params),
        variadic,
        body: Rc::new(items[2].clone()),
        env: env.clone(),
    })))
}

fn symbol_name(v: &Value, function: &str, position: usize) -> Result<String, RuntimeError> {
    match v {
        Value::Symbol(s) => Ok(s.clone()),
        other => Err(RuntimeError::type_error(function, "symbol", other.type_name(), position)),
    }
}

/// Evaluates a single top-level form and sweeps dead closure cycles
/// afterwards, rooted at this same environment (the REPL's persistent root).
pub fn eval_top_level(expr: Value, env: Rc<Environment>) -> Result<Value, RuntimeError> {
    let result = eval(expr, env.clone());
    env::free_cycles(&env);
    result
}
