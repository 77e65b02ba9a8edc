// ABOUTME: End-to-end tests exercising the reader, evaluator, and builtins together

use mal_core::env::Environment;
use mal_core::eval::eval_top_level;
use mal_core::reader::read_str;
use mal_core::value::Value;
use std::rc::Rc;

fn run(src: &str, env: &Rc<Environment>) -> Value {
    eval_top_level(read_str(src).unwrap(), env.clone()).unwrap()
}

#[test]
fn arithmetic_and_definitions() {
    let env = mal_core::builtins::new_root_env();
    assert_eq!(run("(+ 1 2)", &env), Value::Number(3));
    run("(def! a 6)", &env);
    assert_eq!(run("(* a a)", &env), Value::Number(36));
}

#[test]
fn if_with_string_branches() {
    let env = mal_core::builtins::new_root_env();
    assert_eq!(
        run(r#"(if (> 2 1) "yes" "no")"#, &env),
        Value::String("yes".to_string())
    );
}

#[test]
fn function_application_and_let_star() {
    let env = mal_core::builtins::new_root_env();
    assert_eq!(run("((fn* (a b) (+ a b)) 3 4)", &env), Value::Number(7));
    assert_eq!(
        run("(let* (p (+ 2 3) q (+ 2 p)) (* p q))", &env),
        Value::Number(35)
    );
}

#[test]
fn atom_swap_and_deref() {
    let env = mal_core::builtins::new_root_env();
    assert_eq!(
        run("(do (def! c (atom 2)) (swap! c (fn* (v) (* v v))) (deref c))", &env),
        Value::Number(4)
    );
}

#[test]
fn recursive_factorial() {
    let env = mal_core::builtins::new_root_env();
    run(
        "(def! fact (fn* (n) (if (= n 0) 1 (* n (fact (- n 1))))))",
        &env,
    );
    assert_eq!(run("(fact 5)", &env), Value::Number(120));
}

#[test]
fn deep_tail_recursion_does_not_overflow_the_host_stack() {
    let env = mal_core::builtins::new_root_env();
    run(
        "(def! f (fn* (n acc) (if (= n 0) acc (f (- n 1) (+ acc 1)))))",
        &env,
    );
    assert_eq!(run("(f 100000 0)", &env), Value::Number(100000));
}

#[test]
fn closures_capture_the_defining_environment() {
    let env = mal_core::builtins::new_root_env();
    run("(def! make-adder (fn* (n) (fn* (v) (+ v n))))", &env);
    run("(def! add5 (make-adder 5))", &env);
    assert_eq!(run("(add5 10)", &env), Value::Number(15));
}

#[test]
fn let_star_does_not_leak_into_the_enclosing_scope() {
    let env = mal_core::builtins::new_root_env();
    run("(def! x 1)", &env);
    run("(let* (x 2) x)", &env);
    assert_eq!(run("x", &env), Value::Number(1));
}

#[test]
fn closure_over_a_let_frame_survives_repeated_top_level_sweeps() {
    let env = mal_core::builtins::new_root_env();
    run("(def! h (let* (n 5 g (fn* (x) (+ x n))) g))", &env);
    assert_eq!(run("(h 1)", &env), Value::Number(6));
    assert_eq!(run("(h 2)", &env), Value::Number(7));
    assert_eq!(run("(h 3)", &env), Value::Number(8));
}

#[test]
fn redefining_a_function_does_not_leak_its_old_environment() {
    let env = mal_core::builtins::new_root_env();
    run("(def! f (fn* (x) (+ x 1)))", &env);
    assert_eq!(run("(f 1)", &env), Value::Number(2));
    run("(def! f (fn* (x) (+ x 2)))", &env);
    assert_eq!(run("(f 1)", &env), Value::Number(3));
}

#[test]
fn list_builtins() {
    let env = mal_core::builtins::new_root_env();
    assert_eq!(run("(cons 1 (list 2 3))", &env), run("(list 1 2 3)", &env));
    assert_eq!(run("(count (list 1 2 3))", &env), Value::Number(3));
    assert_eq!(run("(count nil)", &env), Value::Number(0));
    assert_eq!(
        run("(concat (list 1 2) (list 3) (list))", &env),
        run("(list 1 2 3)", &env)
    );
}

#[test]
fn pr_str_and_str_round_trip_through_read_string() {
    let env = mal_core::builtins::new_root_env();
    let printed = run(r#"(pr-str (list 1 "hi" :kw))"#, &env);
    assert_eq!(
        printed,
        Value::String(r#"(1 "hi" :kw)"#.to_string())
    );
    assert_eq!(
        run(r#"(read-string "(+ 1 2)")"#, &env),
        run("(list '+ 1 2)", &env)
    );
}

#[test]
fn eval_reinjects_into_the_root_environment() {
    let env = mal_core::builtins::new_root_env();
    run("(def! result (eval (list '+ 1 2)))", &env);
    assert_eq!(run("result", &env), Value::Number(3));
}

#[test]
fn undefined_symbol_is_a_runtime_error() {
    let env = mal_core::builtins::new_root_env();
    let err = eval_top_level(read_str("undefined-name").unwrap(), env).unwrap_err();
    assert!(matches!(err, mal_core::error::RuntimeError::NotFound(_)));
}

#[test]
fn division_by_zero_is_a_runtime_error() {
    let env = mal_core::builtins::new_root_env();
    let err = eval_top_level(read_str("(/ 1 0)").unwrap(), env).unwrap_err();
    assert!(matches!(err, mal_core::error::RuntimeError::DivideByZero));
}

#[test]
fn applying_a_non_function_is_a_runtime_error() {
    let env = mal_core::builtins::new_root_env();
    let err = eval_top_level(read_str("(42)").unwrap(), env).unwrap_err();
    assert!(matches!(err, mal_core::error::RuntimeError::NotCallable));
}

#[test]
fn unclosed_list_is_a_parse_error() {
    assert!(read_str("(1 2").is_err());
}

#[test]
fn print_read_print_round_trip_is_stable() {
    use mal_core::printer::pr_str;
    let env = mal_core::builtins::new_root_env();
    let v = run("(list 1 (list 2 3) :kw \"s\" true nil)", &env);
    let printed = pr_str(&v, true);
    let read_back = read_str(&printed).unwrap();
    assert_eq!(pr_str(&read_back, true), printed);
}
