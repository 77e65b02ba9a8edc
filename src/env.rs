// ABOUTME: Environment module for managing variable bindings, scopes, and closure-cycle sweeping

use crate::error::RuntimeError;
use crate::value::{Function, Value};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};

thread_local! {
    /// Every environment ever constructed, held weakly so `free_cycles` can
    /// find environments that have gone unreachable and clear them.
    static REGISTRY: RefCell<Vec<Weak<Environment>>> = const { RefCell::new(Vec::new()) };
}

#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    outer: Option<Rc<Environment>>,
}

impl Environment {
    pub fn new() -> Rc<Self> {
        Self::with_outer(None)
    }

    pub fn with_outer(outer: Option<Rc<Environment>>) -> Rc<Self> {
        let env = Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            outer,
        });
        REGISTRY.with(|r| r.borrow_mut().push(Rc::downgrade(&env)));
        env
    }

    /// Binds `name` in THIS frame, overwriting any existing value.
    pub fn set(&self, name: String, value: Value) {
        self.bindings.borrow_mut().insert(name, value);
    }

    /// Looks up `name` in this frame and, failing that, walks the outer chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.bindings.borrow().get(name) {
            return Some(v.clone());
        }
        self.outer.as_ref().and_then(|o| o.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.borrow().contains_key(name) || self.outer.as_ref().is_some_and(|o| o.contains(name))
    }

    /// Populates a fresh frame from formal parameters and evaluated
    /// arguments, enforcing arity (exact for fixed-arity, `>= n-1` with a
    /// trailing rest-list for variadic).
    pub fn bind(&self, params: &[String], variadic: bool, args: &[Value]) -> Result<(), RuntimeError> {
        if variadic {
            let fixed = params.len() - 1;
            if args.len() < fixed {
                return Err(RuntimeError::arity(
                    "#<fn>",
                    format!("at least {fixed}"),
                    args.len(),
                ));
            }
            for (param, arg) in params[..fixed].iter().zip(args.iter()) {
                self.set(param.clone(), arg.clone());
            }
            let rest = args[fixed..].to_vec();
            self.set(params[fixed].clone(), Value::list(rest));
        } else {
            if params.len() != args.len() {
                return Err(RuntimeError::arity(
                    "#<fn>",
                    params.len().to_string(),
                    args.len(),
                ));
            }
            for (param, arg) in params.iter().zip(args.iter()) {
                self.set(param.clone(), arg.clone());
            }
        }
        Ok(())
    }
}

/// Sweeps every environment no longer reachable from `root`.
///
/// A closure holds a strong `Rc<Environment>` pointing at the frame it was
/// defined in, and that frame's own bindings can in turn hold the closure
/// itself — a reference cycle plain `Rc` never collects. That cycle can
/// route through several frames, and the frame a closure captures is not
/// always the frame it ends up stored in (`(def! h (let* (n 5 g (fn* (x) (+
/// x n))) g))` stores, in the long-lived root frame, a closure over the
/// short-lived `let*` frame — a perfectly ordinary forward reference, not a
/// cycle at all). A per-frame self-loop counter can't tell those two shapes
/// apart, so this walks the real reachability graph instead.
///
/// Starting from `root` (always externally alive — the REPL holds it for
/// the process lifetime), it marks every environment reachable by following
/// `outer` pointers and by descending into bound values for embedded
/// closures, including closures nested inside lists, vectors, hash-maps, and
/// atoms. Anything left unmarked afterwards is garbage, even if it forms a
/// cycle with other equally-unreachable environments, so its bindings are
/// cleared — dropping whatever closures it held and letting the cycle
/// finally unwind.
pub fn free_cycles(root: &Rc<Environment>) {
    let mut live: HashSet<*const Environment> = HashSet::new();
    let mut stack: Vec<Rc<Environment>> = vec![root.clone()];

    while let Some(env) = stack.pop() {
        if !live.insert(Rc::as_ptr(&env)) {
            continue;
        }
        if let Some(outer) = &env.outer {
            stack.push(outer.clone());
        }
        for value in env.bindings.borrow().values() {
            collect_envs(value, &mut stack);
        }
    }

    REGISTRY.with(|r| {
        let mut registry = r.borrow_mut();
        registry.retain(|weak| {
            let Some(env) = weak.upgrade() else {
                return false;
            };
            if !live.contains(&Rc::as_ptr(&env)) {
                env.bindings.borrow_mut().clear();
            }
            true
        });
    });
}

/// Pushes every environment reachable from `value`'s payload onto `stack`.
fn collect_envs(value: &Value, stack: &mut Vec<Rc<Environment>>) {
    match value {
        Value::Fn(Function::User(u)) => stack.push(u.env.clone()),
        Value::Fn(Function::Builtin(b)) => {
            if let Some(env) = &b.env {
                stack.push(env.clone());
            }
        }
        Value::List(items) | Value::Vector(items) => {
            for item in items.iter() {
                collect_envs(item, stack);
            }
        }
        Value::HashMap(map) => {
            for v in map.values() {
                collect_envs(v, stack);
            }
        }
        Value::Atom(cell) => collect_envs(&cell.borrow(), stack),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::UserFn;

    #[test]
    fn define_and_get() {
        let env = Environment::new();
        env.set("x".to_string(), Value::Number(42));
        assert_eq!(env.get("x"), Some(Value::Number(42)));
    }

    #[test]
    fn undefined_symbol() {
        let env = Environment::new();
        assert!(env.get("undefined").is_none());
    }

    #[test]
    fn shadowing_in_child_leaves_parent_untouched() {
        let parent = Environment::new();
        parent.set("x".to_string(), Value::Number(1));

        let child = Environment::with_outer(Some(parent.clone()));
        child.set("x".to_string(), Value::Number(2));

        assert_eq!(child.get("x"), Some(Value::Number(2)));
        assert_eq!(parent.get("x"), Some(Value::Number(1)));
    }

    #[test]
    fn parent_lookup_through_chain() {
        let grandparent = Environment::new();
        grandparent.set("a".to_string(), Value::Number(1));
        let parent = Environment::with_outer(Some(grandparent));
        parent.set("b".to_string(), Value::Number(2));
        let child = Environment::with_outer(Some(parent));
        child.set("c".to_string(), Value::Number(3));

        assert_eq!(child.get("a"), Some(Value::Number(1)));
        assert_eq!(child.get("b"), Some(Value::Number(2)));
        assert_eq!(child.get("c"), Some(Value::Number(3)));
    }

    #[test]
    fn bind_exact_arity() {
        let env = Environment::new();
        let params = vec!["a".to_string(), "b".to_string()];
        env.bind(&params, false, &[Value::Number(1), Value::Number(2)])
            .unwrap();
        assert_eq!(env.get("a"), Some(Value::Number(1)));
        assert_eq!(env.get("b"), Some(Value::Number(2)));

        let env2 = Environment::new();
        assert!(env2.bind(&params, false, &[Value::Number(1)]).is_err());
    }

    #[test]
    fn bind_variadic_collects_rest_as_list() {
        let env = Environment::new();
        let params = vec!["a".to_string(), "rest".to_string()];
        env.bind(
            &params,
            true,
            &[Value::Number(1), Value::Number(2), Value::Number(3)],
        )
        .unwrap();
        assert_eq!(env.get("a"), Some(Value::Number(1)));
        assert_eq!(
            env.get("rest"),
            Some(Value::list(vec![Value::Number(2), Value::Number(3)]))
        );
    }

    fn self_closure(env: &Rc<Environment>) -> Value {
        Value::Fn(Function::User(UserFn {
            params: Rc::new(vec![]),
            variadic: false,
            body: Rc::new(Value::Nil),
            env: env.clone(),
        }))
    }

    /// A frame bound to a closure over itself, with nothing else pointing
    /// into it, is a pure reference cycle: `Rc` alone would leak it forever.
    /// `free_cycles` must reclaim it once its only owning local is dropped.
    #[test]
    fn self_referencing_closure_does_not_leak() {
        let root = Environment::new();
        let frame = Environment::with_outer(Some(root.clone()));
        frame.set("self".to_string(), self_closure(&frame));
        let weak = Rc::downgrade(&frame);
        drop(frame);

        free_cycles(&root);
        assert!(weak.upgrade().is_none());
    }

    /// Redefining a name that pointed at a self-referencing frame must drop
    /// that frame once the redefinition severs the only external path to it
    /// (the literal §8 "no leak after redefining f" property).
    #[test]
    fn redefining_a_name_releases_the_previous_self_closure() {
        let root = Environment::new();
        let frame = Environment::with_outer(Some(root.clone()));
        frame.set("self".to_string(), self_closure(&frame));
        root.set(
            "f".to_string(),
            Value::Fn(Function::User(UserFn {
                params: Rc::new(vec![]),
                variadic: false,
                body: Rc::new(Value::Nil),
                env: frame.clone(),
            })),
        );
        let weak = Rc::downgrade(&frame);
        drop(frame);

        // f still points at frame, so a sweep must not collect it yet.
        free_cycles(&root);
        assert!(weak.upgrade().is_some());

        // Redefining f severs the only external path into frame.
        root.set("f".to_string(), Value::Number(0));
        free_cycles(&root);
        assert!(weak.upgrade().is_none());
    }

    /// A closure over a descendant frame, stored into a long-lived ancestor
    /// (`(def! h (let* (n 5 g (fn* (x) (+ x n))) g))`), must keep that
    /// descendant frame's bindings alive across repeated sweeps — it is an
    /// ordinary forward reference, not a cycle.
    #[test]
    fn closure_over_a_descendant_frame_survives_when_stored_in_an_ancestor() {
        let root = Environment::new();
        let let_frame = Environment::with_outer(Some(root.clone()));
        let_frame.set("n".to_string(), Value::Number(5));
        let_frame.set("g".to_string(), self_closure(&let_frame));

        // `h` in root captures `let_frame`, a descendant — not root itself.
        root.set(
            "h".to_string(),
            Value::Fn(Function::User(UserFn {
                params: Rc::new(vec![]),
                variadic: false,
                body: Rc::new(Value::Symbol("n".to_string())),
                env: let_frame.clone(),
            })),
        );
        let weak = Rc::downgrade(&let_frame);
        drop(let_frame);

        for _ in 0..3 {
            free_cycles(&root);
            assert!(weak.upgrade().is_some());
            assert_eq!(
                root.get("h").and_then(|v| match v {
                    Value::Fn(Function::User(u)) => u.env.get("n"),
                    _ => None,
                }),
                Some(Value::Number(5))
            );
        }
    }
}
