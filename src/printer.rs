// ABOUTME: Printer module converting Values back into their textual representation

use crate::value::{Function, MapKey, Value};
use std::fmt::Write;

/// Renders `v` as text. `readable` controls String escaping: readable mode
/// surrounds strings in `"` and re-escapes `\`, `"`, and newline; non-readable
/// mode passes string bytes through raw. Nested forms always print readably,
/// matching the reference reader/printer round-trip.
pub fn pr_str(v: &Value, readable: bool) -> String {
    let mut out = String::new();
    write_value(&mut out, v, readable);
    out
}

/// `pr-str`-style join: each argument printed readably, separated by a space.
pub fn pr_str_join(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| pr_str(v, true))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `str`-style join: each argument printed non-readably, no separator.
pub fn str_join(values: &[Value]) -> String {
    let mut out = String::new();
    for v in values {
        write_value(&mut out, v, false);
    }
    out
}

fn write_value(out: &mut String, v: &Value, readable: bool) {
    match v {
        Value::Number(n) => {
            let _ = write!(out, "{n}");
        }
        Value::Nil => out.push_str("nil"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Symbol(s) => out.push_str(s),
        Value::Keyword(k) => {
            out.push(':');
            out.push_str(k);
        }
        Value::String(s) => {
            if readable {
                write_readable_string(out, s);
            } else {
                out.push_str(s);
            }
        }
        Value::List(items) => write_seq(out, items, '(', ')', readable),
        Value::Vector(items) => write_seq(out, items, '[', ']', readable),
        Value::HashMap(map) => {
            out.push('{');
            for (i, (k, val)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_value(out, &key_as_value(k), readable);
                out.push(' ');
                write_value(out, val, readable);
            }
            out.push('}');
        }
        Value::Fn(Function::Builtin(b)) => {
            let _ = write!(out, "#<builtin:{}>", b.name);
        }
        Value::Fn(Function::User(_)) => out.push_str("#<fn>"),
        Value::Atom(cell) => {
            out.push_str("(atom ");
            write_value(out, &cell.borrow(), true);
            out.push(')');
        }
    }
}

fn key_as_value(k: &MapKey) -> Value {
    match k {
        MapKey::Str(s) => Value::String(s.clone()),
        MapKey::Keyword(k) => Value::Keyword(k.clone()),
    }
}

fn write_seq(out: &mut String, items: &[Value], open: char, close: char, readable: bool) {
    out.push(open);
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        // Children always print readably, matching the read/print round-trip.
        let _ = readable;
        write_value(out, item, true);
    }
    out.push(close);
}

fn write_readable_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
}
