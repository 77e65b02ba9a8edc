// ABOUTME: Reader module tokenizing source text and parsing it into a Value tree

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::char,
    combinator::recognize,
    sequence::pair,
    IResult, Parser,
};

use crate::error::ReadError;
use crate::value::{HashMapValue, MapKey, Value};

fn is_whitespace(c: char) -> bool {
    c as u32 <= 0x20 || c == ','
}

fn comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(char(';'), take_while(|c| c != '\n'))).parse(input)
}

/// A `"`-delimited string token, escapes included, consumed up to and
/// including the closing quote. Fails (caller reports EofInString) if the
/// input ends before an unescaped `"` is found.
fn string_token(input: &str) -> IResult<&str, &str> {
    let (rest, _) = char('"')(input)?;
    let mut escape = false;
    for (i, c) in rest.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match c {
            '\\' => escape = true,
            '"' => {
                let end = rest.len() - (&rest[i + 1..]).len();
                let (tok, after) = (&input[..1 + end], &rest[i + 1..]);
                return Ok((after, tok));
            }
            _ => {}
        }
    }
    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Eof,
    )))
}

fn special_char(input: &str) -> IResult<&str, &str> {
    alt((
        tag("("),
        tag(")"),
        tag("["),
        tag("]"),
        tag("{"),
        tag("}"),
        tag("'"),
        tag("`"),
        tag("~"),
        tag("^"),
        tag("@"),
    ))
    .parse(input)
}

fn symbol_run(input: &str) -> IResult<&str, &str> {
    fn is_special(c: char) -> bool {
        is_whitespace(c)
            || matches!(
                c,
                '(' | ')' | '[' | ']' | '{' | '}' | '\'' | '"' | ';' | '`' | '~' | '^' | '@'
            )
    }
    take_while1(|c| !is_special(c)).parse(input)
}

/// One lexical token: a two-byte `~@`, a one-byte special, a quoted string, a
/// comment, or a maximal run of "ordinary" bytes.
fn one_token(input: &str) -> IResult<&str, &str> {
    alt((tag("~@"), comment, string_token, special_char, symbol_run)).parse(input)
}

fn tokenize(input: &str) -> Result<Vec<String>, ReadError> {
    let mut tokens = Vec::new();
    let mut rest = input;
    loop {
        rest = rest.trim_start_matches(is_whitespace);
        if rest.is_empty() {
            break;
        }
        match one_token(rest) {
            Ok((next_rest, tok)) => {
                if !tok.starts_with(';') {
                    tokens.push(tok.to_string());
                }
                rest = next_rest;
            }
            // Only string_token fails this way (unterminated literal).
            Err(_) => return Err(ReadError::EofInString),
        }
    }
    Ok(tokens)
}

struct Reader {
    tokens: Vec<String>,
    pos: usize,
}

impl Reader {
    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn next(&mut self) -> Option<String> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }
}

/// Parses the first top-level form out of `input`. Empty (or whitespace/
/// comment-only) input yields an empty list, matching the reference REPL's
/// treatment of a blank line.
pub fn read_str(input: &str) -> Result<Value, ReadError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Ok(Value::list(vec![]));
    }
    let mut reader = Reader { tokens, pos: 0 };
    read_form(&mut reader)
}

fn read_form(r: &mut Reader) -> Result<Value, ReadError> {
    match r.peek() {
        Some("(") => read_seq(r, "(", ")", ReadError::EofInList).map(Value::list),
        Some("[") => read_seq(r, "[", "]", ReadError::EofInVector).map(Value::vector),
        Some("{") => read_hashmap(r),
        Some(")") | Some("]") | Some("}") => Err(ReadError::UnexpectedCloseParen),
        Some("'") => read_wrapped(r, "quote"),
        Some("`") => read_wrapped(r, "quasiquote"),
        Some("~") => read_wrapped(r, "unquote"),
        Some("~@") => read_wrapped(r, "splice-unquote"),
        Some("@") => read_wrapped(r, "deref"),
        Some("^") => read_with_meta(r),
        Some(_) => read_atom(r),
        None => Err(ReadError::EofInList),
    }
}

fn read_wrapped(r: &mut Reader, head: &str) -> Result<Value, ReadError> {
    r.next();
    let form = read_form(r)?;
    Ok(Value::list(vec![Value::Symbol(head.to_string()), form]))
}

fn read_with_meta(r: &mut Reader) -> Result<Value, ReadError> {
    r.next();
    let meta = read_form(r)?;
    let target = read_form(r)?;
    Ok(Value::list(vec![
        Value::Symbol("with-meta".to_string()),
        target,
        meta,
    ]))
}

fn read_seq(r: &mut Reader, open: &str, close: &str, eof_err: ReadError) -> Result<Vec<Value>, ReadError> {
    debug_assert_eq!(r.peek(), Some(open));
    r.next();
    let mut items = Vec::new();
    loop {
        match r.peek() {
            None => return Err(eof_err),
            Some(t) if t == close => {
                r.next();
                return Ok(items);
            }
            _ => items.push(read_form(r)?),
        }
    }
}

fn read_hashmap(r: &mut Reader) -> Result<Value, ReadError> {
    let items = read_seq(r, "{", "}", ReadError::EofInHashMap)?;
    if items.len() % 2 != 0 {
        return Err(ReadError::OddHashMapBody);
    }
    let mut map = HashMapValue::new();
    let mut it = items.into_iter();
    while let (Some(k), Some(v)) = (it.next(), it.next()) {
        let key = MapKey::from_value(&k)
            .ok_or_else(|| ReadError::InvalidHashMapKey(k.type_name().to_string()))?;
        map.insert(key, v);
    }
    Ok(Value::HashMap(std::rc::Rc::new(map)))
}

fn read_atom(r: &mut Reader) -> Result<Value, ReadError> {
    let tok = r.next().expect("caller checked peek is Some");
    classify_atom(&tok)
}

fn classify_atom(tok: &str) -> Result<Value, ReadError> {
    match tok {
        "nil" => return Ok(Value::Nil),
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        _ => {}
    }

    let mut chars = tok.chars();
    match chars.next() {
        Some(c) if c == '-' || c.is_ascii_digit() => {
            if tok == "-" {
                return Ok(Value::Symbol(tok.to_string()));
            }
            let digits = if c == '-' { &tok[1..] } else { tok };
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                return tok
                    .parse::<i64>()
                    .map(Value::Number)
                    .map_err(|_| ReadError::InvalidNumber(tok.to_string()));
            }
            if c.is_ascii_digit() {
                return Err(ReadError::InvalidNumber(tok.to_string()));
            }
            Ok(Value::Symbol(tok.to_string()))
        }
        Some('"') => Ok(Value::String(unescape_string(tok))),
        Some(':') => Ok(Value::Keyword(tok[1..].to_string())),
        _ => Ok(Value::Symbol(tok.to_string())),
    }
}

fn unescape_string(tok: &str) -> String {
    // tok includes the surrounding quotes.
    let inner = &tok[1..tok.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}
