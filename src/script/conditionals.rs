//! `[ ]` / `[[ ]]` test-expression evaluator.
//!
//! POSIX `[`/`test` uses `-a`/`-o`/`!` for boolean composition; the `[[ ]]`
//! extended form instead uses `&&`/`||`/`!`/`( )` and adds `=~` regex
//! matching and unquoted `==` glob matching. Both share the same primary
//! (file-test and string/numeric comparison) evaluator.

use regex_lite::Regex;

use crate::expansion::glob::glob_match;

#[derive(Debug, Clone, thiserror::Error)]
pub enum TestError {
    #[error("test: {0}: unexpected token")]
    Unexpected(String),
    #[error("test: missing argument")]
    MissingArgument,
    #[error("test: {0}: unknown operator")]
    UnknownOperator(String),
}

struct Cursor<'a> {
    tokens: &'a [String],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(String::as_str)
    }
    fn next(&mut self) -> Option<&'a str> {
        let t = self.tokens.get(self.pos).map(String::as_str);
        self.pos += 1;
        t
    }
}

/// Evaluate a POSIX `test`/`[ ]` expression (args with surrounding `[`/`]`
/// already stripped).
pub fn evaluate_test(args: &[String]) -> Result<bool, TestError> {
    evaluate(args, false)
}

/// Evaluate a `[[ ]]` expression (args already stripped of the brackets).
pub fn evaluate_extended(args: &[String]) -> Result<bool, TestError> {
    evaluate(args, true)
}

fn evaluate(args: &[String], extended: bool) -> Result<bool, TestError> {
    if args.is_empty() {
        return Ok(false);
    }
    let mut cur = Cursor { tokens: args, pos: 0 };
    let result = parse_or(&mut cur, extended)?;
    Ok(result)
}

fn parse_or(cur: &mut Cursor, extended: bool) -> Result<bool, TestError> {
    let mut left = parse_and(cur, extended)?;
    loop {
        let op = if extended { "||" } else { "-o" };
        if cur.peek() == Some(op) {
            cur.next();
            let right = parse_and(cur, extended)?;
            left = left || right;
        } else {
            break;
        }
    }
    Ok(left)
}

fn parse_and(cur: &mut Cursor, extended: bool) -> Result<bool, TestError> {
    let mut left = parse_unary(cur, extended)?;
    loop {
        let op = if extended { "&&" } else { "-a" };
        if cur.peek() == Some(op) {
            cur.next();
            let right = parse_unary(cur, extended)?;
            left = left && right;
        } else {
            break;
        }
    }
    Ok(left)
}

fn parse_unary(cur: &mut Cursor, extended: bool) -> Result<bool, TestError> {
    if cur.peek() == Some("!") {
        cur.next();
        let inner = parse_unary(cur, extended)?;
        return Ok(!inner);
    }
    if cur.peek() == Some("(") {
        cur.next();
        let inner = parse_or(cur, extended)?;
        if cur.next() != Some(")") {
            return Err(TestError::Unexpected("expected `)`".into()));
        }
        return Ok(inner);
    }
    parse_primary(cur, extended)
}

fn parse_primary(cur: &mut Cursor, extended: bool) -> Result<bool, TestError> {
    let first = cur.next().ok_or(TestError::MissingArgument)?.to_string();

    if let Some(stripped) = first.strip_prefix('-') {
        if stripped.len() == 1 && "efdrwxsLpSbcugkGOtnz".contains(stripped) {
            let operand = cur.next().ok_or(TestError::MissingArgument)?;
            return Ok(file_or_string_unary(stripped, operand));
        }
    }

    // binary: OPERAND OP OPERAND
    let Some(op) = cur.peek().map(str::to_string) else {
        return Ok(!first.is_empty());
    };
    if is_binary_op(&op, extended) {
        cur.next();
        let right = cur.next().ok_or(TestError::MissingArgument)?;
        return evaluate_binary(&first, &op, right, extended);
    }

    Ok(!first.is_empty())
}

fn is_binary_op(op: &str, extended: bool) -> bool {
    matches!(op, "=" | "==" | "!=" | "-eq" | "-ne" | "-lt" | "-le" | "-gt" | "-ge" | "-nt" | "-ot" | "-ef")
        || (extended && op == "=~")
}

fn file_or_string_unary(flag: &str, operand: &str) -> bool {
    use std::fs;
    let meta = fs::metadata(operand);
    match flag {
        "z" => operand.is_empty(),
        "n" => !operand.is_empty(),
        "e" => meta.is_ok(),
        "f" => meta.map(|m| m.is_file()).unwrap_or(false),
        "d" => meta.map(|m| m.is_dir()).unwrap_or(false),
        "L" => fs::symlink_metadata(operand).map(|m| m.file_type().is_symlink()).unwrap_or(false),
        "s" => meta.map(|m| m.len() > 0).unwrap_or(false),
        "r" | "w" | "x" => meta.is_ok(), // permission bits beyond scope; existence stands in
        _ => false,
    }
}

fn evaluate_binary(left: &str, op: &str, right: &str, extended: bool) -> Result<bool, TestError> {
    match op {
        "=" | "==" => Ok(if extended { glob_match(right, left) } else { left == right }),
        "!=" => Ok(if extended { !glob_match(right, left) } else { left != right }),
        "=~" if extended => Regex::new(right).map(|re| re.is_match(left)).map_err(|_| TestError::UnknownOperator(op.into())),
        "-eq" => numeric(left, right, |a, b| a == b),
        "-ne" => numeric(left, right, |a, b| a != b),
        "-lt" => numeric(left, right, |a, b| a < b),
        "-le" => numeric(left, right, |a, b| a <= b),
        "-gt" => numeric(left, right, |a, b| a > b),
        "-ge" => numeric(left, right, |a, b| a >= b),
        "-nt" => Ok(mtime(left) > mtime(right)),
        "-ot" => Ok(mtime(left) < mtime(right)),
        "-ef" => Ok(std::fs::canonicalize(left).ok() == std::fs::canonicalize(right).ok()),
        _ => Err(TestError::UnknownOperator(op.to_string())),
    }
}

fn numeric(a: &str, b: &str, cmp: impl Fn(i64, i64) -> bool) -> Result<bool, TestError> {
    let a: i64 = a.trim().parse().map_err(|_| TestError::Unexpected(format!("{a}: not a number")))?;
    let b: i64 = b.trim().parse().map_err(|_| TestError::Unexpected(format!("{b}: not a number")))?;
    Ok(cmp(a, b))
}

fn mtime(path: &str) -> Option<std::time::SystemTime> {
    std::fs::metadata(path).ok().and_then(|m| m.modified().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn string_equality() {
        assert!(evaluate_test(&v(&["foo", "=", "foo"])).unwrap());
        assert!(!evaluate_test(&v(&["foo", "=", "bar"])).unwrap());
    }

    #[test]
    fn numeric_comparison() {
        assert!(evaluate_test(&v(&["3", "-lt", "5"])).unwrap());
        assert!(!evaluate_test(&v(&["3", "-gt", "5"])).unwrap());
    }

    #[test]
    fn string_nonempty_unary() {
        assert!(evaluate_test(&v(&["-n", "hi"])).unwrap());
        assert!(evaluate_test(&v(&["-z", ""])).unwrap());
    }

    #[test]
    fn negation() {
        assert!(evaluate_test(&v(&["!", "-z", "hi"])).unwrap());
    }

    #[test]
    fn posix_and_or() {
        assert!(evaluate_test(&v(&["-n", "a", "-a", "-n", "b"])).unwrap());
        assert!(evaluate_test(&v(&["-z", "a", "-o", "-n", "b"])).unwrap());
    }

    #[test]
    fn extended_glob_equality() {
        assert!(evaluate_extended(&v(&["hello.txt", "==", "*.txt"])).unwrap());
    }

    #[test]
    fn extended_regex_match() {
        assert!(evaluate_extended(&v(&["v1.2.3", "=~", r"^v\d+\."])).unwrap());
    }

    #[test]
    fn extended_and_or_parens() {
        assert!(evaluate_extended(&v(&["(", "-n", "a", "&&", "-n", "b", ")"])).unwrap());
    }
}
