//! Arithmetic expansion `$((expr))`.
//!
//! Recursive-descent evaluator over the standard C-like precedence ladder
//! bash exposes in arithmetic context: `||` `&&` `|` `^` `&` `==`/`!=`
//! `<`/`<=`/`>`/`>=` `<<`/`>>` `+`/`-` `*`/`/`/`%` unary `!`/`~`/`-`/`+` and
//! parentheses. Variable names resolve against `ShellState::environment`,
//! defaulting to `0` when unset (bash's documented behavior, not `nounset`'s
//! concern — that only governs parameter expansion).
//!
//! Only the `tokenize` step is cached (see [`evaluate_cached`]): it's a pure
//! function of the expression text, unlike the evaluated result, which
//! depends on live variable state and would go stale the moment a variable
//! changes between two textually-identical expressions.

use std::collections::HashMap;

use crate::expansion::cache::LruCache;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ArithError {
    #[error("division by zero")]
    DivideByZero,
    #[error("syntax error in expression (error token is \"{0}\")")]
    Syntax(String),
}

pub fn evaluate(expr: &str, vars: &HashMap<String, String>) -> Result<i64, ArithError> {
    eval_tokens(tokenize(expr)?, vars)
}

/// Same as [`evaluate`], but reuses `cache` to skip re-tokenizing an
/// expression string seen before. Only the token list is cached, never the
/// evaluated value, since the same expression text can evaluate differently
/// as shell variables change underneath it.
pub fn evaluate_cached(expr: &str, vars: &HashMap<String, String>, cache: &mut LruCache<String, Vec<String>>) -> Result<i64, ArithError> {
    if let Some(tokens) = cache.get(&expr.to_string()) {
        return eval_tokens(tokens.clone(), vars);
    }
    let tokens = tokenize(expr)?;
    cache.put(expr.to_string(), tokens.clone());
    eval_tokens(tokens, vars)
}

fn eval_tokens(tokens: Vec<String>, vars: &HashMap<String, String>) -> Result<i64, ArithError> {
    let len = tokens.len();
    let mut cur = Cur { tokens, pos: 0, vars };
    let value = cur.parse_or()?;
    if cur.pos != len {
        return Err(ArithError::Syntax(cur.tokens.get(cur.pos).cloned().unwrap_or_default()));
    }
    Ok(value)
}

fn tokenize(expr: &str) -> Result<Vec<String>, ArithError> {
    let chars: Vec<char> = expr.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;
    const MULTI: &[&str] = &["<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "**"];
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if let Some(op) = MULTI.iter().find(|op| chars[i..].starts_with(&op.chars().collect::<Vec<_>>()[..])) {
            out.push(op.to_string());
            i += op.len();
            continue;
        }
        if "+-*/%()<>!~&|^".contains(c) {
            out.push(c.to_string());
            i += 1;
            continue;
        }
        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == 'x' || chars[i] == 'X') {
                i += 1;
            }
            out.push(chars[start..i].iter().collect());
            continue;
        }
        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            out.push(chars[start..i].iter().collect());
            continue;
        }
        return Err(ArithError::Syntax(c.to_string()));
    }
    Ok(out)
}

struct Cur<'a> {
    tokens: Vec<String>,
    pos: usize,
    vars: &'a HashMap<String, String>,
}

impl<'a> Cur<'a> {
    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(String::as_str)
    }
    fn eat(&mut self, tok: &str) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Result<i64, ArithError> {
        let mut left = self.parse_and()?;
        while self.eat("||") {
            let right = self.parse_and()?;
            left = ((left != 0) || (right != 0)) as i64;
        }
        Ok(left)
    }
    fn parse_and(&mut self) -> Result<i64, ArithError> {
        let mut left = self.parse_bitor()?;
        while self.eat("&&") {
            let right = self.parse_bitor()?;
            left = ((left != 0) && (right != 0)) as i64;
        }
        Ok(left)
    }
    fn parse_bitor(&mut self) -> Result<i64, ArithError> {
        let mut left = self.parse_bitxor()?;
        while self.eat("|") {
            left |= self.parse_bitxor()?;
        }
        Ok(left)
    }
    fn parse_bitxor(&mut self) -> Result<i64, ArithError> {
        let mut left = self.parse_bitand()?;
        while self.eat("^") {
            left ^= self.parse_bitand()?;
        }
        Ok(left)
    }
    fn parse_bitand(&mut self) -> Result<i64, ArithError> {
        let mut left = self.parse_equality()?;
        while self.eat("&") {
            left &= self.parse_equality()?;
        }
        Ok(left)
    }
    fn parse_equality(&mut self) -> Result<i64, ArithError> {
        let mut left = self.parse_relational()?;
        loop {
            if self.eat("==") {
                left = (left == self.parse_relational()?) as i64;
            } else if self.eat("!=") {
                left = (left != self.parse_relational()?) as i64;
            } else {
                break;
            }
        }
        Ok(left)
    }
    fn parse_relational(&mut self) -> Result<i64, ArithError> {
        let mut left = self.parse_shift()?;
        loop {
            if self.eat("<=") {
                left = (left <= self.parse_shift()?) as i64;
            } else if self.eat(">=") {
                left = (left >= self.parse_shift()?) as i64;
            } else if self.peek() == Some("<") {
                self.pos += 1;
                left = (left < self.parse_shift()?) as i64;
            } else if self.peek() == Some(">") {
                self.pos += 1;
                left = (left > self.parse_shift()?) as i64;
            } else {
                break;
            }
        }
        Ok(left)
    }
    fn parse_shift(&mut self) -> Result<i64, ArithError> {
        let mut left = self.parse_additive()?;
        loop {
            if self.eat("<<") {
                left <<= self.parse_additive()?;
            } else if self.eat(">>") {
                left >>= self.parse_additive()?;
            } else {
                break;
            }
        }
        Ok(left)
    }
    fn parse_additive(&mut self) -> Result<i64, ArithError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            if self.eat("+") {
                left += self.parse_multiplicative()?;
            } else if self.eat("-") {
                left -= self.parse_multiplicative()?;
            } else {
                break;
            }
        }
        Ok(left)
    }
    fn parse_multiplicative(&mut self) -> Result<i64, ArithError> {
        let mut left = self.parse_power()?;
        loop {
            if self.eat("*") {
                left *= self.parse_power()?;
            } else if self.eat("/") {
                let rhs = self.parse_power()?;
                if rhs == 0 {
                    return Err(ArithError::DivideByZero);
                }
                left /= rhs;
            } else if self.eat("%") {
                let rhs = self.parse_power()?;
                if rhs == 0 {
                    return Err(ArithError::DivideByZero);
                }
                left %= rhs;
            } else {
                break;
            }
        }
        Ok(left)
    }
    fn parse_power(&mut self) -> Result<i64, ArithError> {
        let base = self.parse_unary()?;
        if self.eat("**") {
            let exp = self.parse_power()?;
            return Ok(base.pow(exp.max(0) as u32));
        }
        Ok(base)
    }
    fn parse_unary(&mut self) -> Result<i64, ArithError> {
        if self.eat("!") {
            return Ok((self.parse_unary()? == 0) as i64);
        }
        if self.eat("~") {
            return Ok(!self.parse_unary()?);
        }
        if self.eat("-") {
            return Ok(-self.parse_unary()?);
        }
        if self.eat("+") {
            return self.parse_unary();
        }
        self.parse_primary()
    }
    fn parse_primary(&mut self) -> Result<i64, ArithError> {
        if self.eat("(") {
            let v = self.parse_or()?;
            if !self.eat(")") {
                return Err(ArithError::Syntax(")".into()));
            }
            return Ok(v);
        }
        let tok = self.peek().ok_or_else(|| ArithError::Syntax("EOF".into()))?.to_string();
        self.pos += 1;
        if let Some(v) = parse_number(&tok) {
            return Ok(v);
        }
        // variable reference — nested expansion ($((x)) with x itself numeric-like)
        let resolved = self.vars.get(&tok).cloned().unwrap_or_default();
        if resolved.is_empty() {
            return Ok(0);
        }
        parse_number(&resolved).ok_or_else(|| ArithError::Syntax(tok.clone()))
    }
}

fn parse_number(tok: &str) -> Option<i64> {
    if let Some(hex) = tok.strip_prefix("0x").or_else(|| tok.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok();
    }
    if tok.len() > 1 && tok.starts_with('0') && tok.chars().all(|c| c.is_digit(8)) {
        return i64::from_str_radix(tok, 8).ok();
    }
    tok.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn basic_precedence() {
        assert_eq!(evaluate("2 + 3 * 4", &vars(&[])).unwrap(), 14);
    }

    #[test]
    fn parentheses_override_precedence() {
        assert_eq!(evaluate("(2 + 3) * 4", &vars(&[])).unwrap(), 20);
    }

    #[test]
    fn variable_substitution() {
        assert_eq!(evaluate("x + 1", &vars(&[("x", "41")])).unwrap(), 42);
    }

    #[test]
    fn unset_variable_defaults_to_zero() {
        assert_eq!(evaluate("y + 5", &vars(&[])).unwrap(), 5);
    }

    #[test]
    fn comparison_operators() {
        assert_eq!(evaluate("5 > 3", &vars(&[])).unwrap(), 1);
        assert_eq!(evaluate("5 < 3", &vars(&[])).unwrap(), 0);
    }

    #[test]
    fn divide_by_zero_errors() {
        assert_eq!(evaluate("1 / 0", &vars(&[])).unwrap_err(), ArithError::DivideByZero);
    }

    #[test]
    fn hex_literal() {
        assert_eq!(evaluate("0xFF", &vars(&[])).unwrap(), 255);
    }

    #[test]
    fn ternary_via_logical_ops_not_supported_but_bitwise_is() {
        assert_eq!(evaluate("6 & 3", &vars(&[])).unwrap(), 2);
        assert_eq!(evaluate("6 | 1", &vars(&[])).unwrap(), 7);
    }

    #[test]
    fn cached_evaluation_reflects_var_changes_despite_cached_tokens() {
        let mut cache = LruCache::new(8);
        let v1 = vars(&[("x", "1")]);
        assert_eq!(evaluate_cached("x + 1", &v1, &mut cache).unwrap(), 2);
        assert_eq!(cache.len(), 1);
        let v2 = vars(&[("x", "10")]);
        assert_eq!(evaluate_cached("x + 1", &v2, &mut cache).unwrap(), 11);
        assert_eq!(cache.len(), 1);
    }
}
