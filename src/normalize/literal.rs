// src/normalize/literal.rs

//! A restricted parser for the literal syntax models tend to answer in
//! (`{'ACTION': 'MOVE', 'QUANTITY': -1}`), and the matching renderer.
//!
//! Only mappings, sequences (`[...]` and tuples), strings, numbers, `True`,
//! `False` and `None` are accepted. Nothing is ever evaluated.

use crate::error::ParseError;
use serde_json::{Map, Number, Value};

const MAX_DEPTH: usize = 128;

/// Parses a complete literal expression. Trailing input is an error.
pub fn parse_literal(input: &str) -> Result<Value, ParseError> {
    let mut parser = Parser { src: input, pos: 0 };
    parser.skip_trivia();
    let value = parser.value(0)?;
    parser.skip_trivia();
    if parser.pos != input.len() {
        return Err(parser.error("trailing characters after literal"));
    }
    Ok(value)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, reason: impl Into<String>) -> ParseError {
        ParseError::Literal {
            offset: self.pos,
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{expected}'")))
        }
    }

    // Whitespace and `#` comments.
    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn value(&mut self, depth: usize) -> Result<Value, ParseError> {
        if depth > MAX_DEPTH {
            return Err(self.error("literal nested too deeply"));
        }
        match self.peek() {
            Some('{') => self.mapping(depth),
            Some('[') => self.sequence(depth, '[', ']'),
            Some('(') => self.parenthesized(depth),
            Some('\'') | Some('"') => self.strings(),
            Some(_) if self.at_string() => self.strings(),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.number(),
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.keyword(),
            Some(c) => Err(self.error(format!("unexpected character '{c}'"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn mapping(&mut self, depth: usize) -> Result<Value, ParseError> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_trivia();
            if self.eat('}') {
                return Ok(Value::Object(map));
            }
            let key_start = self.pos;
            let key = self.value(depth + 1)?;
            self.skip_trivia();
            if !self.eat(':') {
                return Err(self.error("expected ':' after mapping key (sets are not supported)"));
            }
            self.skip_trivia();
            let value = self.value(depth + 1)?;
            let key = match key {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(true) => "True".to_string(),
                Value::Bool(false) => "False".to_string(),
                Value::Null => "None".to_string(),
                _ => {
                    return Err(ParseError::Literal {
                        offset: key_start,
                        reason: "mapping keys must be scalars".into(),
                    });
                }
            };
            map.insert(key, value);
            self.skip_trivia();
            if self.eat(',') {
                continue;
            }
            self.skip_trivia();
            self.expect('}')?;
            return Ok(Value::Object(map));
        }
    }

    fn sequence(&mut self, depth: usize, open: char, close: char) -> Result<Value, ParseError> {
        self.expect(open)?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            if self.eat(close) {
                return Ok(Value::Array(items));
            }
            items.push(self.value(depth + 1)?);
            self.skip_trivia();
            if self.eat(',') {
                continue;
            }
            self.expect(close)?;
            return Ok(Value::Array(items));
        }
    }

    // `(x)` is just `x`; `()` and `(x,)` / `(x, y)` are tuples.
    fn parenthesized(&mut self, depth: usize) -> Result<Value, ParseError> {
        self.expect('(')?;
        self.skip_trivia();
        if self.eat(')') {
            return Ok(Value::Array(Vec::new()));
        }
        let first = self.value(depth + 1)?;
        self.skip_trivia();
        if self.eat(')') {
            return Ok(first);
        }
        self.expect(',')?;
        let mut items = vec![first];
        loop {
            self.skip_trivia();
            if self.eat(')') {
                return Ok(Value::Array(items));
            }
            items.push(self.value(depth + 1)?);
            self.skip_trivia();
            if self.eat(',') {
                continue;
            }
            self.expect(')')?;
            return Ok(Value::Array(items));
        }
    }

    // A quote, or a `r`/`u` prefix directly followed by one.
    fn at_string(&self) -> bool {
        let rest = &self.src[self.pos..];
        let mut chars = rest.chars();
        match chars.next() {
            Some('\'' | '"') => true,
            Some('r' | 'R' | 'u' | 'U') => matches!(chars.next(), Some('\'' | '"')),
            _ => false,
        }
    }

    // Adjacent string literals concatenate, as in `'a' 'b'`.
    fn strings(&mut self) -> Result<Value, ParseError> {
        let mut out = self.string()?;
        loop {
            let save = self.pos;
            self.skip_trivia();
            if self.at_string() {
                out.push_str(&self.string()?);
            } else {
                self.pos = save;
                return Ok(Value::String(out));
            }
        }
    }

    fn string(&mut self) -> Result<String, ParseError> {
        let raw = match self.peek() {
            Some('r' | 'R') => {
                self.bump();
                true
            }
            Some('u' | 'U') => {
                self.bump();
                false
            }
            _ => false,
        };
        let quote = match self.bump() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected string")),
        };
        let triple: String = [quote; 3].iter().collect();
        let is_triple = self.src[self.pos - 1..].starts_with(&triple);
        if is_triple {
            self.pos += 2;
        }

        let mut out = String::new();
        loop {
            let c = self.bump().ok_or_else(|| self.error("unterminated string"))?;
            if c == quote {
                if !is_triple {
                    return Ok(out);
                }
                if self.src[self.pos..].starts_with(&triple[1..]) {
                    self.pos += 2;
                    return Ok(out);
                }
                out.push(c);
            } else if c == '\\' && raw {
                // Raw strings keep the backslash, but it still shields a quote.
                out.push('\\');
                if let Some(next) = self.bump() {
                    out.push(next);
                }
            } else if c == '\\' {
                self.escape(&mut out)?;
            } else if c == '\n' && !is_triple {
                return Err(self.error("newline in single-quoted string"));
            } else {
                out.push(c);
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), ParseError> {
        let c = self.bump().ok_or_else(|| self.error("unterminated escape"))?;
        match c {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            'a' => out.push('\u{7}'),
            '0'..='7' => out.push(self.octal_escape(c)),
            'x' => out.push(self.hex_escape(2)?),
            'u' => out.push(self.hex_escape(4)?),
            'U' => out.push(self.hex_escape(8)?),
            'N' => return Err(self.error("named unicode escapes are not supported")),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    // Up to three octal digits, the first already consumed.
    fn octal_escape(&mut self, first: char) -> char {
        let mut code = first.to_digit(8).unwrap_or(0);
        for _ in 0..2 {
            match self.peek().and_then(|c| c.to_digit(8)) {
                Some(d) => {
                    code = code * 8 + d;
                    self.bump();
                }
                None => break,
            }
        }
        char::from_u32(code).unwrap_or('\u{fffd}')
    }

    fn hex_escape(&mut self, digits: usize) -> Result<char, ParseError> {
        let end = self.pos + digits;
        let hex = self
            .src
            .get(self.pos..end)
            .ok_or_else(|| self.error("truncated escape"))?;
        let code = u32::from_str_radix(hex, 16).map_err(|_| self.error("invalid hex escape"))?;
        self.pos = end;
        char::from_u32(code).ok_or_else(|| self.error("escape is not a valid character"))
    }

    // One optional sign, then a decimal, hex, octal or binary number.
    fn number(&mut self) -> Result<Value, ParseError> {
        let start = self.pos;
        let mut negative = false;
        if let Some(sign @ ('-' | '+')) = self.peek() {
            negative = sign == '-';
            self.bump();
            self.skip_trivia();
            if matches!(self.peek(), Some('-' | '+')) {
                return Err(self.error("only one sign is allowed on a number"));
            }
        }

        let radix = match self.src.get(self.pos..self.pos + 2) {
            Some("0x" | "0X") => Some(16),
            Some("0o" | "0O") => Some(8),
            Some("0b" | "0B") => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            return self.radix_integer(start, radix, negative);
        }

        let digits_start = self.pos;
        let mut is_float = false;
        let mut seen_digit = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => seen_digit = true,
                '_' => {}
                '.' if !is_float => is_float = true,
                'e' | 'E' if seen_digit => {
                    is_float = true;
                    self.bump();
                    if matches!(self.peek(), Some('-' | '+')) {
                        self.bump();
                    }
                    continue;
                }
                _ => break,
            }
            self.bump();
        }
        if !seen_digit {
            self.pos = start;
            return Err(self.error("expected a number"));
        }

        let text: String = self.src[digits_start..self.pos]
            .chars()
            .filter(|c| *c != '_')
            .collect();
        if !is_float && text.len() > 1 && text.starts_with('0') && text.chars().any(|c| c != '0') {
            return Err(ParseError::Literal {
                offset: digits_start,
                reason: format!("leading zeros in decimal integer: {text}"),
            });
        }
        let signed = if negative { format!("-{text}") } else { text };

        if !is_float {
            if let Ok(i) = signed.parse::<i64>() {
                return Ok(Value::Number(i.into()));
            }
            if let Ok(u) = signed.parse::<u64>() {
                return Ok(Value::Number(u.into()));
            }
        }
        signed
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| ParseError::Literal {
                offset: start,
                reason: format!("number out of range: {signed}"),
            })
    }

    fn radix_integer(&mut self, start: usize, radix: u32, negative: bool) -> Result<Value, ParseError> {
        self.pos += 2;
        let digits_start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_digit(radix) || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        let digits: String = self.src[digits_start..self.pos]
            .chars()
            .filter(|c| *c != '_')
            .collect();
        let magnitude = u64::from_str_radix(&digits, radix).map_err(|_| ParseError::Literal {
            offset: start,
            reason: format!("invalid base-{radix} integer"),
        })?;
        let value = if negative {
            0i64.checked_sub_unsigned(magnitude).map(Number::from)
        } else {
            Some(Number::from(magnitude))
        };
        value.map(Value::Number).ok_or_else(|| ParseError::Literal {
            offset: start,
            reason: format!("base-{radix} integer out of range"),
        })
    }

    fn keyword(&mut self) -> Result<Value, ParseError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        match &self.src[start..self.pos] {
            "True" => Ok(Value::Bool(true)),
            "False" => Ok(Value::Bool(false)),
            "None" => Ok(Value::Null),
            word => {
                let word = word.to_string();
                self.pos = start;
                Err(self.error(format!("'{word}' is not a literal")))
            }
        }
    }
}

/// Renders a record in the same literal syntax `parse_literal` reads.
pub fn to_literal(value: &Value) -> String {
    let mut out = String::new();
    write_literal(value, &mut out);
    out
}

fn write_literal(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => out.push_str(&i.to_string()),
            (_, Some(u), _) => out.push_str(&u.to_string()),
            (_, _, Some(f)) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 => {
                out.push_str(&format!("{f:.1}"))
            }
            _ => out.push_str(&n.to_string()),
        },
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_literal(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_string(key, out);
                out.push_str(": ");
                write_literal(item, out);
            }
            out.push('}');
        }
    }
}

fn write_string(s: &str, out: &mut String) {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32))
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}
