//! Permissive literal parser for dictionary-style model output.
//!
//! Accepts what a model produces when it writes a Python dict instead of JSON:
//! single- or double-quoted strings (triple quotes too), `True`/`False`/`None`
//! alongside `true`/`false`/`null`, tuples, adjacent string concatenation and
//! trailing commas. Produces a [`serde_json::Value`].

use serde_json::{Map, Number, Value};
use thiserror::Error;

const MAX_DEPTH: usize = 128;

#[derive(Debug, Error, PartialEq)]
pub enum LiteralError {
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unexpected character {found:?} at offset {offset}")]
    Unexpected { found: char, offset: usize },

    #[error("invalid number {0:?}")]
    InvalidNumber(String),

    #[error("invalid escape sequence at offset {0}")]
    InvalidEscape(usize),

    #[error("trailing characters at offset {0}")]
    TrailingCharacters(usize),

    #[error("nesting deeper than {MAX_DEPTH} levels")]
    TooDeep,
}

/// Parses a single literal expression spanning the whole input.
pub fn parse_literal(input: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser {
        src: input,
        pos: 0,
        depth: 0,
    };
    let value = parser.value()?;
    parser.skip_ws();
    if parser.pos < parser.src.len() {
        return Err(LiteralError::TrailingCharacters(parser.pos));
    }
    Ok(value)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(ch) if ch.is_whitespace()) {
            self.bump();
        }
    }

    fn unexpected(&self) -> LiteralError {
        match self.peek() {
            Some(found) => LiteralError::Unexpected {
                found,
                offset: self.pos,
            },
            None => LiteralError::UnexpectedEnd,
        }
    }

    fn expect(&mut self, wanted: char) -> Result<(), LiteralError> {
        self.skip_ws();
        if self.peek() == Some(wanted) {
            self.bump();
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn value(&mut self) -> Result<Value, LiteralError> {
        self.skip_ws();
        match self.peek() {
            None => Err(LiteralError::UnexpectedEnd),
            Some('{') => self.nested(Self::dict),
            Some('[') => self.nested(|p| p.sequence(']').map(|(items, _)| Value::Array(items))),
            Some('(') => self.nested(Self::tuple),
            Some('\'' | '"') => self.strings(),
            Some(ch) if ch.is_ascii_digit() || matches!(ch, '-' | '+' | '.') => self.number(),
            Some(ch) if ch.is_alphabetic() => self.keyword(),
            Some(_) => Err(self.unexpected()),
        }
    }

    fn nested(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<Value, LiteralError>,
    ) -> Result<Value, LiteralError> {
        if self.depth >= MAX_DEPTH {
            return Err(LiteralError::TooDeep);
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn dict(&mut self) -> Result<Value, LiteralError> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_ws();
            if self.peek() == Some('}') {
                self.bump();
                return Ok(Value::Object(map));
            }
            let key = match self.value()? {
                Value::String(s) => s,
                other => other.to_string(),
            };
            self.expect(':')?;
            let value = self.value()?;
            map.insert(key, value);

            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {}
                _ => return Err(self.unexpected()),
            }
        }
    }

    /// Parses comma-separated items up to `close`. Also reports whether a
    /// trailing comma was present, which distinguishes `(x,)` from `(x)`.
    fn sequence(&mut self, close: char) -> Result<(Vec<Value>, bool), LiteralError> {
        self.bump();
        let mut items = Vec::new();
        let mut trailing_comma = false;
        loop {
            self.skip_ws();
            if self.peek() == Some(close) {
                self.bump();
                return Ok((items, trailing_comma));
            }
            items.push(self.value()?);
            trailing_comma = false;

            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                    trailing_comma = true;
                }
                Some(ch) if ch == close => {}
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn tuple(&mut self) -> Result<Value, LiteralError> {
        let (mut items, trailing_comma) = self.sequence(')')?;
        if items.len() == 1 && !trailing_comma {
            // `(x)` is a parenthesised expression, not a tuple.
            return Ok(items.remove(0));
        }
        Ok(Value::Array(items))
    }

    fn keyword(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while matches!(self.peek(), Some(ch) if ch.is_alphanumeric() || ch == '_') {
            self.bump();
        }
        match &self.src[start..self.pos] {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            "None" | "null" => Ok(Value::Null),
            _ => {
                self.pos = start;
                Err(self.unexpected())
            }
        }
    }

    fn number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.bump();
        }
        let mut is_float = false;
        while let Some(ch) = self.peek() {
            match ch {
                '0'..='9' | '_' => {}
                '.' => is_float = true,
                'e' | 'E' => {
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

        let text = &self.src[start..self.pos];
        let cleaned: String = text.chars().filter(|&c| c != '_').collect();
        let invalid = || LiteralError::InvalidNumber(text.to_string());

        if !is_float {
            if let Ok(n) = cleaned.parse::<i64>() {
                return Ok(Value::Number(n.into()));
            }
        }
        cleaned
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(invalid)
    }

    /// One string literal, or several adjacent ones concatenated.
    fn strings(&mut self) -> Result<Value, LiteralError> {
        let mut out = self.string()?;
        loop {
            let checkpoint = self.pos;
            self.skip_ws();
            if matches!(self.peek(), Some('\'' | '"')) {
                out.push_str(&self.string()?);
            } else {
                self.pos = checkpoint;
                return Ok(Value::String(out));
            }
        }
    }

    fn string(&mut self) -> Result<String, LiteralError> {
        let quote = self.bump().ok_or(LiteralError::UnexpectedEnd)?;
        let triple: String = std::iter::repeat(quote).take(3).collect();
        let is_triple = self.rest().starts_with(&triple[quote.len_utf8()..]);
        if is_triple {
            self.pos += 2 * quote.len_utf8();
        }

        let mut out = String::new();
        loop {
            if is_triple {
                if self.rest().starts_with(&triple) {
                    self.pos += triple.len();
                    return Ok(out);
                }
            } else if self.peek() == Some(quote) {
                self.bump();
                return Ok(out);
            }

            match self.bump() {
                None => return Err(LiteralError::UnexpectedEnd),
                Some('\\') => self.escape(&mut out)?,
                Some('\n') if !is_triple => {
                    return Err(LiteralError::Unexpected {
                        found: '\n',
                        offset: self.pos - 1,
                    })
                }
                Some(ch) => out.push(ch),
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), LiteralError> {
        let offset = self.pos - 1;
        let ch = self.bump().ok_or(LiteralError::UnexpectedEnd)?;
        match ch {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            '0' => out.push('\0'),
            '\\' | '\'' | '"' | '/' => out.push(ch),
            '\n' => {}
            'x' => out.push(self.hex_char(2, offset)?),
            'u' => {
                let unit = self.hex_code(4, offset)?;
                let code = if (0xD800..0xDC00).contains(&unit) {
                    if !self.rest().starts_with("\\u") {
                        return Err(LiteralError::InvalidEscape(offset));
                    }
                    self.pos += 2;
                    let low = self.hex_code(4, offset)?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err(LiteralError::InvalidEscape(offset));
                    }
                    0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00)
                } else {
                    unit
                };
                out.push(char::from_u32(code).ok_or(LiteralError::InvalidEscape(offset))?);
            }
            'U' => out.push(self.hex_char(8, offset)?),
            // Unknown escapes keep their backslash.
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn hex_code(&mut self, len: usize, offset: usize) -> Result<u32, LiteralError> {
        let digits = self
            .rest()
            .get(..len)
            .filter(|d| d.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or(LiteralError::InvalidEscape(offset))?;
        let code = u32::from_str_radix(digits, 16).map_err(|_| LiteralError::InvalidEscape(offset))?;
        self.pos += len;
        Ok(code)
    }

    fn hex_char(&mut self, len: usize, offset: usize) -> Result<char, LiteralError> {
        let code = self.hex_code(len, offset)?;
        char::from_u32(code).ok_or(LiteralError::InvalidEscape(offset))
    }
}
