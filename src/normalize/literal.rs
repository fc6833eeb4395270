//! Permissive parser for dict-literal style metadata
//!
//! Some extracts serialize session metadata as a dict literal rather than JSON:
//! single-quoted strings, `True`/`False`/`None`, tuples, trailing commas. This parser
//! accepts that dialect (and the JSON keywords `true`/`false`/`null`) and produces a
//! [`serde_json::Value`] that can be re-serialized as canonical JSON.
//!
//! Non-string mapping keys are rendered the way a JSON encoder would: numbers by their
//! textual form, booleans as `"true"`/`"false"` and `None` as `"null"`.

use serde_json::{Map, Number, Value};
use thiserror::Error;

/// A literal that could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid literal at byte {position}: {message}")]
pub struct LiteralError {
    /// Byte offset of the failure
    pub position: usize,
    /// What went wrong
    pub message: String,
}

/// Parse a dict-literal style string into a JSON value
pub fn parse_literal(input: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser { src: input, pos: 0 };
    let value = parser.value()?;
    parser.skip_whitespace();
    if parser.pos != input.len() {
        return Err(parser.error("unexpected trailing characters"));
    }
    Ok(value)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: impl Into<String>) -> LiteralError {
        LiteralError { position: self.pos, message: message.into() }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), LiteralError> {
        self.skip_whitespace();
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.error(format!("expected '{}', found '{}'", expected, c))),
            None => Err(self.error(format!("expected '{}', found end of input", expected))),
        }
    }

    fn value(&mut self) -> Result<Value, LiteralError> {
        self.skip_whitespace();
        match self.peek() {
            Some('{') => self.dict(),
            Some('[') => self.sequence('[', ']'),
            Some('(') => self.sequence('(', ')'),
            Some('\'') | Some('"') => self.strings().map(Value::String),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.number(),
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.word(),
            Some(c) => Err(self.error(format!("unexpected character '{}'", c))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn dict(&mut self) -> Result<Value, LiteralError> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some('}') {
                self.bump();
                return Ok(Value::Object(map));
            }
            let key_position = self.pos;
            let key = object_key(self.value()?).map_err(|message| LiteralError {
                position: key_position,
                message,
            })?;
            self.expect(':')?;
            let value = self.value()?;
            map.insert(key, value);

            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                Some('}') => return Ok(Value::Object(map)),
                _ => return Err(self.error("expected ',' or '}' in mapping")),
            }
        }
    }

    fn sequence(&mut self, open: char, close: char) -> Result<Value, LiteralError> {
        self.expect(open)?;
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.bump();
                return Ok(Value::Array(items));
            }
            items.push(self.value()?);

            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                Some(c) if c == close => return Ok(Value::Array(items)),
                _ => return Err(self.error(format!("expected ',' or '{}' in sequence", close))),
            }
        }
    }

    /// One or more adjacent string literals, concatenated
    fn strings(&mut self) -> Result<String, LiteralError> {
        let mut out = self.string(false)?;
        loop {
            let checkpoint = self.pos;
            self.skip_whitespace();
            match self.peek() {
                Some('\'') | Some('"') => out.push_str(&self.string(false)?),
                _ => {
                    self.pos = checkpoint;
                    return Ok(out);
                }
            }
        }
    }

    fn string(&mut self, raw: bool) -> Result<String, LiteralError> {
        let quote = match self.bump() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected a quoted string")),
        };
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') if raw => {
                    out.push('\\');
                    if let Some(next) = self.bump() {
                        out.push(next);
                    }
                }
                Some('\\') => self.escape(&mut out)?,
                Some(c) => out.push(c),
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), LiteralError> {
        let Some(c) = self.bump() else {
            return Err(self.error("unterminated escape sequence"));
        };
        match c {
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            '0' => out.push('\0'),
            '\n' => {}
            'x' => out.push(self.code_point(2)?),
            'u' => out.push(self.code_point(4)?),
            'U' => out.push(self.code_point(8)?),
            other => {
                // Unknown escapes keep their backslash.
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn code_point(&mut self, digits: usize) -> Result<char, LiteralError> {
        let rest = self.rest();
        let hex = rest.get(..digits).filter(|h| h.chars().all(|c| c.is_ascii_hexdigit()));
        let Some(hex) = hex else {
            return Err(self.error(format!("expected {} hex digits", digits)));
        };
        let code = u32::from_str_radix(hex, 16).map_err(|e| self.error(e.to_string()))?;
        let c = char::from_u32(code).ok_or_else(|| self.error("invalid code point"))?;
        self.pos += digits;
        Ok(c)
    }

    fn number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.bump();
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '_'))
        {
            let c = self.bump();
            if matches!(c, Some('e' | 'E')) && matches!(self.peek(), Some('-' | '+')) {
                self.bump();
            }
        }

        let text: String = self.src[start..self.pos].chars().filter(|c| *c != '_').collect();
        let text = text.strip_prefix('+').unwrap_or(&text);
        let is_float = text.contains(['.', 'e', 'E']);

        let number = if is_float {
            text.parse::<f64>().ok().and_then(Number::from_f64)
        } else if let Ok(signed) = text.parse::<i64>() {
            Some(Number::from(signed))
        } else {
            text.parse::<u64>().ok().map(Number::from)
        };

        number
            .map(Value::Number)
            .ok_or_else(|| LiteralError { position: start, message: format!("invalid number '{}'", text) })
    }

    fn word(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            self.bump();
        }
        let word = &self.src[start..self.pos];

        // String prefixes such as u'..' or r'..'
        if matches!(self.peek(), Some('\'' | '"')) {
            return match word.to_ascii_lowercase().as_str() {
                "u" => self.strings().map(Value::String),
                "r" => self.string(true).map(Value::String),
                _ => Err(LiteralError {
                    position: start,
                    message: format!("unsupported string prefix '{}'", word),
                }),
            };
        }

        match word {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            "None" | "null" => Ok(Value::Null),
            _ => Err(LiteralError { position: start, message: format!("unknown name '{}'", word) }),
        }
    }
}

fn object_key(value: Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok("null".to_string()),
        Value::Array(_) | Value::Object(_) => Err("mapping keys must be scalars".to_string()),
    }
}
