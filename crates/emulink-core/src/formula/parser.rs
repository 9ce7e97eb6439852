use crate::config::formula::MAX_NESTING_DEPTH;
use crate::error::{Error, Result};

/// Recursive-descent parser over a fully substituted expression.
///
/// Holds its own position and nesting depth, so one parser evaluates one
/// expression and nothing is shared between evaluations.
pub struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            depth: 0,
        }
    }

    /// Parse the whole input. Trailing input is an error.
    pub fn parse(mut self) -> Result<f64> {
        let value = self.expression()?;
        self.skip_whitespace();
        if self.pos < self.input.len() {
            return Err(self.unexpected());
        }
        Ok(value)
    }

    fn expression(&mut self) -> Result<f64> {
        let mut value = self.term()?;
        loop {
            if self.eat(b'+') {
                value += self.term()?;
            } else if self.eat(b'-') {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn term(&mut self) -> Result<f64> {
        let mut value = self.factor()?;
        loop {
            if self.eat(b'*') {
                value *= self.factor()?;
            } else if self.eat(b'/') {
                value /= self.factor()?;
            } else if self.eat(b'%') {
                value %= self.factor()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn factor(&mut self) -> Result<f64> {
        if self.eat(b'+') {
            return self.factor();
        }
        if self.eat(b'-') {
            return Ok(-self.factor()?);
        }

        let mut value = if self.eat(b'(') {
            self.depth += 1;
            if self.depth > MAX_NESTING_DEPTH {
                return Err(self.error(format!(
                    "nesting deeper than {}",
                    MAX_NESTING_DEPTH
                )));
            }
            let inner = self.expression()?;
            if !self.eat(b')') {
                return Err(self.error("missing ')'".to_string()));
            }
            self.depth -= 1;
            inner
        } else {
            self.number()?
        };

        if self.eat(b'^') {
            value = value.powf(self.factor()?);
        }
        Ok(value)
    }

    fn number(&mut self) -> Result<f64> {
        self.skip_whitespace();
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == b'.') {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.unexpected());
        }

        // Only ASCII digits and '.' were consumed
        let literal = std::str::from_utf8(&self.input[start..self.pos]).unwrap_or_default();
        literal.parse().map_err(|_| Error::FormulaParse {
            position: start,
            message: format!("invalid number '{}'", literal),
        })
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, expected: u8) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, message: String) -> Error {
        Error::FormulaParse {
            position: self.pos,
            message,
        }
    }

    fn unexpected(&self) -> Error {
        match self.peek() {
            Some(c) => self.error(format!("unexpected '{}'", c as char)),
            None => self.error("unexpected end of input".to_string()),
        }
    }
}
