//! Arithmetic formulas applied to raw values.
//!
//! A formula is an expression over numbers and the variable `v`, which is
//! replaced by the raw value before parsing:
//!
//! ```text
//! expression := term (('+' | '-') term)*
//! term       := factor (('*' | '/' | '%') factor)*
//! factor     := ('+' | '-')? (number | '(' expression ')') ('^' factor)?
//! ```
//!
//! `^` is right-associative. Formulas are cosmetic: [`evaluate`] never fails
//! and falls back to the input value on any error.

mod parser;

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::config::formula::MAX_EXPRESSION_LENGTH;
use crate::error::{Error, Result};

pub use parser::Parser;

static VALUE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bv\b").expect("valid regex"));

/// Substitute `value` for `v` and evaluate, returning the error on failure.
pub fn try_evaluate(formula: &str, value: f64) -> Result<f64> {
    let length = formula.chars().count();
    if length > MAX_EXPRESSION_LENGTH {
        return Err(Error::FormulaParse {
            position: MAX_EXPRESSION_LENGTH,
            message: format!(
                "formula is {} characters (max {})",
                length, MAX_EXPRESSION_LENGTH
            ),
        });
    }

    // f64 Display never uses exponent notation, which the parser cannot read
    let expression = VALUE_TOKEN.replace_all(formula, value.to_string().as_str());
    let result = Parser::new(&expression).parse()?;

    if !result.is_finite() {
        return Err(Error::FormulaParse {
            position: expression.len(),
            message: format!("non-finite result ({})", result),
        });
    }
    Ok(result)
}

/// Evaluate `formula` against `value`, falling back to `value` on any error.
pub fn evaluate(formula: &str, value: f64) -> f64 {
    match try_evaluate(formula, value) {
        Ok(result) => result,
        Err(e) => {
            let preview: String = formula.chars().take(50).collect();
            warn!("Formula '{}' failed: {}", preview, e);
            value
        }
    }
}
