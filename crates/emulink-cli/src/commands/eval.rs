use anyhow::{Context, Result};
use emulink_core::try_evaluate;

/// Run the eval command
pub fn run(formula: &str, value: f64) -> Result<()> {
    let result = try_evaluate(formula, value)
        .with_context(|| format!("Formula '{}' cannot be evaluated", formula))?;
    println!("{}", result);
    Ok(())
}
