//! Interactive algorithm selection for flags left off the command line.

use anyhow::Result;
use dialoguer::Select;

use pqtls_matrix_core::algorithm::AlgorithmId;

/// Use `given` if present, otherwise ask the user to pick one of `options`.
pub fn algorithm_or_prompt(
    given: Option<String>,
    prompt: &str,
    options: &[AlgorithmId],
) -> Result<String> {
    if let Some(value) = given {
        return Ok(value);
    }
    if options.is_empty() {
        anyhow::bail!("no {prompt} configured and none given on the command line");
    }

    let items: Vec<&str> = options.iter().map(AlgorithmId::as_str).collect();
    let selection = Select::new()
        .with_prompt(format!("Select {prompt}"))
        .items(&items)
        .default(0)
        .interact()?;

    Ok(items[selection].to_string())
}
