//! Safety-constrained system instruction sent with every request.

use anyhow::{Context, Result};
use minijinja::{Environment, context};

use crate::core::classifier::REFUSAL_SENTINEL;

const SYSTEM_TEMPLATE: &str = include_str!("prompts/system.md");

/// Render the fixed system instruction with the refusal sentinel inlined.
pub fn render_system_instruction() -> Result<String> {
    let mut env = Environment::new();
    env.add_template("system", SYSTEM_TEMPLATE)
        .context("load system instruction template")?;
    let rendered = env
        .get_template("system")?
        .render(context! { refusal => REFUSAL_SENTINEL })
        .context("render system instruction")?;
    Ok(rendered.trim().to_string())
}
