//! Config subcommands handler

use anyhow::Result;
use std::path::Path;

use qcscan::config::docs::{annotate_config, insert_optional_field_templates};
use qcscan::Config;

/// Show the effective configuration as TOML with inline documentation comments.
#[cfg(not(tarpaulin_include))]
pub fn handle_show(config_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path)?;
    print!("{}", render(&config)?);
    Ok(())
}

/// Serialized config with templates for skipped optional fields, annotated.
pub fn render(config: &Config) -> Result<String> {
    let toml_str = toml::to_string_pretty(config)?;
    let with_templates = insert_optional_field_templates(&toml_str);
    Ok(annotate_config(&with_templates))
}
