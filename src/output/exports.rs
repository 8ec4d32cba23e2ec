use anyhow::{bail, Result};
use serde::Serialize;
use std::io::Write;

use crate::config::OutputFormat;

/// Writes any report as JSON or YAML.
///
/// The summary format is rendered by the summary printers instead and is
/// rejected here.
pub fn export<T: Serialize + ?Sized>(
    value: &T,
    format: OutputFormat,
    pretty: bool,
    output: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Summary => bail!("Summary output is rendered by the summary printer"),
        OutputFormat::Json => export_json(value, pretty, output),
        OutputFormat::Yaml => export_yaml(value, output),
    }
}

fn export_json<T: Serialize + ?Sized>(value: &T, pretty: bool, output: &mut dyn Write) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    writeln!(output, "{json}")?;
    Ok(())
}

fn export_yaml<T: Serialize + ?Sized>(value: &T, output: &mut dyn Write) -> Result<()> {
    let yaml = serde_yaml::to_string(value)?;
    write!(output, "{yaml}")?;
    Ok(())
}
