//! Layered configuration for the flowtag CLI.
//!
//! Precedence, lowest first: built-in defaults, the config file, `FLOWTAG_*`
//! environment variables, command-line flags.

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use flowtag_common::ReportFormat;
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::Overrides;

pub const DEFAULT_LOOKUP: &str = "lookup.csv";
pub const DEFAULT_FLOWS: &str = "flow_logs.txt";
pub const DEFAULT_OUTPUT: &str = "output_report.txt";

/// Base name of the config file picked up from the working directory when
/// `--config` is not given. Any extension `config` understands is accepted.
pub const DEFAULT_CONFIG_NAME: &str = "flowtag";

const ENV_PREFIX: &str = "FLOWTAG";

/// Resolved run settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Path to the lookup table
    pub lookup: PathBuf,

    /// Path to the flow log
    pub flows: PathBuf,

    /// Path the report is written to
    pub output: PathBuf,

    /// Report format name
    pub format: String,

    /// Lookup table field delimiter
    pub delimiter: String,
}

impl Settings {
    /// Resolve settings from every layer.
    pub fn load(config_file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("lookup", DEFAULT_LOOKUP)?
            .set_default("flows", DEFAULT_FLOWS)?
            .set_default("output", DEFAULT_OUTPUT)?
            .set_default("format", ReportFormat::default().to_string())?
            .set_default("delimiter", ",")?;

        builder = match config_file {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_NAME).required(false)),
        };

        let settings: Settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .set_override_option("lookup", path_value(&overrides.lookup))?
            .set_override_option("flows", path_value(&overrides.flows))?
            .set_override_option("output", path_value(&overrides.output))?
            .set_override_option("format", overrides.format.clone())?
            .set_override_option("delimiter", overrides.delimiter.clone())?
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        debug!("Resolved settings: {:?}", settings);
        Ok(settings)
    }

    pub fn report_format(&self) -> Result<ReportFormat> {
        self.format.parse().map_err(anyhow::Error::msg)
    }

    /// The lookup delimiter as a single byte. `tab` and `\t` name a tab.
    pub fn delimiter_byte(&self) -> Result<u8> {
        match self.delimiter.as_str() {
            "tab" | "\\t" => Ok(b'\t'),
            d if d.len() == 1 => Ok(d.as_bytes()[0]),
            d => bail!("delimiter must be a single byte, got '{}'", d),
        }
    }
}

fn path_value(path: &Option<PathBuf>) -> Option<String> {
    path.as_ref().map(|p| p.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn settings_with(delimiter: &str, format: &str) -> Settings {
        Settings {
            lookup: PathBuf::from(DEFAULT_LOOKUP),
            flows: PathBuf::from(DEFAULT_FLOWS),
            output: PathBuf::from(DEFAULT_OUTPUT),
            format: format.to_string(),
            delimiter: delimiter.to_string(),
        }
    }

    #[test]
    fn test_delimiter_byte() {
        assert_eq!(settings_with(",", "text").delimiter_byte().unwrap(), b',');
        assert_eq!(settings_with(";", "text").delimiter_byte().unwrap(), b';');
        assert_eq!(settings_with("tab", "text").delimiter_byte().unwrap(), b'\t');
        assert!(settings_with(",,", "text").delimiter_byte().is_err());
        assert!(settings_with("", "text").delimiter_byte().is_err());
    }

    #[test]
    fn test_report_format() {
        assert_eq!(settings_with(",", "json").report_format().unwrap(), ReportFormat::Json);
        assert!(settings_with(",", "yaml").report_format().is_err());
    }

    #[test]
    fn test_config_file_and_overrides() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "lookup = \"policy.csv\"").unwrap();
        writeln!(file, "output = \"from-file.txt\"").unwrap();
        writeln!(file, "format = \"json\"").unwrap();

        let overrides = Overrides {
            output: Some(PathBuf::from("from-cli.txt")),
            ..Default::default()
        };
        let settings = Settings::load(Some(file.path()), &overrides).unwrap();

        assert_eq!(settings.lookup, PathBuf::from("policy.csv"));
        assert_eq!(settings.output, PathBuf::from("from-cli.txt"));
        assert_eq!(settings.format, "json");
        assert_eq!(settings.delimiter, ",");
    }

    #[test]
    fn test_missing_explicit_config_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(Settings::load(Some(&path), &Overrides::default()).is_err());
    }
}
