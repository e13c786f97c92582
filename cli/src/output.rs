//! Output formatting

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::{builder::Builder, settings::Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    /// JSON and YAML print the report itself; tables are rendered per command
    pub fn is_structured(&self) -> bool {
        !matches!(self, OutputFormat::Table)
    }

    pub fn print<T: Serialize>(&self, data: &T) -> Result<()> {
        match self {
            OutputFormat::Json | OutputFormat::Table => {
                println!("{}", serde_json::to_string_pretty(data)?);
            }
            OutputFormat::Yaml => {
                print!("{}", serde_yaml::to_string(data)?);
            }
        }
        Ok(())
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        };
        f.write_str(name)
    }
}

/// Two-column field/value table
pub fn key_value_table<K, V>(rows: impl IntoIterator<Item = (K, V)>) -> String
where
    K: Into<String>,
    V: Into<String>,
{
    let mut builder = Builder::default();
    for (key, value) in rows {
        builder.push_record([key.into(), value.into()]);
    }
    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_value_table_contains_rows() {
        let table = key_value_table([("Level", "3 (FULL)"), ("PIN", "5329")]);
        assert!(table.contains("Level"));
        assert!(table.contains("3 (FULL)"));
        assert!(table.contains("5329"));
    }

    #[test]
    fn test_display_matches_value_names() {
        for format in [OutputFormat::Table, OutputFormat::Json, OutputFormat::Yaml] {
            assert_eq!(OutputFormat::from_str(&format.to_string(), false), Ok(format));
        }
    }

    #[test]
    fn test_structured() {
        assert!(!OutputFormat::Table.is_structured());
        assert!(OutputFormat::Json.is_structured());
        assert!(OutputFormat::Yaml.is_structured());
    }
}
