//! Source-annotated display for `config show`.

use std::fmt::{self, Write as _};
use std::str::FromStr;

use crate::merge::FieldSources;
use crate::types::Config;

/// A resolved configuration together with source annotations.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The final merged configuration.
    pub config: Config,
    /// Dotted field path → which layer set the value.
    pub field_sources: FieldSources,
    /// Config file paths that were loaded (in precedence order).
    pub loaded_files: Vec<String>,
}

/// Output format for `config show`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShowFormat {
    /// TOML with inline comments showing source.
    #[default]
    Toml,
    /// JSON (for programmatic consumption).
    Json,
}

impl FromStr for ShowFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown format '{other}'; expected toml or json")),
        }
    }
}

impl ResolvedConfig {
    /// Wrap a config that was not produced by the layered loader.
    #[must_use]
    pub fn unannotated(config: Config) -> Self {
        Self {
            config,
            field_sources: FieldSources::new(),
            loaded_files: Vec::new(),
        }
    }

    /// Render the resolved config, optionally limited to one section.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or `section` does not exist.
    pub fn show(&self, format: ShowFormat, section: Option<&str>) -> Result<String, fmt::Error> {
        let value = self.section_value(section)?;
        match format {
            ShowFormat::Toml => self.show_toml(&value, section),
            ShowFormat::Json => serde_json::to_string_pretty(&value).map_err(|_| fmt::Error),
        }
    }

    fn section_value(&self, section: Option<&str>) -> Result<toml::Value, fmt::Error> {
        let root = toml::Value::try_from(&self.config).map_err(|_| fmt::Error)?;
        match section {
            None => Ok(root),
            Some(name) => {
                let mut table = match root {
                    toml::Value::Table(table) => table,
                    _ => return Err(fmt::Error),
                };
                let inner = table.remove(name).ok_or(fmt::Error)?;
                let mut wrapped = toml::map::Map::new();
                wrapped.insert(name.to_owned(), inner);
                Ok(toml::Value::Table(wrapped))
            },
        }
    }

    fn show_toml(&self, value: &toml::Value, section: Option<&str>) -> Result<String, fmt::Error> {
        let body = toml::to_string_pretty(value).map_err(|_| fmt::Error)?;

        let mut output = String::new();
        output.push_str("# Resolved NotaryPy configuration\n");
        output.push_str("# Source annotations: [defaults] [system] [user] [explicit] [env]\n");

        if !self.loaded_files.is_empty() {
            output.push_str("#\n# Loaded files (in precedence order):\n");
            for (i, path) in self.loaded_files.iter().enumerate() {
                writeln!(output, "#   {}. {path}", i.saturating_add(1))?;
            }
        }
        output.push('\n');

        let mut current_section = section.unwrap_or_default().to_owned();
        for line in body.lines() {
            let trimmed = line.trim();
            if let Some(header) = trimmed
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
            {
                current_section = header.to_owned();
                writeln!(output, "{line}")?;
                continue;
            }

            match self.annotate_line(trimmed, &current_section) {
                Some(layer) => writeln!(output, "{line}  # [{layer}]")?,
                None => writeln!(output, "{line}")?,
            }
        }

        Ok(output)
    }

    /// Source layer for a `key = value` line inside `section`.
    fn annotate_line(&self, trimmed: &str, section: &str) -> Option<String> {
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }
        let (key, _) = trimmed.split_once('=')?;
        let key = key.trim();

        let path = if section.is_empty() {
            key.to_owned()
        } else {
            format!("{section}.{key}")
        };
        self.field_sources.get(&path).map(ToString::to_string)
    }
}
