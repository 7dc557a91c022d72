//! # CLI Configuration
//!
//! Optional YAML configuration file. Command-line flags override file
//! values; without either, the bundled escalation definition and text
//! output are used.
//!
//! ```yaml
//! definition: machines/deployment.yaml
//! format: json
//! ```
//!
//! A relative `definition` path is resolved against the directory holding
//! the configuration file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::OutputFormat;

/// Contents of a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    /// Machine definition to load.
    #[serde(default)]
    pub definition: Option<PathBuf>,
    /// Default output format.
    #[serde(default)]
    pub format: Option<OutputFormat>,
}

impl CliConfig {
    /// Read a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let mut config: CliConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("invalid YAML in {}", path.display()))?;
        if let (Some(definition), Some(base)) = (config.definition.as_ref(), path.parent()) {
            if definition.is_relative() {
                config.definition = Some(base.join(definition));
            }
        }
        tracing::debug!(config = %path.display(), "loaded CLI configuration");
        Ok(config)
    }
}

/// Effective settings after merging flags over the configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Definition file; `None` selects the bundled escalation definition.
    pub definition: Option<PathBuf>,
    /// Output format.
    pub format: OutputFormat,
}

impl Settings {
    /// Merge command-line flags over an optional configuration file.
    pub fn resolve(
        config_path: Option<&Path>,
        definition: Option<&Path>,
        format: Option<OutputFormat>,
    ) -> Result<Self> {
        let config = match config_path {
            Some(path) => CliConfig::load(path)?,
            None => CliConfig::default(),
        };
        Ok(Self {
            definition: definition.map(Path::to_path_buf).or(config.definition),
            format: format.or(config.format).unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_config() {
        let settings = Settings::resolve(None, None, None).unwrap();
        assert_eq!(settings.definition, None);
        assert_eq!(settings.format, OutputFormat::Text);
    }

    #[test]
    fn config_file_values_and_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lifecycle.yaml");
        std::fs::write(&path, "definition: machines/deploy.yaml\nformat: json\n").unwrap();

        let settings = Settings::resolve(Some(&path), None, None).unwrap();
        assert_eq!(settings.definition, Some(dir.path().join("machines/deploy.yaml")));
        assert_eq!(settings.format, OutputFormat::Json);
    }

    #[test]
    fn flags_override_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lifecycle.yaml");
        std::fs::write(&path, "definition: a.yaml\nformat: json\n").unwrap();

        let settings =
            Settings::resolve(Some(&path), Some(Path::new("/tmp/b.yaml")), Some(OutputFormat::Text)).unwrap();
        assert_eq!(settings.definition, Some(PathBuf::from("/tmp/b.yaml")));
        assert_eq!(settings.format, OutputFormat::Text);
    }

    #[test]
    fn unknown_keys_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lifecycle.yaml");
        std::fs::write(&path, "definitions: oops.yaml\n").unwrap();
        assert!(Settings::resolve(Some(&path), None, None).is_err());
    }

    #[test]
    fn missing_config_file_errors() {
        let err = Settings::resolve(Some(Path::new("/nonexistent/lifecycle.yaml")), None, None).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
