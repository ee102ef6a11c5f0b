// ABOUTME: Configuration types and parsing for krouo.yml.
// ABOUTME: Handles YAML parsing, compact target entries, and template generation.

mod target;

pub use target::TargetConfig;

use crate::error::{Error, Result};
use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_FILENAME: &str = "krouo.yml";
pub const CONFIG_FILENAME_ALT: &str = "krouo.yaml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_targets")]
    pub targets: NonEmpty<TargetConfig>,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [dir.join(CONFIG_FILENAME), dir.join(CONFIG_FILENAME_ALT)];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Select targets by hostname, or all targets when no filter is given.
    pub fn select_targets(&self, host: Option<&str>) -> Result<Vec<&TargetConfig>> {
        match host {
            None => Ok(self.targets.iter().collect()),
            Some(host) => {
                let matched: Vec<_> = self.targets.iter().filter(|t| t.host == host).collect();
                if matched.is_empty() {
                    return Err(Error::UnknownTarget(host.to_string()));
                }
                Ok(matched)
            }
        }
    }
}

pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    std::fs::write(&config_path, template_yaml())?;

    Ok(())
}

fn template_yaml() -> &'static str {
    r#"targets:
  - host: my-host.net
    port: 22
    user: deploy
    knock_sequence: [1111, 2222]
    knock_timeout: 200ms
"#
}

fn deserialize_targets<'de, D>(
    deserializer: D,
) -> std::result::Result<NonEmpty<TargetConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<TargetEntry> = Vec::deserialize(deserializer)?;
    let targets = values
        .into_iter()
        .map(|entry| entry.into_target_config())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(serde::de::Error::custom)?;

    NonEmpty::from_vec(targets)
        .ok_or_else(|| serde::de::Error::custom("at least one target is required"))
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TargetEntry {
    Simple(String),
    Detailed(TargetConfig),
}

impl TargetEntry {
    fn into_target_config(self) -> std::result::Result<TargetConfig, String> {
        match self {
            TargetEntry::Simple(s) => TargetConfig::parse(&s),
            TargetEntry::Detailed(c) => Ok(c),
        }
    }
}
