use std::path::Path;

use anyhow::{Context, bail};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::layout::LayoutParams;
use crate::measure::{NodeMetrics, TextMetrics};

/// Everything a deployment can tune. A config file only needs the values it
/// changes; the rest keep their defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub metrics: NodeMetrics,
    pub text: TextMetrics,
    pub layout: LayoutParams,
}

/// On-disk shape. Layout sections stay raw so each one can be laid over its
/// own preset rather than the generic default of its type.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    metrics: NodeMetrics,
    text: TextMetrics,
    layout: Map<String, Value>,
}

impl Config {
    pub fn from_json(contents: &str) -> anyhow::Result<Self> {
        let file: ConfigFile = serde_json::from_str(contents).context("invalid config JSON")?;
        let mut sections = file.layout;

        let defaults = LayoutParams::default();
        let layout = LayoutParams {
            grid: overlay(&defaults.grid, sections.remove("grid"), "grid")?,
            hierarchical: overlay(
                &defaults.hierarchical,
                sections.remove("hierarchical"),
                "hierarchical",
            )?,
            orthogonal: overlay(&defaults.orthogonal, sections.remove("orthogonal"), "orthogonal")?,
            relationship_paths: overlay(
                &defaults.relationship_paths,
                sections.remove("relationship_paths"),
                "relationship_paths",
            )?,
            organic: overlay(&defaults.organic, sections.remove("organic"), "organic")?,
            smart_organic: overlay(
                &defaults.smart_organic,
                sections.remove("smart_organic"),
                "smart_organic",
            )?,
            circular: overlay(&defaults.circular, sections.remove("circular"), "circular")?,
            star: overlay(&defaults.star, sections.remove("star"), "star")?,
        };

        if let Some(unknown) = sections.keys().next() {
            bail!("unknown layout section `{unknown}`");
        }

        Ok(Self {
            metrics: file.metrics,
            text: file.text,
            layout,
        })
    }
}

/// Copy the keys of `patch` over the serialized `base` and read the result back.
fn overlay<T>(base: &T, patch: Option<Value>, section: &str) -> anyhow::Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut merged = serde_json::to_value(base)?;
    match (patch, &mut merged) {
        (None, _) => {}
        (Some(Value::Object(patch)), Value::Object(fields)) => fields.extend(patch),
        (Some(_), _) => bail!("layout section `{section}` must be an object"),
    }
    serde_json::from_value(merged).with_context(|| format!("invalid layout section `{section}`"))
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    Config::from_json(&contents).with_context(|| format!("in {}", path.display()))
}
