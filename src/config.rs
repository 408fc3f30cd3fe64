use anyhow::{Context, Result, bail};
use depgraph::{Graph, WalkOptions};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the deployment file location
pub const ENV_CONFIG: &str = "DEPLOYDAG_CONFIG";

/// File looked up in the working directory when nothing else is given
pub const DEFAULT_CONFIG_FILE: &str = "deploydag.toml";

// ============================================================================
// Deployment File
// ============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DeployConfig {
    #[serde(default)]
    pub settings: WalkOptions,
    #[serde(default, rename = "unit")]
    pub units: Vec<Unit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    #[serde(default)]
    pub deploy: Option<String>,
    #[serde(default)]
    pub destroy: Option<String>,
    #[serde(default)]
    pub requires: Vec<String>,
}

impl DeployConfig {
    /// Load and check a deployment file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Invalid deployment file {}", path.display()))?;
        log::debug!(
            "Loaded {} unit(s) from {}",
            config.units.len(),
            path.display()
        );
        Ok(config)
    }

    /// Parse and check deployment TOML
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        let mut names = HashSet::with_capacity(self.units.len());
        for unit in &self.units {
            if !names.insert(unit.name.as_str()) {
                bail!("Duplicate unit '{}'", unit.name);
            }
        }

        for unit in &self.units {
            for dep in &unit.requires {
                if !names.contains(dep.as_str()) {
                    bail!("Unit '{}' requires unknown unit '{}'", unit.name, dep);
                }
            }
        }
        Ok(())
    }

    /// Find a unit by name
    pub fn find_unit(&self, name: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.name == name)
    }

    /// Build the dependency graph, rejecting cycles
    pub fn to_graph(&self) -> Result<Graph<String>> {
        let graph = Graph::from_map(
            self.units
                .iter()
                .map(|unit| (unit.name.clone(), unit.requires.clone())),
        )?;
        Ok(graph)
    }
}

// ============================================================================
// Path Resolution
// ============================================================================

/// Resolve the deployment file: explicit path, then env var, then default
///
/// The clap `env` attribute already folds the env var into `explicit`; it is
/// read again here for callers outside the CLI.
pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        let path = expand(&path.to_string_lossy());
        log::debug!("Using deployment file: {}", path.display());
        return path;
    }

    if let Ok(value) = std::env::var(ENV_CONFIG) {
        let path = expand(&value);
        log::debug!(
            "Using deployment file from {}: {}",
            ENV_CONFIG,
            path.display()
        );
        return path;
    }

    let path = PathBuf::from(DEFAULT_CONFIG_FILE);
    log::debug!("Using default deployment file: {}", path.display());
    path
}

/// Expand `~` and environment variables, leaving unknown variables untouched
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}
