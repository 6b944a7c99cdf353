use std::collections::BTreeMap;

use anyhow::{anyhow, Context};
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};

/// A single installed (or installable) package: the contents of its
/// `pkg.toml` metadata file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageSpec {
    pub name: String,
    pub version: Version,
    #[serde(default)]
    pub dependencies: BTreeMap<String, VersionReq>,
    #[serde(default)]
    pub executables: Vec<String>,
}

impl PackageSpec {
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
            dependencies: BTreeMap::new(),
            executables: Vec::new(),
        }
    }

    pub fn from_toml_str(input: &str) -> anyhow::Result<Self> {
        let spec: Self = toml::from_str(input).context("failed to parse package spec")?;
        if spec.name.trim().is_empty() {
            return Err(anyhow!("package spec name must not be empty"));
        }
        if spec.dependencies.contains_key(&spec.name) {
            return Err(anyhow!("package spec '{}' depends on itself", spec.name));
        }
        for executable in &spec.executables {
            if executable.trim().is_empty() || executable.contains('/') || executable.contains('\\')
            {
                return Err(anyhow!(
                    "package spec '{}' declares invalid executable name: '{}'",
                    spec.name,
                    executable
                ));
            }
        }
        Ok(spec)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        toml::to_string(self).with_context(|| format!("failed to serialize spec '{}'", self.name))
    }

    pub fn full_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}
