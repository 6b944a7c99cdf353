use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use semver::VersionReq;
use serde::{Deserialize, Serialize};

/// One declared dependency record in a declaration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageRecord {
    pub name: String,
    #[serde(default = "any_requirement")]
    pub requirement: VersionReq,
    #[serde(default)]
    pub environments: Vec<String>,
}

fn any_requirement() -> VersionReq {
    VersionReq::STAR
}

/// Sandbox options a declaration file may set; unset fields leave the
/// constructed options untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeclaredOptions {
    pub path: Option<PathBuf>,
    pub source: Option<PathBuf>,
    pub install: Option<bool>,
    pub cleanup: Option<bool>,
    pub verbose: Option<bool>,
    pub system: Option<bool>,
    pub multiruntime: Option<bool>,
}

/// The static declaration-file format (`isopack.toml`): an optional
/// `[options]` table followed by `[[package]]` records. Declarations are
/// data, never executable configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeclarationFile {
    #[serde(default)]
    pub options: DeclaredOptions,
    #[serde(default, rename = "package")]
    pub packages: Vec<PackageRecord>,
}

impl DeclarationFile {
    pub fn from_toml_str(input: &str) -> anyhow::Result<Self> {
        let file: Self = toml::from_str(input).context("failed to parse declaration file")?;
        for record in &file.packages {
            if record.name.trim().is_empty() {
                return Err(anyhow!("declared package name must not be empty"));
            }
        }
        Ok(file)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed reading declaration file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("failed parsing declaration file: {}", path.display()))
    }
}
