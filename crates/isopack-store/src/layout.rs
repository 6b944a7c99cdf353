use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Path schema of a package store rooted at an isolation path. Installed
/// packages live under `pkgs/<name>/<version>/` with their metadata in
/// `pkg.toml`; exposed executables live under `bin/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    root: PathBuf,
}

impl StoreLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pkgs_dir(&self) -> PathBuf {
        self.root.join("pkgs")
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    pub fn name_dir(&self, name: &str) -> PathBuf {
        self.pkgs_dir().join(name)
    }

    pub fn package_dir(&self, name: &str, version: &str) -> PathBuf {
        self.name_dir(name).join(version)
    }

    pub fn spec_path(&self, name: &str, version: &str) -> PathBuf {
        self.package_dir(name, version).join("pkg.toml")
    }

    pub fn ensure_base_dirs(&self) -> Result<()> {
        for dir in [self.pkgs_dir(), self.bin_dir()] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}
