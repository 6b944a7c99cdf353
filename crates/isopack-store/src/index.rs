use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use isopack_core::{PackageSpec, Requirement};

use crate::layout::StoreLayout;

/// Read-side view of the installed-package store. The directory scan is
/// cached; `refresh` drops the cache so the next lookup rescans.
#[derive(Debug)]
pub struct InstalledIndex {
    layout: StoreLayout,
    cache: Option<Vec<PackageSpec>>,
}

impl InstalledIndex {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self {
            layout: StoreLayout::new(root),
            cache: None,
        }
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    pub fn refresh(&mut self) {
        self.cache = None;
    }

    pub fn all_installed(&mut self) -> Result<&[PackageSpec]> {
        if self.cache.is_none() {
            self.cache = Some(scan(&self.layout)?);
        }
        Ok(self.cache.as_deref().unwrap_or(&[]))
    }

    /// Highest installed version satisfying the requirement, if any.
    pub fn find(&mut self, name: &str, requirement: &Requirement) -> Result<Option<PackageSpec>> {
        let found = self
            .all_installed()?
            .iter()
            .filter(|spec| spec.name == name)
            .filter(|spec| requirement.allows(&spec.version))
            .max_by(|a, b| a.version.cmp(&b.version))
            .cloned();
        Ok(found)
    }
}

fn scan(layout: &StoreLayout) -> Result<Vec<PackageSpec>> {
    let pkgs_dir = layout.pkgs_dir();
    if !pkgs_dir.exists() {
        return Ok(Vec::new());
    }

    let mut specs = Vec::new();
    for name_entry in fs::read_dir(&pkgs_dir)
        .with_context(|| format!("failed to read package store: {}", pkgs_dir.display()))?
    {
        let name_entry = name_entry?;
        if !name_entry.file_type()?.is_dir() {
            continue;
        }

        for version_entry in fs::read_dir(name_entry.path()).with_context(|| {
            format!(
                "failed to read package directory: {}",
                name_entry.path().display()
            )
        })? {
            let version_entry = version_entry?;
            if !version_entry.file_type()?.is_dir() {
                continue;
            }

            let spec_path = version_entry.path().join("pkg.toml");
            if !spec_path.exists() {
                continue;
            }

            let content = fs::read_to_string(&spec_path)
                .with_context(|| format!("failed reading package spec: {}", spec_path.display()))?;
            let spec = PackageSpec::from_toml_str(&content)
                .with_context(|| format!("failed parsing package spec: {}", spec_path.display()))?;
            specs.push(spec);
        }
    }

    specs.sort_by(|a, b| (&a.name, &a.version).cmp(&(&b.name, &b.version)));
    Ok(specs)
}
